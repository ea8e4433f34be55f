//! Phase 3: Rendering
//!
//! Turns the composed change sets into pages staged in a `MemoryFS`.
//!
//! ## Pages
//!
//! - `index.html`: tag pickers, the change list frame and the diff pane.
//! - `files/<tag1>/<tag2>.html`: the change list of one ordered pair. Each
//!   entry carries both tags and both paths, which `script.js` hands to the
//!   index page's diff pane.
//! - `tags.json`: every tag with its ordinal, newest first.
//! - `changes/<tag1>/<tag2>.json`: the change list as data, when enabled.
//!
//! Rendering only consumes composer output. Tag names and paths are escaped
//! before they reach HTML.

use log::info;
use serde::Serialize;

use super::composition::{Composition, PairChanges};
use super::Generation;
use crate::catalog::Tag;
use crate::chain::FileChange;
use crate::error::{Error, Result};
use crate::filesystem::MemoryFS;

const MONACO_LOADER: &str =
    "https://cdnjs.cloudflare.com/ajax/libs/monaco-editor/0.34.1/min/vs/loader.min.js";

#[derive(Serialize)]
struct TagEntry<'a> {
    name: &'a str,
    ordinal: u64,
}

#[derive(Serialize)]
struct PairDocument<'a> {
    from: &'a str,
    to: &'a str,
    changes: &'a [FileChange],
}

/// Execute Phase 3: Render pages for every composed pair
pub fn execute(generation: &Generation, composition: &Composition) -> Result<MemoryFS> {
    let mut site = MemoryFS::new();
    let tags: Vec<&Tag> = generation.catalog.descending().collect();

    stage(&mut site, "index.html", render_index(&tags, generation))?;

    let entries: Vec<TagEntry> = tags
        .iter()
        .map(|t| TagEntry {
            name: &t.name,
            ordinal: t.ordinal,
        })
        .collect();
    stage(&mut site, "tags.json", serde_json::to_string_pretty(&entries)?)?;

    for pair in &composition.pairs {
        let page = format!("files/{}/{}.html", pair.from, pair.to);
        let html = render_changes(&page, pair);
        stage(&mut site, &page, html)?;

        if generation.settings.json {
            let document = PairDocument {
                from: &pair.from,
                to: &pair.to,
                changes: pair.changes.as_slice(),
            };
            let path = format!("changes/{}/{}.json", pair.from, pair.to);
            stage(&mut site, &path, serde_json::to_string_pretty(&document)?)?;
        }
    }

    info!("Rendered {} pages", site.len());
    Ok(site)
}

fn stage(site: &mut MemoryFS, page: &str, body: String) -> Result<()> {
    site.add_file_string(page, &body).map_err(|e| Error::Render {
        page: page.to_string(),
        message: e.to_string(),
    })
}

fn render_index(tags: &[&Tag], generation: &Generation) -> String {
    let settings = generation.settings;
    let to = tags.first().map(|t| t.name.as_str()).unwrap_or_default();
    let from = tags.get(1).map(|t| t.name.as_str()).unwrap_or(to);

    let mut html = String::new();
    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n<title>Tag comparison</title>\n");
    html.push_str("<link rel=\"stylesheet\" href=\"style.css\">\n</head>\n");
    html.push_str(&format!(
        "<body data-files-base=\"{}\" data-content-base=\"{}\">\n<header>\n",
        escape(&settings.diff_base_url),
        escape(&settings.content_base_url)
    ));
    html.push_str(&tag_select("from", "From", tags, from));
    html.push_str(&tag_select("to", "To", tags, to));
    html.push_str("</header>\n<main>\n");
    html.push_str("<iframe id=\"files\" title=\"Changed files\"></iframe>\n");
    html.push_str("<div id=\"diff\"><div class=\"diff\"></div></div>\n</main>\n");
    html.push_str(&format!("<script src=\"{}\"></script>\n", MONACO_LOADER));
    html.push_str("<script src=\"load-diff.js\"></script>\n</body>\n</html>\n");
    html
}

fn tag_select(name: &str, label: &str, tags: &[&Tag], selected: &str) -> String {
    let mut html = format!("<label>{} <select class=\"tag\" name=\"{}\">\n", label, name);
    for tag in tags {
        let marker = if tag.name == selected { " selected" } else { "" };
        html.push_str(&format!(
            "<option value=\"{0}\"{1}>{0}</option>\n",
            escape(&tag.name),
            marker
        ));
    }
    html.push_str("</select></label>\n");
    html
}

fn render_changes(page: &str, pair: &PairChanges) -> String {
    let root = root_prefix(page);

    let mut html = String::new();
    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str(&format!(
        "<title>{} &rarr; {}</title>\n",
        escape(&pair.from),
        escape(&pair.to)
    ));
    html.push_str(&format!(
        "<link rel=\"stylesheet\" href=\"{}style.css\">\n</head>\n<body>\n",
        root
    ));

    if pair.changes.is_empty() {
        html.push_str("<p class=\"empty\">No changes</p>\n");
    } else {
        html.push_str("<ul class=\"changes\">\n");
        for change in &pair.changes {
            html.push_str(&change_item(pair, change));
        }
        html.push_str("</ul>\n");
    }

    html.push_str(&format!(
        "<script src=\"{}script.js\"></script>\n</body>\n</html>\n",
        root
    ));
    html
}

fn change_item(pair: &PairChanges, change: &FileChange) -> String {
    let old_path = change.old_path();
    let old_label = if old_path.is_empty() {
        String::new()
    } else {
        format!(" <span class=\"old-path\">&larr; {}</span>", escape(old_path))
    };

    format!(
        "<li class=\"{kind}\"><a href=\"#\" class=\"change\" data-tag1=\"{tag1}\" data-tag2=\"{tag2}\" \
         data-name=\"{name}\" data-oldname=\"{old}\" title=\"{name}\">\
         <span class=\"code\">{code}</span>{name}{old_label}</a></li>\n",
        kind = change.kind.label(),
        tag1 = escape(&pair.from),
        tag2 = escape(&pair.to),
        name = escape(&change.path),
        old = escape(old_path),
        code = change.kind.code(),
        old_label = old_label,
    )
}

/// Relative path from a staged page back to the site root.
fn root_prefix(page: &str) -> String {
    "../".repeat(page.matches('/').count())
}

/// Escapes text for HTML element content and quoted attribute values.
pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            c => escaped.push(c),
        }
    }
    escaped
}
