//! # Compare Command Implementation
//!
//! This module implements the `compare` subcommand, which prints the net
//! file changes between two tags without generating a site.
//!
//! ## Functionality
//!
//! - **Either direction**: `compare OLD NEW` and `compare NEW OLD` both work.
//!   Changes are named relative to the second tag.
//! - **Text output**: One line per file, `A`/`D`/`M` and the path, or
//!   `R`, the old path and the new path.
//! - **JSON output**: `{"from", "to", "changes": [...]}`.
//! - **Summary**: Counts per change kind, unless `--quiet`.

use anyhow::Result;
use clap::Args;
use serde_json::json;

use super::RepoArgs;
use tag_compare::chain::{ChangeKind, FileChange, PatchChain};
use tag_compare::compose::Composer;
use tag_compare::output::{change_code, OutputConfig};
use tag_compare::suggestions;

/// Show the files changed between two tags
#[derive(Args, Debug)]
pub struct CompareArgs {
    /// The tag to compare from
    #[arg(value_name = "TAG1")]
    pub from: String,

    /// The tag to compare to
    #[arg(value_name = "TAG2")]
    pub to: String,

    #[command(flatten)]
    pub repo: RepoArgs,

    /// Print the change list as JSON
    #[arg(long)]
    pub json: bool,

    /// Print only the change list
    #[arg(short, long)]
    pub quiet: bool,
}

/// Execute the `compare` command.
pub fn execute(args: CompareArgs, output: &OutputConfig) -> Result<()> {
    let (provider, catalog) = args.repo.catalog()?;
    let known: Vec<&str> = catalog.ascending().iter().map(|t| t.name.as_str()).collect();

    // Check names before diffing the whole chain
    for tag in [&args.from, &args.to] {
        if catalog.get(tag).is_none() {
            return Err(suggestions::unknown_tag(tag, &known));
        }
    }

    let chain = PatchChain::build(&catalog, &provider).map_err(|e| suggestions::with_hints(e, &known))?;
    let changes = Composer::new(&catalog, &chain)
        .compose(&args.from, &args.to)
        .map_err(|e| suggestions::with_hints(e, &known))?;

    if args.json {
        let document = json!({
            "from": args.from,
            "to": args.to,
            "changes": changes,
        });
        println!("{}", serde_json::to_string_pretty(&document)?);
        return Ok(());
    }

    for change in &changes {
        println!("{}", format_change(change, output));
    }

    if !args.quiet {
        let summary: Vec<String> = changes
            .summary()
            .iter()
            .filter(|(_, count)| *count > 0)
            .map(|(code, count)| format!("{} {}", count, code))
            .collect();
        if summary.is_empty() {
            eprintln!("No changes between {} and {}", args.from, args.to);
        } else {
            eprintln!(
                "{} files changed between {} and {} ({})",
                changes.len(),
                args.from,
                args.to,
                summary.join(", ")
            );
        }
    }
    Ok(())
}

fn format_change(change: &FileChange, output: &OutputConfig) -> String {
    let code = change_code(output, &change.kind);
    match &change.kind {
        ChangeKind::Renamed { from } => format!("{}\t{}\t{}", code, from, change.path),
        _ => format!("{}\t{}", code, change.path),
    }
}
