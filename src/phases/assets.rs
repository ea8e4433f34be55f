//! Phase 5: Assets
//!
//! Stages the static files the pages load: `script.js` for change lists,
//! `load-diff.js` for the index page and `style.css` for both.
//!
//! The assets built into the binary are used unless a static directory is
//! configured, in which case every file below it is staged instead, keeping
//! its relative path.

use std::fs;
use std::path::Path;

use log::{debug, info};
use walkdir::WalkDir;

use super::SiteSettings;
use crate::error::{Error, Result};
use crate::filesystem::MemoryFS;

/// Assets compiled into the binary, by site path.
pub const EMBEDDED: &[(&str, &str)] = &[
    ("load-diff.js", include_str!("../../static/load-diff.js")),
    ("script.js", include_str!("../../static/script.js")),
    ("style.css", include_str!("../../static/style.css")),
];

/// Execute Phase 5: Stage static assets
pub fn execute(settings: &SiteSettings) -> Result<MemoryFS> {
    match &settings.static_dir {
        Some(dir) => {
            info!("Copying static files from {}", dir.display());
            from_directory(dir)
        }
        None => {
            info!("Copying embedded static files");
            embedded()
        }
    }
}

fn embedded() -> Result<MemoryFS> {
    let mut fs = MemoryFS::new();
    for (path, content) in EMBEDDED {
        fs.add_file_string(path, content)?;
    }
    Ok(fs)
}

fn from_directory(dir: &Path) -> Result<MemoryFS> {
    if !dir.is_dir() {
        return Err(Error::Filesystem {
            message: format!("Static directory not found: {}", dir.display()),
        });
    }

    let mut staged = MemoryFS::new();
    for entry in WalkDir::new(dir).follow_links(true) {
        let entry = entry.map_err(|e| Error::Filesystem {
            message: format!("Failed to walk '{}': {}", dir.display(), e),
        })?;
        if !entry.file_type().is_file() {
            continue;
        }

        let relative = entry
            .path()
            .strip_prefix(dir)
            .map_err(|e| Error::Filesystem {
                message: format!("Failed to relativize '{}': {}", entry.path().display(), e),
            })?;
        debug!("Static asset {}", relative.display());
        staged.add_file_content(relative, fs::read(entry.path())?)?;
    }
    Ok(staged)
}
