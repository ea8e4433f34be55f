//! Phase 4: Content
//!
//! Stages the raw content of every file of every tag under
//! `content/<tag>/<path>`, where the diff pane fetches both sides from.
//!
//! ## Process
//!
//! 1.  **List**: Each tag's tree is listed through the provider.
//! 2.  **Filter**: Paths matching an `--exclude` glob are dropped before any
//!     content is read.
//! 3.  **Read**: The remaining files are read in one batch per tag and
//!     staged. Tags are processed in parallel, each into its own `MemoryFS`,
//!     and merged at the end.
//!
//! The phase is skipped entirely when content pulling is disabled.

use glob::Pattern;
use log::{debug, info};
use rayon::prelude::*;
use rayon::ThreadPool;

use super::{Generation, Progress};
use crate::catalog::Tag;
use crate::error::Result;
use crate::filesystem::MemoryFS;
use crate::provider::GitProvider;

/// Execute Phase 4: Pull file contents for every tag
pub fn execute(
    generation: &Generation,
    pool: &ThreadPool,
    progress: &dyn Progress,
) -> Result<MemoryFS> {
    let settings = generation.settings;
    if !settings.pull_content {
        info!("Skipping file contents");
        return Ok(MemoryFS::new());
    }

    let excludes = compile_patterns(&settings.exclude)?;
    let tags = generation.catalog.ascending();
    progress.start("Pulling file contents", tags.len());

    let staged: Vec<Result<MemoryFS>> = pool.install(|| {
        tags.par_iter()
            .map(|tag| {
                let result = pull_tag(generation.provider, tag, &excludes);
                progress.advance();
                result
            })
            .collect()
    });
    progress.finish();

    let mut content = MemoryFS::new();
    for fs in staged {
        content.merge(fs?);
    }
    info!(
        "Staged {} content files ({} bytes)",
        content.len(),
        content.total_size()
    );
    Ok(content)
}

fn compile_patterns(patterns: &[String]) -> Result<Vec<Pattern>> {
    patterns
        .iter()
        .map(|p| Pattern::new(p).map_err(Into::into))
        .collect()
}

fn pull_tag(provider: &dyn GitProvider, tag: &Tag, excludes: &[Pattern]) -> Result<MemoryFS> {
    let mut fs = MemoryFS::new();
    let (skipped, paths): (Vec<String>, Vec<String>) = provider
        .list_files(&tag.commit)?
        .into_iter()
        .partition(|path| excludes.iter().any(|pattern| pattern.matches(path)));

    let contents = provider.read_files(&tag.commit, &paths)?;
    for (path, content) in paths.iter().zip(contents) {
        fs.add_file_content(format!("content/{}/{}", tag.name, path), content)?;
    }

    debug!(
        "Tag {}: {} files staged, {} excluded",
        tag.name,
        fs.len(),
        skipped.len()
    );
    Ok(fs)
}
