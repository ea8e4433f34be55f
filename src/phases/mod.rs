//! Implementation of the phases of a site generation run.
//!
//! ## Overview
//!
//! A run follows 6 phases:
//! 1. Preparation - Build the tag catalog and the adjacent patch chain
//! 2. Composition - Compose the change set of every ordered tag pair in parallel
//! 3. Rendering - Render the index, change list pages and JSON data
//! 4. Content - Pull raw file contents for every tag
//! 5. Assets - Stage the static assets (embedded or from a directory)
//! 6. Writing to Disk - Write the staged site to the output directory
//!
//! Phases 3 to 5 only stage files in a `MemoryFS`. Nothing touches the output
//! directory before phase 6.
//!
//! All phases share one read-only [`Generation`] context built in phase 1.

use std::num::NonZeroUsize;
use std::path::PathBuf;

use regex::Regex;

use crate::catalog::TagCatalog;
use crate::chain::PatchChain;
use crate::compose::Composer;
use crate::provider::GitProvider;
use crate::version::OrdinalPolicy;

// Phase modules
pub mod assets;
pub mod composition;
pub mod content;
pub mod orchestrator;
pub mod preparation;
pub mod rendering;
pub mod write;

pub use preparation as phase1;
pub use composition as phase2;
pub use rendering as phase3;
pub use content as phase4;
pub use assets as phase5;
pub use write as phase6;

/// Settings of a generation run.
#[derive(Debug, Clone)]
pub struct SiteSettings {
    /// Directory the site is written to
    pub output: PathBuf,
    /// Directory whose files replace the embedded static assets
    pub static_dir: Option<PathBuf>,
    /// Worker threads for the parallel phases; `None` uses every CPU
    pub jobs: Option<NonZeroUsize>,
    pub policy: OrdinalPolicy,
    /// Only tags matching this pattern enter the catalog
    pub tag_filter: Option<Regex>,
    /// Whether raw file contents are pulled into `content/`
    pub pull_content: bool,
    /// Glob patterns of files left out of `content/`
    pub exclude: Vec<String>,
    /// Whether `changes/<tag1>/<tag2>.json` files are written
    pub json: bool,
    /// Prefix of change list pages as seen from the index page
    pub diff_base_url: String,
    /// Prefix of raw file contents as seen from the index page
    pub content_base_url: String,
}

impl Default for SiteSettings {
    fn default() -> Self {
        Self {
            output: PathBuf::from("output"),
            static_dir: None,
            jobs: None,
            policy: OrdinalPolicy::default(),
            tag_filter: None,
            pull_content: true,
            exclude: Vec::new(),
            json: false,
            diff_base_url: "./files/".to_string(),
            content_base_url: "./content/".to_string(),
        }
    }
}

/// Progress reporting hooks for long-running phases.
///
/// Implementations must tolerate calls from several threads at once.
pub trait Progress: Sync {
    /// A phase with `total` steps begins.
    fn start(&self, phase: &str, total: usize);

    /// One step of the current phase is done.
    fn advance(&self);

    /// The current phase is done.
    fn finish(&self);
}

/// Progress sink that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl Progress for NoProgress {
    fn start(&self, _phase: &str, _total: usize) {}
    fn advance(&self) {}
    fn finish(&self) {}
}

/// Everything a run derives from the repository, built once in phase 1.
pub struct Generation<'a> {
    pub provider: &'a dyn GitProvider,
    pub catalog: TagCatalog,
    pub chain: PatchChain,
    pub settings: &'a SiteSettings,
}

impl<'a> Generation<'a> {
    /// A composer over this run's catalog and chain.
    pub fn composer(&self) -> Composer<'_> {
        Composer::new(&self.catalog, &self.chain)
    }
}
