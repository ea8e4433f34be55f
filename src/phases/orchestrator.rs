//! Orchestrator for a complete generation run
//!
//! This module chains the six phases into the single entry point used by
//! the `generate` command.

use std::num::NonZeroUsize;

use log::{info, warn};
use rayon::ThreadPool;

use super::{phase1, phase2, phase3, phase4, phase5, phase6, Progress, SiteSettings};
use crate::error::Result;
use crate::provider::GitProvider;

/// Summary of a finished run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Report {
    /// Tags in the catalog
    pub tags: usize,
    /// Pairs whose change list was rendered
    pub pairs: usize,
    /// Files written to the output directory
    pub files: usize,
}

/// Execute a complete generation run (Phases 1-6)
///
/// 1. Build the catalog and the patch chain
/// 2. Compose every ordered pair of tags
/// 3. Render pages and data files
/// 4. Pull raw file contents
/// 5. Stage static assets
/// 6. Write the site to `settings.output`
///
/// A pair that fails to compose does not stop the run: the rest of the site
/// is still written, then the first pair failure is returned.
pub fn execute_generate(
    provider: &dyn GitProvider,
    settings: &SiteSettings,
    progress: &dyn Progress,
) -> Result<Report> {
    let pool = build_pool(settings.jobs)?;

    // Phase 1: Preparation
    let generation = phase1::execute(provider, settings, progress)?;

    // Phase 2: Composition
    let composition = phase2::execute(&generation, &pool, progress);

    // Phase 3: Rendering
    let mut site = phase3::execute(&generation, &composition)?;

    // Phase 4: Content
    site.merge(phase4::execute(&generation, &pool, progress)?);

    // Phase 5: Assets
    site.merge(phase5::execute(settings)?);

    // Phase 6: Write to Disk
    let files = phase6::execute(&site, &settings.output)?;

    let report = Report {
        tags: generation.catalog.len(),
        pairs: composition.pairs.len(),
        files,
    };
    info!("Generated {} pages for {} tags", report.pairs, report.tags);

    let failed = composition.failures.len();
    if let Some(first) = composition.failures.into_iter().next() {
        warn!("{} of {} pairs failed", failed, failed + report.pairs);
        return Err(first.error);
    }

    Ok(report)
}

/// Builds the worker pool shared by the parallel phases.
fn build_pool(jobs: Option<NonZeroUsize>) -> Result<ThreadPool> {
    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(jobs) = jobs {
        builder = builder.num_threads(jobs.get());
    }
    Ok(builder.build()?)
}
