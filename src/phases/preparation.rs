//! Phase 1: Preparation
//!
//! Builds the [`Generation`] context every later phase reads from.
//!
//! ## Process
//!
//! 1.  **Catalog**: List, resolve and order the repository's tags.
//! 2.  **Chain**: Diff each pair of adjacent tags once, in ascending order.
//!
//! Any failure here is fatal to the run. No partial site is produced.

use log::info;

use super::{Generation, Progress, SiteSettings};
use crate::catalog::TagCatalog;
use crate::chain::PatchChain;
use crate::error::Result;
use crate::provider::GitProvider;

/// Execute Phase 1: Build the catalog and the patch chain
pub fn execute<'a>(
    provider: &'a dyn GitProvider,
    settings: &'a SiteSettings,
    progress: &dyn Progress,
) -> Result<Generation<'a>> {
    let catalog = TagCatalog::build(provider, settings.policy, settings.tag_filter.as_ref())?;
    info!("Catalog holds {} tags", catalog.len());

    progress.start("Diffing adjacent tags", catalog.len().saturating_sub(1));
    let chain = PatchChain::build_with_progress(&catalog, provider, |_| progress.advance());
    progress.finish();
    let chain = chain?;

    Ok(Generation {
        provider,
        catalog,
        chain,
        settings,
    })
}
