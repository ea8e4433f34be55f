//! Phase 2: Composition
//!
//! Composes the change set of every ordered tag pair, including same-tag
//! pairs, on a rayon thread pool.
//!
//! The composer only reads the immutable catalog and chain, so pairs are
//! independent. A failing pair does not stop the others: every pair is
//! evaluated, failures are logged and handed back next to the successes so
//! the remaining pages can still be rendered.

use log::{debug, warn};
use rayon::prelude::*;
use rayon::ThreadPool;

use super::{Generation, Progress};
use crate::compose::ComposedChangeSet;
use crate::error::Error;

/// The change set of one ordered tag pair.
#[derive(Debug, Clone)]
pub struct PairChanges {
    pub from: String,
    pub to: String,
    pub changes: ComposedChangeSet,
}

/// A pair whose composition failed.
#[derive(Debug)]
pub struct PairFailure {
    pub from: String,
    pub to: String,
    pub error: Error,
}

/// Results of Phase 2, both in display order.
#[derive(Debug, Default)]
pub struct Composition {
    pub pairs: Vec<PairChanges>,
    pub failures: Vec<PairFailure>,
}

/// Execute Phase 2: Compose every ordered pair of tags
pub fn execute(generation: &Generation, pool: &ThreadPool, progress: &dyn Progress) -> Composition {
    let composer = generation.composer();
    let pairs = generation.catalog.pairs();
    progress.start("Composing tag pairs", pairs.len());

    let results: Vec<_> = pool.install(|| {
        pairs
            .par_iter()
            .map(|(from, to)| {
                debug!("Composing {} -> {}", from.name, to.name);
                let result = composer.compose(&from.name, &to.name);
                progress.advance();
                (from.name.clone(), to.name.clone(), result)
            })
            .collect()
    });
    progress.finish();

    let mut composition = Composition::default();
    for (from, to, result) in results {
        match result {
            Ok(changes) => composition.pairs.push(PairChanges { from, to, changes }),
            Err(error) => {
                warn!("Skipping {} -> {}: {}", from, to, error);
                composition.failures.push(PairFailure { from, to, error });
            }
        }
    }
    composition
}
