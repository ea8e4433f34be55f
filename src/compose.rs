//! # Diff Composition
//!
//! Answers "what changed between these two tags" for any pair, not just
//! adjacent ones, by folding the adjacent patches between them.
//!
//! ## Walk
//!
//! For `compose(tag1, tag2)` the composer picks the chain whose direction
//! leads from `tag1` to `tag2`: ascending when `tag1` is older, descending
//! otherwise. It walks that chain from the start and toggles an
//! accumulating flag every time it reaches an entry whose target is one of
//! the two endpoints. The first hit is always `tag1`. Patches are folded
//! while the flag is on, and the walk stops at the second hit. A walk that
//! ends before two hits fails with `Error::TagNotFound`.
//!
//! ## Folding
//!
//! [`ChangeFold`] tracks file identities across steps. Each live path
//! remembers which path the file had at `tag1`, if it existed then, whether
//! its content was touched on the way and its current blob id. Every start
//! path keeps the blob id it had at `tag1`. The net change set is read off
//! the end state:
//!
//! - a path present at both endpoints is `Modified` unless it holds the same
//!   blob as at the start, or is the same untouched file when ids are unknown
//! - a path new at `tag2` whose file came from a path gone at `tag2` is
//!   `Renamed`
//! - any other new path is `Added`
//! - a path gone at `tag2` that no rename accounts for is `Deleted`
//!
//! Because the classification only depends on the endpoints and identity,
//! `compose(b, a)` is the exact inverse of `compose(a, b)`.

use std::collections::{BTreeMap, BTreeSet};

use log::debug;
use serde::Serialize;

use crate::catalog::TagCatalog;
use crate::chain::{BlobIds, ChangeKind, FileChange, PatchChain};
use crate::error::{Error, Result};

#[derive(Debug, Clone)]
struct Track {
    /// Path of this file at the start of the fold, `None` if created since
    origin: Option<String>,
    modified: bool,
    /// Content id at the current path, if known
    blob: Option<String>,
}

impl Track {
    fn created() -> Self {
        Self {
            origin: None,
            modified: false,
            blob: None,
        }
    }
}

/// Folds a sequence of file changes into their net effect.
#[derive(Debug, Default)]
pub struct ChangeFold {
    /// Touched files by current path
    live: BTreeMap<String, Track>,
    /// Start paths whose file has been touched, with their start blob id
    claimed: BTreeMap<String, Option<String>>,
}

impl ChangeFold {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes the file currently at `path` out of the live set. Untouched
    /// start files are claimed on first use, with `blob` as their content.
    fn take(&mut self, path: &str, blob: Option<&String>) -> Option<Track> {
        if let Some(track) = self.live.remove(path) {
            return Some(track);
        }
        if self.claimed.contains_key(path) {
            return None;
        }
        self.claimed.insert(path.to_string(), blob.cloned());
        Some(Track {
            origin: Some(path.to_string()),
            modified: false,
            blob: blob.cloned(),
        })
    }

    /// Applies one step.
    pub fn apply(&mut self, change: &FileChange) {
        let path = &change.path;
        let before = change.blobs.before.as_ref();
        let mut track = match &change.kind {
            ChangeKind::Added => match self.live.remove(path) {
                Some(mut existing) => {
                    existing.modified = true;
                    existing
                }
                None => Track::created(),
            },
            ChangeKind::Deleted => {
                // Dropping the track is enough: the start path stays claimed
                self.take(path, before);
                return;
            }
            ChangeKind::Modified => {
                let mut track = self.take(path, before).unwrap_or_else(Track::created);
                track.modified = true;
                track
            }
            ChangeKind::Renamed { from } => {
                let mut track = self.take(from, before).unwrap_or_else(Track::created);
                track.modified |= change.blobs.differ();
                track
            }
        };
        track.blob = change.blobs.after.clone();
        self.live.insert(path.clone(), track);
    }

    /// Applies a whole patch.
    pub fn apply_all<'a>(&mut self, changes: impl IntoIterator<Item = &'a FileChange>) {
        for change in changes {
            self.apply(change);
        }
    }

    /// The net change set, sorted by path.
    pub fn finish(self) -> ComposedChangeSet {
        let mut changes = BTreeMap::new();
        let mut renamed_away = BTreeSet::new();

        for (path, track) in &self.live {
            let kind = if let Some(start_blob) = self.claimed.get(path) {
                let same_blob = start_blob.is_some() && *start_blob == track.blob;
                let untouched = track.origin.as_deref() == Some(path.as_str()) && !track.modified;
                if same_blob || untouched {
                    continue;
                }
                ChangeKind::Modified
            } else {
                match &track.origin {
                    Some(origin) if !self.live.contains_key(origin) => {
                        renamed_away.insert(origin.clone());
                        ChangeKind::Renamed {
                            from: origin.clone(),
                        }
                    }
                    _ => ChangeKind::Added,
                }
            };
            changes.insert(
                path.clone(),
                FileChange {
                    path: path.clone(),
                    kind,
                    blobs: BlobIds::default(),
                },
            );
        }

        for path in self.claimed.keys() {
            if !self.live.contains_key(path) && !renamed_away.contains(path) {
                changes.insert(path.clone(), FileChange::deleted(path.clone()));
            }
        }

        ComposedChangeSet {
            changes: changes.into_values().collect(),
        }
    }
}

/// The net file changes between two tags, one entry per path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ComposedChangeSet {
    changes: Vec<FileChange>,
}

impl ComposedChangeSet {
    pub fn iter(&self) -> std::slice::Iter<'_, FileChange> {
        self.changes.iter()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Looks up the change recorded for a path.
    pub fn get(&self, path: &str) -> Option<&FileChange> {
        self.changes
            .binary_search_by(|c| c.path.as_str().cmp(path))
            .ok()
            .map(|i| &self.changes[i])
    }

    /// Counts changes per kind code, in `A`, `D`, `M`, `R` order.
    pub fn summary(&self) -> [(char, usize); 4] {
        let mut counts = [('A', 0), ('D', 0), ('M', 0), ('R', 0)];
        for change in &self.changes {
            let code = change.kind.code();
            if let Some(entry) = counts.iter_mut().find(|(c, _)| *c == code) {
                entry.1 += 1;
            }
        }
        counts
    }

    pub fn as_slice(&self) -> &[FileChange] {
        &self.changes
    }

    pub fn into_vec(self) -> Vec<FileChange> {
        self.changes
    }
}

impl<'a> IntoIterator for &'a ComposedChangeSet {
    type Item = &'a FileChange;
    type IntoIter = std::slice::Iter<'a, FileChange>;

    fn into_iter(self) -> Self::IntoIter {
        self.changes.iter()
    }
}

/// Computes change sets between arbitrary tags of a catalog.
///
/// Holds only shared references, so a single composer can serve queries
/// from many threads.
#[derive(Debug, Clone, Copy)]
pub struct Composer<'a> {
    catalog: &'a TagCatalog,
    chain: &'a PatchChain,
}

impl<'a> Composer<'a> {
    pub fn new(catalog: &'a TagCatalog, chain: &'a PatchChain) -> Self {
        Self { catalog, chain }
    }

    /// The changes turning `tag1` into `tag2`.
    pub fn compose(&self, tag1: &str, tag2: &str) -> Result<ComposedChangeSet> {
        let start = self.position(tag1)?;
        let end = self.position(tag2)?;

        if start == end {
            return Ok(ComposedChangeSet::default());
        }

        let chain = if start < end {
            self.chain.ascending()
        } else {
            self.chain.descending()
        };

        let mut fold = ChangeFold::new();
        let mut accumulating = false;
        let mut first_hit: Option<&str> = None;
        let mut hits = 0;

        for patch in chain {
            if accumulating {
                fold.apply_all(&patch.changes);
            }
            let name = patch.to.name.as_str();
            if name == tag1 || name == tag2 {
                accumulating = !accumulating;
                first_hit.get_or_insert(name);
                hits += 1;
                if hits == 2 {
                    break;
                }
            }
        }

        if hits < 2 || accumulating {
            let missing = match first_hit {
                Some(found) if found == tag1 => tag2,
                _ => tag1,
            };
            return Err(Error::TagNotFound {
                tag: missing.to_string(),
            });
        }

        let changes = fold.finish();
        debug!("{} -> {}: {} changes", tag1, tag2, changes.len());
        Ok(changes)
    }

    fn position(&self, tag: &str) -> Result<usize> {
        self.catalog.position(tag).ok_or_else(|| Error::TagNotFound {
            tag: tag.to_string(),
        })
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::catalog::Tag;
    use crate::chain::AdjacentPatch;
    use proptest::prelude::*;

    /// One edit against a small path universe, applied to a live tree.
    #[derive(Debug, Clone)]
    enum Edit {
        Add(usize),
        Delete(usize),
        Modify(usize),
        Rename(usize, usize),
    }

    const PATHS: usize = 6;

    fn path(i: usize) -> String {
        format!("f{}", i % PATHS)
    }

    fn edit() -> impl Strategy<Value = Edit> {
        prop_oneof![
            (0..PATHS).prop_map(Edit::Add),
            (0..PATHS).prop_map(Edit::Delete),
            (0..PATHS).prop_map(Edit::Modify),
            (0..PATHS, 0..PATHS).prop_map(|(a, b)| Edit::Rename(a, b)),
        ]
    }

    /// Turns random edits into a chain of consistent adjacent patches.
    /// Edits that do not fit the current tree are skipped.
    fn build_chain(initial: usize, steps: Vec<Vec<Edit>>) -> (TagCatalog, PatchChain) {
        let mut present: BTreeSet<String> = (0..initial.min(PATHS)).map(path).collect();
        let tags: Vec<Tag> = (0..=steps.len())
            .map(|i| Tag {
                name: format!("t-v{}", i + 1),
                commit: format!("{:040x}", i + 1),
                ordinal: i as u64 + 1,
                demoted: false,
            })
            .collect();

        let mut patches = vec![AdjacentPatch::sentinel(tags[0].clone())];
        for (i, edits) in steps.into_iter().enumerate() {
            let mut changes = Vec::new();
            let mut touched = BTreeSet::new();
            for edit in edits {
                match edit {
                    Edit::Add(a) => {
                        let p = path(a);
                        if !present.contains(&p) && touched.insert(p.clone()) {
                            present.insert(p.clone());
                            changes.push(FileChange::added(p));
                        }
                    }
                    Edit::Delete(a) => {
                        let p = path(a);
                        if present.contains(&p) && touched.insert(p.clone()) {
                            present.remove(&p);
                            changes.push(FileChange::deleted(p));
                        }
                    }
                    Edit::Modify(a) => {
                        let p = path(a);
                        if present.contains(&p) && touched.insert(p.clone()) {
                            changes.push(FileChange::modified(p));
                        }
                    }
                    Edit::Rename(a, b) => {
                        let (from, to) = (path(a), path(b));
                        if present.contains(&from)
                            && !present.contains(&to)
                            && !touched.contains(&from)
                            && touched.insert(to.clone())
                        {
                            touched.insert(from.clone());
                            present.remove(&from);
                            present.insert(to.clone());
                            changes.push(FileChange::renamed(from, to));
                        }
                    }
                }
            }
            changes.sort_by(|a, b| a.path.cmp(&b.path));
            patches.push(AdjacentPatch {
                from: Some(tags[i].clone()),
                to: tags[i + 1].clone(),
                changes,
            });
        }

        let catalog = TagCatalog::from_tags(tags).unwrap();
        (catalog, PatchChain::from_ascending(patches))
    }

    fn chain_strategy() -> impl Strategy<Value = (usize, Vec<Vec<Edit>>)> {
        (
            0..=PATHS,
            prop::collection::vec(prop::collection::vec(edit(), 0..5), 1..6),
        )
    }

    proptest! {
        #[test]
        fn composition_is_symmetric((initial, steps) in chain_strategy(), a in 0usize..6, b in 0usize..6) {
            let (catalog, chain) = build_chain(initial, steps);
            let composer = Composer::new(&catalog, &chain);
            let names: Vec<String> = catalog.ascending().iter().map(|t| t.name.clone()).collect();
            let tag1 = &names[a % names.len()];
            let tag2 = &names[b % names.len()];

            let forward = composer.compose(tag1, tag2).unwrap();
            let backward = composer.compose(tag2, tag1).unwrap();

            let mut inverted: Vec<FileChange> = forward.iter().map(FileChange::inverted).collect();
            inverted.sort_by(|x, y| x.path.cmp(&y.path));
            prop_assert_eq!(inverted, backward.into_vec());
        }

        #[test]
        fn composition_has_unique_sorted_paths((initial, steps) in chain_strategy(), a in 0usize..6, b in 0usize..6) {
            let (catalog, chain) = build_chain(initial, steps);
            let composer = Composer::new(&catalog, &chain);
            let names: Vec<String> = catalog.ascending().iter().map(|t| t.name.clone()).collect();

            let changes = composer
                .compose(&names[a % names.len()], &names[b % names.len()])
                .unwrap()
                .into_vec();
            let paths: Vec<&str> = changes.iter().map(|c| c.path.as_str()).collect();
            let mut sorted = paths.clone();
            sorted.sort();
            sorted.dedup();
            prop_assert_eq!(paths, sorted);
        }
    }
}
