//! # Adjacent Diff Chain
//!
//! The chain holds one [`AdjacentPatch`] per tag: the file-level changes
//! from the previous tag in ordinal order to this one. The first tag has no
//! predecessor and carries an empty sentinel patch.
//!
//! ## Normalization
//!
//! Raw patches from the provider become [`FileChange`] records:
//!
//! | source tree | target tree         | result     |
//! |-------------|---------------------|------------|
//! | absent      | present             | `Added`    |
//! | present     | absent              | `Deleted`  |
//! | path A      | path B              | `Renamed`  |
//! | path A      | path A, new content | `Modified` |
//! | path A      | path A, same content| omitted    |
//!
//! Binary files follow the same rules; whether their content changed is the
//! provider's call. Content ids reported by the provider ride along in
//! [`BlobIds`] so composition can tell when a file ends where it started.
//!
//! ## Direction
//!
//! The provider is asked for `n - 1` diffs, all in ascending order. The
//! descending chain is derived from those by inverting every patch, so the
//! two directions can never disagree.

use std::fmt;

use log::{debug, info};
use serde::ser::{Serialize, SerializeStruct, Serializer};

use crate::catalog::{Tag, TagCatalog};
use crate::error::Result;
use crate::git::RawFilePatch;
use crate::provider::GitProvider;

/// How a single file differs between two snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    Added,
    Deleted,
    Modified,
    /// Moved from `from` to the change's path
    Renamed { from: String },
}

impl ChangeKind {
    /// One-letter code used on the site: `A`, `D`, `M` or `R`.
    pub fn code(&self) -> char {
        match self {
            ChangeKind::Added => 'A',
            ChangeKind::Deleted => 'D',
            ChangeKind::Modified => 'M',
            ChangeKind::Renamed { .. } => 'R',
        }
    }

    /// Lower-case name, used in JSON output and CSS classes.
    pub fn label(&self) -> &'static str {
        match self {
            ChangeKind::Added => "added",
            ChangeKind::Deleted => "deleted",
            ChangeKind::Modified => "modified",
            ChangeKind::Renamed { .. } => "renamed",
        }
    }
}

/// Content ids of a file on either side of a change.
///
/// `None` means the side is absent or the provider did not say.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct BlobIds {
    pub before: Option<String>,
    pub after: Option<String>,
}

impl BlobIds {
    /// Whether both sides are known to hold different content. Unknown ids
    /// count as a change.
    pub fn differ(&self) -> bool {
        match (&self.before, &self.after) {
            (Some(before), Some(after)) => before != after,
            _ => true,
        }
    }
}

/// A file-level change, named by the file's path in the target snapshot
/// (or its last path, for deletions).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileChange {
    pub path: String,
    pub kind: ChangeKind,
    pub blobs: BlobIds,
}

impl FileChange {
    fn new(path: String, kind: ChangeKind) -> Self {
        Self {
            path,
            kind,
            blobs: BlobIds::default(),
        }
    }

    pub fn added(path: impl Into<String>) -> Self {
        Self::new(path.into(), ChangeKind::Added)
    }

    pub fn deleted(path: impl Into<String>) -> Self {
        Self::new(path.into(), ChangeKind::Deleted)
    }

    pub fn modified(path: impl Into<String>) -> Self {
        Self::new(path.into(), ChangeKind::Modified)
    }

    pub fn renamed(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self::new(to.into(), ChangeKind::Renamed { from: from.into() })
    }

    /// Attaches content ids for the source and target side.
    pub fn with_blobs(mut self, before: Option<String>, after: Option<String>) -> Self {
        self.blobs = BlobIds { before, after };
        self
    }

    /// The previous path of a renamed file, empty otherwise.
    pub fn old_path(&self) -> &str {
        match &self.kind {
            ChangeKind::Renamed { from } => from,
            _ => "",
        }
    }

    /// Where the file lives in the source snapshot.
    pub fn source_path(&self) -> &str {
        match &self.kind {
            ChangeKind::Renamed { from } => from,
            _ => &self.path,
        }
    }

    /// The same change seen from the other side.
    pub fn inverted(&self) -> Self {
        let change = match &self.kind {
            ChangeKind::Added => Self::deleted(self.path.clone()),
            ChangeKind::Deleted => Self::added(self.path.clone()),
            ChangeKind::Modified => Self::modified(self.path.clone()),
            ChangeKind::Renamed { from } => Self::renamed(self.path.clone(), from.clone()),
        };
        change.with_blobs(self.blobs.after.clone(), self.blobs.before.clone())
    }

    /// Normalizes a provider patch. Returns `None` for unchanged files.
    pub fn from_raw(raw: &RawFilePatch) -> Option<Self> {
        let change = match (raw.old_path.as_deref(), raw.new_path.as_deref()) {
            (None, Some(new)) => Self::added(new),
            (Some(old), None) => Self::deleted(old),
            (Some(old), Some(new)) if old != new => Self::renamed(old, new),
            (Some(path), Some(_)) if raw.has_content_change => Self::modified(path),
            _ => return None,
        };
        Some(change.with_blobs(raw.old_id.clone(), raw.new_id.clone()))
    }
}

impl fmt::Display for FileChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ChangeKind::Renamed { from } => write!(f, "R\t{}\t{}", from, self.path),
            kind => write!(f, "{}\t{}", kind.code(), self.path),
        }
    }
}

impl Serialize for FileChange {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("FileChange", 3)?;
        state.serialize_field("path", &self.path)?;
        state.serialize_field("old_path", self.old_path())?;
        state.serialize_field("kind", self.kind.label())?;
        state.end()
    }
}

/// The changes between two ordinally adjacent tags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdjacentPatch {
    /// Predecessor in walk order, `None` for the sentinel
    pub from: Option<Tag>,
    pub to: Tag,
    pub changes: Vec<FileChange>,
}

impl AdjacentPatch {
    /// The leading entry of a chain: no predecessor, no changes.
    pub fn sentinel(to: Tag) -> Self {
        Self {
            from: None,
            to,
            changes: Vec::new(),
        }
    }

    /// Whether this is a chain's leading entry.
    pub fn is_sentinel(&self) -> bool {
        self.from.is_none()
    }

    /// The same step walked the other way. A sentinel has no inverse and is
    /// returned unchanged.
    pub fn inverted(&self) -> Self {
        match &self.from {
            Some(from) => Self {
                from: Some(self.to.clone()),
                to: from.clone(),
                changes: self.changes.iter().map(FileChange::inverted).collect(),
            },
            None => self.clone(),
        }
    }
}

/// Adjacent patches in both walk directions.
#[derive(Debug, Clone)]
pub struct PatchChain {
    ascending: Vec<AdjacentPatch>,
    descending: Vec<AdjacentPatch>,
}

impl PatchChain {
    /// Builds the chain for a catalog, diffing each adjacent pair once.
    pub fn build(catalog: &TagCatalog, provider: &dyn GitProvider) -> Result<Self> {
        Self::build_with_progress(catalog, provider, |_| {})
    }

    /// Like [`PatchChain::build`], calling `on_patch` after each diff.
    pub fn build_with_progress<F>(
        catalog: &TagCatalog,
        provider: &dyn GitProvider,
        mut on_patch: F,
    ) -> Result<Self>
    where
        F: FnMut(&AdjacentPatch),
    {
        let tags = catalog.ascending();
        let mut ascending = Vec::with_capacity(tags.len());

        if let Some(first) = tags.first() {
            ascending.push(AdjacentPatch::sentinel(first.clone()));
        }

        for pair in tags.windows(2) {
            let (from, to) = (&pair[0], &pair[1]);
            let raw = provider.diff_commits(&from.commit, &to.commit)?;

            let mut changes: Vec<FileChange> = raw.iter().filter_map(FileChange::from_raw).collect();
            changes.sort_by(|a, b| a.path.cmp(&b.path));
            debug!(
                "{} -> {}: {} raw patches, {} changes",
                from.name,
                to.name,
                raw.len(),
                changes.len()
            );

            let patch = AdjacentPatch {
                from: Some(from.clone()),
                to: to.clone(),
                changes,
            };
            on_patch(&patch);
            ascending.push(patch);
        }

        info!("Built chain of {} adjacent patches", ascending.len());
        Ok(Self::from_ascending(ascending))
    }

    /// Derives the descending chain from an ascending one.
    ///
    /// `ascending` must start with its sentinel.
    pub fn from_ascending(ascending: Vec<AdjacentPatch>) -> Self {
        let mut descending = Vec::with_capacity(ascending.len());
        if let Some(last) = ascending.last() {
            descending.push(AdjacentPatch::sentinel(last.to.clone()));
        }
        descending.extend(
            ascending
                .iter()
                .rev()
                .filter(|patch| !patch.is_sentinel())
                .map(AdjacentPatch::inverted),
        );

        Self {
            ascending,
            descending,
        }
    }

    /// Patches in ascending tag order, sentinel first.
    pub fn ascending(&self) -> &[AdjacentPatch] {
        &self.ascending
    }

    /// Patches in descending tag order, sentinel first.
    pub fn descending(&self) -> &[AdjacentPatch] {
        &self.descending
    }

    /// Total number of file changes across the ascending chain.
    pub fn change_count(&self) -> usize {
        self.ascending.iter().map(|p| p.changes.len()).sum()
    }
}
