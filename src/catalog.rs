//! # Tag Catalog
//!
//! The catalog is the ordered list of every tag the site covers. It is built
//! once per run from the provider's tag references:
//!
//! 1.  **Collection**: every tag ref is listed (optionally narrowed by a name
//!     filter). Duplicate names collapse to one entry.
//! 2.  **Resolution**: each ref is peeled to the commit it points at.
//! 3.  **Ordering**: each name is parsed into an ordinal and the tags are
//!     sorted ascending. Demoted tags (unparseable names under
//!     `OrdinalPolicy::Demote`) all carry ordinal 0 and order among
//!     themselves by name.
//!
//! The ascending order drives chain construction; the descending view is the
//! display order of the site.

use std::collections::{BTreeMap, HashMap};

use log::{debug, info};
use regex::Regex;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::provider::{CommitId, GitProvider};
use crate::version::{self, OrdinalPolicy};

/// A repository tag with its resolved commit and ordinal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tag {
    /// Display name, e.g. `2.10-v3877`
    pub name: String,
    /// The commit the tag points at
    pub commit: CommitId,
    /// Position in the total order, parsed from `name`
    pub ordinal: u64,
    /// Set when `name` did not parse and the ordinal was forced to 0
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub demoted: bool,
}

impl Tag {
    /// Creates a tag, parsing its ordinal under `policy`.
    pub fn new(name: &str, commit: CommitId, policy: OrdinalPolicy) -> Result<Self> {
        let (ordinal, demoted) = version::parse_with_policy(name, policy)?;
        Ok(Self {
            name: name.to_string(),
            commit,
            ordinal,
            demoted,
        })
    }

    fn sort_key(&self) -> (u64, bool, &str) {
        (self.ordinal, !self.demoted, &self.name)
    }
}

/// All tags of a repository in ordinal order.
#[derive(Debug, Clone)]
pub struct TagCatalog {
    ascending: Vec<Tag>,
    index: HashMap<String, usize>,
}

impl TagCatalog {
    /// Builds the catalog from a provider's tag references.
    ///
    /// Fails with `Error::EmptyCatalog` when no tag remains after filtering,
    /// and with `Error::CommitResolution` when a tag cannot be peeled.
    pub fn build(
        provider: &dyn GitProvider,
        policy: OrdinalPolicy,
        filter: Option<&Regex>,
    ) -> Result<Self> {
        let refs = provider.list_tags()?;
        info!("Found {} tag refs", refs.len());

        // BTreeMap dedupes by name and keeps resolution order stable
        let unique: BTreeMap<_, _> = refs
            .into_iter()
            .filter(|r| filter.map(|re| re.is_match(&r.name)).unwrap_or(true))
            .map(|r| (r.name.clone(), r))
            .collect();

        if unique.is_empty() {
            return Err(Error::EmptyCatalog {
                filter: filter.map(|re| re.as_str().to_string()),
            });
        }

        let mut tags = Vec::with_capacity(unique.len());
        for tag_ref in unique.values() {
            let commit = provider.resolve_commit(tag_ref)?;
            debug!("Tag {} -> {}", tag_ref.name, commit);
            tags.push(Tag::new(&tag_ref.name, commit, policy)?);
        }

        Self::from_tags(tags)
    }

    /// Builds a catalog from already resolved tags.
    pub fn from_tags(mut tags: Vec<Tag>) -> Result<Self> {
        if tags.is_empty() {
            return Err(Error::EmptyCatalog { filter: None });
        }

        tags.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));

        for pair in tags.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            if a.name == b.name {
                return Err(Error::Format {
                    tag: a.name.clone(),
                    message: "tag listed twice".to_string(),
                });
            }
            if !a.demoted && !b.demoted && a.ordinal == b.ordinal {
                return Err(Error::DuplicateOrdinal {
                    ordinal: a.ordinal,
                    first: a.name.clone(),
                    second: b.name.clone(),
                });
            }
        }

        let index = tags
            .iter()
            .enumerate()
            .map(|(i, tag)| (tag.name.clone(), i))
            .collect();

        Ok(Self {
            ascending: tags,
            index,
        })
    }

    /// Tags in ascending ordinal order.
    pub fn ascending(&self) -> &[Tag] {
        &self.ascending
    }

    /// Tags in descending ordinal order, newest first.
    pub fn descending(&self) -> impl DoubleEndedIterator<Item = &Tag> + ExactSizeIterator {
        self.ascending.iter().rev()
    }

    /// Looks up a tag by name.
    pub fn get(&self, name: &str) -> Option<&Tag> {
        self.position(name).map(|i| &self.ascending[i])
    }

    /// Position of a tag in ascending order.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Number of tags.
    pub fn len(&self) -> usize {
        self.ascending.len()
    }

    /// Always false for a built catalog.
    pub fn is_empty(&self) -> bool {
        self.ascending.is_empty()
    }

    /// Every ordered pair of tags, both in display order.
    pub fn pairs(&self) -> Vec<(&Tag, &Tag)> {
        self.descending()
            .flat_map(|a| self.descending().map(move |b| (a, b)))
            .collect()
    }
}
