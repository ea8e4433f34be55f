//! # Tag Compare Library
//!
//! This library renders a static comparison site for a tagged git
//! repository: for every ordered pair of tags it lists the files that were
//! added, deleted, renamed or modified, and keeps the raw contents of every
//! tag so a browser can show the diff of any file. It is designed to be used
//! by the `tag-compare` command-line tool but the engine can be driven by
//! any [`provider::GitProvider`].
//!
//! ## Quick Example
//!
//! ```
//! use tag_compare::catalog::TagCatalog;
//! use tag_compare::chain::{FileChange, PatchChain};
//! use tag_compare::compose::Composer;
//! use tag_compare::filesystem::MemoryFS;
//! use tag_compare::provider::SnapshotProvider;
//! use tag_compare::version::OrdinalPolicy;
//!
//! let mut v1 = MemoryFS::new();
//! v1.add_file_string("README.md", "# One").unwrap();
//! let mut v2 = v1.clone();
//! v2.add_file_string("a.txt", "1").unwrap();
//! let mut v3 = v1.clone();
//! v3.add_file_string("a.txt", "2").unwrap();
//! v3.add_file_string("b.txt", "b").unwrap();
//!
//! let provider = SnapshotProvider::new()
//!     .with_tag("app-v1", v1)
//!     .with_tag("app-v2", v2)
//!     .with_tag("app-v3", v3);
//!
//! let catalog = TagCatalog::build(&provider, OrdinalPolicy::Demote, None).unwrap();
//! let chain = PatchChain::build(&catalog, &provider).unwrap();
//! let composer = Composer::new(&catalog, &chain);
//!
//! let changes = composer.compose("app-v1", "app-v3").unwrap();
//! assert_eq!(
//!     changes.into_vec(),
//!     vec![FileChange::added("a.txt"), FileChange::added("b.txt")]
//! );
//! ```
//!
//! ## Core Concepts
//!
//! - **Version ordinals (`version`)**: Tag names like `2.10-v3877` carry the
//!   integer that orders them.
//! - **Tag catalog (`catalog`)**: Every tag with its commit, in ordinal order.
//! - **Patch chain (`chain`)**: One file-level patch per pair of adjacent
//!   tags, in both walk directions. Only `n - 1` diffs are ever computed.
//! - **Composition (`compose`)**: Folds the patches between any two tags into
//!   their net change set, collapsing rename chains and add/delete pairs.
//! - **Providers (`provider`, `git`)**: Access to the git object store, by
//!   shelling out to `git` or from in-memory snapshots.
//! - **Phases (`phases`)**: The generation pipeline that renders the site.
//!
//! ## Execution Flow
//!
//! The main entry point is `phases::orchestrator`, which runs:
//!
//! 1.  **Preparation**: Build the catalog and the patch chain.
//! 2.  **Composition**: Compose every ordered tag pair in parallel.
//! 3.  **Rendering**: Render the index and one change list page per pair.
//! 4.  **Content**: Pull every tag's raw file contents.
//! 5.  **Assets**: Stage the static scripts and styles.
//! 6.  **Disk Output**: Write the staged site to the output directory.

pub mod catalog;
pub mod chain;
pub mod compose;
pub mod defaults;
pub mod error;
pub mod filesystem;
pub mod git;
pub mod output;
pub mod phases;
pub mod provider;
pub mod suggestions;
pub mod version;
