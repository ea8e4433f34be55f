//! # CLI Command Implementations
//!
//! This module contains the implementation for each subcommand of the
//! `tag-compare` command-line tool. Each subcommand is defined in its own
//! file.
//!
//! ## Structure
//!
//! Each command module contains:
//! - An `Args` struct that defines the command-specific arguments and options,
//!   derived using `clap`.
//! - An `execute` function that takes the parsed `Args` and performs the
//!   command's logic, calling into the `tag_compare` library.
//!
//! Arguments every command needs to reach a repository live in
//! [`RepoArgs`] and are flattened into each command.

pub mod compare;
pub mod generate;
pub mod tags;

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use log::info;
use regex::Regex;

use tag_compare::catalog::TagCatalog;
use tag_compare::defaults::{default_cache_root, DEFAULT_REPO};
use tag_compare::provider::{CommandGitProvider, RepositoryManager};
use tag_compare::suggestions;
use tag_compare::version::OrdinalPolicy;

/// Where the repository comes from and which of its tags count
#[derive(Args, Debug, Clone)]
pub struct RepoArgs {
    /// Local repository path or remote URL
    #[arg(long, value_name = "PATH|URL", env = "REPO_URL", default_value = DEFAULT_REPO)]
    pub repo: String,

    /// The root directory for cached clones of remote repositories.
    ///
    /// Defaults to the system cache directory (`~/.cache/tag-compare` on
    /// Linux, `~/Library/Caches/tag-compare` on macOS).
    #[arg(long, value_name = "DIR", env = "TAG_COMPARE_CACHE")]
    pub cache_root: Option<PathBuf>,

    /// Clone remote repositories again instead of reusing the cache
    #[arg(long)]
    pub fresh: bool,

    /// Only include tags whose name matches this regex
    #[arg(long, value_name = "REGEX")]
    pub tag_filter: Option<String>,

    /// Fail on tag names without a -v<number> suffix instead of ordering them first
    #[arg(long)]
    pub strict_versions: bool,
}

impl RepoArgs {
    /// Opens the repository, cloning it first when it is remote.
    pub fn open(&self) -> Result<CommandGitProvider> {
        let cache_root = self.cache_root.clone().unwrap_or_else(default_cache_root);
        let manager = RepositoryManager::new(cache_root);

        info!("Opening repository {}", self.repo);
        manager
            .open(&self.repo, self.fresh)
            .map_err(|e| suggestions::repository_not_found(&self.repo, &e))
    }

    /// The compiled tag filter, if one was given.
    pub fn filter(&self) -> Result<Option<Regex>> {
        self.tag_filter
            .as_deref()
            .map(|pattern| Regex::new(pattern).map_err(|e| suggestions::invalid_regex(pattern, &e)))
            .transpose()
    }

    pub fn policy(&self) -> OrdinalPolicy {
        if self.strict_versions {
            OrdinalPolicy::Strict
        } else {
            OrdinalPolicy::Demote
        }
    }

    /// Opens the repository and builds its tag catalog.
    pub fn catalog(&self) -> Result<(CommandGitProvider, TagCatalog)> {
        let filter = self.filter()?;
        let provider = self.open()?;
        let catalog = TagCatalog::build(&provider, self.policy(), filter.as_ref())
            .map_err(|e| suggestions::with_hints(e, &[]))?;
        Ok((provider, catalog))
    }
}
