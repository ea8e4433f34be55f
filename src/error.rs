//! # Error Handling
//!
//! This module defines the centralized error type for the `tag-compare`
//! library. It uses the `thiserror` library to create an `Error` enum that
//! covers every failure mode of catalog construction, chain building, diff
//! composition and site output.
//!
//! ## Key Components
//!
//! - **`Error`**: The main enum. Each variant carries enough context (tag
//!   names, commit ids, paths) to explain the failure without a backtrace.
//!
//! - **`Result<T>`**: A type alias for `std::result::Result<T, Error>`.
//!
//! ## Severity
//!
//! Errors fall into three groups:
//!
//! - **Run-fatal**: `EmptyCatalog`, `DuplicateOrdinal`, `CommitResolution`,
//!   `DiffProvider` raised while building the chain, and `GitClone`. No
//!   partial site is produced.
//! - **Pair-scoped**: `TagNotFound` raised by the composer. Other pairs are
//!   still evaluated.
//! - **Recoverable**: `Format` is downgraded to a warning unless the strict
//!   ordinal policy is selected.

use thiserror::Error;

/// Main error type for tag-compare operations
#[derive(Error, Debug)]
pub enum Error {
    /// A tag name does not carry a `<label>-v<digits>` version suffix.
    #[error("Tag format error: {tag:?} - {message}")]
    Format { tag: String, message: String },

    /// Two tags produced the same ordinal, so no strict order exists.
    #[error("Duplicate tag ordinal {ordinal}: {first} and {second}")]
    DuplicateOrdinal {
        ordinal: u64,
        first: String,
        second: String,
    },

    /// The repository has no tags (or none survived filtering).
    #[error("No tags found in repository{}", filter.as_ref().map(|f| format!(" matching {:?}", f)).unwrap_or_default())]
    EmptyCatalog {
        /// The tag filter that was active, if any
        filter: Option<String>,
    },

    /// A tag could not be resolved to a commit.
    #[error("Could not resolve tag {tag} to a commit: {message}")]
    CommitResolution { tag: String, message: String },

    /// A requested tag is not part of the catalog or the chain walk could
    /// not be bounded by it.
    #[error("Tag not found: {tag}")]
    TagNotFound { tag: String },

    /// The diff collaborator failed for a pair of commits.
    #[error("Diff provider error for {from}..{to}: {message}")]
    DiffProvider {
        from: String,
        to: String,
        message: String,
    },

    /// A file does not exist at the given commit.
    #[error("File not found: {path} at {commit}")]
    NotFound { commit: String, path: String },

    /// An error occurred while executing a Git command.
    #[error("Git command failed in {repo}: {command} - {stderr}")]
    GitCommand {
        command: String,
        repo: String,
        stderr: String,
    },

    /// An error occurred while cloning a remote repository.
    #[error("Git clone error for {url}: {message}")]
    GitClone { url: String, message: String },

    /// A page could not be rendered.
    #[error("Render error for {page}: {message}")]
    Render { page: String, message: String },

    /// An error occurred with a filesystem operation.
    #[error("Filesystem operation error: {message}")]
    Filesystem { message: String },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A JSON serialization error, wrapped from `serde_json::Error`.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A regular expression error, wrapped from `regex::Error`.
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    /// A glob pattern error, wrapped from `glob::PatternError`.
    #[error("Glob pattern error: {0}")]
    Glob(#[from] glob::PatternError),

    /// A URL parsing error, wrapped from `url::ParseError`.
    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),

    /// A worker pool could not be created.
    #[error("Thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
