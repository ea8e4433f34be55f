//! Shared test utilities for integration and E2E tests.
//!
//! This module provides a fixture that builds a real git repository with
//! version tags in a temporary directory, plus a prelude of the test crates
//! every E2E file uses.
//!
//! ## Usage
//!
//! Add `mod common;` to your test file, then use the helpers:
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! #[test]
//! fn test_example() {
//!     let Some(repo) = GitFixture::standard() else { return };
//!     repo.command().arg("tags").assert().success();
//! }
//! ```

use assert_fs::prelude::*;
use std::path::Path;
use std::process::Command;

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    pub use assert_cmd::cargo::cargo_bin_cmd;
    pub use assert_fs::prelude::*;
    #[allow(unused_imports)]
    pub use assert_fs::TempDir;
    pub use predicates::prelude::*;

    #[allow(unused_imports)]
    pub use super::git_available;
    pub use super::GitFixture;
}

/// Check if a `git` executable can be run.
///
/// Tests that need a real repository return early when it can't.
pub fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// A temporary git repository that tests commit and tag into.
///
/// # Example
///
/// ```rust,ignore
/// let repo = GitFixture::new()?
///     .with_file("README.md", "# Hello")
///     .commit_and_tag("app-v1");
/// ```
pub struct GitFixture {
    temp_dir: assert_fs::TempDir,
}

impl GitFixture {
    /// Create an empty repository, or `None` when git is unavailable.
    pub fn new() -> Option<Self> {
        if !git_available() {
            eprintln!("Skipping: git is not available");
            return None;
        }
        let fixture = Self {
            temp_dir: assert_fs::TempDir::new().expect("Failed to create temp directory"),
        };
        fixture.git(&["init", "--quiet"]);
        fixture.git(&["config", "user.name", "Test"]);
        fixture.git(&["config", "user.email", "test@example.com"]);
        fixture.git(&["config", "commit.gpgsign", "false"]);
        fixture.git(&["config", "tag.gpgsign", "false"]);
        Some(fixture)
    }

    /// A three-tag history used by most tests:
    ///
    /// - `app-v1`: `README.md`, `a.txt`, `old.txt`
    /// - `app-v2`: adds `b.txt`, modifies `a.txt`
    /// - `app-v3`: renames `old.txt` to `new.txt`, deletes `b.txt`
    pub fn standard() -> Option<Self> {
        let old_body = "line one\nline two\nline three\nline four\nline five\n";
        let fixture = Self::new()?
            .with_file("README.md", "# Project\n")
            .with_file("a.txt", "alpha\n")
            .with_file("old.txt", old_body)
            .commit_and_tag("app-v1")
            .with_file("a.txt", "alpha\nbeta\n")
            .with_file("b.txt", "bravo\n")
            .commit_and_tag("app-v2");
        fixture.git(&["mv", "old.txt", "new.txt"]);
        fixture.git(&["rm", "--quiet", "b.txt"]);
        Some(fixture.commit_and_tag("app-v3"))
    }

    /// Write a file into the working tree.
    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.temp_dir
            .child(path)
            .write_str(content)
            .expect("Failed to write file");
        self
    }

    /// Stage everything, commit, and create a lightweight tag.
    pub fn commit_and_tag(self, tag: &str) -> Self {
        self.git(&["add", "--all"]);
        self.git(&["commit", "--quiet", "--allow-empty", "-m", tag]);
        self.git(&["tag", tag]);
        self
    }

    /// Register `source` as a submodule at `path`. The change is staged, not
    /// committed.
    #[allow(dead_code)]
    pub fn with_submodule(self, path: &str, source: &GitFixture) -> Self {
        let url = source.path().display().to_string();
        self.git(&[
            "-c",
            "protocol.file.allow=always",
            "submodule",
            "--quiet",
            "add",
            &url,
            path,
        ]);
        self
    }

    /// Create an annotated tag on the current commit.
    #[allow(dead_code)]
    pub fn annotated_tag(self, tag: &str) -> Self {
        self.git(&["tag", "-a", tag, "-m", tag]);
        self
    }

    /// Run git in the repository and panic on failure.
    pub fn git(&self, args: &[&str]) {
        let output = Command::new("git")
            .arg("-C")
            .arg(self.path())
            .args(args)
            .output()
            .expect("Failed to run git");
        assert!(
            output.status.success(),
            "git {} failed: {}",
            args.join(" "),
            String::from_utf8_lossy(&output.stderr)
        );
    }

    /// Get the path to the repository.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// The repository as a `file://` URL, which is cloned like a remote.
    #[allow(dead_code)]
    pub fn file_url(&self) -> String {
        format!("file://{}", self.path().display())
    }

    /// Create a command for the tag-compare binary pointed at this repository.
    ///
    /// Colors are off so output can be matched exactly.
    pub fn command(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("tag-compare");
        cmd.arg("--color")
            .arg("never")
            .arg("--log-level")
            .arg("warn")
            .env_remove("RUST_LOG")
            .env("REPO_URL", self.path());
        cmd
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_creates_repository() {
        let Some(repo) = GitFixture::new() else {
            return;
        };
        assert!(repo.path().join(".git").exists());
    }

    #[test]
    fn test_standard_fixture_has_three_tags() {
        let Some(repo) = GitFixture::standard() else {
            return;
        };
        let output = Command::new("git")
            .arg("-C")
            .arg(repo.path())
            .args(["tag", "--list"])
            .output()
            .unwrap();
        let tags = String::from_utf8_lossy(&output.stdout);
        assert_eq!(tags.lines().count(), 3);
        assert!(repo.path().join("new.txt").exists());
    }
}
