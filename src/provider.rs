//! # Git Object Providers
//!
//! The core never talks to git directly. Everything it needs from the object
//! store goes through the [`GitProvider`] trait:
//!
//! - **`list_tags`** / **`resolve_commit`**: feed the tag catalog.
//! - **`diff_commits`**: file-level patches between two commits, used once per
//!   pair of adjacent tags.
//! - **`list_files`** / **`read_files`**: used when the site pulls file
//!   contents for each tag. `read_files` reads a whole batch at once;
//!   `file_content` reads a single file.
//!
//! Two implementations are provided:
//!
//! - **`CommandGitProvider`** shells out to the system `git` binary against a
//!   local repository directory. `RepositoryManager` produces one for a local
//!   path or for a remote URL cloned into the on-disk cache.
//! - **`SnapshotProvider`** keeps whole trees in memory as `MemoryFS`
//!   snapshots. It computes diffs itself (renames are detected by identical
//!   content, blob ids are content hashes) and counts diff calls, which makes it handy for tests and
//!   benchmarks.

use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeMap, BTreeSet};
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use log::info;

use crate::error::{Error, Result};
use crate::filesystem::MemoryFS;
use crate::git::{self, RawFilePatch, TagRef};

/// Opaque commit identifier.
pub type CommitId = String;

/// Access to the git object store.
pub trait GitProvider: Send + Sync {
    /// Lists every tag reference of the repository.
    fn list_tags(&self) -> Result<Vec<TagRef>>;

    /// Resolves a tag reference to the commit it points at.
    fn resolve_commit(&self, tag: &TagRef) -> Result<CommitId>;

    /// Computes file-level patches turning `from` into `to`.
    fn diff_commits(&self, from: &str, to: &str) -> Result<Vec<RawFilePatch>>;

    /// Lists every file path in a commit's tree.
    fn list_files(&self, commit: &str) -> Result<Vec<String>>;

    /// Reads a file at a commit, failing with `Error::NotFound`.
    fn file_content(&self, commit: &str, path: &str) -> Result<Vec<u8>>;

    /// Reads many files at a commit, in the order of `paths`.
    fn read_files(&self, commit: &str, paths: &[String]) -> Result<Vec<Vec<u8>>> {
        paths
            .iter()
            .map(|path| self.file_content(commit, path))
            .collect()
    }
}

/// The default provider, running the system `git` binary.
#[derive(Debug, Clone)]
pub struct CommandGitProvider {
    repo_dir: PathBuf,
}

impl CommandGitProvider {
    /// Creates a provider for an existing local repository.
    pub fn new(repo_dir: PathBuf) -> Self {
        Self { repo_dir }
    }

    /// The repository directory this provider runs against.
    pub fn repo_dir(&self) -> &Path {
        &self.repo_dir
    }
}

impl GitProvider for CommandGitProvider {
    fn list_tags(&self) -> Result<Vec<TagRef>> {
        git::list_tags(&self.repo_dir)
    }

    fn resolve_commit(&self, tag: &TagRef) -> Result<CommitId> {
        git::resolve_commit(&self.repo_dir, tag)
    }

    fn diff_commits(&self, from: &str, to: &str) -> Result<Vec<RawFilePatch>> {
        git::diff_commits(&self.repo_dir, from, to)
    }

    fn list_files(&self, commit: &str) -> Result<Vec<String>> {
        git::list_files(&self.repo_dir, commit)
    }

    fn file_content(&self, commit: &str, path: &str) -> Result<Vec<u8>> {
        git::file_content(&self.repo_dir, commit, path)
    }

    fn read_files(&self, commit: &str, paths: &[String]) -> Result<Vec<Vec<u8>>> {
        git::read_files(&self.repo_dir, commit, paths)
    }
}

/// Locates or fetches the repository a generation run works on.
///
/// Remote repositories are bare-cloned into `cache_root` once and reused on
/// later runs.
pub struct RepositoryManager {
    cache_root: PathBuf,
}

impl RepositoryManager {
    /// Creates a manager using `cache_root` for remote clones.
    pub fn new(cache_root: PathBuf) -> Self {
        Self { cache_root }
    }

    /// Opens `source`, which is either a local repository path or a remote
    /// URL. With `fresh`, a cached clone is discarded and cloned again.
    pub fn open(&self, source: &str, fresh: bool) -> Result<CommandGitProvider> {
        let local = Path::new(source);
        if local.exists() {
            if !git::is_repository(local) {
                return Err(Error::Filesystem {
                    message: format!("{} is not a git repository", local.display()),
                });
            }
            return Ok(CommandGitProvider::new(local.to_path_buf()));
        }

        let url = normalize_remote(source)?;
        let cache_path = git::url_to_cache_path(&self.cache_root, &url);

        if fresh || !git::is_repository(&cache_path) {
            info!("Cloning {} into {}", url, cache_path.display());
            git::clone_bare(&url, &cache_path)?;
        } else {
            info!("Using cached clone {}", cache_path.display());
        }

        Ok(CommandGitProvider::new(cache_path))
    }
}

/// Validates a remote repository location.
///
/// Accepts anything `url` can parse (`https://`, `ssh://`, `file://`) and
/// scp-like `user@host:path` locations, which are not URLs.
fn normalize_remote(source: &str) -> Result<String> {
    let is_scp_like = source.contains('@') && source.contains(':') && !source.contains("://");
    if is_scp_like {
        return Ok(source.to_string());
    }
    let url = url::Url::parse(source)?;
    Ok(url.to_string())
}

/// An in-memory provider holding one `MemoryFS` snapshot per commit.
#[derive(Debug, Default)]
pub struct SnapshotProvider {
    tags: Vec<TagRef>,
    commits: BTreeMap<CommitId, MemoryFS>,
    diff_calls: AtomicUsize,
}

impl SnapshotProvider {
    /// Creates an empty provider.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a tag pointing at a new commit holding `snapshot`.
    pub fn with_tag(mut self, name: &str, snapshot: MemoryFS) -> Self {
        self.add_tag(name, snapshot);
        self
    }

    /// Adds a tag pointing at a new commit holding `snapshot`.
    pub fn add_tag(&mut self, name: &str, snapshot: MemoryFS) {
        let commit = format!("{:040x}", self.commits.len() + 1);
        self.tags.push(TagRef {
            name: name.to_string(),
            target: commit.clone(),
        });
        self.commits.insert(commit, snapshot);
    }

    /// Number of `diff_commits` calls served so far.
    pub fn diff_calls(&self) -> usize {
        self.diff_calls.load(Ordering::SeqCst)
    }

    fn snapshot(&self, commit: &str) -> Result<&MemoryFS> {
        self.commits.get(commit).ok_or_else(|| Error::NotFound {
            commit: commit.to_string(),
            path: String::new(),
        })
    }
}

impl GitProvider for SnapshotProvider {
    fn list_tags(&self) -> Result<Vec<TagRef>> {
        Ok(self.tags.clone())
    }

    fn resolve_commit(&self, tag: &TagRef) -> Result<CommitId> {
        if self.commits.contains_key(&tag.target) {
            Ok(tag.target.clone())
        } else {
            Err(Error::CommitResolution {
                tag: tag.name.clone(),
                message: format!("unknown object {}", tag.target),
            })
        }
    }

    fn diff_commits(&self, from: &str, to: &str) -> Result<Vec<RawFilePatch>> {
        self.diff_calls.fetch_add(1, Ordering::SeqCst);

        let lookup = |commit: &str| {
            self.snapshot(commit).map_err(|_| Error::DiffProvider {
                from: from.to_string(),
                to: to.to_string(),
                message: format!("unknown commit {}", commit),
            })
        };
        let old = lookup(from)?;
        let new = lookup(to)?;

        let old_paths = paths_of(old);
        let new_paths = paths_of(new);
        let mut patches = Vec::new();

        for path in old_paths.intersection(&new_paths) {
            let before = old.get_file(path).map(|f| &f.content);
            let after = new.get_file(path).map(|f| &f.content);
            patches.push(RawFilePatch {
                old_path: Some(path.clone()),
                new_path: Some(path.clone()),
                is_binary: is_binary(before.map(Vec::as_slice))
                    || is_binary(after.map(Vec::as_slice)),
                has_content_change: before != after,
                old_id: blob_id(before),
                new_id: blob_id(after),
            });
        }

        let mut added: Vec<&String> = new_paths.difference(&old_paths).collect();
        for path in old_paths.difference(&new_paths) {
            let content = old.get_file(path).map(|f| &f.content);
            // Pair a removed file with an added one of identical content
            let twin = added.iter().position(|candidate| {
                new.get_file(candidate.as_str()).map(|f| &f.content) == content
            });
            let binary = is_binary(content.map(Vec::as_slice));
            match twin {
                Some(index) => {
                    let target = added.remove(index);
                    patches.push(RawFilePatch {
                        old_path: Some(path.clone()),
                        new_path: Some(target.clone()),
                        is_binary: binary,
                        has_content_change: false,
                        old_id: blob_id(content),
                        new_id: blob_id(content),
                    });
                }
                None => patches.push(RawFilePatch {
                    old_path: Some(path.clone()),
                    new_path: None,
                    is_binary: binary,
                    has_content_change: true,
                    old_id: blob_id(content),
                    new_id: None,
                }),
            }
        }

        for path in added {
            let content = new.get_file(path.as_str()).map(|f| &f.content);
            patches.push(RawFilePatch {
                old_path: None,
                new_path: Some(path.clone()),
                is_binary: is_binary(content.map(Vec::as_slice)),
                has_content_change: true,
                old_id: None,
                new_id: blob_id(content),
            });
        }

        Ok(patches)
    }

    fn list_files(&self, commit: &str) -> Result<Vec<String>> {
        Ok(paths_of(self.snapshot(commit)?).into_iter().collect())
    }

    fn file_content(&self, commit: &str, path: &str) -> Result<Vec<u8>> {
        self.snapshot(commit)?
            .get_file(path)
            .map(|f| f.content.clone())
            .ok_or_else(|| Error::NotFound {
                commit: commit.to_string(),
                path: path.to_string(),
            })
    }
}

fn paths_of(fs: &MemoryFS) -> BTreeSet<String> {
    fs.files()
        .map(|(path, _)| path.to_string_lossy().replace('\\', "/"))
        .collect()
}

/// Content hash standing in for a git blob id.
fn blob_id(content: Option<&Vec<u8>>) -> Option<String> {
    content.map(|bytes| {
        let mut hasher = DefaultHasher::new();
        bytes.hash(&mut hasher);
        format!("{:016x}", hasher.finish())
    })
}

/// Git's heuristic: a NUL byte in the first 8000 bytes marks binary content.
fn is_binary(content: Option<&[u8]>) -> bool {
    content.is_some_and(|bytes| bytes.iter().take(8000).any(|&b| b == 0))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(files: &[(&str, &str)]) -> MemoryFS {
        let mut fs = MemoryFS::new();
        for (path, content) in files {
            fs.add_file_string(path, content).unwrap();
        }
        fs
    }

    fn provider() -> SnapshotProvider {
        SnapshotProvider::new()
            .with_tag(
                "1.0-v1",
                snapshot(&[("keep.txt", "same"), ("edit.txt", "one"), ("old.txt", "moved")]),
            )
            .with_tag(
                "1.1-v2",
                snapshot(&[("keep.txt", "same"), ("edit.txt", "two"), ("new.txt", "moved"), ("add.txt", "x")]),
            )
    }

    fn commit_of(provider: &SnapshotProvider, name: &str) -> CommitId {
        let tags = provider.list_tags().unwrap();
        let tag = tags.iter().find(|t| t.name == name).unwrap();
        provider.resolve_commit(tag).unwrap()
    }

    #[test]
    fn test_snapshot_diff_classifies_files() {
        let provider = provider();
        let from = commit_of(&provider, "1.0-v1");
        let to = commit_of(&provider, "1.1-v2");

        let patches = provider.diff_commits(&from, &to).unwrap();
        let find = |old: Option<&str>, new: Option<&str>| {
            patches
                .iter()
                .find(|p| p.old_path.as_deref() == old && p.new_path.as_deref() == new)
                .cloned()
        };

        assert!(!find(Some("keep.txt"), Some("keep.txt")).unwrap().has_content_change);
        let edit = find(Some("edit.txt"), Some("edit.txt")).unwrap();
        assert!(edit.has_content_change);
        assert_ne!(edit.old_id, edit.new_id);
        let rename = find(Some("old.txt"), Some("new.txt")).unwrap();
        assert!(rename.old_id.is_some());
        assert_eq!(rename.old_id, rename.new_id);
        let add = find(None, Some("add.txt")).unwrap();
        assert_eq!(add.old_id, None);
        assert!(add.new_id.is_some());
        assert_eq!(patches.len(), 4);
        assert_eq!(provider.diff_calls(), 1);
    }

    #[test]
    fn test_snapshot_binary_detection() {
        let mut old = MemoryFS::new();
        old.add_file_content("logo.png", vec![0x89, 0x50, 0x00, 0x01]).unwrap();
        let mut new = MemoryFS::new();
        new.add_file_content("logo.png", vec![0x89, 0x50, 0x00, 0x02]).unwrap();
        let provider = SnapshotProvider::new()
            .with_tag("a-v1", old)
            .with_tag("a-v2", new);

        let from = commit_of(&provider, "a-v1");
        let to = commit_of(&provider, "a-v2");
        let patches = provider.diff_commits(&from, &to).unwrap();
        assert_eq!(patches.len(), 1);
        assert!(patches[0].is_binary);
        assert!(patches[0].has_content_change);
    }

    #[test]
    fn test_snapshot_unknown_commit() {
        let provider = provider();
        let err = provider.diff_commits("nope", "nada").unwrap_err();
        assert!(matches!(err, Error::DiffProvider { .. }));
    }

    #[test]
    fn test_snapshot_resolve_unknown_target() {
        let provider = provider();
        let err = provider
            .resolve_commit(&TagRef {
                name: "ghost-v9".to_string(),
                target: "missing".to_string(),
            })
            .unwrap_err();
        assert!(matches!(err, Error::CommitResolution { ref tag, .. } if tag == "ghost-v9"));
    }

    #[test]
    fn test_snapshot_file_content() {
        let provider = provider();
        let commit = commit_of(&provider, "1.1-v2");
        assert_eq!(provider.file_content(&commit, "edit.txt").unwrap(), b"two");
        assert!(matches!(
            provider.file_content(&commit, "old.txt").unwrap_err(),
            Error::NotFound { .. }
        ));
        assert_eq!(
            provider.list_files(&commit).unwrap(),
            vec!["add.txt", "edit.txt", "keep.txt", "new.txt"]
        );
    }

    #[test]
    fn test_read_files_keeps_order() {
        let provider = provider();
        let commit = commit_of(&provider, "1.1-v2");
        let paths = vec!["new.txt".to_string(), "add.txt".to_string()];
        assert_eq!(
            provider.read_files(&commit, &paths).unwrap(),
            vec![b"moved".to_vec(), b"x".to_vec()]
        );

        let missing = vec!["add.txt".to_string(), "old.txt".to_string()];
        assert!(matches!(
            provider.read_files(&commit, &missing).unwrap_err(),
            Error::NotFound { ref path, .. } if path == "old.txt"
        ));
    }

    #[test]
    fn test_normalize_remote() {
        assert_eq!(
            normalize_remote("https://github.com/org/repo.git").unwrap(),
            "https://github.com/org/repo.git"
        );
        assert_eq!(
            normalize_remote("git@github.com:org/repo.git").unwrap(),
            "git@github.com:org/repo.git"
        );
        assert!(normalize_remote("definitely not a url").is_err());
    }

    #[test]
    fn test_open_missing_local_path_is_not_a_url() {
        let temp = tempfile::TempDir::new().unwrap();
        let manager = RepositoryManager::new(temp.path().join("cache"));
        let result = manager.open("./no/such/dir", false);
        assert!(matches!(result, Err(Error::UrlParse(_))));
    }

    #[test]
    fn test_open_plain_directory_is_rejected() {
        let temp = tempfile::TempDir::new().unwrap();
        let manager = RepositoryManager::new(temp.path().join("cache"));
        let plain = temp.path().join("plain");
        std::fs::create_dir_all(&plain).unwrap();
        // A temp dir could sit inside a checkout; only assert when it does not
        if !git::is_repository(temp.path()) {
            let result = manager.open(plain.to_str().unwrap(), false);
            assert!(matches!(result, Err(Error::Filesystem { .. })));
        }
    }
}
