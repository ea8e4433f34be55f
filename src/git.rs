//! Thin wrappers around the system `git` binary.
//!
//! Every function here runs one `git` process against a repository directory
//! and parses its output. File contents are read in bulk through a single
//! `cat-file --batch` process per commit. Using the system binary means credentials, SSH keys
//! and `~/.gitconfig` settings apply to clones exactly as they do for the user.

use std::collections::hash_map::DefaultHasher;
use std::fs;
use std::hash::{Hash, Hasher};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;

use log::debug;

use crate::error::{Error, Result};

/// A tag reference as listed by `git for-each-ref`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagRef {
    /// Short tag name (without `refs/tags/`)
    pub name: String,
    /// Object the ref points at (a commit, or an annotated tag object)
    pub target: String,
}

/// A single file entry of a tree-to-tree diff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFilePatch {
    /// Path in the source tree, `None` when the file was added
    pub old_path: Option<String>,
    /// Path in the target tree, `None` when the file was deleted
    pub new_path: Option<String>,
    /// Whether git considers either side binary
    pub is_binary: bool,
    /// Whether the blob content differs between the two sides
    pub has_content_change: bool,
    /// Blob id in the source tree, `None` when the file was added
    pub old_id: Option<String>,
    /// Blob id in the target tree, `None` when the file was deleted
    pub new_id: Option<String>,
}

/// Object id git prints for the absent side of an addition or deletion.
const NULL_ID: &str = "0000000000000000000000000000000000000000";

/// Tree entry mode of a submodule commit.
const GITLINK_MODE: &str = "160000";

/// Run `git -C <repo> <args>` and return stdout.
fn run_git(repo: &Path, args: &[&str]) -> Result<Vec<u8>> {
    debug!("git -C {} {}", repo.display(), args.join(" "));

    let output = Command::new("git")
        .arg("-C")
        .arg(repo)
        .args(args)
        .output()
        .map_err(|e| Error::GitCommand {
            command: args.join(" "),
            repo: repo.display().to_string(),
            stderr: e.to_string(),
        })?;

    if !output.status.success() {
        return Err(Error::GitCommand {
            command: args.join(" "),
            repo: repo.display().to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(output.stdout)
}

/// Clone a remote repository as a bare repository, with all its tags.
pub fn clone_bare(url: &str, target_dir: &Path) -> Result<()> {
    // git won't clone into an existing non-empty directory
    if target_dir.exists() {
        fs::remove_dir_all(target_dir)?;
    }
    if let Some(parent) = target_dir.parent() {
        fs::create_dir_all(parent)?;
    }

    let output = Command::new("git")
        .args(["clone", "--bare", "--quiet", url])
        .arg(target_dir)
        .output()
        .map_err(|e| Error::GitClone {
            url: url.to_string(),
            message: e.to_string(),
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let message = if stderr.contains("Authentication failed")
            || stderr.contains("Permission denied")
            || stderr.contains("Could not read from remote repository")
        {
            format!(
                "Authentication failed. Make sure you have access to the repository.\n\
                Error: {}",
                stderr.trim()
            )
        } else {
            stderr.trim().to_string()
        };

        return Err(Error::GitClone {
            url: url.to_string(),
            message,
        });
    }

    Ok(())
}

/// Convert a repository URL to its directory under the clone cache.
pub fn url_to_cache_path(cache_root: &Path, url: &str) -> PathBuf {
    let mut hasher = DefaultHasher::new();
    url.hash(&mut hasher);
    let url_hash = format!("{:x}", hasher.finish());

    // Keep the last path segment readable, e.g. `repo.git`
    let name: String = url
        .trim_end_matches('/')
        .rsplit(['/', ':'])
        .next()
        .unwrap_or("repo")
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '.' || c == '_' { c } else { '-' })
        .collect();

    cache_root.join(format!("{}-{}", url_hash, name))
}

/// Check whether `dir` is inside a git repository (bare or not).
pub fn is_repository(dir: &Path) -> bool {
    dir.is_dir() && run_git(dir, &["rev-parse", "--git-dir"]).is_ok()
}

/// List all tags of a local repository.
pub fn list_tags(repo: &Path) -> Result<Vec<TagRef>> {
    let stdout = run_git(
        repo,
        &[
            "for-each-ref",
            "--format=%(refname:strip=2)%09%(objectname)",
            "refs/tags",
        ],
    )?;
    Ok(parse_tag_refs(&String::from_utf8_lossy(&stdout)))
}

fn parse_tag_refs(stdout: &str) -> Vec<TagRef> {
    stdout
        .lines()
        .filter_map(|line| {
            // Format: <name>\t<object>
            let (name, target) = line.split_once('\t')?;
            if name.is_empty() || target.is_empty() {
                return None;
            }
            Some(TagRef {
                name: name.to_string(),
                target: target.to_string(),
            })
        })
        .collect()
}

/// Peel a tag to the commit it ultimately points at.
pub fn resolve_commit(repo: &Path, tag: &TagRef) -> Result<String> {
    let spec = format!("refs/tags/{}^{{commit}}", tag.name);
    let stdout = run_git(repo, &["rev-parse", "--verify", "--quiet", &spec]).map_err(|e| {
        Error::CommitResolution {
            tag: tag.name.clone(),
            message: e.to_string(),
        }
    })?;

    let commit = String::from_utf8_lossy(&stdout).trim().to_string();
    if commit.is_empty() {
        return Err(Error::CommitResolution {
            tag: tag.name.clone(),
            message: "tag does not point at a commit".to_string(),
        });
    }
    Ok(commit)
}

/// Diff two commits with rename detection.
pub fn diff_commits(repo: &Path, from: &str, to: &str) -> Result<Vec<RawFilePatch>> {
    let stdout = run_git(
        repo,
        &[
            "diff",
            "--raw",
            "--numstat",
            "-z",
            "-M",
            "--no-abbrev",
            "--no-ext-diff",
            "--no-textconv",
            from,
            to,
        ],
    )
    .map_err(|e| Error::DiffProvider {
        from: from.to_string(),
        to: to.to_string(),
        message: e.to_string(),
    })?;

    parse_raw_diff(&stdout).map_err(|message| Error::DiffProvider {
        from: from.to_string(),
        to: to.to_string(),
        message,
    })
}

/// One record of `--raw` output.
struct RawRecord {
    status: char,
    gitlink: bool,
    old_id: String,
    new_id: String,
    old_path: String,
    new_path: String,
}

/// Parse the NUL-separated output of `git diff --raw --numstat -z`.
///
/// Git prints all raw records first (`:<mode> <mode> <id> <id> <status>`
/// followed by one or two paths), then one numstat record per file in the
/// same order. Numstat reports `-` for binary files.
fn parse_raw_diff(stdout: &[u8]) -> std::result::Result<Vec<RawFilePatch>, String> {
    let text = String::from_utf8_lossy(stdout);
    let mut tokens = text.split('\0').filter(|t| !t.is_empty()).peekable();

    let mut records = Vec::new();
    while let Some(header) = tokens.next_if(|t| t.starts_with(':')) {
        let fields: Vec<&str> = header[1..].split(' ').collect();
        if fields.len() != 5 {
            return Err(format!("malformed raw diff header {:?}", header));
        }
        let status = fields[4]
            .chars()
            .next()
            .ok_or_else(|| format!("missing status in {:?}", header))?;

        let first = tokens
            .next()
            .ok_or_else(|| format!("missing path after {:?}", header))?
            .to_string();
        let second = if matches!(status, 'R' | 'C') {
            tokens
                .next()
                .ok_or_else(|| format!("missing rename target after {:?}", header))?
                .to_string()
        } else {
            first.clone()
        };

        records.push(RawRecord {
            status,
            gitlink: fields[0] == GITLINK_MODE || fields[1] == GITLINK_MODE,
            old_id: fields[2].to_string(),
            new_id: fields[3].to_string(),
            old_path: first,
            new_path: second,
        });
    }

    let mut binary = Vec::with_capacity(records.len());
    while let Some(stat) = tokens.next() {
        let mut fields = stat.splitn(3, '\t');
        let added = fields.next().unwrap_or_default();
        let _deleted = fields.next();
        // Renames leave the path field empty and list both paths next
        if fields.next().unwrap_or_default().is_empty() {
            tokens.next();
            tokens.next();
        }
        binary.push(added == "-");
    }

    if !binary.is_empty() && binary.len() != records.len() {
        return Err(format!(
            "raw diff lists {} files but numstat lists {}",
            records.len(),
            binary.len()
        ));
    }

    Ok(records
        .into_iter()
        .enumerate()
        .filter_map(|(i, record)| {
            if record.gitlink {
                debug!("skipping submodule {}", record.new_path);
                return None;
            }
            let is_binary = binary.get(i).copied().unwrap_or(false);
            let has_content_change = record.old_id != record.new_id;
            let old_id = Some(record.old_id).filter(|id| id != NULL_ID);
            let new_id = Some(record.new_id).filter(|id| id != NULL_ID);
            let (old_path, new_path, old_id) = match record.status {
                'A' => (None, Some(record.new_path), None),
                'D' => (Some(record.old_path), None, old_id),
                // A copy leaves its source in place
                'C' => (None, Some(record.new_path), None),
                'R' | 'M' | 'T' => (Some(record.old_path), Some(record.new_path), old_id),
                other => {
                    debug!("skipping diff entry with status {}", other);
                    return None;
                }
            };
            let new_id = if new_path.is_some() { new_id } else { None };
            Some(RawFilePatch {
                old_path,
                new_path,
                is_binary,
                has_content_change,
                old_id,
                new_id,
            })
        })
        .collect())
}

/// List the path of every blob in a commit's tree.
///
/// Submodules (gitlink entries) have no content in this repository and are
/// left out.
pub fn list_files(repo: &Path, commit: &str) -> Result<Vec<String>> {
    let stdout = run_git(repo, &["ls-tree", "-r", "-z", "--full-tree", commit])?;
    Ok(parse_tree_blobs(&String::from_utf8_lossy(&stdout)))
}

fn parse_tree_blobs(stdout: &str) -> Vec<String> {
    stdout
        .split('\0')
        .filter_map(|entry| {
            // Format: <mode> <type> <object>\t<path>
            let (meta, path) = entry.split_once('\t')?;
            let kind = meta.split(' ').nth(1)?;
            if kind == "blob" {
                Some(path.to_string())
            } else {
                debug!("skipping {} entry {}", kind, path);
                None
            }
        })
        .collect()
}

/// Read a file's bytes at a commit.
pub fn file_content(repo: &Path, commit: &str, path: &str) -> Result<Vec<u8>> {
    let spec = format!("{}:{}", commit, path);
    run_git(repo, &["cat-file", "blob", &spec]).map_err(|_| Error::NotFound {
        commit: commit.to_string(),
        path: path.to_string(),
    })
}

/// Read many files of one commit through a single `git cat-file --batch`.
///
/// Contents come back in the order of `paths`. A path that is not a blob at
/// `commit` fails the whole read with `Error::NotFound`.
pub fn read_files(repo: &Path, commit: &str, paths: &[String]) -> Result<Vec<Vec<u8>>> {
    if paths.is_empty() {
        return Ok(Vec::new());
    }
    debug!(
        "git -C {} cat-file --batch ({} objects at {})",
        repo.display(),
        paths.len(),
        commit
    );

    let command_error = |stderr: String| Error::GitCommand {
        command: "cat-file --batch".to_string(),
        repo: repo.display().to_string(),
        stderr,
    };

    let mut child = Command::new("git")
        .arg("-C")
        .arg(repo)
        .args(["cat-file", "--batch"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| command_error(e.to_string()))?;

    let mut input = String::new();
    for path in paths {
        input.push_str(commit);
        input.push(':');
        input.push_str(path);
        input.push('\n');
    }

    // Writing from another thread keeps a full stdout pipe from blocking us
    let mut stdin = child
        .stdin
        .take()
        .ok_or_else(|| command_error("stdin not captured".to_string()))?;
    let writer = thread::spawn(move || stdin.write_all(input.as_bytes()));

    let output = child.wait_with_output()?;
    writer
        .join()
        .map_err(|_| command_error("stdin writer panicked".to_string()))??;

    if !output.status.success() {
        return Err(command_error(
            String::from_utf8_lossy(&output.stderr).trim().to_string(),
        ));
    }
    parse_batch(&output.stdout, commit, paths)
}

/// Split `cat-file --batch` output into one content per requested path.
///
/// Each object is `<oid> <type> <size>\n<content>\n`; unknown specs print
/// `<spec> missing\n` instead.
fn parse_batch(stdout: &[u8], commit: &str, paths: &[String]) -> Result<Vec<Vec<u8>>> {
    let mut rest = stdout;
    let mut contents = Vec::with_capacity(paths.len());

    for path in paths {
        let not_found = || Error::NotFound {
            commit: commit.to_string(),
            path: path.clone(),
        };

        let newline = rest.iter().position(|&b| b == b'\n').ok_or_else(not_found)?;
        let header = String::from_utf8_lossy(&rest[..newline]).into_owned();
        rest = &rest[newline + 1..];

        let mut fields = header.rsplitn(3, ' ');
        let size = fields.next().and_then(|s| s.parse::<usize>().ok());
        let kind = fields.next();
        match (kind, size) {
            (Some("blob"), Some(size)) if rest.len() >= size => {
                contents.push(rest[..size].to_vec());
                rest = rest.get(size + 1..).unwrap_or_default();
            }
            _ => return Err(not_found()),
        }
    }

    Ok(contents)
}
