//! Default values for tag-compare configuration.
//!
//! This module provides centralized default values used across commands,
//! ensuring consistency and avoiding duplication.

use std::path::PathBuf;

/// Repository scanned when neither `--repo` nor `REPO_URL` is given.
pub const DEFAULT_REPO: &str = ".";

/// Output directory of `generate`.
pub const DEFAULT_OUTPUT: &str = "output";

/// Returns the default cache root directory for remote clones.
///
/// Uses the platform-appropriate cache directory:
/// - Linux: `~/.cache/tag-compare` (XDG Base Directory)
/// - macOS: `~/Library/Caches/tag-compare`
/// - Windows: `{FOLDERID_LocalAppData}\tag-compare`
///
/// Falls back to `.tag-compare-cache` in the current directory if the
/// platform cache directory cannot be determined.
///
/// This can be overridden by the `--cache-root` CLI flag or the
/// `TAG_COMPARE_CACHE` environment variable.
pub fn default_cache_root() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from(".tag-compare-cache"))
        .join("tag-compare")
}
