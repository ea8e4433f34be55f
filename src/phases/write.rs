//! Phase 6: Writing to Disk
//!
//! The final phase writes the staged site to the output directory.
//!
//! ## Process
//!
//! 1.  **Create Root**: The output directory is created if missing.
//!
//! 2.  **Iterate Files**: Staged files are visited in path order.
//!
//! 3.  **Create Directories**: Parent directories are created recursively.
//!
//! 4.  **Write Content**: Each file is written, replacing any existing file
//!     of the same name. Files already in the output directory that the run
//!     did not stage are left alone.

use std::fs;
use std::path::Path;

use log::info;

use crate::error::{Error, Result};
use crate::filesystem::MemoryFS;

/// Execute Phase 6: Write the staged site to disk
///
/// Returns the number of files written.
pub fn execute(site: &MemoryFS, output_path: &Path) -> Result<usize> {
    fs::create_dir_all(output_path).map_err(|e| Error::Filesystem {
        message: format!(
            "Failed to create output directory '{}': {}",
            output_path.display(),
            e
        ),
    })?;

    for (relative_path, file) in site.files() {
        let full_path = output_path.join(relative_path);

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).map_err(|e| Error::Filesystem {
                message: format!("Failed to create directory '{}': {}", parent.display(), e),
            })?;
        }

        fs::write(&full_path, &file.content).map_err(|e| Error::Filesystem {
            message: format!("Failed to write file '{}': {}", full_path.display(), e),
        })?;
    }

    info!(
        "Wrote {} files ({} bytes) to {}",
        site.len(),
        site.total_size(),
        output_path.display()
    );
    Ok(site.len())
}

#[cfg(test)]
mod tests {
    use super::execute;
    use crate::filesystem::MemoryFS;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_phase6_write_nested_pages() {
        let temp_dir = TempDir::new().unwrap();
        let output_path = temp_dir.path();

        let mut site = MemoryFS::new();
        site.add_file_string("index.html", "<html></html>").unwrap();
        site.add_file_string("files/a-v1/a-v2.html", "<ul></ul>")
            .unwrap();
        site.add_file_string("content/a-v2/src/deep/mod.rs", "mod x;")
            .unwrap();

        let written = execute(&site, output_path).unwrap();
        assert_eq!(written, 3);

        assert!(output_path.join("index.html").exists());
        assert_eq!(
            fs::read_to_string(output_path.join("files/a-v1/a-v2.html")).unwrap(),
            "<ul></ul>"
        );
        assert_eq!(
            fs::read_to_string(output_path.join("content/a-v2/src/deep/mod.rs")).unwrap(),
            "mod x;"
        );
    }

    #[test]
    fn test_phase6_creates_missing_output_root() {
        let temp_dir = TempDir::new().unwrap();
        let output_path = temp_dir.path().join("site/output");

        let mut site = MemoryFS::new();
        site.add_file_string("tags.json", "[]").unwrap();

        execute(&site, &output_path).unwrap();
        assert!(output_path.join("tags.json").exists());
    }

    #[test]
    fn test_phase6_write_binary_content() {
        let temp_dir = TempDir::new().unwrap();
        let output_path = temp_dir.path();

        let mut site = MemoryFS::new();
        let binary_data = vec![0u8, 1u8, 2u8, 255u8, 128u8];
        site.add_file_content("content/a-v1/logo.png", binary_data.clone())
            .unwrap();

        execute(&site, output_path).unwrap();
        assert_eq!(
            fs::read(output_path.join("content/a-v1/logo.png")).unwrap(),
            binary_data
        );
    }

    #[test]
    fn test_phase6_empty_site() {
        let temp_dir = TempDir::new().unwrap();
        let output_path = temp_dir.path();

        assert_eq!(execute(&MemoryFS::new(), output_path).unwrap(), 0);
        assert!(fs::read_dir(output_path).unwrap().next().is_none());
    }

    #[test]
    fn test_phase6_overwrites_but_keeps_unrelated_files() {
        let temp_dir = TempDir::new().unwrap();
        let output_path = temp_dir.path();
        fs::write(output_path.join("index.html"), "old").unwrap();
        fs::write(output_path.join("CNAME"), "example.com").unwrap();

        let mut site = MemoryFS::new();
        site.add_file_string("index.html", "new").unwrap();
        execute(&site, output_path).unwrap();

        assert_eq!(
            fs::read_to_string(output_path.join("index.html")).unwrap(),
            "new"
        );
        assert_eq!(
            fs::read_to_string(output_path.join("CNAME")).unwrap(),
            "example.com"
        );
    }
}
