//! Directory listing for shares.

use std::cmp::Ordering;
use std::fs;
use std::io;
use std::path::Path;

use serde::Serialize;

use crate::datetime::unix_seconds;
use crate::{Result, ShareError};

/// One child of a listed directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entry {
    /// File or directory name.
    pub name: String,
    /// Whether the entry is a directory (symlinks are followed).
    pub is_dir: bool,
    /// Size in bytes.
    pub size: u64,
    /// Modification time in seconds since the Unix epoch.
    pub mtime: i64,
    /// MIME type guessed from the extension.
    pub mime: String,
}

/// Guess a MIME type from the file extension, falling back to `application/octet-stream`.
pub fn guess_mime(path: &Path) -> String {
    mime_guess::from_path(path)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

/// List the immediate children of `dir`.
///
/// Directories come first, then everything is ordered by case-insensitive
/// name. When `filter` is non-empty only names containing it
/// (case-insensitively) are kept. Children whose metadata cannot be read,
/// such as dangling symlinks, are skipped.
pub fn list_dir(dir: &Path, filter: Option<&str>) -> Result<Vec<Entry>> {
    match fs::metadata(dir) {
        Ok(meta) if meta.is_dir() => {}
        Ok(_) => return Err(ShareError::NotFound("directory".to_string())),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(ShareError::NotFound("directory".to_string()))
        }
        Err(e) => return Err(e.into()),
    }

    let needle = filter
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .map(str::to_lowercase);

    let mut entries = Vec::new();
    for dir_entry in fs::read_dir(dir)? {
        let dir_entry = dir_entry?;
        let name = dir_entry.file_name().to_string_lossy().into_owned();

        if let Some(needle) = &needle {
            if !name.to_lowercase().contains(needle.as_str()) {
                continue;
            }
        }

        let path = dir_entry.path();
        let meta = match fs::metadata(&path) {
            Ok(meta) => meta,
            Err(e) => {
                tracing::debug!(name = %name, error = %e, "Skipping unreadable entry");
                continue;
            }
        };

        entries.push(Entry {
            is_dir: meta.is_dir(),
            size: meta.len(),
            mtime: meta.modified().map(unix_seconds).unwrap_or(0),
            mime: guess_mime(&path),
            name,
        });
    }

    entries.sort_by(compare_entries);
    Ok(entries)
}

fn compare_entries(a: &Entry, b: &Entry) -> Ordering {
    b.is_dir
        .cmp(&a.is_dir)
        .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn names(entries: &[Entry]) -> Vec<&str> {
        entries.iter().map(|e| e.name.as_str()).collect()
    }

    #[test]
    fn test_directories_before_files() {
        let temp_dir = TempDir::new().unwrap();
        // File created first on purpose
        fs::write(temp_dir.path().join("a.txt"), b"hi").unwrap();
        fs::create_dir(temp_dir.path().join("B")).unwrap();

        let entries = list_dir(temp_dir.path(), None).unwrap();
        assert_eq!(names(&entries), vec!["B", "a.txt"]);
        assert!(entries[0].is_dir);
        assert!(!entries[1].is_dir);
    }

    #[test]
    fn test_case_insensitive_order() {
        let temp_dir = TempDir::new().unwrap();
        for name in ["beta.txt", "Alpha.txt", "gamma.txt"] {
            fs::write(temp_dir.path().join(name), b"").unwrap();
        }
        fs::create_dir(temp_dir.path().join("zeta")).unwrap();
        fs::create_dir(temp_dir.path().join("Eta")).unwrap();

        let entries = list_dir(temp_dir.path(), None).unwrap();
        assert_eq!(
            names(&entries),
            vec!["Eta", "zeta", "Alpha.txt", "beta.txt", "gamma.txt"]
        );
    }

    #[test]
    fn test_entry_metadata() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("notes.txt"), b"hello").unwrap();
        fs::write(temp_dir.path().join("blob.unknownext"), b"x").unwrap();

        let entries = list_dir(temp_dir.path(), None).unwrap();
        let notes = entries.iter().find(|e| e.name == "notes.txt").unwrap();
        assert_eq!(notes.size, 5);
        assert_eq!(notes.mime, "text/plain");
        assert!(notes.mtime > 0);

        let blob = entries.iter().find(|e| e.name == "blob.unknownext").unwrap();
        assert_eq!(blob.mime, "application/octet-stream");
    }

    #[test]
    fn test_non_recursive() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir(temp_dir.path().join("sub")).unwrap();
        fs::write(temp_dir.path().join("sub").join("deep.txt"), b"").unwrap();

        let entries = list_dir(temp_dir.path(), None).unwrap();
        assert_eq!(names(&entries), vec!["sub"]);
    }

    #[test]
    fn test_filter_is_case_insensitive_substring() {
        let temp_dir = TempDir::new().unwrap();
        for name in ["Report.pdf", "photo.JPG", "old_report.txt"] {
            fs::write(temp_dir.path().join(name), b"").unwrap();
        }

        let entries = list_dir(temp_dir.path(), Some("REPORT")).unwrap();
        assert_eq!(names(&entries), vec!["old_report.txt", "Report.pdf"]);

        let entries = list_dir(temp_dir.path(), Some("  ")).unwrap();
        assert_eq!(entries.len(), 3);
    }

    #[test]
    fn test_missing_directory() {
        let temp_dir = TempDir::new().unwrap();
        let result = list_dir(&temp_dir.path().join("missing"), None);
        assert!(matches!(result, Err(ShareError::NotFound(_))));
    }

    #[test]
    fn test_file_is_not_listable() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("file.txt");
        fs::write(&file, b"").unwrap();

        assert!(matches!(list_dir(&file, None), Err(ShareError::NotFound(_))));
    }

    #[cfg(unix)]
    #[test]
    fn test_dangling_symlink_skipped() {
        let temp_dir = TempDir::new().unwrap();
        std::os::unix::fs::symlink(
            temp_dir.path().join("nowhere"),
            temp_dir.path().join("broken"),
        )
        .unwrap();
        fs::write(temp_dir.path().join("ok.txt"), b"").unwrap();

        let entries = list_dir(temp_dir.path(), None).unwrap();
        assert_eq!(names(&entries), vec!["ok.txt"]);
    }

    #[test]
    fn test_guess_mime() {
        assert_eq!(guess_mime(Path::new("a.png")), "image/png");
        assert_eq!(guess_mime(Path::new("a.html")), "text/html");
        assert_eq!(guess_mime(Path::new("noext")), "application/octet-stream");
    }
}
