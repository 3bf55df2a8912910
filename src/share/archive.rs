//! Zip archives of shared folders.
//!
//! Archives are built in memory, so they suit moderately sized trees.

use std::fs::{self, File};
use std::io::{self, Cursor};
use std::path::{Path, PathBuf};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::share::path::display_name;
use crate::{Result, ShareError};

/// A finished archive.
#[derive(Debug)]
pub struct Archive {
    /// Suggested download name, e.g. `project.zip`.
    pub file_name: String,
    /// Zip bytes.
    pub bytes: Vec<u8>,
    /// Number of files written.
    pub files: usize,
}

/// Download name for an archive of `target`.
///
/// Falls back to `share.zip` when the directory has no name (e.g. `/`).
pub fn archive_name(target: &Path) -> String {
    let name = display_name(target);
    if name.is_empty() {
        "share.zip".to_string()
    } else {
        format!("{name}.zip")
    }
}

/// Zip every file below `target`, which must be a directory inside `share_root`.
///
/// Entry names are relative to the parent of `target`, so the folder name
/// itself is the top-level entry. Symlinked files are included only when
/// they resolve inside `share_root`; symlinked directories are not followed.
/// Empty directories produce no entries.
pub fn build_archive(share_root: &Path, target: &Path) -> Result<Archive> {
    if !target.is_dir() {
        return Err(ShareError::NotFound("folder".to_string()));
    }

    let base = target.parent().unwrap_or(target).to_path_buf();
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let mut files = 0;
    add_directory(&mut writer, share_root, &base, target, options, &mut files)?;
    let bytes = writer.finish()?.into_inner();

    Ok(Archive {
        file_name: archive_name(target),
        bytes,
        files,
    })
}

fn add_directory(
    writer: &mut ZipWriter<Cursor<Vec<u8>>>,
    share_root: &Path,
    base: &Path,
    dir: &Path,
    options: SimpleFileOptions,
    files: &mut usize,
) -> Result<()> {
    let mut children: Vec<PathBuf> = fs::read_dir(dir)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<io::Result<_>>()?;
    children.sort();

    for path in children {
        let link_meta = fs::symlink_metadata(&path)?;

        if link_meta.is_symlink() {
            let resolved = match fs::canonicalize(&path) {
                Ok(resolved) => resolved,
                Err(_) => continue,
            };
            if !resolved.starts_with(share_root) {
                tracing::debug!(path = %path.display(), "Skipping symlink outside share");
                continue;
            }
            if resolved.is_file() {
                add_file(writer, base, &path, options)?;
                *files += 1;
            }
        } else if link_meta.is_dir() {
            add_directory(writer, share_root, base, &path, options, files)?;
        } else if link_meta.is_file() {
            add_file(writer, base, &path, options)?;
            *files += 1;
        }
    }
    Ok(())
}

fn add_file(
    writer: &mut ZipWriter<Cursor<Vec<u8>>>,
    base: &Path,
    path: &Path,
    options: SimpleFileOptions,
) -> Result<()> {
    let entry_name = entry_name(base, path);
    let mut file = File::open(path)?;
    let large = file.metadata()?.len() >= u64::from(u32::MAX);

    writer.start_file(entry_name, options.large_file(large))?;
    io::copy(&mut file, writer)?;
    Ok(())
}

/// Zip entry name of `path` relative to `base`, always `/`-separated.
fn entry_name(base: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(base).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use tempfile::TempDir;
    use zip::ZipArchive;

    fn setup() -> (TempDir, PathBuf) {
        let temp_dir = TempDir::new().unwrap();
        let root = fs::canonicalize(temp_dir.path()).unwrap().join("project");
        fs::create_dir(&root).unwrap();
        (temp_dir, root)
    }

    fn read_entries(bytes: &[u8]) -> Vec<(String, Vec<u8>)> {
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut entries = Vec::new();
        for i in 0..archive.len() {
            let mut file = archive.by_index(i).unwrap();
            let mut content = Vec::new();
            file.read_to_end(&mut content).unwrap();
            entries.push((file.name().to_string(), content));
        }
        entries
    }

    #[test]
    fn test_single_file_keeps_folder_name() {
        let (_temp_dir, root) = setup();
        fs::write(root.join("notes.txt"), b"remember the milk").unwrap();

        let archive = build_archive(&root, &root).unwrap();
        assert_eq!(archive.file_name, "project.zip");
        assert_eq!(archive.files, 1);

        let entries = read_entries(&archive.bytes);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].0, "project/notes.txt");
        assert_eq!(entries[0].1, b"remember the milk");
    }

    #[test]
    fn test_nested_subfolder() {
        let (_temp_dir, root) = setup();
        let docs = root.join("docs");
        fs::create_dir_all(docs.join("deep")).unwrap();
        fs::write(docs.join("a.md"), b"a").unwrap();
        fs::write(docs.join("deep").join("b.bin"), [0u8, 1, 2, 255]).unwrap();
        fs::write(root.join("outside-target.txt"), b"not included").unwrap();

        let archive = build_archive(&root, &docs).unwrap();
        assert_eq!(archive.file_name, "docs.zip");

        let entries = read_entries(&archive.bytes);
        let names: Vec<&str> = entries.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["docs/a.md", "docs/deep/b.bin"]);
        assert_eq!(entries[1].1, vec![0u8, 1, 2, 255]);
    }

    #[test]
    fn test_empty_directory() {
        let (_temp_dir, root) = setup();
        fs::create_dir(root.join("empty")).unwrap();

        let archive = build_archive(&root, &root).unwrap();
        assert_eq!(archive.files, 0);
        assert!(read_entries(&archive.bytes).is_empty());
    }

    #[test]
    fn test_missing_target() {
        let (_temp_dir, root) = setup();
        let result = build_archive(&root, &root.join("missing"));
        assert!(matches!(result, Err(ShareError::NotFound(_))));
    }

    #[test]
    fn test_entries_are_deflated() {
        let (_temp_dir, root) = setup();
        fs::write(root.join("big.txt"), "abc".repeat(10_000)).unwrap();

        let archive = build_archive(&root, &root).unwrap();
        let mut zip = ZipArchive::new(Cursor::new(archive.bytes.as_slice())).unwrap();
        let file = zip.by_index(0).unwrap();
        assert_eq!(file.compression(), CompressionMethod::Deflated);
        assert!(file.compressed_size() < file.size());
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_outside_share_skipped() {
        let (temp_dir, root) = setup();
        let secret = fs::canonicalize(temp_dir.path()).unwrap().join("secret.txt");
        fs::write(&secret, b"secret").unwrap();
        std::os::unix::fs::symlink(&secret, root.join("leak.txt")).unwrap();
        fs::write(root.join("kept.txt"), b"ok").unwrap();
        std::os::unix::fs::symlink(root.join("kept.txt"), root.join("alias.txt")).unwrap();

        let archive = build_archive(&root, &root).unwrap();
        let entries = read_entries(&archive.bytes);
        let names: Vec<&str> = entries.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["project/alias.txt", "project/kept.txt"]);
        assert_eq!(entries[0].1, b"ok");
    }

    #[test]
    fn test_archive_name_fallback() {
        assert_eq!(archive_name(Path::new("/srv/photos")), "photos.zip");
        assert_eq!(archive_name(Path::new("/")), "share.zip");
    }
}
