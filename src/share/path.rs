//! Path containment and filename sanitizing.
//!
//! Every client-supplied relative path goes through [`resolve_within`]
//! before it touches the filesystem.

use std::io;
use std::path::{Component, Path, PathBuf};

use crate::{Result, ShareError};

/// Longest filename accepted for uploads, in bytes.
pub const MAX_FILENAME_BYTES: usize = 255;

/// Resolve `relative` under `root`, refusing anything that escapes it.
///
/// `root` must already be canonical. Absolute paths and `..` segments that
/// climb above `root` are rejected lexically. Paths that exist are
/// canonicalized, so symlinks pointing outside `root` are rejected too;
/// containment is checked per component, never by string prefix.
///
/// A path that does not exist is returned as the normalized join so the
/// caller can report it as missing.
pub fn resolve_within(root: &Path, relative: &str) -> Result<PathBuf> {
    let mut normalized = PathBuf::new();

    for component in Path::new(relative).components() {
        match component {
            Component::Prefix(_) | Component::RootDir => {
                return Err(ShareError::Forbidden(
                    "absolute paths are not allowed".to_string(),
                ));
            }
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    return Err(ShareError::Forbidden(
                        "path escapes the share root".to_string(),
                    ));
                }
            }
            Component::Normal(part) => normalized.push(part),
        }
    }

    let candidate = root.join(&normalized);
    match std::fs::canonicalize(&candidate) {
        Ok(resolved) if resolved.starts_with(root) => Ok(resolved),
        Ok(_) => Err(ShareError::Forbidden(
            "path escapes the share root".to_string(),
        )),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(candidate),
        Err(e) => Err(e.into()),
    }
}

/// Make an uploaded filename safe to join onto a directory.
///
/// Path separators and whitespace runs collapse to `_`, anything other than
/// alphanumerics and `._-` is dropped, and leading/trailing dots and
/// underscores are stripped, so `../evil.sh` becomes `evil.sh`.
/// Returns `None` when nothing usable is left.
pub fn sanitize_filename(name: &str) -> Option<String> {
    let spaced: String = name
        .chars()
        .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
        .collect();
    let joined = spaced.split_whitespace().collect::<Vec<_>>().join("_");

    let kept: String = joined
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect();
    let trimmed = kept.trim_matches(|c| c == '.' || c == '_');
    if trimmed.is_empty() {
        return None;
    }

    let mut end = trimmed.len().min(MAX_FILENAME_BYTES);
    while !trimmed.is_char_boundary(end) {
        end -= 1;
    }
    Some(trimmed[..end].to_string())
}

/// Last component of a path as a display string.
pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}
