//! Recursive directory enumeration.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use super::error::WatchError;

/// Return `root` and every directory below it.
///
/// Symlinks are not followed. Unreadable entries are passed to `on_error`
/// and skipped; the rest of the tree is still enumerated. A root that does
/// not exist yields an empty list plus one error.
pub fn walk_dirs(root: &Path, mut on_error: impl FnMut(WatchError)) -> Vec<PathBuf> {
    let mut dirs = Vec::new();

    for entry in WalkDir::new(root) {
        match entry {
            Ok(entry) if entry.file_type().is_dir() => dirs.push(entry.into_path()),
            Ok(_) => {}
            Err(e) => {
                let path = e
                    .path()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| root.to_path_buf());
                on_error(WatchError::Walk {
                    path,
                    reason: e.to_string(),
                });
            }
        }
    }

    dirs
}
