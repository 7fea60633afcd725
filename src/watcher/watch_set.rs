//! Live set of directories registered with the notification backend.
//!
//! Every directory is watched non-recursively. Subdirectories are tracked
//! individually so that trees created or removed at runtime can be
//! registered and dropped one directory at a time.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use notify::{RecommendedWatcher, RecursiveMode, Watcher};

use super::error::WatchError;

/// Directories currently registered with the OS notification backend.
///
/// Owns the backend; dropping the set closes every underlying watch.
pub struct WatchSet {
    watcher: RecommendedWatcher,
    dirs: BTreeSet<PathBuf>,
}

impl WatchSet {
    pub fn new(watcher: RecommendedWatcher) -> Self {
        Self {
            watcher,
            dirs: BTreeSet::new(),
        }
    }

    /// Register a directory. Returns `Ok(false)` if it was already watched.
    pub fn add(&mut self, dir: &Path) -> Result<bool, WatchError> {
        if self.dirs.contains(dir) {
            return Ok(false);
        }

        self.watcher
            .watch(dir, RecursiveMode::NonRecursive)
            .map_err(|e| WatchError::PathWatchFailed {
                path: dir.to_path_buf(),
                reason: e.to_string(),
            })?;

        self.dirs.insert(dir.to_path_buf());
        crate::debug_event!("watcher", "watching", "{}", dir.display());
        Ok(true)
    }

    /// Unregister a directory. Returns `Ok(false)` if it was not watched.
    ///
    /// The OS drops watches on deleted directories by itself, so a failed
    /// unwatch of a directory that no longer exists counts as success.
    pub fn remove(&mut self, dir: &Path) -> Result<bool, WatchError> {
        if !self.dirs.remove(dir) {
            return Ok(false);
        }

        crate::debug_event!("watcher", "unwatching", "{}", dir.display());
        match self.watcher.unwatch(dir) {
            Ok(()) => Ok(true),
            Err(e) if matches!(e.kind, notify::ErrorKind::WatchNotFound) || !dir.exists() => {
                Ok(true)
            }
            Err(e) => Err(WatchError::UnwatchFailed {
                path: dir.to_path_buf(),
                reason: e.to_string(),
            }),
        }
    }

    /// Unregister `root` and every watched directory below it.
    ///
    /// Works from the set itself, so it also cleans up after trees that are
    /// already gone from disk. Returns how many directories were dropped.
    pub fn remove_tree(&mut self, root: &Path, mut on_error: impl FnMut(WatchError)) -> usize {
        let doomed: Vec<PathBuf> = self
            .dirs
            .iter()
            .filter(|dir| dir.starts_with(root))
            .cloned()
            .collect();

        for dir in &doomed {
            if let Err(e) = self.remove(dir) {
                on_error(e);
            }
        }

        doomed.len()
    }

    pub fn contains(&self, dir: &Path) -> bool {
        self.dirs.contains(dir)
    }

    pub fn len(&self) -> usize {
        self.dirs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dirs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn watch_set() -> WatchSet {
        let watcher = notify::recommended_watcher(|_res: notify::Result<notify::Event>| {}).unwrap();
        WatchSet::new(watcher)
    }

    #[test]
    fn test_add_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let mut set = watch_set();

        assert!(set.add(temp.path()).unwrap());
        assert!(!set.add(temp.path()).unwrap());
        assert_eq!(set.len(), 1);
        assert!(set.contains(temp.path()));
    }

    #[test]
    fn test_add_missing_dir_fails() {
        let temp = TempDir::new().unwrap();
        let mut set = watch_set();

        let err = set.add(&temp.path().join("missing")).unwrap_err();
        assert!(matches!(err, WatchError::PathWatchFailed { .. }));
        assert!(set.is_empty());
    }

    #[test]
    fn test_remove_tree_drops_descendants_only() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        for dir in ["a", "a/b", "ab"] {
            fs::create_dir_all(root.join(dir)).unwrap();
        }

        let mut set = watch_set();
        for dir in [root.to_path_buf(), root.join("a"), root.join("a/b"), root.join("ab")] {
            set.add(&dir).unwrap();
        }

        let mut errors = Vec::new();
        let dropped = set.remove_tree(&root.join("a"), |e| errors.push(e));

        assert_eq!(dropped, 2);
        assert!(errors.is_empty());
        assert!(set.contains(root));
        assert!(set.contains(&root.join("ab")));
        assert!(!set.contains(&root.join("a/b")));
    }

    #[test]
    fn test_remove_tree_after_deletion_is_quiet() {
        let temp = TempDir::new().unwrap();
        let sub = temp.path().join("sub");
        fs::create_dir_all(sub.join("inner")).unwrap();

        let mut set = watch_set();
        set.add(&sub).unwrap();
        set.add(&sub.join("inner")).unwrap();

        fs::remove_dir_all(&sub).unwrap();

        let mut errors = Vec::new();
        let dropped = set.remove_tree(&sub, |e| errors.push(e));

        assert_eq!(dropped, 2);
        assert!(set.is_empty());
        assert!(errors.is_empty(), "unexpected errors: {errors:?}");
    }

    #[test]
    fn test_remove_unknown_dir() {
        let mut set = watch_set();
        assert!(!set.remove(Path::new("/not/watched")).unwrap());
    }
}
