//! Extension filter deciding which paths count as relevant changes.

use std::collections::HashSet;
use std::path::Path;

/// How a changed path relates to the configured extensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathClass {
    /// Extension is in the set; the change should re-arm the debounce timer.
    Qualifying,
    /// Extension present but not configured (swap files, logs, ...).
    Foreign,
    /// No extension at all. Possibly a directory, needs a stat to tell.
    Extensionless,
}

/// Set of relevant file extensions, each stored with its leading dot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtensionSet {
    exts: HashSet<String>,
}

impl ExtensionSet {
    /// Build the set. `go` and `.go` both end up stored as `.go`.
    pub fn new<I, S>(exts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let exts = exts
            .into_iter()
            .map(Into::into)
            .filter(|ext| !ext.is_empty())
            .map(|ext| {
                if ext.starts_with('.') {
                    ext
                } else {
                    format!(".{ext}")
                }
            })
            .collect();
        Self { exts }
    }

    pub fn contains(&self, ext: &str) -> bool {
        self.exts.contains(ext)
    }

    pub fn is_empty(&self) -> bool {
        self.exts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.exts.len()
    }

    /// Sorted copy of the extensions, for display.
    pub fn to_sorted_vec(&self) -> Vec<String> {
        let mut exts: Vec<String> = self.exts.iter().cloned().collect();
        exts.sort();
        exts
    }

    pub fn classify(&self, path: &Path) -> PathClass {
        match extension_of(path) {
            Some(ext) if self.contains(&ext) => PathClass::Qualifying,
            Some(_) => PathClass::Foreign,
            None => PathClass::Extensionless,
        }
    }
}

/// Suffix of the final path component starting at its last dot.
///
/// This is a plain string rule: `a.go` gives `.go`, `.bashrc` gives
/// `.bashrc`, `notes.` gives `.`. A directory named `v1.2-beta` yields
/// `.2-beta` and is therefore never treated as a directory candidate.
pub fn extension_of(path: &Path) -> Option<String> {
    let name = path.file_name()?.to_string_lossy();
    name.rfind('.').map(|idx| name[idx..].to_string())
}
