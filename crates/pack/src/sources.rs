//! Candidate source set

use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Insertion-ordered paths, unique ignoring ASCII case
#[derive(Debug, Default)]
pub(crate) struct SourceSet {
    paths: Vec<PathBuf>,
    keys: HashSet<String>,
}

impl SourceSet {
    /// Add a path; blank and already-known paths are ignored.
    /// Returns whether the set changed.
    pub(crate) fn insert(&mut self, path: &Path) -> bool {
        let text = path.to_string_lossy();
        if text.trim().is_empty() {
            return false;
        }
        if !self.keys.insert(text.to_lowercase()) {
            return false;
        }
        self.paths.push(path.to_path_buf());
        true
    }

    pub(crate) fn to_vec(&self) -> Vec<PathBuf> {
        self.paths.clone()
    }
}
