// src/watch/interest.rs

//! Watch events and extension interest filtering.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// What kind of filesystem change an event reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchEventKind {
    Created,
    Modified,
    Renamed,
}

/// A single change observed under the watched root.
///
/// Transient: produced by the watcher, consumed once by the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchEvent {
    pub path: PathBuf,
    pub kind: WatchEventKind,
}

/// Immutable set of file extensions the watcher reports.
///
/// Matching is case-insensitive; extensions are stored lowercased and
/// without a leading dot, so `"PO"`, `".po"` and `"po"` all describe the
/// same interest. Events for paths whose extension is not in the set are
/// dropped at the source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InterestSet {
    exts: HashSet<String>,
}

impl InterestSet {
    pub fn new<I, S>(exts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let exts = exts
            .into_iter()
            .map(|e| e.as_ref().trim_start_matches('.').to_lowercase())
            .filter(|e| !e.is_empty())
            .collect();
        Self { exts }
    }

    pub fn is_empty(&self) -> bool {
        self.exts.is_empty()
    }

    /// Iterate the normalized extensions, e.g. to build a union set.
    pub fn extensions(&self) -> impl Iterator<Item = &str> {
        self.exts.iter().map(|s| s.as_str())
    }

    pub fn contains(&self, ext: &str) -> bool {
        self.exts
            .contains(&ext.trim_start_matches('.').to_lowercase())
    }

    /// Whether the path's extension is in the set. Paths without an
    /// extension never match.
    pub fn matches_path(&self, path: &Path) -> bool {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) => self.contains(ext),
            None => false,
        }
    }
}
