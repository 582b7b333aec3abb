//! Directory walker
//!
//! Depth- and age-bounded recursive file enumerator with extension and
//! exact-name filtering and directory pruning. Traversal is lazy: the tree
//! is walked incrementally as the consumer pulls paths.

use crate::error::WalkError;
use serde::{Deserialize, Serialize};
use std::fs::Metadata;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;
use tracing::warn;
use walkdir::WalkDir;

/// Filter configuration for a [`FileWalker`].
///
/// The default config applies no filters: every file under the root is
/// yielded.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WalkerConfig {
    /// Case-insensitive file-name suffixes; empty = no filter.
    pub extensions: Vec<String>,
    /// Exact file names to keep; empty = no filter.
    pub matches: Vec<String>,
    /// Directory basenames whose whole subtree is skipped, anywhere in the
    /// tree.
    pub prune: Vec<String>,
    /// Minimum modification time (Unix seconds); 0 = no filter.
    pub min_age: f64,
    /// Maximum directory depth relative to the root; `None` = unbounded,
    /// `Some(0)` = root only.
    pub max_depth: Option<usize>,
}

/// Traversal statistics. Pruned subtrees contribute nothing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WalkCounters {
    /// Directories visited.
    pub dirs: u64,
    /// Raw file entries seen in visited directories.
    pub files: u64,
    /// Maximum directory depth reached.
    pub depth: u64,
    /// Files that survived all filters.
    pub found: u64,
}

/// Recursive file enumerator over one root directory.
pub struct FileWalker {
    root: PathBuf,
    extensions: Vec<String>,
    matches: Vec<String>,
    prune: Vec<String>,
    min_age: f64,
    max_depth: Option<usize>,
    counters: WalkCounters,
}

impl FileWalker {
    /// Create a walker rooted at `root`, which must be an existing
    /// directory.
    pub fn new(root: &Path, config: WalkerConfig) -> Result<Self, WalkError> {
        if !root.is_dir() {
            return Err(WalkError::NotADirectory(root.to_path_buf()));
        }
        Ok(Self {
            root: root.to_path_buf(),
            extensions: config
                .extensions
                .iter()
                .map(|e| e.to_lowercase())
                .collect(),
            matches: config.matches,
            prune: config.prune,
            min_age: config.min_age,
            max_depth: config.max_depth,
            counters: WalkCounters::default(),
        })
    }

    /// Lazily yield every file under the root that survives the filters.
    ///
    /// Order is arbitrary but deterministic per run. Counters accumulate as
    /// the iterator is consumed; a second `find` keeps adding to them.
    pub fn find(&mut self) -> Files<'_> {
        let walker = WalkDir::new(self.root.clone()).into_iter();
        Files {
            finder: self,
            walker,
        }
    }

    /// Traversal statistics gathered so far.
    pub fn counters(&self) -> WalkCounters {
        self.counters
    }

    fn survives_filters(&self, entry: &walkdir::DirEntry, name: &str) -> bool {
        if !self.extensions.is_empty() {
            let lower = name.to_lowercase();
            if !self.extensions.iter().any(|ext| lower.ends_with(ext)) {
                return false;
            }
        }
        if self.min_age > 0.0 {
            match entry.metadata() {
                Ok(meta) => {
                    if mtime_secs(&meta) <= self.min_age {
                        return false;
                    }
                }
                Err(err) => {
                    warn!(path = %entry.path().display(), %err, "cannot stat file, skipping");
                    return false;
                }
            }
        }
        if !self.matches.is_empty() && !self.matches.iter().any(|m| m == name) {
            return false;
        }
        true
    }
}

pub(crate) fn mtime_secs(meta: &Metadata) -> f64 {
    meta.modified()
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

/// Lazy iterator returned by [`FileWalker::find`].
pub struct Files<'a> {
    finder: &'a mut FileWalker,
    walker: walkdir::IntoIter,
}

impl Iterator for Files<'_> {
    type Item = PathBuf;

    fn next(&mut self) -> Option<PathBuf> {
        loop {
            let entry = match self.walker.next()? {
                Ok(entry) => entry,
                Err(err) => {
                    warn!(%err, "unreadable entry, skipping");
                    continue;
                }
            };

            if entry.file_type().is_dir() {
                let depth = entry.depth();
                let name = entry.file_name().to_string_lossy();
                if self.finder.prune.iter().any(|p| p == name.as_ref()) {
                    self.walker.skip_current_dir();
                    continue;
                }
                if self.finder.max_depth.is_some_and(|max| depth > max) {
                    self.walker.skip_current_dir();
                    continue;
                }
                self.finder.counters.dirs += 1;
                self.finder.counters.depth = self.finder.counters.depth.max(depth as u64);
                continue;
            }

            self.finder.counters.files += 1;
            let name = entry.file_name().to_string_lossy().into_owned();
            if self.finder.survives_filters(&entry, &name) {
                self.finder.counters.found += 1;
                return Some(entry.into_path());
            }
        }
    }
}
