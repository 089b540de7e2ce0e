//! Directory-keyed memo of compiled plugin records.
//!
//! Entries live for the whole process. A pass only recompiles the
//! directories a [`ChangeSet`] makes stale; everything else is served from
//! the cache by handle.

use rustc_hash::FxHashMap;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::record::Record;
use crate::utils::path::is_within;

/// The paths a pass has to account for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeSet {
    /// Recompile everything.
    Full,
    /// Recompile the directories containing these paths.
    Paths(BTreeSet<PathBuf>),
}

impl Default for ChangeSet {
    fn default() -> Self {
        Self::Paths(BTreeSet::new())
    }
}

impl ChangeSet {
    #[cfg(test)]
    pub fn single(path: impl Into<PathBuf>) -> Self {
        Self::Paths(BTreeSet::from([path.into()]))
    }

    pub fn is_full(&self) -> bool {
        matches!(self, Self::Full)
    }

    /// Number of changed paths (`None` for a full rebuild).
    pub fn path_count(&self) -> Option<usize> {
        match self {
            Self::Full => None,
            Self::Paths(paths) => Some(paths.len()),
        }
    }

    pub fn insert(&mut self, path: PathBuf) {
        if let Self::Paths(paths) = self {
            paths.insert(path);
        }
    }

    /// Fold `other` into this set. Anything merged with `Full` is `Full`.
    pub fn merge(&mut self, other: ChangeSet) {
        match other {
            Self::Full => *self = Self::Full,
            Self::Paths(more) => {
                if let Self::Paths(paths) = self {
                    paths.extend(more);
                }
            }
        }
    }

    /// Whether a change here could affect the plugin compiled from `dir`.
    ///
    /// A path touches `dir` when its containing directory starts with
    /// `dir`, compared as strings.
    pub fn touches(&self, dir: &Path) -> bool {
        match self {
            Self::Full => true,
            Self::Paths(paths) => paths
                .iter()
                .filter_map(|path| path.parent())
                .any(|parent| is_within(parent, dir)),
        }
    }
}

/// Compiled plugin records keyed by source directory.
#[derive(Debug, Default)]
pub struct PluginCache {
    entries: FxHashMap<PathBuf, Arc<Record>>,
}

impl PluginCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, dir: &Path) -> Option<&Arc<Record>> {
        self.entries.get(dir)
    }

    pub fn put(&mut self, dir: PathBuf, record: Arc<Record>) {
        self.entries.insert(dir, record);
    }

    pub fn invalidate(&mut self, dir: &Path) -> Option<Arc<Record>> {
        self.entries.remove(dir)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether `dir` has to be recompiled for `changes`.
    pub fn is_stale(&self, dir: &Path, changes: &ChangeSet) -> bool {
        !self.entries.contains_key(dir) || changes.touches(dir)
    }
}
