use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use crate::config::Config;

/// Ordered, deduplicated list of discovered project roots.
///
/// Order is discovery order within a scan. The list is cleared and rebuilt
/// wholesale at the start of every scan; entries are never removed one by
/// one.
#[derive(Debug, Default)]
pub struct ProjectList {
    paths: Vec<PathBuf>,
    seen: HashSet<PathBuf>,
}

impl ProjectList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a project path, keeping set semantics. Returns false if the
    /// path was already present.
    pub fn insert(&mut self, path: PathBuf) -> bool {
        if !self.seen.insert(path.clone()) {
            return false;
        }
        self.paths.push(path);
        true
    }

    pub fn clear(&mut self) {
        self.paths.clear();
        self.seen.clear();
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.seen.contains(path)
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    /// Owned copy of the current list, for readers that must not hold the
    /// lock while working.
    pub fn snapshot(&self) -> Vec<PathBuf> {
        self.paths.clone()
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

/// Shared context owning the configuration and the session project list.
///
/// Constructed once and handed to the indexer and finder by reference, so
/// both can be tested without any host runtime or global state.
pub struct AppContext {
    config: Mutex<Config>,
    projects: Mutex<ProjectList>,
}

impl AppContext {
    pub fn new(config: Config) -> Self {
        Self {
            config: Mutex::new(config),
            projects: Mutex::new(ProjectList::new()),
        }
    }

    pub fn config(&self) -> MutexGuard<'_, Config> {
        // A poisoned lock just means a worker panicked mid-scan; the data
        // is still a valid partial state, so keep going.
        self.config.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn projects(&self) -> MutexGuard<'_, ProjectList> {
        self.projects.lock().unwrap_or_else(|e| e.into_inner())
    }
}
