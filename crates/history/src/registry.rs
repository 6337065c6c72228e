//! Registry of per-namespace histories.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use itertools::Itertools;
use tracing::{debug, trace};

use crate::config::HistoryOptions;
use crate::error::Result;
use crate::path_config::{PathConfig, ReplayState};
use crate::types::Namespace;

/// Owns the [`PathConfig`] of every managed namespace.
///
/// Entries are replaced whole; readers hold an `Arc` snapshot that never
/// changes under them. Locks are released before any store call.
#[derive(Debug, Default)]
pub struct ConfigRegistry {
    paths: RwLock<HashMap<Namespace, Arc<PathConfig>>>,
}

impl ConfigRegistry {
    /// Create a registry holding the given histories.
    pub fn new(configs: impl IntoIterator<Item = PathConfig>) -> Self {
        let paths = configs
            .into_iter()
            .map(|config| (config.namespace().clone(), Arc::new(config)))
            .collect();
        Self {
            paths: RwLock::new(paths),
        }
    }

    /// Create a registry from construction-time options.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the options do not validate.
    pub fn from_options(options: &HistoryOptions) -> Result<Self> {
        Ok(Self::new(options.path_configs()?))
    }

    /// Snapshot of a namespace's history, or `None` if it is not managed.
    pub fn get(&self, namespace: &Namespace) -> Option<Arc<PathConfig>> {
        self.read().get(namespace).cloned()
    }

    /// Replace a namespace's history.
    ///
    /// Unmanaged namespaces are left alone; returns whether an entry was replaced.
    pub fn set(&self, namespace: &Namespace, config: PathConfig) -> bool {
        let mut paths = self.write();
        match paths.get_mut(namespace) {
            Some(entry) => {
                *entry = Arc::new(config);
                true
            }
            None => {
                debug!(namespace = %namespace, "Ignoring update for unmanaged namespace");
                false
            }
        }
    }

    /// Replace a namespace's history with `f(current)` under one write lock.
    ///
    /// Returns the new snapshot, or `None` if the namespace is not managed.
    pub fn update<F>(&self, namespace: &Namespace, f: F) -> Option<Arc<PathConfig>>
    where
        F: FnOnce(&PathConfig) -> PathConfig,
    {
        let mut paths = self.write();
        let entry = paths.get_mut(namespace)?;
        let next = Arc::new(f(entry));
        *entry = Arc::clone(&next);
        trace!(
            namespace = %namespace,
            done = next.done().len(),
            undone = next.undone().len(),
            state = %next.state(),
            "History replaced"
        );
        Some(next)
    }

    /// Move a namespace into the given replay state.
    pub fn set_state(&self, namespace: &Namespace, state: ReplayState) -> Option<Arc<PathConfig>> {
        self.update(namespace, |config| config.with_state(state))
    }

    /// Check if a namespace is managed.
    pub fn contains(&self, namespace: &Namespace) -> bool {
        self.read().contains_key(namespace)
    }

    /// Managed namespaces, sorted.
    pub fn namespaces(&self) -> Vec<Namespace> {
        self.read().keys().cloned().sorted().collect()
    }

    /// Number of managed namespaces.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Check if no namespace is managed.
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<Namespace, Arc<PathConfig>>> {
        self.paths.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<Namespace, Arc<PathConfig>>> {
        self.paths.write().unwrap_or_else(PoisonError::into_inner)
    }
}
