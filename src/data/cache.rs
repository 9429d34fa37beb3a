//! Keyed store of loaded result tables.
//!
//! A loaded table is shared read-only between every selection made
//! against it. Entries are keyed by source path and remember the file's
//! modification time, so an edited file is reloaded on the next lookup.

use crate::data::loader::{load_dataset, LoadOptions};
use crate::error::DataLoadError;
use crate::models::Dataset;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::SystemTime;
use tracing::debug;

struct CacheEntry {
    dataset: Arc<Dataset>,
    modified: Option<SystemTime>,
}

/// Cache of loaded tables owned by the application context.
pub struct DatasetCache {
    options: LoadOptions,
    entries: RwLock<HashMap<PathBuf, CacheEntry>>,
}

impl DatasetCache {
    /// Create an empty cache that loads tables with `options`.
    pub fn new(options: LoadOptions) -> Self {
        Self {
            options,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn options(&self) -> &LoadOptions {
        &self.options
    }

    /// Return the cached table for `path`, loading it on first use or
    /// when the file changed since it was cached.
    pub fn get_or_load(&self, path: &Path) -> Result<Arc<Dataset>, DataLoadError> {
        let key = cache_key(path);
        let modified = modified_time(path);

        {
            let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(entry) = entries.get(&key) {
                if entry.modified == modified {
                    debug!("Cache hit: {}", key.display());
                    return Ok(Arc::clone(&entry.dataset));
                }
                debug!("Cache stale: {}", key.display());
            }
        }

        self.reload(path)
    }

    /// Load `path` unconditionally and replace any cached entry.
    pub fn reload(&self, path: &Path) -> Result<Arc<Dataset>, DataLoadError> {
        let key = cache_key(path);
        debug!("Cache load: {}", key.display());

        // Take the timestamp before reading so a concurrent edit is seen as stale.
        let modified = modified_time(path);
        let dataset = Arc::new(load_dataset(path, &self.options)?);

        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.insert(
            key,
            CacheEntry {
                dataset: Arc::clone(&dataset),
                modified,
            },
        );

        Ok(dataset)
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for DatasetCache {
    fn default() -> Self {
        Self::new(LoadOptions::default())
    }
}

fn cache_key(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

fn modified_time(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}
