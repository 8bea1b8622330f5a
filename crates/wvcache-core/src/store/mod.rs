//! URL-keyed resource bytes: an in-memory map backed by one file per resource.
//!
//! The store is shared (`Arc<ResourceStore>`) by the prefetcher and the
//! interceptor. Writes for one disk path are serialized, so the memory entry
//! for a key always matches the last bytes written to its file in this process.
//! Entries are never evicted.

mod disk;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use crate::config::{CacheConfig, DiskNaming};
use crate::url_model;

/// Disk-side failure. Memory operations never fail.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("disk worker failed: {0}")]
    Worker(String),
}

impl StoreError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Shared byte payload of a cached resource.
pub type Bytes = Arc<[u8]>;

pub struct ResourceStore {
    cache_dir: PathBuf,
    naming: DiskNaming,
    memory: RwLock<HashMap<String, Bytes>>,
    path_locks: Mutex<HashMap<PathBuf, Arc<tokio::sync::Mutex<()>>>>,
}

impl ResourceStore {
    /// Store rooted at `cache_dir`. The directory is created on first write.
    pub fn new(cache_dir: impl Into<PathBuf>, naming: DiskNaming) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            naming,
            memory: RwLock::new(HashMap::new()),
            path_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_config(cfg: &CacheConfig) -> anyhow::Result<Self> {
        Ok(Self::new(cfg.resolved_cache_dir()?, cfg.disk_naming))
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn naming(&self) -> DiskNaming {
        self.naming
    }

    /// Cache file for `url` under this store's naming strategy.
    pub fn disk_path(&self, url: &str) -> PathBuf {
        self.cache_dir.join(url_model::cache_file_name(url, self.naming))
    }

    /// Memory lookup only; never touches disk.
    pub fn get(&self, key: &str) -> Option<Bytes> {
        self.memory
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.memory
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.memory
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Keys currently held in memory, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .memory
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        keys.sort();
        keys
    }

    /// Reads `disk_path` into memory under `key` if the file exists.
    ///
    /// A file that exists but cannot be read is logged and reported as absent.
    pub async fn load(&self, key: &str, disk_path: &Path) -> Option<Bytes> {
        let lock = self.path_lock(disk_path);
        let guard = lock.lock().await;
        let loaded = self.load_locked(key, disk_path).await;
        drop(guard);
        self.release_path_lock(disk_path, lock);
        loaded
    }

    async fn load_locked(&self, key: &str, disk_path: &Path) -> Option<Bytes> {
        match disk::read_if_exists(disk_path).await {
            Ok(Some(bytes)) => {
                let bytes: Bytes = bytes.into();
                self.insert(key, Arc::clone(&bytes));
                tracing::debug!(
                    url = key,
                    path = %disk_path.display(),
                    len = bytes.len(),
                    "loaded from disk"
                );
                Some(bytes)
            }
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(url = key, "disk cache read failed: {}", e);
                None
            }
        }
    }

    /// Writes `bytes` to `disk_path`, then installs them in memory under `key`.
    ///
    /// The memory entry is installed even when the disk write fails, so the
    /// resource stays servable for the rest of the process. The returned error
    /// only reports the persistence failure (already logged).
    pub async fn put(
        &self,
        key: &str,
        bytes: impl Into<Bytes>,
        disk_path: &Path,
    ) -> Result<(), StoreError> {
        let bytes: Bytes = bytes.into();
        let lock = self.path_lock(disk_path);
        let guard = lock.lock().await;

        let persisted = {
            let path = disk_path.to_path_buf();
            let payload = Arc::clone(&bytes);
            tokio::task::spawn_blocking(move || disk::write_atomic(&path, &payload))
                .await
                .map_err(|e| StoreError::Worker(e.to_string()))
                .and_then(|r| r)
        };

        self.insert(key, bytes);
        drop(guard);
        self.release_path_lock(disk_path, lock);

        if let Err(e) = &persisted {
            tracing::warn!(url = key, "disk persist failed, serving from memory only: {}", e);
        }
        persisted
    }

    fn insert(&self, key: &str, bytes: Bytes) {
        self.memory
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), bytes);
    }

    fn path_lock(&self, path: &Path) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.path_locks.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(locks.entry(path.to_path_buf()).or_default())
    }

    /// Drops the map entry for `path` once no other caller holds or waits on it.
    fn release_path_lock(&self, path: &Path, lock: Arc<tokio::sync::Mutex<()>>) {
        let mut locks = self.path_locks.lock().unwrap_or_else(PoisonError::into_inner);
        // One reference in the map plus `lock`; new callers need the map mutex we hold.
        if Arc::strong_count(&lock) == 2 {
            locks.remove(path);
        }
    }
}

impl std::fmt::Debug for ResourceStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceStore")
            .field("cache_dir", &self.cache_dir)
            .field("naming", &self.naming)
            .field("entries", &self.len())
            .finish()
    }
}
