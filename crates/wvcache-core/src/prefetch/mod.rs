//! Manifest-driven cache warm-up.
//!
//! For every manifest URL the prefetcher makes sure the bytes are in the
//! [`ResourceStore`]: memory first, then the disk cache, then the network.
//! Entries run concurrently (bounded by `max_concurrent` when set) and fail
//! independently; a failed entry is logged, reported, and simply fetched live
//! later by the interceptor. There is no retry.

mod report;

pub use report::PrefetchReport;

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

use crate::manifest::{ManifestEntry, ManifestFetcher};
use crate::net::{FetchError, HttpClient};
use crate::store::ResourceStore;
use crate::url_model;

/// How an entry ended up in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefetchOutcome {
    /// Already in memory (e.g. served live before the prefetch reached it).
    AlreadyCached,
    LoadedFromDisk,
    Fetched { persisted: bool },
}

#[derive(Debug, thiserror::Error)]
pub enum PrefetchError {
    #[error("fetch {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: FetchError,
    },
    #[error("prefetch task for {url} failed: {reason}")]
    Task { url: String, reason: String },
}

pub struct Prefetcher<C> {
    client: Arc<C>,
    store: Arc<ResourceStore>,
    max_concurrent: Option<usize>,
}

impl<C> Clone for Prefetcher<C> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
            store: Arc::clone(&self.store),
            max_concurrent: self.max_concurrent,
        }
    }
}

impl<C: HttpClient> Prefetcher<C> {
    pub fn new(client: Arc<C>, store: Arc<ResourceStore>) -> Self {
        Self {
            client,
            store,
            max_concurrent: None,
        }
    }

    /// Limit simultaneous downloads. `None` starts every entry at once.
    pub fn with_max_concurrent(mut self, max_concurrent: Option<usize>) -> Self {
        self.max_concurrent = max_concurrent.map(|n| n.max(1));
        self
    }

    pub fn store(&self) -> &Arc<ResourceStore> {
        &self.store
    }

    /// Starts [`run`](Self::run) on the runtime and returns immediately.
    pub fn spawn(&self, manifest_url: impl Into<String>) -> JoinHandle<PrefetchReport> {
        let this = self.clone();
        let manifest_url = manifest_url.into();
        tokio::spawn(async move { this.run(&manifest_url).await })
    }

    /// Downloads the manifest and prefetches every entry. Never fails; see the report.
    pub async fn run(&self, manifest_url: &str) -> PrefetchReport {
        let entries = ManifestFetcher::new(Arc::clone(&self.client))
            .fetch(manifest_url)
            .await;
        self.prefetch_entries(entries).await
    }

    /// Prefetches the given entries concurrently, keyed by canonical URL.
    /// Duplicate URLs are attempted once.
    pub async fn prefetch_entries(&self, entries: Vec<ManifestEntry>) -> PrefetchReport {
        let mut seen = HashSet::new();
        let urls: Vec<String> = entries
            .into_iter()
            .map(|e| url_model::canonical_url(&e.url).unwrap_or(e.url))
            .filter(|u| seen.insert(u.clone()))
            .collect();

        let permits = self.max_concurrent.map(|n| Arc::new(Semaphore::new(n)));
        let tasks: Vec<(String, JoinHandle<Result<PrefetchOutcome, PrefetchError>>)> = urls
            .into_iter()
            .map(|url| {
                let client = Arc::clone(&self.client);
                let store = Arc::clone(&self.store);
                let permits = permits.clone();
                let task_url = url.clone();
                let handle = tokio::spawn(async move {
                    let _permit = match permits {
                        Some(sem) => Some(sem.acquire_owned().await.map_err(|e| {
                            PrefetchError::Task {
                                url: task_url.clone(),
                                reason: e.to_string(),
                            }
                        })?),
                        None => None,
                    };
                    ensure_cached(client.as_ref(), &store, &task_url).await
                });
                (url, handle)
            })
            .collect();

        let mut report = PrefetchReport {
            entries: tasks.len(),
            ..PrefetchReport::default()
        };
        for (url, handle) in tasks {
            let result = handle.await.unwrap_or_else(|e| {
                Err(PrefetchError::Task {
                    url: url.clone(),
                    reason: e.to_string(),
                })
            });
            if let Err(e) = &result {
                tracing::warn!(url = %url, "prefetch entry failed: {}", e);
            }
            report.record(&url, &result);
        }

        tracing::info!(
            entries = report.entries,
            cached = report.cached(),
            from_disk = report.loaded_from_disk,
            fetched = report.fetched,
            failed = report.failures.len(),
            "prefetch finished"
        );
        report
    }

    /// Makes sure `url` is in the store: memory, then disk, then network.
    pub async fn ensure_cached(&self, url: &str) -> Result<PrefetchOutcome, PrefetchError> {
        ensure_cached(self.client.as_ref(), &self.store, url).await
    }
}

async fn ensure_cached<C: HttpClient>(
    client: &C,
    store: &ResourceStore,
    url: &str,
) -> Result<PrefetchOutcome, PrefetchError> {
    if store.contains(url) {
        return Ok(PrefetchOutcome::AlreadyCached);
    }

    let disk_path = store.disk_path(url);
    if store.load(url, &disk_path).await.is_some() {
        return Ok(PrefetchOutcome::LoadedFromDisk);
    }

    let response = client
        .get(url)
        .await
        .and_then(|r| r.error_for_status())
        .map_err(|source| PrefetchError::Fetch {
            url: url.to_string(),
            source,
        })?;

    let content_type = response.header("Content-Type").map(str::to_string);
    let persisted = store.put(url, response.body, &disk_path).await.is_ok();
    tracing::debug!(url, persisted, content_type = ?content_type, "prefetched");
    Ok(PrefetchOutcome::Fetched { persisted })
}
