//! Manifest download: the list of resource URLs to prefetch.
//!
//! Fetching is best-effort. [`ManifestFetcher::fetch`] never fails: transport
//! errors, non-2xx answers and malformed JSON are logged and yield an empty list.

mod parse;

pub use parse::{parse_manifest, ManifestEntry};

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::net::{FetchError, HttpClient};

#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("manifest download failed: {0}")]
    Fetch(#[from] FetchError),
    #[error("manifest is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("manifest root is not a JSON array")]
    NotArray,
    #[error("read manifest {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub struct ManifestFetcher<C> {
    client: Arc<C>,
}

impl<C> Clone for ManifestFetcher<C> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
        }
    }
}

impl<C: HttpClient> ManifestFetcher<C> {
    pub fn new(client: Arc<C>) -> Self {
        Self { client }
    }

    /// Single download attempt; errors are returned to the caller.
    pub async fn try_fetch(&self, manifest_url: &str) -> Result<Vec<ManifestEntry>, ManifestError> {
        let response = self.client.get(manifest_url).await?.error_for_status()?;
        parse_manifest(&response.body)
    }

    /// Single download attempt; any failure is logged and yields no entries.
    pub async fn fetch(&self, manifest_url: &str) -> Vec<ManifestEntry> {
        match self.try_fetch(manifest_url).await {
            Ok(entries) => {
                tracing::info!(url = manifest_url, entries = entries.len(), "manifest loaded");
                entries
            }
            Err(e) => {
                tracing::warn!(url = manifest_url, "manifest unavailable: {}", e);
                Vec::new()
            }
        }
    }
}

/// Read a manifest from a local file (same format as the remote document).
pub async fn from_file(path: &Path) -> Result<Vec<ManifestEntry>, ManifestError> {
    let bytes = tokio::fs::read(path).await.map_err(|source| ManifestError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_manifest(&bytes)
}
