//! `wvcache manifest <url|path>` – list manifest entries.

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use wvcache_core::config::CacheConfig;
use wvcache_core::manifest::{self, ManifestEntry, ManifestFetcher};
use wvcache_core::net::{CurlClient, CurlOptions};

use crate::cli::is_remote;

/// Loads entries from a URL or a local file. Unlike the prefetch path, failures are reported.
pub(crate) async fn load_entries(cfg: &CacheConfig, source: &str) -> Result<Vec<ManifestEntry>> {
    if is_remote(source) {
        let client = Arc::new(CurlClient::new(CurlOptions::from_config(cfg)));
        ManifestFetcher::new(client)
            .try_fetch(source)
            .await
            .with_context(|| format!("fetch manifest {}", source))
    } else {
        manifest::from_file(Path::new(source))
            .await
            .with_context(|| format!("read manifest {}", source))
    }
}

pub async fn run_manifest(cfg: &CacheConfig, source: &str) -> Result<()> {
    let entries = load_entries(cfg, source).await?;
    if entries.is_empty() {
        println!("Manifest lists no resources.");
    } else {
        for entry in &entries {
            println!("{}", entry.url);
        }
    }
    Ok(())
}
