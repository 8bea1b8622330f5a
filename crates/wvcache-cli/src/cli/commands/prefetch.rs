//! `wvcache prefetch <manifest>` – warm the disk cache from a manifest.

use anyhow::{bail, Result};
use std::sync::Arc;
use wvcache_core::config::CacheConfig;
use wvcache_core::net::{CurlClient, CurlOptions};
use wvcache_core::prefetch::Prefetcher;
use wvcache_core::store::ResourceStore;

use super::manifest::load_entries;

pub async fn run_prefetch(cfg: &CacheConfig, manifest: &str) -> Result<()> {
    let client = Arc::new(CurlClient::new(CurlOptions::from_config(cfg)));
    let store = Arc::new(ResourceStore::from_config(cfg)?);
    let prefetcher = Prefetcher::new(client, Arc::clone(&store))
        .with_max_concurrent(cfg.max_concurrent_prefetch);

    let entries = load_entries(cfg, manifest).await?;
    let report = prefetcher.prefetch_entries(entries).await;

    println!(
        "{} entries: {} fetched, {} already on disk, {} failed",
        report.entries,
        report.fetched,
        report.loaded_from_disk + report.already_cached,
        report.failures.len()
    );
    if report.persist_failures > 0 {
        println!(
            "warning: {} fetched resources could not be written to {}",
            report.persist_failures,
            store.cache_dir().display()
        );
    }
    for (url, reason) in &report.failures {
        println!("  failed {}: {}", url, reason);
    }

    if !report.is_complete() {
        bail!("{} of {} resources not cached", report.failures.len(), report.entries);
    }
    Ok(())
}
