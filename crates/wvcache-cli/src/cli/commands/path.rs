//! `wvcache path <url>` – show where a resource is (or would be) cached on disk.

use anyhow::Result;
use wvcache_core::config::CacheConfig;
use wvcache_core::store::ResourceStore;
use wvcache_core::url_model;

pub fn run_path(cfg: &CacheConfig, url: &str) -> Result<()> {
    let store = ResourceStore::from_config(cfg)?;
    let key = url_model::canonical_url(url).unwrap_or_else(|| url.to_string());
    let path = store.disk_path(&key);
    let note = if path.exists() { "" } else { "  (not cached)" };
    println!("{}{}", path.display(), note);
    Ok(())
}
