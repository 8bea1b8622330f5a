//! `wvcache mark <url>` – print the custom-scheme form of a URL.

use wvcache_core::config::CacheConfig;
use wvcache_core::url_model;

pub fn run_mark(cfg: &CacheConfig, url: &str) {
    println!("{}", url_model::mark_url(url, &cfg.scheme_marker));
}
