//! URL modeling: scheme marker handling and cache file name derivation.

mod digest;
mod path;
mod sanitize;

pub use digest::url_digest;
pub use path::{extension, last_path_segment};
pub use sanitize::sanitize_file_name;

use crate::config::DiskNaming;

/// File name used when a URL has no usable final path segment.
const INDEX_FILENAME: &str = "index";

/// Derives the cache file name for `url` under the given naming strategy.
///
/// `LastSegment` keeps the legacy flat layout: `http://h1/x/r.png` and
/// `http://h2/y/r.png` both map to `r.png`. `UrlHash` maps every distinct URL
/// string to its own file, keeping the extension for readability.
///
/// # Examples
///
/// - `cache_file_name("https://h/static/app.js", DiskNaming::LastSegment)` → `"app.js"`
/// - `cache_file_name("https://h/", DiskNaming::LastSegment)` → `"index"`
pub fn cache_file_name(url: &str, naming: DiskNaming) -> String {
    match naming {
        DiskNaming::LastSegment => {
            let sanitized = last_path_segment(url)
                .map(|s| sanitize_file_name(&s))
                .unwrap_or_default();
            if sanitized.is_empty() {
                INDEX_FILENAME.to_string()
            } else {
                sanitized
            }
        }
        DiskNaming::UrlHash => {
            let ext = extension(url).unwrap_or_default();
            format!("{}{}", url_digest(url), ext)
        }
    }
}

/// Canonical form of an absolute URL (`HTTP://H` → `http://h/`), used as the cache key.
pub fn canonical_url(url: &str) -> Option<String> {
    url::Url::parse(url).ok().map(String::from)
}

/// Removes the scheme marker from the front of `url`.
///
/// Only a leading marker is removed; occurrences elsewhere in the URL (for
/// example `custom-` in a path) are left intact. Returns `None` when the URL
/// does not carry the marker.
pub fn strip_marker<'a>(url: &'a str, marker: &str) -> Option<&'a str> {
    if marker.is_empty() {
        return None;
    }
    url.strip_prefix(marker)
}

/// Adds the scheme marker in front of `url` (`https://h/` → `custom-https://h/`).
pub fn mark_url(url: &str, marker: &str) -> String {
    format!("{}{}", marker, url)
}
