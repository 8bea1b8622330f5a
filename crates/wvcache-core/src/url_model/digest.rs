//! Stable digest of a resource URL, used for collision-free cache file names.

use sha2::{Digest, Sha256};

/// SHA-256 of the URL string as lowercase hex.
pub fn url_digest(url: &str) -> String {
    hex::encode(Sha256::digest(url.as_bytes()))
}
