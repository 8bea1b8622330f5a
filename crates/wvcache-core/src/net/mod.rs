//! HTTP GET client used by the prefetcher and the interceptor.
//!
//! The production client drives a libcurl easy handle on tokio's blocking
//! pool; tests substitute an in-memory client through the [`HttpClient`] trait.

mod curl_client;
#[cfg(test)]
pub(crate) mod mock;
mod parse;

pub use curl_client::{CurlClient, CurlOptions};

use std::future::Future;

/// Error from a single GET: transport failure, non-success status, or a lost worker.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Curl reported an error (DNS, connect, timeout, TLS...).
    #[error("transport error: {0}")]
    Curl(#[from] curl::Error),
    /// Upstream answered with a non-2xx status.
    #[error("HTTP {0}")]
    Http(u32),
    /// URL could not be handed to the client.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
    /// The blocking worker panicked or was cancelled.
    #[error("fetch worker failed: {0}")]
    Worker(String),
}

/// A complete upstream response: final status line, last header block and body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchedResponse {
    /// Effective URL after redirects.
    pub url: String,
    pub status: u32,
    /// Header name/value pairs in wire order.
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl FetchedResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// First header value named `name` (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Turns a non-2xx response into `FetchError::Http`.
    pub fn error_for_status(self) -> Result<Self, FetchError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(FetchError::Http(self.status))
        }
    }
}

/// Asynchronous GET. Implementations must not block the calling task.
pub trait HttpClient: Send + Sync + 'static {
    fn get(&self, url: &str) -> impl Future<Output = Result<FetchedResponse, FetchError>> + Send;
}
