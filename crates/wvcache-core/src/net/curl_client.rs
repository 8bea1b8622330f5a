//! libcurl-backed [`HttpClient`].

use std::future::Future;
use std::str;
use std::time::Duration;

use super::parse::parse_head;
use super::{FetchError, FetchedResponse, HttpClient};
use crate::config::CacheConfig;

/// Per-request curl settings.
#[derive(Debug, Clone)]
pub struct CurlOptions {
    pub connect_timeout: Duration,
    /// Whole-transfer limit (None = wait indefinitely).
    pub timeout: Option<Duration>,
    pub max_redirections: u32,
    pub user_agent: Option<String>,
}

impl Default for CurlOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(15),
            timeout: Some(Duration::from_secs(60)),
            max_redirections: 10,
            user_agent: None,
        }
    }
}

impl CurlOptions {
    pub fn from_config(cfg: &CacheConfig) -> Self {
        Self {
            connect_timeout: cfg.connect_timeout(),
            timeout: cfg.fetch_timeout(),
            user_agent: cfg.user_agent.clone(),
            ..Self::default()
        }
    }
}

/// GET client that runs one curl easy handle per request on the blocking pool.
#[derive(Debug, Clone, Default)]
pub struct CurlClient {
    options: CurlOptions,
}

impl CurlClient {
    pub fn new(options: CurlOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &CurlOptions {
        &self.options
    }
}

impl HttpClient for CurlClient {
    fn get(&self, url: &str) -> impl Future<Output = Result<FetchedResponse, FetchError>> + Send {
        let url = url.to_string();
        let options = self.options.clone();
        async move {
            tokio::task::spawn_blocking(move || blocking_get(&url, &options))
                .await
                .map_err(|e| FetchError::Worker(e.to_string()))?
        }
    }
}

/// Performs a GET and buffers the whole body.
///
/// Follows redirects. Any status code is returned as a response; only transport
/// failures are errors. Runs in the current thread; call from `spawn_blocking`
/// if used from async code.
pub fn blocking_get(url: &str, options: &CurlOptions) -> Result<FetchedResponse, FetchError> {
    let mut header_lines: Vec<String> = Vec::new();
    let mut body: Vec<u8> = Vec::new();

    let mut easy = curl::easy::Easy::new();
    easy.url(url)
        .map_err(|_| FetchError::InvalidUrl(url.to_string()))?;
    easy.follow_location(true)?;
    easy.max_redirections(options.max_redirections)?;
    easy.connect_timeout(options.connect_timeout)?;
    if let Some(timeout) = options.timeout {
        easy.timeout(timeout)?;
    }
    if let Some(ua) = &options.user_agent {
        easy.useragent(ua)?;
    }

    {
        let mut transfer = easy.transfer();
        transfer.header_function(|data| {
            if let Ok(s) = str::from_utf8(data) {
                header_lines.push(s.trim_end().to_string());
            }
            true
        })?;
        transfer.write_function(|data| {
            body.extend_from_slice(data);
            Ok(data.len())
        })?;
        transfer.perform()?;
    }

    let code = easy.response_code()?;
    let effective_url = easy
        .effective_url()?
        .map(str::to_string)
        .unwrap_or_else(|| url.to_string());

    let head = parse_head(&header_lines);
    Ok(FetchedResponse {
        url: effective_url,
        status: head.status.unwrap_or(code),
        headers: head.headers,
        body,
    })
}
