//! What the interceptor hands back to the host.

use crate::mime;
use crate::store::Bytes;

/// Text encoding announced for responses synthesized from the cache.
pub const CACHED_TEXT_ENCODING: &str = "utf-8";

/// Response metadata delivered before any body bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseHead {
    /// The URL the host asked for (scheme marker included).
    pub url: String,
    pub status: u32,
    pub headers: Vec<(String, String)>,
    pub mime_type: Option<String>,
    pub expected_content_length: Option<u64>,
    pub text_encoding: Option<String>,
}

impl ResponseHead {
    /// Head for bytes served from the store: 200, MIME type from the target URL suffix.
    pub fn from_cache(request_url: &str, target_url: &str, len: usize) -> Self {
        let mime_type = mime::resolve(target_url);
        Self {
            url: request_url.to_string(),
            status: 200,
            headers: vec![
                ("Content-Type".to_string(), mime_type.to_string()),
                ("Content-Length".to_string(), len.to_string()),
            ],
            mime_type: Some(mime_type.to_string()),
            expected_content_length: Some(len as u64),
            text_encoding: Some(CACHED_TEXT_ENCODING.to_string()),
        }
    }

    /// Head forwarding the upstream status and headers unchanged.
    pub fn from_upstream(request_url: &str, status: u32, headers: Vec<(String, String)>) -> Self {
        let find = |name: &str| {
            headers
                .iter()
                .find(|(n, _)| n.eq_ignore_ascii_case(name))
                .map(|(_, v)| v.clone())
        };
        let content_type = find("content-type");
        let mime_type = content_type
            .as_deref()
            .map(|v| v.split(';').next().unwrap_or(v).trim().to_string());
        let text_encoding = content_type.as_deref().and_then(charset);
        let expected_content_length = find("content-length").and_then(|v| v.parse().ok());
        Self {
            url: request_url.to_string(),
            status,
            headers,
            mime_type,
            expected_content_length,
            text_encoding,
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

fn charset(content_type: &str) -> Option<String> {
    content_type.split(';').skip(1).find_map(|param| {
        let (k, v) = param.split_once('=')?;
        k.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| v.trim().trim_matches('"').to_string())
    })
}

/// Where a response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Served {
    Cache,
    Network,
}

/// A fully resolved response, ready to deliver.
#[derive(Debug, Clone)]
pub struct InterceptedResponse {
    pub head: ResponseHead,
    pub body: Bytes,
    pub served: Served,
}
