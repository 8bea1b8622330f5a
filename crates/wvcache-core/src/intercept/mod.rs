//! Custom-scheme request interception.
//!
//! Each request moves through `Received -> Resolving -> {ServedFromCache |
//! ServedFromNetwork | Failed}`. Cache hits never touch the network; misses are
//! fetched live, forwarded with the upstream headers, and stored for the rest
//! of the process (and on disk) when the upstream answered 2xx.

mod control;
mod response;

pub use control::{CancelToken, TaskControl};
pub use response::{InterceptedResponse, ResponseHead, Served, CACHED_TEXT_ENCODING};

use std::sync::Arc;

use crate::net::{FetchError, HttpClient};
use crate::store::ResourceStore;
use crate::url_model;

/// Per-request lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterceptState {
    Received,
    Resolving,
    ServedFromCache,
    ServedFromNetwork,
    Failed,
}

impl InterceptState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            InterceptState::ServedFromCache
                | InterceptState::ServedFromNetwork
                | InterceptState::Failed
        )
    }
}

impl From<Served> for InterceptState {
    fn from(served: Served) -> Self {
        match served {
            Served::Cache => InterceptState::ServedFromCache,
            Served::Network => InterceptState::ServedFromNetwork,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum InterceptError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
    #[error("failed to load data: {0}")]
    NetworkFailed(#[source] FetchError),
    #[error("request stopped by host")]
    Cancelled,
}

impl InterceptError {
    /// HTTP-equivalent status for the host's error object.
    pub fn status_code(&self) -> u16 {
        match self {
            InterceptError::InvalidUrl(_) => 400,
            InterceptError::NetworkFailed(_) => 500,
            InterceptError::Cancelled => 499,
        }
    }
}

/// The host side of one intercepted request (e.g. a web view's scheme task).
///
/// Calls arrive in order: `did_receive_response`, `did_receive_data`,
/// `did_finish`; or a single `did_fail`. Nothing is called after the request
/// was cancelled.
pub trait SchemeTask: Send {
    fn request_url(&self) -> &str;
    fn did_receive_response(&mut self, head: &ResponseHead);
    fn did_receive_data(&mut self, data: &[u8]);
    fn did_finish(&mut self);
    fn did_fail(&mut self, error: &InterceptError);
}

pub struct RequestInterceptor<C> {
    client: Arc<C>,
    store: Arc<ResourceStore>,
    marker: String,
}

impl<C> Clone for RequestInterceptor<C> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
            store: Arc::clone(&self.store),
            marker: self.marker.clone(),
        }
    }
}

impl<C: HttpClient> RequestInterceptor<C> {
    pub fn new(client: Arc<C>, store: Arc<ResourceStore>, marker: impl Into<String>) -> Self {
        Self {
            client,
            store,
            marker: marker.into(),
        }
    }

    pub fn store(&self) -> &Arc<ResourceStore> {
        &self.store
    }

    pub fn marker(&self) -> &str {
        &self.marker
    }

    /// Real URL behind a custom-scheme request URL.
    ///
    /// Strips the leading marker (a URL without it is taken as-is) and requires
    /// an absolute `http`/`https` URL. Returns the canonical form, which is the cache key.
    pub fn target_url(&self, request_url: &str) -> Result<String, InterceptError> {
        let target = url_model::strip_marker(request_url, &self.marker).unwrap_or(request_url);
        match url::Url::parse(target) {
            Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => Ok(parsed.into()),
            _ => Err(InterceptError::InvalidUrl(request_url.to_string())),
        }
    }

    /// Resolves a request to a complete response without delivering it.
    pub async fn resolve(&self, request_url: &str) -> Result<InterceptedResponse, InterceptError> {
        let target = self.target_url(request_url)?;

        if let Some(bytes) = self.store.get(&target) {
            tracing::debug!(url = %target, len = bytes.len(), "cache hit");
            return Ok(InterceptedResponse {
                head: ResponseHead::from_cache(request_url, &target, bytes.len()),
                body: bytes,
                served: Served::Cache,
            });
        }

        tracing::debug!(url = %target, "cache miss, fetching");
        let response = self
            .client
            .get(&target)
            .await
            .map_err(InterceptError::NetworkFailed)?;

        let cacheable = response.is_success();
        let head = ResponseHead::from_upstream(request_url, response.status, response.headers);
        let body: crate::store::Bytes = response.body.into();

        if cacheable {
            let disk_path = self.store.disk_path(&target);
            // Persist failures are logged by the store; the response is served regardless.
            let _ = self.store.put(&target, Arc::clone(&body), &disk_path).await;
        } else {
            tracing::debug!(
                url = %target,
                status = head.status,
                "not caching non-success response"
            );
        }

        Ok(InterceptedResponse {
            head,
            body,
            served: Served::Network,
        })
    }

    /// Runs one interception end to end and drives `task`.
    ///
    /// Returns the terminal state. When `cancel` is set the task receives no
    /// further calls; a fetch already in flight still completes and is cached.
    pub async fn handle<T: SchemeTask>(
        &self,
        task: &mut T,
        cancel: &CancelToken,
    ) -> InterceptState {
        let request_url = task.request_url().to_string();
        let state = match self.deliver(task, cancel).await {
            Ok(served) => InterceptState::from(served),
            Err(e @ InterceptError::Cancelled) => {
                tracing::debug!(url = %request_url, status = e.status_code(), "{}", e);
                InterceptState::Failed
            }
            Err(e) => {
                tracing::warn!(
                    url = %request_url,
                    status = e.status_code(),
                    "interception failed: {}",
                    e
                );
                InterceptState::Failed
            }
        };
        debug_assert!(state.is_terminal());
        tracing::trace!(url = %request_url, ?state, "interception finished");
        state
    }

    /// Like [`handle`](Self::handle), but reports why the request did not complete.
    ///
    /// `did_fail` is called for invalid URLs and network failures. A cancelled
    /// request yields `InterceptError::Cancelled` without any task callback.
    pub async fn deliver<T: SchemeTask>(
        &self,
        task: &mut T,
        cancel: &CancelToken,
    ) -> Result<Served, InterceptError> {
        let request_url = task.request_url().to_string();
        tracing::trace!(url = %request_url, state = ?InterceptState::Received, "intercepted");
        tracing::trace!(url = %request_url, state = ?InterceptState::Resolving, "resolving");
        let resolved = self.resolve(&request_url).await;
        if cancel.is_cancelled() {
            return Err(InterceptError::Cancelled);
        }

        let response = match resolved {
            Ok(response) => response,
            Err(e) => {
                task.did_fail(&e);
                return Err(e);
            }
        };

        task.did_receive_response(&response.head);
        if cancel.is_cancelled() {
            return Err(InterceptError::Cancelled);
        }
        task.did_receive_data(&response.body);
        if cancel.is_cancelled() {
            return Err(InterceptError::Cancelled);
        }
        task.did_finish();

        Ok(response.served)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DiskNaming;
    use crate::net::mock::MockClient;

    #[derive(Debug, Default)]
    struct RecordingTask {
        url: String,
        events: Vec<String>,
        head: Option<ResponseHead>,
        body: Vec<u8>,
        error_status: Option<u16>,
    }

    impl RecordingTask {
        fn new(url: &str) -> Self {
            Self {
                url: url.to_string(),
                ..Self::default()
            }
        }
    }

    impl SchemeTask for RecordingTask {
        fn request_url(&self) -> &str {
            &self.url
        }
        fn did_receive_response(&mut self, head: &ResponseHead) {
            self.events.push("response".into());
            self.head = Some(head.clone());
        }
        fn did_receive_data(&mut self, data: &[u8]) {
            self.events.push("data".into());
            self.body.extend_from_slice(data);
        }
        fn did_finish(&mut self) {
            self.events.push("finish".into());
        }
        fn did_fail(&mut self, error: &InterceptError) {
            self.events.push("fail".into());
            self.error_status = Some(error.status_code());
        }
    }

    fn setup(client: MockClient) -> (tempfile::TempDir, RequestInterceptor<MockClient>) {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(ResourceStore::new(dir.path().join("c"), DiskNaming::UrlHash));
        (dir, RequestInterceptor::new(Arc::new(client), store, "custom-"))
    }

    #[test]
    fn target_url_strips_marker() {
        let (_dir, i) = setup(MockClient::new());
        assert_eq!(
            i.target_url("custom-http://h/mobile/help/faq").unwrap(),
            "http://h/mobile/help/faq"
        );
        assert_eq!(i.target_url("https://h/a.js").unwrap(), "https://h/a.js");
    }

    #[test]
    fn target_url_rejects_invalid() {
        let (_dir, i) = setup(MockClient::new());
        for bad in ["custom-", "custom-not a url", "custom-ftp://h/a", "custom-http//h"] {
            let err = i.target_url(bad).unwrap_err();
            assert_eq!(err.status_code(), 400, "{bad}");
        }
    }

    #[tokio::test]
    async fn cache_hit_serves_without_network() {
        let client = MockClient::new();
        let (_dir, i) = setup(client.clone());
        let url = "http://h/app.js";
        i.store().put(url, b"let x;".to_vec(), &i.store().disk_path(url)).await.unwrap();

        let mut task = RecordingTask::new("custom-http://h/app.js");
        let state = i.handle(&mut task, &CancelToken::new()).await;

        assert_eq!(state, InterceptState::ServedFromCache);
        assert!(client.calls().is_empty());
        assert_eq!(task.events, vec!["response", "data", "finish"]);
        assert_eq!(task.body, b"let x;");
        let head = task.head.unwrap();
        assert_eq!(head.mime_type.as_deref(), Some("application/javascript"));
        assert_eq!(head.expected_content_length, Some(6));
        assert_eq!(head.url, "custom-http://h/app.js");
    }

    #[tokio::test]
    async fn cache_miss_fetches_forwards_and_stores() {
        let client = MockClient::new().with("http://h/style.css", b"body{}");
        let (_dir, i) = setup(client.clone());

        let mut task = RecordingTask::new("custom-http://h/style.css");
        let state = i.handle(&mut task, &CancelToken::new()).await;

        assert_eq!(state, InterceptState::ServedFromNetwork);
        assert_eq!(task.events, vec!["response", "data", "finish"]);
        assert_eq!(task.body, b"body{}");
        assert_eq!(task.head.as_ref().unwrap().header("X-Upstream"), Some("mock"));
        assert_eq!(i.store().get("http://h/style.css").as_deref(), Some(&b"body{}"[..]));
        assert!(i.store().disk_path("http://h/style.css").exists());

        // Second request is a hit.
        let mut again = RecordingTask::new("custom-http://h/style.css");
        assert_eq!(
            i.handle(&mut again, &CancelToken::new()).await,
            InterceptState::ServedFromCache
        );
        assert_eq!(client.call_count("http://h/style.css"), 1);
    }

    #[tokio::test]
    async fn network_failure_fails_task_and_caches_nothing() {
        let (_dir, i) = setup(MockClient::new());
        let mut task = RecordingTask::new("custom-http://down/a.js");
        let state = i.handle(&mut task, &CancelToken::new()).await;
        assert_eq!(state, InterceptState::Failed);
        assert_eq!(task.events, vec!["fail"]);
        assert_eq!(task.error_status, Some(500));
        assert!(i.store().is_empty());
    }

    #[tokio::test]
    async fn invalid_url_fails_with_400() {
        let client = MockClient::new();
        let (_dir, i) = setup(client.clone());
        let mut task = RecordingTask::new("custom-::nope");
        assert_eq!(i.handle(&mut task, &CancelToken::new()).await, InterceptState::Failed);
        assert_eq!(task.error_status, Some(400));
        assert!(client.calls().is_empty());
    }

    #[tokio::test]
    async fn non_success_is_forwarded_but_not_cached() {
        let client = MockClient::new().with_status("http://h/missing.png", 404, b"nope");
        let (_dir, i) = setup(client);
        let mut task = RecordingTask::new("custom-http://h/missing.png");
        let state = i.handle(&mut task, &CancelToken::new()).await;
        assert_eq!(state, InterceptState::ServedFromNetwork);
        assert_eq!(task.head.as_ref().unwrap().status, 404);
        assert_eq!(task.body, b"nope");
        assert!(!i.store().contains("http://h/missing.png"));
    }

    #[tokio::test]
    async fn cancelled_request_receives_nothing_but_result_is_cached() {
        let client = MockClient::new().with("http://h/a.js", b"A");
        let (_dir, i) = setup(client);
        let cancel = CancelToken::new();
        cancel.cancel();
        let mut task = RecordingTask::new("custom-http://h/a.js");
        assert_eq!(i.handle(&mut task, &cancel).await, InterceptState::Failed);
        assert!(task.events.is_empty());
        assert!(i.store().contains("http://h/a.js"));
    }

    #[tokio::test]
    async fn cancelled_request_reports_cancelled_499() {
        let client = MockClient::new().with("http://h/a.js", b"A");
        let (_dir, i) = setup(client);
        let cancel = CancelToken::new();
        cancel.cancel();
        let mut task = RecordingTask::new("custom-http://h/a.js");
        let err = i.deliver(&mut task, &cancel).await.unwrap_err();
        assert!(matches!(err, InterceptError::Cancelled));
        assert_eq!(err.status_code(), 499);
        assert!(task.events.is_empty());
        assert!(task.error_status.is_none());
    }

    #[tokio::test]
    async fn deliver_reports_network_failure_after_did_fail() {
        let (_dir, i) = setup(MockClient::new());
        let mut task = RecordingTask::new("custom-http://down/a.js");
        let err = i.deliver(&mut task, &CancelToken::new()).await.unwrap_err();
        assert!(matches!(err, InterceptError::NetworkFailed(_)));
        assert_eq!(task.events, vec!["fail"]);
    }

    #[tokio::test]
    async fn persist_failure_still_serves_network_response() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, b"file").unwrap();
        let store = Arc::new(ResourceStore::new(&blocker, DiskNaming::UrlHash));
        let client = MockClient::new().with("http://h/a.js", b"A");
        let i = RequestInterceptor::new(Arc::new(client), Arc::clone(&store), "custom-");

        let mut task = RecordingTask::new("custom-http://h/a.js");
        let state = i.handle(&mut task, &CancelToken::new()).await;

        assert_eq!(state, InterceptState::ServedFromNetwork);
        assert_eq!(task.events, vec!["response", "data", "finish"]);
        assert_eq!(task.body, b"A");
        assert!(store.contains("http://h/a.js"));
        assert!(!store.disk_path("http://h/a.js").exists());
    }

    #[tokio::test]
    async fn equivalent_urls_share_one_cache_entry() {
        let client = MockClient::new().with("http://h/", b"root");
        let (_dir, i) = setup(client.clone());
        assert_eq!(i.target_url("custom-HTTP://H").unwrap(), "http://h/");

        let mut first = RecordingTask::new("custom-http://h");
        assert_eq!(
            i.handle(&mut first, &CancelToken::new()).await,
            InterceptState::ServedFromNetwork
        );
        let mut second = RecordingTask::new("custom-http://h/");
        assert_eq!(
            i.handle(&mut second, &CancelToken::new()).await,
            InterceptState::ServedFromCache
        );
        assert_eq!(client.calls(), vec!["http://h/".to_string()]);
    }

    #[test]
    fn terminal_states() {
        assert!(!InterceptState::Received.is_terminal());
        assert!(!InterceptState::Resolving.is_terminal());
        assert!(InterceptState::Failed.is_terminal());
        assert!(InterceptState::from(Served::Cache).is_terminal());
    }
}
