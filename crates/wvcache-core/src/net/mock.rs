//! In-memory [`HttpClient`] for unit tests. Records every requested URL.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};

use super::{FetchError, FetchedResponse, HttpClient};

#[derive(Clone, Default)]
pub(crate) struct MockClient {
    routes: Arc<Mutex<HashMap<String, (u32, Vec<u8>)>>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl MockClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, url: &str, body: &[u8]) -> Self {
        self.with_status(url, 200, body)
    }

    pub fn with_status(self, url: &str, status: u32, body: &[u8]) -> Self {
        self.routes
            .lock()
            .unwrap()
            .insert(url.to_string(), (status, body.to_vec()));
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self, url: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|u| *u == url).count()
    }
}

impl HttpClient for MockClient {
    fn get(&self, url: &str) -> impl Future<Output = Result<FetchedResponse, FetchError>> + Send {
        self.calls.lock().unwrap().push(url.to_string());
        let route = self.routes.lock().unwrap().get(url).cloned();
        let url = url.to_string();
        async move {
            // CURLE_COULDNT_CONNECT for unknown routes.
            let (status, body) = route.ok_or_else(|| FetchError::Curl(curl::Error::new(7)))?;
            Ok(FetchedResponse {
                url,
                status,
                headers: vec![
                    ("Content-Type".to_string(), "text/plain".to_string()),
                    ("X-Upstream".to_string(), "mock".to_string()),
                ],
                body,
            })
        }
    }
}
