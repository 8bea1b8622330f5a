//! Host-facing wiring: one store shared by a background prefetch run and the interceptor.

use anyhow::Result;
use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::config::CacheConfig;
use crate::intercept::{InterceptState, RequestInterceptor, SchemeTask, TaskControl};
use crate::net::{CurlClient, CurlOptions, HttpClient};
use crate::prefetch::{PrefetchReport, Prefetcher};
use crate::store::ResourceStore;
use crate::url_model;

pub struct CacheSession<C> {
    store: Arc<ResourceStore>,
    prefetcher: Prefetcher<C>,
    interceptor: RequestInterceptor<C>,
    control: Arc<TaskControl>,
    prefetch: Option<JoinHandle<PrefetchReport>>,
}

impl CacheSession<CurlClient> {
    /// Builds the curl client and store from `cfg` and starts prefetching
    /// `manifest_url` in the background. Must be called inside a tokio runtime.
    pub fn start(cfg: &CacheConfig, manifest_url: Option<&str>) -> Result<Self> {
        let client = Arc::new(CurlClient::new(CurlOptions::from_config(cfg)));
        let store = Arc::new(ResourceStore::from_config(cfg)?);
        Ok(Self::with_parts(cfg, client, store, manifest_url))
    }
}

impl<C: HttpClient> CacheSession<C> {
    pub fn with_parts(
        cfg: &CacheConfig,
        client: Arc<C>,
        store: Arc<ResourceStore>,
        manifest_url: Option<&str>,
    ) -> Self {
        let prefetcher = Prefetcher::new(Arc::clone(&client), Arc::clone(&store))
            .with_max_concurrent(cfg.max_concurrent_prefetch);
        let interceptor =
            RequestInterceptor::new(client, Arc::clone(&store), cfg.scheme_marker.clone());
        let prefetch = manifest_url.map(|url| {
            tracing::info!(
                manifest = url,
                cache_dir = %store.cache_dir().display(),
                "starting prefetch"
            );
            prefetcher.spawn(url)
        });
        Self {
            store,
            prefetcher,
            interceptor,
            control: Arc::new(TaskControl::new()),
            prefetch,
        }
    }

    pub fn store(&self) -> &Arc<ResourceStore> {
        &self.store
    }

    pub fn prefetcher(&self) -> &Prefetcher<C> {
        &self.prefetcher
    }

    pub fn interceptor(&self) -> &RequestInterceptor<C> {
        &self.interceptor
    }

    pub fn control(&self) -> &Arc<TaskControl> {
        &self.control
    }

    /// The URL the host should load first: `content_url` behind the scheme marker.
    pub fn initial_url(&self, content_url: &str) -> String {
        url_model::mark_url(content_url, self.interceptor.marker())
    }

    /// Serves one intercepted request, registered under `task_id` so [`stop`](Self::stop) can cancel it.
    pub async fn handle<T: SchemeTask>(&self, task_id: u64, task: &mut T) -> InterceptState {
        let token = self.control.register(task_id);
        tracing::trace!(task_id, in_flight = self.control.in_flight(), "request registered");
        let state = self.interceptor.handle(task, &token).await;
        self.control.unregister(task_id);
        state
    }

    /// Host stopped request `task_id`.
    pub fn stop(&self, task_id: u64) -> bool {
        self.control.request_cancel(task_id)
    }

    /// Waits for the background prefetch started by this session, if any.
    pub async fn wait_for_prefetch(&mut self) -> Option<PrefetchReport> {
        let handle = self.prefetch.take()?;
        match handle.await {
            Ok(report) => Some(report),
            Err(e) => {
                tracing::warn!("prefetch task failed: {}", e);
                None
            }
        }
    }
}
