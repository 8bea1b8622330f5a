//! `wvcache fetch <custom-url>` – run a single interception.

use anyhow::{bail, Context, Result};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use wvcache_core::config::CacheConfig;
use wvcache_core::intercept::{
    CancelToken, InterceptError, InterceptState, RequestInterceptor, ResponseHead, SchemeTask,
};
use wvcache_core::net::{CurlClient, CurlOptions};
use wvcache_core::store::ResourceStore;

/// Collects what the interceptor delivers so it can be written out afterwards.
struct BufferedTask {
    url: String,
    head: Option<ResponseHead>,
    body: Vec<u8>,
    error: Option<String>,
}

impl SchemeTask for BufferedTask {
    fn request_url(&self) -> &str {
        &self.url
    }

    fn did_receive_response(&mut self, head: &ResponseHead) {
        self.head = Some(head.clone());
    }

    fn did_receive_data(&mut self, data: &[u8]) {
        self.body.extend_from_slice(data);
    }

    fn did_finish(&mut self) {}

    fn did_fail(&mut self, error: &InterceptError) {
        self.error = Some(format!("{} (status {})", error, error.status_code()));
    }
}

pub async fn run_fetch(
    cfg: &CacheConfig,
    url: &str,
    output: Option<&Path>,
    include: bool,
) -> Result<()> {
    let client = Arc::new(CurlClient::new(CurlOptions::from_config(cfg)));
    let store = Arc::new(ResourceStore::from_config(cfg)?);
    let interceptor = RequestInterceptor::new(client, store, cfg.scheme_marker.clone());

    let mut task = BufferedTask {
        url: url.to_string(),
        head: None,
        body: Vec::new(),
        error: None,
    };
    let state = interceptor.handle(&mut task, &CancelToken::new()).await;

    if let Some(error) = task.error {
        bail!("{}: {}", url, error);
    }

    if include {
        if let Some(head) = &task.head {
            let source = match state {
                InterceptState::ServedFromCache => "cache",
                _ => "network",
            };
            eprintln!("status: {} ({})", head.status, source);
            for (name, value) in &head.headers {
                eprintln!("{}: {}", name, value);
            }
            eprintln!();
        }
    }

    match output {
        Some(path) => std::fs::write(path, &task.body)
            .with_context(|| format!("write {}", path.display()))?,
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(&task.body)?;
            stdout.flush()?;
        }
    }
    Ok(())
}
