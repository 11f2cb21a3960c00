// src/utils/http.rs

//! HTTP fetching.
//!
//! The portals serve misconfigured or self-signed certificates, so the client
//! negotiates TLS without validating the peer certificate.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::error::{FetchFailure, Result};
use crate::models::CrawlerConfig;

/// Something that can turn a URL into a response body.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch `url` and return its body. Failures are logged by the implementor.
    async fn fetch(&self, url: &str) -> std::result::Result<String, FetchFailure>;
}

/// Create the crawling client: bounded timeout, relaxed certificate checks.
pub fn create_async_client(config: &CrawlerConfig) -> Result<Client> {
    let client = Client::builder()
        .user_agent(&config.user_agent)
        .timeout(Duration::from_secs(config.timeout_secs))
        .danger_accept_invalid_certs(true)
        .build()?;
    Ok(client)
}

/// `Fetcher` backed by a reqwest client.
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(config: &CrawlerConfig) -> Result<Self> {
        Ok(Self::with_client(create_async_client(config)?))
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    async fn get(&self, url: &str) -> std::result::Result<String, FetchFailure> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchFailure::Status(status.as_u16()));
        }
        response
            .text()
            .await
            .map_err(|e| FetchFailure::Body(e.to_string()))
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> std::result::Result<String, FetchFailure> {
        let result = self.get(url).await;
        match &result {
            Ok(body) => log::debug!("Fetched {} ({} bytes)", url, body.len()),
            Err(failure) => log::warn!("Error fetching {}: {}", url, failure),
        }
        result
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory fetcher for tests.

    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;

    use super::Fetcher;
    use crate::error::FetchFailure;

    #[derive(Clone)]
    struct Route {
        response: Result<String, FetchFailure>,
        delay: Duration,
    }

    /// Serves canned bodies by exact URL. Unknown URLs answer 404.
    #[derive(Default)]
    pub struct StubFetcher {
        routes: HashMap<String, Route>,
        calls: Mutex<Vec<String>>,
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    impl StubFetcher {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn route(mut self, url: impl Into<String>, body: impl Into<String>) -> Self {
            self.routes.insert(
                url.into(),
                Route {
                    response: Ok(body.into()),
                    delay: Duration::ZERO,
                },
            );
            self
        }

        pub fn route_delayed(
            mut self,
            url: impl Into<String>,
            body: impl Into<String>,
            delay_ms: u64,
        ) -> Self {
            self.routes.insert(
                url.into(),
                Route {
                    response: Ok(body.into()),
                    delay: Duration::from_millis(delay_ms),
                },
            );
            self
        }

        pub fn fail(mut self, url: impl Into<String>, failure: FetchFailure) -> Self {
            self.routes.insert(
                url.into(),
                Route {
                    response: Err(failure),
                    delay: Duration::ZERO,
                },
            );
            self
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        pub fn call_count(&self, url: &str) -> usize {
            self.calls().iter().filter(|c| c.as_str() == url).count()
        }

        /// Highest number of fetches observed in flight at once.
        pub fn peak_in_flight(&self) -> usize {
            self.peak.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Fetcher for StubFetcher {
        async fn fetch(&self, url: &str) -> Result<String, FetchFailure> {
            self.calls.lock().unwrap().push(url.to_string());
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);

            let route = self.routes.get(url).cloned();
            let delay = route.as_ref().map(|r| r.delay).unwrap_or_default();
            // Always yield so concurrent callers overlap.
            tokio::time::sleep(delay.max(Duration::from_millis(1))).await;

            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            match route {
                Some(route) => route.response,
                None => Err(FetchFailure::Status(404)),
            }
        }
    }
}
