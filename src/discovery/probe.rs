//! Single-endpoint liveness probe
//!
//! A probe is one bounded GET against `/health`; a 2xx within the timeout
//! means reachable, anything else means not. Probes never fail to their
//! caller, so an unreachable host is just an excluded candidate, not an
//! error path.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use tokio::time::timeout;
use tracing::trace;

use crate::endpoint::Endpoint;

/// Health path probed on every candidate
pub const HEALTH_PATH: &str = "/health";

/// Outcome of one liveness check
#[derive(Debug, Clone)]
pub struct ProbeResult {
    pub endpoint: Endpoint,
    pub reachable: bool,
}

/// Liveness-check seam; the engine and orchestrator only see this trait
#[async_trait]
pub trait Prober: Send + Sync {
    async fn probe(&self, endpoint: &Endpoint, timeout: Duration) -> ProbeResult;
}

/// Real prober issuing HTTP GETs through a shared reqwest client
pub struct HttpProber {
    client: Client,
}

impl HttpProber {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl Default for HttpProber {
    fn default() -> Self {
        // Per-probe deadlines come from tokio timeouts; the client-level
        // timeout is only a backstop.
        Self::new(
            Client::builder()
                .timeout(Duration::from_secs(5))
                .build()
                .expect("Failed to create HTTP client"),
        )
    }
}

#[async_trait]
impl Prober for HttpProber {
    async fn probe(&self, endpoint: &Endpoint, timeout_duration: Duration) -> ProbeResult {
        let url = endpoint.url_for(HEALTH_PATH);
        let start = Instant::now();

        let result = timeout(timeout_duration, self.client.get(&url).send()).await;

        let reachable = match result {
            Ok(Ok(response)) => response.status().is_success(),
            Ok(Err(_)) | Err(_) => false,
        };

        trace!(
            "Probe {} -> {} ({}ms)",
            url,
            if reachable { "up" } else { "down" },
            start.elapsed().as_millis()
        );

        ProbeResult {
            endpoint: endpoint.clone(),
            reachable,
        }
    }
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Scripted prober: endpoints are reachable when listed, optionally after
    /// a per-endpoint artificial delay
    pub struct MockProber {
        reachable: HashMap<String, bool>,
        delays: HashMap<String, Duration>,
        probe_count: Arc<AtomicUsize>,
    }

    impl MockProber {
        pub fn new() -> Self {
            Self {
                reachable: HashMap::new(),
                delays: HashMap::new(),
                probe_count: Arc::new(AtomicUsize::new(0)),
            }
        }

        pub fn up(mut self, endpoint: &Endpoint) -> Self {
            self.reachable.insert(endpoint.base_url(), true);
            self
        }

        pub fn up_after(mut self, endpoint: &Endpoint, delay: Duration) -> Self {
            self.reachable.insert(endpoint.base_url(), true);
            self.delays.insert(endpoint.base_url(), delay);
            self
        }

        pub fn probe_count(&self) -> usize {
            self.probe_count.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Prober for MockProber {
        async fn probe(&self, endpoint: &Endpoint, timeout_duration: Duration) -> ProbeResult {
            self.probe_count.fetch_add(1, Ordering::SeqCst);

            let key = endpoint.base_url();
            if let Some(delay) = self.delays.get(&key) {
                tokio::time::sleep(*delay).await;
                if *delay >= timeout_duration {
                    return ProbeResult {
                        endpoint: endpoint.clone(),
                        reachable: false,
                    };
                }
            }

            ProbeResult {
                endpoint: endpoint.clone(),
                reachable: self.reachable.get(&key).copied().unwrap_or(false),
            }
        }
    }
}
