//! Staged discovery orchestrator
//!
//! Turns "no known server address" into a verified active endpoint by walking
//! cheap stages before expensive ones: cached address, device-specific
//! aliases, curated common addresses, then full subnet scans. The first
//! success freezes the active endpoint and writes through the cache; full
//! exhaustion leaves the static fallback in place and is reported as a soft
//! outcome, never an error.
//!
//! Stages run strictly one after another; only the probes inside a stage's
//! batch run in parallel. Once a batch succeeds, no later batch or prefix is
//! ever started, and because selection waits for the whole batch anyway, no
//! in-flight work outlives a run.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info};

use super::candidates::{CandidateSource, DEFAULT_BATCH_SIZE};
use super::engine::ProbeEngine;
use super::probe::Prober;
use crate::cache::EndpointCache;
use crate::device::DeviceClass;
use crate::endpoint::{ActiveEndpoint, Endpoint};

/// Timeouts and pacing for a discovery run
#[derive(Debug, Clone)]
pub struct DiscoveryConfig {
    /// Generous timeout for the single cached-endpoint probe
    pub cache_probe_timeout: Duration,
    /// Timeout for the device-specific batch
    pub device_probe_timeout: Duration,
    /// Timeout for the common-address batch
    pub common_probe_timeout: Duration,
    /// Short timeout for brute-force scan batches
    pub scan_probe_timeout: Duration,
    /// Pause between consecutive scan batches to throttle burst load
    pub scan_batch_pause: Duration,
    /// Hosts probed concurrently during a ranged scan
    pub scan_batch_size: usize,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            cache_probe_timeout: Duration::from_millis(1500),
            device_probe_timeout: Duration::from_millis(1000),
            common_probe_timeout: Duration::from_millis(500),
            scan_probe_timeout: Duration::from_millis(250),
            scan_batch_pause: Duration::from_millis(50),
            scan_batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

/// Which stage produced the active endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscoverySource {
    Cache,
    DeviceSpecific,
    CommonAddresses,
    RangedScan,
    Fallback,
}

/// Result of one discovery run
#[derive(Debug, Clone)]
pub struct DiscoveryOutcome {
    pub endpoint: Endpoint,
    pub source: DiscoverySource,
    pub elapsed: Duration,
}

impl DiscoveryOutcome {
    /// Whether a live server was actually found (fallback means none was)
    pub fn found(&self) -> bool {
        self.source != DiscoverySource::Fallback
    }
}

/// Drives candidate generation and batch probing, and owns the only write
/// path to the active endpoint
pub struct Discovery {
    engine: ProbeEngine,
    candidates: Arc<dyn CandidateSource>,
    cache: EndpointCache,
    active: ActiveEndpoint,
    config: DiscoveryConfig,
}

impl Discovery {
    pub fn new(
        prober: Arc<dyn Prober>,
        candidates: Arc<dyn CandidateSource>,
        cache: EndpointCache,
        active: ActiveEndpoint,
        config: DiscoveryConfig,
    ) -> Self {
        Self {
            engine: ProbeEngine::new(prober),
            candidates,
            cache,
            active,
            config,
        }
    }

    /// Run the staged state machine to completion. Idempotent; a rerun is a
    /// fresh pass over the same stages. Never returns an error: exhaustion
    /// is the Fallback outcome.
    pub async fn run(&self, device_class: DeviceClass) -> DiscoveryOutcome {
        let start = Instant::now();
        info!("Starting endpoint discovery (device class: {})", device_class);

        // Stage 1: cached endpoint, probed as a single-candidate batch. A
        // hit keeps the existing cache entry untouched.
        if let Some(cached) = self.cache.get() {
            debug!("Probing cached endpoint {}", cached);
            if let Some(endpoint) = self
                .engine
                .evaluate_batch(&[cached], self.config.cache_probe_timeout)
                .await
            {
                return self.finish(endpoint, DiscoverySource::Cache, start, false);
            }
            debug!("Cached endpoint did not answer, continuing");
        }

        // Stage 2: device-specific aliases, one batch.
        let device_list = self.candidates.device_specific(device_class);
        if let Some(endpoint) = self
            .engine
            .evaluate_batch(&device_list, self.config.device_probe_timeout)
            .await
        {
            return self.finish(endpoint, DiscoverySource::DeviceSpecific, start, true);
        }

        // Stage 3: curated common addresses, one batch.
        let common_list = self.candidates.common_addresses();
        if let Some(endpoint) = self
            .engine
            .evaluate_batch(&common_list, self.config.common_probe_timeout)
            .await
        {
            return self.finish(endpoint, DiscoverySource::CommonAddresses, start, true);
        }

        // Stage 4: ranged subnet scan. Batches within a prefix run strictly
        // one after another so concurrency stays bounded at batch size.
        for range in self.candidates.subnet_ranges() {
            info!(
                "Scanning {}.{}-{} ({} hosts)",
                range.prefix,
                range.start_host,
                range.end_host,
                range.host_count()
            );

            for batch in range.batches(self.config.scan_batch_size) {
                if let Some(endpoint) = self
                    .engine
                    .evaluate_batch(&batch, self.config.scan_probe_timeout)
                    .await
                {
                    return self.finish(endpoint, DiscoverySource::RangedScan, start, true);
                }

                // Throttle after every failed batch, including between
                // prefixes, so burst load never doubles at a boundary.
                if !self.config.scan_batch_pause.is_zero() {
                    tokio::time::sleep(self.config.scan_batch_pause).await;
                }
            }
        }

        // Stage 5: exhaustion. The active endpoint stays the static
        // fallback; callers see a defined degraded state, not a failure.
        let fallback = self.active.get();
        info!(
            "Discovery exhausted after {:?}, staying on fallback {}",
            start.elapsed(),
            fallback
        );
        DiscoveryOutcome {
            endpoint: fallback,
            source: DiscoverySource::Fallback,
            elapsed: start.elapsed(),
        }
    }

    fn finish(
        &self,
        endpoint: Endpoint,
        source: DiscoverySource,
        start: Instant,
        write_cache: bool,
    ) -> DiscoveryOutcome {
        self.active.set(endpoint.clone());
        if write_cache {
            self.cache.put(&endpoint);
        }

        let elapsed = start.elapsed();
        info!(
            "Discovered endpoint {} via {:?} in {:?}",
            endpoint, source, elapsed
        );
        DiscoveryOutcome {
            endpoint,
            source,
            elapsed,
        }
    }
}
