//! Concurrent batch probing with priority-ordered selection
//!
//! The engine launches every probe in a batch at once, waits for the whole
//! batch, and only then scans the results in candidate-list order. Joining
//! the batch before selecting is what makes priority a property of the input
//! ordering instead of network latency: a slow-but-preferred candidate can
//! never lose to a fast-but-worse one.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tracing::debug;

use super::probe::Prober;
use crate::endpoint::Endpoint;

/// Runs probe batches against a prober
pub struct ProbeEngine {
    prober: Arc<dyn Prober>,
}

impl ProbeEngine {
    pub fn new(prober: Arc<dyn Prober>) -> Self {
        Self { prober }
    }

    /// Probe every candidate concurrently, join the whole batch, then return
    /// the first reachable candidate in list order. None when the batch is
    /// empty or nothing answered.
    pub async fn evaluate_batch(
        &self,
        candidates: &[Endpoint],
        timeout: Duration,
    ) -> Option<Endpoint> {
        if candidates.is_empty() {
            return None;
        }

        let probes = candidates
            .iter()
            .map(|endpoint| self.prober.probe(endpoint, timeout));

        let results = join_all(probes).await;

        let winner = results.iter().find(|r| r.reachable).map(|r| {
            debug!("Batch of {}: selected {}", candidates.len(), r.endpoint);
            r.endpoint.clone()
        });

        if winner.is_none() {
            debug!("Batch of {}: no candidate reachable", candidates.len());
        }
        winner
    }
}
