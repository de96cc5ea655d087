pub mod candidates;
pub mod engine;
pub mod orchestrator;
pub mod probe;

pub use candidates::{CandidateSource, DefaultCandidates, ScanRange, DEFAULT_BATCH_SIZE, DEFAULT_PORT};
pub use engine::ProbeEngine;
pub use orchestrator::{Discovery, DiscoveryConfig, DiscoveryOutcome, DiscoverySource};
pub use probe::{HttpProber, ProbeResult, Prober, HEALTH_PATH};
