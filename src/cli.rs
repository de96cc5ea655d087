use clap::{ArgAction, Parser};
use std::path::PathBuf;
use std::time::Duration;

use crate::discovery::DiscoveryConfig;

/// Static fallback used when discovery finds nothing. Always syntactically
/// valid so the request client never has to special-case "no endpoint".
pub const DEFAULT_FALLBACK_URL: &str = "http://localhost:8000";

#[derive(Parser, Debug)]
#[command(name = "apiscout")]
#[command(about = "Discover a reachable backend endpoint on the local network")]
#[command(version)]
pub struct Args {
    /// Enable verbose logging output (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Fallback base URL when discovery exhausts every stage
    #[arg(long, value_name = "URL", env = "APISCOUT_FALLBACK_URL", default_value = DEFAULT_FALLBACK_URL)]
    pub fallback_url: String,

    /// Developer-machine hint probed before every other candidate
    #[arg(long, value_name = "URL", env = "APISCOUT_DEV_HOST")]
    pub dev_host: Option<String>,

    /// Override the detected device class (web, android, ios, desktop)
    #[arg(long, value_name = "CLASS")]
    pub device_class: Option<String>,

    /// Backend port used for generated candidates
    #[arg(short, long, default_value = "8000")]
    pub port: u16,

    /// Path to the endpoint cache file (default: ~/.apiscout/endpoint.json)
    #[arg(long, value_name = "FILE")]
    pub cache_file: Option<PathBuf>,

    /// Skip the cache check stage and start discovery cold
    #[arg(long)]
    pub no_cache: bool,

    /// Drop the cached endpoint and exit
    #[arg(long)]
    pub clear_cache: bool,

    /// Timeout in milliseconds for brute-force scan probes
    #[arg(long, default_value = "250", value_name = "MS")]
    pub scan_timeout_ms: u64,

    /// Pause in milliseconds between scan batches
    #[arg(long, default_value = "50", value_name = "MS")]
    pub scan_pause_ms: u64,

    /// Path to a .env file with APISCOUT_* overrides
    #[arg(long, value_name = "FILE")]
    pub env_file: Option<PathBuf>,
}

impl Args {
    /// Discovery config with the CLI's scan-timing overrides applied
    pub fn discovery_config(&self) -> DiscoveryConfig {
        DiscoveryConfig {
            scan_probe_timeout: Duration::from_millis(self.scan_timeout_ms),
            scan_batch_pause: Duration::from_millis(self.scan_pause_ms),
            ..DiscoveryConfig::default()
        }
    }
}
