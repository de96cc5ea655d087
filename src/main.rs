use std::process;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use reqwest::{header::HeaderMap, Method};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use apiscout::cache::EndpointCache;
use apiscout::cli::Args;
use apiscout::client::{ApiClient, HealthStatus, MemoryTokenStore, RequestConfig};
use apiscout::device::DeviceClass;
use apiscout::discovery::{DefaultCandidates, Discovery, HttpProber};
use apiscout::endpoint::{ActiveEndpoint, Endpoint};
use apiscout::store::{default_store_path, FileStore};

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Initialize logging
    let filter = match args.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .init();

    // Load .env file if specified
    if let Some(ref env_file) = args.env_file {
        if let Err(e) = dotenvy::from_path(env_file) {
            error!("Failed to load env file {}: {}", env_file.display(), e);
            process::exit(1);
        }
    }

    let fallback = match Endpoint::parse(&args.fallback_url) {
        Ok(ep) => ep,
        Err(e) => {
            error!("Invalid fallback URL {}: {}", args.fallback_url, e);
            process::exit(1);
        }
    };

    let dev_hint = match args.dev_host.as_deref().map(Endpoint::parse).transpose() {
        Ok(hint) => hint,
        Err(e) => {
            error!("Invalid dev host hint: {}", e);
            process::exit(1);
        }
    };

    let device_class = match args.device_class.as_deref() {
        Some(s) => match s.parse() {
            Ok(class) => class,
            Err(e) => {
                error!("{}", e);
                process::exit(1);
            }
        },
        None => DeviceClass::detect(),
    };

    let store = Arc::new(FileStore::new(
        args.cache_file.clone().unwrap_or_else(default_store_path),
    ));
    let mut cache = EndpointCache::new(store);
    if args.no_cache {
        // Zero window means every entry reads as expired; writes still go
        // through so the next cold start benefits.
        cache = cache.with_validity_window(Duration::ZERO);
    }

    if args.clear_cache {
        cache.clear();
        info!("Endpoint cache cleared");
        return;
    }

    let active = ActiveEndpoint::new(fallback);
    let discovery = Discovery::new(
        Arc::new(HttpProber::default()),
        Arc::new(DefaultCandidates::new(args.port).with_dev_hint(dev_hint)),
        cache,
        active.clone(),
        args.discovery_config(),
    );

    let outcome = discovery.run(device_class).await;

    if outcome.found() {
        println!(
            "Backend endpoint: {} (via {:?}, {}ms)",
            outcome.endpoint,
            outcome.source,
            outcome.elapsed.as_millis()
        );
    } else {
        println!(
            "No backend found in {}ms, using fallback {}",
            outcome.elapsed.as_millis(),
            outcome.endpoint
        );
    }

    // One real request through the client, as a connectivity smoke check
    let client = ApiClient::new(
        active,
        Arc::new(MemoryTokenStore::new()),
        RequestConfig::default(),
    );
    match client
        .request(Method::GET, "/health", HeaderMap::new(), None)
        .await
    {
        Ok(response) if response.status().is_success() => {
            match response.json::<HealthStatus>().await {
                Ok(health) => println!("Server reports: {} ({})", health.status, health.service),
                Err(_) => println!("Server is up (no health body)"),
            }
        }
        Ok(response) => {
            warn!("Health endpoint answered {}", response.status());
        }
        Err(e) => {
            warn!("Health request failed: {}", e);
        }
    }
}
