//! End-to-end tests against thin HTTP servers
//!
//! These stand up real axum servers on ephemeral ports and drive the full
//! discovery pipeline and the retrying client against them.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use reqwest::header::HeaderMap;
use reqwest::Method;
use serde_json::{json, Value};

use apiscout::cache::EndpointCache;
use apiscout::client::{ApiClient, MemoryTokenStore, RequestConfig, RequestError};
use apiscout::device::DeviceClass;
use apiscout::discovery::{
    DefaultCandidates, Discovery, DiscoveryConfig, DiscoverySource, HttpProber,
};
use apiscout::endpoint::{ActiveEndpoint, Endpoint};
use apiscout::store::FileStore;

#[derive(Clone)]
struct ServerState {
    health_hits: Arc<AtomicUsize>,
}

async fn health_handler(State(state): State<ServerState>) -> Json<Value> {
    state.health_hits.fetch_add(1, Ordering::SeqCst);
    Json(json!({"status": "healthy", "service": "test backend"}))
}

async fn missing_handler(State(state): State<ServerState>) -> (StatusCode, Json<Value>) {
    state.health_hits.fetch_add(1, Ordering::SeqCst);
    (StatusCode::NOT_FOUND, Json(json!({"detail": "not here"})))
}

/// Spawn a backend double serving /health, returning its port and hit counter
async fn spawn_backend() -> (u16, Arc<AtomicUsize>) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test server");
    let port = listener.local_addr().expect("Failed to get local address").port();

    let hits = Arc::new(AtomicUsize::new(0));
    let state = ServerState {
        health_hits: hits.clone(),
    };
    let app = Router::new()
        .route("/health", get(health_handler))
        .route("/missing", get(missing_handler))
        .with_state(state);

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Test server failed");
    });

    (port, hits)
}

fn fast_discovery(
    port: u16,
    cache: EndpointCache,
    active: ActiveEndpoint,
) -> Discovery {
    let candidates =
        DefaultCandidates::new(port).with_dev_hint(Some(Endpoint::http("127.0.0.1", port)));
    Discovery::new(
        Arc::new(HttpProber::default()),
        Arc::new(candidates),
        cache,
        active,
        DiscoveryConfig::default(),
    )
}

#[tokio::test]
async fn discovery_finds_live_server_and_writes_cache() {
    let (port, _) = spawn_backend().await;
    let dir = tempfile::tempdir().unwrap();
    let cache_path = dir.path().join("endpoint.json");

    let active = ActiveEndpoint::new(Endpoint::http("10.255.255.1", port));
    let cache = EndpointCache::new(Arc::new(FileStore::new(&cache_path)));
    let discovery = fast_discovery(port, cache, active.clone());

    let outcome = discovery.run(DeviceClass::Desktop).await;

    let expected = Endpoint::http("127.0.0.1", port);
    assert_eq!(outcome.source, DiscoverySource::DeviceSpecific);
    assert_eq!(outcome.endpoint, expected);
    assert_eq!(active.get(), expected);

    // Write-through cache landed on disk
    let cached = EndpointCache::new(Arc::new(FileStore::new(&cache_path)));
    assert_eq!(cached.get(), Some(expected));
}

#[tokio::test]
async fn second_run_short_circuits_on_cache() {
    let (port, _) = spawn_backend().await;
    let dir = tempfile::tempdir().unwrap();
    let cache_path = dir.path().join("endpoint.json");

    let active = ActiveEndpoint::new(Endpoint::http("10.255.255.1", port));
    let first = fast_discovery(
        port,
        EndpointCache::new(Arc::new(FileStore::new(&cache_path))),
        active.clone(),
    );
    assert!(first.run(DeviceClass::Desktop).await.found());

    // Fresh orchestrator over the same cache file, as on an app restart
    let second = fast_discovery(
        port,
        EndpointCache::new(Arc::new(FileStore::new(&cache_path))),
        active.clone(),
    );
    let outcome = second.run(DeviceClass::Desktop).await;
    assert_eq!(outcome.source, DiscoverySource::Cache);
    assert_eq!(active.get(), Endpoint::http("127.0.0.1", port));
}

#[tokio::test]
async fn client_reaches_discovered_endpoint() {
    let (port, hits) = spawn_backend().await;

    let active = ActiveEndpoint::new(Endpoint::http("127.0.0.1", port));
    let client = ApiClient::new(
        active,
        Arc::new(MemoryTokenStore::new()),
        RequestConfig::default(),
    );

    let response = client
        .request(Method::GET, "/health", HeaderMap::new(), None)
        .await
        .expect("health request failed");
    assert!(response.status().is_success());

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "healthy");
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn transport_failure_retries_exactly_budget_then_surfaces() {
    // A listener that accepts and never answers: every attempt burns the
    // client timeout, and the accept count is the attempt count.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let accepts = Arc::new(AtomicUsize::new(0));

    let accept_counter = accepts.clone();
    tokio::spawn(async move {
        let mut held = Vec::new();
        loop {
            if let Ok((socket, _)) = listener.accept().await {
                accept_counter.fetch_add(1, Ordering::SeqCst);
                held.push(socket);
            }
        }
    });

    let active = ActiveEndpoint::new(Endpoint::http("127.0.0.1", port));
    let client = ApiClient::new(
        active,
        Arc::new(MemoryTokenStore::new()),
        RequestConfig {
            timeout: Duration::from_millis(200),
            max_retries: 3,
            retry_delay: Duration::from_millis(20),
        },
    );

    let err = client
        .request(Method::GET, "/health", HeaderMap::new(), None)
        .await
        .unwrap_err();

    match err {
        RequestError::Transport { attempts, .. } => assert_eq!(attempts, 4),
        other => panic!("expected transport error, got {:?}", other),
    }
    assert_eq!(accepts.load(Ordering::SeqCst), 4);
}

#[tokio::test]
async fn non_success_status_returns_immediately_without_retry() {
    let (port, hits) = spawn_backend().await;

    let active = ActiveEndpoint::new(Endpoint::http("127.0.0.1", port));
    let client = ApiClient::new(
        active,
        Arc::new(MemoryTokenStore::new()),
        RequestConfig {
            timeout: Duration::from_secs(2),
            max_retries: 3,
            retry_delay: Duration::from_millis(20),
        },
    );

    let response = client
        .request(Method::GET, "/missing", HeaderMap::new(), None)
        .await
        .expect("a 404 is a response, not a transport error");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}
