//! Endpoint value type and the process-wide active endpoint handle
//!
//! An [`Endpoint`] is a scheme+host+port triple addressing one backend
//! candidate. Endpoints are immutable once constructed and compared through
//! their normalized base-URL form. [`ActiveEndpoint`] is the single shared
//! slot holding whichever endpoint discovery last verified.

use std::fmt;
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from parsing an endpoint out of a URL string
#[derive(Error, Debug)]
pub enum EndpointError {
    #[error("URL has no scheme: {0}")]
    MissingScheme(String),

    #[error("Unsupported scheme '{scheme}' in {url}")]
    UnsupportedScheme { scheme: String, url: String },

    #[error("URL has no host: {0}")]
    MissingHost(String),

    #[error("Invalid port in {0}")]
    InvalidPort(String),
}

/// An addressable base URL candidate
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Endpoint {
    scheme: String,
    host: String,
    port: u16,
}

impl Endpoint {
    /// Construct an http endpoint for a host and port
    pub fn http(host: impl Into<String>, port: u16) -> Self {
        Self {
            scheme: "http".to_string(),
            host: host.into(),
            port,
        }
    }

    /// Parse a base-URL string like `http://192.168.1.10:8000`.
    ///
    /// A missing port defaults to 80 for http and 443 for https. Any path,
    /// query, or trailing slash after the authority is rejected by ignoring
    /// everything past the first `/`.
    pub fn parse(url: &str) -> Result<Self, EndpointError> {
        let url = url.trim();
        let (scheme, rest) = url
            .split_once("://")
            .ok_or_else(|| EndpointError::MissingScheme(url.to_string()))?;

        let scheme = scheme.to_ascii_lowercase();
        if scheme != "http" && scheme != "https" {
            return Err(EndpointError::UnsupportedScheme {
                scheme,
                url: url.to_string(),
            });
        }

        let authority = rest.split('/').next().unwrap_or("");
        if authority.is_empty() {
            return Err(EndpointError::MissingHost(url.to_string()));
        }

        let (host, port) = match authority.rsplit_once(':') {
            Some((host, port_str)) => {
                let port: u16 = port_str
                    .parse()
                    .map_err(|_| EndpointError::InvalidPort(url.to_string()))?;
                (host, port)
            }
            None => {
                let default_port = if scheme == "https" { 443 } else { 80 };
                (authority, default_port)
            }
        };

        if host.is_empty() {
            return Err(EndpointError::MissingHost(url.to_string()));
        }

        Ok(Self {
            scheme,
            host: host.to_string(),
            port,
        })
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Normalized base-URL form, no trailing slash
    pub fn base_url(&self) -> String {
        format!("{}://{}:{}", self.scheme, self.host, self.port)
    }

    /// Join a path onto the base URL
    pub fn url_for(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url(), path)
        } else {
            format!("{}/{}", self.base_url(), path)
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.base_url())
    }
}

/// Shared handle to the one endpoint the process currently believes reachable.
///
/// Initialized to the static fallback and replaced only by the discovery
/// orchestrator's success path; every reader sees either the fallback or an
/// endpoint that answered a liveness probe when it was selected. Writes are
/// atomic replace-on-write, so no further locking discipline is needed.
#[derive(Debug, Clone)]
pub struct ActiveEndpoint {
    inner: Arc<RwLock<Endpoint>>,
}

impl ActiveEndpoint {
    pub fn new(fallback: Endpoint) -> Self {
        Self {
            inner: Arc::new(RwLock::new(fallback)),
        }
    }

    /// Snapshot of the current endpoint
    pub fn get(&self) -> Endpoint {
        self.inner
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Replace the active endpoint. Called only from the orchestrator.
    pub fn set(&self, endpoint: Endpoint) {
        let mut slot = self
            .inner
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *slot = endpoint;
    }
}
