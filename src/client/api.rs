//! Resilient request client
//!
//! Every application call goes through [`ApiClient::request`], which builds
//! the URL from the active endpoint at call time and retries transport
//! failures in a bounded loop. Non-2xx responses are returned as-is: "could
//! not reach the server" and "server rejected the request" are different
//! things and only the first is retried.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use reqwest::header::HeaderMap;
use reqwest::{Client, Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::time::sleep;
use tracing::{debug, warn};
use uuid::Uuid;

use super::records::{
    Attachment, Category, Complaint, ComplaintDraft, LoginRequest, RecordError, RegisterRequest,
    TokenResponse, UserProfile,
};
use crate::endpoint::ActiveEndpoint;

/// Retry and timeout policy for application requests
#[derive(Debug, Clone)]
pub struct RequestConfig {
    /// Overall timeout for one attempt
    pub timeout: Duration,
    /// Retries after the first attempt, transport failures only
    pub max_retries: u32,
    /// Fixed delay between attempts
    pub retry_delay: Duration,
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            max_retries: 3,
            retry_delay: Duration::from_millis(750),
        }
    }
}

/// Errors surfaced by the request client
#[derive(thiserror::Error, Debug)]
pub enum RequestError {
    #[error("Transport failure after {attempts} attempt(s): {source}")]
    Transport {
        attempts: u32,
        #[source]
        source: reqwest::Error,
    },

    #[error("API error: {status} - {message}")]
    Api { status: StatusCode, message: String },

    #[error("Failed to decode response body: {0}")]
    Decode(String),

    #[error("Malformed record in response: {0}")]
    Record(#[from] RecordError),
}

/// Bearer-token seam; session storage lives outside this subsystem
pub trait TokenProvider: Send + Sync {
    fn token(&self) -> Option<String>;
}

/// In-process token holder, enough for the CLI and for tests
#[derive(Default)]
pub struct MemoryTokenStore {
    token: RwLock<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, token: impl Into<String>) {
        *self.token.write().unwrap_or_else(|p| p.into_inner()) = Some(token.into());
    }

    pub fn clear(&self) {
        *self.token.write().unwrap_or_else(|p| p.into_inner()) = None;
    }
}

impl TokenProvider for MemoryTokenStore {
    fn token(&self) -> Option<String> {
        self.token
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .clone()
    }
}

/// HTTP client bound to the discovered endpoint
pub struct ApiClient {
    client: Client,
    active: ActiveEndpoint,
    tokens: Arc<dyn TokenProvider>,
    config: RequestConfig,
}

impl ApiClient {
    pub fn new(
        active: ActiveEndpoint,
        tokens: Arc<dyn TokenProvider>,
        config: RequestConfig,
    ) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .expect("Failed to create HTTP client");
        Self {
            client,
            active,
            tokens,
            config,
        }
    }

    /// Issue one application request with bounded retry.
    ///
    /// Transport failures (connect, timeout, reset) are retried up to
    /// `max_retries` times with a fixed delay; the final failure is surfaced
    /// with the total attempt count. A response of any status, 2xx or not,
    /// ends the loop immediately and is handed back to the caller.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        headers: HeaderMap,
        body: Option<&Value>,
    ) -> Result<Response, RequestError> {
        let url = self.active.get().url_for(path);
        let request_id = Uuid::new_v4();
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;

            let mut req = self
                .client
                .request(method.clone(), &url)
                .headers(headers.clone());
            if let Some(token) = self.tokens.token() {
                req = req.bearer_auth(token);
            }
            if let Some(body) = body {
                req = req.json(body);
            }

            debug!(
                "[{}] {} {} (attempt {}/{})",
                request_id,
                method,
                url,
                attempt,
                self.config.max_retries + 1
            );

            match req.send().await {
                Ok(response) => return Ok(response),
                Err(e) => {
                    if attempt > self.config.max_retries {
                        warn!(
                            "[{}] {} {} failed after {} attempt(s): {}",
                            request_id, method, url, attempt, e
                        );
                        return Err(RequestError::Transport {
                            attempts: attempt,
                            source: e,
                        });
                    }
                    warn!(
                        "[{}] {} {} transport failure (attempt {}): {}, retrying in {:?}",
                        request_id, method, url, attempt, e, self.config.retry_delay
                    );
                    sleep(self.config.retry_delay).await;
                }
            }
        }
    }

    /// Request expecting a 2xx JSON body; non-2xx becomes [`RequestError::Api`]
    async fn request_json<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<T, RequestError> {
        let response = self.request(method, path, HeaderMap::new(), body).await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(RequestError::Api { status, message });
        }

        response
            .json()
            .await
            .map_err(|e| RequestError::Decode(e.to_string()))
    }

    async fn get_value(&self, path: &str) -> Result<Value, RequestError> {
        self.request_json(Method::GET, path, None).await
    }

    // ------------------------------------------------------------------
    // Auth
    // ------------------------------------------------------------------

    pub async fn register(&self, req: &RegisterRequest) -> Result<TokenResponse, RequestError> {
        let body = serde_json::to_value(req).map_err(|e| RequestError::Decode(e.to_string()))?;
        self.request_json(Method::POST, "/auth/register", Some(&body))
            .await
    }

    pub async fn login(&self, req: &LoginRequest) -> Result<TokenResponse, RequestError> {
        let body = serde_json::to_value(req).map_err(|e| RequestError::Decode(e.to_string()))?;
        self.request_json(Method::POST, "/auth/login", Some(&body))
            .await
    }

    pub async fn profile(&self) -> Result<UserProfile, RequestError> {
        self.request_json(Method::GET, "/auth/profile", None).await
    }

    // ------------------------------------------------------------------
    // Categories and complaints
    // ------------------------------------------------------------------

    pub async fn categories(&self) -> Result<Vec<Category>, RequestError> {
        let value = self.get_value("/categories").await?;
        let items = value
            .as_array()
            .ok_or(RecordError::NotAnObject("Category list"))?;
        items
            .iter()
            .map(Category::from_value)
            .collect::<Result<_, _>>()
            .map_err(RequestError::from)
    }

    pub async fn complaints(&self) -> Result<Vec<Complaint>, RequestError> {
        let value = self.get_value("/complaints").await?;
        Ok(Complaint::list_from_value(&value)?)
    }

    pub async fn complaint(&self, id: &str) -> Result<Complaint, RequestError> {
        let value = self.get_value(&format!("/complaints/{}", id)).await?;
        Ok(Complaint::from_value(&value)?)
    }

    pub async fn create_complaint(&self, draft: &ComplaintDraft) -> Result<Complaint, RequestError> {
        let body = serde_json::to_value(draft).map_err(|e| RequestError::Decode(e.to_string()))?;
        let value: Value = self
            .request_json(Method::POST, "/complaints", Some(&body))
            .await?;
        Ok(Complaint::from_value(&value)?)
    }

    pub async fn update_complaint(
        &self,
        id: &str,
        draft: &ComplaintDraft,
    ) -> Result<Complaint, RequestError> {
        let body = serde_json::to_value(draft).map_err(|e| RequestError::Decode(e.to_string()))?;
        let value: Value = self
            .request_json(Method::PUT, &format!("/complaints/{}", id), Some(&body))
            .await?;
        Ok(Complaint::from_value(&value)?)
    }

    pub async fn attachments(&self, complaint_id: &str) -> Result<Vec<Attachment>, RequestError> {
        let value = self
            .get_value(&format!("/complaints/{}/attachments", complaint_id))
            .await?;
        Ok(Attachment::list_from_value(&value)?)
    }

    pub async fn delete_complaint(&self, id: &str) -> Result<(), RequestError> {
        let response = self
            .request(
                Method::DELETE,
                &format!("/complaints/{}", id),
                HeaderMap::new(),
                None,
            )
            .await?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let message = response.text().await.unwrap_or_default();
            Err(RequestError::Api { status, message })
        }
    }
}
