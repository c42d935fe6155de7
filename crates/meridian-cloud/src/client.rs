//! HTTP client for the Meridian Cloud REST API
//!
//! [`CloudClient`] owns the connection pool, credentials, and transport
//! retry policy. It is cheap to clone and safe to share across tasks.
//! Per-resource handlers ([`crate::DatabaseHandler`], etc.) borrow a clone
//! of the client and add the typed endpoint surface on top.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Method;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;

use crate::backups::BackupHandler;
use crate::clusters::ClusterHandler;
use crate::databases::DatabaseHandler;
use crate::error::{ApiError, Result};
use crate::retry::RetryConfig;
use crate::work_requests::WorkRequestHandler;

/// Header carrying the server-assigned id of the request itself
pub const REQUEST_ID_HEADER: &str = "x-meridian-request-id";

/// Header carrying the id of the work request spawned by an asynchronous
/// mutation, when the endpoint tracks the change through one
pub const WORK_REQUEST_ID_HEADER: &str = "x-meridian-work-request-id";

const API_KEY_HEADER: &str = "x-api-key";
const API_SECRET_HEADER: &str = "x-api-secret-key";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Client for the Meridian Cloud database management API
#[derive(Debug, Clone)]
pub struct CloudClient {
    inner: Arc<ClientInner>,
}

#[derive(Debug)]
struct ClientInner {
    http: reqwest::Client,
    base_url: Url,
    headers: HeaderMap,
    retry: RetryConfig,
}

/// A decoded response from a mutating call
///
/// Mutations carry metadata in headers that fetches do not need: the
/// request id, and for asynchronously tracked endpoints the work request id.
#[derive(Debug, Clone)]
pub struct ApiResponse<T> {
    /// The decoded response body
    pub body: T,
    /// Server-assigned request id, if present
    pub request_id: Option<String>,
    /// Work request spawned by this mutation, if the endpoint tracks one
    pub work_request_id: Option<String>,
}

impl CloudClient {
    /// Creates a new builder
    pub fn builder() -> CloudClientBuilder {
        CloudClientBuilder::default()
    }

    /// Handler for database resources
    pub fn databases(&self) -> DatabaseHandler {
        DatabaseHandler::new(self.clone())
    }

    /// Handler for cluster resources
    pub fn clusters(&self) -> ClusterHandler {
        ClusterHandler::new(self.clone())
    }

    /// Handler for backup resources
    pub fn backups(&self) -> BackupHandler {
        BackupHandler::new(self.clone())
    }

    /// Handler for work requests
    pub fn work_requests(&self) -> WorkRequestHandler {
        WorkRequestHandler::new(self.clone())
    }

    /// The configured API endpoint
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// GET a resource and decode its body
    pub(crate) async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let raw = self.execute(Method::GET, path, None).await?;
        decode(&raw)
    }

    /// POST a mutation and decode its body
    pub(crate) async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<ApiResponse<T>> {
        let raw = self.execute(Method::POST, path, Some(to_body(body)?)).await?;
        Ok(ApiResponse {
            body: decode(&raw)?,
            request_id: raw.header(REQUEST_ID_HEADER),
            work_request_id: raw.header(WORK_REQUEST_ID_HEADER),
        })
    }

    /// POST a mutation whose response has no meaningful body (202/204)
    pub(crate) async fn post_no_content<B: Serialize>(
        &self,
        path: &str,
        body: Option<&B>,
    ) -> Result<ApiResponse<()>> {
        let payload = body.map(to_body).transpose()?;
        let raw = self.execute(Method::POST, path, payload).await?;
        Ok(ApiResponse {
            body: (),
            request_id: raw.header(REQUEST_ID_HEADER),
            work_request_id: raw.header(WORK_REQUEST_ID_HEADER),
        })
    }

    /// PUT a mutation and decode its body
    pub(crate) async fn put<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<ApiResponse<T>> {
        let raw = self.execute(Method::PUT, path, Some(to_body(body)?)).await?;
        Ok(ApiResponse {
            body: decode(&raw)?,
            request_id: raw.header(REQUEST_ID_HEADER),
            work_request_id: raw.header(WORK_REQUEST_ID_HEADER),
        })
    }

    /// DELETE a resource; the response body, if any, is discarded
    pub(crate) async fn delete(&self, path: &str) -> Result<ApiResponse<()>> {
        let raw = self.execute(Method::DELETE, path, None).await?;
        Ok(ApiResponse {
            body: (),
            request_id: raw.header(REQUEST_ID_HEADER),
            work_request_id: raw.header(WORK_REQUEST_ID_HEADER),
        })
    }

    /// Send one request, retrying transient failures per the retry config.
    ///
    /// Only errors classified retryable by [`ApiError::is_retryable`] are
    /// retried; everything else surfaces on the first attempt.
    async fn execute(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<RawResponse> {
        let url = self
            .inner
            .base_url
            .join(path)
            .map_err(|e| ApiError::Configuration(format!("invalid request path {path:?}: {e}")))?;

        let mut attempt: u32 = 0;
        loop {
            let outcome = self.send(method.clone(), url.clone(), body.as_ref()).await;
            match outcome {
                Ok(raw) => return Ok(raw),
                Err(err) => {
                    attempt += 1;
                    match self.inner.retry.delay_for_attempt(attempt) {
                        Some(delay) if err.is_retryable() => {
                            tracing::debug!(
                                %method,
                                %url,
                                attempt,
                                ?delay,
                                error = %err,
                                "retrying transient transport failure"
                            );
                            tokio::time::sleep(delay).await;
                        }
                        _ => return Err(err),
                    }
                }
            }
        }
    }

    async fn send(
        &self,
        method: Method,
        url: Url,
        body: Option<&serde_json::Value>,
    ) -> Result<RawResponse> {
        tracing::trace!(%method, %url, "sending request");

        let mut request = self
            .inner
            .http
            .request(method, url)
            .headers(self.inner.headers.clone());
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.text().await?;

        if status.is_success() {
            Ok(RawResponse { headers, body })
        } else {
            Err(ApiError::from_status(status, &body))
        }
    }
}

struct RawResponse {
    headers: HeaderMap,
    body: String,
}

impl RawResponse {
    fn header(&self, name: &str) -> Option<String> {
        self.headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(String::from)
    }
}

fn to_body<B: Serialize>(body: &B) -> Result<serde_json::Value> {
    serde_json::to_value(body).map_err(|e| ApiError::Serialization(e.to_string()))
}

fn decode<T: DeserializeOwned>(raw: &RawResponse) -> Result<T> {
    serde_json::from_str(&raw.body).map_err(|e| ApiError::Deserialization {
        message: e.to_string(),
        body: raw.body.clone(),
    })
}

/// Builder for [`CloudClient`]
#[derive(Default)]
pub struct CloudClientBuilder {
    base_url: Option<String>,
    api_key: Option<String>,
    api_secret: Option<String>,
    timeout: Option<Duration>,
    retry: Option<RetryConfig>,
}

impl CloudClientBuilder {
    /// Set the API endpoint, e.g. `https://api.meridian.dev`
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the account API key
    #[must_use]
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set the account API secret
    #[must_use]
    pub fn api_secret(mut self, secret: impl Into<String>) -> Self {
        self.api_secret = Some(secret.into());
        self
    }

    /// Set the per-request timeout (default 30 s)
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the transport retry policy (default: 3 attempts, exponential)
    #[must_use]
    pub fn retry(mut self, retry: RetryConfig) -> Self {
        self.retry = Some(retry);
        self
    }

    /// Build the client
    pub fn build(self) -> Result<CloudClient> {
        let base_url = self
            .base_url
            .ok_or_else(|| ApiError::Configuration("base_url is required".into()))?;
        let base_url = Url::parse(&base_url)
            .map_err(|e| ApiError::Configuration(format!("invalid base_url: {e}")))?;

        let mut headers = HeaderMap::new();
        if let Some(key) = &self.api_key {
            headers.insert(
                HeaderName::from_static(API_KEY_HEADER),
                header_value(key, "api_key")?,
            );
        }
        if let Some(secret) = &self.api_secret {
            headers.insert(
                HeaderName::from_static(API_SECRET_HEADER),
                header_value(secret, "api_secret")?,
            );
        }

        let http = reqwest::Client::builder()
            .timeout(self.timeout.unwrap_or(DEFAULT_TIMEOUT))
            .build()
            .map_err(ApiError::Network)?;

        Ok(CloudClient {
            inner: Arc::new(ClientInner {
                http,
                base_url,
                headers,
                retry: self.retry.unwrap_or_default(),
            }),
        })
    }
}

fn header_value(value: &str, what: &str) -> Result<HeaderValue> {
    let mut value = HeaderValue::from_str(value)
        .map_err(|_| ApiError::Configuration(format!("{what} contains invalid characters")))?;
    value.set_sensitive(true);
    Ok(value)
}
