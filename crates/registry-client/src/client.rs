//! Registry client implementation
//!
//! [`RegistryClient`] composes requests against the configured base URL,
//! attaches the bearer token, sends them through a [`Transport`] and retries
//! transient failures according to the configured [`RetryPolicy`].
//!
//! [`RetryPolicy`]: crate::RetryPolicy

use crate::config::ClientConfig;
use crate::retry::{self, AttemptError};
use crate::transport::{RegistryRequest, RegistryResponse, ReqwestTransport, Transport};
use crate::{Error, Result};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Result of a successful connection check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionStatus {
    /// HTTP status code of the health endpoint
    pub status_code: u16,
    /// Health state reported by the registry (e.g. "UP"), when the body is JSON
    pub health: Option<String>,
    /// Attempts used, including the successful one
    pub attempts: u32,
    /// Round-trip time of the successful attempt
    pub latency: Duration,
}

#[derive(Deserialize)]
struct HealthBody {
    status: String,
}

/// Client for the Apicurio Registry REST API
///
/// Cloning is cheap; clones share the transport. All state is read-only
/// after construction, so a client can be used from many tasks at once.
///
/// # Examples
/// ```
/// use registry_client::{ClientConfig, Error, RegistryClient};
///
/// let err = RegistryClient::new(ClientConfig::new("")).unwrap_err();
/// assert!(matches!(err, Error::Configuration(_)));
///
/// let client = RegistryClient::new(ClientConfig::new("http://localhost:8080/")).unwrap();
/// assert_eq!(client.base_url(), "http://localhost:8080");
/// ```
#[derive(Clone)]
pub struct RegistryClient {
    /// Validated configuration
    config: ClientConfig,
    /// Default headers, parsed once at construction
    default_headers: HeaderMap,
    /// HTTP transport
    transport: Arc<dyn Transport>,
}

impl std::fmt::Debug for RegistryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl RegistryClient {
    /// Create a client using the default reqwest transport
    ///
    /// Fails with [`Error::Configuration`] if the base URL is missing or
    /// malformed, or any other setting is invalid.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let config = config.validated()?;
        let transport = ReqwestTransport::new(&config)?;
        Self::with_transport(config, Arc::new(transport))
    }

    /// Create a client that sends requests through `transport`
    ///
    /// Timeouts and user agent in the config are not applied to a custom
    /// transport; it owns those concerns.
    pub fn with_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        let config = config.validated()?;
        let default_headers = config.default_header_map()?;
        Ok(Self {
            config,
            default_headers,
            transport,
        })
    }

    /// Get the client configuration
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Get the normalized base URL
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Check that the registry is reachable and healthy
    ///
    /// Issues `GET {base_url}{health_path}`, retrying transient failures.
    /// A non-2xx answer is reported as [`Error::Server`].
    pub async fn check_connection(&self) -> Result<ConnectionStatus> {
        let (response, attempts, latency) = self
            .execute(Method::GET, &self.config.health_path, HeaderMap::new(), None)
            .await?;

        let health = response
            .json::<HealthBody>()
            .ok()
            .map(|body| body.status);

        tracing::debug!(status = response.status, ?health, attempts, "Registry connection ok");

        Ok(ConnectionStatus {
            status_code: response.status,
            health,
            attempts,
            latency,
        })
    }

    /// Send a request to `path` relative to the base URL
    ///
    /// Default headers are applied first, then `headers`, then the bearer
    /// token when one is configured. Transient failures are retried. Returns
    /// the raw response on 2xx, [`Error::Server`] otherwise.
    pub async fn do_request(
        &self,
        method: Method,
        path: &str,
        headers: HeaderMap,
        body: Option<Vec<u8>>,
    ) -> Result<RegistryResponse> {
        let (response, _, _) = self.execute(method, path, headers, body).await?;
        Ok(response)
    }

    /// Send a GET request
    pub async fn get(&self, path: &str) -> Result<RegistryResponse> {
        self.do_request(Method::GET, path, HeaderMap::new(), None).await
    }

    /// Send a POST request with a JSON body
    pub async fn post_json<T: Serialize + ?Sized>(
        &self,
        path: &str,
        value: &T,
    ) -> Result<RegistryResponse> {
        let body = serde_json::to_vec(value)
            .map_err(|e| Error::InvalidRequest(format!("Failed to serialize body: {}", e)))?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        self.do_request(Method::POST, path, headers, Some(body)).await
    }

    /// Compose the absolute URL for `path`
    pub fn url_for(&self, path: &str) -> String {
        let path = path.trim_start_matches('/');
        if path.is_empty() {
            self.config.base_url.clone()
        } else {
            format!("{}/{}", self.config.base_url, path)
        }
    }

    fn build_request(
        &self,
        method: Method,
        path: &str,
        headers: HeaderMap,
        body: Option<Vec<u8>>,
    ) -> Result<RegistryRequest> {
        let mut all_headers = self.default_headers.clone();

        let mut last_name: Option<HeaderName> = None;
        for (name, value) in headers {
            // HeaderMap yields `None` names for repeated values of the same header
            let name = match name {
                Some(name) => {
                    all_headers.remove(&name);
                    last_name = Some(name.clone());
                    name
                }
                None => match &last_name {
                    Some(name) => name.clone(),
                    None => continue,
                },
            };
            all_headers.append(name, value);
        }

        if let Some(token) = &self.config.auth_token {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|_| Error::InvalidRequest("auth token is not a valid header".to_string()))?;
            value.set_sensitive(true);
            all_headers.insert(AUTHORIZATION, value);
        }

        Ok(RegistryRequest {
            method,
            url: self.url_for(path),
            headers: all_headers,
            body,
        })
    }

    /// Run the request through the retry loop
    ///
    /// Returns the response, the number of attempts, and the latency of the
    /// final attempt.
    async fn execute(
        &self,
        method: Method,
        path: &str,
        headers: HeaderMap,
        body: Option<Vec<u8>>,
    ) -> Result<(RegistryResponse, u32, Duration)> {
        let request = self.build_request(method, path, headers, body)?;

        retry::retry(&self.config.retry, |attempt| {
            let request = request.clone();
            async move {
                tracing::debug!(method = %request.method, url = %request.url, attempt, "Sending registry request");

                let started = Instant::now();
                let response = self.transport.send(request).await.map_err(AttemptError::from)?;
                let latency = started.elapsed();

                if response.is_success() {
                    tracing::debug!(
                        status = response.status,
                        latency_ms = latency.as_millis() as u64,
                        "Registry request succeeded"
                    );
                    return Ok((response, attempt, latency));
                }

                // Only rate limiting and maintenance answers dictate the delay
                let retry_after = match response.status {
                    429 | 503 => retry::retry_after(&response.headers),
                    _ => None,
                };
                Err(AttemptError {
                    retry_after,
                    error: Error::Server {
                        status: response.status,
                        body: response.text().into_owned(),
                    },
                })
            }
        })
        .await
    }
}
