//! HTTP transport
//!
//! Requests and responses are described as plain data
//! ([`RegistryRequest`], [`RegistryResponse`]). The [`Transport`] trait is the
//! seam between the client and the network: [`ReqwestTransport`] is the
//! default, and callers may inject their own implementation (a proxying
//! transport, a recording transport in tests, ...).

use crate::config::ClientConfig;
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::{Client as ReqwestClient, Method};
use serde::de::DeserializeOwned;
use std::borrow::Cow;

/// An outbound request, fully composed by the client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryRequest {
    /// HTTP method
    pub method: Method,
    /// Absolute URL
    pub url: String,
    /// Request headers, authorization included
    pub headers: HeaderMap,
    /// Request body
    pub body: Option<Vec<u8>>,
}

/// A raw response from the registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryResponse {
    /// HTTP status code
    pub status: u16,
    /// Response headers
    pub headers: HeaderMap,
    /// Response body
    pub body: Vec<u8>,
}

impl RegistryResponse {
    /// Create a new response
    pub fn new(status: u16, headers: HeaderMap, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
        }
    }

    /// Check if the response is successful (2xx status)
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Get a header value as a string
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)?.to_str().ok()
    }

    /// Body decoded as UTF-8, lossily
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    /// Deserialize the body as JSON
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.body)
            .map_err(|e| Error::Decode(format!("Failed to parse JSON: {}", e)))
    }
}

/// Executes a single HTTP exchange
///
/// Implementations report network failures as [`Error::Connectivity`] and
/// deadline expiry as [`Error::Timeout`]. Any HTTP status, including 4xx and
/// 5xx, is a successful exchange and must be returned as a response; the
/// client decides what a status means.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send the request and return the raw response
    async fn send(&self, request: RegistryRequest) -> Result<RegistryResponse>;
}

/// Default transport backed by a pooled reqwest client
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: ReqwestClient,
}

impl ReqwestTransport {
    /// Build a transport with the timeouts and user agent from `config`
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = ReqwestClient::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| Error::Configuration(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    /// Wrap an already configured reqwest client
    pub fn from_client(client: ReqwestClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: RegistryRequest) -> Result<RegistryResponse> {
        let mut req = self
            .client
            .request(request.method, &request.url)
            .headers(request.headers);

        if let Some(body) = request.body {
            req = req.body(body);
        }

        let response = req.send().await.map_err(map_reqwest_error)?;

        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response.bytes().await.map_err(map_reqwest_error)?;

        Ok(RegistryResponse::new(status, headers, body.to_vec()))
    }
}

fn map_reqwest_error(err: reqwest::Error) -> Error {
    if err.is_timeout() {
        Error::Timeout(format!("Request timed out: {}", err))
    } else if err.is_builder() {
        Error::InvalidRequest(err.to_string())
    } else {
        Error::Connectivity(format!("Request failed: {}", err))
    }
}
