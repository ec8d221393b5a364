//! Apicurio Registry Client Library
//!
//! This crate provides an HTTP client for the Apicurio Registry REST API:
//! validated configuration, a connectivity check, raw request execution with
//! bearer authentication, and retry of transient failures with exponential
//! backoff.
//!
//! The client is `Clone + Send + Sync` and holds no mutable state, so one
//! instance can be shared freely between tasks.
//!
//! # Example
//!
//! ```rust,no_run
//! use registry_client::{ClientConfig, RegistryClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ClientConfig::new("https://registry.example.com")
//!         .with_auth_token("secret-token");
//!     let client = RegistryClient::new(config)?;
//!
//!     let status = client.check_connection().await?;
//!     println!("Registry reachable: HTTP {}", status.status_code);
//!
//!     let response = client.get("/apis/registry/v2/groups").await?;
//!     println!("{}", response.text());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod client;
pub mod config;
pub mod retry;
pub mod transport;

pub use client::{ConnectionStatus, RegistryClient};
pub use config::ClientConfig;
pub use reqwest::{header, Method};
pub use retry::RetryPolicy;
pub use transport::{RegistryRequest, RegistryResponse, ReqwestTransport, Transport};

/// Result type for registry client operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for registry client operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Missing or invalid client configuration
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Network-level failure (DNS, connect, connection reset)
    #[error("Connectivity error: {0}")]
    Connectivity(String),

    /// Request deadline exceeded
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Registry answered with a non-2xx status
    #[error("Server error ({status}): {body}")]
    Server {
        /// HTTP status code
        status: u16,
        /// Response body, lossily decoded as UTF-8
        body: String,
    },

    /// Caller supplied a request that cannot be sent
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Response body could not be decoded
    #[error("Decode error: {0}")]
    Decode(String),
}

impl Error {
    /// Check if this error is a transient failure that should be retried
    ///
    /// Connectivity errors, timeouts, 5xx and 429 responses are transient.
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Connectivity(_) | Error::Timeout(_) => true,
            Error::Server { status, .. } => *status == 429 || (500..600).contains(status),
            _ => false,
        }
    }

    /// Get the HTTP status code, if the registry produced one
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Server { status, .. } => Some(*status),
            _ => None,
        }
    }
}
