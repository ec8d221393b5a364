//! Client configuration
//!
//! [`ClientConfig`] holds everything a [`RegistryClient`](crate::RegistryClient)
//! needs: the registry base URL, an optional bearer token, transport timeouts
//! and the retry policy. Configuration is validated once, when the client is
//! constructed, and is immutable afterwards.

use crate::retry::RetryPolicy;
use crate::{Error, Result};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Url;
use std::collections::HashMap;
use std::time::Duration;

/// Environment variable holding the registry base URL
pub const ENV_REGISTRY_URL: &str = "APICURIO_REGISTRY_URL";

/// Environment variable holding the bearer token
pub const ENV_AUTH_TOKEN: &str = "APICURIO_AUTH_TOKEN";

/// Configuration for the registry client
#[derive(Clone)]
pub struct ClientConfig {
    /// Base registry URL (e.g., "https://registry.example.com")
    pub base_url: String,
    /// Bearer token sent as `Authorization: Bearer <token>`
    pub auth_token: Option<String>,
    /// Whole-request timeout for the default transport
    pub timeout: Duration,
    /// Connect timeout for the default transport
    pub connect_timeout: Duration,
    /// User agent string
    pub user_agent: String,
    /// Custom headers to include in all requests
    pub default_headers: HashMap<String, String>,
    /// Path probed by `check_connection`
    pub health_path: String,
    /// Retry policy for transient failures
    pub retry: RetryPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            auth_token: None,
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            user_agent: format!("apicurio-registry-client/{}", env!("CARGO_PKG_VERSION")),
            default_headers: HashMap::new(),
            health_path: "/health/ready".to_string(),
            retry: RetryPolicy::default(),
        }
    }
}

// The token must never end up in logs.
impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("auth_token", &self.auth_token.as_ref().map(|_| "<redacted>"))
            .field("timeout", &self.timeout)
            .field("connect_timeout", &self.connect_timeout)
            .field("user_agent", &self.user_agent)
            .field("default_headers", &self.default_headers)
            .field("health_path", &self.health_path)
            .field("retry", &self.retry)
            .finish()
    }
}

impl ClientConfig {
    /// Create a new config with a base URL
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Build a config from `APICURIO_REGISTRY_URL` and `APICURIO_AUTH_TOKEN`
    ///
    /// Fails with [`Error::Configuration`] when the URL variable is unset.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let base_url = lookup(ENV_REGISTRY_URL)
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| Error::Configuration(format!("{} is not set", ENV_REGISTRY_URL)))?;

        let mut config = Self::new(base_url);
        config.auth_token = lookup(ENV_AUTH_TOKEN).filter(|token| !token.is_empty());
        Ok(config)
    }

    /// Set the bearer token
    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the connect timeout
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the user agent
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Add a default header
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.insert(key.into(), value.into());
        self
    }

    /// Set the path used by the connection check
    pub fn with_health_path(mut self, path: impl Into<String>) -> Self {
        self.health_path = path.into();
        self
    }

    /// Set the retry policy
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Validate the config and normalize the base URL
    ///
    /// The base URL must be an absolute http(s) URL with a host; a trailing
    /// `/` is trimmed so paths can be appended directly.
    pub(crate) fn validated(mut self) -> Result<Self> {
        let trimmed = self.base_url.trim();
        if trimmed.is_empty() {
            return Err(Error::Configuration("base URL is empty".to_string()));
        }

        let url = Url::parse(trimmed)
            .map_err(|e| Error::Configuration(format!("invalid base URL '{}': {}", trimmed, e)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::Configuration(format!(
                "unsupported URL scheme '{}'",
                url.scheme()
            )));
        }
        if url.host_str().is_none() {
            return Err(Error::Configuration(format!("base URL '{}' has no host", trimmed)));
        }
        if url.query().is_some() || url.fragment().is_some() {
            return Err(Error::Configuration(
                "base URL must not carry a query or fragment".to_string(),
            ));
        }
        self.base_url = trimmed.trim_end_matches('/').to_string();

        if let Some(token) = &self.auth_token {
            if token.is_empty() {
                return Err(Error::Configuration("auth token is empty".to_string()));
            }
            HeaderValue::from_str(&format!("Bearer {}", token)).map_err(|_| {
                Error::Configuration("auth token contains invalid characters".to_string())
            })?;
        }

        self.default_header_map()?;

        if self.retry.max_attempts == 0 {
            return Err(Error::Configuration("max_attempts must be at least 1".to_string()));
        }

        Ok(self)
    }

    /// Parse the default headers into a `HeaderMap`
    pub(crate) fn default_header_map(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::with_capacity(self.default_headers.len());
        for (key, value) in &self.default_headers {
            let name = HeaderName::from_bytes(key.as_bytes())
                .map_err(|_| Error::Configuration(format!("invalid header name '{}'", key)))?;
            let value = HeaderValue::from_str(value)
                .map_err(|_| Error::Configuration(format!("invalid value for header '{}'", key)))?;
            headers.insert(name, value);
        }
        Ok(headers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = ClientConfig::default();
        assert!(config.base_url.is_empty());
        assert!(config.auth_token.is_none());
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.health_path, "/health/ready");
        assert!(config.user_agent.starts_with("apicurio-registry-client/"));
        assert_eq!(config.retry.max_attempts, 3);
    }

    #[test]
    fn test_config_builder() {
        let config = ClientConfig::new("https://registry.example.com")
            .with_auth_token("abc")
            .with_timeout(Duration::from_secs(5))
            .with_connect_timeout(Duration::from_secs(2))
            .with_user_agent("Test/1.0")
            .with_header("X-Registry-GroupId", "default")
            .with_health_path("/apis/registry/v2/system/info")
            .with_retry(RetryPolicy::new(5));

        assert_eq!(config.base_url, "https://registry.example.com");
        assert_eq!(config.auth_token.as_deref(), Some("abc"));
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.connect_timeout, Duration::from_secs(2));
        assert_eq!(config.user_agent, "Test/1.0");
        assert_eq!(
            config.default_headers.get("X-Registry-GroupId"),
            Some(&"default".to_string())
        );
        assert_eq!(config.health_path, "/apis/registry/v2/system/info");
        assert_eq!(config.retry.max_attempts, 5);
    }

    #[test]
    fn test_validate_empty_base_url() {
        let err = ClientConfig::new("").validated().unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));

        let err = ClientConfig::new("   ").validated().unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn test_validate_malformed_base_url() {
        for url in ["not a url", "registry.example.com", "ftp://registry.example.com", "file:///tmp"] {
            let err = ClientConfig::new(url).validated().unwrap_err();
            assert!(matches!(err, Error::Configuration(_)), "accepted {}", url);
        }
    }

    #[test]
    fn test_validate_rejects_query() {
        let err = ClientConfig::new("https://registry.example.com/?x=1").validated().unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn test_validate_trims_trailing_slash() {
        let config = ClientConfig::new("http://localhost:8080/apis/").validated().unwrap();
        assert_eq!(config.base_url, "http://localhost:8080/apis");
    }

    #[test]
    fn test_validate_bad_token() {
        let err = ClientConfig::new("http://localhost:8080")
            .with_auth_token("line\nbreak")
            .validated()
            .unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));

        let err = ClientConfig::new("http://localhost:8080")
            .with_auth_token("")
            .validated()
            .unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn test_validate_bad_default_header() {
        let err = ClientConfig::new("http://localhost:8080")
            .with_header("bad header", "v")
            .validated()
            .unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn test_default_header_map() {
        let headers = ClientConfig::new("http://localhost:8080")
            .with_header("X-Registry-GroupId", "orders")
            .default_header_map()
            .unwrap();
        assert_eq!(headers.len(), 1);
        assert_eq!(headers.get("x-registry-groupid").unwrap(), "orders");
    }

    #[test]
    fn test_validate_zero_attempts() {
        let err = ClientConfig::new("http://localhost:8080")
            .with_retry(RetryPolicy::new(0))
            .validated()
            .unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn test_debug_redacts_token() {
        let config = ClientConfig::new("http://localhost:8080").with_auth_token("super-secret");
        let debug = format!("{:?}", config);
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_from_lookup() {
        let config = ClientConfig::from_lookup(|key| match key {
            ENV_REGISTRY_URL => Some("http://registry:8080".to_string()),
            ENV_AUTH_TOKEN => Some("tok".to_string()),
            _ => None,
        })
        .unwrap();
        assert_eq!(config.base_url, "http://registry:8080");
        assert_eq!(config.auth_token.as_deref(), Some("tok"));

        let config = ClientConfig::from_lookup(|key| match key {
            ENV_REGISTRY_URL => Some("http://registry:8080".to_string()),
            _ => None,
        })
        .unwrap();
        assert!(config.auth_token.is_none());
    }

    #[test]
    fn test_from_lookup_missing_url() {
        let err = ClientConfig::from_lookup(|_| None).unwrap_err();
        assert!(matches!(err, Error::Configuration(msg) if msg.contains(ENV_REGISTRY_URL)));
    }
}
