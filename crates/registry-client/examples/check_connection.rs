//! Check that an Apicurio Registry instance is reachable
//!
//! Reads `APICURIO_REGISTRY_URL` and `APICURIO_AUTH_TOKEN` from the
//! environment. Set `RUST_LOG=registry_client=debug` to see every attempt.

use anyhow::Context;
use registry_client::{ClientConfig, RegistryClient};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = ClientConfig::from_env().context("loading registry configuration")?;
    let client = RegistryClient::new(config).context("building registry client")?;

    let status = client
        .check_connection()
        .await
        .with_context(|| format!("checking connection to {}", client.base_url()))?;

    tracing::info!(
        status = status.status_code,
        health = status.health.as_deref().unwrap_or("unknown"),
        attempts = status.attempts,
        latency_ms = status.latency.as_millis() as u64,
        "Registry reachable"
    );
    Ok(())
}
