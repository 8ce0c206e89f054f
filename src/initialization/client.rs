//! HTTP client initialization.

use std::sync::Arc;
use std::time::Duration;

use crate::config::{Config, TCP_CONNECT_TIMEOUT_MS};
use reqwest::ClientBuilder;

/// Initializes the HTTP client shared by every web provider.
///
/// Creates a `reqwest::Client` configured with:
/// - User-Agent header from the configuration
/// - A request timeout equal to the default provider timeout
/// - A short TCP connect timeout so dead hosts fail fast
///
/// Providers with their own timeout override it per request.
///
/// # Errors
///
/// Returns a `reqwest::Error` if client creation fails.
pub fn init_client(config: &Config) -> Result<Arc<reqwest::Client>, reqwest::Error> {
    let client = ClientBuilder::new()
        .timeout(Duration::from_millis(config.provider_timeout_ms))
        .connect_timeout(Duration::from_millis(
            TCP_CONNECT_TIMEOUT_MS.min(config.provider_timeout_ms),
        ))
        .user_agent(config.user_agent.clone())
        .build()?;
    Ok(Arc::new(client))
}
