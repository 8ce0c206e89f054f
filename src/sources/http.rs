//! Shared HTTP plumbing for the web-based providers.

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;

use crate::config::MAX_PROVIDER_BODY_BYTES;
use crate::error_handling::{categorize_reqwest_error, categorize_status, ProviderError};

/// Endpoint settings common to every HTTP provider.
#[derive(Debug, Clone)]
pub struct HttpEndpoint {
    client: Arc<reqwest::Client>,
    base_url: String,
    timeout: Option<Duration>,
}

impl HttpEndpoint {
    /// Creates an endpoint rooted at `base_url` (no trailing slash).
    pub fn new(client: Arc<reqwest::Client>, base_url: impl Into<String>, timeout: Option<Duration>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
        }
    }

    /// Base URL without trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Per-provider timeout override.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Issues a GET for `path` and decodes the JSON body into `T`.
    ///
    /// Non-success statuses and decode problems are mapped onto
    /// `ProviderError`; nothing here retries. Bodies larger than
    /// `MAX_PROVIDER_BODY_BYTES` are refused as `Decode` errors.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ProviderError> {
        let url = format!("{}{}", self.base_url, path);
        let timeout_ms = self.timeout.map(|t| t.as_millis() as u64).unwrap_or(0);

        let mut request = self.client.get(&url);
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        let mut response = request
            .send()
            .await
            .map_err(|e| categorize_reqwest_error(&e, timeout_ms))?;

        let status = response.status();
        if !status.is_success() {
            return Err(categorize_status(status));
        }

        if let Some(length) = response.content_length() {
            if length > MAX_PROVIDER_BODY_BYTES as u64 {
                return Err(oversized_body());
            }
        }

        // Content-Length can be absent or wrong, so the cap is enforced while reading
        let mut body: Vec<u8> = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| categorize_reqwest_error(&e, timeout_ms))?
        {
            if body.len() + chunk.len() > MAX_PROVIDER_BODY_BYTES {
                return Err(oversized_body());
            }
            body.extend_from_slice(&chunk);
        }

        serde_json::from_slice(&body).map_err(|e| ProviderError::Decode(e.to_string()))
    }
}

fn oversized_body() -> ProviderError {
    ProviderError::Decode(format!(
        "response body exceeds {} bytes",
        MAX_PROVIDER_BODY_BYTES
    ))
}
