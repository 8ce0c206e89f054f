//! Error categorization.
//!
//! Maps `reqwest` failures onto the provider error taxonomy.

use super::types::ProviderError;

/// Categorizes a `reqwest::Error` into a `ProviderError`.
///
/// HTTP status codes are checked first, then the error kind. Timeouts carry
/// the provider's configured timeout so the message says how long we waited.
///
/// # Arguments
///
/// * `error` - The `reqwest::Error` to categorize
/// * `timeout_ms` - The timeout the request was issued with
pub fn categorize_reqwest_error(error: &reqwest::Error, timeout_ms: u64) -> ProviderError {
    if let Some(status) = error.status() {
        return ProviderError::HttpStatus(status.as_u16());
    }

    if error.is_timeout() {
        return ProviderError::Timeout(timeout_ms);
    }

    if error.is_decode() {
        return ProviderError::Decode(error.to_string());
    }

    // Connect, request, redirect and body errors all mean the provider was unreachable
    ProviderError::Transport(error.to_string())
}

/// Maps a non-success HTTP status into a `ProviderError`.
///
/// 429 is reported as a rejection: the provider is up but our free-tier quota
/// is exhausted.
pub fn categorize_status(status: reqwest::StatusCode) -> ProviderError {
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        return ProviderError::Rejected("rate limited (429)".to_string());
    }
    ProviderError::HttpStatus(status.as_u16())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categorize_status_rate_limit() {
        assert_eq!(
            categorize_status(reqwest::StatusCode::TOO_MANY_REQUESTS),
            ProviderError::Rejected("rate limited (429)".to_string())
        );
    }

    #[test]
    fn test_categorize_status_server_error() {
        assert_eq!(
            categorize_status(reqwest::StatusCode::BAD_GATEWAY),
            ProviderError::HttpStatus(502)
        );
    }

    #[tokio::test]
    async fn test_categorize_connect_error() {
        // Port 9 on localhost (discard) is closed in test environments
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_millis(500))
            .build()
            .expect("client");
        let err = client
            .get("http://127.0.0.1:9/")
            .send()
            .await
            .expect_err("nothing listens on port 9");
        match categorize_reqwest_error(&err, 500) {
            ProviderError::Transport(_) | ProviderError::Timeout(500) => {}
            other => panic!("unexpected category: {:?}", other),
        }
    }
}
