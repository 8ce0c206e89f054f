//! Error type definitions.
//!
//! This module defines the errors raised during initialization, by individual
//! providers, and by a lookup as a whole.

use log::SetLoggerError;
use reqwest::Error as ReqwestError;
use serde::{Deserialize, Serialize};
use strum_macros::EnumIter as EnumIterMacro;
use thiserror::Error;

/// Error types for initialization failures.
#[derive(Error, Debug)]
#[allow(clippy::enum_variant_names)] // All variants end with "Error" by convention
pub enum InitializationError {
    /// Error initializing the logger.
    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] SetLoggerError),

    /// Error initializing the HTTP client.
    #[error("HTTP client initialization error: {0}")]
    HttpClientError(#[from] ReqwestError),

    /// Invalid or unreadable provider configuration.
    #[error("Provider configuration error: {0}")]
    ProviderConfigError(String),

    /// A threshold or limit of the engine is out of range.
    #[error("Invalid engine setting: {0}")]
    TunablesError(String),

    /// The GeoLite2 database could not be opened.
    #[error("GeoLite database error: {0}")]
    GeoliteDatabaseError(String),
}

/// Why a single provider produced no usable observation.
///
/// These never fail a lookup; they are recorded on the observation
/// (`fetchSucceeded = false`) and counted in statistics.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    /// The provider did not answer within its own timeout.
    #[error("timed out after {0} ms")]
    Timeout(u64),

    /// The overall lookup deadline passed before the provider settled.
    #[error("lookup deadline exceeded")]
    DeadlineExceeded,

    /// The provider answered with a non-success HTTP status.
    #[error("HTTP status {0}")]
    HttpStatus(u16),

    /// Connection or request failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// The body was not the JSON shape the normalizer expects.
    #[error("invalid response body: {0}")]
    Decode(String),

    /// The provider answered but declined (quota, reserved range, bad key).
    #[error("provider rejected lookup: {0}")]
    Rejected(String),

    /// Coordinates missing, non-finite or out of range.
    #[error("malformed coordinates: {0}")]
    MalformedCoordinates(String),

    /// Local database lookup failed.
    #[error("database lookup failed: {0}")]
    Database(String),
}

impl ProviderError {
    /// Category used for statistics.
    pub fn failure(&self) -> ProviderFailure {
        match self {
            ProviderError::Timeout(_) => ProviderFailure::Timeout,
            ProviderError::DeadlineExceeded => ProviderFailure::DeadlineExceeded,
            ProviderError::HttpStatus(_) => ProviderFailure::HttpStatus,
            ProviderError::Transport(_) => ProviderFailure::Transport,
            ProviderError::Decode(_) => ProviderFailure::Decode,
            ProviderError::Rejected(_) => ProviderFailure::Rejected,
            ProviderError::MalformedCoordinates(_) => ProviderFailure::MalformedCoordinates,
            ProviderError::Database(_) => ProviderFailure::Database,
        }
    }
}

/// Provider failure categories.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIterMacro,
)]
#[serde(rename_all = "kebab-case")]
pub enum ProviderFailure {
    /// Per-provider timeout
    Timeout,
    /// Overall lookup deadline
    DeadlineExceeded,
    /// Non-success HTTP status
    HttpStatus,
    /// Connection/request failure
    Transport,
    /// Unexpected body
    Decode,
    /// Provider declined
    Rejected,
    /// Missing or out-of-range coordinates
    MalformedCoordinates,
    /// Local database failure
    Database,
}

impl std::fmt::Display for ProviderFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ProviderFailure {
    /// Human-readable label used in statistics output.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderFailure::Timeout => "Provider timeout",
            ProviderFailure::DeadlineExceeded => "Lookup deadline exceeded",
            ProviderFailure::HttpStatus => "HTTP error status",
            ProviderFailure::Transport => "Transport error",
            ProviderFailure::Decode => "Invalid response body",
            ProviderFailure::Rejected => "Rejected by provider",
            ProviderFailure::MalformedCoordinates => "Malformed coordinates",
            ProviderFailure::Database => "Local database error",
        }
    }
}

/// Errors a caller can get back from a lookup.
///
/// Provider failures and weak consensus are *not* errors: they are encoded
/// in the returned estimate.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LookupError {
    /// The input is not an IPv4 or IPv6 address.
    #[error("invalid IP address: '{0}'")]
    InvalidIp(String),

    /// The engine has no providers to ask.
    #[error("no geolocation providers configured")]
    NoProvidersConfigured,

    /// The caller cancelled the lookup; partial results were discarded.
    #[error("lookup cancelled")]
    Cancelled,
}
