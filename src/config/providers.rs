//! Provider configuration.
//!
//! Providers are described by [`ProviderSpec`] entries, either loaded from a
//! JSON file (`--providers-file`) or taken from the built-in default set.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, EnumIter};

use crate::config::constants::{GEOLITE_DB_PATH_ENV, IPINFO_TOKEN_ENV};
use crate::error_handling::InitializationError;

/// The geolocation services this crate knows how to normalize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsRefStr, EnumIter)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum ProviderKind {
    /// ip-api.com JSON endpoint
    IpApi,
    /// ipapi.co JSON endpoint
    IpapiCo,
    /// ipwho.is
    Ipwhois,
    /// ipinfo.io (token optional, required for privacy flags)
    Ipinfo,
    /// freeipapi.com
    Freeipapi,
    /// Local MaxMind GeoLite2-City database
    Geolite,
}

impl ProviderKind {
    /// Public endpoint used when `base_url` is not overridden.
    pub fn default_base_url(&self) -> Option<&'static str> {
        match self {
            ProviderKind::IpApi => Some("http://ip-api.com"),
            ProviderKind::IpapiCo => Some("https://ipapi.co"),
            ProviderKind::Ipwhois => Some("https://ipwho.is"),
            ProviderKind::Ipinfo => Some("https://ipinfo.io"),
            ProviderKind::Freeipapi => Some("https://freeipapi.com"),
            ProviderKind::Geolite => None,
        }
    }

    /// Prior reliability, used as the initial centroid weight.
    ///
    /// Reflects how often each service lands in the consensus group for
    /// residential addresses; overridable per provider entry.
    pub fn default_reliability(&self) -> f64 {
        match self {
            ProviderKind::IpApi => 1.0,
            ProviderKind::Ipinfo => 1.0,
            ProviderKind::IpapiCo => 0.9,
            ProviderKind::Ipwhois => 0.9,
            ProviderKind::Geolite => 0.85,
            ProviderKind::Freeipapi => 0.8,
        }
    }
}

/// One configured provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderSpec {
    /// Which normalizer to use
    pub kind: ProviderKind,
    /// Source identity in results; defaults to the kind's name. Must be unique.
    #[serde(default)]
    pub name: Option<String>,
    /// Endpoint override (mock servers, self-hosted mirrors)
    #[serde(default)]
    pub base_url: Option<String>,
    /// API key or token
    #[serde(default)]
    pub api_key: Option<String>,
    /// Per-provider timeout override in milliseconds (HTTP providers only)
    #[serde(default)]
    pub timeout_ms: Option<u64>,
    /// Reliability override (0.0-1.0)
    #[serde(default)]
    pub reliability: Option<f64>,
    /// `.mmdb` path, required for `geolite`
    #[serde(default)]
    pub database_path: Option<PathBuf>,
}

impl ProviderSpec {
    /// A provider entry with every optional field left to its default.
    pub fn new(kind: ProviderKind) -> Self {
        Self {
            kind,
            name: None,
            base_url: None,
            api_key: None,
            timeout_ms: None,
            reliability: None,
            database_path: None,
        }
    }

    /// Sets the endpoint override.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Sets the source identity.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Source identity used in observations.
    pub fn source_id(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| self.kind.as_ref().to_string())
    }

    /// Effective reliability, clamped to 0.0-1.0.
    pub fn effective_reliability(&self) -> f64 {
        self.reliability
            .unwrap_or_else(|| self.kind.default_reliability())
            .clamp(0.0, 1.0)
    }

    /// Effective endpoint, if the kind talks HTTP.
    pub fn effective_base_url(&self) -> Option<String> {
        self.base_url
            .clone()
            .or_else(|| self.kind.default_base_url().map(str::to_string))
            .map(|u| u.trim_end_matches('/').to_string())
    }

    /// Checks the entry for values that would make the provider unusable.
    pub fn validate(&self) -> Result<(), InitializationError> {
        let id = self.source_id();
        if id.trim().is_empty() {
            return Err(InitializationError::ProviderConfigError(
                "provider name must not be empty".to_string(),
            ));
        }
        if let Some(r) = self.reliability {
            if !(0.0..=1.0).contains(&r) || !r.is_finite() {
                return Err(InitializationError::ProviderConfigError(format!(
                    "{}: reliability must be between 0.0 and 1.0, got {}",
                    id, r
                )));
            }
        }
        if self.timeout_ms == Some(0) {
            return Err(InitializationError::ProviderConfigError(format!(
                "{}: timeout_ms must be greater than zero",
                id
            )));
        }
        match self.kind {
            ProviderKind::Geolite => {
                if self.database_path.is_none() {
                    return Err(InitializationError::ProviderConfigError(format!(
                        "{}: geolite provider requires database_path",
                        id
                    )));
                }
                // Lookups are in-memory reads that never wait on I/O
                if self.timeout_ms.is_some() {
                    return Err(InitializationError::ProviderConfigError(format!(
                        "{}: timeout_ms is not supported for the geolite provider",
                        id
                    )));
                }
            }
            _ => {
                if let Some(base) = self.effective_base_url() {
                    url::Url::parse(&base).map_err(|e| {
                        InitializationError::ProviderConfigError(format!(
                            "{}: invalid base_url '{}': {}",
                            id, base, e
                        ))
                    })?;
                }
            }
        }
        Ok(())
    }
}

/// Validates a provider list as a whole (non-empty, unique source ids).
pub fn validate_provider_specs(specs: &[ProviderSpec]) -> Result<(), InitializationError> {
    if specs.is_empty() {
        return Err(InitializationError::ProviderConfigError(
            "at least one provider must be configured".to_string(),
        ));
    }
    let mut seen = HashSet::new();
    for spec in specs {
        spec.validate()?;
        let id = spec.source_id();
        if !seen.insert(id.clone()) {
            return Err(InitializationError::ProviderConfigError(format!(
                "duplicate provider name '{}'",
                id
            )));
        }
    }
    Ok(())
}

/// Loads and validates provider entries from a JSON array file.
///
/// # Errors
///
/// Returns `InitializationError::ProviderConfigError` if the file cannot be read,
/// is not a JSON array of provider entries, or fails validation.
pub fn load_provider_specs(path: &Path) -> Result<Vec<ProviderSpec>, InitializationError> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        InitializationError::ProviderConfigError(format!(
            "failed to read {}: {}",
            path.display(),
            e
        ))
    })?;
    let specs: Vec<ProviderSpec> = serde_json::from_str(&content).map_err(|e| {
        InitializationError::ProviderConfigError(format!(
            "failed to parse {}: {}",
            path.display(),
            e
        ))
    })?;
    validate_provider_specs(&specs)?;
    Ok(specs)
}

/// Built-in provider set.
///
/// The four keyless free providers are always present; ipinfo is added when
/// `IPINFO_TOKEN` is set and geolite when `GEOLITE_DB_PATH` is set.
pub fn default_provider_specs() -> Vec<ProviderSpec> {
    let mut specs = vec![
        ProviderSpec::new(ProviderKind::IpApi),
        ProviderSpec::new(ProviderKind::IpapiCo),
        ProviderSpec::new(ProviderKind::Ipwhois),
        ProviderSpec::new(ProviderKind::Freeipapi),
    ];

    if let Ok(token) = std::env::var(IPINFO_TOKEN_ENV) {
        if !token.trim().is_empty() {
            specs.push(ProviderSpec {
                api_key: Some(token),
                ..ProviderSpec::new(ProviderKind::Ipinfo)
            });
        }
    }

    if let Ok(path) = std::env::var(GEOLITE_DB_PATH_ENV) {
        if !path.trim().is_empty() {
            specs.push(ProviderSpec {
                database_path: Some(PathBuf::from(path)),
                ..ProviderSpec::new(ProviderKind::Geolite)
            });
        }
    }

    specs
}
