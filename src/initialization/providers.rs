//! Provider construction.
//!
//! Turns validated provider entries into shareable `GeoProvider` trait
//! objects over one shared HTTP client.

use std::sync::Arc;
use std::time::Duration;

use crate::config::{validate_provider_specs, ProviderKind, ProviderSpec};
use crate::error_handling::InitializationError;
use crate::sources::{
    FreeIpApiProvider, GeoProvider, GeoliteProvider, HttpEndpoint, IpApiProvider,
    IpapiCoProvider, IpinfoProvider, IpwhoisProvider,
};

fn endpoint(spec: &ProviderSpec, client: &Arc<reqwest::Client>) -> Result<HttpEndpoint, InitializationError> {
    let base_url = spec.effective_base_url().ok_or_else(|| {
        InitializationError::ProviderConfigError(format!("{}: no base_url", spec.source_id()))
    })?;
    Ok(HttpEndpoint::new(
        Arc::clone(client),
        base_url,
        spec.timeout_ms.map(Duration::from_millis),
    ))
}

/// Builds one provider from its configuration entry.
///
/// # Errors
///
/// Returns `InitializationError` if the entry is invalid or the GeoLite
/// database cannot be opened.
pub fn build_provider(
    spec: &ProviderSpec,
    client: &Arc<reqwest::Client>,
) -> Result<Arc<dyn GeoProvider>, InitializationError> {
    spec.validate()?;
    let id = spec.source_id();
    let reliability = spec.effective_reliability();

    let provider: Arc<dyn GeoProvider> = match spec.kind {
        ProviderKind::IpApi => Arc::new(IpApiProvider::new(id, endpoint(spec, client)?, reliability)),
        ProviderKind::IpapiCo => Arc::new(IpapiCoProvider::new(
            id,
            endpoint(spec, client)?,
            spec.api_key.clone(),
            reliability,
        )),
        ProviderKind::Ipwhois => {
            Arc::new(IpwhoisProvider::new(id, endpoint(spec, client)?, reliability))
        }
        ProviderKind::Ipinfo => Arc::new(IpinfoProvider::new(
            id,
            endpoint(spec, client)?,
            spec.api_key.clone(),
            reliability,
        )),
        ProviderKind::Freeipapi => {
            Arc::new(FreeIpApiProvider::new(id, endpoint(spec, client)?, reliability))
        }
        ProviderKind::Geolite => {
            let path = spec.database_path.as_deref().ok_or_else(|| {
                InitializationError::ProviderConfigError(format!(
                    "{}: geolite provider requires database_path",
                    id
                ))
            })?;
            Arc::new(GeoliteProvider::open(id, path, reliability)?)
        }
    };

    log::debug!(
        "Configured provider {} ({}), reliability {:.2}",
        provider.source_id(),
        spec.kind.as_ref(),
        reliability
    );
    Ok(provider)
}

/// Builds every configured provider.
///
/// # Errors
///
/// Fails on the first invalid entry rather than skipping it.
pub fn build_providers(
    specs: &[ProviderSpec],
    client: &Arc<reqwest::Client>,
) -> Result<Vec<Arc<dyn GeoProvider>>, InitializationError> {
    validate_provider_specs(specs)?;
    specs.iter().map(|spec| build_provider(spec, client)).collect()
}
