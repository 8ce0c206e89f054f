//! The lookup engine.
//!
//! Owns the configured providers and the fusion tunables. Each lookup fans
//! out to every provider, fuses the answers and publishes a [`GeoEstimate`].
//! Nothing is cached between lookups.

use std::net::IpAddr;
use std::sync::Arc;

use log::{debug, info, warn};
use tokio_util::sync::CancellationToken;

use crate::config::{default_provider_specs, load_provider_specs, Config, EngineTunables};
use crate::error_handling::{InitializationError, LookupError};
use crate::estimate::{estimate_from_observations, GeoEstimate};
use crate::initialization::{build_providers, init_client};
use crate::sources::{query_all, GeoProvider};

/// Multi-source IP geolocation engine.
///
/// `Send + Sync`; share it with `Arc` and call [`GeoEngine::locate`] from as
/// many tasks as needed.
#[derive(Clone)]
pub struct GeoEngine {
    providers: Vec<Arc<dyn GeoProvider>>,
    tunables: EngineTunables,
}

impl std::fmt::Debug for GeoEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let ids: Vec<&str> = self.providers.iter().map(|p| p.source_id()).collect();
        f.debug_struct("GeoEngine")
            .field("providers", &ids)
            .field("tunables", &self.tunables)
            .finish()
    }
}

impl GeoEngine {
    /// Creates an engine over already-built providers.
    pub fn new(providers: Vec<Arc<dyn GeoProvider>>, tunables: EngineTunables) -> Self {
        Self {
            providers,
            tunables,
        }
    }

    /// Builds the engine described by `config`.
    ///
    /// Providers come from `--providers-file` when given, otherwise from the
    /// built-in set.
    ///
    /// # Errors
    ///
    /// Returns `InitializationError` if a tunable is out of range, the HTTP
    /// client cannot be built, or the provider configuration is invalid.
    pub fn from_config(config: &Config) -> Result<Self, InitializationError> {
        let tunables = config.tunables();
        tunables.validate()?;
        let client = init_client(config)?;
        let specs = match &config.providers_file {
            Some(path) => load_provider_specs(path)?,
            None => default_provider_specs(),
        };
        let providers = build_providers(&specs, &client)?;
        info!(
            "Geolocation engine ready with {} provider{}",
            providers.len(),
            if providers.len() == 1 { "" } else { "s" }
        );
        Ok(Self::new(providers, tunables))
    }

    pub fn providers(&self) -> &[Arc<dyn GeoProvider>] {
        &self.providers
    }

    pub fn tunables(&self) -> &EngineTunables {
        &self.tunables
    }

    /// Locates `ip`.
    ///
    /// Provider failures and weak agreement are reported inside the
    /// estimate; only caller-side problems are errors.
    ///
    /// # Errors
    ///
    /// - `LookupError::InvalidIp` if `ip` is not an IPv4/IPv6 address
    /// - `LookupError::NoProvidersConfigured` if the engine has no providers
    pub async fn locate(&self, ip: &str) -> Result<GeoEstimate, LookupError> {
        let addr = self.prepare(ip)?;
        Ok(self.run(addr).await)
    }

    /// Locates `ip`, abandoning the lookup if `cancel` fires first.
    ///
    /// On cancellation every in-flight provider call is dropped and partial
    /// results are discarded.
    ///
    /// # Errors
    ///
    /// As [`GeoEngine::locate`], plus `LookupError::Cancelled`.
    pub async fn locate_with_cancel(
        &self,
        ip: &str,
        cancel: &CancellationToken,
    ) -> Result<GeoEstimate, LookupError> {
        let addr = self.prepare(ip)?;
        if cancel.is_cancelled() {
            return Err(LookupError::Cancelled);
        }
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("Lookup for {} cancelled", addr);
                Err(LookupError::Cancelled)
            }
            estimate = self.run(addr) => Ok(estimate),
        }
    }

    fn prepare(&self, ip: &str) -> Result<IpAddr, LookupError> {
        let addr: IpAddr = ip
            .trim()
            .parse()
            .map_err(|_| LookupError::InvalidIp(ip.to_string()))?;
        if self.providers.is_empty() {
            return Err(LookupError::NoProvidersConfigured);
        }
        Ok(addr)
    }

    async fn run(&self, addr: IpAddr) -> GeoEstimate {
        let observations = query_all(
            addr,
            &self.providers,
            self.tunables.provider_timeout,
            self.tunables.deadline,
        )
        .await;
        let estimate =
            estimate_from_observations(&addr.to_string(), &observations, &self.tunables);
        if !estimate.is_located() {
            warn!("{}: no provider answered", addr);
            return estimate;
        }
        debug!(
            "{}: {} of {} sources agree ({}), accuracy ~{:.0} m",
            addr,
            estimate.sources_agree,
            estimate.sources_queried,
            estimate.confidence_tier.as_ref(),
            estimate.estimated_accuracy_m
        );
        estimate
    }
}
