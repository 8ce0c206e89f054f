//! Geolocation sources.
//!
//! Each provider adapter turns one provider's response shape into a
//! [`ProviderReading`]; the fan-out queries them all concurrently and
//! validates every reading into a [`SourceObservation`].

mod fanout;
mod freeipapi;
mod geolite;
mod http;
mod ip_api;
mod ipapi_co;
mod ipinfo;
mod ipwhois;
pub mod normalize;
mod types;

use std::net::IpAddr;
use std::time::Duration;

use async_trait::async_trait;

use crate::config::DEFAULT_PROVIDER_RELIABILITY;
use crate::error_handling::ProviderError;

pub use fanout::{effective_deadline, query_all};
pub use freeipapi::FreeIpApiProvider;
pub use geolite::GeoliteProvider;
pub use http::HttpEndpoint;
pub use ip_api::IpApiProvider;
pub use ipapi_co::IpapiCoProvider;
pub use ipinfo::IpinfoProvider;
pub use ipwhois::IpwhoisProvider;
pub use types::{IspType, ProviderReading, SourceObservation};

/// A source that can place an IP address on the map.
///
/// Implementations must be cheap to share across tasks; the engine holds
/// them as `Arc<dyn GeoProvider>` and calls `lookup` concurrently.
#[async_trait]
pub trait GeoProvider: Send + Sync {
    /// Stable identity used in output and for tie-breaking.
    fn source_id(&self) -> &str;

    /// Prior reliability in `0.0..=1.0`.
    fn reliability(&self) -> f64 {
        DEFAULT_PROVIDER_RELIABILITY
    }

    /// Per-provider timeout override; `None` uses the engine default.
    fn timeout(&self) -> Option<Duration> {
        None
    }

    /// Looks up `ip`. Errors are captured per source and never abort the
    /// lookup as a whole.
    async fn lookup(&self, ip: IpAddr) -> Result<ProviderReading, ProviderError>;
}
