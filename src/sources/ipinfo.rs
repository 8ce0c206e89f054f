//! ipinfo.io adapter.
//!
//! Coordinates arrive as a single `"lat,lon"` string. Privacy flags are only
//! returned for tokens on plans that include them.

use std::net::IpAddr;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use super::http::HttpEndpoint;
use super::normalize::{parse_lat_lon, resolve_isp_type};
use super::types::ProviderReading;
use super::GeoProvider;
use crate::error_handling::ProviderError;

#[derive(Debug, Deserialize)]
struct IpinfoResponse {
    #[serde(default)]
    bogon: bool,
    loc: Option<String>,
    city: Option<String>,
    region: Option<String>,
    country: Option<String>,
    postal: Option<String>,
    org: Option<String>,
    privacy: Option<Privacy>,
}

#[derive(Debug, Default, Deserialize)]
struct Privacy {
    #[serde(default)]
    vpn: bool,
    #[serde(default)]
    proxy: bool,
    #[serde(default)]
    tor: bool,
    #[serde(default)]
    relay: bool,
    #[serde(default)]
    hosting: bool,
}

impl IpinfoResponse {
    fn normalize(self) -> Result<ProviderReading, ProviderError> {
        if self.bogon {
            return Err(ProviderError::Rejected("bogon address".to_string()));
        }
        let (lat, lon) = match self.loc.as_deref().and_then(parse_lat_lon) {
            Some((lat, lon)) => (Some(lat), Some(lon)),
            None => (None, None),
        };
        let privacy = self.privacy.unwrap_or_default();
        Ok(ProviderReading {
            lat,
            lon,
            city: self.city,
            region: self.region,
            country: self.country,
            zip: self.postal,
            isp_type: resolve_isp_type(false, privacy.hosting, self.org.as_deref()),
            isp: self.org,
            is_vpn: privacy.vpn,
            is_proxy: privacy.proxy || privacy.tor || privacy.relay,
            is_hosting: privacy.hosting,
        })
    }
}

/// ipinfo.io provider.
pub struct IpinfoProvider {
    id: String,
    endpoint: HttpEndpoint,
    token: Option<String>,
    reliability: f64,
}

impl IpinfoProvider {
    pub fn new(
        id: impl Into<String>,
        endpoint: HttpEndpoint,
        token: Option<String>,
        reliability: f64,
    ) -> Self {
        Self {
            id: id.into(),
            endpoint,
            token,
            reliability,
        }
    }
}

#[async_trait]
impl GeoProvider for IpinfoProvider {
    fn source_id(&self) -> &str {
        &self.id
    }

    fn reliability(&self) -> f64 {
        self.reliability
    }

    fn timeout(&self) -> Option<Duration> {
        self.endpoint.timeout()
    }

    async fn lookup(&self, ip: IpAddr) -> Result<ProviderReading, ProviderError> {
        let query: Vec<(&str, &str)> = match &self.token {
            Some(token) => vec![("token", token.as_str())],
            None => Vec::new(),
        };
        let response: IpinfoResponse = self
            .endpoint
            .get_json(&format!("/{}/json", ip), &query)
            .await?;
        response.normalize()
    }
}
