//! ipapi.co adapter.

use std::net::IpAddr;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use super::http::HttpEndpoint;
use super::normalize::classify_isp;
use super::types::ProviderReading;
use super::GeoProvider;
use crate::error_handling::ProviderError;

#[derive(Debug, Deserialize)]
struct IpapiCoResponse {
    #[serde(default)]
    error: bool,
    reason: Option<String>,
    #[serde(default)]
    reserved: bool,
    latitude: Option<f64>,
    longitude: Option<f64>,
    city: Option<String>,
    region: Option<String>,
    country_code: Option<String>,
    postal: Option<String>,
    org: Option<String>,
}

impl IpapiCoResponse {
    fn normalize(self) -> Result<ProviderReading, ProviderError> {
        if self.error || self.reserved {
            return Err(ProviderError::Rejected(
                self.reason.unwrap_or_else(|| "error".to_string()),
            ));
        }
        Ok(ProviderReading {
            lat: self.latitude,
            lon: self.longitude,
            city: self.city,
            region: self.region,
            country: self.country_code,
            zip: self.postal,
            isp_type: classify_isp(self.org.as_deref()),
            isp: self.org,
            ..Default::default()
        })
    }
}

/// ipapi.co provider. The API key is optional.
pub struct IpapiCoProvider {
    id: String,
    endpoint: HttpEndpoint,
    api_key: Option<String>,
    reliability: f64,
}

impl IpapiCoProvider {
    pub fn new(
        id: impl Into<String>,
        endpoint: HttpEndpoint,
        api_key: Option<String>,
        reliability: f64,
    ) -> Self {
        Self {
            id: id.into(),
            endpoint,
            api_key,
            reliability,
        }
    }
}

#[async_trait]
impl GeoProvider for IpapiCoProvider {
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
        let query: Vec<(&str, &str)> = match &self.api_key {
            Some(key) => vec![("key", key.as_str())],
            None => Vec::new(),
        };
        let response: IpapiCoResponse = self
            .endpoint
            .get_json(&format!("/{}/json/", ip), &query)
            .await?;
        response.normalize()
    }
}
