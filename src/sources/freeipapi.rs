//! freeipapi.com adapter.

use std::net::IpAddr;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use super::http::HttpEndpoint;
use super::types::{IspType, ProviderReading};
use super::GeoProvider;
use crate::error_handling::ProviderError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FreeIpApiResponse {
    latitude: Option<f64>,
    longitude: Option<f64>,
    city_name: Option<String>,
    region_name: Option<String>,
    country_code: Option<String>,
    zip_code: Option<String>,
    #[serde(default)]
    is_proxy: bool,
}

impl FreeIpApiResponse {
    fn normalize(self) -> ProviderReading {
        // No ISP field on the free tier; (0, 0) for unknown addresses is
        // rejected when the observation is validated.
        ProviderReading {
            lat: self.latitude,
            lon: self.longitude,
            city: self.city_name,
            region: self.region_name,
            country: self.country_code,
            zip: self.zip_code,
            isp: None,
            isp_type: IspType::Unknown,
            is_vpn: false,
            is_proxy: self.is_proxy,
            is_hosting: false,
        }
    }
}

/// freeipapi.com provider.
pub struct FreeIpApiProvider {
    id: String,
    endpoint: HttpEndpoint,
    reliability: f64,
}

impl FreeIpApiProvider {
    pub fn new(id: impl Into<String>, endpoint: HttpEndpoint, reliability: f64) -> Self {
        Self {
            id: id.into(),
            endpoint,
            reliability,
        }
    }
}

#[async_trait]
impl GeoProvider for FreeIpApiProvider {
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
        let response: FreeIpApiResponse = self
            .endpoint
            .get_json(&format!("/api/json/{}", ip), &[])
            .await?;
        Ok(response.normalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        let body = r#"{
            "ipVersion": 4, "ipAddress": "201.1.1.1", "latitude": -22.9064,
            "longitude": -43.1822, "countryName": "Brazil", "countryCode": "BR",
            "zipCode": "20000-000", "cityName": "Rio de Janeiro",
            "regionName": "Rio de Janeiro", "isProxy": false
        }"#;
        let response: FreeIpApiResponse = serde_json::from_str(body).unwrap();
        let reading = response.normalize();
        assert_eq!(reading.city.as_deref(), Some("Rio de Janeiro"));
        assert_eq!(reading.zip.as_deref(), Some("20000-000"));
        assert_eq!(reading.isp_type, IspType::Unknown);
    }

    #[test]
    fn test_normalize_proxy_flag() {
        let body = r#"{"latitude": 1.0, "longitude": 2.0, "isProxy": true}"#;
        let response: FreeIpApiResponse = serde_json::from_str(body).unwrap();
        assert!(response.normalize().is_proxy);
    }
}
