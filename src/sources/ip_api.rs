//! ip-api.com adapter.
//!
//! The free endpoint answers `{"status": "fail", "message": ...}` with HTTP 200
//! for reserved ranges and quota problems, so the status field is checked
//! before anything else.

use std::net::IpAddr;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use super::http::HttpEndpoint;
use super::normalize::resolve_isp_type;
use super::types::ProviderReading;
use super::GeoProvider;
use crate::error_handling::ProviderError;

const FIELDS: &str =
    "status,message,countryCode,regionName,city,zip,lat,lon,isp,org,mobile,proxy,hosting";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IpApiResponse {
    status: String,
    message: Option<String>,
    country_code: Option<String>,
    region_name: Option<String>,
    city: Option<String>,
    zip: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
    isp: Option<String>,
    org: Option<String>,
    #[serde(default)]
    mobile: bool,
    #[serde(default)]
    proxy: bool,
    #[serde(default)]
    hosting: bool,
}

impl IpApiResponse {
    fn normalize(self) -> Result<ProviderReading, ProviderError> {
        if self.status != "success" {
            return Err(ProviderError::Rejected(
                self.message.unwrap_or_else(|| self.status.clone()),
            ));
        }
        let org = self.isp.clone().or(self.org);
        Ok(ProviderReading {
            lat: self.lat,
            lon: self.lon,
            city: self.city,
            region: self.region_name,
            country: self.country_code,
            zip: self.zip,
            isp_type: resolve_isp_type(self.mobile, self.hosting, org.as_deref()),
            isp: org,
            is_vpn: false,
            is_proxy: self.proxy,
            is_hosting: self.hosting,
        })
    }
}

/// ip-api.com provider.
pub struct IpApiProvider {
    id: String,
    endpoint: HttpEndpoint,
    reliability: f64,
}

impl IpApiProvider {
    pub fn new(id: impl Into<String>, endpoint: HttpEndpoint, reliability: f64) -> Self {
        Self {
            id: id.into(),
            endpoint,
            reliability,
        }
    }
}

#[async_trait]
impl GeoProvider for IpApiProvider {
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
        let response: IpApiResponse = self
            .endpoint
            .get_json(&format!("/json/{}", ip), &[("fields", FIELDS)])
            .await?;
        response.normalize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::IspType;

    #[test]
    fn test_normalize_success() {
        let body = r#"{
            "status": "success", "countryCode": "BR", "regionName": "Sao Paulo",
            "city": "Sao Paulo", "zip": "01000-000", "lat": -23.5475, "lon": -46.6361,
            "isp": "Claro S.A", "org": "Claro", "mobile": true, "proxy": false, "hosting": false
        }"#;
        let response: IpApiResponse = serde_json::from_str(body).unwrap();
        let reading = response.normalize().expect("success");
        assert_eq!(reading.lat, Some(-23.5475));
        assert_eq!(reading.country.as_deref(), Some("BR"));
        assert_eq!(reading.zip.as_deref(), Some("01000-000"));
        assert_eq!(reading.isp_type, IspType::Mobile);
        assert!(!reading.is_proxy);
    }

    #[test]
    fn test_normalize_fail_status() {
        let body = r#"{"status": "fail", "message": "reserved range"}"#;
        let response: IpApiResponse = serde_json::from_str(body).unwrap();
        assert_eq!(
            response.normalize(),
            Err(ProviderError::Rejected("reserved range".to_string()))
        );
    }

    #[test]
    fn test_normalize_hosting_flag() {
        let body = r#"{"status": "success", "lat": 52.37, "lon": 4.89, "isp": "Some ISP",
                       "proxy": true, "hosting": true}"#;
        let response: IpApiResponse = serde_json::from_str(body).unwrap();
        let reading = response.normalize().unwrap();
        assert_eq!(reading.isp_type, IspType::Hosting);
        assert!(reading.is_proxy);
        assert!(reading.is_hosting);
    }
}
