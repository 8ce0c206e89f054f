//! ipwho.is adapter.

use std::net::IpAddr;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use super::http::HttpEndpoint;
use super::normalize::resolve_isp_type;
use super::types::ProviderReading;
use super::GeoProvider;
use crate::error_handling::ProviderError;

#[derive(Debug, Deserialize)]
struct IpwhoisResponse {
    success: bool,
    message: Option<String>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    city: Option<String>,
    region: Option<String>,
    country_code: Option<String>,
    postal: Option<String>,
    connection: Option<Connection>,
    /// Only present on paid plans
    security: Option<Security>,
}

#[derive(Debug, Deserialize)]
struct Connection {
    isp: Option<String>,
    org: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Security {
    #[serde(default)]
    vpn: bool,
    #[serde(default)]
    proxy: bool,
    #[serde(default)]
    hosting: bool,
}

impl IpwhoisResponse {
    fn normalize(self) -> Result<ProviderReading, ProviderError> {
        if !self.success {
            return Err(ProviderError::Rejected(
                self.message.unwrap_or_else(|| "unsuccessful".to_string()),
            ));
        }
        let org = self.connection.and_then(|c| c.isp.or(c.org));
        let security = self.security.unwrap_or_default();
        Ok(ProviderReading {
            lat: self.latitude,
            lon: self.longitude,
            city: self.city,
            region: self.region,
            country: self.country_code,
            zip: self.postal,
            isp_type: resolve_isp_type(false, security.hosting, org.as_deref()),
            isp: org,
            is_vpn: security.vpn,
            is_proxy: security.proxy,
            is_hosting: security.hosting,
        })
    }
}

/// ipwho.is provider.
pub struct IpwhoisProvider {
    id: String,
    endpoint: HttpEndpoint,
    reliability: f64,
}

impl IpwhoisProvider {
    pub fn new(id: impl Into<String>, endpoint: HttpEndpoint, reliability: f64) -> Self {
        Self {
            id: id.into(),
            endpoint,
            reliability,
        }
    }
}

#[async_trait]
impl GeoProvider for IpwhoisProvider {
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
        let response: IpwhoisResponse = self.endpoint.get_json(&format!("/{}", ip), &[]).await?;
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
            "ip": "177.10.10.10", "success": true, "country_code": "BR",
            "region": "Pernambuco", "city": "Recife", "postal": "50000-000",
            "latitude": -8.0476, "longitude": -34.877,
            "connection": {"asn": 28126, "org": "Brisanet", "isp": "Brisanet Servicos"}
        }"#;
        let response: IpwhoisResponse = serde_json::from_str(body).unwrap();
        let reading = response.normalize().unwrap();
        assert_eq!(reading.city.as_deref(), Some("Recife"));
        assert_eq!(reading.isp.as_deref(), Some("Brisanet Servicos"));
        assert_eq!(reading.isp_type, IspType::Fixed);
        assert!(!reading.is_vpn);
    }

    #[test]
    fn test_normalize_security_flags() {
        let body = r#"{
            "success": true, "latitude": 50.11, "longitude": 8.68,
            "security": {"anonymous": true, "vpn": true, "proxy": false, "hosting": true}
        }"#;
        let response: IpwhoisResponse = serde_json::from_str(body).unwrap();
        let reading = response.normalize().unwrap();
        assert!(reading.is_vpn);
        assert!(reading.is_hosting);
        assert_eq!(reading.isp_type, IspType::Hosting);
    }

    #[test]
    fn test_normalize_failure() {
        let body = r#"{"ip": "192.168.0.1", "success": false, "message": "Reserved range"}"#;
        let response: IpwhoisResponse = serde_json::from_str(body).unwrap();
        assert!(matches!(
            response.normalize(),
            Err(ProviderError::Rejected(msg)) if msg == "Reserved range"
        ));
    }
}
