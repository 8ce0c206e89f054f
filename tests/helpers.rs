// Shared test helpers for mock providers and engine setup.
//
// Every HTTP provider kind is served from one wiremock server; the kinds use
// distinct paths so their mocks never overlap.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use geo_precision::initialization::build_providers;
use geo_precision::{EngineTunables, GeoEngine, ProviderKind, ProviderSpec};
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TEST_IP: &str = "203.0.113.10";

/// What a mocked provider reports for [`TEST_IP`].
#[derive(Debug, Clone)]
pub struct Fix {
    pub lat: f64,
    pub lon: f64,
    pub country: &'static str,
    pub city: &'static str,
    pub zip: Option<&'static str>,
    pub isp: &'static str,
    pub mobile: bool,
}

impl Fix {
    pub fn new(lat: f64, lon: f64, country: &'static str) -> Self {
        Self {
            lat,
            lon,
            country,
            city: "Sao Paulo",
            zip: None,
            isp: "Vivo Fibra",
            mobile: false,
        }
    }

    pub fn with_zip(mut self, zip: &'static str) -> Self {
        self.zip = Some(zip);
        self
    }

    pub fn mobile(mut self) -> Self {
        self.mobile = true;
        self.isp = "Claro Movel";
        self
    }
}

/// Request path each kind uses for [`TEST_IP`].
pub fn provider_path(kind: ProviderKind) -> String {
    match kind {
        ProviderKind::IpApi => format!("/json/{}", TEST_IP),
        ProviderKind::IpapiCo => format!("/{}/json/", TEST_IP),
        ProviderKind::Ipwhois => format!("/{}", TEST_IP),
        ProviderKind::Ipinfo => format!("/{}/json", TEST_IP),
        ProviderKind::Freeipapi => format!("/api/json/{}", TEST_IP),
        ProviderKind::Geolite => panic!("geolite is not served over HTTP"),
    }
}

/// Response body in the provider's own wire format.
pub fn provider_body(kind: ProviderKind, fix: &Fix) -> Value {
    match kind {
        ProviderKind::IpApi => json!({
            "status": "success",
            "countryCode": fix.country,
            "regionName": "Sao Paulo",
            "city": fix.city,
            "zip": fix.zip.unwrap_or(""),
            "lat": fix.lat,
            "lon": fix.lon,
            "isp": fix.isp,
            "org": fix.isp,
            "mobile": fix.mobile,
            "proxy": false,
            "hosting": false
        }),
        ProviderKind::IpapiCo => json!({
            "latitude": fix.lat,
            "longitude": fix.lon,
            "city": fix.city,
            "region": "Sao Paulo",
            "country_code": fix.country,
            "postal": fix.zip,
            "org": fix.isp
        }),
        ProviderKind::Ipwhois => json!({
            "success": true,
            "latitude": fix.lat,
            "longitude": fix.lon,
            "city": fix.city,
            "region": "Sao Paulo",
            "country_code": fix.country,
            "postal": fix.zip,
            "connection": { "isp": fix.isp, "org": fix.isp }
        }),
        ProviderKind::Ipinfo => json!({
            "loc": format!("{},{}", fix.lat, fix.lon),
            "city": fix.city,
            "region": "Sao Paulo",
            "country": fix.country,
            "postal": fix.zip,
            "org": fix.isp
        }),
        ProviderKind::Freeipapi => json!({
            "latitude": fix.lat,
            "longitude": fix.lon,
            "cityName": fix.city,
            "regionName": "Sao Paulo",
            "countryCode": fix.country,
            "zipCode": fix.zip.unwrap_or(""),
            "isProxy": false
        }),
        ProviderKind::Geolite => panic!("geolite is not served over HTTP"),
    }
}

/// Mounts a successful answer for `kind`.
pub async fn mount_fix(server: &MockServer, kind: ProviderKind, fix: &Fix) {
    mount_response(
        server,
        kind,
        ResponseTemplate::new(200).set_body_json(provider_body(kind, fix)),
    )
    .await;
}

/// Mounts an arbitrary response for `kind`.
pub async fn mount_response(server: &MockServer, kind: ProviderKind, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(provider_path(kind)))
        .respond_with(response)
        .mount(server)
        .await;
}

/// Provider entry pointing `kind` at the mock server.
pub fn mock_spec(server: &MockServer, kind: ProviderKind) -> ProviderSpec {
    ProviderSpec::new(kind).with_base_url(server.uri())
}

/// Tunables with short timeouts so failing tests stay fast.
pub fn test_tunables() -> EngineTunables {
    EngineTunables {
        provider_timeout: Duration::from_secs(2),
        ..Default::default()
    }
}

/// Builds an engine over `specs` with a plain client.
pub fn engine_for(specs: &[ProviderSpec], tunables: EngineTunables) -> GeoEngine {
    let client = Arc::new(reqwest::Client::new());
    let providers = build_providers(specs, &client).expect("Failed to build providers");
    GeoEngine::new(providers, tunables)
}

/// Engine over the given kinds, all served by `server`.
pub fn engine_for_kinds(server: &MockServer, kinds: &[ProviderKind]) -> GeoEngine {
    let specs: Vec<ProviderSpec> = kinds.iter().map(|k| mock_spec(server, *k)).collect();
    engine_for(&specs, test_tunables())
}

/// The five HTTP provider kinds.
pub const HTTP_KINDS: [ProviderKind; 5] = [
    ProviderKind::IpApi,
    ProviderKind::IpapiCo,
    ProviderKind::Ipwhois,
    ProviderKind::Ipinfo,
    ProviderKind::Freeipapi,
];
