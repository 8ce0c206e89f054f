//! Source observation data structures.

use serde::{Deserialize, Serialize};

use super::normalize::{clean_country, clean_text};
use crate::config::ANONYMIZER_WEIGHT_FACTOR;
use crate::error_handling::ProviderError;
use crate::geodesy::Coordinate;

/// Connection type of the looked-up address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IspType {
    /// Residential or business fixed line
    Fixed,
    /// Mobile carrier (CGNAT, geolocated to carrier hubs)
    Mobile,
    /// Datacenter, cloud or hosting range
    Hosting,
    /// Provider gave no usable hint
    #[default]
    Unknown,
}

/// What a provider normalizer extracted from one response, before validation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProviderReading {
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub city: Option<String>,
    pub region: Option<String>,
    pub country: Option<String>,
    pub zip: Option<String>,
    pub isp: Option<String>,
    pub isp_type: IspType,
    pub is_vpn: bool,
    pub is_proxy: bool,
    pub is_hosting: bool,
}

/// One provider's answer for one lookup.
///
/// Built once by the fan-out and never modified afterwards; everything the
/// fusion pipeline derives lives in `ClusterMembership`.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceObservation {
    /// Provider identity
    pub source: String,
    /// Validated position; `None` when the fetch failed
    pub coordinate: Option<Coordinate>,
    pub city: Option<String>,
    pub region: Option<String>,
    /// Upper-case ISO 3166-1 alpha-2 code
    pub country: Option<String>,
    pub zip: Option<String>,
    /// ISP or organisation name as reported
    pub isp: Option<String>,
    pub isp_type: IspType,
    pub is_vpn: bool,
    pub is_proxy: bool,
    pub is_hosting: bool,
    /// Prior reliability of the provider (0.0-1.0)
    pub reliability: f64,
    /// Time the provider took to settle
    pub latency_ms: u64,
    /// Why the fetch failed, if it did
    pub error: Option<ProviderError>,
}

impl SourceObservation {
    /// Validates a normalized reading into an observation.
    ///
    /// Missing or impossible coordinates turn the reading into a failure,
    /// never into a zero-valued position.
    pub fn from_reading(
        source: impl Into<String>,
        reliability: f64,
        latency_ms: u64,
        reading: ProviderReading,
    ) -> Self {
        let source = source.into();
        let coordinate = match (reading.lat, reading.lon) {
            (Some(lat), Some(lon)) => Coordinate::checked(lat, lon),
            _ => None,
        };

        let Some(coordinate) = coordinate else {
            let detail = format!("lat={:?} lon={:?}", reading.lat, reading.lon);
            return Self::failed(
                source,
                reliability,
                latency_ms,
                ProviderError::MalformedCoordinates(detail),
            );
        };

        Self {
            source,
            coordinate: Some(coordinate),
            city: clean_text(reading.city),
            region: clean_text(reading.region),
            country: clean_country(reading.country),
            zip: clean_text(reading.zip),
            isp: clean_text(reading.isp),
            isp_type: reading.isp_type,
            is_vpn: reading.is_vpn,
            is_proxy: reading.is_proxy,
            is_hosting: reading.is_hosting,
            reliability: reliability.clamp(0.0, 1.0),
            latency_ms,
            error: None,
        }
    }

    /// An observation recording that the provider was unavailable.
    pub fn failed(
        source: impl Into<String>,
        reliability: f64,
        latency_ms: u64,
        error: ProviderError,
    ) -> Self {
        Self {
            source: source.into(),
            coordinate: None,
            city: None,
            region: None,
            country: None,
            zip: None,
            isp: None,
            isp_type: IspType::Unknown,
            is_vpn: false,
            is_proxy: false,
            is_hosting: false,
            reliability: reliability.clamp(0.0, 1.0),
            latency_ms,
            error: Some(error),
        }
    }

    /// A successful observation at `(lat, lon)` with full reliability.
    ///
    /// Convenience for callers replaying stored observations and for tests.
    pub fn located(source: impl Into<String>, lat: f64, lon: f64) -> Self {
        Self::from_reading(
            source,
            1.0,
            0,
            ProviderReading {
                lat: Some(lat),
                lon: Some(lon),
                ..Default::default()
            },
        )
    }

    /// Sets the reported country.
    pub fn with_country(mut self, country: &str) -> Self {
        self.country = clean_country(Some(country.to_string()));
        self
    }

    /// Sets the reported postal code.
    pub fn with_zip(mut self, zip: &str) -> Self {
        self.zip = clean_text(Some(zip.to_string()));
        self
    }

    /// Sets the reported city.
    pub fn with_city(mut self, city: &str) -> Self {
        self.city = clean_text(Some(city.to_string()));
        self
    }

    /// Sets the connection type.
    pub fn with_isp_type(mut self, isp_type: IspType) -> Self {
        self.isp_type = isp_type;
        self
    }

    /// Sets the provider's response latency.
    pub fn with_latency_ms(mut self, latency_ms: u64) -> Self {
        self.latency_ms = latency_ms;
        self
    }

    /// Sets the provider reliability.
    pub fn with_reliability(mut self, reliability: f64) -> Self {
        self.reliability = reliability.clamp(0.0, 1.0);
        self
    }

    /// Flags the address as a VPN exit.
    pub fn with_vpn(mut self, is_vpn: bool) -> Self {
        self.is_vpn = is_vpn;
        self
    }

    /// True when the provider returned a usable position.
    pub fn fetch_succeeded(&self) -> bool {
        self.coordinate.is_some()
    }

    /// True when the provider flagged the address as VPN, proxy or hosting.
    pub fn is_anonymized(&self) -> bool {
        self.is_vpn || self.is_proxy || self.is_hosting
    }

    /// Starting weight for centroid refinement.
    pub fn initial_weight(&self) -> f64 {
        if !self.fetch_succeeded() {
            return 0.0;
        }
        let factor = if self.is_anonymized() {
            ANONYMIZER_WEIGHT_FACTOR
        } else {
            1.0
        };
        (self.reliability * factor).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_reading_missing_coordinates_is_failure() {
        let obs = SourceObservation::from_reading(
            "ip-api",
            1.0,
            12,
            ProviderReading {
                lat: Some(-23.5),
                lon: None,
                city: Some("Sao Paulo".into()),
                ..Default::default()
            },
        );
        assert!(!obs.fetch_succeeded());
        assert!(obs.city.is_none());
        assert!(matches!(
            obs.error,
            Some(ProviderError::MalformedCoordinates(_))
        ));
    }

    #[test]
    fn test_from_reading_out_of_range_is_failure() {
        let obs = SourceObservation::from_reading(
            "ipwhois",
            1.0,
            5,
            ProviderReading {
                lat: Some(123.0),
                lon: Some(10.0),
                ..Default::default()
            },
        );
        assert!(!obs.fetch_succeeded());
        assert_eq!(obs.initial_weight(), 0.0);
    }

    #[test]
    fn test_from_reading_cleans_fields() {
        let obs = SourceObservation::from_reading(
            "ipapi-co",
            0.9,
            40,
            ProviderReading {
                lat: Some(-23.55),
                lon: Some(-46.63),
                city: Some("  Sao Paulo ".into()),
                country: Some("br".into()),
                zip: Some("".into()),
                ..Default::default()
            },
        );
        assert!(obs.fetch_succeeded());
        assert_eq!(obs.city.as_deref(), Some("Sao Paulo"));
        assert_eq!(obs.country.as_deref(), Some("BR"));
        assert!(obs.zip.is_none());
        assert_eq!(obs.latency_ms, 40);
    }

    #[test]
    fn test_initial_weight_penalizes_anonymizers() {
        let plain = SourceObservation::located("a", -23.5, -46.6);
        let vpn = SourceObservation::located("b", -23.5, -46.6).with_vpn(true);
        assert_eq!(plain.initial_weight(), 1.0);
        assert_eq!(vpn.initial_weight(), ANONYMIZER_WEIGHT_FACTOR);
    }

    #[test]
    fn test_isp_type_serde() {
        assert_eq!(serde_json::to_string(&IspType::Mobile).unwrap(), "\"mobile\"");
        assert_eq!(IspType::default(), IspType::Unknown);
    }
}
