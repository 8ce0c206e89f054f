//! Output data structures.

use serde::{Deserialize, Serialize};

use crate::error_handling::ProviderFailure;
use crate::fusion::{AccuracyLabel, ConfidenceTier};
use crate::geodesy::Coordinate;
use crate::sources::IspType;

/// Whether any provider placed the address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EstimateStatus {
    Located,
    Unavailable,
}

/// One provider's row in the published source list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceEntry {
    pub source: String,
    pub city: Option<String>,
    pub region: Option<String>,
    pub country: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    /// Distance to the published coordinate
    pub distance_to_avg_km: Option<f64>,
    pub in_cluster: bool,
    pub weight: f64,
    pub effective_weight: f64,
    pub refined: bool,
    /// Flagged VPN, proxy or hosting
    pub vpn: bool,
    pub zip: Option<String>,
    pub country_filtered: bool,
    pub isp: Option<String>,
    pub isp_type: IspType,
    pub latency_ms: u64,
    /// False when the provider gave no usable answer
    pub available: bool,
    pub error: Option<ProviderFailure>,
    pub error_detail: Option<String>,
}

/// The fused geolocation of one IP address.
///
/// The only public result of a lookup. Every field is derived from the
/// providers' answers; nothing is caller-supplied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoEstimate {
    pub requested_ip: String,
    pub status: EstimateStatus,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub sources_queried: usize,
    pub sources_succeeded: usize,
    pub sources_agree: usize,
    pub source_list: Vec<SourceEntry>,
    pub confidence_tier: ConfidenceTier,
    pub accuracy_label: AccuracyLabel,
    pub max_divergence_km: f64,
    pub avg_divergence_km: f64,
    pub global_divergence_km: f64,
    pub zip_confirmed: bool,
    pub confirmed_zip: Option<String>,
    pub isp_type: IspType,
    pub vpn_suspected: bool,
    pub estimated_accuracy_m: f64,
    pub p68_radius_m: f64,
    pub p95_radius_m: f64,
    pub max_radius_m: f64,
    pub iwcr_rounds: usize,
    pub iwcr_convergence_delta_m: f64,
    pub engine_version: String,
}

impl GeoEstimate {
    pub fn is_located(&self) -> bool {
        self.status == EstimateStatus::Located
    }

    /// Published coordinate, if any.
    pub fn coordinate(&self) -> Option<Coordinate> {
        match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => Some(Coordinate::new(lat, lon)),
            _ => None,
        }
    }

    /// The source-list entry for `source`.
    pub fn source(&self, source: &str) -> Option<&SourceEntry> {
        self.source_list.iter().find(|e| e.source == source)
    }
}
