//! Per-observation fusion bookkeeping.

use serde::Serialize;

/// What fusion decided about one observation.
///
/// Kept apart from `SourceObservation` so the captured answers stay
/// untouched; one membership exists per observation, in the same order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterMembership {
    /// Member of the consensus cluster
    pub in_cluster: bool,
    /// Excluded for disagreeing with the majority country
    pub country_filtered: bool,
    /// Distance to the final centroid; `None` for failed fetches
    pub distance_to_centroid_km: Option<f64>,
    /// Initial refinement weight (0.0-1.0)
    pub weight: f64,
    /// Weight after the last refinement round
    pub effective_weight: f64,
    /// Down-weighted in at least one refinement round
    pub refined: bool,
}

impl ClusterMembership {
    /// Membership of an observation that has not been placed anywhere yet.
    pub fn excluded(weight: f64) -> Self {
        Self {
            in_cluster: false,
            country_filtered: false,
            distance_to_centroid_km: None,
            weight,
            effective_weight: 0.0,
            refined: false,
        }
    }
}
