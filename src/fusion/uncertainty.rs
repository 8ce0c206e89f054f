//! Uncertainty radii.
//!
//! With two or more agreeing sources the radii come from the spread of the
//! cluster around its centroid. Below that, the spread says nothing about
//! where the user is, so a fixed conservative band is used instead.

use serde::Serialize;

use crate::config::RadiusModel;
use crate::sources::IspType;

/// Radii around the published coordinate, in meters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UncertaintyRadii {
    /// Typical error (about one sigma)
    pub p68_m: f64,
    pub p95_m: f64,
    /// Worst case
    pub max_m: f64,
}

/// Inputs to the radius model.
#[derive(Debug, Clone)]
pub struct RadiusInputs<'a> {
    /// Final distances of in-cluster members to the centroid (km)
    pub distances_km: &'a [f64],
    pub sources_agree: usize,
    /// Largest pairwise distance across every successful source (km)
    pub global_divergence_km: f64,
    pub zip_confirmed: bool,
    pub isp_type: IspType,
}

/// Linear-interpolated percentile of `values`; `p` in `0.0..=1.0`.
///
/// Returns 0.0 for an empty slice. `values` need not be sorted.
pub fn percentile(values: &[f64], p: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let rank = p.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (rank - lo as f64)
}

/// Computes the published radii.
pub fn estimate_radii(inputs: &RadiusInputs<'_>, model: &RadiusModel) -> UncertaintyRadii {
    let (mut p68, mut p95, mut max) = if inputs.sources_agree >= 2 {
        (
            percentile(inputs.distances_km, 0.68) * 1000.0,
            percentile(inputs.distances_km, 0.95) * 1000.0,
            percentile(inputs.distances_km, 1.0) * 1000.0,
        )
    } else {
        let mut max = model.single_source_max_m;
        if inputs.sources_agree == 0 {
            max = max.max(inputs.global_divergence_km * 1000.0);
        }
        (model.single_source_p68_m, model.single_source_p95_m, max)
    };

    let mut penalty = 1.0;
    if !inputs.zip_confirmed {
        penalty *= model.unconfirmed_zip_penalty;
    }
    if inputs.isp_type == IspType::Mobile {
        penalty *= model.mobile_penalty;
    }
    p68 *= penalty;
    p95 *= penalty;
    max *= penalty;

    let p68 = p68.max(model.floor_m);
    let p95 = p95.max(model.floor_m).max(p68);
    let max = max.max(model.floor_m).max(p95);

    UncertaintyRadii {
        p68_m: p68,
        p95_m: p95,
        max_m: max,
    }
}
