//! Consensus fusion of provider observations.
//!
//! Pure and synchronous: given the observations of one lookup, decides which
//! sources agree, where the agreeing sources place the address, and how much
//! that position can be trusted. Stages run in order:
//!
//! 1. country consistency filter
//! 2. consensus clustering
//! 3. iterative weighted centroid refinement
//! 4. postal code cross-validation
//! 5. confidence and accuracy classification
//! 6. uncertainty radii

mod classify;
mod cluster;
mod country;
mod membership;
mod postal;
mod refine;
mod uncertainty;

pub use classify::{classify_accuracy, classify_confidence, AccuracyLabel, ConfidenceTier, Evidence};
pub use cluster::find_consensus_cluster;
pub use country::{filter_by_country, majority_country};
pub use membership::ClusterMembership;
pub use postal::confirm_zip;
pub use refine::{refine, MemberWeight, RefinementOutcome, RefinementState};
pub use uncertainty::{estimate_radii, percentile, RadiusInputs, UncertaintyRadii};

use std::cmp::Ordering;

use crate::config::EngineTunables;
use crate::geodesy::{max_pairwise_km, Coordinate};
use crate::sources::{IspType, SourceObservation};

/// Everything fusion concluded about one lookup.
#[derive(Debug, Clone)]
pub struct FusionReport {
    /// One entry per observation, same order
    pub memberships: Vec<ClusterMembership>,
    /// Observation indices in the consensus cluster, ascending
    pub cluster: Vec<usize>,
    /// Published coordinate; `None` only when no provider answered
    pub centroid: Option<Coordinate>,
    /// Source used as best effort when there is no consensus
    pub best_effort: Option<usize>,
    pub sources_succeeded: usize,
    pub sources_agree: usize,
    pub max_divergence_km: f64,
    pub avg_divergence_km: f64,
    pub global_divergence_km: f64,
    pub confirmed_zip: Option<String>,
    pub isp_type: IspType,
    pub vpn_suspected: bool,
    pub iwcr_rounds: usize,
    pub iwcr_convergence_delta_m: f64,
    pub confidence_tier: ConfidenceTier,
    pub accuracy_label: AccuracyLabel,
    pub radii: UncertaintyRadii,
}

impl FusionReport {
    pub fn zip_confirmed(&self) -> bool {
        self.confirmed_zip.is_some()
    }
}

/// The most trusted candidate: highest initial weight, then fastest, then
/// smallest source id.
fn most_trusted(observations: &[SourceObservation], candidates: &[usize]) -> Option<usize> {
    candidates.iter().copied().min_by(|a, b| {
        let (oa, ob) = (&observations[*a], &observations[*b]);
        ob.initial_weight()
            .partial_cmp(&oa.initial_weight())
            .unwrap_or(Ordering::Equal)
            .then(oa.latency_ms.cmp(&ob.latency_ms))
            .then(oa.source.cmp(&ob.source))
    })
}

/// Aggregate connection type: mobile beats hosting beats fixed.
fn aggregate_isp_type<'a>(members: impl Iterator<Item = &'a SourceObservation>) -> IspType {
    let mut seen = IspType::Unknown;
    for obs in members {
        seen = match (seen, obs.isp_type) {
            (_, IspType::Mobile) | (IspType::Mobile, _) => IspType::Mobile,
            (_, IspType::Hosting) | (IspType::Hosting, _) => IspType::Hosting,
            (_, IspType::Fixed) | (IspType::Fixed, _) => IspType::Fixed,
            _ => IspType::Unknown,
        };
    }
    seen
}

/// Runs the full fusion pipeline over one lookup's observations.
pub fn run_fusion(observations: &[SourceObservation], tunables: &EngineTunables) -> FusionReport {
    let succeeded: Vec<usize> = (0..observations.len())
        .filter(|idx| observations[*idx].fetch_succeeded())
        .collect();

    let filtered = filter_by_country(observations);
    let candidates: Vec<usize> = succeeded
        .iter()
        .copied()
        .filter(|idx| !filtered[*idx])
        .collect();
    for (obs, _) in observations.iter().zip(&filtered).filter(|(_, f)| **f) {
        log::info!(
            "Source {} excluded: country {} outside the majority",
            obs.source,
            obs.country.as_deref().unwrap_or("?")
        );
    }

    let cluster = find_consensus_cluster(observations, &candidates, tunables.agreement_km);

    let mut memberships: Vec<ClusterMembership> = observations
        .iter()
        .zip(&filtered)
        .map(|(obs, country_filtered)| ClusterMembership {
            country_filtered: *country_filtered,
            ..ClusterMembership::excluded(obs.initial_weight())
        })
        .collect();

    let mut best_effort = None;
    let mut iwcr_rounds = 0;
    let mut iwcr_convergence_delta_m = 0.0;

    let centroid = match refine(
        observations,
        &cluster,
        tunables.iwcr_max_rounds,
        tunables.iwcr_convergence_m,
        tunables.iwcr_falloff_km,
    ) {
        Some(outcome) => {
            let last = outcome.last();
            for member in &last.members {
                let membership = &mut memberships[member.index];
                membership.in_cluster = true;
                membership.weight = member.weight;
                membership.effective_weight = member.effective_weight;
                membership.refined = member.refined;
            }
            iwcr_rounds = outcome.rounds();
            iwcr_convergence_delta_m = outcome.convergence_delta_m();
            Some(last.centroid)
        }
        None => {
            best_effort = most_trusted(observations, &candidates);
            if candidates.len() >= 2 {
                log::info!(
                    "No consensus among {} sources, publishing the most trusted one",
                    candidates.len()
                );
            }
            best_effort.and_then(|idx| {
                let membership = &mut memberships[idx];
                membership.effective_weight = membership.weight;
                observations[idx].coordinate
            })
        }
    };

    if let Some(center) = centroid {
        for idx in &succeeded {
            memberships[*idx].distance_to_centroid_km =
                observations[*idx].coordinate.map(|c| c.distance_km(&center));
        }
    }

    let cluster_coords: Vec<Coordinate> = cluster
        .iter()
        .filter_map(|idx| observations[*idx].coordinate)
        .collect();
    let all_coords: Vec<Coordinate> = succeeded
        .iter()
        .filter_map(|idx| observations[*idx].coordinate)
        .collect();
    let cluster_distances: Vec<f64> = cluster
        .iter()
        .filter_map(|idx| memberships[*idx].distance_to_centroid_km)
        .collect();

    let max_divergence_km = max_pairwise_km(&cluster_coords);
    let avg_divergence_km = if cluster_distances.is_empty() {
        0.0
    } else {
        cluster_distances.iter().sum::<f64>() / cluster_distances.len() as f64
    };
    let global_divergence_km = max_pairwise_km(&all_coords);

    let confirmed_zip = confirm_zip(observations, &cluster);

    // Without consensus the published position is the best-effort source's,
    // so its connection flags describe it.
    let describing: Vec<usize> = if cluster.is_empty() {
        best_effort.into_iter().collect()
    } else {
        cluster.clone()
    };
    let isp_type = aggregate_isp_type(describing.iter().map(|idx| &observations[*idx]));
    let vpn_suspected = describing
        .iter()
        .any(|idx| observations[*idx].is_anonymized());

    let evidence = Evidence {
        sources_succeeded: succeeded.len(),
        sources_agree: cluster.len(),
        max_divergence_km,
        zip_confirmed: confirmed_zip.is_some(),
        isp_type,
    };
    let confidence_tier = classify_confidence(&evidence, &tunables.tiers);
    let accuracy_label = classify_accuracy(&evidence, &tunables.tiers);
    let radii = estimate_radii(
        &RadiusInputs {
            distances_km: &cluster_distances,
            sources_agree: cluster.len(),
            global_divergence_km,
            zip_confirmed: confirmed_zip.is_some(),
            isp_type,
        },
        &tunables.radii,
    );

    log::debug!(
        "Fusion: {}/{} succeeded, {} agree, tier {}, label {}",
        succeeded.len(),
        observations.len(),
        cluster.len(),
        confidence_tier.as_ref(),
        accuracy_label.as_ref()
    );

    FusionReport {
        memberships,
        sources_agree: cluster.len(),
        cluster,
        centroid,
        best_effort,
        sources_succeeded: succeeded.len(),
        max_divergence_km,
        avg_divergence_km,
        global_divergence_km,
        confirmed_zip,
        isp_type,
        vpn_suspected,
        iwcr_rounds,
        iwcr_convergence_delta_m,
        confidence_tier,
        accuracy_label,
        radii,
    }
}
