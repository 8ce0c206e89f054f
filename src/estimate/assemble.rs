//! Builds the published estimate from fusion output.

use crate::config::{EngineTunables, ENGINE_VERSION};
use crate::fusion::{run_fusion, AccuracyLabel, ClusterMembership, ConfidenceTier, FusionReport};
use crate::sources::{IspType, SourceObservation};

use super::types::{EstimateStatus, GeoEstimate, SourceEntry};

fn source_entry(obs: &SourceObservation, membership: &ClusterMembership) -> SourceEntry {
    SourceEntry {
        source: obs.source.clone(),
        city: obs.city.clone(),
        region: obs.region.clone(),
        country: obs.country.clone(),
        lat: obs.coordinate.map(|c| c.lat),
        lon: obs.coordinate.map(|c| c.lon),
        distance_to_avg_km: membership.distance_to_centroid_km,
        in_cluster: membership.in_cluster,
        weight: membership.weight,
        effective_weight: membership.effective_weight,
        refined: membership.refined,
        vpn: obs.is_anonymized(),
        zip: obs.zip.clone(),
        country_filtered: membership.country_filtered,
        isp: obs.isp.clone(),
        isp_type: obs.isp_type,
        latency_ms: obs.latency_ms,
        available: obs.fetch_succeeded(),
        error: obs.error.as_ref().map(|e| e.failure()),
        error_detail: obs.error.as_ref().map(|e| e.to_string()),
    }
}

impl GeoEstimate {
    /// The estimate published when no provider answered.
    pub fn unavailable(requested_ip: &str, observations: &[SourceObservation]) -> Self {
        let source_list = observations
            .iter()
            .map(|obs| source_entry(obs, &ClusterMembership::excluded(0.0)))
            .collect();
        Self {
            requested_ip: requested_ip.to_string(),
            status: EstimateStatus::Unavailable,
            lat: None,
            lon: None,
            sources_queried: observations.len(),
            sources_succeeded: 0,
            sources_agree: 0,
            source_list,
            confidence_tier: ConfidenceTier::SingleSource,
            accuracy_label: AccuracyLabel::Indisponivel,
            max_divergence_km: 0.0,
            avg_divergence_km: 0.0,
            global_divergence_km: 0.0,
            zip_confirmed: false,
            confirmed_zip: None,
            isp_type: IspType::Unknown,
            vpn_suspected: false,
            estimated_accuracy_m: 0.0,
            p68_radius_m: 0.0,
            p95_radius_m: 0.0,
            max_radius_m: 0.0,
            iwcr_rounds: 0,
            iwcr_convergence_delta_m: 0.0,
            engine_version: ENGINE_VERSION.to_string(),
        }
    }
}

/// Turns fusion output into a `GeoEstimate`. Deterministic.
pub fn assemble(
    requested_ip: &str,
    observations: &[SourceObservation],
    report: &FusionReport,
) -> GeoEstimate {
    let Some(centroid) = report.centroid else {
        return GeoEstimate::unavailable(requested_ip, observations);
    };

    let source_list = observations
        .iter()
        .zip(&report.memberships)
        .map(|(obs, membership)| source_entry(obs, membership))
        .collect();

    GeoEstimate {
        requested_ip: requested_ip.to_string(),
        status: EstimateStatus::Located,
        lat: Some(centroid.lat),
        lon: Some(centroid.lon),
        sources_queried: observations.len(),
        sources_succeeded: report.sources_succeeded,
        sources_agree: report.sources_agree,
        source_list,
        confidence_tier: report.confidence_tier,
        accuracy_label: report.accuracy_label,
        max_divergence_km: report.max_divergence_km,
        avg_divergence_km: report.avg_divergence_km,
        global_divergence_km: report.global_divergence_km,
        zip_confirmed: report.zip_confirmed(),
        confirmed_zip: report.confirmed_zip.clone(),
        isp_type: report.isp_type,
        vpn_suspected: report.vpn_suspected,
        estimated_accuracy_m: report.radii.p68_m,
        p68_radius_m: report.radii.p68_m,
        p95_radius_m: report.radii.p95_m,
        max_radius_m: report.radii.max_m,
        iwcr_rounds: report.iwcr_rounds,
        iwcr_convergence_delta_m: report.iwcr_convergence_delta_m,
        engine_version: ENGINE_VERSION.to_string(),
    }
}

/// Fuses already-captured observations into an estimate.
///
/// Useful for replaying stored provider answers without any network access.
pub fn estimate_from_observations(
    requested_ip: &str,
    observations: &[SourceObservation],
    tunables: &EngineTunables,
) -> GeoEstimate {
    let report = run_fusion(observations, tunables);
    assemble(requested_ip, observations, &report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error_handling::{ProviderError, ProviderFailure};

    #[test]
    fn test_unavailable_estimate() {
        let observations = vec![
            SourceObservation::failed("ip-api", 1.0, 3000, ProviderError::Timeout(3000)),
            SourceObservation::failed("ipwhois", 0.9, 40, ProviderError::HttpStatus(503)),
        ];
        let estimate =
            estimate_from_observations("198.51.100.7", &observations, &EngineTunables::default());
        assert_eq!(estimate.status, EstimateStatus::Unavailable);
        assert_eq!(estimate.sources_queried, 2);
        assert_eq!(estimate.sources_agree, 0);
        assert_eq!(estimate.accuracy_label, AccuracyLabel::Indisponivel);
        assert!(estimate.coordinate().is_none());
        let entry = estimate.source("ipwhois").unwrap();
        assert!(!entry.available);
        assert_eq!(entry.error, Some(ProviderFailure::HttpStatus));
    }

    #[test]
    fn test_located_estimate_fields() {
        let observations = vec![
            SourceObservation::located("a", -23.5505, -46.6333).with_zip("01310-100"),
            SourceObservation::located("b", -23.5520, -46.6350).with_zip("01310-100"),
            SourceObservation::failed("c", 1.0, 5, ProviderError::Transport("refused".into())),
        ];
        let estimate =
            estimate_from_observations("198.51.100.7", &observations, &EngineTunables::default());
        assert!(estimate.is_located());
        assert_eq!(estimate.sources_queried, 3);
        assert_eq!(estimate.sources_succeeded, 2);
        assert_eq!(estimate.sources_agree, 2);
        assert!(estimate.zip_confirmed);
        assert_eq!(estimate.confidence_tier, ConfidenceTier::Alta);
        assert_eq!(estimate.accuracy_label, AccuracyLabel::CepConfirmado);
        assert_eq!(estimate.estimated_accuracy_m, estimate.p68_radius_m);
        assert!(estimate.engine_version.starts_with("geo_precision/"));
        let failed = estimate.source("c").unwrap();
        assert_eq!(failed.error_detail.as_deref(), Some("transport error: refused"));
    }

    #[test]
    fn test_assembly_is_deterministic() {
        let observations = vec![
            SourceObservation::located("a", -23.5505, -46.6333),
            SourceObservation::located("b", -23.5520, -46.6350),
            SourceObservation::located("c", -23.5490, -46.6310),
        ];
        let tunables = EngineTunables::default();
        let first = estimate_from_observations("192.0.2.1", &observations, &tunables);
        let second = estimate_from_observations("192.0.2.1", &observations, &tunables);
        assert_eq!(first, second);
    }

    #[test]
    fn test_json_shape_is_camel_case() {
        let observations = vec![SourceObservation::located("a", -23.5505, -46.6333)];
        let estimate =
            estimate_from_observations("192.0.2.1", &observations, &EngineTunables::default());
        let json = serde_json::to_value(&estimate).unwrap();
        assert_eq!(json["requestedIp"], "192.0.2.1");
        assert_eq!(json["status"], "located");
        assert_eq!(json["confidenceTier"], "single-source");
        assert_eq!(json["accuracyLabel"], "fonte-unica");
        assert_eq!(json["sourceList"][0]["inCluster"], true);
        assert!(json["sourceList"][0]["distanceToAvgKm"].is_number());
        assert!(json.get("p68RadiusM").is_some());
    }
}
