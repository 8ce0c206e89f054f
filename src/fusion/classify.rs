//! Confidence tier and accuracy label classification.
//!
//! Both are pure functions of the same [`Evidence`], so every caller that
//! classifies an estimate gets the same answer.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, EnumIter as EnumIterMacro};

use crate::config::TierThresholds;
use crate::sources::IspType;

/// How much the published coordinate can be trusted, lowest first.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    AsRefStr,
    EnumIterMacro,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum ConfidenceTier {
    SingleSource,
    Media,
    Alta,
    MuitoAlta,
    Exata,
}

/// Human-facing description of how the estimate was obtained.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsRefStr, EnumIterMacro,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum AccuracyLabel {
    /// Three or more sources within the tight radius
    Triangulado,
    /// Postal code corroborated by two or more sources
    CepConfirmado,
    /// Agreeing sources within the city radius
    CidadeConfirmada,
    /// Agreeing sources, but spread wider than a city
    RegiaoAproximada,
    /// Only one source placed the address
    FonteUnica,
    /// Sources answered but none agreed
    SemConsenso,
    /// No provider answered
    Indisponivel,
}

/// Statistics the classifiers decide on.
#[derive(Debug, Clone, PartialEq)]
pub struct Evidence {
    pub sources_succeeded: usize,
    pub sources_agree: usize,
    /// Largest pairwise distance inside the consensus cluster (km)
    pub max_divergence_km: f64,
    pub zip_confirmed: bool,
    pub isp_type: IspType,
}

fn tier_without_zip(evidence: &Evidence, thresholds: &TierThresholds) -> ConfidenceTier {
    let triangulated = evidence.sources_agree >= thresholds.triangulation_min_sources;
    if triangulated && evidence.max_divergence_km <= thresholds.tight_km {
        ConfidenceTier::MuitoAlta
    } else if triangulated && evidence.max_divergence_km <= thresholds.city_km {
        ConfidenceTier::Alta
    } else if evidence.sources_agree >= 2 {
        ConfidenceTier::Media
    } else {
        ConfidenceTier::SingleSource
    }
}

fn tier_with_zip(evidence: &Evidence, thresholds: &TierThresholds) -> ConfidenceTier {
    let triangulated = evidence.sources_agree >= thresholds.triangulation_min_sources;
    if triangulated && evidence.max_divergence_km <= thresholds.tight_km {
        ConfidenceTier::Exata
    } else if evidence.sources_agree >= 2 && evidence.max_divergence_km <= thresholds.city_km {
        ConfidenceTier::Alta
    } else {
        tier_without_zip(evidence, thresholds)
    }
}

/// Assigns the confidence tier.
///
/// A confirmed postal code can only raise the tier; mobile carriers are
/// capped at `alta` because their addresses geolocate to carrier hubs.
pub fn classify_confidence(evidence: &Evidence, thresholds: &TierThresholds) -> ConfidenceTier {
    if evidence.sources_succeeded <= 1 || evidence.sources_agree <= 1 {
        return ConfidenceTier::SingleSource;
    }

    let base = tier_without_zip(evidence, thresholds);
    let tier = if evidence.zip_confirmed {
        base.max(tier_with_zip(evidence, thresholds))
    } else {
        base
    };

    if evidence.isp_type == IspType::Mobile {
        tier.min(ConfidenceTier::Alta)
    } else {
        tier
    }
}

/// Assigns the accuracy label.
pub fn classify_accuracy(evidence: &Evidence, thresholds: &TierThresholds) -> AccuracyLabel {
    if evidence.sources_succeeded == 0 {
        AccuracyLabel::Indisponivel
    } else if evidence.sources_agree == 0 {
        AccuracyLabel::SemConsenso
    } else if evidence.sources_agree == 1 {
        AccuracyLabel::FonteUnica
    } else if evidence.sources_agree >= thresholds.triangulation_min_sources
        && evidence.max_divergence_km <= thresholds.tight_km
    {
        AccuracyLabel::Triangulado
    } else if evidence.zip_confirmed {
        AccuracyLabel::CepConfirmado
    } else if evidence.max_divergence_km <= thresholds.city_km {
        AccuracyLabel::CidadeConfirmada
    } else {
        AccuracyLabel::RegiaoAproximada
    }
}
