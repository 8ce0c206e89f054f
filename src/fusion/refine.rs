//! Iterative weighted centroid refinement (IWCR).
//!
//! Round 0 seeds a weighted centroid from the cluster's initial weights. Each
//! later round down-weights members by their distance to the previous
//! centroid and recomputes it, until the centroid stops moving or the round
//! cap is hit. Every round yields a new immutable [`RefinementState`].

use crate::geodesy::{weighted_centroid, Coordinate};
use crate::sources::SourceObservation;

/// Distances below this (1 mm) are numerical noise, not disagreement.
const NOISE_KM: f64 = 1e-6;

/// One cluster member's weights within a refinement round.
#[derive(Debug, Clone, PartialEq)]
pub struct MemberWeight {
    /// Index into the observation list
    pub index: usize,
    pub weight: f64,
    pub effective_weight: f64,
    /// Distance to this round's input centroid (km)
    pub distance_km: f64,
    /// Sticky: once down-weighted, stays refined
    pub refined: bool,
}

/// Snapshot of one refinement round.
#[derive(Debug, Clone, PartialEq)]
pub struct RefinementState {
    pub round: usize,
    pub centroid: Coordinate,
    /// How far the centroid moved in this round (m)
    pub delta_m: f64,
    pub members: Vec<MemberWeight>,
}

impl RefinementState {
    /// Seeds round 0 from the cluster's initial weights.
    ///
    /// Returns `None` for an empty cluster. If every member has zero weight
    /// the seed falls back to an unweighted centroid.
    pub fn seed(observations: &[SourceObservation], cluster: &[usize]) -> Option<Self> {
        let members: Vec<MemberWeight> = cluster
            .iter()
            .filter(|idx| observations[**idx].coordinate.is_some())
            .map(|idx| {
                let weight = observations[*idx].initial_weight();
                MemberWeight {
                    index: *idx,
                    weight,
                    effective_weight: weight,
                    distance_km: 0.0,
                    refined: false,
                }
            })
            .collect();

        let centroid = centroid_of(observations, &members)?;
        let members = members
            .into_iter()
            .map(|m| MemberWeight {
                distance_km: distance(observations, m.index, &centroid),
                ..m
            })
            .collect();

        Some(Self {
            round: 0,
            centroid,
            delta_m: 0.0,
            members,
        })
    }

    /// Produces the next round from this one.
    ///
    /// Effective weights are derived from the base weight every round, never
    /// from the previous effective weight.
    pub fn next(&self, observations: &[SourceObservation], falloff_km: f64) -> Self {
        let members: Vec<MemberWeight> = self
            .members
            .iter()
            .map(|m| {
                let d = distance(observations, m.index, &self.centroid);
                let factor = if falloff_km > 0.0 {
                    1.0 / (1.0 + d / falloff_km)
                } else {
                    1.0
                };
                MemberWeight {
                    index: m.index,
                    weight: m.weight,
                    effective_weight: m.weight * factor,
                    distance_km: d,
                    refined: m.refined || (factor < 1.0 && d > NOISE_KM),
                }
            })
            .collect();

        let centroid = centroid_of(observations, &members).unwrap_or(self.centroid);
        let delta_m = self.centroid.distance_m(&centroid);

        Self {
            round: self.round + 1,
            centroid,
            delta_m,
            members,
        }
    }
}

fn distance(observations: &[SourceObservation], index: usize, to: &Coordinate) -> f64 {
    observations[index]
        .coordinate
        .map(|c| c.distance_km(to))
        .unwrap_or(0.0)
}

fn centroid_of(observations: &[SourceObservation], members: &[MemberWeight]) -> Option<Coordinate> {
    let weighted: Vec<(Coordinate, f64)> = members
        .iter()
        .filter_map(|m| observations[m.index].coordinate.map(|c| (c, m.effective_weight)))
        .collect();
    weighted_centroid(&weighted).or_else(|| {
        let unweighted: Vec<(Coordinate, f64)> = weighted.iter().map(|(c, _)| (*c, 1.0)).collect();
        weighted_centroid(&unweighted)
    })
}

/// Full refinement history, seed first.
#[derive(Debug, Clone)]
pub struct RefinementOutcome {
    pub history: Vec<RefinementState>,
}

impl RefinementOutcome {
    /// The converged (or last) state.
    pub fn last(&self) -> &RefinementState {
        // history always holds at least the seed
        &self.history[self.history.len() - 1]
    }

    /// Number of rounds run after the seed.
    pub fn rounds(&self) -> usize {
        self.last().round
    }

    pub fn convergence_delta_m(&self) -> f64 {
        self.last().delta_m
    }
}

/// Runs IWCR over `cluster` until convergence or `max_rounds`.
///
/// A one-member cluster runs zero rounds.
pub fn refine(
    observations: &[SourceObservation],
    cluster: &[usize],
    max_rounds: usize,
    convergence_m: f64,
    falloff_km: f64,
) -> Option<RefinementOutcome> {
    let seed = RefinementState::seed(observations, cluster)?;
    let single = seed.members.len() < 2;
    let mut history = vec![seed];
    if single {
        return Some(RefinementOutcome { history });
    }

    while history.len() <= max_rounds {
        let current = &history[history.len() - 1];
        let next = current.next(observations, falloff_km);
        log::trace!(
            "IWCR round {}: centroid ({:.5}, {:.5}) moved {:.1} m",
            next.round,
            next.centroid.lat,
            next.centroid.lon,
            next.delta_m
        );
        let converged = next.delta_m < convergence_m;
        history.push(next);
        if converged {
            break;
        }
    }

    Some(RefinementOutcome { history })
}
