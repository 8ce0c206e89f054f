//! Consensus clustering.
//!
//! Two observations agree when they are within the agreement distance. The
//! consensus cluster is the largest connected component of that graph.

use std::cmp::Ordering;

use crate::sources::SourceObservation;

/// Mean distances closer than this are considered equal.
const MEAN_DISTANCE_EPSILON_KM: f64 = 1e-9;

struct Component {
    /// Observation indices, sorted by source id
    members: Vec<usize>,
    /// Sorted source ids, the last tie-breaker
    sources: Vec<String>,
    mean_internal_km: f64,
}

impl Component {
    fn new(mut members: Vec<usize>, observations: &[SourceObservation]) -> Self {
        members.sort_by(|a, b| {
            observations[*a]
                .source
                .cmp(&observations[*b].source)
                .then(a.cmp(b))
        });
        let sources = members
            .iter()
            .map(|idx| observations[*idx].source.clone())
            .collect();
        let coords: Vec<_> = members
            .iter()
            .filter_map(|idx| observations[*idx].coordinate)
            .collect();
        let mut total = 0.0;
        let mut pairs = 0usize;
        for (i, a) in coords.iter().enumerate() {
            for b in &coords[i + 1..] {
                total += a.distance_km(b);
                pairs += 1;
            }
        }
        let mean_internal_km = if pairs == 0 { 0.0 } else { total / pairs as f64 };
        Self {
            members,
            sources,
            mean_internal_km,
        }
    }

    /// Orders components best-first.
    fn rank(&self, other: &Self) -> Ordering {
        other
            .members
            .len()
            .cmp(&self.members.len())
            .then_with(|| {
                let diff = self.mean_internal_km - other.mean_internal_km;
                if diff.abs() <= MEAN_DISTANCE_EPSILON_KM {
                    Ordering::Equal
                } else if diff < 0.0 {
                    Ordering::Less
                } else {
                    Ordering::Greater
                }
            })
            .then_with(|| self.sources.cmp(&other.sources))
    }
}

fn find(parent: &mut [usize], mut x: usize) -> usize {
    while parent[x] != x {
        parent[x] = parent[parent[x]];
        x = parent[x];
    }
    x
}

/// Returns the indices of the consensus cluster among `candidates`.
///
/// `candidates` are indices into `observations` of successful, unfiltered
/// observations. A single candidate is its own cluster. With two or more
/// candidates and no pair in agreement the result is empty: there is no
/// consensus. The returned indices are sorted ascending and do not depend on
/// the order of `candidates`.
pub fn find_consensus_cluster(
    observations: &[SourceObservation],
    candidates: &[usize],
    agreement_km: f64,
) -> Vec<usize> {
    let located: Vec<usize> = candidates
        .iter()
        .copied()
        .filter(|idx| observations[*idx].coordinate.is_some())
        .collect();

    match located.len() {
        0 => return Vec::new(),
        1 => return located,
        _ => {}
    }

    let mut parent: Vec<usize> = (0..located.len()).collect();
    for i in 0..located.len() {
        for j in (i + 1)..located.len() {
            let (Some(a), Some(b)) = (
                observations[located[i]].coordinate,
                observations[located[j]].coordinate,
            ) else {
                continue;
            };
            if a.distance_km(&b) <= agreement_km {
                let (ri, rj) = (find(&mut parent, i), find(&mut parent, j));
                if ri != rj {
                    parent[ri] = rj;
                }
            }
        }
    }

    let mut groups: Vec<Vec<usize>> = vec![Vec::new(); located.len()];
    for (i, idx) in located.iter().enumerate() {
        let root = find(&mut parent, i);
        groups[root].push(*idx);
    }

    let best = groups
        .into_iter()
        .filter(|g| !g.is_empty())
        .map(|g| Component::new(g, observations))
        .min_by(|a, b| a.rank(b));

    match best {
        Some(component) if component.members.len() >= 2 => {
            let mut members = component.members;
            members.sort_unstable();
            members
        }
        _ => {
            log::debug!(
                "No two of {} sources agree within {} km",
                located.len(),
                agreement_km
            );
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn observations(points: &[(&str, f64, f64)]) -> Vec<SourceObservation> {
        points
            .iter()
            .map(|(source, lat, lon)| SourceObservation::located(*source, *lat, *lon))
            .collect()
    }

    fn all(obs: &[SourceObservation]) -> Vec<usize> {
        (0..obs.len()).collect()
    }

    fn sources(obs: &[SourceObservation], idx: &[usize]) -> Vec<String> {
        let mut s: Vec<String> = idx.iter().map(|i| obs[*i].source.clone()).collect();
        s.sort();
        s
    }

    #[test]
    fn test_single_candidate_is_cluster() {
        let obs = observations(&[("a", -23.5, -46.6)]);
        assert_eq!(find_consensus_cluster(&obs, &all(&obs), 5.0), vec![0]);
    }

    #[test]
    fn test_no_candidates() {
        let obs = observations(&[("a", -23.5, -46.6)]);
        assert!(find_consensus_cluster(&obs, &[], 5.0).is_empty());
    }

    #[test]
    fn test_outlier_excluded() {
        let obs = observations(&[
            ("a", -23.550, -46.633),
            ("b", -23.555, -46.640),
            ("c", -23.545, -46.630),
            ("d", -22.906, -43.172),
        ]);
        let cluster = find_consensus_cluster(&obs, &all(&obs), 5.0);
        assert_eq!(cluster, vec![0, 1, 2]);
    }

    #[test]
    fn test_chain_is_connected() {
        // a-b and b-c agree, a-c do not: still one component
        let obs = observations(&[("a", 0.0, 10.0), ("b", 0.0, 10.04), ("c", 0.0, 10.08)]);
        let cluster = find_consensus_cluster(&obs, &all(&obs), 5.0);
        assert_eq!(cluster.len(), 3);
    }

    #[test]
    fn test_no_consensus_when_all_far_apart() {
        let obs = observations(&[
            ("a", -23.55, -46.63),
            ("b", -22.90, -43.17),
            ("c", -19.92, -43.94),
        ]);
        assert!(find_consensus_cluster(&obs, &all(&obs), 5.0).is_empty());
    }

    #[test]
    fn test_equal_size_prefers_tighter_component() {
        let obs = observations(&[
            ("a", -23.5500, -46.6300),
            ("b", -23.5600, -46.6300),
            ("c", -22.9000, -43.1700),
            ("d", -22.9300, -43.1700),
        ]);
        let cluster = find_consensus_cluster(&obs, &all(&obs), 5.0);
        assert_eq!(sources(&obs, &cluster), vec!["a", "b"]);
    }

    #[test]
    fn test_equal_components_break_on_source_ids() {
        let obs = observations(&[
            ("x", 10.0, 10.0),
            ("y", 10.0, 10.01),
            ("b", 10.0, 50.0),
            ("c", 10.0, 50.01),
        ]);
        let cluster = find_consensus_cluster(&obs, &all(&obs), 5.0);
        assert_eq!(sources(&obs, &cluster), vec!["b", "c"]);
    }

    proptest! {
        #[test]
        fn prop_cluster_independent_of_order(
            points in prop::collection::vec((-60.0f64..60.0, -170.0f64..170.0), 1..8),
            seed in any::<u64>(),
        ) {
            let named: Vec<(String, f64, f64)> = points
                .iter()
                .enumerate()
                .map(|(i, (lat, lon))| (format!("src{}", i), *lat, *lon))
                .collect();
            let obs: Vec<SourceObservation> = named
                .iter()
                .map(|(s, lat, lon)| SourceObservation::located(s.as_str(), *lat, *lon))
                .collect();
            let mut shuffled: Vec<SourceObservation> = obs.clone();
            let len = shuffled.len();
            shuffled.rotate_left((seed as usize) % len);
            shuffled.reverse();

            let a = find_consensus_cluster(&obs, &all(&obs), 500.0);
            let b = find_consensus_cluster(&shuffled, &all(&shuffled), 500.0);
            prop_assert_eq!(sources(&obs, &a), sources(&shuffled, &b));
        }
    }
}
