//! Country consistency filter.
//!
//! The majority country is a plurality vote among successful observations
//! that report a country. A vote only counts when at least two sources agree
//! on it; otherwise nothing is filtered.

use std::collections::BTreeMap;

use crate::sources::SourceObservation;

/// Minimum number of sources that must share a country before it can filter.
const MIN_COUNTRY_VOTES: usize = 2;

#[derive(Debug)]
struct Tally<'a> {
    votes: usize,
    earliest_latency_ms: u64,
    earliest_source: &'a str,
}

/// Returns the majority country among successful observations, if any.
///
/// Ties between equally popular countries go to the one reported by the
/// earliest-responding source (lowest latency, then source id).
pub fn majority_country<'a, I>(observations: I) -> Option<String>
where
    I: IntoIterator<Item = &'a SourceObservation>,
{
    let mut tallies: BTreeMap<&str, Tally<'_>> = BTreeMap::new();
    for obs in observations {
        if !obs.fetch_succeeded() {
            continue;
        }
        let Some(country) = obs.country.as_deref() else {
            continue;
        };
        let tally = tallies.entry(country).or_insert(Tally {
            votes: 0,
            earliest_latency_ms: obs.latency_ms,
            earliest_source: &obs.source,
        });
        tally.votes += 1;
        if (obs.latency_ms, obs.source.as_str())
            < (tally.earliest_latency_ms, tally.earliest_source)
        {
            tally.earliest_latency_ms = obs.latency_ms;
            tally.earliest_source = &obs.source;
        }
    }

    tallies
        .into_iter()
        .filter(|(_, tally)| tally.votes >= MIN_COUNTRY_VOTES)
        .min_by(|(a_country, a), (b_country, b)| {
            b.votes
                .cmp(&a.votes)
                .then(a.earliest_latency_ms.cmp(&b.earliest_latency_ms))
                .then(a.earliest_source.cmp(b.earliest_source))
                .then(a_country.cmp(b_country))
        })
        .map(|(country, _)| country.to_string())
}

/// Flags observations whose country disagrees with the majority.
///
/// Returns one flag per observation. Failed fetches and observations without
/// a country are never flagged.
pub fn filter_by_country(observations: &[SourceObservation]) -> Vec<bool> {
    let Some(majority) = majority_country(observations) else {
        return vec![false; observations.len()];
    };
    log::trace!("Majority country: {}", majority);
    observations
        .iter()
        .map(|obs| {
            obs.fetch_succeeded()
                && obs
                    .country
                    .as_deref()
                    .is_some_and(|country| country != majority)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error_handling::ProviderError;

    fn obs(source: &str, country: &str, latency_ms: u64) -> SourceObservation {
        SourceObservation::located(source, -23.5, -46.6)
            .with_country(country)
            .with_latency_ms(latency_ms)
    }

    #[test]
    fn test_majority_simple() {
        let observations = vec![obs("a", "BR", 10), obs("b", "BR", 20), obs("c", "AR", 5)];
        assert_eq!(majority_country(&observations).as_deref(), Some("BR"));
        assert_eq!(filter_by_country(&observations), vec![false, false, true]);
    }

    #[test]
    fn test_all_distinct_skips_filter() {
        let observations = vec![obs("a", "BR", 10), obs("b", "AR", 20), obs("c", "UY", 5)];
        assert!(majority_country(&observations).is_none());
        assert_eq!(filter_by_country(&observations), vec![false; 3]);
    }

    #[test]
    fn test_tie_goes_to_earliest_responder() {
        let observations = vec![
            obs("a", "BR", 50),
            obs("b", "BR", 60),
            obs("c", "AR", 40),
            obs("d", "AR", 70),
        ];
        assert_eq!(majority_country(&observations).as_deref(), Some("AR"));
    }

    #[test]
    fn test_tie_on_latency_goes_to_source_id() {
        let observations = vec![
            obs("zeta", "BR", 10),
            obs("beta", "BR", 90),
            obs("alpha", "AR", 10),
            obs("gamma", "AR", 90),
        ];
        assert_eq!(majority_country(&observations).as_deref(), Some("AR"));
    }

    #[test]
    fn test_missing_country_and_failures_never_filtered() {
        let observations = vec![
            obs("a", "BR", 10),
            obs("b", "BR", 20),
            SourceObservation::located("c", -23.5, -46.6),
            SourceObservation::failed("d", 1.0, 5, ProviderError::HttpStatus(503)),
        ];
        assert_eq!(filter_by_country(&observations), vec![false; 4]);
    }

    #[test]
    fn test_filter_is_idempotent() {
        let observations = vec![
            obs("a", "BR", 10),
            obs("b", "BR", 20),
            obs("c", "AR", 5),
            obs("d", "US", 1),
        ];
        let flags = filter_by_country(&observations);
        let survivors: Vec<SourceObservation> = observations
            .iter()
            .zip(&flags)
            .filter(|(_, filtered)| !**filtered)
            .map(|(o, _)| o.clone())
            .collect();
        assert_eq!(
            majority_country(&survivors),
            majority_country(&observations)
        );
        assert!(filter_by_country(&survivors).iter().all(|f| !f));
    }
}
