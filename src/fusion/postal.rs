//! Postal code cross-validation.

use std::collections::BTreeMap;

use crate::sources::normalize::normalize_zip;
use crate::sources::SourceObservation;

/// Returns the postal code corroborated by two or more in-cluster sources.
///
/// Codes are compared after normalization. When several codes are
/// corroborated, the most reported wins; ties go to the lexicographically
/// smallest. Only ever evidence: never moves the coordinate.
pub fn confirm_zip(observations: &[SourceObservation], cluster: &[usize]) -> Option<String> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for idx in cluster {
        if let Some(zip) = observations[*idx].zip.as_deref().and_then(normalize_zip) {
            *counts.entry(zip).or_insert(0) += 1;
        }
    }

    // keys compare reversed so the smallest code wins a count tie
    counts
        .into_iter()
        .filter(|(_, count)| *count >= 2)
        .max_by(|(a_zip, a), (b_zip, b)| a.cmp(b).then(b_zip.cmp(a_zip)))
        .map(|(zip, _)| zip)
}
