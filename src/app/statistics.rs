//! Statistics printing.

use log::info;
use strum::IntoEnumIterator;

use crate::error_handling::{LookupStats, ProviderFailure};
use crate::fusion::ConfidenceTier;

/// Prints confidence tier and provider failure counts to the log.
pub fn print_lookup_statistics(stats: &LookupStats) {
    info!(
        "Lookups: {} located, {} unavailable, {} rejected inputs",
        stats.located(),
        stats.unavailable(),
        stats.rejected_inputs()
    );

    if stats.located() > 0 {
        info!("Confidence tiers:");
        for tier in ConfidenceTier::iter().rev() {
            let count = stats.get_tier_count(tier);
            if count > 0 {
                info!("   {}: {}", tier.as_ref(), count);
            }
        }
    }

    let total_failures = stats.total_failures();
    if total_failures > 0 {
        info!("Provider failures ({} total):", total_failures);
        for failure in ProviderFailure::iter() {
            let count = stats.get_failure_count(failure);
            if count > 0 {
                info!("   {}: {}", failure.as_str(), count);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_print_lookup_statistics_empty() {
        // Should not panic when nothing was recorded
        print_lookup_statistics(&LookupStats::new());
    }

    #[test]
    fn test_print_lookup_statistics_with_failures() {
        let stats = LookupStats::new();
        stats.increment_failure(ProviderFailure::Timeout);
        stats.increment_failure(ProviderFailure::Rejected);
        stats.increment_rejected_input();
        print_lookup_statistics(&stats);
    }
}
