//! Lookup statistics tracking.
//!
//! Thread-safe counters for provider failures and published confidence
//! tiers across a batch of lookups.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use strum::IntoEnumIterator;

use super::types::ProviderFailure;
use crate::estimate::GeoEstimate;
use crate::fusion::ConfidenceTier;

/// Thread-safe lookup statistics.
///
/// Every failure category and tier is initialized to zero on creation, so
/// the maps are never written after construction; share it with `Arc`.
pub struct LookupStats {
    failures: HashMap<ProviderFailure, AtomicUsize>,
    tiers: HashMap<ConfidenceTier, AtomicUsize>,
    located: AtomicUsize,
    unavailable: AtomicUsize,
    rejected_inputs: AtomicUsize,
}

impl Default for LookupStats {
    fn default() -> Self {
        Self::new()
    }
}

impl LookupStats {
    pub fn new() -> Self {
        let mut failures = HashMap::new();
        for failure in ProviderFailure::iter() {
            failures.insert(failure, AtomicUsize::new(0));
        }

        let mut tiers = HashMap::new();
        for tier in ConfidenceTier::iter() {
            tiers.insert(tier, AtomicUsize::new(0));
        }

        LookupStats {
            failures,
            tiers,
            located: AtomicUsize::new(0),
            unavailable: AtomicUsize::new(0),
            rejected_inputs: AtomicUsize::new(0),
        }
    }

    /// Increment a provider failure counter.
    pub fn increment_failure(&self, failure: ProviderFailure) {
        if let Some(counter) = self.failures.get(&failure) {
            counter.fetch_add(1, Ordering::Relaxed);
        } else {
            log::error!(
                "Attempted to increment failure counter for {:?} which is not in the map",
                failure
            );
        }
    }

    /// Records a finished lookup: its tier or unavailability, and every
    /// provider failure it contains.
    pub fn record_estimate(&self, estimate: &GeoEstimate) {
        if estimate.is_located() {
            self.located.fetch_add(1, Ordering::Relaxed);
            if let Some(counter) = self.tiers.get(&estimate.confidence_tier) {
                counter.fetch_add(1, Ordering::Relaxed);
            }
        } else {
            self.unavailable.fetch_add(1, Ordering::Relaxed);
        }
        for entry in &estimate.source_list {
            if let Some(failure) = entry.error {
                self.increment_failure(failure);
            }
        }
    }

    /// Counts an input that was not a valid IP address.
    pub fn increment_rejected_input(&self) {
        self.rejected_inputs.fetch_add(1, Ordering::Relaxed);
    }

    /// Get the count for a failure category.
    pub fn get_failure_count(&self, failure: ProviderFailure) -> usize {
        self.failures
            .get(&failure)
            .map(|c| c.load(Ordering::SeqCst))
            .unwrap_or(0)
    }

    /// Get the number of located estimates published at `tier`.
    pub fn get_tier_count(&self, tier: ConfidenceTier) -> usize {
        self.tiers
            .get(&tier)
            .map(|c| c.load(Ordering::SeqCst))
            .unwrap_or(0)
    }

    pub fn located(&self) -> usize {
        self.located.load(Ordering::SeqCst)
    }

    pub fn unavailable(&self) -> usize {
        self.unavailable.load(Ordering::SeqCst)
    }

    pub fn rejected_inputs(&self) -> usize {
        self.rejected_inputs.load(Ordering::SeqCst)
    }

    /// Total provider failures across all categories.
    pub fn total_failures(&self) -> usize {
        ProviderFailure::iter()
            .map(|f| self.get_failure_count(f))
            .sum()
    }

    /// Total lookups recorded, located or not.
    pub fn total_lookups(&self) -> usize {
        self.located() + self.unavailable()
    }
}
