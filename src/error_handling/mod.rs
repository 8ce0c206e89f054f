//! Error handling and lookup statistics.
//!
//! This module provides:
//! - Error type definitions (initialization, per-provider, per-lookup)
//! - Mapping of HTTP failures onto provider error categories
//! - Lookup statistics tracking (provider failures, confidence tiers)
//!
//! Provider errors never fail a lookup; they are recorded on the observation
//! and only counted here.

mod categorization;
mod stats;
mod types;

// Re-export public API
pub use categorization::{categorize_reqwest_error, categorize_status};
pub use stats::LookupStats;
pub use types::{InitializationError, LookupError, ProviderError, ProviderFailure};
