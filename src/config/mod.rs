//! Application configuration and constants.
//!
//! This module provides:
//! - Configuration constants (timeouts, thresholds, radius model defaults)
//! - Provider configuration (built-in set or JSON file)
//! - CLI option types and engine tunables

mod constants;
mod providers;
mod types;

// Re-export all constants
pub use constants::*;
pub use providers::{
    default_provider_specs, load_provider_specs, validate_provider_specs, ProviderKind,
    ProviderSpec,
};
pub use types::{Config, EngineTunables, LogFormat, LogLevel, RadiusModel, TierThresholds};
