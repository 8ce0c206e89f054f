//! Published lookup results.

mod assemble;
mod types;

pub use assemble::{assemble, estimate_from_observations};
pub use types::{EstimateStatus, GeoEstimate, SourceEntry};
