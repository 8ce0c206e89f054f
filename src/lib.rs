//! geo_precision library: multi-source IP geolocation
//!
//! Queries several IP geolocation providers concurrently, finds the group of
//! providers that agree, refines their weighted centroid, and publishes one
//! [`GeoEstimate`] with a confidence tier, an accuracy label and uncertainty
//! radii.
//!
//! # Example
//!
//! ```no_run
//! use geo_precision::{Config, GeoEngine};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let engine = GeoEngine::from_config(&Config::default())?;
//! let estimate = engine.locate("203.0.113.10").await?;
//! println!(
//!     "{:?},{:?} ({}, ~{:.0} m)",
//!     estimate.lat,
//!     estimate.lon,
//!     estimate.confidence_tier.as_ref(),
//!     estimate.estimated_accuracy_m
//! );
//! # Ok(())
//! # }
//! ```
//!
//! Stored provider answers can be fused without network access through
//! [`estimate_from_observations`].
//!
//! # Requirements
//!
//! Lookups require a Tokio runtime. Fusion itself is synchronous.

mod app;
pub mod config;
mod engine;
pub mod error_handling;
pub mod estimate;
pub mod fusion;
pub mod geodesy;
pub mod initialization;
pub mod sources;

// Re-export public API
pub use config::{Config, EngineTunables, LogFormat, LogLevel, ProviderKind, ProviderSpec};
pub use engine::GeoEngine;
pub use error_handling::{InitializationError, LookupError, LookupStats, ProviderError};
pub use estimate::{estimate_from_observations, EstimateStatus, GeoEstimate, SourceEntry};
pub use fusion::{AccuracyLabel, ConfidenceTier};
pub use run::{run_batch, BatchReport};
pub use sources::{GeoProvider, IspType, ProviderReading, SourceObservation};

// Internal run module (batch lookups from the CLI)
mod run {
    use anyhow::{Context, Result};
    use std::io::Write;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use futures::stream::{self, StreamExt};
    use log::{info, warn};
    use tokio_util::sync::CancellationToken;

    use crate::app::{
        collect_inputs, log_progress, print_lookup_statistics, shutdown_gracefully,
        spawn_ctrl_c_handler, validate_and_normalize_ip,
    };
    use crate::config::Config;
    use crate::engine::GeoEngine;
    use crate::error_handling::{LookupError, LookupStats};
    use crate::estimate::GeoEstimate;

    /// Results of a batch run.
    #[derive(Debug, Clone)]
    pub struct BatchReport {
        /// Number of inputs read
        pub total_inputs: usize,
        /// Lookups that produced a coordinate
        pub located: usize,
        /// Lookups where no provider answered
        pub unavailable: usize,
        /// Inputs that were not IP addresses
        pub rejected: usize,
        /// Lookups abandoned by Ctrl-C
        pub cancelled: usize,
        /// Elapsed time in seconds
        pub elapsed_seconds: f64,
    }

    enum Outcome {
        Estimate(Box<GeoEstimate>),
        Rejected,
        Cancelled,
    }

    fn write_estimate(out: &mut impl Write, estimate: &GeoEstimate, pretty: bool) -> Result<()> {
        let json = if pretty {
            serde_json::to_string_pretty(estimate)
        } else {
            serde_json::to_string(estimate)
        }
        .context("Failed to serialize estimate")?;
        writeln!(out, "{}", json).context("Failed to write estimate")?;
        Ok(())
    }

    /// Locates every input of `config` and prints one JSON estimate per
    /// address to stdout.
    ///
    /// Up to `max_concurrency` lookups run at once; Ctrl-C cancels the
    /// remaining ones.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine cannot be initialized, the input file
    /// cannot be read, or stdout cannot be written.
    pub async fn run_batch(config: Config) -> Result<BatchReport> {
        let engine = Arc::new(
            GeoEngine::from_config(&config).context("Failed to initialize geolocation engine")?,
        );
        let inputs = collect_inputs(&config).await?;
        let total_inputs = inputs.len();
        info!("Locating {} address{}", total_inputs, if total_inputs == 1 { "" } else { "es" });

        let stats = Arc::new(LookupStats::new());
        let completed = Arc::new(AtomicUsize::new(0));
        let cancel = CancellationToken::new();
        let signal_task = spawn_ctrl_c_handler(cancel.clone());
        let start_time = std::time::Instant::now();

        let mut outcomes = stream::iter(inputs)
            .map(|raw| {
                let engine = Arc::clone(&engine);
                let cancel = cancel.clone();
                let completed = Arc::clone(&completed);
                async move {
                    let Some(ip) = validate_and_normalize_ip(&raw) else {
                        return Outcome::Rejected;
                    };
                    let result = engine.locate_with_cancel(&ip, &cancel).await;
                    completed.fetch_add(1, Ordering::SeqCst);
                    match result {
                        Ok(estimate) => Outcome::Estimate(Box::new(estimate)),
                        Err(LookupError::Cancelled) => Outcome::Cancelled,
                        Err(e) => {
                            warn!("Lookup for {} failed: {}", ip, e);
                            Outcome::Rejected
                        }
                    }
                }
            })
            .buffer_unordered(config.max_concurrency.max(1));

        let mut cancelled = 0usize;
        let stdout = std::io::stdout();
        while let Some(outcome) = outcomes.next().await {
            match outcome {
                Outcome::Estimate(estimate) => {
                    stats.record_estimate(&estimate);
                    let mut out = stdout.lock();
                    write_estimate(&mut out, &estimate, config.pretty)?;
                }
                Outcome::Rejected => stats.increment_rejected_input(),
                Outcome::Cancelled => cancelled += 1,
            }
        }
        drop(outcomes);

        shutdown_gracefully(cancel, Some(signal_task)).await;
        log_progress(start_time, &completed, total_inputs);

        if config.show_stats {
            print_lookup_statistics(&stats);
        }

        Ok(BatchReport {
            total_inputs,
            located: stats.located(),
            unavailable: stats.unavailable(),
            rejected: stats.rejected_inputs(),
            cancelled,
            elapsed_seconds: start_time.elapsed().as_secs_f64(),
        })
    }
}
