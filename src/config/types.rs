//! Configuration types and CLI options.
//!
//! This module defines enums and structs used for command-line argument parsing
//! and for configuring the engine programmatically.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};

use crate::config::constants::*;
use crate::error_handling::InitializationError;

/// Logging level for the application.
///
/// Controls the verbosity of log output, from most restrictive (Error) to most
/// verbose (Trace).
#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    /// Only error messages
    Error,
    /// Error and warning messages
    Warn,
    /// Error, warning, and informational messages
    Info,
    /// All messages except trace
    Debug,
    /// All messages including trace
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Log output format.
///
/// - `Plain`: Human-readable format with colors (default)
/// - `Json`: Structured JSON format for machine parsing
#[derive(Clone, Debug, ValueEnum)]
pub enum LogFormat {
    /// Human-readable format with colors (default)
    Plain,
    /// Structured JSON format for machine parsing
    Json,
}

/// Engine and CLI configuration.
///
/// Parsed from the command line by the binary, or built directly by library
/// callers with `..Default::default()`.
///
/// # Examples
///
/// ```no_run
/// use geo_precision::Config;
///
/// let config = Config {
///     ips: vec!["203.0.113.7".to_string()],
///     agreement_km: 8.0,
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone, Parser)]
#[command(
    name = "geo_precision",
    about = "Locates IP addresses by fusing several geolocation providers."
)]
pub struct Config {
    /// IP addresses to locate
    #[arg(value_name = "IP")]
    pub ips: Vec<String>,

    /// File with one IP per line ('-' reads stdin). Lines starting with '#' are skipped.
    #[arg(long, short = 'i')]
    pub input: Option<PathBuf>,

    /// JSON file listing the providers to query (defaults to the built-in free providers)
    #[arg(long)]
    pub providers_file: Option<PathBuf>,

    /// Log level: error|warn|info|debug|trace
    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,

    /// Log format: plain|json
    #[arg(long, value_enum, default_value_t = LogFormat::Plain)]
    pub log_format: LogFormat,

    /// Per-provider timeout in milliseconds
    #[arg(long, default_value_t = DEFAULT_PROVIDER_TIMEOUT_MS)]
    pub provider_timeout_ms: u64,

    /// Overall lookup deadline in milliseconds (defaults to the slowest provider timeout)
    #[arg(long)]
    pub deadline_ms: Option<u64>,

    /// Distance in km under which two providers are considered to agree
    #[arg(long, default_value_t = DEFAULT_AGREEMENT_KM)]
    pub agreement_km: f64,

    /// Maximum centroid refinement rounds
    #[arg(long, default_value_t = DEFAULT_IWCR_MAX_ROUNDS)]
    pub iwcr_max_rounds: usize,

    /// Centroid shift in meters under which refinement stops
    #[arg(long, default_value_t = DEFAULT_IWCR_CONVERGENCE_M)]
    pub iwcr_convergence_m: f64,

    /// Maximum concurrent lookups
    #[arg(long, default_value_t = DEFAULT_MAX_CONCURRENCY)]
    pub max_concurrency: usize,

    /// HTTP User-Agent header value
    #[arg(long, default_value = DEFAULT_USER_AGENT)]
    pub user_agent: String,

    /// Pretty-print each estimate instead of one JSON object per line
    #[arg(long)]
    pub pretty: bool,

    /// Print provider and confidence statistics at the end of the run
    #[arg(long)]
    pub show_stats: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ips: Vec::new(),
            input: None,
            providers_file: None,
            log_level: LogLevel::Info,
            log_format: LogFormat::Plain,
            provider_timeout_ms: DEFAULT_PROVIDER_TIMEOUT_MS,
            deadline_ms: None,
            agreement_km: DEFAULT_AGREEMENT_KM,
            iwcr_max_rounds: DEFAULT_IWCR_MAX_ROUNDS,
            iwcr_convergence_m: DEFAULT_IWCR_CONVERGENCE_M,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            pretty: false,
            show_stats: false,
        }
    }
}

impl Config {
    /// Builds the fusion tunables described by this configuration.
    ///
    /// The IWCR falloff follows the agreement threshold so that a source at
    /// the edge of agreement counts half on the next round.
    pub fn tunables(&self) -> EngineTunables {
        EngineTunables {
            agreement_km: self.agreement_km,
            iwcr_max_rounds: self.iwcr_max_rounds,
            iwcr_convergence_m: self.iwcr_convergence_m,
            iwcr_falloff_km: self.agreement_km,
            provider_timeout: Duration::from_millis(self.provider_timeout_ms),
            deadline: self.deadline_ms.map(Duration::from_millis),
            ..Default::default()
        }
    }
}

/// Confidence tier cutoffs.
#[derive(Debug, Clone, PartialEq)]
pub struct TierThresholds {
    /// Maximum in-cluster divergence for `muito-alta` and `exata`
    pub tight_km: f64,
    /// Maximum in-cluster divergence for `alta` (and `cidade-confirmada`)
    pub city_km: f64,
    /// Minimum agreeing sources for triangulation
    pub triangulation_min_sources: usize,
}

impl Default for TierThresholds {
    fn default() -> Self {
        Self {
            tight_km: TIER_TIGHT_KM,
            city_km: TIER_CITY_KM,
            triangulation_min_sources: TIER_TRIANGULATION_MIN_SOURCES,
        }
    }
}

/// Radius model used by the uncertainty estimator.
#[derive(Debug, Clone, PartialEq)]
pub struct RadiusModel {
    /// Smallest radius ever published (m)
    pub floor_m: f64,
    /// Fallback typical radius with fewer than two agreeing sources (m)
    pub single_source_p68_m: f64,
    /// Fallback 95th percentile radius (m)
    pub single_source_p95_m: f64,
    /// Fallback worst-case radius (m)
    pub single_source_max_m: f64,
    /// Multiplier when no postal code was corroborated
    pub unconfirmed_zip_penalty: f64,
    /// Multiplier for mobile-carrier addresses
    pub mobile_penalty: f64,
}

impl Default for RadiusModel {
    fn default() -> Self {
        Self {
            floor_m: RADIUS_FLOOR_M,
            single_source_p68_m: SINGLE_SOURCE_P68_M,
            single_source_p95_m: SINGLE_SOURCE_P95_M,
            single_source_max_m: SINGLE_SOURCE_MAX_M,
            unconfirmed_zip_penalty: UNCONFIRMED_ZIP_PENALTY,
            mobile_penalty: MOBILE_ISP_PENALTY,
        }
    }
}

/// Every knob of the fusion pipeline and the provider fan-out.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineTunables {
    /// Maximum distance between two agreeing sources (km)
    pub agreement_km: f64,
    /// Refinement round cap
    pub iwcr_max_rounds: usize,
    /// Refinement convergence threshold (m)
    pub iwcr_convergence_m: f64,
    /// Distance at which a source's effective weight is halved (km)
    pub iwcr_falloff_km: f64,
    /// Timeout applied to providers without their own
    pub provider_timeout: Duration,
    /// Overall fan-out deadline; `None` means the slowest provider timeout
    pub deadline: Option<Duration>,
    /// Confidence tier cutoffs
    pub tiers: TierThresholds,
    /// Uncertainty radius model
    pub radii: RadiusModel,
}

impl Default for EngineTunables {
    fn default() -> Self {
        Self {
            agreement_km: DEFAULT_AGREEMENT_KM,
            iwcr_max_rounds: DEFAULT_IWCR_MAX_ROUNDS,
            iwcr_convergence_m: DEFAULT_IWCR_CONVERGENCE_M,
            iwcr_falloff_km: DEFAULT_IWCR_FALLOFF_KM,
            provider_timeout: Duration::from_millis(DEFAULT_PROVIDER_TIMEOUT_MS),
            deadline: None,
            tiers: TierThresholds::default(),
            radii: RadiusModel::default(),
        }
    }
}

fn require_positive(name: &str, value: f64) -> Result<(), InitializationError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(InitializationError::TunablesError(format!(
            "{} must be a positive finite number, got {}",
            name, value
        )))
    }
}

impl EngineTunables {
    /// Checks every threshold before the engine uses it.
    ///
    /// Distances must be positive and finite; the round cap is bounded
    /// because every round keeps a refinement snapshot.
    ///
    /// # Errors
    ///
    /// Returns `InitializationError::TunablesError` naming the first bad value.
    pub fn validate(&self) -> Result<(), InitializationError> {
        require_positive("agreement_km", self.agreement_km)?;
        require_positive("iwcr_convergence_m", self.iwcr_convergence_m)?;
        require_positive("iwcr_falloff_km", self.iwcr_falloff_km)?;
        if self.iwcr_max_rounds > MAX_IWCR_ROUNDS {
            return Err(InitializationError::TunablesError(format!(
                "iwcr_max_rounds must be at most {}, got {}",
                MAX_IWCR_ROUNDS, self.iwcr_max_rounds
            )));
        }
        if self.provider_timeout.is_zero() {
            return Err(InitializationError::TunablesError(
                "provider timeout must be greater than zero".to_string(),
            ));
        }
        if self.deadline.is_some_and(|d| d.is_zero()) {
            return Err(InitializationError::TunablesError(
                "deadline must be greater than zero".to_string(),
            ));
        }

        require_positive("tight_km", self.tiers.tight_km)?;
        require_positive("city_km", self.tiers.city_km)?;
        if self.tiers.triangulation_min_sources < 2 {
            return Err(InitializationError::TunablesError(format!(
                "triangulation_min_sources must be at least 2, got {}",
                self.tiers.triangulation_min_sources
            )));
        }

        let radii = &self.radii;
        require_positive("floor_m", radii.floor_m)?;
        require_positive("single_source_p68_m", radii.single_source_p68_m)?;
        require_positive("single_source_p95_m", radii.single_source_p95_m)?;
        require_positive("single_source_max_m", radii.single_source_max_m)?;
        require_positive("unconfirmed_zip_penalty", radii.unconfirmed_zip_penalty)?;
        require_positive("mobile_penalty", radii.mobile_penalty)?;
        Ok(())
    }
}
