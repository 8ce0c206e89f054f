//! Configuration constants.
//!
//! This module defines the defaults for every tunable of the engine: provider
//! timeouts, clustering and refinement thresholds, confidence tier cutoffs and
//! the uncertainty radius model. All of them can be overridden through
//! [`crate::Config`] or [`crate::EngineTunables`].

/// Version string stamped on every published estimate.
pub const ENGINE_VERSION: &str = concat!("geo_precision/", env!("CARGO_PKG_VERSION"));

// Provider calls
/// Per-provider request timeout in milliseconds.
/// Free-tier providers usually answer in well under a second; 3s leaves room
/// for a cold TLS handshake without letting one provider stall a login.
pub const DEFAULT_PROVIDER_TIMEOUT_MS: u64 = 3_000;
/// TCP connect timeout for the shared HTTP client in milliseconds.
pub const TCP_CONNECT_TIMEOUT_MS: u64 = 1_500;
/// Default reliability (initial IWCR weight) of a provider without an override.
pub const DEFAULT_PROVIDER_RELIABILITY: f64 = 1.0;
/// Weight multiplier for sources that flag the address as VPN, proxy or hosting.
/// Exit nodes report the datacenter, not the user.
pub const ANONYMIZER_WEIGHT_FACTOR: f64 = 0.5;

/// Largest provider response body accepted, in bytes.
/// Real answers are a few hundred bytes; anything near this is hostile.
pub const MAX_PROVIDER_BODY_BYTES: usize = 64 * 1024;
/// Longest text field (city, region, ISP, zip) kept from a provider, in characters.
pub const MAX_TEXT_FIELD_CHARS: usize = 256;
/// Slack added to the slowest provider timeout when no deadline is configured,
/// so a provider's own timeout fires before the fan-out deadline.
pub const DEADLINE_GRACE_MS: u64 = 100;

/// Default User-Agent for provider requests.
pub const DEFAULT_USER_AGENT: &str = concat!("geo_precision/", env!("CARGO_PKG_VERSION"));

// Consensus clustering
/// Two sources agree when they are at most this far apart (small-city scale).
pub const DEFAULT_AGREEMENT_KM: f64 = 5.0;

// Iterative weighted centroid refinement
/// Maximum refinement rounds after the seed centroid.
pub const DEFAULT_IWCR_MAX_ROUNDS: usize = 5;
/// Upper bound accepted for the refinement round cap; every round keeps a snapshot.
pub const MAX_IWCR_ROUNDS: usize = 100;
/// Refinement stops once the centroid moves less than this between rounds.
pub const DEFAULT_IWCR_CONVERGENCE_M: f64 = 10.0;
/// Distance at which a source's effective weight is halved.
/// Defaults to the agreement threshold.
pub const DEFAULT_IWCR_FALLOFF_KM: f64 = DEFAULT_AGREEMENT_KM;

// Confidence tiers
/// Maximum in-cluster divergence for a triangulated (muito-alta/exata) fix.
pub const TIER_TIGHT_KM: f64 = 5.0;
/// Maximum in-cluster divergence for an `alta` fix (city scale).
pub const TIER_CITY_KM: f64 = 25.0;
/// Minimum agreeing sources for triangulation.
pub const TIER_TRIANGULATION_MIN_SOURCES: usize = 3;

// Uncertainty radii
/// Smallest radius ever published; IP geolocation never resolves a street.
pub const RADIUS_FLOOR_M: f64 = 250.0;
/// Single-source fallback band, typical radius ("ISP hub, not user").
pub const SINGLE_SOURCE_P68_M: f64 = 5_000.0;
/// Single-source fallback band, 95th percentile radius.
pub const SINGLE_SOURCE_P95_M: f64 = 15_000.0;
/// Single-source fallback band, worst-case radius.
pub const SINGLE_SOURCE_MAX_M: f64 = 50_000.0;
/// Radius multiplier applied when no postal code was corroborated.
pub const UNCONFIRMED_ZIP_PENALTY: f64 = 1.25;
/// Radius multiplier applied to mobile-carrier addresses.
pub const MOBILE_ISP_PENALTY: f64 = 2.0;

// Batch runs
/// Maximum concurrent lookups in a batch run.
pub const DEFAULT_MAX_CONCURRENCY: usize = 4;

// Environment variables
/// ipinfo.io access token; the ipinfo provider is enabled only when set.
pub const IPINFO_TOKEN_ENV: &str = "IPINFO_TOKEN";
/// Path to a GeoLite2-City `.mmdb` file; the geolite provider is enabled only when set.
pub const GEOLITE_DB_PATH_ENV: &str = "GEOLITE_DB_PATH";
