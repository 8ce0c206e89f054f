//! Main application modules.
//!
//! This module provides input collection, progress logging, shutdown
//! handling, and statistics printing used by the batch runner.

pub mod input;
pub mod logging;
pub mod shutdown;
pub mod statistics;

// Re-export public API
pub use input::{collect_inputs, validate_and_normalize_ip};
pub use logging::log_progress;
pub use shutdown::{shutdown_gracefully, spawn_ctrl_c_handler};
pub use statistics::print_lookup_statistics;
