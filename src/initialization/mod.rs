//! Application initialization and resource setup.
//!
//! This module provides functions to initialize all shared resources:
//! - Logger (plain or JSON)
//! - HTTP client shared by the web providers
//! - Provider trait objects built from configuration
//!
//! All initialization functions return proper error types for error handling.

mod client;
mod logger;
mod providers;

// Re-export public API
pub use client::init_client;
pub use logger::init_logger_with;
pub use providers::{build_provider, build_providers};
