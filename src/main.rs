//! Main application entry point (CLI binary).
//!
//! This is a thin wrapper around the `geo_precision` library that handles:
//! - Command-line argument parsing
//! - Environment variable loading (.env file)
//! - Logger initialization
//! - User-facing summary output
//!
//! Estimates are written to stdout as JSON; everything else goes to stderr.

use anyhow::{Context, Result};
use clap::Parser;
use std::process;

use geo_precision::initialization::init_logger_with;
use geo_precision::{run_batch, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // Load IPINFO_TOKEN / GEOLITE_DB_PATH from .env, trying the current
    // directory first, then the executable's directory
    if dotenvy::dotenv().is_err() {
        if let Ok(exe_path) = std::env::current_exe() {
            if let Some(exe_dir) = exe_path.parent() {
                let env_path = exe_dir.join(".env");
                if env_path.exists() {
                    let _ = dotenvy::from_path(&env_path);
                }
            }
        }
    }

    let config = Config::parse();

    let log_level = config.log_level.clone();
    let log_format = config.log_format.clone();
    init_logger_with(log_level.into(), log_format).context("Failed to initialize logger")?;

    match run_batch(config).await {
        Ok(report) => {
            eprintln!(
                "Located {} of {} address{} ({} unavailable, {} rejected{}) in {:.1}s",
                report.located,
                report.total_inputs,
                if report.total_inputs == 1 { "" } else { "es" },
                report.unavailable,
                report.rejected,
                if report.cancelled > 0 {
                    format!(", {} cancelled", report.cancelled)
                } else {
                    String::new()
                },
                report.elapsed_seconds
            );
            if report.cancelled > 0 {
                process::exit(130);
            }
            Ok(())
        }
        Err(e) => {
            eprintln!("geo_precision error: {:#}", e);
            process::exit(1);
        }
    }
}
