//! Lookup input collection and IP validation.

use anyhow::{Context, Result};
use log::{info, warn};
use std::net::IpAddr;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

use crate::config::Config;

/// Longest line accepted as an address (an IPv6 literal with zone is well below).
const MAX_INPUT_LENGTH: usize = 64;

/// Validates and normalizes an IP address.
///
/// Trims whitespace and strips IPv6 brackets; returns the canonical textual
/// form. Logs a warning and returns `None` for anything that is not an IPv4
/// or IPv6 address.
pub fn validate_and_normalize_ip(input: &str) -> Option<String> {
    let trimmed = input.trim();
    if trimmed.len() > MAX_INPUT_LENGTH {
        warn!(
            "Skipping input exceeding maximum length ({} > {}): {}...",
            trimmed.len(),
            MAX_INPUT_LENGTH,
            trimmed.chars().take(20).collect::<String>()
        );
        return None;
    }

    let unbracketed = trimmed
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .unwrap_or(trimmed);

    match unbracketed.parse::<IpAddr>() {
        Ok(addr) => Some(addr.to_string()),
        Err(_) => {
            warn!("Skipping invalid IP address: {trimmed}");
            None
        }
    }
}

async fn read_lines<R: AsyncBufRead + Unpin>(reader: R, into: &mut Vec<String>) {
    let mut lines = reader.lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                let trimmed = line.trim();
                if !trimmed.is_empty() && !trimmed.starts_with('#') {
                    into.push(trimmed.to_string());
                }
            }
            Ok(None) => break,
            Err(e) => {
                warn!("Failed to read line from input: {e}");
                break;
            }
        }
    }
}

/// Collects the raw inputs of a run.
///
/// Positional addresses come first, then lines from `--input` (`-` reads
/// stdin). With neither, stdin is read. Blank lines and `#` comments are
/// skipped; validation happens per lookup.
///
/// # Errors
///
/// Returns an error if the input file cannot be opened.
pub async fn collect_inputs(config: &Config) -> Result<Vec<String>> {
    let mut inputs: Vec<String> = config
        .ips
        .iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    match &config.input {
        Some(path) if path.as_os_str() != "-" => {
            let file = tokio::fs::File::open(path)
                .await
                .with_context(|| format!("Failed to open input file {}", path.display()))?;
            read_lines(BufReader::new(file), &mut inputs).await;
        }
        Some(_) => {
            info!("Reading IP addresses from stdin");
            read_lines(BufReader::new(tokio::io::stdin()), &mut inputs).await;
        }
        None if inputs.is_empty() => {
            info!("No addresses given, reading from stdin");
            read_lines(BufReader::new(tokio::io::stdin()), &mut inputs).await;
        }
        None => {}
    }

    Ok(inputs)
}
