//! Progress logging utilities.

use log::info;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Logs how many lookups have completed and at what rate.
pub fn log_progress(start_time: std::time::Instant, completed: &Arc<AtomicUsize>, total: usize) {
    let elapsed_secs = start_time.elapsed().as_secs_f64();
    let done = completed.load(Ordering::SeqCst);
    let rate = if elapsed_secs > 0.0 {
        done as f64 / elapsed_secs
    } else {
        0.0
    };
    info!(
        "Completed {}/{} lookups in {:.2} seconds (~{:.2} lookups/sec)",
        done, total, elapsed_secs, rate
    );
}
