//! Concurrent provider fan-out.
//!
//! Every provider is queried at once. Each call has its own timeout and the
//! whole fan-out has a deadline; whatever has not settled by then is
//! abandoned and recorded as `DeadlineExceeded`. Each call owns one result
//! slot, so nothing is shared between in-flight calls.

use std::net::IpAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::stream::FuturesUnordered;
use futures::StreamExt;
use log::{debug, warn};

use super::types::SourceObservation;
use super::GeoProvider;
use crate::config::DEADLINE_GRACE_MS;
use crate::error_handling::ProviderError;

/// Deadline for a fan-out: the explicit one, or the slowest provider timeout
/// plus `DEADLINE_GRACE_MS`.
///
/// The grace period lets the slowest provider's own timeout fire first, so it
/// is recorded as `Timeout` rather than `DeadlineExceeded`.
pub fn effective_deadline(
    providers: &[Arc<dyn GeoProvider>],
    default_timeout: Duration,
    deadline: Option<Duration>,
) -> Duration {
    deadline.unwrap_or_else(|| {
        let slowest = providers
            .iter()
            .map(|p| p.timeout().unwrap_or(default_timeout))
            .max()
            .unwrap_or(default_timeout);
        slowest + Duration::from_millis(DEADLINE_GRACE_MS)
    })
}

/// Queries every provider for `ip` and returns one observation per provider,
/// in provider order.
///
/// Never fails: provider errors, timeouts and stragglers all become
/// observations with `fetch_succeeded() == false`. Dropping the returned
/// future abandons every in-flight call.
pub async fn query_all(
    ip: IpAddr,
    providers: &[Arc<dyn GeoProvider>],
    default_timeout: Duration,
    deadline: Option<Duration>,
) -> Vec<SourceObservation> {
    let budget = effective_deadline(providers, default_timeout, deadline);
    let started = Instant::now();

    let mut slots: Vec<Option<SourceObservation>> = vec![None; providers.len()];

    let mut pending: FuturesUnordered<_> = providers
        .iter()
        .enumerate()
        .map(|(idx, provider)| {
            let provider = Arc::clone(provider);
            async move {
                let timeout = provider.timeout().unwrap_or(default_timeout);
                let call_started = Instant::now();
                let result = match tokio::time::timeout(timeout, provider.lookup(ip)).await {
                    Ok(result) => result,
                    Err(_) => Err(ProviderError::Timeout(timeout.as_millis() as u64)),
                };
                let latency_ms = call_started.elapsed().as_millis() as u64;
                let observation = match result {
                    Ok(reading) => SourceObservation::from_reading(
                        provider.source_id(),
                        provider.reliability(),
                        latency_ms,
                        reading,
                    ),
                    Err(error) => SourceObservation::failed(
                        provider.source_id(),
                        provider.reliability(),
                        latency_ms,
                        error,
                    ),
                };
                (idx, observation)
            }
        })
        .collect();

    let deadline_sleep = tokio::time::sleep(budget);
    tokio::pin!(deadline_sleep);

    loop {
        tokio::select! {
            next = pending.next() => match next {
                Some((idx, observation)) => {
                    match &observation.error {
                        Some(error) => debug!(
                            "{} unavailable for {}: {} ({} ms)",
                            observation.source, ip, error, observation.latency_ms
                        ),
                        None => debug!(
                            "{} answered for {} in {} ms",
                            observation.source, ip, observation.latency_ms
                        ),
                    }
                    slots[idx] = Some(observation);
                }
                None => break,
            },
            _ = &mut deadline_sleep => {
                warn!(
                    "Lookup deadline of {} ms reached for {}, abandoning {} provider(s)",
                    budget.as_millis(),
                    ip,
                    pending.len()
                );
                break;
            }
        }
    }
    drop(pending);

    let elapsed_ms = started.elapsed().as_millis() as u64;
    slots
        .into_iter()
        .zip(providers)
        .map(|(slot, provider)| {
            slot.unwrap_or_else(|| {
                SourceObservation::failed(
                    provider.source_id(),
                    provider.reliability(),
                    elapsed_ms,
                    ProviderError::DeadlineExceeded,
                )
            })
        })
        .collect()
}
