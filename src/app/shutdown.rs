//! Graceful shutdown handling.

use log::warn;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Cancels `cancel` when the process receives Ctrl-C.
///
/// The watcher exits on its own once `cancel` fires for any other reason.
pub fn spawn_ctrl_c_handler(cancel: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                match result {
                    Ok(()) => {
                        warn!("Interrupted, cancelling in-flight lookups");
                        cancel.cancel();
                    }
                    Err(e) => warn!("Failed to listen for Ctrl-C: {}", e),
                }
            }
            _ = cancel.cancelled() => {}
        }
    })
}

/// Stops the background tasks of a run.
pub async fn shutdown_gracefully(cancel: CancellationToken, signal_task: Option<JoinHandle<()>>) {
    cancel.cancel();
    if let Some(task) = signal_task {
        let _ = task.await;
    }
}
