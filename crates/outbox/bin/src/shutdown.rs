//! Graceful shutdown signaling.
//!
//! Listens for SIGTERM and SIGINT and flips a watch channel the relay
//! checks between poll cycles. A batch already claimed finishes before
//! the process exits.

use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info};

/// Create the shutdown channel. `false` until a signal arrives.
pub fn channel() -> (watch::Sender<bool>, watch::Receiver<bool>) {
    watch::channel(false)
}

/// Spawn the signal listener that trips the channel.
pub fn spawn_signal_listener(tx: watch::Sender<bool>) {
    tokio::spawn(async move {
        let ctrl_c = async {
            match signal::ctrl_c().await {
                Ok(()) => "SIGINT (Ctrl+C)",
                Err(e) => {
                    error!("Failed to register ctrl-c handler: {}", e);
                    "unknown"
                }
            }
        };

        let term = async {
            match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                Ok(mut sig) => {
                    sig.recv().await;
                    "SIGTERM"
                }
                Err(e) => {
                    error!("Failed to register SIGTERM handler: {}", e);
                    "unknown"
                }
            }
        };

        let reason = tokio::select! {
            reason = ctrl_c => reason,
            reason = term => reason,
        };

        info!(reason = %reason, "Shutdown signal received");
        let _ = tx.send(true);
    });
}
