//! Termination signals ending the client's steady state.

use tracing::{info, warn};

use crate::CLIENT_TARGET;

/// Resolves on Ctrl-C, or on `SIGTERM` where available.
pub async fn wait_for_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    () = ctrl_c() => {}
                    _ = terminate.recv() => {
                        info!(target: CLIENT_TARGET, signal = "SIGTERM", "shutdown signal received");
                    }
                }
            }
            Err(error) => {
                warn!(target: CLIENT_TARGET, error = %error, "cannot listen for SIGTERM");
                ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    ctrl_c().await;
}

async fn ctrl_c() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!(target: CLIENT_TARGET, signal = "SIGINT", "shutdown signal received"),
        Err(error) => {
            warn!(target: CLIENT_TARGET, error = %error, "cannot listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    }
}
