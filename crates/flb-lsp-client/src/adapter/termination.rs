//! Process termination for language server children.

use std::time::Duration;

use tokio::process::Child;
use tracing::{debug, warn};

use super::ADAPTER_TARGET;

/// Waits up to `grace` for the child to exit, then kills it.
///
/// The child is always reaped before this returns, so no process outlives
/// the session that spawned it.
pub(super) async fn terminate_child(child: &mut Child, grace: Duration) {
    match tokio::time::timeout(grace, child.wait()).await {
        Ok(Ok(status)) => {
            debug!(
                target: ADAPTER_TARGET,
                ?status,
                "language server exited"
            );
        }
        Ok(Err(error)) => {
            warn!(
                target: ADAPTER_TARGET,
                error = %error,
                "failed to check process status, killing"
            );
            kill(child).await;
        }
        Err(_) => {
            warn!(
                target: ADAPTER_TARGET,
                grace_ms = grace.as_millis(),
                "language server did not exit gracefully, killing"
            );
            kill(child).await;
        }
    }
}

async fn kill(child: &mut Child) {
    if let Err(error) = child.kill().await {
        warn!(
            target: ADAPTER_TARGET,
            error = %error,
            "failed to kill language server"
        );
    }
}
