//! Host binary for the fluent-bit language client.
//!
//! Loads configuration, installs logging, activates the extension and holds
//! the session until a termination signal arrives.

pub mod bootstrap;
pub mod notifier;
pub mod shutdown;
pub mod telemetry;

use std::fmt;
use std::future::Future;
use std::io::{self, Write};
use std::process::ExitCode;
use std::sync::Arc;

use flb_client_config::Config;
use flb_lsp_client::adapter::ProcessLauncher;
use flb_lsp_client::{
    ActivationError, ExtensionLifecycle, Launcher, LifecycleSettings, ResolutionConfig,
    UserNotifier,
};
use tracing::{error, info};

pub use bootstrap::{BootstrapError, Bootstrapped, ConfigLoader, SystemConfigLoader, bootstrap_with};
pub use notifier::{StderrNotifier, WriterNotifier};
pub use telemetry::{TelemetryError, TelemetryHandle};

pub(crate) const CLIENT_TARGET: &str = "flb_client";

/// Activates the extension, waits for `shutdown`, then deactivates.
///
/// # Errors
///
/// Returns the activation failure; nothing is left running in that case.
pub async fn serve<F>(
    config: &Config,
    resolution: ResolutionConfig,
    launcher: Arc<dyn Launcher>,
    notifier: Arc<dyn UserNotifier>,
    shutdown: F,
) -> Result<(), ActivationError>
where
    F: Future<Output = ()>,
{
    let settings = LifecycleSettings::from_config(config);
    let mut lifecycle = ExtensionLifecycle::new(resolution, launcher, notifier, settings);
    let capabilities = lifecycle.activate().await?;
    info!(
        target: CLIENT_TARGET,
        completion = capabilities.supports_completion(),
        hover = capabilities.supports_hover(),
        diagnostics = capabilities.supports_diagnostics(),
        "language client ready"
    );

    shutdown.await;

    if let Some(teardown) = lifecycle.deactivate() {
        teardown.await;
    }
    Ok(())
}

/// Runs the client with the production collaborators.
pub async fn run(loader: &dyn ConfigLoader) -> ExitCode {
    let bootstrapped = match bootstrap_with(loader) {
        Ok(bootstrapped) => bootstrapped,
        Err(bootstrap_error) => {
            report_startup_failure(&mut io::stderr().lock(), &bootstrap_error);
            return ExitCode::FAILURE;
        }
    };
    let config = bootstrapped.config();
    let resolution = ResolutionConfig::from_environment(config.extension_root().as_std_path());
    let launcher = Arc::new(ProcessLauncher::new(config.shutdown_grace()));
    let notifier = Arc::new(StderrNotifier::stderr());

    match serve(config, resolution, launcher, notifier, shutdown::wait_for_signal()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(activation_error) => {
            error!(target: CLIENT_TARGET, error = %activation_error, "activation failed");
            ExitCode::FAILURE
        }
    }
}

/// Writes a failure that happened before logging was installed.
///
/// A failing `writer` is ignored; there is nowhere left to report to.
pub fn report_startup_failure(writer: &mut dyn Write, failure: &dyn fmt::Display) {
    let written = writeln!(writer, "flb-client: {failure}");
    drop(written);
}

#[cfg(test)]
mod tests;
