//! Configuration loading and logging set-up.

use std::sync::Arc;

use flb_client_config::Config;
use ortho_config::{OrthoConfig, OrthoError};
use thiserror::Error;

use crate::telemetry::{self, TelemetryError};

/// Source of the client configuration.
pub trait ConfigLoader: Send + Sync {
    /// Loads the configuration.
    fn load(&self) -> Result<Config, Arc<OrthoError>>;
}

/// Loader reading defaults, files, environment and command line.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemConfigLoader;

impl ConfigLoader for SystemConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Config::load()
    }
}

/// Errors raised before the extension is activated.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// Configuration failed to load.
    #[error("failed to load configuration: {source}")]
    Configuration {
        /// Aggregated loader error.
        #[source]
        source: Arc<OrthoError>,
    },
    /// Logging could not be configured.
    #[error("failed to initialise telemetry: {source}")]
    Telemetry {
        /// Underlying telemetry error.
        #[source]
        source: TelemetryError,
    },
}

/// Loaded configuration with logging in place.
#[derive(Debug)]
pub struct Bootstrapped {
    config: Config,
}

impl Bootstrapped {
    /// Resolved configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }
}

/// Loads configuration through `loader` and installs logging.
///
/// # Errors
///
/// Returns [`BootstrapError::Configuration`] when loading fails and
/// [`BootstrapError::Telemetry`] when the log filter is invalid.
pub fn bootstrap_with(loader: &dyn ConfigLoader) -> Result<Bootstrapped, BootstrapError> {
    let config = loader
        .load()
        .map_err(|source| BootstrapError::Configuration { source })?;
    telemetry::initialise(&config).map_err(|source| BootstrapError::Telemetry { source })?;
    Ok(Bootstrapped { config })
}
