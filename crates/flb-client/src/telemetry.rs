//! Structured logging for the client binary.

use std::io::{self, IsTerminal};

use flb_client_config::{Config, LogFormat};
use once_cell::sync::OnceCell;
use tracing::Subscriber;
use tracing::subscriber::SetGlobalDefaultError;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::fmt::time::UtcTime;

static INSTALLED: OnceCell<()> = OnceCell::new();

type BoxedSubscriber = Box<dyn Subscriber + Send + Sync>;

/// Proof that logging is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct TelemetryHandle;

/// Errors encountered while configuring logging.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// The configured filter expression does not parse.
    #[error("invalid log filter '{filter}': {message}")]
    Filter {
        /// Filter text from the configuration.
        filter: String,
        /// Parser diagnostic.
        message: String,
    },
    /// Another global subscriber is already installed.
    #[error("failed to install log subscriber: {0}")]
    Subscriber(#[from] SetGlobalDefaultError),
}

/// Installs the global subscriber on first use; later calls are no-ops.
///
/// Records go to stderr so the server's stdio stays untouched.
pub fn initialise(config: &Config) -> Result<TelemetryHandle, TelemetryError> {
    INSTALLED
        .get_or_try_init(|| {
            let subscriber = build_subscriber(config)?;
            tracing::subscriber::set_global_default(subscriber)?;
            Ok::<(), TelemetryError>(())
        })
        .map(|_| TelemetryHandle)
}

pub(crate) fn build_subscriber(config: &Config) -> Result<BoxedSubscriber, TelemetryError> {
    let filter =
        EnvFilter::try_new(config.log_filter()).map_err(|error| TelemetryError::Filter {
            filter: config.log_filter().to_owned(),
            message: error.to_string(),
        })?;
    let builder = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_timer(UtcTime::rfc_3339());

    Ok(match config.log_format() {
        LogFormat::Json => Box::new(builder.json().flatten_event(true).finish()),
        LogFormat::Compact => Box::new(builder.compact().finish()),
    })
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(LogFormat::Json)]
    #[case(LogFormat::Compact)]
    fn builds_subscriber_for_each_format(#[case] log_format: LogFormat) {
        let config = Config {
            log_format,
            log_filter: "flb_lsp_client=debug,info".to_owned(),
            ..Config::default()
        };

        assert!(build_subscriber(&config).is_ok());
    }

    #[rstest]
    fn rejects_malformed_filter() {
        let config = Config {
            log_filter: "flb_lsp_client=loud".to_owned(),
            ..Config::default()
        };

        let error = build_subscriber(&config).err().expect("filter rejected");

        assert!(matches!(error, TelemetryError::Filter { ref filter, .. } if filter == "flb_lsp_client=loud"));
    }
}
