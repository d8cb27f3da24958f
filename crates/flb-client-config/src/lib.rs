//! Shared configuration for the fluent-bit language client.
//!
//! Values are layered by `ortho_config`: built-in defaults, then an optional
//! configuration file, then `FLB_CLIENT_*` environment variables, and finally
//! command-line flags. The server-path override is deliberately absent here;
//! the locator reads it from its own environment variable so that an explicit
//! override always wins regardless of how the rest of the client is set up.

mod defaults;
mod logging;
mod mode;

use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

pub use defaults::{
    DEFAULT_HINTS_DEBOUNCE_MS, DEFAULT_LOG_FILTER, DEFAULT_SHUTDOWN_GRACE_MS,
    MAX_HINTS_DEBOUNCE_MS, MIN_HINTS_DEBOUNCE_MS, default_execution_mode, default_extension_root,
    default_hints_debounce_ms, default_log_filter_string, default_log_format,
    default_shutdown_grace_ms,
};
pub use logging::{LogFormat, LogFormatParseError};
pub use mode::{ExecutionMode, ExecutionModeParseError};

/// Client configuration resolved from defaults, files, environment and CLI.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "FLB_CLIENT")]
pub struct Config {
    /// Directory the client was installed into; holds the `server/` bundle.
    #[serde(default = "default_extension_root")]
    #[ortho_config(default = default_extension_root())]
    pub extension_root: Utf8PathBuf,
    /// Tracing filter expression.
    #[serde(default = "default_log_filter_string")]
    #[ortho_config(default = default_log_filter_string())]
    pub log_filter: String,
    /// Output format for log records.
    #[serde(default = "default_log_format")]
    #[ortho_config(default = default_log_format())]
    pub log_format: LogFormat,
    /// Mode the server is launched in.
    #[serde(default = "default_execution_mode")]
    #[ortho_config(default = default_execution_mode())]
    pub execution_mode: ExecutionMode,
    /// Trailing debounce for inline hint recomputation, in milliseconds.
    #[serde(default = "default_hints_debounce_ms")]
    #[ortho_config(default = default_hints_debounce_ms())]
    pub hints_debounce_ms: u64,
    /// Grace period between `exit` and killing the server, in milliseconds.
    #[serde(default = "default_shutdown_grace_ms")]
    #[ortho_config(default = default_shutdown_grace_ms())]
    pub shutdown_grace_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            extension_root: default_extension_root(),
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
            execution_mode: default_execution_mode(),
            hints_debounce_ms: default_hints_debounce_ms(),
            shutdown_grace_ms: default_shutdown_grace_ms(),
        }
    }
}

impl Config {
    /// Directory containing the bundled `server/` folder.
    #[must_use]
    pub fn extension_root(&self) -> &Utf8Path {
        self.extension_root.as_path()
    }

    /// Tracing filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        self.log_filter.as_str()
    }

    /// Output format for log records.
    #[must_use]
    pub fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Mode the server is launched in.
    #[must_use]
    pub fn execution_mode(&self) -> ExecutionMode {
        self.execution_mode
    }

    /// Hint debounce, clamped into the supported window.
    #[must_use]
    pub fn hints_debounce(&self) -> Duration {
        Duration::from_millis(
            self.hints_debounce_ms
                .clamp(MIN_HINTS_DEBOUNCE_MS, MAX_HINTS_DEBOUNCE_MS),
        )
    }

    /// Grace period granted to the server after `exit`.
    #[must_use]
    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }
}
