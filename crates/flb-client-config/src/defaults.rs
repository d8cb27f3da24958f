use camino::Utf8PathBuf;

use crate::logging::LogFormat;
use crate::mode::ExecutionMode;

/// Default log filter expression used by the binary.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Default trailing debounce applied to inline hint recomputation.
pub const DEFAULT_HINTS_DEBOUNCE_MS: u64 = 200;

/// Lower bound accepted for the hint debounce window.
pub const MIN_HINTS_DEBOUNCE_MS: u64 = 150;

/// Upper bound accepted for the hint debounce window.
pub const MAX_HINTS_DEBOUNCE_MS: u64 = 300;

/// Default grace period granted to the server after the `exit` notification.
pub const DEFAULT_SHUTDOWN_GRACE_MS: u64 = 200;

/// Owned log filter value used where allocation is required (e.g. serde).
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format for the binary.
pub fn default_log_format() -> LogFormat {
    LogFormat::Compact
}

/// Default execution mode.
pub fn default_execution_mode() -> ExecutionMode {
    ExecutionMode::Normal
}

/// Extension root used when nothing else is configured: the working directory.
pub fn default_extension_root() -> Utf8PathBuf {
    Utf8PathBuf::from(".")
}

/// Default hint debounce in milliseconds.
pub fn default_hints_debounce_ms() -> u64 {
    DEFAULT_HINTS_DEBOUNCE_MS
}

/// Default shutdown grace period in milliseconds.
pub fn default_shutdown_grace_ms() -> u64 {
    DEFAULT_SHUTDOWN_GRACE_MS
}
