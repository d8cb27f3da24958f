//! Output format of the client's own log records.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// How log records are rendered on stderr.
///
/// Accepted as `json` or `compact` in any letter case from files,
/// `FLB_CLIENT_LOG_FORMAT` and `--log-format`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LogFormat {
    /// One flattened JSON object per record, for hosts that collect the
    /// client's stderr.
    Json,
    /// One human-readable line per record.
    #[default]
    Compact,
}

/// Rejection raised when text names no [`LogFormat`].
pub type LogFormatParseError = strum::ParseError;
