//! Execution mode selected by the host when launching the server.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Mode the host runs the language server in.
///
/// Both modes launch the server with the same run profile; the value is
/// carried so collaborators that attach debug tooling can tell them apart.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, Hash, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum ExecutionMode {
    /// Regular editor session.
    #[default]
    Normal,
    /// Session started under a debugging host.
    Debug,
}

/// Errors encountered while parsing an [`ExecutionMode`] from text.
pub type ExecutionModeParseError = strum::ParseError;
