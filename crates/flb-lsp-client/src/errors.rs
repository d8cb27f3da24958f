//! Error types surfaced by the session and lifecycle layers.

use thiserror::Error;

use crate::adapter::{LaunchError, ProtocolError};
use crate::locator::OverrideRejection;
use crate::session::SessionState;

/// Resolution did not produce a server to launch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ResolutionError {
    /// No override was set and no bundled binary exists for this platform.
    #[error("no language server binary is available for this platform")]
    NotAvailable,

    /// The server-path override could not be used.
    #[error("server path override rejected: {reason}")]
    InvalidOverride {
        /// Why the override was rejected.
        reason: OverrideRejection,
    },
}

/// Errors returned by [`crate::SessionManager`].
#[derive(Debug, Error)]
pub enum SessionError {
    /// `start` was called after the session left `NotStarted`.
    #[error("session cannot start from state {state}")]
    AlreadyStarted {
        /// State observed when `start` was called.
        state: SessionState,
    },

    /// Spawning the server or completing the handshake failed.
    #[error(transparent)]
    Launch(#[from] LaunchError),

    /// A request or notification to the running server failed.
    #[error("protocol exchange failed: {0}")]
    Protocol(#[from] ProtocolError),

    /// The session is not in the `Running` state.
    #[error("session is not running")]
    NotRunning,

    /// The document is not a fluent-bit document.
    #[error("language '{language_id}' is outside the session's document selector")]
    OutOfScope {
        /// Language identifier of the rejected document.
        language_id: String,
    },

    /// `stop` was requested while the launch was in flight.
    #[error("session was stopped before the launch completed")]
    StoppedDuringStart,
}

/// Errors returned by [`crate::ExtensionLifecycle::activate`].
#[derive(Debug, Error)]
pub enum ActivationError {
    /// No server could be resolved; the user has been notified.
    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    /// The session failed to start.
    #[error("language client failed to start: {0}")]
    Launch(#[from] SessionError),

    /// `activate` was called while a session already exists.
    #[error("extension is already active")]
    AlreadyActive,
}
