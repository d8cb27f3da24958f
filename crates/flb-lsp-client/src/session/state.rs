use std::fmt;

/// Lifecycle state of the client session.
///
/// `Stopped` and `Failed` are absorbing: a manager never leaves them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// `start` has not been called.
    #[default]
    NotStarted,
    /// The server is being spawned and initialised.
    Starting,
    /// The handshake completed and the session accepts traffic.
    Running,
    /// Spawning or the handshake failed.
    Failed,
    /// The session was torn down.
    Stopped,
}

impl fmt::Display for SessionState {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::NotStarted => "not-started",
            Self::Starting => "starting",
            Self::Running => "running",
            Self::Failed => "failed",
            Self::Stopped => "stopped",
        };
        formatter.write_str(label)
    }
}
