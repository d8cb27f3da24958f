//! Process-backed protocol client and its launcher.

use std::io;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tracing::{debug, warn};

use super::ADAPTER_TARGET;
use super::connection::JsonRpcConnection;
use super::error::{LaunchError, ProtocolError};
use super::termination::terminate_child;
use super::transport::StdioTransport;
use crate::server::{Launcher, ProtocolClient};
use crate::session::RunProfile;

/// Launches the language server as a child process speaking LSP over stdio.
#[derive(Debug, Clone, Copy)]
pub struct ProcessLauncher {
    shutdown_grace: Duration,
}

impl ProcessLauncher {
    /// Creates a launcher that grants `shutdown_grace` after `exit`.
    #[must_use]
    pub fn new(shutdown_grace: Duration) -> Self {
        Self { shutdown_grace }
    }
}

impl Default for ProcessLauncher {
    fn default() -> Self {
        Self::new(Duration::from_millis(200))
    }
}

#[async_trait]
impl Launcher for ProcessLauncher {
    async fn launch(&self, profile: &RunProfile) -> Result<Box<dyn ProtocolClient>, LaunchError> {
        let client = ProcessClient::spawn(profile, self.shutdown_grace)?;
        Ok(Box::new(client))
    }
}

/// A protocol client bound to a spawned language server process.
pub struct ProcessClient {
    child: Child,
    connection: Option<JsonRpcConnection<ChildStdout, ChildStdin>>,
    shutdown_grace: Duration,
}

impl ProcessClient {
    /// Spawns the process described by `profile` with piped stdio.
    ///
    /// # Errors
    ///
    /// Returns [`LaunchError::NotFound`] when the command does not exist and
    /// [`LaunchError::Spawn`] for any other spawn failure.
    pub fn spawn(profile: &RunProfile, shutdown_grace: Duration) -> Result<Self, LaunchError> {
        let command_path = profile.command();
        debug!(
            target: ADAPTER_TARGET,
            command = %command_path.display(),
            args = ?profile.args(),
            "spawning language server process"
        );

        let mut command = Command::new(command_path);
        command
            .args(profile.args())
            .env_clear()
            .envs(profile.environment())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);

        let mut child = command.spawn().map_err(|source| {
            let command = command_path.to_path_buf();
            if source.kind() == io::ErrorKind::NotFound {
                LaunchError::NotFound { command, source }
            } else {
                LaunchError::Spawn { command, source }
            }
        })?;
        let stdin = child
            .stdin
            .take()
            .ok_or(LaunchError::MissingPipe { stream: "stdin" })?;
        let stdout = child
            .stdout
            .take()
            .ok_or(LaunchError::MissingPipe { stream: "stdout" })?;

        debug!(
            target: ADAPTER_TARGET,
            pid = ?child.id(),
            "language server process spawned"
        );

        Ok(Self {
            child,
            connection: Some(JsonRpcConnection::new(StdioTransport::new(stdout, stdin))),
            shutdown_grace,
        })
    }

    fn connection(
        &mut self,
    ) -> Result<&mut JsonRpcConnection<ChildStdout, ChildStdin>, ProtocolError> {
        self.connection.as_mut().ok_or(ProtocolError::Closed)
    }
}

#[async_trait]
impl ProtocolClient for ProcessClient {
    async fn request(&mut self, method: &str, params: Option<Value>) -> Result<Value, ProtocolError> {
        self.connection()?.request(method, params).await
    }

    async fn notify(&mut self, method: &str, params: Option<Value>) -> Result<(), ProtocolError> {
        self.connection()?.notify(method, params).await
    }

    async fn close(&mut self) {
        if let Some(mut connection) = self.connection.take()
            && let Err(error) = connection.close().await
        {
            warn!(
                target: ADAPTER_TARGET,
                error = %error,
                "failed to close language server stdin"
            );
        }
        terminate_child(&mut self.child, self.shutdown_grace).await;
    }
}
