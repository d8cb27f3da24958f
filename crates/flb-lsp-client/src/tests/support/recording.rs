//! Recording doubles for the launcher, protocol client and notifier.

use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use serde_json::{Value, json};
use tokio::sync::Notify;

use crate::adapter::{LaunchError, ProtocolError};
use crate::lifecycle::UserNotifier;
use crate::server::{Launcher, ProtocolClient};
use crate::session::RunProfile;

/// One interaction observed by the doubles.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    /// The launcher was asked to start `command`.
    Launch(PathBuf),
    /// A request was sent.
    Request(String),
    /// A notification was sent.
    Notify(String, Option<Value>),
    /// The client was closed.
    Close,
}

/// How the launcher should misbehave.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchFailure {
    /// The binary cannot be spawned.
    Spawn,
    /// `initialize` returns a server error.
    Handshake,
    /// `shutdown` is never answered.
    UnansweredShutdown,
}

#[derive(Debug, Default)]
struct RecordingState {
    calls: Vec<Call>,
    live: usize,
    failure: Option<LaunchFailure>,
}

/// Launcher handing out [`RecordingClient`]s that share one call log.
#[derive(Debug, Clone, Default)]
pub struct RecordingLauncher {
    shared: Arc<Mutex<RecordingState>>,
    gate: Option<Arc<Notify>>,
}

impl RecordingLauncher {
    /// Launcher whose clients answer the handshake successfully.
    pub fn new() -> Self {
        Self::default()
    }

    /// Launcher that fails in the given way.
    pub fn failing(failure: LaunchFailure) -> Self {
        let launcher = Self::default();
        launcher.state().failure = Some(failure);
        launcher
    }

    /// Launcher that blocks in `launch` until the returned gate is notified.
    pub fn gated() -> (Self, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        let launcher = Self {
            gate: Some(Arc::clone(&gate)),
            ..Self::default()
        };
        (launcher, gate)
    }

    /// Every call recorded so far.
    pub fn calls(&self) -> Vec<Call> {
        self.state().calls.clone()
    }

    /// Methods of the recorded requests and notifications, in order.
    pub fn methods(&self) -> Vec<String> {
        self.state()
            .calls
            .iter()
            .filter_map(|call| match call {
                Call::Request(method) | Call::Notify(method, _) => Some(method.clone()),
                Call::Launch(_) | Call::Close => None,
            })
            .collect()
    }

    /// Number of launched clients that have not been closed.
    pub fn live_processes(&self) -> usize {
        self.state().live
    }

    /// Number of launch attempts.
    pub fn launches(&self) -> usize {
        self.state()
            .calls
            .iter()
            .filter(|call| matches!(call, Call::Launch(_)))
            .count()
    }

    fn state(&self) -> MutexGuard<'_, RecordingState> {
        self.shared.lock().expect("recording state poisoned")
    }
}

#[async_trait]
impl Launcher for RecordingLauncher {
    async fn launch(&self, profile: &RunProfile) -> Result<Box<dyn ProtocolClient>, LaunchError> {
        self.state()
            .calls
            .push(Call::Launch(profile.command().to_path_buf()));
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        let mut state = self.state();
        if state.failure == Some(LaunchFailure::Spawn) {
            return Err(LaunchError::NotFound {
                command: profile.command().to_path_buf(),
                source: io::Error::from(io::ErrorKind::NotFound),
            });
        }
        state.live += 1;
        Ok(Box::new(RecordingClient {
            shared: Arc::clone(&self.shared),
            closed: false,
        }))
    }
}

/// Client double answering like the fluent-bit server.
#[derive(Debug)]
pub struct RecordingClient {
    shared: Arc<Mutex<RecordingState>>,
    closed: bool,
}

impl RecordingClient {
    fn state(&self) -> MutexGuard<'_, RecordingState> {
        self.shared.lock().expect("recording state poisoned")
    }
}

#[async_trait]
impl ProtocolClient for RecordingClient {
    async fn request(&mut self, method: &str, _params: Option<Value>) -> Result<Value, ProtocolError> {
        let failure = {
            let mut state = self.state();
            state.calls.push(Call::Request(method.to_owned()));
            state.failure
        };
        match method {
            "shutdown" if failure == Some(LaunchFailure::UnansweredShutdown) => {
                std::future::pending().await
            }
            "initialize" if failure == Some(LaunchFailure::Handshake) => {
                Err(ProtocolError::Server {
                    code: -32603,
                    message: "initialisation exploded".to_owned(),
                })
            }
            "initialize" => Ok(initialize_result()),
            "textDocument/hover" => Ok(json!({"contents": "Sets the flush interval"})),
            "textDocument/completion" => Ok(json!([{"label": "Flush"}])),
            _ => Ok(Value::Null),
        }
    }

    async fn notify(&mut self, method: &str, params: Option<Value>) -> Result<(), ProtocolError> {
        self.state()
            .calls
            .push(Call::Notify(method.to_owned(), params));
        Ok(())
    }

    async fn close(&mut self) {
        let mut state = self.shared.lock().expect("recording state poisoned");
        state.calls.push(Call::Close);
        if !self.closed {
            self.closed = true;
            state.live -= 1;
        }
    }
}

/// Capabilities advertised by the fluent-bit server.
pub fn initialize_result() -> Value {
    json!({
        "capabilities": {
            "textDocumentSync": 1,
            "completionProvider": {},
            "hoverProvider": true,
            "diagnosticProvider": {
                "interFileDependencies": false,
                "workspaceDiagnostics": false
            }
        },
        "serverInfo": {"name": "fluent-bit-language-server"}
    })
}

/// Notifier remembering every message shown.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    /// Messages shown so far.
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().expect("notifier poisoned").clone()
    }
}

impl UserNotifier for RecordingNotifier {
    fn show_error(&self, message: &str) {
        self.messages
            .lock()
            .expect("notifier poisoned")
            .push(message.to_owned());
    }
}
