//! Ownership of the single protocol session.
//!
//! [`SessionManager`] starts the server from a [`SessionConfig`], registers
//! the document selector, sentinel watcher and hints provider, gates document
//! traffic on the session being `Running`, and tears everything down on
//! [`SessionManager::stop`].

mod config;
mod document;
mod selector;
mod state;
mod subscription;

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use flb_client_config::ExecutionMode;
use lsp_types::notification::{
    DidChangeWatchedFiles, Exit, Initialized, Notification as LspNotification,
};
use lsp_types::request::{
    Completion, HoverRequest, Initialize, Request as LspRequest, Shutdown,
};
use lsp_types::{
    ClientCapabilities, ClientInfo, CompletionClientCapabilities, CompletionParams,
    CompletionResponse, DiagnosticClientCapabilities, DidChangeWatchedFilesClientCapabilities,
    DidChangeWatchedFilesParams, FileEvent, Hover, HoverClientCapabilities, HoverParams,
    InitializeParams, InitializeResult, InitializedParams, TextDocumentClientCapabilities,
    TextDocumentSyncClientCapabilities, WorkspaceClientCapabilities,
};
use tokio::sync::{Mutex, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub use config::{RunProfile, SessionConfig};
pub use document::{DocumentEvent, Forwarded};
pub use selector::{CHANGE_WATCH_GLOB, DocumentSelector, FLUENT_BIT_LANGUAGE_ID, FileWatcher};
pub use state::SessionState;
pub use subscription::SubscriptionKind;

use subscription::{Subscription, SubscriptionStack};

use crate::adapter::{LaunchError, ProtocolError};
use crate::errors::SessionError;
use crate::server::{Launcher, ProtocolClient, ServerCapabilitySet};

/// Log target for session operations.
pub(crate) const SESSION_TARGET: &str = "flb_lsp_client::session";

const CLIENT_NAME: &str = "flb-client";

/// How long `stop` waits for the server to answer `shutdown` before sending
/// `exit` regardless.
pub const SHUTDOWN_REQUEST_TIMEOUT: Duration = Duration::from_secs(2);

struct ActiveSession {
    client: Box<dyn ProtocolClient>,
    capabilities: ServerCapabilitySet,
    document_selector: DocumentSelector,
    change_watch: FileWatcher,
    subscriptions: SubscriptionStack,
}

struct Inner {
    launcher: Arc<dyn Launcher>,
    state: watch::Sender<SessionState>,
    stop_requested: AtomicBool,
    active: Mutex<Option<ActiveSession>>,
    hints_token: CancellationToken,
}

/// Owns at most one protocol session for an activation cycle.
///
/// Cloning yields another handle to the same session.
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<Inner>,
}

impl fmt::Debug for SessionManager {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("SessionManager")
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl SessionManager {
    /// Creates a manager in `NotStarted` that launches through `launcher`.
    #[must_use]
    pub fn new(launcher: Arc<dyn Launcher>) -> Self {
        let (state, _) = watch::channel(SessionState::NotStarted);
        Self {
            inner: Arc::new(Inner {
                launcher,
                state,
                stop_requested: AtomicBool::new(false),
                active: Mutex::new(None),
                hints_token: CancellationToken::new(),
            }),
        }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        *self.inner.state.borrow()
    }

    /// Receiver observing every state transition.
    #[must_use]
    pub fn subscribe_state(&self) -> watch::Receiver<SessionState> {
        self.inner.state.subscribe()
    }

    /// Token cancelled when the hints provider subscription is disposed.
    #[must_use]
    pub fn hints_token(&self) -> CancellationToken {
        self.inner.hints_token.clone()
    }

    /// Capabilities advertised by the running server.
    pub async fn capabilities(&self) -> Option<ServerCapabilitySet> {
        self.inner
            .active
            .lock()
            .await
            .as_ref()
            .map(|active| active.capabilities)
    }

    /// Starts the session.
    ///
    /// The manager moves to `Starting` before this returns, so a later
    /// [`stop`](Self::stop) waits for the returned future to settle even if
    /// it has not been polled yet. Dropping the future before it completes
    /// marks the session `Failed`.
    ///
    /// # Errors
    ///
    /// Resolves to [`SessionError::AlreadyStarted`] unless the manager is
    /// `NotStarted`, [`SessionError::Launch`] when the server cannot be
    /// spawned or initialised, and [`SessionError::StoppedDuringStart`] when
    /// `stop` was requested while launching.
    pub fn start(
        &self,
        config: SessionConfig,
        mode: ExecutionMode,
    ) -> impl Future<Output = Result<ServerCapabilitySet, SessionError>> + Send + 'static {
        let mut observed = SessionState::NotStarted;
        let claimed = self.inner.state.send_if_modified(|state| {
            observed = *state;
            if *state == SessionState::NotStarted {
                *state = SessionState::Starting;
                true
            } else {
                false
            }
        });
        let guard = claimed.then(|| StartGuard {
            inner: Arc::clone(&self.inner),
        });

        async move {
            let Some(guard) = guard else {
                return Err(SessionError::AlreadyStarted { state: observed });
            };
            guard.run(config, mode).await
        }
    }

    /// Stops the session. Idempotent and never fails.
    ///
    /// A launch in flight is allowed to settle and its result is torn down.
    /// When a running session is stopped the server receives `shutdown` and
    /// `exit`, and the subscriptions are disposed newest first; the order
    /// used is returned. Every other case returns an empty list.
    ///
    /// A server that never answers `shutdown` is given
    /// [`SHUTDOWN_REQUEST_TIMEOUT`]. Dropping the returned future part way
    /// through still leaves the session `Stopped` with its subscriptions
    /// disposed.
    pub async fn stop(&self) -> Vec<SubscriptionKind> {
        let inner = &self.inner;
        if *inner.state.borrow() == SessionState::Starting {
            inner.stop_requested.store(true, Ordering::SeqCst);
            debug!(target: SESSION_TARGET, "stop requested during launch, waiting");
            let mut states = inner.state.subscribe();
            let settled = states
                .wait_for(|state| *state != SessionState::Starting)
                .await
                .map(|state| *state);
            if let Err(error) = settled {
                warn!(target: SESSION_TARGET, error = %error, "state channel closed during stop");
            }
        }

        let Some(active) = inner.active.lock().await.take() else {
            debug!(target: SESSION_TARGET, state = %self.state(), "stop is a no-op");
            return Vec::new();
        };
        let ActiveSession {
            mut client,
            subscriptions,
            ..
        } = active;
        let mut teardown = Teardown {
            state: &inner.state,
            subscriptions,
        };
        shutdown(client.as_mut()).await;
        let disposed = teardown.subscriptions.dispose_all();
        drop(teardown);
        info!(target: SESSION_TARGET, "language client stopped");
        disposed
    }

    /// Delivers a document notification when the session is running and the
    /// document is a fluent-bit document.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Protocol`] when writing to the server fails.
    pub async fn forward(&self, event: DocumentEvent) -> Result<Forwarded, SessionError> {
        if self.state() != SessionState::Running {
            return Ok(Forwarded::NotRunning);
        }
        let mut guard = self.inner.active.lock().await;
        let Some(active) = guard.as_mut() else {
            return Ok(Forwarded::NotRunning);
        };
        if !active.document_selector.matches(event.language_id()) {
            debug!(
                target: SESSION_TARGET,
                language_id = event.language_id(),
                uri = event.uri().as_str(),
                "ignoring document outside the selector"
            );
            return Ok(Forwarded::OutOfScope);
        }
        let method = event.method();
        let params = event.into_params().map_err(ProtocolError::from)?;
        active.client.notify(method, Some(params)).await?;
        Ok(Forwarded::Sent)
    }

    /// Forwards a file event on the sentinel pattern as
    /// `workspace/didChangeWatchedFiles`.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Protocol`] when writing to the server fails.
    pub async fn file_changed(&self, event: FileEvent) -> Result<Forwarded, SessionError> {
        if self.state() != SessionState::Running {
            return Ok(Forwarded::NotRunning);
        }
        let mut guard = self.inner.active.lock().await;
        let Some(active) = guard.as_mut() else {
            return Ok(Forwarded::NotRunning);
        };
        if !active.change_watch.matches(&event.uri) {
            return Ok(Forwarded::OutOfScope);
        }
        let params = serde_json::to_value(DidChangeWatchedFilesParams {
            changes: vec![event],
        })
        .map_err(ProtocolError::from)?;
        active
            .client
            .notify(DidChangeWatchedFiles::METHOD, Some(params))
            .await?;
        Ok(Forwarded::Sent)
    }

    /// Requests hover information for a fluent-bit document.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NotRunning`], [`SessionError::OutOfScope`] for
    /// other languages, or [`SessionError::Protocol`].
    pub async fn hover(
        &self,
        language_id: &str,
        params: HoverParams,
    ) -> Result<Option<Hover>, SessionError> {
        self.request::<HoverRequest>(language_id, params).await
    }

    /// Requests completions for a fluent-bit document.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NotRunning`], [`SessionError::OutOfScope`] for
    /// other languages, or [`SessionError::Protocol`].
    pub async fn completion(
        &self,
        language_id: &str,
        params: CompletionParams,
    ) -> Result<Option<CompletionResponse>, SessionError> {
        self.request::<Completion>(language_id, params).await
    }

    async fn request<R>(&self, language_id: &str, params: R::Params) -> Result<R::Result, SessionError>
    where
        R: LspRequest,
    {
        if self.state() != SessionState::Running {
            return Err(SessionError::NotRunning);
        }
        let mut guard = self.inner.active.lock().await;
        let active = guard.as_mut().ok_or(SessionError::NotRunning)?;
        if !active.document_selector.matches(language_id) {
            return Err(SessionError::OutOfScope {
                language_id: language_id.to_owned(),
            });
        }
        let params = serde_json::to_value(params).map_err(ProtocolError::from)?;
        let value = active.client.request(R::METHOD, Some(params)).await?;
        serde_json::from_value(value)
            .map_err(ProtocolError::from)
            .map_err(SessionError::from)
    }
}

/// Holds the `Starting` claim; marks the session `Failed` if dropped while
/// the launch is still in flight.
struct StartGuard {
    inner: Arc<Inner>,
}

impl StartGuard {
    async fn run(
        self,
        config: SessionConfig,
        mode: ExecutionMode,
    ) -> Result<ServerCapabilitySet, SessionError> {
        let inner = Arc::clone(&self.inner);
        let mut slot = inner.active.lock().await;
        let profile = config.profile(mode);
        info!(
            target: SESSION_TARGET,
            command = %profile.command().display(),
            mode = %mode,
            "starting language client"
        );

        let (mut client, capabilities) = match launch(inner.launcher.as_ref(), profile).await {
            Ok(launched) => launched,
            Err(error) => {
                warn!(target: SESSION_TARGET, error = %error, "language client failed to start");
                inner.state.send_replace(SessionState::Failed);
                return Err(error.into());
            }
        };

        if inner.stop_requested.load(Ordering::SeqCst) {
            info!(target: SESSION_TARGET, "stop requested during launch, shutting down");
            shutdown(client.as_mut()).await;
            inner.state.send_replace(SessionState::Stopped);
            return Err(SessionError::StoppedDuringStart);
        }

        let mut subscriptions = SubscriptionStack::default();
        subscriptions.push(Subscription::new(SubscriptionKind::DocumentSelector));
        subscriptions.push(Subscription::new(SubscriptionKind::FileWatcher));
        subscriptions.push(Subscription::cancelling(
            SubscriptionKind::HintsProvider,
            inner.hints_token.clone(),
        ));

        *slot = Some(ActiveSession {
            client,
            capabilities,
            document_selector: config.document_selector().clone(),
            change_watch: config.change_watch().clone(),
            subscriptions,
        });
        inner.state.send_replace(SessionState::Running);
        info!(target: SESSION_TARGET, ?capabilities, "language client running");
        Ok(capabilities)
    }
}

impl Drop for StartGuard {
    fn drop(&mut self) {
        let abandoned = self.inner.state.send_if_modified(|state| {
            if *state == SessionState::Starting {
                *state = SessionState::Failed;
                true
            } else {
                false
            }
        });
        if abandoned {
            warn!(target: SESSION_TARGET, "start abandoned before the launch settled");
        }
    }
}

async fn launch(
    launcher: &dyn Launcher,
    profile: &RunProfile,
) -> Result<(Box<dyn ProtocolClient>, ServerCapabilitySet), LaunchError> {
    let mut client = launcher.launch(profile).await?;
    match handshake(client.as_mut()).await {
        Ok(capabilities) => Ok((client, capabilities)),
        Err(source) => {
            client.close().await;
            Err(LaunchError::Handshake { source })
        }
    }
}

async fn handshake(client: &mut dyn ProtocolClient) -> Result<ServerCapabilitySet, ProtocolError> {
    let params = serde_json::to_value(initialize_params())?;
    let response = client.request(Initialize::METHOD, Some(params)).await?;
    let result: InitializeResult = serde_json::from_value(response)?;
    client
        .notify(
            Initialized::METHOD,
            Some(serde_json::to_value(InitializedParams {})?),
        )
        .await?;
    Ok(ServerCapabilitySet::from_initialize_result(&result))
}

fn initialize_params() -> InitializeParams {
    InitializeParams {
        process_id: Some(std::process::id()),
        client_info: Some(ClientInfo {
            name: CLIENT_NAME.to_owned(),
            version: Some(env!("CARGO_PKG_VERSION").to_owned()),
        }),
        capabilities: ClientCapabilities {
            text_document: Some(TextDocumentClientCapabilities {
                synchronization: Some(TextDocumentSyncClientCapabilities::default()),
                completion: Some(CompletionClientCapabilities::default()),
                hover: Some(HoverClientCapabilities::default()),
                diagnostic: Some(DiagnosticClientCapabilities::default()),
                ..TextDocumentClientCapabilities::default()
            }),
            workspace: Some(WorkspaceClientCapabilities {
                did_change_watched_files: Some(DidChangeWatchedFilesClientCapabilities::default()),
                ..WorkspaceClientCapabilities::default()
            }),
            ..ClientCapabilities::default()
        },
        ..InitializeParams::default()
    }
}

/// Sends `shutdown` and `exit`, then closes the client. Failures are logged.
async fn shutdown(client: &mut dyn ProtocolClient) {
    let answered =
        tokio::time::timeout(SHUTDOWN_REQUEST_TIMEOUT, client.request(Shutdown::METHOD, None))
            .await;
    match answered {
        Ok(Ok(_)) => {}
        Ok(Err(error)) => {
            warn!(target: SESSION_TARGET, error = %error, "shutdown request failed");
        }
        Err(_) => {
            warn!(
                target: SESSION_TARGET,
                timeout_ms = SHUTDOWN_REQUEST_TIMEOUT.as_millis(),
                "server did not answer shutdown, sending exit"
            );
        }
    }
    if let Err(error) = client.notify(Exit::METHOD, None).await {
        warn!(target: SESSION_TARGET, error = %error, "exit notification failed");
    }
    client.close().await;
}

/// Subscriptions of a session being stopped. Dropping it disposes whatever
/// is left and moves the session to `Stopped`.
struct Teardown<'a> {
    state: &'a watch::Sender<SessionState>,
    subscriptions: SubscriptionStack,
}

impl Drop for Teardown<'_> {
    fn drop(&mut self) {
        let abandoned = self.subscriptions.dispose_all();
        if !abandoned.is_empty() {
            warn!(target: SESSION_TARGET, "stop abandoned during shutdown");
        }
        self.state.send_replace(SessionState::Stopped);
    }
}
