//! Activation and deactivation of the language client.

use std::ffi::OsString;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use flb_client_config::{Config, ExecutionMode};
use futures::future::BoxFuture;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::errors::{ActivationError, ResolutionError};
use crate::hints::{HINT_INTENT_CAPACITY, HintsCoordinator, HintsEvent, HintsHandle, HintsIntent};
use crate::locator::{ResolutionConfig, ResolvedServerLocation, ServerLocator, ServerPath};
use crate::server::{Launcher, ServerCapabilitySet};
use crate::session::{SessionConfig, SessionManager};

/// Log target for activation.
pub(crate) const LIFECYCLE_TARGET: &str = "flb_lsp_client::lifecycle";

/// Shown when no server binary can be used.
pub const NO_BINARY_MESSAGE: &str = "Unfortunately we don't ship binaries for your platform yet. Please build and run the server manually from the source code. Or, please create an issue on repository.";

/// Host surface for user-facing messages.
pub trait UserNotifier: Send + Sync {
    /// Presents a blocking error message.
    fn show_error(&self, message: &str);
}

/// Pending teardown returned by [`ExtensionLifecycle::deactivate`].
pub type Deactivation = BoxFuture<'static, ()>;

/// Knobs the lifecycle passes on to the session and hints coordinator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LifecycleSettings {
    /// Mode the server is launched in.
    pub execution_mode: ExecutionMode,
    /// Trailing debounce for hint recomputation.
    pub hints_debounce: Duration,
    /// Variables added to the server environment when not already inherited.
    pub server_environment: Vec<(OsString, OsString)>,
}

impl Default for LifecycleSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl LifecycleSettings {
    /// Settings derived from the client configuration.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            execution_mode: config.execution_mode(),
            hints_debounce: config.hints_debounce(),
            server_environment: Vec::new(),
        }
    }
}

struct Activation {
    session: SessionManager,
    hints: HintsHandle,
}

/// Single entry and exit point for the host.
///
/// Holds the session created by [`activate`](Self::activate) until
/// [`deactivate`](Self::deactivate) hands its teardown back to the host.
pub struct ExtensionLifecycle {
    resolution: ResolutionConfig,
    locator: ServerLocator,
    launcher: Arc<dyn Launcher>,
    notifier: Arc<dyn UserNotifier>,
    settings: LifecycleSettings,
    active: Option<Activation>,
    hint_intents: Option<mpsc::Receiver<HintsIntent>>,
}

impl fmt::Debug for ExtensionLifecycle {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("ExtensionLifecycle")
            .field("resolution", &self.resolution)
            .field("settings", &self.settings)
            .field("active", &self.active.is_some())
            .finish_non_exhaustive()
    }
}

impl ExtensionLifecycle {
    /// Creates an inactive lifecycle.
    #[must_use]
    pub fn new(
        resolution: ResolutionConfig,
        launcher: Arc<dyn Launcher>,
        notifier: Arc<dyn UserNotifier>,
        settings: LifecycleSettings,
    ) -> Self {
        Self {
            resolution,
            locator: ServerLocator::new(),
            launcher,
            notifier,
            settings,
            active: None,
            hint_intents: None,
        }
    }

    /// Resolves the server and starts the session.
    ///
    /// # Errors
    ///
    /// Returns [`ActivationError::Resolution`] after showing
    /// [`NO_BINARY_MESSAGE`] when no server can be used,
    /// [`ActivationError::Launch`] when the session fails to start, and
    /// [`ActivationError::AlreadyActive`] when a session already exists.
    pub async fn activate(&mut self) -> Result<ServerCapabilitySet, ActivationError> {
        if self.active.is_some() {
            return Err(ActivationError::AlreadyActive);
        }

        let server = self.resolve().await?;
        let session = SessionManager::new(Arc::clone(&self.launcher));
        let config = SessionConfig::new(server, self.settings.server_environment.clone());
        let capabilities = match session.start(config, self.settings.execution_mode).await {
            Ok(capabilities) => capabilities,
            Err(error) => {
                warn!(target: LIFECYCLE_TARGET, error = %error, "activation failed");
                session.stop().await;
                return Err(error.into());
            }
        };

        let (intents, receiver) = mpsc::channel(HINT_INTENT_CAPACITY);
        let hints = HintsCoordinator::new(self.settings.hints_debounce, intents)
            .spawn(session.hints_token());
        self.hint_intents = Some(receiver);
        self.active = Some(Activation { session, hints });
        info!(target: LIFECYCLE_TARGET, "extension activated");
        Ok(capabilities)
    }

    async fn resolve(&self) -> Result<ServerPath, ResolutionError> {
        let failure = match self.locator.resolve(&self.resolution).await {
            ResolvedServerLocation::Found(path) => return Ok(path),
            ResolvedServerLocation::NotAvailable => ResolutionError::NotAvailable,
            ResolvedServerLocation::InvalidOverride(reason) => {
                ResolutionError::InvalidOverride { reason }
            }
        };
        warn!(target: LIFECYCLE_TARGET, error = %failure, "no language server to launch");
        self.notifier.show_error(NO_BINARY_MESSAGE);
        Err(failure)
    }

    /// Session of the current activation.
    #[must_use]
    pub fn session(&self) -> Option<&SessionManager> {
        self.active.as_ref().map(|active| &active.session)
    }

    /// Receiver for hint intents of the current activation. Yields once.
    ///
    /// Until it is taken, at most [`HINT_INTENT_CAPACITY`] intents are kept.
    pub fn take_hint_intents(&mut self) -> Option<mpsc::Receiver<HintsIntent>> {
        self.hint_intents.take()
    }

    /// Passes a change event to the hints coordinator.
    pub fn notify_hints(&self, event: HintsEvent) -> bool {
        self.active
            .as_ref()
            .is_some_and(|active| active.hints.notify(event))
    }

    /// Whether a session exists.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Begins teardown, returning a future that completes once the session
    /// is stopped and the hints coordinator has exited. Returns `None`
    /// without side effects when nothing was activated.
    pub fn deactivate(&mut self) -> Option<Deactivation> {
        let Activation { session, mut hints } = self.active.take()?;
        self.hint_intents = None;
        info!(target: LIFECYCLE_TARGET, "deactivating extension");
        Some(Box::pin(async move {
            session.stop().await;
            hints.dispose();
            hints.join().await;
            info!(target: LIFECYCLE_TARGET, "extension deactivated");
        }))
    }
}
