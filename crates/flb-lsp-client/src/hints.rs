//! Debounced refresh of inline hints.
//!
//! The coordinator never talks to the server. It turns configuration and
//! document change events into [`HintsIntent`] values for whoever renders
//! the hints: a configuration change rebuilds the provider, and each burst
//! of edits to one document collapses into a single trailing `Recompute`.

use std::collections::HashMap;
use std::time::Duration;

use lsp_types::Uri;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep_until};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Log target for hints coordination.
pub(crate) const HINTS_TARGET: &str = "flb_lsp_client::hints";

/// Intents buffered for a receiver that is not keeping up. Further intents
/// are dropped until it drains.
pub const HINT_INTENT_CAPACITY: usize = 64;

/// Change notifications consumed by the coordinator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HintsEvent {
    /// Client configuration changed.
    ConfigChanged,
    /// A document was edited.
    DocumentChanged(Uri),
}

/// Actions the coordinator asks its caller to perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HintsIntent {
    /// A fresh hints provider should be registered.
    ProviderRegistered {
        /// Monotonic provider generation, starting at 1.
        generation: u64,
    },
    /// The provider of this generation should be released.
    ProviderDisposed {
        /// Generation being released.
        generation: u64,
    },
    /// Hints for the document should be recomputed.
    Recompute {
        /// Document to refresh.
        uri: Uri,
    },
}

/// Builds and runs the hints event loop.
#[derive(Debug)]
pub struct HintsCoordinator {
    debounce: Duration,
    intents: mpsc::Sender<HintsIntent>,
}

impl HintsCoordinator {
    /// Creates a coordinator emitting into `intents`.
    #[must_use]
    pub fn new(debounce: Duration, intents: mpsc::Sender<HintsIntent>) -> Self {
        Self { debounce, intents }
    }

    /// Spawns the event loop on the current runtime.
    ///
    /// The loop ends when `cancel` fires, when every event sender is gone,
    /// or when the intent receiver is dropped.
    #[must_use]
    pub fn spawn(self, cancel: CancellationToken) -> HintsHandle {
        let (events, receiver) = mpsc::unbounded_channel();
        let task = tokio::spawn(self.run(receiver, cancel.clone()));
        HintsHandle {
            events: Some(events),
            cancel,
            task: Some(task),
        }
    }

    async fn run(self, mut events: mpsc::UnboundedReceiver<HintsEvent>, cancel: CancellationToken) {
        let mut generation = 1;
        let mut pending: HashMap<String, (Uri, Instant)> = HashMap::new();
        if !self.emit(HintsIntent::ProviderRegistered { generation }) {
            return;
        }

        loop {
            let next_deadline = pending.values().map(|(_, deadline)| *deadline).min();
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                event = events.recv() => match event {
                    Some(HintsEvent::ConfigChanged) => {
                        debug!(target: HINTS_TARGET, generation, "rebuilding hints provider");
                        if !self.emit(HintsIntent::ProviderDisposed { generation }) {
                            return;
                        }
                        generation += 1;
                        if !self.emit(HintsIntent::ProviderRegistered { generation }) {
                            return;
                        }
                    }
                    Some(HintsEvent::DocumentChanged(uri)) => {
                        let deadline = Instant::now() + self.debounce;
                        pending.insert(uri.as_str().to_owned(), (uri, deadline));
                    }
                    None => break,
                },
                () = wait_until(next_deadline) => {
                    for uri in take_due(&mut pending, Instant::now()) {
                        if !self.emit(HintsIntent::Recompute { uri }) {
                            return;
                        }
                    }
                }
            }
        }

        debug!(target: HINTS_TARGET, generation, "hints coordinator stopped");
        self.emit(HintsIntent::ProviderDisposed { generation });
    }

    fn emit(&self, intent: HintsIntent) -> bool {
        match self.intents.try_send(intent) {
            Ok(()) => true,
            Err(TrySendError::Full(intent)) => {
                debug!(target: HINTS_TARGET, ?intent, "intent backlog full, dropping");
                true
            }
            Err(TrySendError::Closed(_)) => {
                debug!(target: HINTS_TARGET, "intent receiver dropped");
                false
            }
        }
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

fn take_due(pending: &mut HashMap<String, (Uri, Instant)>, now: Instant) -> Vec<Uri> {
    let mut due: Vec<(Instant, String)> = pending
        .iter()
        .filter(|(_, (_, deadline))| *deadline <= now)
        .map(|(key, (_, deadline))| (*deadline, key.clone()))
        .collect();
    due.sort();
    due.into_iter()
        .filter_map(|(_, key)| pending.remove(&key).map(|(uri, _)| uri))
        .collect()
}

/// Handle to a running coordinator.
#[derive(Debug)]
pub struct HintsHandle {
    events: Option<mpsc::UnboundedSender<HintsEvent>>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl HintsHandle {
    /// Queues an event. Returns `false` once the coordinator is gone.
    pub fn notify(&self, event: HintsEvent) -> bool {
        self.events
            .as_ref()
            .is_some_and(|events| events.send(event).is_ok())
    }

    /// Releases the provider and the event channel. Safe to call repeatedly.
    pub fn dispose(&mut self) {
        if self.events.take().is_some() {
            debug!(target: HINTS_TARGET, "disposing hints coordinator");
        }
        self.cancel.cancel();
    }

    /// Whether [`dispose`](Self::dispose) has run.
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.events.is_none()
    }

    /// Waits for the event loop to finish.
    pub async fn join(&mut self) {
        if let Some(task) = self.task.take()
            && let Err(error) = task.await
        {
            warn!(target: HINTS_TARGET, error = %error, "hints coordinator task failed");
        }
    }
}
