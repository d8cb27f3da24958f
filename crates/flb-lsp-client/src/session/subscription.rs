use std::fmt;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::SESSION_TARGET;

/// Registrations a session holds while running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionKind {
    /// Document selector scoping traffic to fluent-bit documents.
    DocumentSelector,
    /// Sentinel `.clientrc` watcher.
    FileWatcher,
    /// Inline hints provider.
    HintsProvider,
}

impl fmt::Display for SubscriptionKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::DocumentSelector => "document-selector",
            Self::FileWatcher => "file-watcher",
            Self::HintsProvider => "hints-provider",
        };
        formatter.write_str(label)
    }
}

/// A disposable registration.
#[derive(Debug)]
pub(crate) struct Subscription {
    kind: SubscriptionKind,
    cancel: Option<CancellationToken>,
}

impl Subscription {
    pub(crate) fn new(kind: SubscriptionKind) -> Self {
        Self { kind, cancel: None }
    }

    /// A subscription whose disposal cancels `token`.
    pub(crate) fn cancelling(kind: SubscriptionKind, token: CancellationToken) -> Self {
        Self {
            kind,
            cancel: Some(token),
        }
    }

    fn dispose(self) -> SubscriptionKind {
        if let Some(token) = self.cancel {
            token.cancel();
        }
        debug!(target: SESSION_TARGET, subscription = %self.kind, "disposed subscription");
        self.kind
    }
}

/// Subscriptions in registration order.
#[derive(Debug, Default)]
pub(crate) struct SubscriptionStack {
    entries: Vec<Subscription>,
}

impl SubscriptionStack {
    pub(crate) fn push(&mut self, subscription: Subscription) {
        debug!(
            target: SESSION_TARGET,
            subscription = %subscription.kind,
            "registered subscription"
        );
        self.entries.push(subscription);
    }

    /// Disposes every subscription, newest first, returning the order used.
    pub(crate) fn dispose_all(&mut self) -> Vec<SubscriptionKind> {
        let mut disposed = Vec::with_capacity(self.entries.len());
        while let Some(subscription) = self.entries.pop() {
            disposed.push(subscription.dispose());
        }
        disposed
    }
}
