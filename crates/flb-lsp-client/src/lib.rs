//! Client-side bootstrap for the fluent-bit language server.
#![deny(missing_docs)]
//!
//! The crate finds the server executable, runs one protocol session against
//! it over stdio, and tears the session down when the host unloads. The
//! pieces, leaves first:
//!
//! - [`ServerLocator`] picks an explicit override or the bundled binary.
//! - [`SessionManager`] launches the server, scopes traffic to fluent-bit
//!   documents and stops it again.
//! - [`ExtensionLifecycle`] wires the two together for the host.
//! - [`HintsCoordinator`] debounces inline-hint refreshes.
//!
//! Process and wire details sit behind the [`Launcher`] and
//! [`ProtocolClient`] traits so tests can substitute in-memory doubles.

pub mod adapter;
mod errors;
mod hints;
mod lifecycle;
mod locator;
mod server;
mod session;

pub use errors::{ActivationError, ResolutionError, SessionError};
pub use hints::{HINT_INTENT_CAPACITY, HintsCoordinator, HintsEvent, HintsHandle, HintsIntent};
pub use lifecycle::{
    Deactivation, ExtensionLifecycle, LifecycleSettings, NO_BINARY_MESSAGE, UserNotifier,
};
pub use locator::{
    BUNDLED_SERVER_DIR, OverrideRejection, PlatformKind, ResolutionConfig,
    ResolvedServerLocation, SERVER_BINARY_NAME, SERVER_PATH_ENV, ServerLocator, ServerPath,
};
pub use server::{Launcher, ProtocolClient, ServerCapabilitySet};
pub use session::{
    CHANGE_WATCH_GLOB, DocumentEvent, DocumentSelector, FLUENT_BIT_LANGUAGE_ID, FileWatcher,
    Forwarded, RunProfile, SHUTDOWN_REQUEST_TIMEOUT, SessionConfig, SessionManager, SessionState,
    SubscriptionKind,
};

#[cfg(test)]
mod tests;
