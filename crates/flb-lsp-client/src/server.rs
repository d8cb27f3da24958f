//! Abstractions over the wire connection to the language server.

use std::fmt;

use async_trait::async_trait;
use lsp_types::{
    HoverProviderCapability, InitializeResult, TextDocumentSyncCapability, TextDocumentSyncKind,
};
use serde_json::Value;

use crate::adapter::{LaunchError, ProtocolError};
use crate::session::RunProfile;

/// Capabilities the fluent-bit server advertised during the handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerCapabilitySet {
    pub(crate) completion: bool,
    pub(crate) hover: bool,
    pub(crate) diagnostics: bool,
    pub(crate) sync_kind: Option<TextDocumentSyncKind>,
}

impl ServerCapabilitySet {
    /// Builds a capability set describing the server's advertised support.
    #[must_use]
    pub fn new(completion: bool, hover: bool, diagnostics: bool) -> Self {
        Self {
            completion,
            hover,
            diagnostics,
            sync_kind: None,
        }
    }

    /// Summarises an `initialize` response.
    #[must_use]
    pub fn from_initialize_result(result: &InitializeResult) -> Self {
        let caps = &result.capabilities;
        let sync_kind = caps.text_document_sync.as_ref().and_then(|sync| match sync {
            TextDocumentSyncCapability::Kind(kind) => Some(*kind),
            TextDocumentSyncCapability::Options(options) => options.change,
        });
        Self {
            completion: caps.completion_provider.is_some(),
            hover: matches!(
                caps.hover_provider,
                Some(HoverProviderCapability::Simple(true) | HoverProviderCapability::Options(_))
            ),
            diagnostics: caps.diagnostic_provider.is_some(),
            sync_kind,
        }
    }

    /// Whether the server reports support for `textDocument/completion`.
    #[must_use]
    pub fn supports_completion(self) -> bool {
        self.completion
    }

    /// Whether the server reports support for `textDocument/hover`.
    #[must_use]
    pub fn supports_hover(self) -> bool {
        self.hover
    }

    /// Whether the server reports support for pull diagnostics.
    #[must_use]
    pub fn supports_diagnostics(self) -> bool {
        self.diagnostics
    }

    /// Synchronisation kind requested by the server, if any.
    #[must_use]
    pub fn sync_kind(self) -> Option<TextDocumentSyncKind> {
        self.sync_kind
    }
}

/// Connection to a running language server.
///
/// The session drives the protocol (handshake, document traffic, shutdown)
/// through this trait, so tests can substitute a recording double for the
/// real process-backed client.
#[async_trait]
pub trait ProtocolClient: Send {
    /// Sends a request and waits for its result.
    async fn request(&mut self, method: &str, params: Option<Value>) -> Result<Value, ProtocolError>;

    /// Sends a notification.
    async fn notify(&mut self, method: &str, params: Option<Value>) -> Result<(), ProtocolError>;

    /// Closes the connection and reaps the server process. Never fails.
    async fn close(&mut self);
}

impl fmt::Debug for dyn ProtocolClient {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("ProtocolClient")
    }
}

/// Produces protocol clients from a run profile.
#[async_trait]
pub trait Launcher: Send + Sync {
    /// Starts the server described by `profile`.
    async fn launch(&self, profile: &RunProfile) -> Result<Box<dyn ProtocolClient>, LaunchError>;
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    #[rstest]
    fn summarises_fluent_bit_server_capabilities() {
        let result: InitializeResult = serde_json::from_value(json!({
            "capabilities": {
                "textDocumentSync": 2,
                "completionProvider": {},
                "hoverProvider": true,
                "diagnosticProvider": {
                    "interFileDependencies": false,
                    "workspaceDiagnostics": false
                }
            }
        }))
        .expect("valid initialize result");

        let caps = ServerCapabilitySet::from_initialize_result(&result);

        assert!(caps.supports_completion());
        assert!(caps.supports_hover());
        assert!(caps.supports_diagnostics());
        assert_eq!(caps.sync_kind(), Some(TextDocumentSyncKind::INCREMENTAL));
    }

    #[rstest]
    #[case(json!(false), false)]
    #[case(json!(true), true)]
    #[case(json!({"workDoneProgress": false}), true)]
    fn hover_support_follows_the_advertised_value(
        #[case] hover_provider: serde_json::Value,
        #[case] expected: bool,
    ) {
        let result: InitializeResult =
            serde_json::from_value(json!({"capabilities": {"hoverProvider": hover_provider}}))
                .expect("valid initialize result");

        let caps = ServerCapabilitySet::from_initialize_result(&result);

        assert_eq!(caps.supports_hover(), expected);
    }

    #[rstest]
    fn empty_capabilities_report_nothing() {
        let result: InitializeResult =
            serde_json::from_value(json!({"capabilities": {}})).expect("valid initialize result");

        assert_eq!(
            ServerCapabilitySet::from_initialize_result(&result),
            ServerCapabilitySet::new(false, false, false)
        );
    }
}
