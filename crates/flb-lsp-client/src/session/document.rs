use lsp_types::notification::{
    DidChangeTextDocument, DidCloseTextDocument, DidOpenTextDocument, Notification,
};
use lsp_types::{
    DidChangeTextDocumentParams, DidCloseTextDocumentParams, DidOpenTextDocumentParams,
    TextDocumentContentChangeEvent, TextDocumentIdentifier, TextDocumentItem, Uri,
    VersionedTextDocumentIdentifier,
};
use serde_json::Value;

/// A document notification the host wants delivered to the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentEvent {
    /// The editor opened a document.
    Opened {
        /// Document URI.
        uri: Uri,
        /// Language identifier assigned by the editor.
        language_id: String,
        /// Initial version.
        version: i32,
        /// Full document text.
        text: String,
    },
    /// The document content changed.
    Changed {
        /// Document URI.
        uri: Uri,
        /// Language identifier assigned by the editor.
        language_id: String,
        /// Version after the change.
        version: i32,
        /// Edits in application order.
        changes: Vec<TextDocumentContentChangeEvent>,
    },
    /// The editor closed the document.
    Closed {
        /// Document URI.
        uri: Uri,
        /// Language identifier assigned by the editor.
        language_id: String,
    },
}

impl DocumentEvent {
    /// Language identifier of the affected document.
    #[must_use]
    pub fn language_id(&self) -> &str {
        match self {
            Self::Opened { language_id, .. }
            | Self::Changed { language_id, .. }
            | Self::Closed { language_id, .. } => language_id,
        }
    }

    /// URI of the affected document.
    #[must_use]
    pub fn uri(&self) -> &Uri {
        match self {
            Self::Opened { uri, .. } | Self::Changed { uri, .. } | Self::Closed { uri, .. } => uri,
        }
    }

    /// LSP notification method carrying this event.
    #[must_use]
    pub fn method(&self) -> &'static str {
        match self {
            Self::Opened { .. } => DidOpenTextDocument::METHOD,
            Self::Changed { .. } => DidChangeTextDocument::METHOD,
            Self::Closed { .. } => DidCloseTextDocument::METHOD,
        }
    }

    pub(crate) fn into_params(self) -> Result<Value, serde_json::Error> {
        match self {
            Self::Opened {
                uri,
                language_id,
                version,
                text,
            } => serde_json::to_value(DidOpenTextDocumentParams {
                text_document: TextDocumentItem::new(uri, language_id, version, text),
            }),
            Self::Changed {
                uri,
                version,
                changes,
                ..
            } => serde_json::to_value(DidChangeTextDocumentParams {
                text_document: VersionedTextDocumentIdentifier::new(uri, version),
                content_changes: changes,
            }),
            Self::Closed { uri, .. } => serde_json::to_value(DidCloseTextDocumentParams {
                text_document: TextDocumentIdentifier::new(uri),
            }),
        }
    }
}

/// What happened to a forwarded event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Forwarded {
    /// The notification was written to the server.
    Sent,
    /// The document or file is outside the session's scope.
    OutOfScope,
    /// No session is running.
    NotRunning,
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use rstest::rstest;
    use serde_json::json;

    use super::*;

    fn uri() -> Uri {
        Uri::from_str("file:///etc/fluent-bit/fluent-bit.conf").expect("valid uri")
    }

    #[rstest]
    fn opened_event_becomes_did_open() {
        let event = DocumentEvent::Opened {
            uri: uri(),
            language_id: "fluent-bit".to_owned(),
            version: 1,
            text: "[INPUT]\n".to_owned(),
        };

        assert_eq!(event.method(), "textDocument/didOpen");
        let params = event.into_params().expect("serialisable");
        assert_eq!(
            params,
            json!({
                "textDocument": {
                    "uri": "file:///etc/fluent-bit/fluent-bit.conf",
                    "languageId": "fluent-bit",
                    "version": 1,
                    "text": "[INPUT]\n"
                }
            })
        );
    }

    #[rstest]
    fn closed_event_carries_only_identifier() {
        let event = DocumentEvent::Closed {
            uri: uri(),
            language_id: "fluent-bit".to_owned(),
        };

        assert_eq!(event.method(), "textDocument/didClose");
        assert_eq!(
            event.into_params().expect("serialisable"),
            json!({"textDocument": {"uri": "file:///etc/fluent-bit/fluent-bit.conf"}})
        );
    }
}
