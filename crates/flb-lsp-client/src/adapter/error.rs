//! Failure kinds of the stdio adapter, one enum per layer.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use super::jsonrpc::JsonRpcError;

/// The server could not be brought up.
#[derive(Debug, Error)]
pub enum LaunchError {
    /// No executable exists at the resolved path.
    #[error("language server binary not found: {}", command.display())]
    NotFound {
        /// Path that was executed.
        command: PathBuf,
        /// Error reported by the OS.
        #[source]
        source: io::Error,
    },

    /// The executable exists but the OS refused to start it.
    #[error("failed to spawn {}", command.display())]
    Spawn {
        /// Path that was executed.
        command: PathBuf,
        /// Error reported by the OS.
        #[source]
        source: io::Error,
    },

    /// A piped stdio handle was not available on the child.
    #[error("language server {stream} was not piped")]
    MissingPipe {
        /// `stdin` or `stdout`.
        stream: &'static str,
    },

    /// The `initialize` exchange failed.
    #[error("initialize handshake failed")]
    Handshake {
        /// Failure observed during the exchange.
        #[source]
        source: ProtocolError,
    },
}

/// A message exchange with the running server failed.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Framing or I/O failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A payload was not valid JSON-RPC.
    #[error("malformed JSON-RPC payload: {0}")]
    Codec(#[from] serde_json::Error),

    /// The server answered with an error object.
    #[error("server error {code}: {message}")]
    Server {
        /// JSON-RPC error code.
        code: i64,
        /// Server-supplied message.
        message: String,
    },

    /// The reply never arrived among the messages the server sent.
    #[error("request {request_id} went unanswered")]
    Unanswered {
        /// Identifier of the request.
        request_id: i64,
    },

    /// The connection was already closed.
    #[error("connection to the language server is closed")]
    Closed,
}

impl From<JsonRpcError> for ProtocolError {
    fn from(error: JsonRpcError) -> Self {
        Self::Server {
            code: error.code,
            message: error.message,
        }
    }
}

/// Framing failures on the stdio streams.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Reading or writing a stream failed.
    #[error("stdio failure: {0}")]
    Io(#[from] io::Error),

    /// The server closed its stdout.
    #[error("language server closed its output")]
    Closed,

    /// A header block ended without `Content-Length`.
    #[error("message header lacks Content-Length")]
    MissingContentLength,

    /// `Content-Length` was not a byte count.
    #[error("invalid Content-Length value '{value}'")]
    InvalidContentLength {
        /// Raw header value.
        value: String,
    },
}
