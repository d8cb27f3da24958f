//! Process-based protocol adapter.
//!
//! Spawns the language server and talks JSON-RPC 2.0 to it over stdio with
//! LSP header framing. [`ProcessLauncher`] implements
//! [`Launcher`](crate::Launcher) and produces [`ProcessClient`] values that
//! implement [`ProtocolClient`](crate::ProtocolClient).
//!
//! - [`StdioTransport`]: `Content-Length` framing over any async byte streams
//! - [`JsonRpcConnection`]: request IDs and response correlation
//! - [`LaunchError`], [`ProtocolError`], [`TransportError`]: failure kinds

mod connection;
mod error;
mod jsonrpc;
mod process;
mod termination;
mod transport;

pub use connection::JsonRpcConnection;
pub use error::{LaunchError, ProtocolError, TransportError};
pub use jsonrpc::{
    ClientReply, JsonRpcError, JsonRpcMessage, JsonRpcResponse, Outgoing, ServerNotification,
    ServerRequest,
};
pub use process::{ProcessClient, ProcessLauncher};
pub use transport::StdioTransport;

/// Log target for adapter operations.
pub(crate) const ADAPTER_TARGET: &str = "flb_lsp_client::adapter";
