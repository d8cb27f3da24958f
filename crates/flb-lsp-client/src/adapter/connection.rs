//! Request/response correlation over an LSP-framed transport.

use serde_json::Value;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, warn};

use super::ADAPTER_TARGET;
use super::error::ProtocolError;
use super::jsonrpc::{
    ClientReply, JsonRpcMessage, JsonRpcResponse, Outgoing, ServerNotification, ServerRequest,
};
use super::transport::StdioTransport;

/// Maximum number of unrelated messages skipped while waiting for a response.
const MAX_RESPONSE_ITERATIONS: usize = 100;

/// JSON-RPC endpoint that owns a transport and allocates request IDs.
pub struct JsonRpcConnection<R, W> {
    transport: StdioTransport<R, W>,
    next_id: i64,
}

impl<R, W> JsonRpcConnection<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    /// Wraps a transport; request IDs start at 1.
    #[must_use]
    pub fn new(transport: StdioTransport<R, W>) -> Self {
        Self {
            transport,
            next_id: 1,
        }
    }

    /// Sends a request and suspends until the matching response arrives.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::Server`] when the server answers with an
    /// error object, or a transport/codec error when the exchange fails.
    pub async fn request(
        &mut self,
        method: &str,
        params: Option<Value>,
    ) -> Result<Value, ProtocolError> {
        let request_id = self.next_id;
        self.next_id += 1;
        let request = Outgoing::request(request_id, method, params);
        let payload = serde_json::to_vec(&request)?;

        debug!(
            target: ADAPTER_TARGET,
            method,
            id = request_id,
            "sending request"
        );

        self.transport.send(&payload).await?;
        let response = self.receive_response_for_request(request_id).await?;

        if let Some(error) = response.error {
            return Err(ProtocolError::from(error));
        }

        Ok(response.result.unwrap_or(Value::Null))
    }

    /// Sends a notification (no response expected).
    ///
    /// # Errors
    ///
    /// Returns a transport or codec error when the message cannot be written.
    pub async fn notify(&mut self, method: &str, params: Option<Value>) -> Result<(), ProtocolError> {
        let notification = Outgoing::notification(method, params);
        let payload = serde_json::to_vec(&notification)?;

        debug!(
            target: ADAPTER_TARGET,
            method,
            "sending notification"
        );

        self.transport.send(&payload).await?;
        Ok(())
    }

    /// Closes the writing half of the transport.
    ///
    /// # Errors
    ///
    /// Returns the transport error raised while flushing.
    pub async fn close(&mut self) -> Result<(), ProtocolError> {
        self.transport.close().await.map_err(ProtocolError::from)
    }

    /// Receives messages until a response with a matching ID is found.
    ///
    /// Server notifications are logged and skipped; server requests are
    /// acknowledged with a `null` result so the server never blocks on us.
    async fn receive_response_for_request(
        &mut self,
        request_id: i64,
    ) -> Result<JsonRpcResponse, ProtocolError> {
        for _ in 0..MAX_RESPONSE_ITERATIONS {
            let message_bytes = self.transport.receive().await?;

            match JsonRpcMessage::from_bytes(&message_bytes)? {
                JsonRpcMessage::Response(resp) if resp.id == Some(request_id) => return Ok(resp),
                JsonRpcMessage::Response(resp) => {
                    warn!(
                        target: ADAPTER_TARGET,
                        expected = request_id,
                        received = ?resp.id,
                        "skipping response with non-matching ID"
                    );
                }
                JsonRpcMessage::ServerRequest(req) => self.acknowledge(req).await?,
                JsonRpcMessage::Notification(notif) => log_server_notification(&notif),
            }
        }

        warn!(
            target: ADAPTER_TARGET,
            request_id,
            max_iterations = MAX_RESPONSE_ITERATIONS,
            "giving up on response after reaching maximum iterations"
        );
        Err(ProtocolError::Unanswered { request_id })
    }

    async fn acknowledge(&mut self, request: ServerRequest) -> Result<(), ProtocolError> {
        debug!(
            target: ADAPTER_TARGET,
            method = %request.method,
            id = %request.id,
            "acknowledging server-initiated request"
        );
        let payload = serde_json::to_vec(&ClientReply::acknowledge(request.id))?;
        self.transport.send(&payload).await?;
        Ok(())
    }
}

/// Mirrors `window/logMessage` into tracing; other notifications are skipped.
fn log_server_notification(notification: &ServerNotification) {
    let message = notification
        .params
        .as_ref()
        .and_then(|params| params.get("message"))
        .and_then(Value::as_str);
    match (notification.method.as_str(), message) {
        ("window/logMessage" | "window/showMessage", Some(message)) => {
            debug!(
                target: ADAPTER_TARGET,
                method = %notification.method,
                message,
                "server message"
            );
        }
        _ => {
            debug!(
                target: ADAPTER_TARGET,
                method = %notification.method,
                "skipping server notification"
            );
        }
    }
}
