//! JSON-RPC 2.0 message types for LSP communication.

use serde::{Deserialize, Serialize};
use serde_json::Value;

const VERSION: &str = "2.0";

/// A message the client sends: a request when `id` is set, otherwise a
/// notification.
#[derive(Debug, Clone, Serialize)]
pub struct Outgoing {
    jsonrpc: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<i64>,
    method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    params: Option<Value>,
}

impl Outgoing {
    /// A request expecting a response correlated by `id`.
    #[must_use]
    pub fn request(id: i64, method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: VERSION,
            id: Some(id),
            method: method.into(),
            params,
        }
    }

    /// A notification; the server sends nothing back.
    #[must_use]
    pub fn notification(method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: VERSION,
            id: None,
            method: method.into(),
            params,
        }
    }
}

/// A JSON-RPC 2.0 response message.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcResponse {
    /// Request identifier this response corresponds to.
    pub id: Option<i64>,
    /// The result on success.
    #[serde(default)]
    pub result: Option<Value>,
    /// The error on failure.
    #[serde(default)]
    pub error: Option<JsonRpcError>,
}

/// A JSON-RPC 2.0 error object.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcError {
    /// Error code.
    pub code: i64,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional data.
    #[serde(default)]
    pub data: Option<Value>,
}

/// A request initiated by the server, such as `client/registerCapability`.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerRequest {
    /// Identifier chosen by the server; may be numeric or textual.
    pub id: Value,
    /// The method the server invoked.
    pub method: String,
    /// Optional parameters.
    #[serde(default)]
    pub params: Option<Value>,
}

/// A notification initiated by the server, such as `window/logMessage`.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerNotification {
    /// The method the server invoked.
    pub method: String,
    /// Optional parameters.
    #[serde(default)]
    pub params: Option<Value>,
}

/// Reply sent back for a server-initiated request.
#[derive(Debug, Clone, Serialize)]
pub struct ClientReply {
    /// Protocol version, always "2.0".
    pub jsonrpc: &'static str,
    /// Identifier copied from the server request.
    pub id: Value,
    /// Result payload; `null` acknowledges without data.
    pub result: Value,
}

impl ClientReply {
    /// Acknowledges a server request with a `null` result.
    #[must_use]
    pub fn acknowledge(id: Value) -> Self {
        Self {
            jsonrpc: VERSION,
            id,
            result: Value::Null,
        }
    }
}

/// Any message the server can send to the client.
#[derive(Debug, Clone)]
pub enum JsonRpcMessage {
    /// Response to one of our requests.
    Response(JsonRpcResponse),
    /// Request initiated by the server.
    ServerRequest(ServerRequest),
    /// Notification initiated by the server.
    Notification(ServerNotification),
}

impl JsonRpcMessage {
    /// Classifies a raw payload by the presence of `method` and `id`.
    ///
    /// # Errors
    ///
    /// Returns the codec error when the payload is not valid JSON-RPC.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        let value: Value = serde_json::from_slice(bytes)?;
        let has_method = value.get("method").is_some();
        let has_id = value.get("id").is_some_and(|id| !id.is_null());
        match (has_method, has_id) {
            (true, true) => serde_json::from_value(value).map(Self::ServerRequest),
            (true, false) => serde_json::from_value(value).map(Self::Notification),
            (false, _) => serde_json::from_value(value).map(Self::Response),
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    #[rstest]
    fn shutdown_request_omits_params() {
        let value = serde_json::to_value(Outgoing::request(42, "shutdown", None))
            .expect("serialisable");

        assert_eq!(value, json!({"jsonrpc": "2.0", "id": 42, "method": "shutdown"}));
    }

    #[rstest]
    fn notification_carries_no_id() {
        let value = serde_json::to_value(Outgoing::notification("initialized", Some(json!({}))))
            .expect("serialisable");

        assert_eq!(
            value,
            json!({"jsonrpc": "2.0", "method": "initialized", "params": {}})
        );
    }

    #[rstest]
    fn deserialises_error_response() {
        let json =
            r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32600,"message":"Invalid request"}}"#;
        let response: JsonRpcResponse = serde_json::from_str(json).expect("parse failed");

        assert_eq!(response.id, Some(1));
        assert!(response.result.is_none());

        let error = response.error.expect("error missing");
        assert_eq!(error.code, -32600);
        assert_eq!(error.message, "Invalid request");
    }

    #[rstest]
    #[case(r#"{"jsonrpc":"2.0","id":3,"result":null}"#, "response")]
    #[case(r#"{"jsonrpc":"2.0","id":"abc","method":"client/registerCapability"}"#, "request")]
    #[case(r#"{"jsonrpc":"2.0","method":"window/logMessage","params":{"type":3,"message":"hi"}}"#, "notification")]
    fn classifies_incoming_messages(#[case] payload: &str, #[case] expected: &str) {
        let message = JsonRpcMessage::from_bytes(payload.as_bytes()).expect("parse failed");

        let kind = match message {
            JsonRpcMessage::Response(_) => "response",
            JsonRpcMessage::ServerRequest(_) => "request",
            JsonRpcMessage::Notification(_) => "notification",
        };
        assert_eq!(kind, expected);
    }

    #[rstest]
    fn acknowledgement_echoes_string_ids() {
        let reply = ClientReply::acknowledge(json!("abc"));
        let json = serde_json::to_string(&reply).expect("serialization failed");

        assert_eq!(json, r#"{"jsonrpc":"2.0","id":"abc","result":null}"#);
    }
}
