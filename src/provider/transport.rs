//! JSON-RPC 2.0 message types and `Content-Length` framing for talking to a
//! language server over its stdio.

use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};

use crate::errors::{Result, SymGraphError};

/// Upper bound on a single framed message.
pub const MAX_MESSAGE_BYTES: usize = 64 * 1024 * 1024;

/// A JSON-RPC 2.0 request or notification sent to the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    /// Protocol version; always `"2.0"`.
    pub jsonrpc: String,
    /// Request identifier. Null for notifications, which are sent without one.
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub id: serde_json::Value,
    /// The RPC method name.
    pub method: String,
    /// Optional parameters for the method.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<serde_json::Value>,
}

impl JsonRpcRequest {
    /// Creates a request expecting a response.
    pub fn call(id: u64, method: &str, params: serde_json::Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id: serde_json::Value::from(id),
            method: method.to_string(),
            params: Some(params),
        }
    }

    /// Creates a notification; the server sends nothing back.
    pub fn notification(method: &str, params: Option<serde_json::Value>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id: serde_json::Value::Null,
            method: method.to_string(),
            params,
        }
    }
}

/// A JSON-RPC 2.0 response, either received from the server or sent back
/// for a server-initiated request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    /// Protocol version; always `"2.0"`.
    pub jsonrpc: String,
    /// The request identifier that this response corresponds to.
    pub id: serde_json::Value,
    /// The result on success. A null result is serialized explicitly.
    #[serde(default)]
    pub result: Option<serde_json::Value>,
    /// The error on failure; absent on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    /// Creates a successful JSON-RPC response.
    pub fn success(id: serde_json::Value, result: serde_json::Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }
}

/// A JSON-RPC 2.0 error object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcError {
    /// Numeric error code.
    pub code: i32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

/// Any message the server may send: a response to one of our requests, a
/// request of its own, or a notification.
#[derive(Debug, Clone, Deserialize)]
pub struct IncomingMessage {
    #[serde(default)]
    pub id: serde_json::Value,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub params: Option<serde_json::Value>,
    #[serde(default)]
    pub result: Option<serde_json::Value>,
    #[serde(default)]
    pub error: Option<JsonRpcError>,
}

impl IncomingMessage {
    /// Returns `true` for a request initiated by the server.
    pub fn is_server_request(&self) -> bool {
        self.method.is_some() && !self.id.is_null()
    }

    /// Returns `true` for a notification.
    pub fn is_notification(&self) -> bool {
        self.method.is_some() && self.id.is_null()
    }
}

/// Frames a JSON payload with a `Content-Length` header.
pub fn encode_frame(payload: &[u8]) -> Vec<u8> {
    let mut frame = format!("Content-Length: {}\r\n\r\n", payload.len()).into_bytes();
    frame.extend_from_slice(payload);
    frame
}

/// Parses the value of a `Content-Length` header line, case-insensitively.
pub fn parse_content_length(line: &str) -> Option<usize> {
    const PREFIX: &str = "content-length:";
    let line = line.trim();
    if line.len() < PREFIX.len() || !line[..PREFIX.len()].eq_ignore_ascii_case(PREFIX) {
        return None;
    }
    line[PREFIX.len()..].trim().parse().ok()
}

/// Reads one framed message.
///
/// Returns `Ok(None)` on a clean end of stream before any header byte.
pub async fn read_frame<R: AsyncBufRead + Unpin>(reader: &mut R) -> Result<Option<Vec<u8>>> {
    let mut content_length = None;
    let mut saw_header = false;

    loop {
        let mut line = String::new();
        let read = reader.read_line(&mut line).await?;
        if read == 0 {
            if saw_header {
                return Err(SymGraphError::Transport {
                    message: "stream closed inside message header".to_string(),
                });
            }
            return Ok(None);
        }

        let trimmed = line.trim_end_matches(['\r', '\n']);
        if trimmed.is_empty() {
            if saw_header {
                break;
            }
            continue;
        }
        saw_header = true;
        if let Some(n) = parse_content_length(trimmed) {
            content_length = Some(n);
        }
    }

    let length = content_length.ok_or_else(|| SymGraphError::Transport {
        message: "message header without Content-Length".to_string(),
    })?;
    if length > MAX_MESSAGE_BYTES {
        return Err(SymGraphError::Transport {
            message: format!("message of {} bytes exceeds limit", length),
        });
    }

    let mut body = vec![0u8; length];
    reader.read_exact(&mut body).await?;
    Ok(Some(body))
}
