//! Wire protocol for the relay session.
//!
//! # Responsibilities
//! - Define the inbound and outbound message shapes
//! - Validate arbitrary frames into [`TransactionRequest`]s
//!
//! # Design Decisions
//! - Validation is total over arbitrary input bytes: malformed content
//!   produces a displayable error, never a panic
//! - Binary frames are decoded as UTF-8 before parsing
//! - No request id is assumed recoverable from a malformed payload

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Discriminant accepted for transaction submission requests.
const SEND_TRANSACTION: &str = "sendTransaction";

/// One opaque frame delivered by the transport.
#[derive(Debug, Clone)]
pub enum Frame {
    Text(String),
    Binary(Vec<u8>),
}

/// A validated client request to submit one transaction.
///
/// The `id` is a client-supplied correlation key. The relay does not
/// deduplicate: a reused id produces two responses bearing that id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRequest {
    /// Client-supplied correlation id.
    pub id: i64,
    /// Destination address, 0x-prefixed hex.
    pub to: String,
    /// Native token value, hex-encoded unsigned integer.
    pub value: String,
    /// Call data payload, hex-encoded.
    pub input: String,
}

/// Outbound server message, one per inbound request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    /// The transaction was included; carries the ledger receipt verbatim.
    #[serde(rename = "txSuccess")]
    TxSuccess { id: i64, receipt: serde_json::Value },

    /// The request failed. `id` is absent only when the inbound frame
    /// could not be parsed at all.
    #[serde(rename = "error")]
    Error {
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<i64>,
    },
}

/// Why an inbound frame was rejected before reaching the queue.
#[derive(Debug, Clone, Error)]
pub enum ValidationError {
    #[error("invalid JSON: {0}")]
    Json(String),

    #[error("{0}")]
    Shape(String),
}

/// Validate one transport frame into a [`TransactionRequest`].
///
/// Total over arbitrary input: every failure maps to a [`ValidationError`]
/// whose `Display` output is suitable for direct delivery to the client.
pub fn validate(frame: &Frame) -> Result<TransactionRequest, ValidationError> {
    let text = match frame {
        Frame::Text(text) => text.as_str().into(),
        Frame::Binary(bytes) => String::from_utf8_lossy(bytes),
    };
    validate_text(&text)
}

fn validate_text(raw: &str) -> Result<TransactionRequest, ValidationError> {
    let parsed: serde_json::Value =
        serde_json::from_str(raw).map_err(|e| ValidationError::Json(e.to_string()))?;

    let body = parsed
        .as_object()
        .ok_or_else(|| shape("message must be a JSON object"))?;

    match body.get("type").and_then(serde_json::Value::as_str) {
        Some(SEND_TRANSACTION) => {}
        Some(other) => return Err(shape(&format!("unsupported request type '{}'", other))),
        None => return Err(shape("missing or non-string field 'type'")),
    }

    let id = body
        .get("id")
        .and_then(serde_json::Value::as_i64)
        .ok_or_else(|| shape("missing or non-integer field 'id'"))?;

    Ok(TransactionRequest {
        id,
        to: string_field(body, "to")?,
        value: string_field(body, "value")?,
        input: string_field(body, "input")?,
    })
}

fn string_field(
    body: &serde_json::Map<String, serde_json::Value>,
    name: &str,
) -> Result<String, ValidationError> {
    body.get(name)
        .and_then(serde_json::Value::as_str)
        .map(str::to_owned)
        .ok_or_else(|| shape(&format!("missing or non-string field '{}'", name)))
}

fn shape(message: &str) -> ValidationError {
    ValidationError::Shape(message.to_string())
}
