//! Response correlation.
//!
//! Guarantees the 1:1 response invariant: every completed task maps to
//! exactly one outbound message tagged with its originating request id, and
//! the wire shape stays stable regardless of how the queue's internal result
//! type evolves. No business logic lives here.

use serde::Serialize;

use crate::protocol::{ServerMessage, ValidationError};
use crate::relay::queue::Completion;

/// Map a task completion to its single outbound response.
pub fn respond<R: Serialize>(completion: Completion<R>) -> ServerMessage {
    let id = completion.task.request.id;

    match completion.outcome {
        Ok(receipt) => match serde_json::to_value(&receipt) {
            Ok(receipt) => ServerMessage::TxSuccess { id, receipt },
            // A receipt the ledger produced but we cannot encode still owes
            // the client its one response.
            Err(err) => ServerMessage::Error {
                message: format!("failed to encode receipt: {}", err),
                id: Some(id),
            },
        },
        Err(err) => ServerMessage::Error {
            message: err.to_string(),
            id: Some(id),
        },
    }
}

/// Map a validation failure to an uncorrelated error response.
///
/// No task was ever created, and no id is assumed recoverable from a
/// malformed payload.
pub fn rejected(err: &ValidationError) -> ServerMessage {
    ServerMessage::Error {
        message: err.to_string(),
        id: None,
    }
}
