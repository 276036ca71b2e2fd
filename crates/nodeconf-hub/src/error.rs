//! Hub message errors.

use crate::message::MessageType;

#[derive(Debug, thiserror::Error)]
pub enum HubError {
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unexpected message type: expected {expected}, got {got}")]
    TypeMismatch {
        expected: MessageType,
        got: MessageType,
    },

    #[error("message for node {got}, expected {expected}")]
    NodeMismatch { expected: String, got: String },
}
