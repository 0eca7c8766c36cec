//! Error types for decoding push-channel messages and session bodies

use thiserror::Error;

/// Reasons a frame or response body could not be turned into a model
///
/// Every variant is a parse failure: the caller drops the frame and keeps
/// going.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The text is not valid JSON (or not the expected JSON shape)
    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The envelope has no `type` discriminator
    #[error("message has no type field")]
    MissingKind,

    /// The envelope names a kind this client does not handle
    #[error("unknown message type: {0}")]
    UnknownKind(String),

    /// The payload is not a JSON object
    #[error("{kind} payload is not an object")]
    NotAnObject {
        /// Message kind being decoded
        kind: &'static str,
    },

    /// A required field is absent
    #[error("{kind} payload is missing field {field}")]
    MissingField {
        /// Message kind being decoded
        kind: &'static str,
        /// Wire name of the field
        field: &'static str,
    },

    /// A required field is present but has an unusable value
    #[error("{kind} payload has invalid {field}: {reason}")]
    InvalidField {
        /// Message kind being decoded
        kind: &'static str,
        /// Wire name of the field
        field: &'static str,
        /// What was wrong with it
        reason: String,
    },
}
