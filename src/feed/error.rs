//! Error types for feed message decoding

use thiserror::Error;

/// Errors while classifying or decoding one feed message. Everything here
/// means "log and drop the message"; nothing propagates to the caller of
/// the dispatcher.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("message is not valid JSON")]
    Json(#[from] serde_json::Error),

    #[error("message has no object payload")]
    MissingPayload,

    #[error("payload field `{field}` is missing")]
    MissingField { field: &'static str },

    #[error("payload field `{field}` is malformed: {detail}")]
    InvalidField { field: &'static str, detail: String },
}
