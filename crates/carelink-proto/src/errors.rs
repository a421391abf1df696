//! Protocol error types.

use thiserror::Error;

/// Result alias for protocol operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors raised while decoding wire data or interpreting response envelopes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Frame or body is not valid JSON for the expected shape.
    #[error("malformed payload: {0}")]
    Malformed(String),

    /// Server answered with `success: false`.
    #[error("request rejected by server: {reason}")]
    Rejected {
        /// Server-provided reason, or a generic one when absent.
        reason: String,
    },

    /// Envelope reported success but omitted a required field.
    #[error("response missing field `{0}`")]
    MissingField(&'static str),
}

impl From<serde_json::Error> for ProtocolError {
    fn from(err: serde_json::Error) -> Self {
        Self::Malformed(err.to_string())
    }
}
