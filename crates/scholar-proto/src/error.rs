//! Error types for the scholar-proto crate.

use thiserror::Error;

/// Errors that can occur while building or decoding envelopes.
#[derive(Debug, Error)]
pub enum ProtoError {
    /// A reply was requested for an envelope that carries no sender.
    #[error("cannot reply to envelope {correlation}: it has no sender")]
    InvalidReply {
        /// Correlation id of the envelope that could not be answered.
        correlation: uuid::Uuid,
    },

    /// A body or envelope failed to decode.
    #[error("decoding error: {0}")]
    Decoding(String),

    /// A body or envelope failed to encode.
    #[error("encoding error: {0}")]
    Encoding(String),

    /// An unknown protocol or performative tag was seen.
    #[error("unknown {kind} tag: {tag}")]
    UnknownTag {
        /// Which tag family was being parsed.
        kind: &'static str,
        /// The offending tag.
        tag: String,
    },

    /// A decoded value violates a documented range.
    #[error("validation error: {0}")]
    Validation(String),
}

/// Result type for protocol operations.
pub type Result<T> = std::result::Result<T, ProtoError>;

impl From<serde_json::Error> for ProtoError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decoding(err.to_string())
    }
}
