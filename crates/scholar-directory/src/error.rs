//! Error types for scholar-directory.

use scholar_bus::BusError;
use scholar_proto::{Identity, Performative, ProtoError};
use thiserror::Error;

/// Errors raised while handling a directory envelope.
///
/// None of these reach the sender; the service logs them and moves on.
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// A registration body was not a JSON array of topics.
    #[error("malformed registration from {sender}: {source}")]
    MalformedRegistration {
        /// Who sent it.
        sender: Identity,
        /// Decoding failure.
        #[source]
        source: ProtoError,
    },

    /// A registration arrived without a sender identity.
    #[error("registration without sender")]
    AnonymousRegistration,

    /// The envelope's performative is not served by the directory.
    #[error("unsupported performative: {0}")]
    Unsupported(Performative),

    /// The reply could not be delivered.
    #[error("delivery failed: {0}")]
    Bus(#[from] BusError),

    /// The reply body could not be encoded.
    #[error("protocol error: {0}")]
    Proto(#[from] ProtoError),
}

/// Result type for directory operations.
pub type Result<T> = std::result::Result<T, DirectoryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = DirectoryError::MalformedRegistration {
            sender: Identity::new("tutor1"),
            source: ProtoError::Decoding("expected array".to_string()),
        };
        assert_eq!(
            err.to_string(),
            "malformed registration from tutor1: decoding error: expected array"
        );

        let err = DirectoryError::Unsupported(Performative::Cfp);
        assert_eq!(err.to_string(), "unsupported performative: cfp");
    }
}
