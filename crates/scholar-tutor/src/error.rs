//! Error types for scholar-tutor.

use scholar_bus::BusError;
use scholar_proto::{Performative, ProtoError};
use thiserror::Error;

/// Errors raised while a tutor handles an envelope.
#[derive(Debug, Error)]
pub enum TutorError {
    /// An exclusive tutor was asked to start a second session.
    #[error("tutor is busy with {active} session(s)")]
    Busy {
        /// Sessions currently running.
        active: u32,
    },

    /// The tutor does not act on this performative.
    #[error("unsupported performative: {0}")]
    Unsupported(Performative),

    /// A reply or report could not be delivered.
    #[error("delivery failed: {0}")]
    Bus(#[from] BusError),

    /// A body failed to encode or decode.
    #[error("protocol error: {0}")]
    Proto(#[from] ProtoError),
}

/// Result type for tutor operations.
pub type Result<T> = std::result::Result<T, TutorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        assert_eq!(
            TutorError::Busy { active: 1 }.to_string(),
            "tutor is busy with 1 session(s)"
        );
        assert_eq!(
            TutorError::Unsupported(Performative::Query).to_string(),
            "unsupported performative: query"
        );
    }
}
