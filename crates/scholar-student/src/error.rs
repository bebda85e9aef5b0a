//! Error types for scholar-student.

use thiserror::Error;

/// Errors from the student state machine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StudentError {
    /// The event has no edge out of the current state.
    #[error("illegal transition: {event} in state {state}")]
    IllegalTransition {
        /// State name.
        state: &'static str,
        /// Event name.
        event: &'static str,
    },
}

/// Result type for student operations.
pub type Result<T> = std::result::Result<T, StudentError>;
