//! Error types for scholar-bus.

use scholar_proto::{Identity, ProtoError};
use thiserror::Error;

/// Errors that can occur while routing envelopes.
#[derive(Debug, Error)]
pub enum BusError {
    /// No live endpoint is registered under the recipient's name.
    #[error("unknown recipient: {0}")]
    UnknownRecipient(Identity),

    /// An endpoint with this name is already live.
    #[error("endpoint already registered: {0}")]
    AlreadyRegistered(Identity),

    /// Building the envelope failed.
    #[error("protocol error: {0}")]
    Proto(#[from] ProtoError),
}

/// Result type for bus operations.
pub type Result<T> = std::result::Result<T, BusError>;
