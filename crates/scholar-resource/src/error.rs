//! Error types for scholar-resource.

use scholar_bus::BusError;
use scholar_proto::ProtoError;
use thiserror::Error;

/// Errors that can occur in the resource manager.
#[derive(Debug, Error)]
pub enum ResourceError {
    /// Configuration failed validation.
    #[error("invalid resource configuration: {0}")]
    InvalidConfig(String),

    /// A request arrived without a sender to answer.
    #[error("request without sender")]
    AnonymousRequest,

    /// The reply could not be delivered.
    #[error("delivery failed: {0}")]
    Bus(#[from] BusError),

    /// Envelope construction failed.
    #[error("protocol error: {0}")]
    Proto(#[from] ProtoError),
}

/// Result type for resource operations.
pub type Result<T> = std::result::Result<T, ResourceError>;
