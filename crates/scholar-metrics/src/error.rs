//! Error types for scholar-metrics.

use scholar_proto::{Identity, Performative, ProtoError, Protocol};
use thiserror::Error;

/// Errors from event ingestion.
#[derive(Debug, Error)]
pub enum MetricsError {
    /// The body is not a monitoring event.
    #[error("malformed event from {sender}: {source}")]
    MalformedEvent {
        /// Who sent it.
        sender: Identity,
        /// Why parsing failed.
        #[source]
        source: ProtoError,
    },

    /// The envelope is not a monitoring `inform`.
    #[error("not a monitoring event: {protocol}/{performative}")]
    NotAnEvent {
        /// Protocol of the envelope.
        protocol: Protocol,
        /// Performative of the envelope.
        performative: Performative,
    },
}

/// Result type for metrics operations.
pub type Result<T> = std::result::Result<T, MetricsError>;
