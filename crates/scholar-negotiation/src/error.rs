//! Error types for scholar-negotiation.

use scholar_bus::BusError;
use scholar_proto::{CorrelationId, Identity, ProtoError};
use thiserror::Error;

/// Errors during a negotiation round.
#[derive(Debug, Error)]
pub enum NegotiationError {
    /// Proposals can only be added while the round is collecting.
    #[error("round is not collecting proposals")]
    NotCollecting,

    /// The round was already closed.
    #[error("round already closed")]
    AlreadyClosed,

    /// The round has no award to act on.
    #[error("round has no award")]
    NoAward,

    /// An envelope belongs to a different round.
    #[error("envelope for round {got} does not belong to round {expected}")]
    WrongRound {
        /// This round's correlation id.
        expected: CorrelationId,
        /// The envelope's correlation id.
        got: CorrelationId,
    },

    /// A proposal came from someone who was not sent a call for proposals.
    #[error("proposal from uninvited bidder {0}")]
    NotInvited(Identity),

    /// A bidder proposed twice in one round.
    #[error("duplicate proposal from {0}")]
    DuplicateProposal(Identity),

    /// A proposal body did not parse or was out of range.
    #[error("malformed proposal from {bidder}: {source}")]
    MalformedProposal {
        /// Who sent it.
        bidder: Identity,
        /// Parse failure.
        #[source]
        source: ProtoError,
    },

    /// The accept could not reach the winner.
    #[error("delivery failed: {0}")]
    Bus(#[from] BusError),
}

/// Result type for negotiation operations.
pub type Result<T> = std::result::Result<T, NegotiationError>;
