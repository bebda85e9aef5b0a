//! Round-scoped negotiation state.

use scholar_proto::bodies::ProposalBody;
use scholar_proto::{CorrelationId, Envelope, Identity, Topic};
use tokio::time::Instant;
use uuid::Uuid;

use crate::error::{NegotiationError, Result};
use crate::proposal::{select_winner, Award, Proposal, ScoringPolicy};

/// Phase of a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoundPhase {
    /// Accepting proposals until the deadline.
    Collecting,
    /// A winner was chosen and is expected to confirm.
    Awarded,
    /// The winner confirmed the session.
    Confirmed,
    /// The round ended without a session.
    Aborted(AbortReason),
}

/// Why a round ended without a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AbortReason {
    /// The directory returned nobody.
    NoCandidates,
    /// Nobody proposed before the deadline.
    NoProposals,
    /// The winner could not be reached with the accept.
    WinnerUnreachable,
    /// The winner did not confirm in time.
    Unconfirmed,
    /// The winner refused the accept.
    Refused,
}

/// One call-for-proposals round.
///
/// Everything here is discarded when the round ends; a retry opens a new
/// round with a new correlation id, so late envelopes from this one are never
/// mistaken for the next.
#[derive(Debug, Clone)]
pub struct Round {
    id: CorrelationId,
    topic: Topic,
    candidates: Vec<Identity>,
    proposals: Vec<Proposal>,
    phase: RoundPhase,
    deadline: Instant,
    award: Option<Award>,
}

impl Round {
    /// Opens a round that collects proposals until `deadline`.
    #[must_use]
    pub fn new(topic: impl Into<Topic>, candidates: Vec<Identity>, deadline: Instant) -> Self {
        let phase = if candidates.is_empty() {
            RoundPhase::Aborted(AbortReason::NoCandidates)
        } else {
            RoundPhase::Collecting
        };
        Self {
            id: Uuid::new_v4(),
            topic: topic.into(),
            candidates,
            proposals: Vec::new(),
            phase,
            deadline,
            award: None,
        }
    }

    /// Correlation id shared by every envelope in this round.
    #[must_use]
    pub const fn id(&self) -> CorrelationId {
        self.id
    }

    /// Topic being negotiated.
    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Tutors invited to bid.
    #[must_use]
    pub fn candidates(&self) -> &[Identity] {
        &self.candidates
    }

    /// Proposals in arrival order.
    #[must_use]
    pub fn proposals(&self) -> &[Proposal] {
        &self.proposals
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> RoundPhase {
        self.phase
    }

    /// End of the collection window.
    #[must_use]
    pub const fn deadline(&self) -> Instant {
        self.deadline
    }

    /// The selection, once made.
    #[must_use]
    pub fn award(&self) -> Option<&Award> {
        self.award.as_ref()
    }

    /// Returns true until the round is confirmed or aborted.
    #[must_use]
    pub fn is_active(&self) -> bool {
        matches!(self.phase, RoundPhase::Collecting | RoundPhase::Awarded)
    }

    /// Records a proposal.
    pub fn add_proposal(&mut self, proposal: Proposal) -> Result<()> {
        if self.phase != RoundPhase::Collecting {
            return Err(NegotiationError::NotCollecting);
        }
        if !self.candidates.contains(&proposal.bidder) {
            return Err(NegotiationError::NotInvited(proposal.bidder));
        }
        if self.proposals.iter().any(|p| p.bidder == proposal.bidder) {
            return Err(NegotiationError::DuplicateProposal(proposal.bidder));
        }
        self.proposals.push(proposal);
        Ok(())
    }

    /// Decodes a `propose` envelope and records it.
    pub fn accept_envelope(&mut self, envelope: &Envelope) -> Result<()> {
        if envelope.correlation != self.id {
            return Err(NegotiationError::WrongRound {
                expected: self.id,
                got: envelope.correlation,
            });
        }
        let body = ProposalBody::parse(&envelope.body).map_err(|source| {
            NegotiationError::MalformedProposal {
                bidder: envelope.sender.clone(),
                source,
            }
        })?;
        self.add_proposal(Proposal::from_body(envelope.sender.clone(), body))
    }

    /// Ends collection and selects a winner.
    ///
    /// With no proposals the round aborts and `None` is returned.
    pub fn close(&mut self, policy: &ScoringPolicy) -> Result<Option<&Award>> {
        if self.phase != RoundPhase::Collecting {
            return Err(NegotiationError::AlreadyClosed);
        }

        self.award = select_winner(&self.proposals, policy);
        self.phase = if self.award.is_some() {
            RoundPhase::Awarded
        } else {
            RoundPhase::Aborted(AbortReason::NoProposals)
        };
        Ok(self.award.as_ref())
    }

    /// Marks the session as confirmed by the winner.
    pub fn confirm(&mut self) -> Result<()> {
        if self.phase != RoundPhase::Awarded {
            return Err(NegotiationError::NoAward);
        }
        self.phase = RoundPhase::Confirmed;
        Ok(())
    }

    /// Ends the round without a session and forgets the selection.
    pub fn abort(&mut self, reason: AbortReason) {
        self.award = None;
        self.phase = RoundPhase::Aborted(reason);
    }
}
