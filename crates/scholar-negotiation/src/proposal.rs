//! Proposals, scoring and winner selection.

use scholar_proto::bodies::ProposalBody;
use scholar_proto::Identity;
use serde::{Deserialize, Serialize};

/// A tutor's bid in one round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Proposal {
    /// Who bid.
    pub bidder: Identity,
    /// Quoted wait before the session can start, in units.
    pub wait_time: f64,
    /// Quoted expertise in `[0, 1]`.
    pub expertise_level: f64,
}

impl Proposal {
    /// Creates a proposal.
    #[must_use]
    pub fn new(bidder: Identity, wait_time: f64, expertise_level: f64) -> Self {
        Self {
            bidder,
            wait_time,
            expertise_level,
        }
    }

    /// Builds a proposal from a decoded wire body.
    #[must_use]
    pub fn from_body(bidder: Identity, body: ProposalBody) -> Self {
        Self::new(bidder, body.wait_time, body.expertise_level)
    }
}

/// Converts a proposal into a cost. Lower is better.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringPolicy {
    /// Weight of missing expertise, in wait-time units.
    pub k: f64,
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self { k: 20.0 }
    }
}

impl ScoringPolicy {
    /// `wait_time + (1 - expertise_level) * k`.
    #[must_use]
    pub fn score(&self, proposal: &Proposal) -> f64 {
        proposal.wait_time + (1.0 - proposal.expertise_level) * self.k
    }
}

/// Outcome of selection.
#[derive(Debug, Clone, PartialEq)]
pub struct Award {
    /// Winning proposal.
    pub winner: Proposal,
    /// Winner's score.
    pub score: f64,
    /// Every other bidder, in arrival order.
    pub losers: Vec<Identity>,
}

/// Picks the lowest-cost proposal. Ties go to the earliest arrival.
///
/// Returns `None` when there are no proposals.
#[must_use]
pub fn select_winner(proposals: &[Proposal], policy: &ScoringPolicy) -> Option<Award> {
    let mut best: Option<(usize, f64)> = None;
    for (index, proposal) in proposals.iter().enumerate() {
        let score = policy.score(proposal);
        if best.is_none_or(|(_, current)| score < current) {
            best = Some((index, score));
        }
    }

    let (index, score) = best?;
    let losers = proposals
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != index)
        .map(|(_, p)| p.bidder.clone())
        .collect();

    Some(Award {
        winner: proposals[index].clone(),
        score,
        losers,
    })
}
