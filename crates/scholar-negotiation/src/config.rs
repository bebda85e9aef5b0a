//! Negotiation timing and scoring settings.

use serde::{Deserialize, Serialize};

use crate::proposal::ScoringPolicy;

/// Initiator-side negotiation settings, in time units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NegotiationConfig {
    /// How long proposals are collected, measured from round start.
    pub proposal_window: f64,
    /// How long to wait for the winner's confirmation.
    pub confirmation_timeout: f64,
    /// Proposal scoring.
    pub scoring: ScoringPolicy,
}

impl Default for NegotiationConfig {
    fn default() -> Self {
        Self {
            proposal_window: 5.0,
            confirmation_timeout: 20.0,
            scoring: ScoringPolicy::default(),
        }
    }
}
