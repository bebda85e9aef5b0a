//! Receive-side envelope selection.

use serde::{Deserialize, Serialize};

use crate::envelope::{Envelope, Performative, Protocol};
use crate::types::{CorrelationId, Identity};

/// A conjunction of optional field constraints.
///
/// A `None` field is a wildcard. [`Filter::any`] matches every envelope.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    /// Required protocol, if any.
    pub protocol: Option<Protocol>,
    /// Required performative, if any.
    pub performative: Option<Performative>,
    /// Required sender, if any.
    pub sender: Option<Identity>,
    /// Required correlation id, if any.
    pub correlation: Option<CorrelationId>,
}

impl Filter {
    /// A filter that matches everything.
    #[must_use]
    pub fn any() -> Self {
        Self::default()
    }

    /// Restricts the protocol.
    #[must_use]
    pub fn with_protocol(mut self, protocol: Protocol) -> Self {
        self.protocol = Some(protocol);
        self
    }

    /// Restricts the performative.
    #[must_use]
    pub fn with_performative(mut self, performative: Performative) -> Self {
        self.performative = Some(performative);
        self
    }

    /// Restricts the sender.
    #[must_use]
    pub fn with_sender(mut self, sender: Identity) -> Self {
        self.sender = Some(sender);
        self
    }

    /// Restricts the correlation id.
    #[must_use]
    pub fn with_correlation(mut self, correlation: CorrelationId) -> Self {
        self.correlation = Some(correlation);
        self
    }

    /// Returns true if every constrained field equals the envelope's.
    #[must_use]
    pub fn matches(&self, envelope: &Envelope) -> bool {
        self.protocol.is_none_or(|p| p == envelope.protocol)
            && self.performative.is_none_or(|p| p == envelope.performative)
            && self.sender.as_ref().is_none_or(|s| *s == envelope.sender)
            && self.correlation.is_none_or(|c| c == envelope.correlation)
    }
}

/// Free-function form of [`Filter::matches`].
#[must_use]
pub fn matches(envelope: &Envelope, filter: &Filter) -> bool {
    filter.matches(envelope)
}
