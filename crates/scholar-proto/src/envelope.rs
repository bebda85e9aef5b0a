//! Envelopes and the tags that classify them.

use std::fmt;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ProtoError, Result};
use crate::types::{CorrelationId, Identity};

/// Conversation family an envelope belongs to.
///
/// Protocols partition unrelated conversations so that a participant waiting
/// on one kind of reply never mistakes another for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Protocol {
    /// Tutor registration and topic queries.
    Directory,
    /// Learning-material requests.
    Resource,
    /// Contract-net negotiation between students and tutors.
    Negotiation,
    /// Facts sent to the metrics aggregator.
    Monitoring,
    /// Availability perturbations sent to tutors.
    Environment,
}

impl Protocol {
    /// Returns the wire tag for this protocol.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Directory => "directory",
            Self::Resource => "resource",
            Self::Negotiation => "negotiation",
            Self::Monitoring => "monitoring",
            Self::Environment => "environment",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Protocol {
    type Err = ProtoError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "directory" => Ok(Self::Directory),
            "resource" => Ok(Self::Resource),
            "negotiation" => Ok(Self::Negotiation),
            "monitoring" => Ok(Self::Monitoring),
            "environment" => Ok(Self::Environment),
            other => Err(ProtoError::UnknownTag {
                kind: "protocol",
                tag: other.to_string(),
            }),
        }
    }
}

/// Speech-act tag of an envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Performative {
    /// Ask for a resource.
    Request,
    /// Deliver information (replies, confirmations, events).
    Inform,
    /// Report that a request could not be served.
    Failure,
    /// Ask the directory for tutors.
    Query,
    /// Announce a tutor's topics to the directory.
    Register,
    /// Call for proposals.
    Cfp,
    /// Bid in answer to a call for proposals.
    Propose,
    /// Award the negotiation to a bidder.
    AcceptProposal,
    /// Decline a bid.
    RejectProposal,
}

impl Performative {
    /// Returns the wire tag for this performative.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Request => "request",
            Self::Inform => "inform",
            Self::Failure => "failure",
            Self::Query => "query",
            Self::Register => "register",
            Self::Cfp => "cfp",
            Self::Propose => "propose",
            Self::AcceptProposal => "accept-proposal",
            Self::RejectProposal => "reject-proposal",
        }
    }
}

impl fmt::Display for Performative {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Performative {
    type Err = ProtoError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "request" => Ok(Self::Request),
            "inform" => Ok(Self::Inform),
            "failure" => Ok(Self::Failure),
            "query" => Ok(Self::Query),
            "register" => Ok(Self::Register),
            "cfp" => Ok(Self::Cfp),
            "propose" => Ok(Self::Propose),
            "accept-proposal" => Ok(Self::AcceptProposal),
            "reject-proposal" => Ok(Self::RejectProposal),
            other => Err(ProtoError::UnknownTag {
                kind: "performative",
                tag: other.to_string(),
            }),
        }
    }
}

/// An immutable message between two named endpoints.
///
/// A reply is a new envelope built with [`reply_to`]: sender and recipient are
/// swapped and the correlation id is copied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// Conversation family.
    pub protocol: Protocol,
    /// Speech-act tag.
    pub performative: Performative,
    /// Who sent the envelope.
    #[serde(default)]
    pub sender: Identity,
    /// Who the envelope is addressed to.
    pub recipient: Identity,
    /// Conversation id shared by a request and its replies.
    pub correlation: CorrelationId,
    /// UTF-8 payload; structured bodies are flat JSON.
    #[serde(default)]
    pub body: String,
}

impl Envelope {
    /// Creates an envelope that opens a new conversation.
    #[must_use]
    pub fn new(
        protocol: Protocol,
        performative: Performative,
        sender: Identity,
        recipient: Identity,
        body: impl Into<String>,
    ) -> Self {
        Self {
            protocol,
            performative,
            sender,
            recipient,
            correlation: Uuid::new_v4(),
            body: body.into(),
        }
    }

    /// Replaces the correlation id (used to scope a request to a round).
    #[must_use]
    pub fn with_correlation(mut self, correlation: CorrelationId) -> Self {
        self.correlation = correlation;
        self
    }

    /// Decodes a JSON body into `T`.
    ///
    /// # Errors
    ///
    /// Returns [`ProtoError::Decoding`] if the body is not valid JSON for `T`.
    pub fn decode_body<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_str(&self.body)
            .map_err(|e| ProtoError::Decoding(format!("{} body: {e}", self.performative)))
    }

    /// Serializes the envelope to its JSON wire form.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| ProtoError::Encoding(e.to_string()))
    }

    /// Parses an envelope from its JSON wire form.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or a tag is unknown.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Builds the reply to `envelope`.
///
/// The reply swaps sender and recipient and copies the correlation id.
///
/// # Errors
///
/// Returns [`ProtoError::InvalidReply`] if `envelope` has no sender.
pub fn reply_to(
    envelope: &Envelope,
    performative: Performative,
    body: impl Into<String>,
) -> Result<Envelope> {
    if envelope.sender.is_empty() {
        return Err(ProtoError::InvalidReply {
            correlation: envelope.correlation,
        });
    }

    Ok(Envelope {
        protocol: envelope.protocol,
        performative,
        sender: envelope.recipient.clone(),
        recipient: envelope.sender.clone(),
        correlation: envelope.correlation,
        body: body.into(),
    })
}
