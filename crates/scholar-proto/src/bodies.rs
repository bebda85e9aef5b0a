//! Payload shapes for each protocol.
//!
//! | Protocol | Performative | Body |
//! |---|---|---|
//! | directory | register | JSON array of topics |
//! | directory | query | plain topic |
//! | directory | inform | JSON array of identities |
//! | resource | request | plain topic |
//! | resource | inform | resource URL or `ERROR_NOT_FOUND` |
//! | resource | failure | `ERROR_SERVER_BUSY` |
//! | negotiation | cfp | plain topic |
//! | negotiation | propose | [`ProposalBody`] |
//! | negotiation | inform | free-text confirmation |
//! | environment | inform | [`AvailabilityOverride`] |

use serde::{Deserialize, Serialize};

use crate::envelope::{Envelope, Performative};
use crate::error::{ProtoError, Result};
use crate::types::{Identity, Topic};

/// Body of a resource `inform` when the topic is unknown.
pub const ERROR_NOT_FOUND: &str = "ERROR_NOT_FOUND";

/// Body of a resource `failure` when the bandwidth budget is exhausted.
pub const ERROR_SERVER_BUSY: &str = "ERROR_SERVER_BUSY";

/// Confirmation text a tutor sends when a session starts.
pub const SESSION_STARTING: &str = "OK, starting session.";

/// A tutor's bid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProposalBody {
    /// Time units until the tutor can start.
    #[serde(default = "default_wait_time")]
    pub wait_time: f64,
    /// Quoted expertise in `[0, 1]`.
    #[serde(default = "default_expertise_level")]
    pub expertise_level: f64,
}

const fn default_wait_time() -> f64 {
    99.0
}

const fn default_expertise_level() -> f64 {
    0.1
}

impl ProposalBody {
    /// Creates a bid body.
    #[must_use]
    pub const fn new(wait_time: f64, expertise_level: f64) -> Self {
        Self {
            wait_time,
            expertise_level,
        }
    }

    /// Parses and range-checks a `propose` body.
    ///
    /// Missing fields fall back to a pessimistic bid (wait 99, expertise 0.1).
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed, the wait time is negative or
    /// not finite, or the expertise level is outside `[0, 1]`.
    pub fn parse(body: &str) -> Result<Self> {
        let parsed: Self = serde_json::from_str(body)?;
        if !parsed.wait_time.is_finite() || parsed.wait_time < 0.0 {
            return Err(ProtoError::Validation(format!(
                "wait_time must be a non-negative number, got {}",
                parsed.wait_time
            )));
        }
        if !(0.0..=1.0).contains(&parsed.expertise_level) {
            return Err(ProtoError::Validation(format!(
                "expertise_level must be within [0, 1], got {}",
                parsed.expertise_level
            )));
        }
        Ok(parsed)
    }

    /// Serializes the body to JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| ProtoError::Encoding(e.to_string()))
    }
}

/// Reply from the resource manager, as the student interprets it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceReply {
    /// A learning resource was delivered.
    Provided(String),
    /// The topic has no resource.
    NotFound,
    /// The bandwidth budget was exhausted.
    Busy,
}

impl ResourceReply {
    /// Classifies a resource-protocol reply envelope.
    ///
    /// # Errors
    ///
    /// Returns an error for performatives that are not resource replies.
    pub fn from_envelope(envelope: &Envelope) -> Result<Self> {
        match envelope.performative {
            Performative::Failure => Ok(Self::Busy),
            Performative::Inform if envelope.body.contains(ERROR_SERVER_BUSY) => Ok(Self::Busy),
            Performative::Inform if envelope.body.trim() == ERROR_NOT_FOUND => Ok(Self::NotFound),
            Performative::Inform if envelope.body.trim().is_empty() => Ok(Self::NotFound),
            Performative::Inform => Ok(Self::Provided(envelope.body.clone())),
            other => Err(ProtoError::Decoding(format!(
                "unexpected resource reply performative: {other}"
            ))),
        }
    }

    /// Returns the performative and body that encode this reply.
    #[must_use]
    pub fn to_parts(&self) -> (Performative, String) {
        match self {
            Self::Provided(url) => (Performative::Inform, url.clone()),
            Self::NotFound => (Performative::Inform, ERROR_NOT_FOUND.to_string()),
            Self::Busy => (Performative::Failure, ERROR_SERVER_BUSY.to_string()),
        }
    }
}

/// Environment instruction overriding a tutor's advertised availability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityOverride {
    /// The availability to advertise until the next queue drain.
    pub available: bool,
}

/// Encodes a tutor registration body.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn encode_topics<'a>(topics: impl IntoIterator<Item = &'a Topic>) -> Result<String> {
    let list: Vec<&Topic> = topics.into_iter().collect();
    serde_json::to_string(&list).map_err(|e| ProtoError::Encoding(e.to_string()))
}

/// Decodes a tutor registration body.
///
/// # Errors
///
/// Returns an error if the body is not a JSON array of strings.
pub fn decode_topics(body: &str) -> Result<Vec<Topic>> {
    Ok(serde_json::from_str(body)?)
}

/// Encodes a directory query answer.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn encode_identities(identities: &[Identity]) -> Result<String> {
    serde_json::to_string(identities).map_err(|e| ProtoError::Encoding(e.to_string()))
}

/// Decodes a directory query answer.
///
/// # Errors
///
/// Returns an error if the body is not a JSON array of strings.
pub fn decode_identities(body: &str) -> Result<Vec<Identity>> {
    Ok(serde_json::from_str(body)?)
}
