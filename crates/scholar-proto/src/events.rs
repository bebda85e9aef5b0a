//! Monitoring facts emitted by the core and replayed by the aggregator.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ProtoError, Result};
use crate::types::{Identity, Topic};

/// Tag of a monitoring event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MonitorEventKind {
    /// A student began its learning lifecycle.
    StudentStart,
    /// A student reached its knowledge goal.
    StudentFinish,
    /// A student decided to look for a tutor.
    StudentRequestHelp,
    /// A student awarded a negotiation to a tutor.
    StudentFoundTutor,
    /// A tutor started a session.
    SessionStart,
    /// The resource manager delivered a resource.
    ResourceProvided,
}

impl fmt::Display for MonitorEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::StudentStart => "STUDENT_START",
            Self::StudentFinish => "STUDENT_FINISH",
            Self::StudentRequestHelp => "STUDENT_REQUEST_HELP",
            Self::StudentFoundTutor => "STUDENT_FOUND_TUTOR",
            Self::SessionStart => "SESSION_START",
            Self::ResourceProvided => "RESOURCE_PROVIDED",
        };
        f.write_str(s)
    }
}

/// A fact sent to the monitor.
///
/// On the wire this is a flat JSON object whose `event` field carries the
/// [`MonitorEventKind`] tag and whose `timestamp` is in simulation time units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MonitorEvent {
    /// A student began its learning lifecycle.
    StudentStart {
        /// The student.
        student: Identity,
        /// Knowledge at start.
        knowledge: f64,
        /// Knowledge goal.
        goal: f64,
        /// Topic being learned.
        topic: Topic,
        /// Emission time.
        timestamp: f64,
    },
    /// A student reached its knowledge goal.
    StudentFinish {
        /// The student.
        student: Identity,
        /// Knowledge at finish.
        knowledge: f64,
        /// Emission time.
        timestamp: f64,
    },
    /// A student decided to look for a tutor.
    StudentRequestHelp {
        /// The student.
        student: Identity,
        /// Topic help is needed with.
        topic: Topic,
        /// Emission time.
        timestamp: f64,
    },
    /// A student awarded a negotiation to a tutor.
    StudentFoundTutor {
        /// The student.
        student: Identity,
        /// The winning tutor.
        tutor: Identity,
        /// Emission time.
        timestamp: f64,
    },
    /// A tutor started a session.
    SessionStart {
        /// The tutor.
        tutor: Identity,
        /// The student being taught.
        student: Identity,
        /// Emission time.
        timestamp: f64,
    },
    /// The resource manager delivered a resource.
    ResourceProvided {
        /// Requested topic.
        topic: Topic,
        /// Delivered resource identifier.
        resource: String,
        /// Who asked.
        requester: Identity,
        /// Emission time.
        timestamp: f64,
    },
}

impl MonitorEvent {
    /// Returns the event's tag.
    #[must_use]
    pub const fn kind(&self) -> MonitorEventKind {
        match self {
            Self::StudentStart { .. } => MonitorEventKind::StudentStart,
            Self::StudentFinish { .. } => MonitorEventKind::StudentFinish,
            Self::StudentRequestHelp { .. } => MonitorEventKind::StudentRequestHelp,
            Self::StudentFoundTutor { .. } => MonitorEventKind::StudentFoundTutor,
            Self::SessionStart { .. } => MonitorEventKind::SessionStart,
            Self::ResourceProvided { .. } => MonitorEventKind::ResourceProvided,
        }
    }

    /// Returns the emission timestamp.
    #[must_use]
    pub const fn timestamp(&self) -> f64 {
        match self {
            Self::StudentStart { timestamp, .. }
            | Self::StudentFinish { timestamp, .. }
            | Self::StudentRequestHelp { timestamp, .. }
            | Self::StudentFoundTutor { timestamp, .. }
            | Self::SessionStart { timestamp, .. }
            | Self::ResourceProvided { timestamp, .. } => *timestamp,
        }
    }

    /// Returns the student the event is about, if any.
    #[must_use]
    pub const fn student(&self) -> Option<&Identity> {
        match self {
            Self::StudentStart { student, .. }
            | Self::StudentFinish { student, .. }
            | Self::StudentRequestHelp { student, .. }
            | Self::StudentFoundTutor { student, .. }
            | Self::SessionStart { student, .. } => Some(student),
            Self::ResourceProvided { .. } => None,
        }
    }

    /// Serializes the event to its wire body.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| ProtoError::Encoding(e.to_string()))
    }

    /// Parses an event from its wire body.
    ///
    /// # Errors
    ///
    /// Returns an error if the body is malformed or the tag is unknown.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
