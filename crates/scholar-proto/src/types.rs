//! Core identifier types.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A subject a student wants to learn or a tutor can teach.
pub type Topic = String;

/// Opaque id tying a reply to the envelope that caused it.
pub type CorrelationId = Uuid;

/// Globally unique endpoint name (e.g. `"tutor1"`).
///
/// Identities are used as map keys everywhere and are never shared by two
/// participants at the same time.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    /// Creates an identity from a name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if the identity is the empty name (an unset sender).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Identity {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Identity {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl AsRef<str> for Identity {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
