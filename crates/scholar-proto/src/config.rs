//! Well-known endpoint configuration.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{ProtoError, Result};
use crate::types::Identity;

/// Addresses of the shared services every participant talks to.
///
/// Passed explicitly to each participant at construction so tests can stand up
/// isolated instances under different names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    /// Capability directory.
    pub directory: Identity,
    /// Learning-resource manager.
    pub resource: Identity,
    /// Metrics aggregator.
    pub monitor: Identity,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            directory: Identity::new("directory"),
            resource: Identity::new("resource_manager"),
            monitor: Identity::new("monitor"),
        }
    }
}

impl Endpoints {
    /// Returns the three service identities.
    #[must_use]
    pub fn all(&self) -> [&Identity; 3] {
        [&self.directory, &self.resource, &self.monitor]
    }
}

/// Inclusive range of time units a random delay is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UnitRange {
    /// Shortest delay.
    pub min: f64,
    /// Longest delay.
    pub max: f64,
}

impl UnitRange {
    /// Creates a range.
    #[must_use]
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// A range that always yields `units`.
    #[must_use]
    pub const fn fixed(units: f64) -> Self {
        Self::new(units, units)
    }

    /// Checks that both bounds are finite, non-negative and ordered.
    pub fn validate(&self) -> Result<()> {
        if !self.min.is_finite() || !self.max.is_finite() || self.min < 0.0 {
            return Err(ProtoError::Validation(format!(
                "range bounds must be finite and non-negative, got {}..={}",
                self.min, self.max
            )));
        }
        if self.min > self.max {
            return Err(ProtoError::Validation(format!(
                "range minimum {} exceeds maximum {}",
                self.min, self.max
            )));
        }
        Ok(())
    }

    /// Draws a value uniformly from the range.
    ///
    /// A degenerate or inverted range yields `min`.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        if self.min >= self.max || !self.max.is_finite() {
            return self.min;
        }
        rng.gen_range(self.min..=self.max)
    }
}
