//! Simulation time.
//!
//! Every delay and timeout in the system is expressed in abstract time units.
//! A [`Clock`] maps units to real durations and stamps events with the number
//! of units elapsed since its origin.

use std::time::Duration;

use tokio::time::Instant;

/// Upper bound on any single wait, roughly thirty years.
const MAX_WAIT: Duration = Duration::from_secs(86_400 * 365 * 30);

/// Converts time units to durations and measures elapsed units.
#[derive(Debug, Clone, Copy)]
pub struct Clock {
    origin: Instant,
    unit: Duration,
}

impl Clock {
    /// Creates a clock whose origin is now.
    #[must_use]
    pub fn new(unit: Duration) -> Self {
        Self {
            origin: Instant::now(),
            unit,
        }
    }

    /// Length of one time unit.
    #[must_use]
    pub const fn unit(&self) -> Duration {
        self.unit
    }

    /// Converts a number of units to a duration. Negative or non-finite values
    /// map to zero; very large values saturate at about thirty years.
    #[must_use]
    pub fn duration(&self, units: f64) -> Duration {
        if !units.is_finite() || units <= 0.0 {
            return Duration::ZERO;
        }
        Duration::try_from_secs_f64(self.unit.as_secs_f64() * units)
            .map_or(MAX_WAIT, |d| d.min(MAX_WAIT))
    }

    /// Returns the instant `units` from now.
    #[must_use]
    pub fn deadline(&self, units: f64) -> Instant {
        Instant::now() + self.duration(units)
    }

    /// Units elapsed since the clock's origin.
    #[must_use]
    pub fn now(&self) -> f64 {
        if self.unit.is_zero() {
            return 0.0;
        }
        self.origin.elapsed().as_secs_f64() / self.unit.as_secs_f64()
    }

    /// Sleeps for the given number of units.
    pub async fn sleep(&self, units: f64) {
        tokio::time::sleep(self.duration(units)).await;
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}
