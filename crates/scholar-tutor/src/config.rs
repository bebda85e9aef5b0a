//! Tutor configuration.

use scholar_proto::UnitRange;
use serde::{Deserialize, Serialize};

use crate::workload::WorkloadPolicy;

/// Pricing and session settings for a tutor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TutorConfig {
    /// How concurrent sessions are handled.
    pub policy: WorkloadPolicy,
    /// Session length, in units.
    pub session_duration: UnitRange,
    /// Quoted wait with an empty queue.
    pub wait_base: f64,
    /// Extra quoted wait per queued session.
    pub wait_per_queued: f64,
    /// Quoted expertise while available.
    pub available_expertise: f64,
    /// Quoted expertise while busy.
    pub busy_expertise: f64,
}

impl Default for TutorConfig {
    fn default() -> Self {
        Self {
            policy: WorkloadPolicy::default(),
            session_duration: UnitRange::new(10.0, 20.0),
            wait_base: 5.0,
            wait_per_queued: 5.0,
            available_expertise: 0.9,
            busy_expertise: 0.7,
        }
    }
}

impl TutorConfig {
    /// Sets the workload policy.
    #[must_use]
    pub fn with_policy(mut self, policy: WorkloadPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Sets the session length range.
    #[must_use]
    pub fn with_session_duration(mut self, duration: UnitRange) -> Self {
        self.session_duration = duration;
        self
    }
}
