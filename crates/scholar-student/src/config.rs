//! Student configuration.

use scholar_negotiation::NegotiationConfig;
use serde::{Deserialize, Serialize};

/// Timing, learning and fatigue settings for a student. Times are in units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StudentConfig {
    /// Pause in START before asking for material.
    pub start_delay: f64,
    /// How long to wait for the resource manager.
    pub resource_timeout: f64,
    /// Pause before asking again after a busy rejection.
    pub busy_retry_delay: f64,
    /// Nominal knowledge value of one delivered resource.
    pub resource_gain: f64,
    /// Time spent studying a delivered resource.
    pub study_time: f64,
    /// Attention spent per study.
    pub study_attention_cost: u32,
    /// Below this attention the student must rest.
    pub attention_threshold: u32,
    /// Length of a break.
    pub break_duration: f64,
    /// How long to wait for the directory.
    pub directory_timeout: f64,
    /// Pause before restarting after a failed lookup or negotiation.
    pub backoff: f64,
    /// Time spent with the tutor after confirmation.
    pub tutoring_duration: f64,
    /// Attention spent per tutoring session.
    pub tutoring_attention_cost: u32,
    /// Knowledge level that ends the run.
    pub goal: f64,
    /// Contract Net settings.
    pub negotiation: NegotiationConfig,
}

impl Default for StudentConfig {
    fn default() -> Self {
        Self {
            start_delay: 1.0,
            resource_timeout: 30.0,
            busy_retry_delay: 10.0,
            resource_gain: 0.4,
            study_time: 3.0,
            study_attention_cost: 30,
            attention_threshold: 20,
            break_duration: 10.0,
            directory_timeout: 5.0,
            backoff: 10.0,
            tutoring_duration: 5.0,
            tutoring_attention_cost: 20,
            goal: 0.9,
            negotiation: NegotiationConfig::default(),
        }
    }
}
