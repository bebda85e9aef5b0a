//! A student's learning state.

use scholar_proto::Topic;
use serde::{Deserialize, Serialize};

/// Full attention.
pub const MAX_ATTENTION: u32 = 100;

/// Topic, knowledge, goal and attention of one student.
///
/// Knowledge never decreases and stays within `[0, 1]`. Attention only drops
/// through effort or resets to [`MAX_ATTENTION`] after a break.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningProfile {
    /// What the student wants to learn.
    pub topic: Topic,
    /// Current knowledge in `[0, 1]`.
    pub knowledge: f64,
    /// Knowledge level that ends the run.
    pub goal: f64,
    /// Remaining attention in `[0, 100]`.
    pub attention: u32,
}

impl LearningProfile {
    /// Creates a rested profile with the default goal of 0.9.
    #[must_use]
    pub fn new(topic: impl Into<Topic>, knowledge: f64) -> Self {
        Self {
            topic: topic.into(),
            knowledge: knowledge.clamp(0.0, 1.0),
            goal: 0.9,
            attention: MAX_ATTENTION,
        }
    }

    /// Sets the goal.
    #[must_use]
    pub fn with_goal(mut self, goal: f64) -> Self {
        self.goal = goal;
        self
    }

    /// Sets the attention.
    #[must_use]
    pub fn with_attention(mut self, attention: u32) -> Self {
        self.attention = attention.min(MAX_ATTENTION);
        self
    }

    /// Returns true once knowledge reaches the goal.
    #[must_use]
    pub fn goal_met(&self) -> bool {
        self.knowledge >= self.goal
    }

    /// Absorbs `nominal` knowledge scaled by current attention, then pays
    /// `cost` attention. Returns the gain actually applied.
    pub fn study(&mut self, nominal: f64, cost: u32) -> f64 {
        let gain = nominal.max(0.0) * f64::from(self.attention) / f64::from(MAX_ATTENTION);
        let before = self.knowledge;
        self.knowledge = (self.knowledge + gain).clamp(before, 1.0);
        self.attention = self.attention.saturating_sub(cost);
        self.knowledge - before
    }

    /// A tutoring session brings knowledge to 1.0 and costs `cost` attention.
    pub fn tutored(&mut self, cost: u32) {
        self.knowledge = 1.0;
        self.attention = self.attention.saturating_sub(cost);
    }

    /// Restores full attention.
    pub fn rest(&mut self) {
        self.attention = MAX_ATTENTION;
    }
}
