//! Tutor availability, queueing and bid pricing.

use std::collections::BTreeSet;

use scholar_proto::bodies::ProposalBody;
use scholar_proto::Topic;
use serde::{Deserialize, Serialize};

use crate::config::TutorConfig;
use crate::error::{Result, TutorError};

/// How a tutor treats overlapping sessions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkloadPolicy {
    /// Bid and accept while busy; sessions run concurrently and busy quotes
    /// are priced higher.
    #[default]
    Queued,
    /// Bid only while idle and serve one student at a time.
    Exclusive,
}

/// Point-in-time view of a tutor's workload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkloadSnapshot {
    /// Sessions in progress.
    pub queue_length: u32,
    /// True when no session is running.
    pub available: bool,
    /// Availability imposed by the environment, if any.
    pub availability_override: Option<bool>,
}

/// Per-tutor workload state. Owned by the tutor's own loop.
#[derive(Debug, Clone)]
pub struct Workload {
    policy: WorkloadPolicy,
    queue_length: u32,
    expertise: BTreeSet<Topic>,
    availability_override: Option<bool>,
}

impl Workload {
    /// Creates an idle workload.
    pub fn new<I, T>(policy: WorkloadPolicy, expertise: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Topic>,
    {
        Self {
            policy,
            queue_length: 0,
            expertise: expertise.into_iter().map(Into::into).collect(),
            availability_override: None,
        }
    }

    /// Active policy.
    #[must_use]
    pub const fn policy(&self) -> WorkloadPolicy {
        self.policy
    }

    /// Topics this tutor teaches.
    #[must_use]
    pub fn expertise(&self) -> &BTreeSet<Topic> {
        &self.expertise
    }

    /// Sessions in progress.
    #[must_use]
    pub const fn queue_length(&self) -> u32 {
        self.queue_length
    }

    /// True while no session is running.
    #[must_use]
    pub const fn is_available(&self) -> bool {
        self.queue_length == 0
    }

    /// Availability used for pricing: the override if set, else the real one.
    #[must_use]
    pub fn quoted_availability(&self) -> bool {
        self.availability_override.unwrap_or(self.is_available())
    }

    /// Membership check on expertise.
    #[must_use]
    pub fn can_help(&self, topic: &str) -> bool {
        self.expertise.contains(topic)
    }

    /// Whether a call for proposals on `topic` gets a bid.
    #[must_use]
    pub fn should_bid(&self, topic: &str) -> bool {
        self.can_help(topic)
            && match self.policy {
                WorkloadPolicy::Queued => true,
                WorkloadPolicy::Exclusive => self.is_available(),
            }
    }

    /// Prices a bid from the current queue.
    #[must_use]
    pub fn quote(&self, config: &TutorConfig) -> ProposalBody {
        let wait_time = f64::from(self.queue_length) * config.wait_per_queued + config.wait_base;
        let expertise_level = if self.quoted_availability() {
            config.available_expertise
        } else {
            config.busy_expertise
        };
        ProposalBody::new(wait_time, expertise_level)
    }

    /// Counts a new session.
    ///
    /// # Errors
    ///
    /// Returns [`TutorError::Busy`] if an exclusive tutor is already teaching.
    pub fn begin_session(&mut self) -> Result<()> {
        if self.policy == WorkloadPolicy::Exclusive && !self.is_available() {
            return Err(TutorError::Busy {
                active: self.queue_length,
            });
        }
        self.queue_length += 1;
        Ok(())
    }

    /// Counts a finished session. Draining the queue clears any override.
    pub fn end_session(&mut self) {
        self.queue_length = self.queue_length.saturating_sub(1);
        if self.queue_length == 0 {
            self.availability_override = None;
        }
    }

    /// Imposes an availability for pricing until the queue next drains.
    pub fn set_availability_override(&mut self, available: bool) {
        self.availability_override = Some(available);
    }

    /// Current view.
    #[must_use]
    pub fn snapshot(&self) -> WorkloadSnapshot {
        WorkloadSnapshot {
            queue_length: self.queue_length,
            available: self.is_available(),
            availability_override: self.availability_override,
        }
    }
}
