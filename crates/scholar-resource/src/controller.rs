//! Admission-controlled resource lookup.

use scholar_bus::Reporter;
use scholar_proto::bodies::ResourceReply;
use scholar_proto::{Clock, Identity, MonitorEvent, Topic, UnitRange};
use tracing::{debug, info};

use crate::budget::AdmissionBudget;
use crate::config::ResourceConfig;
use crate::error::Result;
use crate::knowledge::KnowledgeBase;

/// A delivered learning resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    /// Topic as requested.
    pub topic: Topic,
    /// Material location.
    pub url: String,
}

/// Why a fetch was turned away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Every delivery slot was in use.
    ServerBusy,
}

/// Result of [`ResourceController::fetch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The material was delivered.
    Provided(Resource),
    /// No slot was free; nothing was charged.
    Rejected(RejectReason),
    /// The topic is not in the knowledge base.
    NotFound,
}

impl FetchOutcome {
    /// Wire form of this outcome.
    #[must_use]
    pub fn to_reply(&self) -> ResourceReply {
        match self {
            Self::Provided(resource) => ResourceReply::Provided(resource.url.clone()),
            Self::Rejected(RejectReason::ServerBusy) => ResourceReply::Busy,
            Self::NotFound => ResourceReply::NotFound,
        }
    }
}

/// Serves fetches against a knowledge base under a fixed admission budget.
#[derive(Debug)]
pub struct ResourceController {
    budget: AdmissionBudget,
    knowledge: KnowledgeBase,
    delivery_delay: UnitRange,
    clock: Clock,
    reporter: Option<Reporter>,
}

impl ResourceController {
    /// Builds a controller from validated configuration.
    pub fn new(config: ResourceConfig, clock: Clock) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            budget: AdmissionBudget::new(config.capacity),
            knowledge: config.knowledge_base,
            delivery_delay: config.delivery_delay,
            clock,
            reporter: None,
        })
    }

    /// Emits `RESOURCE_PROVIDED` through `reporter` on every delivery.
    #[must_use]
    pub fn with_reporter(mut self, reporter: Reporter) -> Self {
        self.reporter = Some(reporter);
        self
    }

    /// The admission budget, for inspection.
    #[must_use]
    pub fn budget(&self) -> &AdmissionBudget {
        &self.budget
    }

    /// Looks up `topic` for `requester`.
    ///
    /// Rejection is immediate. An admitted fetch holds its slot for the whole
    /// simulated delivery, hit or miss, and releases it on every exit path.
    pub async fn fetch(&self, topic: &str, requester: &Identity) -> FetchOutcome {
        let Some(_slot) = self.budget.try_acquire() else {
            info!(
                requester = %requester,
                topic = %topic,
                capacity = self.budget.capacity(),
                "server busy, rejecting fetch"
            );
            return FetchOutcome::Rejected(RejectReason::ServerBusy);
        };

        let delay = self.delivery_delay.sample(&mut rand::thread_rng());
        debug!(
            requester = %requester,
            topic = %topic,
            in_use = self.budget.in_use(),
            delay,
            "fetch admitted"
        );
        let found = self.knowledge.lookup(topic).map(str::to_owned);
        self.clock.sleep(delay).await;

        let Some(url) = found else {
            info!(requester = %requester, topic = %topic, "topic not in knowledge base");
            return FetchOutcome::NotFound;
        };

        if let Some(reporter) = &self.reporter {
            reporter.emit(&MonitorEvent::ResourceProvided {
                topic: topic.to_string(),
                resource: url.clone(),
                requester: requester.clone(),
                timestamp: reporter.now(),
            });
        }

        info!(requester = %requester, topic = %topic, url = %url, "resource provided");
        FetchOutcome::Provided(Resource {
            topic: topic.to_string(),
            url,
        })
    }
}
