//! Student participant: performs each state's I/O and feeds the outcome to
//! [`transition`].

use scholar_bus::{Mailbox, Outbox, Reporter};
use scholar_negotiation::{Confirmation, ContractNet, Round};
use scholar_proto::bodies::{decode_identities, ResourceReply};
use scholar_proto::{
    Clock, CorrelationId, Endpoints, Filter, Identity, MonitorEvent, Performative, Protocol,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::StudentConfig;
use crate::error::Result;
use crate::fsm::{transition, Effect, Report, StudentEvent, StudentState, Transition};
use crate::profile::LearningProfile;

/// What a finished or cancelled student leaves behind.
#[derive(Debug, Clone, PartialEq)]
pub struct StudentRun {
    /// Profile at the end of the run.
    pub profile: LearningProfile,
    /// Every state entered, in order, starting with `START`.
    pub visited: Vec<&'static str>,
    /// True if the student reached `FINISH`.
    pub finished: bool,
}

impl StudentRun {
    /// How many times `state` was entered.
    #[must_use]
    pub fn visits(&self, state: &str) -> usize {
        self.visited.iter().filter(|s| **s == state).count()
    }
}

/// A student working towards its knowledge goal.
#[derive(Debug)]
pub struct StudentAgent {
    profile: LearningProfile,
    config: StudentConfig,
    endpoints: Endpoints,
    outbox: Outbox,
    reporter: Reporter,
    clock: Clock,
    net: ContractNet,
    round: Option<Round>,
}

impl StudentAgent {
    /// Creates a student. The profile's goal is taken from `config`.
    pub fn new(
        topic: impl Into<String>,
        knowledge: f64,
        config: StudentConfig,
        endpoints: Endpoints,
        outbox: Outbox,
        clock: Clock,
    ) -> Self {
        let profile = LearningProfile::new(topic, knowledge).with_goal(config.goal);
        let reporter = Reporter::new(outbox.clone(), endpoints.monitor.clone(), clock);
        let net = ContractNet::new(config.negotiation, clock);
        Self {
            profile,
            config,
            endpoints,
            outbox,
            reporter,
            clock,
            net,
            round: None,
        }
    }

    /// This student's identity.
    #[must_use]
    pub fn identity(&self) -> &Identity {
        self.outbox.identity()
    }

    /// Current learning profile.
    #[must_use]
    pub const fn profile(&self) -> &LearningProfile {
        &self.profile
    }

    /// Runs the state machine until `FINISH` or until `cancel` fires.
    pub async fn run(mut self, mut mailbox: Mailbox, cancel: CancellationToken) -> StudentRun {
        self.reporter.emit(&MonitorEvent::StudentStart {
            student: self.identity().clone(),
            knowledge: self.profile.knowledge,
            goal: self.profile.goal,
            topic: self.profile.topic.clone(),
            timestamp: self.reporter.now(),
        });
        info!(
            student = %self.identity(),
            topic = %self.profile.topic,
            knowledge = self.profile.knowledge,
            goal = self.profile.goal,
            "student started"
        );

        let mut state = StudentState::Start;
        let mut visited = vec![state.name()];

        while !state.is_terminal() {
            let stepped = tokio::select! {
                () = cancel.cancelled() => None,
                next = self.step(state.clone(), &mut mailbox) => Some(next),
            };
            match stepped {
                None => {
                    info!(student = %self.identity(), state = %state, "student stopped before finishing");
                    break;
                }
                Some(Err(e)) => {
                    warn!(student = %self.identity(), error = %e, "student halted");
                    break;
                }
                Some(Ok(next)) => {
                    debug!(student = %self.identity(), from = %state, to = %next, "transition");
                    visited.push(next.name());
                    state = next;
                }
            }
        }

        StudentRun {
            finished: state.is_terminal(),
            profile: self.profile,
            visited,
        }
    }

    async fn step(&mut self, state: StudentState, mailbox: &mut Mailbox) -> Result<StudentState> {
        let event = self.perform(&state, mailbox).await;
        let Transition { next, effects } =
            transition(&mut self.profile, state, event, &self.config)?;
        for effect in effects {
            self.apply(effect).await;
        }
        if matches!(next, StudentState::Start) {
            self.round = None;
        }
        Ok(next)
    }

    async fn perform(&mut self, state: &StudentState, mailbox: &mut Mailbox) -> StudentEvent {
        match state {
            StudentState::Start
            | StudentState::EvaluateKnowledge { .. }
            | StudentState::TakeBreak
            | StudentState::Finish => StudentEvent::Entered,
            StudentState::RequestResources => self.request_resource(),
            StudentState::AwaitResources { request } => self.await_resource(*request, mailbox).await,
            StudentState::QueryDirectory => self.query_directory(),
            StudentState::AwaitDirectory { query } => self.await_directory(*query, mailbox).await,
            StudentState::StartCnp { candidates } => {
                let round = self.net.open(self.profile.topic.clone(), candidates.clone());
                let invited = self.net.broadcast(&self.outbox, &round);
                let id = round.id();
                self.round = Some(round);
                StudentEvent::CfpSent { round: id, invited }
            }
            StudentState::AwaitProposals { round } => {
                let Some(current) = self.round.as_mut().filter(|r| r.id() == *round) else {
                    return StudentEvent::ProposalsCollected(0);
                };
                StudentEvent::ProposalsCollected(self.net.collect(mailbox, current).await)
            }
            StudentState::SelectTutor { round } => {
                let Some(current) = self.round.as_mut().filter(|r| r.id() == *round) else {
                    return StudentEvent::NoAward;
                };
                match self.net.award(&self.outbox, current) {
                    Ok(Some(award)) => StudentEvent::Awarded(award.winner.bidder),
                    Ok(None) => StudentEvent::NoAward,
                    Err(e) => {
                        warn!(student = %self.outbox.identity(), error = %e, "award failed");
                        StudentEvent::NoAward
                    }
                }
            }
            StudentState::AwaitTutoring { round, .. } => {
                let Some(current) = self.round.as_mut().filter(|r| r.id() == *round) else {
                    return StudentEvent::SessionUnconfirmed;
                };
                let confirmation = self.net.await_confirmation(mailbox, current).await;
                self.round = None;
                match confirmation {
                    Ok(Confirmation::Confirmed(_)) => StudentEvent::SessionConfirmed,
                    Ok(Confirmation::Refused(_) | Confirmation::TimedOut) => {
                        StudentEvent::SessionUnconfirmed
                    }
                    Err(e) => {
                        warn!(student = %self.outbox.identity(), error = %e, "confirmation failed");
                        StudentEvent::SessionUnconfirmed
                    }
                }
            }
        }
    }

    fn request_resource(&self) -> StudentEvent {
        match self.outbox.send(
            Protocol::Resource,
            Performative::Request,
            &self.endpoints.resource,
            self.profile.topic.as_str(),
        ) {
            Ok(request) => {
                debug!(student = %self.identity(), topic = %self.profile.topic, "resource requested");
                StudentEvent::ResourceRequested(request)
            }
            Err(e) => {
                warn!(student = %self.identity(), error = %e, "resource request not delivered");
                StudentEvent::SendFailed
            }
        }
    }

    async fn await_resource(&self, request: CorrelationId, mailbox: &mut Mailbox) -> StudentEvent {
        let filter = Filter::any()
            .with_protocol(Protocol::Resource)
            .with_sender(self.endpoints.resource.clone())
            .with_correlation(request);
        let deadline = self.clock.deadline(self.config.resource_timeout);

        while let Some(envelope) = mailbox.recv_matching(&filter, deadline).await {
            match ResourceReply::from_envelope(&envelope) {
                Ok(reply) => {
                    info!(student = %self.identity(), reply = ?reply, "resource reply");
                    return StudentEvent::ResourceReply(reply);
                }
                Err(e) => warn!(student = %self.identity(), error = %e, "malformed resource reply"),
            }
        }

        info!(student = %self.identity(), "resource request timed out");
        StudentEvent::ResourceTimeout
    }

    fn query_directory(&self) -> StudentEvent {
        match self.outbox.send(
            Protocol::Directory,
            Performative::Query,
            &self.endpoints.directory,
            self.profile.topic.as_str(),
        ) {
            Ok(query) => StudentEvent::DirectoryQueried(query),
            Err(e) => {
                warn!(student = %self.identity(), error = %e, "directory query not delivered");
                StudentEvent::SendFailed
            }
        }
    }

    async fn await_directory(&self, query: CorrelationId, mailbox: &mut Mailbox) -> StudentEvent {
        let filter = Filter::any()
            .with_protocol(Protocol::Directory)
            .with_performative(Performative::Inform)
            .with_sender(self.endpoints.directory.clone())
            .with_correlation(query);
        let deadline = self.clock.deadline(self.config.directory_timeout);

        let Some(envelope) = mailbox.recv_matching(&filter, deadline).await else {
            info!(student = %self.identity(), "directory did not answer");
            return StudentEvent::DirectoryUnavailable;
        };
        match decode_identities(&envelope.body) {
            Ok(tutors) => {
                info!(student = %self.identity(), tutors = tutors.len(), "directory answered");
                StudentEvent::DirectoryReply(tutors)
            }
            Err(e) => {
                warn!(student = %self.identity(), error = %e, "malformed directory reply");
                StudentEvent::DirectoryUnavailable
            }
        }
    }

    async fn apply(&self, effect: Effect) {
        match effect {
            Effect::Delay(units) => self.clock.sleep(units).await,
            Effect::Report(report) => self.report(report),
        }
    }

    fn report(&self, report: Report) {
        let student = self.identity().clone();
        let timestamp = self.reporter.now();
        let event = match report {
            Report::RequestHelp => MonitorEvent::StudentRequestHelp {
                student,
                topic: self.profile.topic.clone(),
                timestamp,
            },
            Report::FoundTutor(tutor) => MonitorEvent::StudentFoundTutor {
                student,
                tutor,
                timestamp,
            },
            Report::Finish => {
                info!(student = %student, knowledge = self.profile.knowledge, "goal reached");
                MonitorEvent::StudentFinish {
                    student,
                    knowledge: self.profile.knowledge,
                    timestamp,
                }
            }
        };
        self.reporter.emit(&event);
    }
}
