//! The student state machine as a pure function.
//!
//! [`transition`] maps a state and the outcome of that state's action to the
//! next state plus the side effects the driver must carry out. It never does
//! I/O, so every edge is testable without a bus.

use std::fmt;

use scholar_proto::bodies::ResourceReply;
use scholar_proto::{CorrelationId, Identity};

use crate::config::StudentConfig;
use crate::error::{Result, StudentError};
use crate::profile::LearningProfile;

/// Where a student is in its learning lifecycle.
#[derive(Debug, Clone, PartialEq)]
pub enum StudentState {
    /// Brief pause before asking for material.
    Start,
    /// About to ask the resource manager for material.
    RequestResources,
    /// Waiting for the resource manager's reply.
    AwaitResources {
        /// Correlation id of the outstanding request.
        request: CorrelationId,
    },
    /// Applying study gain and deciding what to do next.
    EvaluateKnowledge {
        /// Nominal knowledge still to absorb.
        pending_gain: f64,
    },
    /// Resting to restore attention.
    TakeBreak,
    /// About to ask the directory for tutors.
    QueryDirectory,
    /// Waiting for the directory's reply.
    AwaitDirectory {
        /// Correlation id of the outstanding query.
        query: CorrelationId,
    },
    /// About to call for proposals.
    StartCnp {
        /// Tutors the directory returned.
        candidates: Vec<Identity>,
    },
    /// Collecting proposals.
    AwaitProposals {
        /// Round in progress.
        round: CorrelationId,
    },
    /// Choosing and notifying the winner.
    SelectTutor {
        /// Round in progress.
        round: CorrelationId,
    },
    /// Waiting for the winner to confirm.
    AwaitTutoring {
        /// Round in progress.
        round: CorrelationId,
        /// The selected tutor.
        tutor: Identity,
    },
    /// Goal reached.
    Finish,
}

impl StudentState {
    /// Upper-case state name used in logs and traces.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Start => "START",
            Self::RequestResources => "REQUEST_RESOURCES",
            Self::AwaitResources { .. } => "AWAIT_RESOURCES",
            Self::EvaluateKnowledge { .. } => "EVALUATE_KNOWLEDGE",
            Self::TakeBreak => "TAKE_BREAK",
            Self::QueryDirectory => "QUERY_DIRECTORY",
            Self::AwaitDirectory { .. } => "AWAIT_DIRECTORY",
            Self::StartCnp { .. } => "START_CNP",
            Self::AwaitProposals { .. } => "AWAIT_PROPOSALS",
            Self::SelectTutor { .. } => "SELECT_TUTOR",
            Self::AwaitTutoring { .. } => "AWAIT_TUTORING",
            Self::Finish => "FINISH",
        }
    }

    /// Returns true for [`StudentState::Finish`].
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Finish)
    }
}

impl fmt::Display for StudentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Outcome of the action a state performed.
#[derive(Debug, Clone, PartialEq)]
pub enum StudentEvent {
    /// A state with no I/O was entered.
    Entered,
    /// The resource request went out.
    ResourceRequested(CorrelationId),
    /// The resource manager answered.
    ResourceReply(ResourceReply),
    /// No resource reply in time.
    ResourceTimeout,
    /// The directory query went out.
    DirectoryQueried(CorrelationId),
    /// The directory answered with these tutors.
    DirectoryReply(Vec<Identity>),
    /// No usable directory reply.
    DirectoryUnavailable,
    /// Calls for proposals went out.
    CfpSent {
        /// Round id.
        round: CorrelationId,
        /// How many tutors were reached.
        invited: usize,
    },
    /// The collection window closed.
    ProposalsCollected(usize),
    /// A winner was accepted.
    Awarded(Identity),
    /// No winner could be accepted.
    NoAward,
    /// The winner confirmed.
    SessionConfirmed,
    /// The winner refused or never answered.
    SessionUnconfirmed,
    /// An outbound envelope could not be delivered.
    SendFailed,
}

impl StudentEvent {
    /// Short event name used in errors.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Entered => "entered",
            Self::ResourceRequested(_) => "resource_requested",
            Self::ResourceReply(_) => "resource_reply",
            Self::ResourceTimeout => "resource_timeout",
            Self::DirectoryQueried(_) => "directory_queried",
            Self::DirectoryReply(_) => "directory_reply",
            Self::DirectoryUnavailable => "directory_unavailable",
            Self::CfpSent { .. } => "cfp_sent",
            Self::ProposalsCollected(_) => "proposals_collected",
            Self::Awarded(_) => "awarded",
            Self::NoAward => "no_award",
            Self::SessionConfirmed => "session_confirmed",
            Self::SessionUnconfirmed => "session_unconfirmed",
            Self::SendFailed => "send_failed",
        }
    }
}

/// Monitoring facts a transition asks the driver to report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Report {
    /// The student is looking for a tutor.
    RequestHelp,
    /// The student selected a tutor.
    FoundTutor(Identity),
    /// The student reached its goal.
    Finish,
}

/// A side effect for the driver.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Sleep this many time units.
    Delay(f64),
    /// Emit a monitoring event.
    Report(Report),
}

/// Result of one step.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    /// State to enter.
    pub next: StudentState,
    /// Effects to run, in order, before entering it.
    pub effects: Vec<Effect>,
}

impl Transition {
    fn to(next: StudentState) -> Self {
        Self {
            next,
            effects: Vec::new(),
        }
    }

    fn with(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    fn backoff(config: &StudentConfig) -> Self {
        Self::to(StudentState::Start).with(Effect::Delay(config.backoff))
    }
}

/// Computes the next state.
///
/// Learning effects (study gain, fatigue, tutoring, rest) are applied to
/// `profile` here so they happen exactly once per edge.
///
/// # Errors
///
/// Returns [`StudentError::IllegalTransition`] for an event the state has no
/// edge for, including any event in [`StudentState::Finish`].
pub fn transition(
    profile: &mut LearningProfile,
    state: StudentState,
    event: StudentEvent,
    config: &StudentConfig,
) -> Result<Transition> {
    use StudentEvent as E;
    use StudentState as S;

    let next = match (state, event) {
        (S::Start, E::Entered) => {
            Transition::to(S::RequestResources).with(Effect::Delay(config.start_delay))
        }

        (S::RequestResources, E::ResourceRequested(request)) => {
            Transition::to(S::AwaitResources { request })
        }
        (S::RequestResources, E::SendFailed) => {
            Transition::to(S::EvaluateKnowledge { pending_gain: 0.0 })
        }

        (S::AwaitResources { .. }, E::ResourceReply(reply)) => match reply {
            ResourceReply::Provided(_) => Transition::to(S::EvaluateKnowledge {
                pending_gain: config.resource_gain,
            }),
            ResourceReply::Busy => {
                Transition::to(S::RequestResources).with(Effect::Delay(config.busy_retry_delay))
            }
            ResourceReply::NotFound => Transition::to(S::EvaluateKnowledge { pending_gain: 0.0 }),
        },
        (S::AwaitResources { .. }, E::ResourceTimeout) => {
            Transition::to(S::EvaluateKnowledge { pending_gain: 0.0 })
        }

        (S::EvaluateKnowledge { pending_gain }, E::Entered) => evaluate(profile, pending_gain, config),

        (S::TakeBreak, E::Entered) => {
            profile.rest();
            Transition::to(S::EvaluateKnowledge { pending_gain: 0.0 })
                .with(Effect::Delay(config.break_duration))
        }

        (S::QueryDirectory, E::DirectoryQueried(query)) => {
            Transition::to(S::AwaitDirectory { query })
        }
        (S::QueryDirectory, E::SendFailed) => Transition::backoff(config),

        (S::AwaitDirectory { .. }, E::DirectoryReply(candidates)) if !candidates.is_empty() => {
            Transition::to(S::StartCnp { candidates })
        }
        (S::AwaitDirectory { .. }, E::DirectoryReply(_) | E::DirectoryUnavailable) => {
            Transition::backoff(config)
        }

        (S::StartCnp { .. }, E::CfpSent { round, invited }) if invited > 0 => {
            Transition::to(S::AwaitProposals { round })
        }
        (S::StartCnp { .. }, E::CfpSent { .. }) => Transition::backoff(config),

        (S::AwaitProposals { round }, E::ProposalsCollected(count)) if count > 0 => {
            Transition::to(S::SelectTutor { round })
        }
        (S::AwaitProposals { .. }, E::ProposalsCollected(_)) => Transition::backoff(config),

        (S::SelectTutor { round }, E::Awarded(tutor)) => {
            Transition::to(S::AwaitTutoring {
                round,
                tutor: tutor.clone(),
            })
            .with(Effect::Report(Report::FoundTutor(tutor)))
        }
        (S::SelectTutor { .. }, E::NoAward | E::SendFailed) => Transition::backoff(config),

        (S::AwaitTutoring { .. }, E::SessionConfirmed) => {
            profile.tutored(config.tutoring_attention_cost);
            Transition::to(S::EvaluateKnowledge { pending_gain: 0.0 })
                .with(Effect::Delay(config.tutoring_duration))
        }
        (S::AwaitTutoring { .. }, E::SessionUnconfirmed) => Transition::backoff(config),

        (state, event) => {
            return Err(StudentError::IllegalTransition {
                state: state.name(),
                event: event.name(),
            });
        }
    };
    Ok(next)
}

fn evaluate(profile: &mut LearningProfile, pending_gain: f64, config: &StudentConfig) -> Transition {
    let mut effects = Vec::new();
    if pending_gain > 0.0 {
        profile.study(pending_gain, config.study_attention_cost);
        effects.push(Effect::Delay(config.study_time));
    }

    let next = if profile.goal_met() {
        effects.push(Effect::Report(Report::Finish));
        StudentState::Finish
    } else if profile.attention < config.attention_threshold {
        StudentState::TakeBreak
    } else {
        effects.push(Effect::Report(Report::RequestHelp));
        StudentState::QueryDirectory
    };
    Transition { next, effects }
}
