//! End-of-run report derived from the event log.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use scholar_proto::{Identity, MonitorEvent, Topic};
use serde::{Deserialize, Serialize};

use crate::log::LoggedEvent;

/// Summary statistics over a set of samples.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    /// Arithmetic mean.
    pub mean: f64,
    /// Smallest sample.
    pub min: f64,
    /// Largest sample.
    pub max: f64,
    /// Number of samples.
    pub samples: usize,
}

impl Stats {
    /// Returns `None` for an empty slice.
    #[must_use]
    #[allow(clippy::cast_precision_loss)] // Sample counts are tiny.
    pub fn from_samples(samples: &[f64]) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }
        let sum: f64 = samples.iter().sum();
        Some(Self {
            mean: sum / samples.len() as f64,
            min: samples.iter().copied().fold(f64::INFINITY, f64::min),
            max: samples.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            samples: samples.len(),
        })
    }
}

/// How one student's run ended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentOutcome {
    /// The student.
    pub student: Identity,
    /// Topic it set out to learn.
    pub topic: Topic,
    /// Knowledge at start.
    pub initial_knowledge: f64,
    /// Knowledge at finish, if it finished.
    pub final_knowledge: Option<f64>,
}

impl StudentOutcome {
    /// Returns true if a finish was logged.
    #[must_use]
    pub const fn finished(&self) -> bool {
        self.final_knowledge.is_some()
    }
}

/// Every started student, and how many finished.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompletionSummary {
    /// Outcomes ordered by student identity.
    pub students: Vec<StudentOutcome>,
    /// Students with a finish.
    pub completed: usize,
    /// Students with a start.
    pub started: usize,
}

/// Metrics over one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsReport {
    /// When the report was built.
    pub generated_at: DateTime<Utc>,
    /// Time units since the monitor came up.
    pub runtime: f64,
    /// Events in the log.
    pub total_events: usize,
    /// `RESOURCE_PROVIDED` count.
    pub resources_provided: usize,
    /// `SESSION_START` count.
    pub total_sessions: usize,
    /// Sessions per tutor.
    pub sessions_per_tutor: BTreeMap<Identity, usize>,
    /// Time from asking for help to finding a tutor.
    pub help_latency: Option<Stats>,
    /// Mean knowledge gained by students that finished.
    pub mean_gain: Option<f64>,
    /// Who finished.
    pub completion: CompletionSummary,
}

#[derive(Default)]
struct StudentTrack {
    start: Option<(Topic, f64)>,
    finish: Option<f64>,
    help_requested: Option<f64>,
    tutor_found: Option<f64>,
}

/// Derives a report from events in arrival order.
///
/// Per-student facts keep the last occurrence of each kind. A help latency
/// counts only when the student's last tutor was found after its last help
/// request.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn replay(events: &[LoggedEvent], runtime: f64) -> MetricsReport {
    let mut resources_provided = 0;
    let mut sessions_per_tutor: BTreeMap<Identity, usize> = BTreeMap::new();
    let mut students: BTreeMap<Identity, StudentTrack> = BTreeMap::new();

    for logged in events {
        match &logged.event {
            MonitorEvent::ResourceProvided { .. } => resources_provided += 1,
            MonitorEvent::SessionStart { tutor, .. } => {
                *sessions_per_tutor.entry(tutor.clone()).or_default() += 1;
            }
            MonitorEvent::StudentStart {
                student,
                knowledge,
                topic,
                ..
            } => {
                students.entry(student.clone()).or_default().start = Some((topic.clone(), *knowledge));
            }
            MonitorEvent::StudentFinish {
                student, knowledge, ..
            } => {
                students.entry(student.clone()).or_default().finish = Some(*knowledge);
            }
            MonitorEvent::StudentRequestHelp {
                student, timestamp, ..
            } => {
                students.entry(student.clone()).or_default().help_requested = Some(*timestamp);
            }
            MonitorEvent::StudentFoundTutor {
                student, timestamp, ..
            } => {
                students.entry(student.clone()).or_default().tutor_found = Some(*timestamp);
            }
        }
    }

    let latencies: Vec<f64> = students
        .values()
        .filter_map(|t| match (t.help_requested, t.tutor_found) {
            (Some(asked), Some(found)) if found >= asked => Some(found - asked),
            _ => None,
        })
        .collect();

    let outcomes: Vec<StudentOutcome> = students
        .into_iter()
        .filter_map(|(student, track)| {
            let (topic, initial_knowledge) = track.start?;
            Some(StudentOutcome {
                student,
                topic,
                initial_knowledge,
                final_knowledge: track.finish,
            })
        })
        .collect();

    let gains: Vec<f64> = outcomes
        .iter()
        .filter_map(|o| o.final_knowledge.map(|k| k - o.initial_knowledge))
        .collect();
    let mean_gain = (!gains.is_empty()).then(|| gains.iter().sum::<f64>() / gains.len() as f64);

    let completed = outcomes.iter().filter(|o| o.finished()).count();
    MetricsReport {
        generated_at: Utc::now(),
        runtime,
        total_events: events.len(),
        resources_provided,
        total_sessions: sessions_per_tutor.values().sum(),
        sessions_per_tutor,
        help_latency: Stats::from_samples(&latencies),
        mean_gain,
        completion: CompletionSummary {
            started: outcomes.len(),
            completed,
            students: outcomes,
        },
    }
}

const RULE: &str = "==================================================";

impl fmt::Display for MetricsReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{RULE}")?;
        writeln!(f, "--- SYSTEM PERFORMANCE METRICS ---")?;
        writeln!(f, "Total runtime: {:.2} units", self.runtime)?;
        writeln!(f, "Total events logged: {}", self.total_events)?;
        writeln!(f, "{RULE}")?;
        writeln!(f)?;

        writeln!(f, "### 1. Resource Utilization")?;
        writeln!(f, "* Total resources provided: {}", self.resources_provided)?;
        writeln!(f)?;

        writeln!(f, "### 2. Tutor Workload Balance")?;
        writeln!(f, "* Total tutoring sessions: {}", self.total_sessions)?;
        if self.sessions_per_tutor.is_empty() {
            writeln!(f, "    - No tutors were engaged.")?;
        }
        for (tutor, count) in &self.sessions_per_tutor {
            writeln!(f, "    - {tutor}: {count} session(s)")?;
        }
        writeln!(f)?;

        writeln!(f, "### 3. Time to Resolve Difficulties")?;
        match &self.help_latency {
            Some(stats) => {
                writeln!(f, "* Average time to find a tutor: {:.2}", stats.mean)?;
                writeln!(f, "* Max time: {:.2} / Min time: {:.2}", stats.max, stats.min)?;
            }
            None => writeln!(f, "* No tutor requests were successfully resolved.")?,
        }
        writeln!(f)?;

        writeln!(f, "### 4. Student Learning Gains")?;
        match self.mean_gain {
            Some(gain) => writeln!(f, "* Average knowledge gain: {gain:.2}")?,
            None => writeln!(f, "* No student lifecycles were completed.")?,
        }
        writeln!(f)?;

        writeln!(f, "### 5. Student Learning Summary")?;
        if self.completion.students.is_empty() {
            writeln!(f, "    - No students started the learning process.")?;
        }
        for outcome in &self.completion.students {
            if outcome.finished() {
                writeln!(f, "    - [done] {}: learned '{}'", outcome.student, outcome.topic)?;
            } else {
                writeln!(
                    f,
                    "    - [open] {}: did not finish learning '{}'",
                    outcome.student, outcome.topic
                )?;
            }
        }
        writeln!(
            f,
            "* Total completed: {} / {}",
            self.completion.completed, self.completion.started
        )?;
        writeln!(f, "{RULE}")?;
        write!(f, "--- End of Report ---")
    }
}
