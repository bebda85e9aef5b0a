//! Wires a scenario onto one bus and runs it to completion.

use std::collections::BTreeMap;
use std::sync::Arc;

use futures::future::join_all;
use scholar_bus::{Bus, Mailbox, Outbox, Reporter};
use scholar_directory::DirectoryService;
use scholar_metrics::{MetricsReport, MonitorService};
use scholar_proto::Identity;
use scholar_resource::{ResourceController, ResourceService};
use scholar_student::{StudentAgent, StudentRun};
use scholar_tutor::TutorAgent;
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::{ScenarioConfig, StudentSpec, TutorSpec};
use crate::environment::Environment;
use crate::error::Result;

/// Identity the environment sends from.
pub const ENVIRONMENT: &str = "environment";

/// What a run produced.
#[derive(Debug, Clone)]
pub struct Outcome {
    /// The monitor's report.
    pub report: MetricsReport,
    /// Each student's final state.
    pub students: BTreeMap<Identity, StudentRun>,
    /// Availability changes the environment delivered.
    pub perturbations: usize,
}

impl Outcome {
    /// Returns true if every student reached its goal.
    #[must_use]
    pub fn all_finished(&self) -> bool {
        self.students.values().all(|run| run.finished)
    }
}

/// One scenario run.
#[derive(Debug)]
pub struct Simulation {
    config: ScenarioConfig,
}

struct Mailboxes {
    monitor: Mailbox,
    directory: Mailbox,
    resource: Mailbox,
    tutors: Vec<(TutorSpec, Mailbox)>,
    students: Vec<(StudentSpec, Mailbox)>,
}

impl Simulation {
    /// Validates `config` and prepares a run.
    ///
    /// # Errors
    ///
    /// Returns an error if the scenario does not validate.
    pub fn new(config: ScenarioConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The scenario being run.
    #[must_use]
    pub const fn config(&self) -> &ScenarioConfig {
        &self.config
    }

    /// Starts every participant, waits for the students or the run deadline,
    /// then shuts everything down and collects the report.
    ///
    /// # Errors
    ///
    /// Fails if a participant cannot be attached to the bus, the resource
    /// manager rejects its settings, or the monitor task dies.
    pub async fn run(self) -> Result<Outcome> {
        let config = self.config;
        let clock = config.clock();
        let bus = Bus::new();
        let endpoints = config.endpoints.clone();
        let cancel = CancellationToken::new();
        let Mailboxes {
            monitor: monitor_mailbox,
            directory: directory_mailbox,
            resource: resource_mailbox,
            tutors,
            students: student_mailboxes,
        } = register_all(&bus, &config)?;
        let outbox = |id: &Identity| Outbox::new(id.clone(), bus.transport());

        let controller = ResourceController::new(config.resource.clone(), clock)?.with_reporter(
            Reporter::new(outbox(&endpoints.resource), endpoints.monitor.clone(), clock),
        );

        let monitor = tokio::spawn(MonitorService::new(clock).run(monitor_mailbox, cancel.clone()));

        let mut services: Vec<JoinHandle<()>> = Vec::new();
        let directory = DirectoryService::new(outbox(&endpoints.directory));
        let token = cancel.clone();
        services.push(tokio::spawn(async move {
            let registry = directory.run(directory_mailbox, token).await;
            debug!(registered = registry.len(), "directory stopped");
        }));

        let resource = ResourceService::new(Arc::new(controller), outbox(&endpoints.resource));
        services.push(tokio::spawn(resource.run(resource_mailbox, cancel.clone())));

        let tutor_names: Vec<Identity> = tutors.iter().map(|(t, _)| t.name.clone()).collect();
        for (TutorSpec { name, expertise }, mailbox) in tutors {
            let agent = TutorAgent::new(
                expertise,
                config.tutor.clone(),
                endpoints.clone(),
                outbox(&name),
                clock,
            );
            let token = cancel.clone();
            services.push(tokio::spawn(async move {
                let workload = agent.run(mailbox, token).await;
                debug!(tutor = %name, queue = workload.queue_length(), "tutor stopped");
            }));
        }

        let environment = config.environment.enabled.then(|| {
            let env = Environment::new(
                tutor_names,
                config.environment.period,
                outbox(&Identity::new(ENVIRONMENT)),
                clock,
            );
            tokio::spawn(env.run(cancel.clone()))
        });

        info!(
            tutors = config.tutors.len(),
            students = config.students.len(),
            warmup = config.warmup,
            "services started"
        );
        clock.sleep(config.warmup).await;

        let mut students: JoinSet<(Identity, StudentRun)> = JoinSet::new();
        for (spec, mailbox) in student_mailboxes {
            let agent = StudentAgent::new(
                spec.topic,
                spec.knowledge,
                config.student.clone(),
                endpoints.clone(),
                outbox(&spec.name),
                clock,
            );
            let token = cancel.clone();
            let name = spec.name;
            students.spawn(async move { (name, agent.run(mailbox, token).await) });
        }
        info!(students = students.len(), "students started");

        let deadline = clock.deadline(config.run_deadline);
        let mut runs = BTreeMap::new();
        loop {
            match tokio::time::timeout_at(deadline, students.join_next()).await {
                Ok(Some(Ok((name, run)))) => {
                    info!(student = %name, finished = run.finished, "student done");
                    runs.insert(name, run);
                }
                Ok(Some(Err(e))) => warn!(error = %e, "student task failed"),
                Ok(None) => break,
                Err(_) => {
                    warn!(remaining = students.len(), "run deadline reached, stopping students");
                    break;
                }
            }
        }

        cancel.cancel();
        while let Some(joined) = students.join_next().await {
            match joined {
                Ok((name, run)) => {
                    runs.insert(name, run);
                }
                Err(e) => warn!(error = %e, "student task failed"),
            }
        }
        for joined in join_all(services).await {
            if let Err(e) = joined {
                warn!(error = %e, "participant task failed");
            }
        }
        let perturbations = match environment {
            Some(handle) => handle.await.unwrap_or_else(|e| {
                warn!(error = %e, "environment task failed");
                0
            }),
            None => 0,
        };
        let report = monitor.await?;

        info!(
            completed = report.completion.completed,
            started = report.completion.started,
            "run complete"
        );
        Ok(Outcome {
            report,
            students: runs,
            perturbations,
        })
    }
}

fn register_all(bus: &Bus, config: &ScenarioConfig) -> Result<Mailboxes> {
    let endpoints = &config.endpoints;
    Ok(Mailboxes {
        monitor: bus.register(endpoints.monitor.clone())?,
        directory: bus.register(endpoints.directory.clone())?,
        resource: bus.register(endpoints.resource.clone())?,
        tutors: config
            .tutors
            .iter()
            .map(|spec| -> Result<_> { Ok((spec.clone(), bus.register(spec.name.clone())?)) })
            .collect::<Result<_>>()?,
        students: config
            .students
            .iter()
            .map(|spec| -> Result<_> { Ok((spec.clone(), bus.register(spec.name.clone())?)) })
            .collect::<Result<_>>()?,
    })
}
