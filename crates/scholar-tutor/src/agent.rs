//! Tutor participant loop.

use scholar_bus::{Mailbox, Outbox, Reporter};
use scholar_proto::bodies::{encode_topics, AvailabilityOverride, SESSION_STARTING};
use scholar_proto::{Clock, Endpoints, Envelope, Identity, MonitorEvent, Performative, Protocol};
use tokio::sync::watch;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::TutorConfig;
use crate::error::{Result, TutorError};
use crate::workload::{Workload, WorkloadSnapshot};

/// A tutor: registers, bids, and teaches.
///
/// The loop owns the [`Workload`]. Each accepted session sleeps on its own
/// task; the loop learns of completion by joining it, so the workload is only
/// ever touched from one place.
#[derive(Debug)]
pub struct TutorAgent {
    workload: Workload,
    config: TutorConfig,
    endpoints: Endpoints,
    outbox: Outbox,
    reporter: Reporter,
    clock: Clock,
    snapshots: watch::Sender<WorkloadSnapshot>,
}

impl TutorAgent {
    /// Creates a tutor teaching `expertise`.
    pub fn new<I, T>(
        expertise: I,
        config: TutorConfig,
        endpoints: Endpoints,
        outbox: Outbox,
        clock: Clock,
    ) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let workload = Workload::new(config.policy, expertise);
        let reporter = Reporter::new(outbox.clone(), endpoints.monitor.clone(), clock);
        let (snapshots, _) = watch::channel(workload.snapshot());
        Self {
            workload,
            config,
            endpoints,
            outbox,
            reporter,
            clock,
            snapshots,
        }
    }

    /// This tutor's identity.
    #[must_use]
    pub fn identity(&self) -> &Identity {
        self.outbox.identity()
    }

    /// Follows workload changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<WorkloadSnapshot> {
        self.snapshots.subscribe()
    }

    /// Sends the expertise list to the directory.
    pub fn register(&self) -> Result<()> {
        let body = encode_topics(self.workload.expertise())?;
        self.outbox.send(
            Protocol::Directory,
            Performative::Register,
            &self.endpoints.directory,
            body,
        )?;
        info!(tutor = %self.identity(), expertise = ?self.workload.expertise(), "registered with directory");
        Ok(())
    }

    /// Runs until `cancel` fires or the mailbox closes.
    ///
    /// Sessions still running at shutdown are aborted.
    pub async fn run(mut self, mut mailbox: Mailbox, cancel: CancellationToken) -> Workload {
        if let Err(e) = self.register() {
            warn!(tutor = %self.identity(), error = %e, "directory registration failed");
        }

        let mut sessions: JoinSet<Identity> = JoinSet::new();

        loop {
            tokio::select! {
                () = cancel.cancelled() => {
                    debug!(tutor = %self.identity(), active = sessions.len(), "tutor shutting down");
                    break;
                }
                Some(finished) = sessions.join_next(), if !sessions.is_empty() => {
                    self.workload.end_session();
                    self.publish();
                    match finished {
                        Ok(student) => info!(
                            tutor = %self.identity(),
                            student = %student,
                            queue = self.workload.queue_length(),
                            available = self.workload.is_available(),
                            "session finished"
                        ),
                        Err(e) => warn!(tutor = %self.identity(), error = %e, "session task failed"),
                    }
                }
                received = mailbox.recv() => {
                    let Some(envelope) = received else {
                        warn!(tutor = %self.identity(), "tutor mailbox closed");
                        break;
                    };
                    if let Err(e) = self.handle(&envelope, &mut sessions) {
                        warn!(
                            tutor = %self.identity(),
                            from = %envelope.sender,
                            performative = %envelope.performative,
                            error = %e,
                            "envelope not handled"
                        );
                    }
                }
            }
        }

        sessions.abort_all();
        while sessions.join_next().await.is_some() {}
        self.workload
    }

    fn handle(&mut self, envelope: &Envelope, sessions: &mut JoinSet<Identity>) -> Result<()> {
        match (envelope.protocol, envelope.performative) {
            (Protocol::Negotiation, Performative::Cfp) => self.on_cfp(envelope),
            (Protocol::Negotiation, Performative::AcceptProposal) => self.on_accept(envelope, sessions),
            (Protocol::Negotiation, Performative::RejectProposal) => {
                debug!(tutor = %self.identity(), student = %envelope.sender, "proposal rejected");
                Ok(())
            }
            (Protocol::Environment, Performative::Inform) => {
                let change: AvailabilityOverride = envelope.decode_body()?;
                self.workload.set_availability_override(change.available);
                self.publish();
                info!(tutor = %self.identity(), available = change.available, "availability changed by environment");
                Ok(())
            }
            (_, other) => Err(TutorError::Unsupported(other)),
        }
    }

    fn on_cfp(&self, cfp: &Envelope) -> Result<()> {
        let topic = cfp.body.trim();
        if !self.workload.should_bid(topic) {
            debug!(tutor = %self.identity(), topic = %topic, "not bidding");
            return Ok(());
        }

        let quote = self.workload.quote(&self.config);
        self.outbox.reply(cfp, Performative::Propose, quote.to_json()?)?;
        info!(
            tutor = %self.identity(),
            student = %cfp.sender,
            topic = %topic,
            wait_time = quote.wait_time,
            expertise_level = quote.expertise_level,
            "proposal sent"
        );
        Ok(())
    }

    fn on_accept(&mut self, accept: &Envelope, sessions: &mut JoinSet<Identity>) -> Result<()> {
        if let Err(e) = self.workload.begin_session() {
            info!(tutor = %self.identity(), student = %accept.sender, "refusing session while busy");
            self.outbox.reply(accept, Performative::Failure, e.to_string())?;
            return Ok(());
        }
        self.publish();

        if let Err(e) = self.outbox.reply(accept, Performative::Inform, SESSION_STARTING) {
            // The student is gone; nobody will attend.
            self.workload.end_session();
            self.publish();
            return Err(e.into());
        }

        self.reporter.emit(&MonitorEvent::SessionStart {
            tutor: self.identity().clone(),
            student: accept.sender.clone(),
            timestamp: self.reporter.now(),
        });

        let duration = self.config.session_duration.sample(&mut rand::thread_rng());
        let student = accept.sender.clone();
        let clock = self.clock;
        info!(
            tutor = %self.identity(),
            student = %student,
            duration,
            queue = self.workload.queue_length(),
            "session started"
        );
        sessions.spawn(async move {
            clock.sleep(duration).await;
            student
        });
        Ok(())
    }

    fn publish(&self) {
        self.snapshots.send_replace(self.workload.snapshot());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workload::WorkloadPolicy;
    use scholar_bus::Bus;
    use scholar_proto::bodies::{decode_topics, ProposalBody};
    use scholar_proto::{Filter, UnitRange};
    use std::time::Duration;
    use tokio::time::Instant;

    struct Harness {
        bus: Bus,
        cancel: CancellationToken,
        snapshots: watch::Receiver<WorkloadSnapshot>,
        handle: tokio::task::JoinHandle<Workload>,
        directory: Mailbox,
        monitor: Mailbox,
    }

    fn start(config: TutorConfig, expertise: &[&str]) -> Harness {
        let bus = Bus::new();
        let directory = bus.register(Identity::new("directory")).unwrap();
        let monitor = bus.register(Identity::new("monitor")).unwrap();
        let mailbox = bus.register(Identity::new("tutor1")).unwrap();
        let agent = TutorAgent::new(
            expertise.iter().copied(),
            config,
            Endpoints::default(),
            Outbox::new(Identity::new("tutor1"), bus.transport()),
            Clock::default(),
        );
        let snapshots = agent.subscribe();
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(agent.run(mailbox, cancel.clone()));
        Harness {
            bus,
            cancel,
            snapshots,
            handle,
            directory,
            monitor,
        }
    }

    fn fixed_sessions(units: f64) -> TutorConfig {
        TutorConfig::default().with_session_duration(UnitRange::fixed(units))
    }

    fn student(bus: &Bus, name: &str) -> (Mailbox, Outbox) {
        (
            bus.register(Identity::new(name)).unwrap(),
            Outbox::new(Identity::new(name), bus.transport()),
        )
    }

    async fn next(inbox: &mut Mailbox, performative: Performative) -> Option<Envelope> {
        let filter = Filter::any().with_performative(performative);
        inbox.recv_matching_within(&filter, Duration::from_secs(1)).await
    }

    // ==========================================================================
    // Registration and bidding
    // ==========================================================================

    #[tokio::test(start_paused = true)]
    async fn registers_expertise_on_start() {
        let mut h = start(TutorConfig::default(), &["mathematics", "physics"]);
        let register = next(&mut h.directory, Performative::Register).await.unwrap();
        assert_eq!(register.sender.as_str(), "tutor1");
        assert_eq!(
            decode_topics(&register.body).unwrap(),
            vec!["mathematics".to_string(), "physics".to_string()]
        );
        h.cancel.cancel();
        h.handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn bids_on_expertise_and_stays_silent_otherwise() {
        let h = start(TutorConfig::default(), &["physics"]);
        let (mut inbox, out) = student(&h.bus, "student1");
        let tutor = Identity::new("tutor1");

        out.send(Protocol::Negotiation, Performative::Cfp, &tutor, "history").unwrap();
        out.send(Protocol::Negotiation, Performative::Cfp, &tutor, "physics").unwrap();

        let proposal = next(&mut inbox, Performative::Propose).await.unwrap();
        let body = ProposalBody::parse(&proposal.body).unwrap();
        assert_eq!(body, ProposalBody::new(5.0, 0.9));
        assert!(next(&mut inbox, Performative::Propose).await.is_none());

        h.cancel.cancel();
        h.handle.await.unwrap();
    }

    // ==========================================================================
    // Sessions
    // ==========================================================================

    #[tokio::test(start_paused = true)]
    async fn accept_confirms_and_reports_session_start() {
        let mut h = start(fixed_sessions(10.0), &["physics"]);
        let (mut inbox, out) = student(&h.bus, "student1");

        out.send(Protocol::Negotiation, Performative::AcceptProposal, &Identity::new("tutor1"), "")
            .unwrap();

        let confirm = next(&mut inbox, Performative::Inform).await.unwrap();
        assert_eq!(confirm.body, SESSION_STARTING);
        assert_eq!(confirm.protocol, Protocol::Negotiation);

        let report = next(&mut h.monitor, Performative::Inform).await.unwrap();
        let event = MonitorEvent::from_json(&report.body).unwrap();
        assert!(matches!(
            event,
            MonitorEvent::SessionStart { ref tutor, ref student, .. }
                if tutor.as_str() == "tutor1" && student.as_str() == "student1"
        ));

        h.cancel.cancel();
        h.handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn undeliverable_confirmation_reports_no_session() {
        let mut h = start(fixed_sessions(10.0), &["physics"]);
        // Never registered, so the confirmation has nowhere to go.
        let ghost = Outbox::new(Identity::new("ghost"), h.bus.transport());

        ghost
            .send(Protocol::Negotiation, Performative::AcceptProposal, &Identity::new("tutor1"), "")
            .unwrap();

        assert!(next(&mut h.monitor, Performative::Inform).await.is_none());
        let snapshot = *h.snapshots.borrow();
        assert_eq!(snapshot.queue_length, 0);
        assert!(snapshot.available);

        h.cancel.cancel();
        let workload = h.handle.await.unwrap();
        assert_eq!(workload.queue_length(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn back_to_back_accepts_run_concurrently() {
        let mut h = start(fixed_sessions(10.0), &["physics"]);
        let (mut s1, out1) = student(&h.bus, "student1");
        let (mut s2, out2) = student(&h.bus, "student2");
        let tutor = Identity::new("tutor1");

        let start = Instant::now();
        out1.send(Protocol::Negotiation, Performative::AcceptProposal, &tutor, "").unwrap();
        out2.send(Protocol::Negotiation, Performative::AcceptProposal, &tutor, "").unwrap();
        assert!(next(&mut s1, Performative::Inform).await.is_some());
        assert!(next(&mut s2, Performative::Inform).await.is_some());

        h.snapshots.wait_for(|s| s.queue_length == 2).await.unwrap();
        assert!(!h.snapshots.borrow().available);

        // Bids keep flowing mid-session, priced for the queue.
        let (mut s3, out3) = student(&h.bus, "student3");
        out3.send(Protocol::Negotiation, Performative::Cfp, &tutor, "physics").unwrap();
        let proposal = next(&mut s3, Performative::Propose).await.unwrap();
        assert_eq!(
            ProposalBody::parse(&proposal.body).unwrap(),
            ProposalBody::new(15.0, 0.7)
        );

        tokio::time::sleep(Duration::from_secs(9)).await;
        assert_eq!(h.snapshots.borrow().queue_length, 2);
        assert!(!h.snapshots.borrow().available);

        h.snapshots.wait_for(|s| s.available).await.unwrap();
        assert_eq!(h.snapshots.borrow().queue_length, 0);
        assert_eq!(start.elapsed(), Duration::from_secs(10));

        h.cancel.cancel();
        let workload = h.handle.await.unwrap();
        assert!(workload.is_available());
    }

    #[tokio::test(start_paused = true)]
    async fn exclusive_tutor_refuses_second_accept() {
        let config = fixed_sessions(10.0).with_policy(WorkloadPolicy::Exclusive);
        let h = start(config, &["physics"]);
        let (mut s1, out1) = student(&h.bus, "student1");
        let (mut s2, out2) = student(&h.bus, "student2");
        let tutor = Identity::new("tutor1");

        out1.send(Protocol::Negotiation, Performative::AcceptProposal, &tutor, "").unwrap();
        assert!(next(&mut s1, Performative::Inform).await.is_some());

        out2.send(Protocol::Negotiation, Performative::Cfp, &tutor, "physics").unwrap();
        out2.send(Protocol::Negotiation, Performative::AcceptProposal, &tutor, "").unwrap();
        let refusal = next(&mut s2, Performative::Failure).await.unwrap();
        assert_eq!(refusal.protocol, Protocol::Negotiation);
        assert_eq!(s2.dropped(), 0);

        h.cancel.cancel();
        h.handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn environment_override_reprices_until_queue_drains() {
        let h = start(fixed_sessions(10.0), &["physics"]);
        let (mut s1, out1) = student(&h.bus, "student1");
        let tutor = Identity::new("tutor1");
        let environment = Outbox::new(Identity::new("environment"), h.bus.transport());

        environment
            .send(Protocol::Environment, Performative::Inform, &tutor, r#"{"available":false}"#)
            .unwrap();
        out1.send(Protocol::Negotiation, Performative::Cfp, &tutor, "physics").unwrap();
        let proposal = next(&mut s1, Performative::Propose).await.unwrap();
        assert_eq!(
            ProposalBody::parse(&proposal.body).unwrap(),
            ProposalBody::new(5.0, 0.7)
        );

        out1.send(Protocol::Negotiation, Performative::AcceptProposal, &tutor, "").unwrap();
        let mut snapshots = h.snapshots.clone();
        snapshots.wait_for(|s| s.queue_length == 1).await.unwrap();
        snapshots.wait_for(|s| s.available).await.unwrap();
        assert_eq!(snapshots.borrow().availability_override, None);

        h.cancel.cancel();
        h.handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn malformed_envelopes_do_not_stop_the_loop() {
        let h = start(TutorConfig::default(), &["physics"]);
        let (mut s1, out1) = student(&h.bus, "student1");
        let tutor = Identity::new("tutor1");

        out1.send(Protocol::Environment, Performative::Inform, &tutor, "maybe").unwrap();
        out1.send(Protocol::Directory, Performative::Query, &tutor, "physics").unwrap();
        out1.send(Protocol::Negotiation, Performative::Cfp, &tutor, "physics").unwrap();

        assert!(next(&mut s1, Performative::Propose).await.is_some());

        h.cancel.cancel();
        h.handle.await.unwrap();
    }
}
