//! Initiator side of the Contract Net exchange.

use scholar_bus::{Mailbox, Outbox};
use scholar_proto::{Clock, Filter, Identity, Performative, Protocol, Topic};
use tracing::{debug, info, warn};

use crate::config::NegotiationConfig;
use crate::error::{NegotiationError, Result};
use crate::proposal::Award;
use crate::round::{AbortReason, Round};

/// How the awarded tutor answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Confirmation {
    /// The tutor is starting the session.
    Confirmed(Identity),
    /// The tutor declined the accept.
    Refused(Identity),
    /// No answer before the confirmation timeout.
    TimedOut,
}

/// Runs negotiation rounds for one initiator.
#[derive(Debug, Clone)]
pub struct ContractNet {
    config: NegotiationConfig,
    clock: Clock,
}

impl ContractNet {
    /// Creates an initiator with the given settings.
    #[must_use]
    pub fn new(config: NegotiationConfig, clock: Clock) -> Self {
        Self { config, clock }
    }

    /// The active settings.
    #[must_use]
    pub const fn config(&self) -> &NegotiationConfig {
        &self.config
    }

    /// Opens a round whose collection window starts now.
    #[must_use]
    pub fn open(&self, topic: impl Into<Topic>, candidates: Vec<Identity>) -> Round {
        Round::new(
            topic,
            candidates,
            self.clock.deadline(self.config.proposal_window),
        )
    }

    /// Sends one call for proposals per candidate. Returns how many were
    /// delivered.
    pub fn broadcast(&self, outbox: &Outbox, round: &Round) -> usize {
        let mut sent = 0;
        for candidate in round.candidates() {
            match outbox.send_correlated(
                Protocol::Negotiation,
                Performative::Cfp,
                candidate,
                round.topic(),
                round.id(),
            ) {
                Ok(()) => sent += 1,
                Err(e) => warn!(tutor = %candidate, error = %e, "cfp not delivered"),
            }
        }
        info!(
            round = %round.id(),
            topic = %round.topic(),
            invited = sent,
            "call for proposals sent"
        );
        sent
    }

    /// Collects proposals until the round's deadline. Returns how many were
    /// recorded.
    ///
    /// The deadline is fixed at round start, so late or extra envelopes never
    /// extend the window.
    pub async fn collect(&self, mailbox: &mut Mailbox, round: &mut Round) -> usize {
        let filter = Filter::any()
            .with_protocol(Protocol::Negotiation)
            .with_performative(Performative::Propose)
            .with_correlation(round.id());

        while let Some(envelope) = mailbox.recv_matching(&filter, round.deadline()).await {
            match round.accept_envelope(&envelope) {
                Ok(()) => debug!(round = %round.id(), tutor = %envelope.sender, "proposal received"),
                Err(e) => warn!(round = %round.id(), error = %e, "ignoring proposal"),
            }
        }

        round.proposals().len()
    }

    /// Closes collection, then accepts the winner and rejects everyone else.
    ///
    /// Returns `Ok(None)` if nobody proposed.
    ///
    /// # Errors
    ///
    /// Fails if the round was already closed or the accept could not be
    /// delivered; the round is aborted in the latter case.
    pub fn award(&self, outbox: &Outbox, round: &mut Round) -> Result<Option<Award>> {
        let Some(award) = round.close(&self.config.scoring)?.cloned() else {
            info!(round = %round.id(), "no proposals, round aborted");
            return Ok(None);
        };

        if let Err(e) = outbox.send_correlated(
            Protocol::Negotiation,
            Performative::AcceptProposal,
            &award.winner.bidder,
            "",
            round.id(),
        ) {
            round.abort(AbortReason::WinnerUnreachable);
            return Err(e.into());
        }

        for loser in &award.losers {
            if let Err(e) = outbox.send_correlated(
                Protocol::Negotiation,
                Performative::RejectProposal,
                loser,
                "",
                round.id(),
            ) {
                warn!(tutor = %loser, error = %e, "reject not delivered");
            }
        }

        info!(
            round = %round.id(),
            tutor = %award.winner.bidder,
            score = award.score,
            rejected = award.losers.len(),
            "proposal accepted"
        );
        Ok(Some(award))
    }

    /// Waits for the winner's answer, bounded by the confirmation timeout.
    ///
    /// Only envelopes from the winner in this round count. A timeout or refusal
    /// aborts the round.
    pub async fn await_confirmation(
        &self,
        mailbox: &mut Mailbox,
        round: &mut Round,
    ) -> Result<Confirmation> {
        let winner = round
            .award()
            .map(|a| a.winner.bidder.clone())
            .ok_or(NegotiationError::NoAward)?;
        let filter = Filter::any()
            .with_protocol(Protocol::Negotiation)
            .with_sender(winner.clone())
            .with_correlation(round.id());
        let deadline = self.clock.deadline(self.config.confirmation_timeout);

        while let Some(envelope) = mailbox.recv_matching(&filter, deadline).await {
            match envelope.performative {
                Performative::Inform => {
                    round.confirm()?;
                    info!(round = %round.id(), tutor = %winner, "session confirmed");
                    return Ok(Confirmation::Confirmed(winner));
                }
                Performative::Failure => {
                    round.abort(AbortReason::Refused);
                    info!(round = %round.id(), tutor = %winner, "tutor refused the session");
                    return Ok(Confirmation::Refused(winner));
                }
                other => {
                    debug!(round = %round.id(), performative = %other, "ignoring while awaiting confirmation");
                }
            }
        }

        round.abort(AbortReason::Unconfirmed);
        info!(round = %round.id(), tutor = %winner, "no confirmation");
        Ok(Confirmation::TimedOut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::round::RoundPhase;
    use scholar_bus::Bus;
    use scholar_proto::bodies::ProposalBody;
    use scholar_proto::Envelope;
    use std::time::Duration;
    use tokio::time::Instant;

    struct Fixture {
        bus: Bus,
        student: Mailbox,
        student_out: Outbox,
        net: ContractNet,
    }

    fn fixture() -> Fixture {
        let bus = Bus::new();
        let student = bus.register(Identity::new("student1")).unwrap();
        let student_out = Outbox::new(Identity::new("student1"), bus.transport());
        let net = ContractNet::new(NegotiationConfig::default(), Clock::default());
        Fixture {
            bus,
            student,
            student_out,
            net,
        }
    }

    fn tutor(bus: &Bus, name: &str) -> (Mailbox, Outbox) {
        (
            bus.register(Identity::new(name)).unwrap(),
            Outbox::new(Identity::new(name), bus.transport()),
        )
    }

    fn bid(out: &Outbox, cfp: &Envelope, wait: f64, exp: f64) {
        let body = ProposalBody::new(wait, exp).to_json().unwrap();
        out.reply(cfp, Performative::Propose, body).unwrap();
    }

    // ==========================================================================
    // Broadcast and collection
    // ==========================================================================

    #[tokio::test(start_paused = true)]
    async fn full_round_accepts_best_and_rejects_rest() {
        let mut f = fixture();
        let (mut t1, t1_out) = tutor(&f.bus, "tutor1");
        let (mut t2, t2_out) = tutor(&f.bus, "tutor2");

        let mut round = f.net.open(
            "physics",
            vec![Identity::new("tutor1"), Identity::new("tutor2")],
        );
        assert_eq!(f.net.broadcast(&f.student_out, &round), 2);

        let cfp1 = t1.try_recv().unwrap();
        let cfp2 = t2.try_recv().unwrap();
        assert_eq!(cfp1.performative, Performative::Cfp);
        assert_eq!(cfp1.body, "physics");
        assert_eq!(cfp1.correlation, round.id());
        bid(&t1_out, &cfp1, 5.0, 0.9);
        bid(&t2_out, &cfp2, 3.0, 0.5);

        let start = Instant::now();
        assert_eq!(f.net.collect(&mut f.student, &mut round).await, 2);
        assert_eq!(start.elapsed(), Duration::from_secs(5));

        let award = f.net.award(&f.student_out, &mut round).unwrap().unwrap();
        assert_eq!(award.winner.bidder, Identity::new("tutor1"));

        let accept = t1.try_recv().unwrap();
        assert_eq!(accept.performative, Performative::AcceptProposal);
        assert_eq!(accept.correlation, round.id());
        let reject = t2.try_recv().unwrap();
        assert_eq!(reject.performative, Performative::RejectProposal);

        t1_out.reply(&accept, Performative::Inform, "OK, starting session.").unwrap();
        let confirmation = f.net.await_confirmation(&mut f.student, &mut round).await.unwrap();
        assert_eq!(confirmation, Confirmation::Confirmed(Identity::new("tutor1")));
        assert_eq!(round.phase(), RoundPhase::Confirmed);
    }

    #[tokio::test(start_paused = true)]
    async fn window_ignores_other_traffic_and_stale_rounds() {
        let mut f = fixture();
        let (mut t1, t1_out) = tutor(&f.bus, "tutor1");

        let stale = f.net.open("physics", vec![Identity::new("tutor1")]);
        f.net.broadcast(&f.student_out, &stale);
        let stale_cfp = t1.try_recv().unwrap();

        let mut round = f.net.open("physics", vec![Identity::new("tutor1")]);
        f.net.broadcast(&f.student_out, &round);
        let cfp = t1.try_recv().unwrap();

        bid(&t1_out, &stale_cfp, 1.0, 1.0);
        t1_out
            .send(Protocol::Resource, Performative::Inform, &Identity::new("student1"), "x")
            .unwrap();
        bid(&t1_out, &cfp, 10.0, 0.9);

        assert_eq!(f.net.collect(&mut f.student, &mut round).await, 1);
        assert!((round.proposals()[0].wait_time - 10.0).abs() < f64::EPSILON);
        assert_eq!(f.student.dropped(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn no_proposals_aborts_round() {
        let mut f = fixture();
        let (_t1, _) = tutor(&f.bus, "tutor1");
        let mut round = f.net.open("physics", vec![Identity::new("tutor1")]);
        f.net.broadcast(&f.student_out, &round);

        assert_eq!(f.net.collect(&mut f.student, &mut round).await, 0);
        assert!(f.net.award(&f.student_out, &mut round).unwrap().is_none());
        assert_eq!(round.phase(), RoundPhase::Aborted(AbortReason::NoProposals));
    }

    #[test]
    fn broadcast_skips_missing_tutors() {
        let f = fixture();
        let (_t1, _) = tutor(&f.bus, "tutor1");
        let round = f.net.open(
            "physics",
            vec![Identity::new("tutor1"), Identity::new("ghost")],
        );
        assert_eq!(f.net.broadcast(&f.student_out, &round), 1);
    }

    // ==========================================================================
    // Confirmation
    // ==========================================================================

    async fn awarded_round(f: &mut Fixture) -> (Round, Mailbox, Outbox) {
        let (mut t1, t1_out) = tutor(&f.bus, "tutor1");
        let mut round = f.net.open("physics", vec![Identity::new("tutor1")]);
        f.net.broadcast(&f.student_out, &round);
        let cfp = t1.try_recv().unwrap();
        bid(&t1_out, &cfp, 5.0, 0.9);
        f.net.collect(&mut f.student, &mut round).await;
        f.net.award(&f.student_out, &mut round).unwrap().unwrap();
        (round, t1, t1_out)
    }

    #[tokio::test(start_paused = true)]
    async fn confirmation_times_out() {
        let mut f = fixture();
        let (mut round, _t1, _) = awarded_round(&mut f).await;

        let start = Instant::now();
        let confirmation = f.net.await_confirmation(&mut f.student, &mut round).await.unwrap();
        assert_eq!(confirmation, Confirmation::TimedOut);
        assert_eq!(start.elapsed(), Duration::from_secs(20));
        assert_eq!(round.phase(), RoundPhase::Aborted(AbortReason::Unconfirmed));
        assert!(round.award().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn confirmation_from_other_tutor_is_ignored() {
        let mut f = fixture();
        let (mut round, _t1, _) = awarded_round(&mut f).await;

        let (_t2, t2_out) = tutor(&f.bus, "tutor2");
        t2_out
            .send_correlated(
                Protocol::Negotiation,
                Performative::Inform,
                &Identity::new("student1"),
                "OK, starting session.",
                round.id(),
            )
            .unwrap();

        let confirmation = f.net.await_confirmation(&mut f.student, &mut round).await.unwrap();
        assert_eq!(confirmation, Confirmation::TimedOut);
    }

    #[tokio::test(start_paused = true)]
    async fn refusal_ends_wait_early() {
        let mut f = fixture();
        let (mut round, mut t1, t1_out) = awarded_round(&mut f).await;
        let accept = t1.try_recv().unwrap();
        t1_out.reply(&accept, Performative::Failure, "busy").unwrap();

        let start = Instant::now();
        let confirmation = f.net.await_confirmation(&mut f.student, &mut round).await.unwrap();
        assert_eq!(confirmation, Confirmation::Refused(Identity::new("tutor1")));
        assert_eq!(start.elapsed(), Duration::ZERO);
        assert_eq!(round.phase(), RoundPhase::Aborted(AbortReason::Refused));
    }

    #[tokio::test(start_paused = true)]
    async fn unreachable_winner_aborts() {
        let mut f = fixture();
        let (mut t1, t1_out) = tutor(&f.bus, "tutor1");
        let mut round = f.net.open("physics", vec![Identity::new("tutor1")]);
        f.net.broadcast(&f.student_out, &round);
        let cfp = t1.try_recv().unwrap();
        bid(&t1_out, &cfp, 5.0, 0.9);
        f.net.collect(&mut f.student, &mut round).await;

        f.bus.deregister(&Identity::new("tutor1"));
        assert!(matches!(
            f.net.award(&f.student_out, &mut round),
            Err(NegotiationError::Bus(_))
        ));
        assert_eq!(round.phase(), RoundPhase::Aborted(AbortReason::WinnerUnreachable));
    }
}
