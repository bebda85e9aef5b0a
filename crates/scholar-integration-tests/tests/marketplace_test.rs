//! Integration tests across the marketplace services.
//!
//! Each test wires real services onto one bus and talks to them the way a
//! student would:
//! 1. Tutors register with the directory and answer queries exactly
//! 2. The resource manager enforces its bandwidth budget
//! 3. A contract-net round against live tutors ends in a confirmed session

use std::sync::Arc;
use std::time::Duration;

use scholar_bus::{Bus, Mailbox, Outbox};
use scholar_directory::DirectoryService;
use scholar_negotiation::{Confirmation, ContractNet, NegotiationConfig, RoundPhase};
use scholar_proto::bodies::{decode_identities, ResourceReply};
use scholar_proto::{
    Clock, CorrelationId, Endpoints, Envelope, Filter, Identity, Performative, Protocol,
    UnitRange,
};
use scholar_resource::{ResourceConfig, ResourceController, ResourceService};
use scholar_tutor::{TutorAgent, TutorConfig, WorkloadPolicy};
use tokio_util::sync::CancellationToken;

// ============================================================================
// Helper Functions
// ============================================================================

struct Market {
    bus: Bus,
    endpoints: Endpoints,
    clock: Clock,
    cancel: CancellationToken,
    _monitor: Mailbox,
}

impl Market {
    fn new() -> Self {
        let bus = Bus::new();
        let endpoints = Endpoints::default();
        let monitor = bus.register(endpoints.monitor.clone()).unwrap();
        Self {
            bus,
            endpoints,
            clock: Clock::default(),
            cancel: CancellationToken::new(),
            _monitor: monitor,
        }
    }

    fn outbox(&self, name: &Identity) -> Outbox {
        Outbox::new(name.clone(), self.bus.transport())
    }

    fn start_directory(&self) {
        let mailbox = self.bus.register(self.endpoints.directory.clone()).unwrap();
        let service = DirectoryService::new(self.outbox(&self.endpoints.directory));
        tokio::spawn(service.run(mailbox, self.cancel.clone()));
    }

    fn start_resource(&self, config: ResourceConfig) {
        let mailbox = self.bus.register(self.endpoints.resource.clone()).unwrap();
        let controller = ResourceController::new(config, self.clock).unwrap();
        let service = ResourceService::new(
            Arc::new(controller),
            self.outbox(&self.endpoints.resource),
        );
        tokio::spawn(service.run(mailbox, self.cancel.clone()));
    }

    fn start_tutor(&self, name: &str, expertise: &[&str], config: TutorConfig) {
        let identity = Identity::new(name);
        let mailbox = self.bus.register(identity.clone()).unwrap();
        let agent = TutorAgent::new(
            expertise.iter().copied(),
            config,
            self.endpoints.clone(),
            self.outbox(&identity),
            self.clock,
        );
        tokio::spawn(agent.run(mailbox, self.cancel.clone()));
    }

    fn student(&self, name: &str) -> (Mailbox, Outbox) {
        let identity = Identity::new(name);
        (self.bus.register(identity.clone()).unwrap(), self.outbox(&identity))
    }
}

impl Drop for Market {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn await_reply(inbox: &mut Mailbox, protocol: Protocol, request: CorrelationId) -> Envelope {
    let filter = Filter::any()
        .with_protocol(protocol)
        .with_correlation(request);
    inbox
        .recv_matching_within(&filter, Duration::from_secs(30))
        .await
        .unwrap()
}

async fn query(market: &Market, inbox: &mut Mailbox, outbox: &Outbox, topic: &str) -> Vec<Identity> {
    let request = outbox
        .send(Protocol::Directory, Performative::Query, &market.endpoints.directory, topic)
        .unwrap();
    let reply = await_reply(inbox, Protocol::Directory, request).await;
    assert_eq!(reply.performative, Performative::Inform);
    decode_identities(&reply.body).unwrap()
}

fn fixed_sessions(units: f64) -> TutorConfig {
    TutorConfig::default().with_session_duration(UnitRange::fixed(units))
}

// ============================================================================
// Directory Tests
// ============================================================================

#[tokio::test(start_paused = true)]
async fn directory_lists_exactly_the_tutors_teaching_a_topic() {
    let market = Market::new();
    market.start_directory();
    market.start_tutor("tutor1", &["mathematics", "physics"], TutorConfig::default());
    market.start_tutor("tutor2", &["physics"], TutorConfig::default());
    market.start_tutor("tutor3", &["biology", "history"], TutorConfig::default());
    tokio::time::sleep(Duration::from_secs(1)).await;

    let (mut inbox, outbox) = market.student("student1");

    let mut physics = query(&market, &mut inbox, &outbox, "physics").await;
    physics.sort();
    assert_eq!(physics, vec![Identity::new("tutor1"), Identity::new("tutor2")]);

    let biology = query(&market, &mut inbox, &outbox, "biology").await;
    assert_eq!(biology, vec![Identity::new("tutor3")]);

    assert!(query(&market, &mut inbox, &outbox, "chemistry").await.is_empty());
}

// ============================================================================
// Resource Tests
// ============================================================================

#[tokio::test(start_paused = true)]
async fn resource_budget_turns_away_the_overflow() {
    let market = Market::new();
    market.start_resource(
        ResourceConfig::default()
            .with_capacity(1)
            .with_delivery_delay(UnitRange::fixed(5.0)),
    );

    let (mut first_in, first_out) = market.student("student1");
    let (mut second_in, second_out) = market.student("student2");

    let first = first_out
        .send(Protocol::Resource, Performative::Request, &market.endpoints.resource, "physics")
        .unwrap();
    tokio::time::sleep(Duration::from_millis(10)).await;
    let second = second_out
        .send(Protocol::Resource, Performative::Request, &market.endpoints.resource, "history")
        .unwrap();

    let busy = await_reply(&mut second_in, Protocol::Resource, second).await;
    assert_eq!(ResourceReply::from_envelope(&busy).unwrap(), ResourceReply::Busy);

    let delivered = await_reply(&mut first_in, Protocol::Resource, first).await;
    assert!(matches!(
        ResourceReply::from_envelope(&delivered).unwrap(),
        ResourceReply::Provided(url) if url.contains("physics")
    ));

    // The slot is free again once the first delivery completes.
    let retry = second_out
        .send(Protocol::Resource, Performative::Request, &market.endpoints.resource, "history")
        .unwrap();
    let delivered = await_reply(&mut second_in, Protocol::Resource, retry).await;
    assert!(matches!(
        ResourceReply::from_envelope(&delivered).unwrap(),
        ResourceReply::Provided(_)
    ));
}

#[tokio::test(start_paused = true)]
async fn unknown_topic_is_not_found() {
    let market = Market::new();
    market.start_resource(ResourceConfig::default());
    let (mut inbox, outbox) = market.student("student1");

    let request = outbox
        .send(Protocol::Resource, Performative::Request, &market.endpoints.resource, "biology")
        .unwrap();
    let reply = await_reply(&mut inbox, Protocol::Resource, request).await;
    assert_eq!(ResourceReply::from_envelope(&reply).unwrap(), ResourceReply::NotFound);
}

// ============================================================================
// Negotiation Tests
// ============================================================================

#[tokio::test(start_paused = true)]
async fn contract_net_against_live_tutors_confirms_a_session() {
    let market = Market::new();
    market.start_tutor("tutor1", &["mathematics", "physics"], fixed_sessions(10.0));
    market.start_tutor("tutor2", &["physics"], fixed_sessions(10.0));
    let (mut inbox, outbox) = market.student("student5");

    let net = ContractNet::new(NegotiationConfig::default(), market.clock);
    let mut round = net.open(
        "physics",
        vec![Identity::new("tutor1"), Identity::new("tutor2")],
    );
    assert_eq!(net.broadcast(&outbox, &round), 2);
    assert_eq!(net.collect(&mut inbox, &mut round).await, 2);

    let award = net.award(&outbox, &mut round).unwrap().unwrap();
    assert_eq!(award.losers.len(), 1);

    let confirmation = net.await_confirmation(&mut inbox, &mut round).await.unwrap();
    assert_eq!(confirmation, Confirmation::Confirmed(award.winner.bidder.clone()));
    assert_eq!(round.phase(), RoundPhase::Confirmed);
}

#[tokio::test(start_paused = true)]
async fn busy_exclusive_tutor_stays_out_of_the_next_round() {
    let market = Market::new();
    let config = fixed_sessions(50.0).with_policy(WorkloadPolicy::Exclusive);
    market.start_tutor("tutor2", &["physics"], config);
    let net = ContractNet::new(NegotiationConfig::default(), market.clock);

    let (mut first_in, first_out) = market.student("student1");
    let mut round = net.open("physics", vec![Identity::new("tutor2")]);
    net.broadcast(&first_out, &round);
    assert_eq!(net.collect(&mut first_in, &mut round).await, 1);
    net.award(&first_out, &mut round).unwrap().unwrap();
    assert!(matches!(
        net.await_confirmation(&mut first_in, &mut round).await.unwrap(),
        Confirmation::Confirmed(_)
    ));

    let (mut second_in, second_out) = market.student("student2");
    let mut round = net.open("physics", vec![Identity::new("tutor2")]);
    net.broadcast(&second_out, &round);
    assert_eq!(net.collect(&mut second_in, &mut round).await, 0);
    assert!(net.award(&second_out, &mut round).unwrap().is_none());
}
