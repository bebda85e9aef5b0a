//! Resource manager participant loop.

use std::sync::Arc;

use scholar_bus::{Mailbox, Outbox};
use scholar_proto::{Envelope, Performative, Protocol};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::controller::ResourceController;
use crate::error::{ResourceError, Result};

/// Answers `resource/request` envelopes, one task per request.
///
/// Requests are served concurrently so the admission budget is exercised by
/// overlapping deliveries. Shutdown aborts in-flight deliveries; their slots
/// are released by the guards.
#[derive(Debug)]
pub struct ResourceService {
    controller: Arc<ResourceController>,
    outbox: Outbox,
}

impl ResourceService {
    /// Creates a service around `controller`.
    #[must_use]
    pub fn new(controller: Arc<ResourceController>, outbox: Outbox) -> Self {
        Self { controller, outbox }
    }

    /// Shared handle to the controller.
    #[must_use]
    pub fn controller(&self) -> Arc<ResourceController> {
        Arc::clone(&self.controller)
    }

    /// Runs until `cancel` fires or the mailbox closes.
    pub async fn run(self, mut mailbox: Mailbox, cancel: CancellationToken) {
        info!(
            endpoint = %mailbox.identity(),
            capacity = self.controller.budget().capacity(),
            "resource manager online"
        );
        let mut deliveries = JoinSet::new();

        loop {
            tokio::select! {
                () = cancel.cancelled() => {
                    debug!(in_flight = deliveries.len(), "resource manager shutting down");
                    break;
                }
                Some(joined) = deliveries.join_next(), if !deliveries.is_empty() => {
                    if let Err(e) = joined {
                        warn!(error = %e, "delivery task failed");
                    }
                }
                received = mailbox.recv() => {
                    let Some(envelope) = received else {
                        warn!("resource manager mailbox closed");
                        break;
                    };
                    if envelope.protocol != Protocol::Resource
                        || envelope.performative != Performative::Request
                    {
                        debug!(
                            protocol = %envelope.protocol,
                            performative = %envelope.performative,
                            from = %envelope.sender,
                            "ignoring envelope"
                        );
                        continue;
                    }
                    if envelope.sender.is_empty() {
                        warn!(error = %ResourceError::AnonymousRequest, "dropping resource request");
                        continue;
                    }

                    let controller = Arc::clone(&self.controller);
                    let outbox = self.outbox.clone();
                    deliveries.spawn(async move {
                        if let Err(e) = serve(&controller, &outbox, &envelope).await {
                            warn!(to = %envelope.sender, error = %e, "resource reply not delivered");
                        }
                    });
                }
            }
        }

        deliveries.abort_all();
        while deliveries.join_next().await.is_some() {}
    }
}

async fn serve(controller: &ResourceController, outbox: &Outbox, request: &Envelope) -> Result<()> {
    let topic = request.body.trim();
    let outcome = controller.fetch(topic, &request.sender).await;
    let (performative, body) = outcome.to_reply().to_parts();
    outbox.reply(request, performative, body)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use scholar_bus::Bus;
    use scholar_proto::bodies::ResourceReply;
    use scholar_proto::{Clock, Filter, Identity};
    use std::time::Duration;

    use crate::config::ResourceConfig;

    type Running = (
        CancellationToken,
        tokio::task::JoinHandle<()>,
        Arc<ResourceController>,
    );

    fn start(bus: &Bus, capacity: usize) -> Running {
        let mailbox = bus.register(Identity::new("resource_manager")).unwrap();
        let config = ResourceConfig::default().with_capacity(capacity);
        let controller = Arc::new(ResourceController::new(config, Clock::default()).unwrap());
        let service = ResourceService::new(
            Arc::clone(&controller),
            Outbox::new(Identity::new("resource_manager"), bus.transport()),
        );
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(service.run(mailbox, cancel.clone()));
        (cancel, handle, controller)
    }

    async fn request(bus: &Bus, student: &str, topic: &str) -> Option<ResourceReply> {
        let mut inbox = bus.register(Identity::new(student)).unwrap();
        let correlation = Outbox::new(Identity::new(student), bus.transport())
            .send(
                Protocol::Resource,
                Performative::Request,
                &Identity::new("resource_manager"),
                topic,
            )
            .unwrap();
        let filter = Filter::any()
            .with_protocol(Protocol::Resource)
            .with_correlation(correlation);
        let reply = inbox
            .recv_matching_within(&filter, Duration::from_secs(30))
            .await?;
        ResourceReply::from_envelope(&reply).ok()
    }

    #[tokio::test(start_paused = true)]
    async fn serves_known_and_unknown_topics() {
        let bus = Bus::new();
        let (cancel, handle, _) = start(&bus, 2);

        let reply = request(&bus, "student1", "history").await.unwrap();
        assert_eq!(
            reply,
            ResourceReply::Provided("https://www.history-channel.com/ww2-overview".into())
        );

        let reply = request(&bus, "student2", "biology").await.unwrap();
        assert_eq!(reply, ResourceReply::NotFound);

        cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn third_concurrent_request_is_busy() {
        let bus = Bus::new();
        let (cancel, handle, controller) = start(&bus, 2);

        let b1 = bus.clone();
        let b2 = bus.clone();
        let first = tokio::spawn(async move { request(&b1, "student1", "physics").await });
        let second = tokio::spawn(async move { request(&b2, "student2", "physics").await });
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(controller.budget().in_use(), 2);

        let third = request(&bus, "student3", "physics").await.unwrap();
        assert_eq!(third, ResourceReply::Busy);

        assert!(matches!(first.await.unwrap(), Some(ResourceReply::Provided(_))));
        assert!(matches!(second.await.unwrap(), Some(ResourceReply::Provided(_))));
        assert_eq!(controller.budget().in_use(), 0);

        cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_releases_in_flight_slots() {
        let bus = Bus::new();
        let (cancel, handle, controller) = start(&bus, 1);

        let _inbox = bus.register(Identity::new("student1")).unwrap();
        Outbox::new(Identity::new("student1"), bus.transport())
            .send(
                Protocol::Resource,
                Performative::Request,
                &Identity::new("resource_manager"),
                "physics",
            )
            .unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(controller.budget().in_use(), 1);

        cancel.cancel();
        handle.await.unwrap();
        assert_eq!(controller.budget().in_use(), 0);
    }
}
