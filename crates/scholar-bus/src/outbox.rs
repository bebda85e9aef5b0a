//! Sending side of a participant.

use std::sync::Arc;

use scholar_proto::{
    reply_to, Clock, CorrelationId, Envelope, Identity, MonitorEvent, Performative, Protocol,
};
use tracing::warn;

use crate::error::Result;
use crate::transport::Transport;

/// Sends envelopes on behalf of one identity.
#[derive(Debug, Clone)]
pub struct Outbox {
    me: Identity,
    transport: Arc<dyn Transport>,
}

impl Outbox {
    /// Creates an outbox that stamps `me` as the sender.
    #[must_use]
    pub fn new(me: Identity, transport: Arc<dyn Transport>) -> Self {
        Self { me, transport }
    }

    /// The identity this outbox sends as.
    #[must_use]
    pub fn identity(&self) -> &Identity {
        &self.me
    }

    /// Sends a new conversation opener and returns its fresh correlation id.
    pub fn send(
        &self,
        protocol: Protocol,
        performative: Performative,
        to: &Identity,
        body: impl Into<String>,
    ) -> Result<CorrelationId> {
        let envelope = Envelope::new(protocol, performative, self.me.clone(), to.clone(), body);
        let correlation = envelope.correlation;
        self.transport.deliver(envelope)?;
        Ok(correlation)
    }

    /// Sends an envelope that belongs to an existing conversation.
    pub fn send_correlated(
        &self,
        protocol: Protocol,
        performative: Performative,
        to: &Identity,
        body: impl Into<String>,
        correlation: CorrelationId,
    ) -> Result<()> {
        let envelope = Envelope::new(protocol, performative, self.me.clone(), to.clone(), body)
            .with_correlation(correlation);
        self.transport.deliver(envelope)
    }

    /// Answers `envelope` with the given performative and body.
    pub fn reply(
        &self,
        envelope: &Envelope,
        performative: Performative,
        body: impl Into<String>,
    ) -> Result<()> {
        let reply = reply_to(envelope, performative, body)?;
        self.transport.deliver(reply)
    }
}

/// Write-only channel to the metrics aggregator.
///
/// Reporting never fails the caller. Lost events are logged and forgotten.
#[derive(Debug, Clone)]
pub struct Reporter {
    outbox: Outbox,
    monitor: Identity,
    clock: Clock,
}

impl Reporter {
    /// Creates a reporter sending to `monitor`.
    #[must_use]
    pub fn new(outbox: Outbox, monitor: Identity, clock: Clock) -> Self {
        Self {
            outbox,
            monitor,
            clock,
        }
    }

    /// Current time in units, for stamping events.
    #[must_use]
    pub fn now(&self) -> f64 {
        self.clock.now()
    }

    /// Sends `event` to the monitor.
    pub fn emit(&self, event: &MonitorEvent) {
        let body = match event.to_json() {
            Ok(body) => body,
            Err(e) => {
                warn!(kind = %event.kind(), error = %e, "failed to encode monitor event");
                return;
            }
        };

        if let Err(e) =
            self.outbox
                .send(Protocol::Monitoring, Performative::Inform, &self.monitor, body)
        {
            warn!(kind = %event.kind(), error = %e, "monitor event not delivered");
        }
    }
}
