//! A participant's private inbox.

use std::time::Duration;

use scholar_proto::{Envelope, Filter, Identity};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::debug;

/// Receiving end of one endpoint.
///
/// Every wait in the system is bounded: [`Mailbox::recv_matching`] takes an
/// absolute deadline, so the window does not reset when an unrelated envelope
/// arrives.
#[derive(Debug)]
pub struct Mailbox {
    identity: Identity,
    rx: mpsc::UnboundedReceiver<Envelope>,
    dropped: u64,
}

impl Mailbox {
    pub(crate) fn new(identity: Identity, rx: mpsc::UnboundedReceiver<Envelope>) -> Self {
        Self {
            identity,
            rx,
            dropped: 0,
        }
    }

    /// The endpoint this mailbox belongs to.
    #[must_use]
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Number of envelopes discarded because they did not match a wait.
    #[must_use]
    pub const fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Receives the next envelope, whatever it is.
    ///
    /// Returns `None` once the endpoint has been deregistered. Cancel safe.
    pub async fn recv(&mut self) -> Option<Envelope> {
        self.rx.recv().await
    }

    /// Takes an already-delivered envelope without waiting.
    pub fn try_recv(&mut self) -> Option<Envelope> {
        self.rx.try_recv().ok()
    }

    /// Waits for the next envelope satisfying `filter` until `deadline`.
    ///
    /// Envelopes that do not match are consumed and dropped. Returns `None` on
    /// timeout or if the endpoint was deregistered.
    pub async fn recv_matching(&mut self, filter: &Filter, deadline: Instant) -> Option<Envelope> {
        loop {
            let envelope = match tokio::time::timeout_at(deadline, self.rx.recv()).await {
                Ok(Some(envelope)) => envelope,
                Ok(None) => {
                    debug!(endpoint = %self.identity, "mailbox closed while waiting");
                    return None;
                }
                Err(_) => return None,
            };

            if filter.matches(&envelope) {
                return Some(envelope);
            }

            self.dropped += 1;
            debug!(
                endpoint = %self.identity,
                protocol = %envelope.protocol,
                performative = %envelope.performative,
                sender = %envelope.sender,
                "ignoring envelope outside the current wait"
            );
        }
    }

    /// [`Mailbox::recv_matching`] with a relative timeout.
    pub async fn recv_matching_within(
        &mut self,
        filter: &Filter,
        timeout: Duration,
    ) -> Option<Envelope> {
        self.recv_matching(filter, Instant::now() + timeout).await
    }
}
