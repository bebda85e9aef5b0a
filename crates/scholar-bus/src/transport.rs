//! Transport seam and the in-memory bus.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use scholar_proto::{Envelope, Identity};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::error::{BusError, Result};
use crate::mailbox::Mailbox;

/// Delivers envelopes to named endpoints.
///
/// Implementations must preserve ordering between any two endpoints.
pub trait Transport: Send + Sync + fmt::Debug {
    /// Hands `envelope` to its recipient's mailbox.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::UnknownRecipient`] if nobody is listening under the
    /// recipient's name.
    fn deliver(&self, envelope: Envelope) -> Result<()>;
}

/// In-memory transport backed by one unbounded channel per endpoint.
#[derive(Clone, Default)]
pub struct Bus {
    routes: Arc<RwLock<HashMap<Identity, mpsc::UnboundedSender<Envelope>>>>,
}

impl fmt::Debug for Bus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bus")
            .field("endpoints", &self.routes.read().len())
            .finish()
    }
}

impl Bus {
    /// Creates an empty bus.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns this bus as a shareable transport handle.
    #[must_use]
    pub fn transport(&self) -> Arc<dyn Transport> {
        Arc::new(self.clone())
    }

    /// Opens a mailbox for `identity`.
    ///
    /// A name whose previous mailbox was dropped may be registered again.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::AlreadyRegistered`] if a live mailbox holds the name.
    pub fn register(&self, identity: Identity) -> Result<Mailbox> {
        let mut routes = self.routes.write();
        if routes.get(&identity).is_some_and(|tx| !tx.is_closed()) {
            return Err(BusError::AlreadyRegistered(identity));
        }

        let (tx, rx) = mpsc::unbounded_channel();
        routes.insert(identity.clone(), tx);
        info!(endpoint = %identity, "endpoint registered");

        Ok(Mailbox::new(identity, rx))
    }

    /// Removes an endpoint. Returns true if it existed.
    pub fn deregister(&self, identity: &Identity) -> bool {
        let removed = self.routes.write().remove(identity).is_some();
        if removed {
            debug!(endpoint = %identity, "endpoint deregistered");
        }
        removed
    }

    /// Returns true if a live mailbox is registered under `identity`.
    #[must_use]
    pub fn is_registered(&self, identity: &Identity) -> bool {
        self.routes
            .read()
            .get(identity)
            .is_some_and(|tx| !tx.is_closed())
    }

    /// Number of registered endpoints.
    #[must_use]
    pub fn endpoint_count(&self) -> usize {
        self.routes.read().len()
    }
}

impl Transport for Bus {
    fn deliver(&self, envelope: Envelope) -> Result<()> {
        let routes = self.routes.read();
        let Some(tx) = routes.get(&envelope.recipient) else {
            return Err(BusError::UnknownRecipient(envelope.recipient));
        };

        let recipient = envelope.recipient.clone();
        tx.send(envelope)
            .map_err(|_| BusError::UnknownRecipient(recipient))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scholar_proto::{Performative, Protocol};

    fn envelope(to: &str, body: &str) -> Envelope {
        Envelope::new(
            Protocol::Directory,
            Performative::Query,
            Identity::new("student1"),
            Identity::new(to),
            body,
        )
    }

    #[test]
    fn deliver_to_registered_endpoint() {
        let bus = Bus::new();
        let mut mailbox = bus.register(Identity::new("directory")).unwrap();

        bus.deliver(envelope("directory", "physics")).unwrap();

        let received = mailbox.try_recv().unwrap();
        assert_eq!(received.body, "physics");
    }

    #[test]
    fn deliver_to_unknown_endpoint_fails() {
        let bus = Bus::new();
        let err = bus.deliver(envelope("nobody", "x")).unwrap_err();
        assert!(matches!(err, BusError::UnknownRecipient(id) if id.as_str() == "nobody"));
    }

    #[test]
    fn duplicate_registration_fails_while_live() {
        let bus = Bus::new();
        let _mailbox = bus.register(Identity::new("tutor1")).unwrap();
        let err = bus.register(Identity::new("tutor1")).unwrap_err();
        assert!(matches!(err, BusError::AlreadyRegistered(_)));
    }

    #[test]
    fn dropped_mailbox_frees_the_name() {
        let bus = Bus::new();
        let mailbox = bus.register(Identity::new("tutor1")).unwrap();
        drop(mailbox);

        assert!(!bus.is_registered(&Identity::new("tutor1")));
        let mut mailbox = bus.register(Identity::new("tutor1")).unwrap();
        bus.deliver(envelope("tutor1", "x")).unwrap();
        assert_eq!(mailbox.try_recv().unwrap().body, "x");
    }

    #[test]
    fn delivery_preserves_order() {
        let bus = Bus::new();
        let mut mailbox = bus.register(Identity::new("directory")).unwrap();

        for i in 0..10 {
            bus.deliver(envelope("directory", &i.to_string())).unwrap();
        }

        for i in 0..10 {
            assert_eq!(mailbox.try_recv().unwrap().body, i.to_string());
        }
    }

    #[test]
    fn deregister_removes_route() {
        let bus = Bus::new();
        let _mailbox = bus.register(Identity::new("monitor")).unwrap();
        assert_eq!(bus.endpoint_count(), 1);
        assert!(bus.deregister(&Identity::new("monitor")));
        assert!(!bus.deregister(&Identity::new("monitor")));
        assert!(bus.deliver(envelope("monitor", "x")).is_err());
    }
}
