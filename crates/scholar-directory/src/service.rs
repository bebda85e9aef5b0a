//! Directory participant loop.

use scholar_bus::{Mailbox, Outbox};
use scholar_proto::bodies::{decode_topics, encode_identities};
use scholar_proto::{Envelope, Performative, Protocol};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{DirectoryError, Result};
use crate::registry::Registry;

/// Serves `register` and `query` envelopes against a [`Registry`].
///
/// The directory never replies to `register`. Malformed envelopes are logged
/// and dropped without disturbing the loop.
#[derive(Debug)]
pub struct DirectoryService {
    registry: Registry,
    outbox: Outbox,
}

impl DirectoryService {
    /// Creates a service with an empty registry.
    #[must_use]
    pub fn new(outbox: Outbox) -> Self {
        Self::with_registry(outbox, Registry::new())
    }

    /// Creates a service seeded with `registry`.
    #[must_use]
    pub fn with_registry(outbox: Outbox, registry: Registry) -> Self {
        Self { registry, outbox }
    }

    /// Current registry contents.
    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Handles one envelope.
    pub fn handle(&mut self, envelope: &Envelope) -> Result<()> {
        match envelope.performative {
            Performative::Register => {
                if envelope.sender.is_empty() {
                    return Err(DirectoryError::AnonymousRegistration);
                }
                let topics = decode_topics(&envelope.body).map_err(|source| {
                    DirectoryError::MalformedRegistration {
                        sender: envelope.sender.clone(),
                        source,
                    }
                })?;
                self.registry.register(envelope.sender.clone(), topics);
                Ok(())
            }
            Performative::Query => {
                let topic = envelope.body.trim();
                let matches = self.registry.query(topic);
                info!(
                    from = %envelope.sender,
                    topic = %topic,
                    matches = matches.len(),
                    "answering directory query"
                );
                let body = encode_identities(&matches)?;
                self.outbox.reply(envelope, Performative::Inform, body)?;
                Ok(())
            }
            other => Err(DirectoryError::Unsupported(other)),
        }
    }

    /// Runs until `cancel` fires or the mailbox closes.
    pub async fn run(mut self, mut mailbox: Mailbox, cancel: CancellationToken) -> Registry {
        info!(endpoint = %mailbox.identity(), "directory online");

        loop {
            tokio::select! {
                () = cancel.cancelled() => {
                    debug!("directory shutting down");
                    break;
                }
                received = mailbox.recv() => {
                    let Some(envelope) = received else {
                        warn!("directory mailbox closed");
                        break;
                    };
                    if envelope.protocol != Protocol::Directory {
                        debug!(protocol = %envelope.protocol, from = %envelope.sender, "ignoring non-directory envelope");
                        continue;
                    }
                    if let Err(e) = self.handle(&envelope) {
                        warn!(from = %envelope.sender, error = %e, "dropping directory envelope");
                    }
                }
            }
        }

        self.registry
    }
}
