//! Ordered capability registry.

use std::collections::BTreeSet;

use scholar_proto::{Identity, Topic};
use tracing::{debug, info};

/// One registered participant and what it can teach.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    /// Registered identity.
    pub identity: Identity,
    /// Topics the identity covers.
    pub topics: BTreeSet<Topic>,
}

/// Maps identities to topic sets, remembering first-registration order.
///
/// Owned by a single participant; mutation needs no locking.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    entries: Vec<DirectoryEntry>,
}

impl Registry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Upserts the topic set for `identity`.
    ///
    /// Registering again replaces the topics but keeps the identity's original
    /// position in the query order.
    pub fn register<I, T>(&mut self, identity: Identity, topics: I)
    where
        I: IntoIterator<Item = T>,
        T: Into<Topic>,
    {
        let topics: BTreeSet<Topic> = topics.into_iter().map(Into::into).collect();

        if let Some(entry) = self.entries.iter_mut().find(|e| e.identity == identity) {
            debug!(identity = %identity, topics = ?topics, "replacing directory entry");
            entry.topics = topics;
            return;
        }

        info!(identity = %identity, topics = ?topics, "registered in directory");
        self.entries.push(DirectoryEntry { identity, topics });
    }

    /// Every identity whose topic set contains `topic`, in registration order.
    #[must_use]
    pub fn query(&self, topic: &str) -> Vec<Identity> {
        self.entries
            .iter()
            .filter(|e| e.topics.contains(topic))
            .map(|e| e.identity.clone())
            .collect()
    }

    /// Looks up one entry.
    #[must_use]
    pub fn get(&self, identity: &Identity) -> Option<&DirectoryEntry> {
        self.entries.iter().find(|e| e.identity == *identity)
    }

    /// Number of registered identities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nobody has registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
