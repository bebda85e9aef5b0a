//! Topic to material lookup.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Fixed table of learning materials keyed by topic.
///
/// Keys are stored lowercased and trimmed; lookups normalize the same way.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, String>", into = "BTreeMap<String, String>")]
pub struct KnowledgeBase {
    entries: BTreeMap<String, String>,
}

fn normalize(topic: &str) -> String {
    topic.trim().to_lowercase()
}

impl KnowledgeBase {
    /// Creates an empty knowledge base.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Adds or replaces the material for `topic`.
    #[must_use]
    pub fn with_entry(mut self, topic: &str, url: impl Into<String>) -> Self {
        self.entries.insert(normalize(topic), url.into());
        self
    }

    /// Finds the material for `topic`, ignoring case and surrounding space.
    #[must_use]
    pub fn lookup(&self, topic: &str) -> Option<&str> {
        self.entries.get(&normalize(topic)).map(String::as_str)
    }

    /// Number of topics covered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no topics are covered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for KnowledgeBase {
    fn default() -> Self {
        Self::empty()
            .with_entry("mathematics", "https://www.math-videos.com/algebra-basics")
            .with_entry("physics", "https://www.physics-explained.com/newtons-laws")
            .with_entry("history", "https://www.history-channel.com/ww2-overview")
    }
}

impl From<BTreeMap<String, String>> for KnowledgeBase {
    fn from(map: BTreeMap<String, String>) -> Self {
        map.into_iter()
            .fold(Self::empty(), |kb, (topic, url)| kb.with_entry(&topic, url))
    }
}

impl From<KnowledgeBase> for BTreeMap<String, String> {
    fn from(kb: KnowledgeBase) -> Self {
        kb.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("physics" ; "exact")]
    #[test_case("  Physics " ; "padded mixed case")]
    #[test_case("PHYSICS" ; "upper")]
    fn lookup_normalizes(topic: &str) {
        let kb = KnowledgeBase::default();
        assert_eq!(
            kb.lookup(topic),
            Some("https://www.physics-explained.com/newtons-laws")
        );
    }

    #[test]
    fn default_has_no_biology() {
        let kb = KnowledgeBase::default();
        assert_eq!(kb.len(), 3);
        assert!(kb.lookup("biology").is_none());
    }

    #[test]
    fn deserializes_from_plain_map() {
        let kb: KnowledgeBase =
            serde_json::from_str(r#"{"Chemistry ": "https://example.org/chem"}"#).unwrap();
        assert_eq!(kb.lookup("chemistry"), Some("https://example.org/chem"));
    }
}
