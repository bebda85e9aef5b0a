//! Resource manager configuration.

use scholar_proto::UnitRange;
use serde::{Deserialize, Serialize};

use crate::error::{ResourceError, Result};
use crate::knowledge::KnowledgeBase;

/// Tunables for the resource manager.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceConfig {
    /// Concurrent deliveries allowed.
    pub capacity: usize,
    /// Simulated delivery time, in units.
    pub delivery_delay: UnitRange,
    /// Available materials.
    pub knowledge_base: KnowledgeBase,
}

impl Default for ResourceConfig {
    fn default() -> Self {
        Self {
            capacity: 2,
            delivery_delay: UnitRange::new(5.0, 10.0),
            knowledge_base: KnowledgeBase::default(),
        }
    }
}

impl ResourceConfig {
    /// Sets the capacity.
    #[must_use]
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Sets the delivery delay range.
    #[must_use]
    pub fn with_delivery_delay(mut self, delay: UnitRange) -> Self {
        self.delivery_delay = delay;
        self
    }

    /// Replaces the knowledge base.
    #[must_use]
    pub fn with_knowledge_base(mut self, knowledge_base: KnowledgeBase) -> Self {
        self.knowledge_base = knowledge_base;
        self
    }

    /// Rejects a zero capacity or a malformed delay range.
    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(ResourceError::InvalidConfig(
                "capacity must be positive".to_string(),
            ));
        }
        self.delivery_delay
            .validate()
            .map_err(|e| ResourceError::InvalidConfig(format!("delivery_delay: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ResourceConfig::default();
        assert_eq!(config.capacity, 2);
        assert_eq!(config.delivery_delay, UnitRange::new(5.0, 10.0));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_capacity_is_invalid() {
        let config = ResourceConfig::default().with_capacity(0);
        assert!(matches!(
            config.validate(),
            Err(ResourceError::InvalidConfig(_))
        ));
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config: ResourceConfig = serde_json::from_str(r#"{"capacity": 4}"#).unwrap();
        assert_eq!(config.capacity, 4);
        assert_eq!(config.knowledge_base, KnowledgeBase::default());
    }
}
