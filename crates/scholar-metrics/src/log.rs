//! Append-only log of monitoring events.
//!
//! The [`EventLog`] is a cheap-to-clone handle over shared storage, so the
//! monitor loop can append while the host reads counts or takes a snapshot.

use std::sync::Arc;

use parking_lot::RwLock;
use scholar_proto::{Envelope, MonitorEvent, Performative, Protocol};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{MetricsError, Result};
use crate::report::{replay, MetricsReport};

/// An event plus the time the monitor received it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggedEvent {
    /// The event as emitted.
    #[serde(flatten)]
    pub event: MonitorEvent,
    /// Arrival time in time units.
    pub log_time: f64,
}

/// Ordered, thread-safe event log.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Arc<RwLock<Vec<LoggedEvent>>>,
}

impl EventLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an event received at `log_time`.
    pub fn push(&self, event: MonitorEvent, log_time: f64) {
        let mut events = self.events.write();
        events.push(LoggedEvent { event, log_time });
        debug!(logged = events.len(), "event logged");
    }

    /// Parses a monitoring envelope and appends it.
    ///
    /// # Errors
    ///
    /// Fails without touching the log if the envelope is not a monitoring
    /// `inform` or its body does not parse.
    pub fn ingest(&self, envelope: &Envelope, log_time: f64) -> Result<()> {
        if envelope.protocol != Protocol::Monitoring || envelope.performative != Performative::Inform {
            return Err(MetricsError::NotAnEvent {
                protocol: envelope.protocol,
                performative: envelope.performative,
            });
        }
        let event = MonitorEvent::from_json(&envelope.body).map_err(|source| {
            MetricsError::MalformedEvent {
                sender: envelope.sender.clone(),
                source,
            }
        })?;
        self.push(event, log_time);
        Ok(())
    }

    /// Number of events logged.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    /// Returns true if nothing was logged.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.read().is_empty()
    }

    /// Copies the log in arrival order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<LoggedEvent> {
        self.events.read().clone()
    }

    /// Replays the log into a report.
    #[must_use]
    pub fn report(&self, runtime: f64) -> MetricsReport {
        replay(&self.events.read(), runtime)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scholar_proto::Identity;

    fn monitoring(body: &str) -> Envelope {
        Envelope::new(
            Protocol::Monitoring,
            Performative::Inform,
            Identity::new("student1"),
            Identity::new("monitor"),
            body,
        )
    }

    #[test]
    fn ingest_appends_with_arrival_time() {
        let log = EventLog::new();
        log.ingest(
            &monitoring(r#"{"event":"STUDENT_REQUEST_HELP","student":"student1","topic":"physics","timestamp":3.0}"#),
            4.5,
        )
        .unwrap();

        let events = log.snapshot();
        assert_eq!(events.len(), 1);
        assert!((events[0].log_time - 4.5).abs() < f64::EPSILON);
        assert!((events[0].event.timestamp() - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn malformed_events_leave_log_untouched() {
        let log = EventLog::new();
        assert!(matches!(
            log.ingest(&monitoring("not json"), 1.0),
            Err(MetricsError::MalformedEvent { .. })
        ));
        assert!(matches!(
            log.ingest(&monitoring(r#"{"event":"TUTOR_LEFT","timestamp":1}"#), 1.0),
            Err(MetricsError::MalformedEvent { .. })
        ));
        assert!(log.is_empty());
    }

    #[test]
    fn other_protocols_are_refused() {
        let log = EventLog::new();
        let envelope = Envelope::new(
            Protocol::Negotiation,
            Performative::Inform,
            Identity::new("tutor1"),
            Identity::new("monitor"),
            "{}",
        );
        assert!(matches!(
            log.ingest(&envelope, 1.0),
            Err(MetricsError::NotAnEvent { .. })
        ));
    }

    #[test]
    fn clones_share_storage() {
        let log = EventLog::new();
        let reader = log.clone();
        log.push(
            MonitorEvent::SessionStart {
                tutor: Identity::new("tutor1"),
                student: Identity::new("student1"),
                timestamp: 1.0,
            },
            1.0,
        );
        assert_eq!(reader.len(), 1);
    }

    #[test]
    fn logged_event_serializes_flat() {
        let logged = LoggedEvent {
            event: MonitorEvent::StudentFinish {
                student: Identity::new("student1"),
                knowledge: 1.0,
                timestamp: 9.0,
            },
            log_time: 9.5,
        };
        let json: serde_json::Value = serde_json::to_value(&logged).unwrap();
        assert_eq!(json["event"], "STUDENT_FINISH");
        assert_eq!(json["student"], "student1");
        assert_eq!(json["log_time"], 9.5);
    }
}
