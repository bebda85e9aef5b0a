//! # scholar-metrics
//!
//! Passive monitoring for the Scholar marketplace.
//!
//! The monitor appends every inbound [`MonitorEvent`] to an [`EventLog`],
//! stamped with its arrival time. At shutdown the log is replayed once into a
//! [`MetricsReport`]:
//!
//! - resource utilization
//! - tutor workload balance
//! - time from asking for help to finding a tutor
//! - mean knowledge gain
//! - which students finished
//!
//! ## Example
//!
//! ```rust
//! use scholar_metrics::EventLog;
//! use scholar_proto::{Identity, MonitorEvent};
//!
//! let log = EventLog::new();
//! log.push(
//!     MonitorEvent::StudentStart {
//!         student: Identity::new("s1"),
//!         knowledge: 0.1,
//!         goal: 0.9,
//!         topic: "biology".into(),
//!         timestamp: 0.0,
//!     },
//!     0.0,
//! );
//!
//! let report = log.report(12.0);
//! assert_eq!(report.completion.started, 1);
//! assert_eq!(report.completion.completed, 0);
//! ```
//!
//! [`MonitorEvent`]: scholar_proto::MonitorEvent

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod log;
pub mod report;
pub mod service;

pub use error::{MetricsError, Result};
pub use log::{EventLog, LoggedEvent};
pub use report::{replay, CompletionSummary, MetricsReport, Stats, StudentOutcome};
pub use service::MonitorService;
