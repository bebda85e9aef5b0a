//! # scholar-sim
//!
//! Runs a Scholar tutoring marketplace in one process.
//!
//! A [`ScenarioConfig`] names the tutors and students; [`Simulation`] puts the
//! directory, resource manager, monitor, tutors, students and an optional
//! [`Environment`] on one bus, waits for every student (or the run deadline),
//! shuts the participants down and hands back the monitor's report.
//!
//! ## Example
//!
//! ```rust
//! use scholar_sim::ScenarioConfig;
//!
//! let scenario = ScenarioConfig::from_json(r#"{"time_unit_ms": 10}"#).unwrap();
//! assert_eq!(scenario.students.len(), 5);
//! assert_eq!(scenario.tutors.len(), 3);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod environment;
pub mod error;
pub mod simulation;

pub use config::{EnvironmentConfig, ScenarioConfig, StudentSpec, TutorSpec};
pub use environment::Environment;
pub use error::{Result, SimError};
pub use simulation::{Outcome, Simulation};
