//! # scholar-student
//!
//! A student that learns a topic through self-study and, when that is not
//! enough, through a tutoring session won by negotiation.
//!
//! - **Profile** - [`LearningProfile`]: knowledge, goal and attention
//! - **State machine** - [`StudentState`] and the pure [`transition`] function,
//!   which returns the next state plus the [`Effect`]s to run
//! - **Driver** - [`StudentAgent`] performs each state's I/O over the bus
//!
//! ## Example
//!
//! ```rust
//! use scholar_student::{transition, LearningProfile, StudentConfig, StudentEvent, StudentState};
//!
//! let config = StudentConfig::default();
//! let mut profile = LearningProfile::new("physics", 0.1).with_attention(40);
//!
//! let step = transition(
//!     &mut profile,
//!     StudentState::EvaluateKnowledge { pending_gain: 0.4 },
//!     StudentEvent::Entered,
//!     &config,
//! )
//! .unwrap();
//!
//! assert_eq!(profile.attention, 10);
//! assert_eq!(step.next, StudentState::TakeBreak);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod agent;
pub mod config;
pub mod error;
pub mod fsm;
pub mod profile;

pub use agent::{StudentAgent, StudentRun};
pub use config::StudentConfig;
pub use error::{Result, StudentError};
pub use fsm::{transition, Effect, Report, StudentEvent, StudentState, Transition};
pub use profile::{LearningProfile, MAX_ATTENTION};
