//! # scholar-tutor
//!
//! The responder side of tutoring negotiations.
//!
//! A tutor registers its expertise with the directory, bids on calls for
//! proposals it can serve, and runs each accepted session on its own task so
//! it keeps answering other students meanwhile.
//!
//! - **Workload** - [`Workload`] tracks queue length and availability under a
//!   [`WorkloadPolicy`] and prices bids
//! - **Agent** - [`TutorAgent`] is the participant loop
//!
//! ## Example
//!
//! ```rust
//! use scholar_tutor::{TutorConfig, Workload, WorkloadPolicy};
//!
//! let config = TutorConfig::default();
//! let mut workload = Workload::new(WorkloadPolicy::Queued, ["physics"]);
//!
//! let idle = workload.quote(&config);
//! assert_eq!((idle.wait_time, idle.expertise_level), (5.0, 0.9));
//!
//! workload.begin_session().unwrap();
//! let busy = workload.quote(&config);
//! assert_eq!((busy.wait_time, busy.expertise_level), (10.0, 0.7));
//! assert!(!workload.is_available());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod agent;
pub mod config;
pub mod error;
pub mod workload;

pub use agent::TutorAgent;
pub use config::TutorConfig;
pub use error::{Result, TutorError};
pub use workload::{Workload, WorkloadPolicy, WorkloadSnapshot};
