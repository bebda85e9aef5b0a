//! # scholar-directory
//!
//! The capability directory: tutors register the topics they can teach and
//! students ask which tutors cover a topic.
//!
//! - [`Registry`] holds the entries and answers queries in registration order
//! - [`DirectoryService`] is the participant loop serving the `directory`
//!   protocol over a mailbox
//!
//! ## Example
//!
//! ```rust
//! use scholar_directory::Registry;
//! use scholar_proto::Identity;
//!
//! let mut registry = Registry::new();
//! registry.register(Identity::new("tutor1"), ["mathematics", "physics"]);
//! registry.register(Identity::new("tutor2"), ["physics"]);
//!
//! let tutors = registry.query("physics");
//! assert_eq!(tutors, vec![Identity::new("tutor1"), Identity::new("tutor2")]);
//! assert!(registry.query("biology").is_empty());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod registry;
pub mod service;

pub use error::{DirectoryError, Result};
pub use registry::Registry;
pub use service::DirectoryService;
