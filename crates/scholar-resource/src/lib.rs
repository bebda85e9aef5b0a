//! # scholar-resource
//!
//! The resource manager: a fixed-capacity lookup service that hands learning
//! material URLs to students.
//!
//! - **Knowledge base** - [`KnowledgeBase`], a case-insensitive topic lookup
//! - **Admission** - [`AdmissionBudget`] and its RAII [`SlotGuard`]
//! - **Controller** - [`ResourceController::fetch`], admission plus simulated
//!   delivery delay
//! - **Service** - [`ResourceService`], the participant loop that serves each
//!   request on its own task
//!
//! ## Example
//!
//! ```rust
//! use scholar_resource::AdmissionBudget;
//!
//! let budget = AdmissionBudget::new(1);
//! let slot = budget.try_acquire().unwrap();
//! assert!(budget.try_acquire().is_none());
//!
//! drop(slot);
//! assert_eq!(budget.in_use(), 0);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod budget;
pub mod config;
pub mod controller;
pub mod error;
pub mod knowledge;
pub mod service;

pub use budget::{AdmissionBudget, SlotGuard};
pub use config::ResourceConfig;
pub use controller::{FetchOutcome, RejectReason, Resource, ResourceController};
pub use error::{ResourceError, Result};
pub use knowledge::KnowledgeBase;
pub use service::ResourceService;
