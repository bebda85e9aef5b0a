//! # scholar-proto
//!
//! Shared data shapes for the Scholar tutoring marketplace.
//!
//! Every participant (students, tutors, the directory, the resource manager and
//! the monitor) talks in [`Envelope`]s. This crate defines:
//!
//! - **Identities and tags** - [`Identity`], [`Protocol`], [`Performative`]
//! - **Envelopes** - [`Envelope`] and the pure [`reply_to`] constructor
//! - **Routing** - [`Filter`] and [`matches`] for receive-side selection
//! - **Wire bodies** - the payload shapes of every protocol in [`bodies`]
//! - **Monitoring events** - [`MonitorEvent`], the facts sent to the aggregator
//! - **Configuration** - well-known [`Endpoints`], delay ranges ([`UnitRange`]) and the
//!   simulation [`Clock`]
//!
//! ## Example
//!
//! ```rust
//! use scholar_proto::{reply_to, Envelope, Filter, Identity, Performative, Protocol};
//!
//! let cfp = Envelope::new(
//!     Protocol::Negotiation,
//!     Performative::Cfp,
//!     Identity::new("student1"),
//!     Identity::new("tutor1"),
//!     "physics",
//! );
//!
//! let reply = reply_to(&cfp, Performative::Propose, r#"{"wait_time":5,"expertise_level":0.9}"#)
//!     .unwrap();
//! assert_eq!(reply.recipient, cfp.sender);
//! assert_eq!(reply.correlation, cfp.correlation);
//!
//! let filter = Filter::any()
//!     .with_protocol(Protocol::Negotiation)
//!     .with_performative(Performative::Propose);
//! assert!(filter.matches(&reply));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod bodies;
pub mod clock;
pub mod config;
pub mod envelope;
pub mod error;
pub mod events;
pub mod filter;
pub mod types;

pub use clock::Clock;
pub use config::{Endpoints, UnitRange};
pub use envelope::{reply_to, Envelope, Performative, Protocol};
pub use error::{ProtoError, Result};
pub use events::{MonitorEvent, MonitorEventKind};
pub use filter::{matches, Filter};
pub use types::{CorrelationId, Identity, Topic};
