//! # scholar-bus
//!
//! Reliable, order-preserving delivery of [`Envelope`]s between named
//! endpoints inside one process.
//!
//! The marketplace core treats transport as an external collaborator. This
//! crate provides the substrate it assumes:
//!
//! - **Transport** - the [`Transport`] seam and the in-memory [`Bus`]
//! - **Mailbox** - a participant's private inbox with
//!   [`Mailbox::recv_matching`], the receive-with-filter-and-timeout primitive
//! - **Outbox** - send, reply and report helpers bound to one identity
//!
//! ## Example
//!
//! ```rust
//! use scholar_bus::{Bus, Outbox};
//! use scholar_proto::{Identity, Performative, Protocol};
//!
//! let bus = Bus::new();
//! let mut inbox = bus.register(Identity::new("directory")).unwrap();
//! let outbox = Outbox::new(Identity::new("tutor1"), bus.transport());
//!
//! outbox
//!     .send(Protocol::Directory, Performative::Register, &Identity::new("directory"), r#"["physics"]"#)
//!     .unwrap();
//!
//! let envelope = inbox.try_recv().unwrap();
//! assert_eq!(envelope.sender.as_str(), "tutor1");
//! ```
//!
//! [`Envelope`]: scholar_proto::Envelope

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod mailbox;
pub mod outbox;
pub mod transport;

pub use error::{BusError, Result};
pub use mailbox::Mailbox;
pub use outbox::{Outbox, Reporter};
pub use transport::{Bus, Transport};
