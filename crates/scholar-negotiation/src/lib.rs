//! # scholar-negotiation
//!
//! Contract Net negotiation for tutoring sessions.
//!
//! A student (the initiator) runs one [`Round`] at a time:
//!
//! 1. broadcast a call for proposals to every candidate tutor
//! 2. collect `propose` envelopes until a fixed deadline
//! 3. score every [`Proposal`] with the [`ScoringPolicy`] and pick the cheapest
//! 4. accept the winner and reject everyone else
//! 5. wait a bounded time for the winner to confirm
//!
//! [`ContractNet`] drives those steps over a mailbox; [`select_winner`] is the
//! pure selection rule.
//!
//! ## Example
//!
//! ```rust
//! use scholar_negotiation::{select_winner, Proposal, ScoringPolicy};
//! use scholar_proto::Identity;
//!
//! let proposals = vec![
//!     Proposal::new(Identity::new("tutorA"), 5.0, 0.9),
//!     Proposal::new(Identity::new("tutorB"), 3.0, 0.5),
//! ];
//!
//! let award = select_winner(&proposals, &ScoringPolicy::default()).unwrap();
//! assert_eq!(award.winner.bidder, Identity::new("tutorA"));
//! assert!((award.score - 7.0).abs() < 1e-9);
//! assert_eq!(award.losers, vec![Identity::new("tutorB")]);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod initiator;
pub mod proposal;
pub mod round;

pub use config::NegotiationConfig;
pub use error::{NegotiationError, Result};
pub use initiator::{Confirmation, ContractNet};
pub use proposal::{select_winner, Award, Proposal, ScoringPolicy};
pub use round::{AbortReason, Round, RoundPhase};
