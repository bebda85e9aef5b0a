//! Integration test crate for the Scholar marketplace.
//!
//! This crate exists solely to run tests that span several Scholar crates.
//! It has no public API; everything lives in the test modules.

#![forbid(unsafe_code)]
