//! Shared foundational types used across the Strata build orchestrator.
//!
//! This crate provides the content digest type used for staleness detection
//! throughout the scheduler, store, and graph crates.

#![warn(missing_docs)]

pub mod hash;

pub use hash::Digest;
