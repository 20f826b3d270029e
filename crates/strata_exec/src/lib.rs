//! Supervision of external build processes.
//!
//! The scheduler core stays unaware of process-creation details: a [`Job`]
//! is an opaque asynchronous external command supporting start, poll, join,
//! and kill. Each job carries a unique temporary argument file that is
//! cleaned up when the job is harvested.

#![warn(missing_docs)]

pub mod error;
pub mod job;

pub use error::ExecError;
pub use job::{Job, JobOutput};
