//! The scheduling loop that drives a build run to completion.
//!
//! Given a dependency graph, a heap store, and a source resolver, the
//! scheduler decides per session whether a cached build is still current,
//! starts build jobs up to the parallelism bound in dependency order,
//! harvests finished jobs, and propagates failure to dependents.

#![warn(missing_docs)]

pub mod error;
pub mod resolver;
pub mod result;
pub mod scheduler;

pub use error::SchedError;
pub use resolver::{FileResolver, SourceCache, SourceNode, SourceResolver};
pub use result::{ScheduleReport, SessionResult};
pub use scheduler::{BuildOptions, Scheduler};
