//! Session metadata and the dependency graph / build queue.
//!
//! The graph maps session names to sessions plus their dependency edges.
//! It is acyclic by construction: insertions that would close a cycle fail
//! with the offending path. The same structure doubles as the scheduler's
//! pending queue via [`SessionGraph::dequeue`].

#![warn(missing_docs)]

pub mod error;
pub mod graph;
pub mod session;

pub use error::GraphError;
pub use graph::SessionGraph;
pub use session::{Session, SourceGroup};
