//! Error types for scheduling runs.

use std::path::PathBuf;

use strata_exec::ExecError;
use strata_graph::GraphError;
use strata_store::StoreError;

/// Errors that abort a scheduling run.
///
/// Everything here is structural or environmental; a build *process*
/// failing with a nonzero exit is not an error at this level — it becomes a
/// per-session result code and the run continues on unaffected branches.
#[derive(Debug, thiserror::Error)]
pub enum SchedError {
    /// A structural graph error (duplicate, cycle, undefined selection).
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// A declared source file is missing or unreadable.
    #[error("session '{session}': missing or unreadable source file {path}")]
    MissingSourceFile {
        /// The affected session.
        session: String,
        /// The offending path.
        path: PathBuf,
    },

    /// The heap store could not persist build state.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A build process could not be spawned or supervised.
    #[error(transparent)]
    Exec(#[from] ExecError),
}
