//! Error types for dependency graph construction and queries.

/// Errors that can occur when building or querying the session graph.
///
/// All of these are structural: they are detected before any build job is
/// started and abort the whole run.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum GraphError {
    /// A session with this name is already present in the graph.
    #[error("duplicate session '{0}'")]
    DuplicateSession(String),

    /// Adding the requested edges would close a dependency cycle.
    ///
    /// The path lists the names forming the loop in order, with the first
    /// name repeated at the end.
    #[error("cyclic session dependency: {}", .0.join(" -> "))]
    CycleDetected(Vec<String>),

    /// One or more referenced session names are not in the graph.
    #[error("undefined session(s): {}", .0.join(", "))]
    UndefinedSession(Vec<String>),
}
