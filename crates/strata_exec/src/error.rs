//! Error types for job supervision.

/// Errors that can occur while supervising an external build process.
#[derive(Debug, thiserror::Error)]
pub enum ExecError {
    /// The build process could not be spawned.
    #[error("failed to spawn '{program}' for session '{session}': {source}")]
    Spawn {
        /// The program that failed to start.
        program: String,
        /// The session the job belongs to.
        session: String,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The per-job argument file could not be written.
    #[error("failed to write argument file for session '{session}': {source}")]
    ArgsFile {
        /// The session the job belongs to.
        session: String,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Waiting on the build process failed.
    #[error("failed to wait on build process for session '{session}': {source}")]
    Wait {
        /// The session the job belongs to.
        session: String,
        /// The underlying I/O error.
        source: std::io::Error,
    },
}
