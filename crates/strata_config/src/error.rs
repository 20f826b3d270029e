//! Error types for session declaration loading and validation.

/// Errors that can occur when loading or validating session declarations.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An I/O error occurred while reading a declaration file.
    #[error("failed to read declarations: {0}")]
    IoError(#[from] std::io::Error),

    /// The TOML content could not be parsed.
    #[error("failed to parse declarations: {0}")]
    ParseError(String),

    /// The same session name was declared more than once.
    #[error("duplicate session declaration '{0}'")]
    DuplicateSession(String),

    /// A declared parent does not refer to any declared session.
    #[error("session '{session}' refers to undeclared parent '{parent}'")]
    BadParent {
        /// The session with the dangling parent reference.
        session: String,
        /// The parent name that could not be resolved.
        parent: String,
    },

    /// A required field is missing or empty.
    #[error("missing required field: {0}")]
    MissingField(String),
}
