//! Error types for the heap store.

use std::path::PathBuf;

/// Errors that can occur while persisting build state.
///
/// Reads are fail-safe (`Option`-returning, corruption means "no record");
/// this enum covers the write paths, where losing a freshly built record is
/// a real failure.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// An I/O error occurred while writing store files.
    #[error("store I/O error at {path}: {source}")]
    Io {
        /// The path that caused the error.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },
}

impl StoreError {
    /// Wraps an I/O error with the path it occurred at.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_display() {
        let err = StoreError::io(
            "/tmp/out/log/base.gz",
            std::io::Error::new(std::io::ErrorKind::NotFound, "file not found"),
        );
        let msg = err.to_string();
        assert!(msg.contains("store I/O error"));
        assert!(msg.contains("base.gz"));
    }
}
