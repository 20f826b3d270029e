//! Session declaration loading for the Strata build orchestrator.
//!
//! Sessions are declared in `strata.toml` files, one file per declaration
//! directory. This crate parses those files into typed declarations and
//! validates name uniqueness and parent references before the dependency
//! graph is ever constructed.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod types;

pub use error::ConfigError;
pub use loader::{load_declarations, load_declarations_from_str, DECL_FILE};
pub use types::{DeclFile, SessionDecl, SourceGroupDecl};
