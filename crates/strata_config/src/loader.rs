//! Declaration file loading and validation.

use crate::error::ConfigError;
use crate::types::{DeclFile, SessionDecl};
use std::collections::BTreeSet;
use std::path::Path;

/// Name of the declaration file within each declaration directory.
pub const DECL_FILE: &str = "strata.toml";

/// Loads and validates session declarations from a set of directories.
///
/// Each directory is expected to contain a `strata.toml` file; directories
/// without one are skipped silently so that heap-only search directories can
/// be mixed in. Declarations from all files are validated together, so a
/// parent declared in one directory may be referenced from another.
pub fn load_declarations(dirs: &[impl AsRef<Path>]) -> Result<Vec<SessionDecl>, ConfigError> {
    let mut decls = Vec::new();
    for dir in dirs {
        let dir = dir.as_ref();
        let path = dir.join(DECL_FILE);
        if !path.is_file() {
            continue;
        }
        let content = std::fs::read_to_string(&path)?;
        let file: DeclFile =
            toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        for mut decl in file.sessions {
            decl.base_dir = dir.to_path_buf();
            decls.push(decl);
        }
    }
    validate(&decls)?;
    Ok(decls)
}

/// Parses and validates declarations from a string, rooted at `base_dir`.
///
/// Useful for testing without filesystem dependencies.
pub fn load_declarations_from_str(
    content: &str,
    base_dir: &Path,
) -> Result<Vec<SessionDecl>, ConfigError> {
    let file: DeclFile =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    let mut decls = file.sessions;
    for decl in &mut decls {
        decl.base_dir = base_dir.to_path_buf();
    }
    validate(&decls)?;
    Ok(decls)
}

/// Validates declaration-level invariants: non-empty unique names and
/// resolvable parents. The single-parent restriction is structural here
/// (each declaration has one optional `parent` field), so only dangling
/// references need checking.
fn validate(decls: &[SessionDecl]) -> Result<(), ConfigError> {
    let mut seen = BTreeSet::new();
    for decl in decls {
        if decl.name.is_empty() {
            return Err(ConfigError::MissingField("session.name".to_string()));
        }
        if !seen.insert(decl.name.as_str()) {
            return Err(ConfigError::DuplicateSession(decl.name.clone()));
        }
    }
    for decl in decls {
        if let Some(parent) = &decl.parent {
            if !seen.contains(parent.as_str()) {
                return Err(ConfigError::BadParent {
                    session: decl.name.clone(),
                    parent: parent.clone(),
                });
            }
        }
    }
    Ok(())
}
