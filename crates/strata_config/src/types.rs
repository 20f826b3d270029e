//! Declaration types deserialized from `strata.toml`.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// The contents of one `strata.toml` declaration file.
#[derive(Debug, Default, Deserialize)]
pub struct DeclFile {
    /// Session declarations, in file order.
    #[serde(default, rename = "session")]
    pub sessions: Vec<SessionDecl>,
}

/// One session declaration.
///
/// A session is a named, independently buildable unit with at most one
/// parent whose output heap it builds on. Options and declared sources feed
/// the session's entry digest; groups are used only for selection.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionDecl {
    /// Unique session name.
    pub name: String,

    /// Parent session name. Absent for root sessions.
    #[serde(default)]
    pub parent: Option<String>,

    /// Group tags for `-g` selection.
    #[serde(default)]
    pub groups: Vec<String>,

    /// Human-readable description.
    #[serde(default)]
    pub description: String,

    /// Persist this session's heap even if nothing depends on it.
    #[serde(default)]
    pub build_heap: bool,

    /// Directory override, relative to the declaration directory.
    #[serde(default)]
    pub dir: Option<String>,

    /// Declared build options.
    #[serde(default)]
    pub options: BTreeMap<String, String>,

    /// Declared source groups.
    #[serde(default, rename = "sources")]
    pub source_groups: Vec<SourceGroupDecl>,

    /// Auxiliary files that are inputs but not build sources.
    #[serde(default)]
    pub aux_files: Vec<String>,

    /// Directory the declaration was loaded from. Set by the loader,
    /// never read from TOML.
    #[serde(skip)]
    pub base_dir: PathBuf,
}

impl SessionDecl {
    /// Returns the directory session-relative paths resolve against:
    /// the declaration directory, adjusted by the `dir` override.
    pub fn session_dir(&self) -> PathBuf {
        match &self.dir {
            Some(d) => self.base_dir.join(d),
            None => self.base_dir.clone(),
        }
    }
}

/// A group of declared source files sharing an options override.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceGroupDecl {
    /// Options that apply only to this group's files.
    #[serde(default)]
    pub options: BTreeMap<String, String>,

    /// Source file paths, relative to the session directory.
    pub files: Vec<String>,
}
