//! The `Session` unit type and its entry digest.

use std::collections::BTreeMap;
use std::path::PathBuf;

use strata_common::Digest;
use strata_config::SessionDecl;

/// One named, independently buildable session.
///
/// Constructed once from its declaration when the graph is built and
/// immutable thereafter. The entry digest covers everything about the
/// declaration that affects the build (name, parent, options, declared
/// sources), so any edit to those forces a rebuild.
#[derive(Debug, Clone)]
pub struct Session {
    /// Unique session name.
    pub name: String,

    /// Parent session name, if any. Sessions form a forest.
    pub parent: Option<String>,

    /// Group tags used for selection.
    pub groups: Vec<String>,

    /// Human-readable description.
    pub description: String,

    /// Persist this session's heap even if nothing depends on it.
    pub build_heap: bool,

    /// Directory session-relative paths resolve against.
    pub dir: PathBuf,

    /// Declared build options.
    pub options: BTreeMap<String, String>,

    /// Declared source groups with paths resolved against [`Session::dir`].
    pub source_groups: Vec<SourceGroup>,

    /// Auxiliary input files, resolved against [`Session::dir`].
    pub aux_files: Vec<PathBuf>,

    /// Content digest of the declaration itself.
    pub entry_digest: Digest,
}

/// A group of resolved source files sharing an options override.
#[derive(Debug, Clone)]
pub struct SourceGroup {
    /// Options applying only to this group.
    pub options: BTreeMap<String, String>,

    /// Absolute (session-dir-resolved) source paths.
    pub files: Vec<PathBuf>,
}

impl Session {
    /// Builds a session from its declaration.
    pub fn from_decl(decl: &SessionDecl) -> Self {
        let dir = decl.session_dir();
        let source_groups = decl
            .source_groups
            .iter()
            .map(|g| SourceGroup {
                options: g.options.clone(),
                files: g.files.iter().map(|f| dir.join(f)).collect(),
            })
            .collect();
        let aux_files = decl.aux_files.iter().map(|f| dir.join(f)).collect();

        Self {
            name: decl.name.clone(),
            parent: decl.parent.clone(),
            groups: decl.groups.clone(),
            description: decl.description.clone(),
            build_heap: decl.build_heap,
            dir,
            options: decl.options.clone(),
            source_groups,
            aux_files,
            entry_digest: entry_digest(decl),
        }
    }

    /// Returns `true` if the session carries the given group tag.
    pub fn in_group(&self, group: &str) -> bool {
        self.groups.iter().any(|g| g == group)
    }
}

/// Computes the entry digest of a declaration.
///
/// Hashes the canonical tuple (name, parent, options, declared source
/// groups) as length-delimited parts. Declared source paths are hashed as
/// written, not as resolved, so moving a whole declaration directory does
/// not invalidate its sessions.
fn entry_digest(decl: &SessionDecl) -> Digest {
    let mut parts: Vec<String> = Vec::new();
    parts.push(decl.name.clone());
    parts.push(decl.parent.clone().unwrap_or_default());
    for (key, value) in &decl.options {
        parts.push(format!("{key}={value}"));
    }
    for group in &decl.source_groups {
        parts.push("group".to_string());
        for (key, value) in &group.options {
            parts.push(format!("{key}={value}"));
        }
        for file in &group.files {
            parts.push(file.clone());
        }
    }
    Digest::from_parts(&parts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_config::load_declarations_from_str;
    use std::path::Path;

    fn decl(toml: &str) -> SessionDecl {
        load_declarations_from_str(toml, Path::new("/proj"))
            .unwrap()
            .remove(0)
    }

    #[test]
    fn from_decl_resolves_paths() {
        let s = Session::from_decl(&decl(
            r#"
[[session]]
name = "base"
aux_files = ["data.bin"]

[[session.sources]]
files = ["src/a.txt"]
"#,
        ));
        assert_eq!(s.name, "base");
        assert_eq!(s.source_groups[0].files[0], Path::new("/proj/src/a.txt"));
        assert_eq!(s.aux_files[0], Path::new("/proj/data.bin"));
    }

    #[test]
    fn entry_digest_stable_across_reloads() {
        let toml = r#"
[[session]]
name = "base"

[session.options]
threads = "4"
"#;
        let a = Session::from_decl(&decl(toml));
        let b = Session::from_decl(&decl(toml));
        assert_eq!(a.entry_digest, b.entry_digest);
    }

    #[test]
    fn entry_digest_changes_with_options() {
        let a = Session::from_decl(&decl(
            "[[session]]\nname = \"base\"\n[session.options]\nthreads = \"4\"\n",
        ));
        let b = Session::from_decl(&decl(
            "[[session]]\nname = \"base\"\n[session.options]\nthreads = \"8\"\n",
        ));
        assert_ne!(a.entry_digest, b.entry_digest);
    }

    #[test]
    fn entry_digest_changes_with_parent() {
        let a = Session::from_decl(&decl("[[session]]\nname = \"lib\"\n"));
        let b = {
            let decls = load_declarations_from_str(
                "[[session]]\nname = \"base\"\n[[session]]\nname = \"lib\"\nparent = \"base\"\n",
                Path::new("/proj"),
            )
            .unwrap();
            Session::from_decl(&decls[1])
        };
        assert_ne!(a.entry_digest, b.entry_digest);
    }

    #[test]
    fn entry_digest_changes_with_sources() {
        let a = Session::from_decl(&decl(
            "[[session]]\nname = \"base\"\n[[session.sources]]\nfiles = [\"a.txt\"]\n",
        ));
        let b = Session::from_decl(&decl(
            "[[session]]\nname = \"base\"\n[[session.sources]]\nfiles = [\"b.txt\"]\n",
        ));
        assert_ne!(a.entry_digest, b.entry_digest);
    }

    #[test]
    fn entry_digest_ignores_declaration_location() {
        let toml = "[[session]]\nname = \"base\"\n[[session.sources]]\nfiles = [\"a.txt\"]\n";
        let a = Session::from_decl(
            &load_declarations_from_str(toml, Path::new("/here"))
                .unwrap()
                .remove(0),
        );
        let b = Session::from_decl(
            &load_declarations_from_str(toml, Path::new("/there"))
                .unwrap()
                .remove(0),
        );
        assert_eq!(a.entry_digest, b.entry_digest);
    }

    #[test]
    fn in_group() {
        let s = Session::from_decl(&decl(
            "[[session]]\nname = \"base\"\ngroups = [\"main\", \"ci\"]\n",
        ));
        assert!(s.in_group("main"));
        assert!(s.in_group("ci"));
        assert!(!s.in_group("docs"));
    }
}
