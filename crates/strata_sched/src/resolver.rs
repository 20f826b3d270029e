//! The source-resolver collaborator and its per-run memo cache.

use std::collections::BTreeMap;
use std::path::PathBuf;

use strata_common::Digest;
use strata_graph::Session;

use crate::error::SchedError;

/// The resolved inputs of one session: every concrete input artifact
/// (declared sources plus auxiliary files) paired with its content digest.
///
/// Not persisted — recomputed each invocation and memoized per run by
/// [`SourceCache`].
#[derive(Debug, Clone)]
pub struct SourceNode {
    /// Input files with their digests, in resolution order.
    pub files: Vec<(PathBuf, Digest)>,
}

impl SourceNode {
    /// The digests of all inputs.
    pub fn digests(&self) -> Vec<Digest> {
        self.files.iter().map(|(_, d)| *d).collect()
    }

    /// The paths of all inputs.
    pub fn paths(&self) -> Vec<PathBuf> {
        self.files.iter().map(|(p, _)| p.clone()).collect()
    }
}

/// Resolves a session's declared sources into concrete digested inputs.
///
/// The parent's already-resolved input paths are passed in so resolvers
/// that share theory state along the parent chain can dedup against them.
pub trait SourceResolver {
    /// Resolves all inputs of `session`.
    ///
    /// Fails with an error naming the session if any referenced file is
    /// missing or unreadable.
    fn resolve(
        &self,
        session: &Session,
        parent_sources: &[PathBuf],
    ) -> Result<SourceNode, SchedError>;
}

/// Default resolver: reads and hashes every declared source and auxiliary
/// file from disk. Files already resolved by the parent are skipped.
#[derive(Debug, Default)]
pub struct FileResolver;

impl SourceResolver for FileResolver {
    fn resolve(
        &self,
        session: &Session,
        parent_sources: &[PathBuf],
    ) -> Result<SourceNode, SchedError> {
        let mut files = Vec::new();
        let declared = session
            .source_groups
            .iter()
            .flat_map(|g| g.files.iter())
            .chain(session.aux_files.iter());
        for path in declared {
            if parent_sources.contains(path) {
                continue;
            }
            let content = std::fs::read(path).map_err(|_| SchedError::MissingSourceFile {
                session: session.name.clone(),
                path: path.clone(),
            })?;
            files.push((path.clone(), Digest::from_bytes(&content)));
        }
        Ok(SourceNode { files })
    }
}

/// Per-run memo cache over a [`SourceResolver`].
///
/// The scheduler asks for a session's sources at least twice (staleness
/// check and final record write), so resolutions are cached by session
/// name for the lifetime of the run.
pub struct SourceCache<'a> {
    resolver: &'a dyn SourceResolver,
    cache: BTreeMap<String, SourceNode>,
}

impl<'a> SourceCache<'a> {
    /// Creates an empty cache over the given resolver.
    pub fn new(resolver: &'a dyn SourceResolver) -> Self {
        Self {
            resolver,
            cache: BTreeMap::new(),
        }
    }

    /// Resolves (or returns the cached) inputs of `session`.
    pub fn get(
        &mut self,
        session: &Session,
        parent_sources: &[PathBuf],
    ) -> Result<SourceNode, SchedError> {
        if let Some(node) = self.cache.get(&session.name) {
            return Ok(node.clone());
        }
        let node = self.resolver.resolve(session, parent_sources)?;
        self.cache.insert(session.name.clone(), node.clone());
        Ok(node)
    }

    /// The cached input paths of a session, if it has been resolved.
    pub fn paths_of(&self, name: &str) -> Option<Vec<PathBuf>> {
        self.cache.get(name).map(SourceNode::paths)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::fs;
    use std::path::Path;
    use strata_config::load_declarations_from_str;

    fn session_with_sources(dir: &Path, files: &[&str]) -> Session {
        let list = files
            .iter()
            .map(|f| format!("\"{f}\""))
            .collect::<Vec<_>>()
            .join(", ");
        let toml = format!("[[session]]\nname = \"base\"\n[[session.sources]]\nfiles = [{list}]\n");
        Session::from_decl(&load_declarations_from_str(&toml, dir).unwrap().remove(0))
    }

    #[test]
    fn resolves_and_hashes_declared_files() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("a.txt"), "alpha").unwrap();
        fs::write(tmp.path().join("b.txt"), "beta").unwrap();
        let session = session_with_sources(tmp.path(), &["a.txt", "b.txt"]);

        let node = FileResolver.resolve(&session, &[]).unwrap();
        assert_eq!(node.files.len(), 2);
        assert_eq!(node.files[0].1, Digest::from_bytes(b"alpha"));
        assert_eq!(node.files[1].1, Digest::from_bytes(b"beta"));
    }

    #[test]
    fn missing_file_names_the_session() {
        let tmp = tempfile::tempdir().unwrap();
        let session = session_with_sources(tmp.path(), &["gone.txt"]);

        let err = FileResolver.resolve(&session, &[]).unwrap_err();
        match err {
            SchedError::MissingSourceFile { session, path } => {
                assert_eq!(session, "base");
                assert!(path.ends_with("gone.txt"));
            }
            other => panic!("expected MissingSourceFile, got {other:?}"),
        }
    }

    #[test]
    fn parent_sources_are_skipped() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("a.txt"), "alpha").unwrap();
        fs::write(tmp.path().join("b.txt"), "beta").unwrap();
        let session = session_with_sources(tmp.path(), &["a.txt", "b.txt"]);

        let node = FileResolver
            .resolve(&session, &[tmp.path().join("a.txt")])
            .unwrap();
        assert_eq!(node.paths(), vec![tmp.path().join("b.txt")]);
    }

    #[test]
    fn cache_memoizes_per_session() {
        struct Counting<'c>(&'c Cell<usize>);
        impl SourceResolver for Counting<'_> {
            fn resolve(
                &self,
                _session: &Session,
                _parent_sources: &[PathBuf],
            ) -> Result<SourceNode, SchedError> {
                self.0.set(self.0.get() + 1);
                Ok(SourceNode { files: vec![] })
            }
        }

        let tmp = tempfile::tempdir().unwrap();
        let session = session_with_sources(tmp.path(), &[]);
        let calls = Cell::new(0);
        let resolver = Counting(&calls);
        let mut cache = SourceCache::new(&resolver);

        cache.get(&session, &[]).unwrap();
        cache.get(&session, &[]).unwrap();
        assert_eq!(calls.get(), 1);
        assert_eq!(cache.paths_of("base"), Some(vec![]));
        assert!(cache.paths_of("other").is_none());
    }
}
