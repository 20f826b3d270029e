//! The heap store: output directory plus pre-built search directories.

use std::path::{Path, PathBuf};

use crate::error::StoreError;
use crate::record::BuildRecord;
use crate::stamp::heap_stamp;

/// Subdirectory holding build records and failure logs.
const LOG_SUBDIR: &str = "log";

/// Subdirectory holding heap artifacts.
const HEAPS_SUBDIR: &str = "heaps";

/// A build record located in one of the store's search directories.
#[derive(Debug, Clone)]
pub struct FoundRecord {
    /// The parsed record.
    pub record: BuildRecord,

    /// Heap stamp of the artifact actually present next to the record.
    pub heap: String,

    /// The directory the record was found in.
    pub dir: PathBuf,
}

/// Store for heaps, build records, and failure logs.
///
/// New output always goes to the output directory. Lookups search the
/// output directory first and then each input directory in order; when the
/// same session has records in several directories, the first match wins
/// and later directories are never consulted.
#[derive(Debug, Clone)]
pub struct HeapStore {
    output_dir: PathBuf,
    input_dirs: Vec<PathBuf>,
}

impl HeapStore {
    /// Creates a store writing to `output_dir` and additionally searching
    /// `input_dirs` for pre-built heaps.
    pub fn new(output_dir: impl Into<PathBuf>, input_dirs: Vec<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            input_dirs,
        }
    }

    /// The directory new records and heaps are written to.
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Creates the output `log/` and `heaps/` subdirectories.
    pub fn ensure_dirs(&self) -> Result<(), StoreError> {
        for sub in [LOG_SUBDIR, HEAPS_SUBDIR] {
            let dir = self.output_dir.join(sub);
            std::fs::create_dir_all(&dir).map_err(|e| StoreError::io(dir.clone(), e))?;
        }
        Ok(())
    }

    fn record_path_in(dir: &Path, name: &str) -> PathBuf {
        dir.join(LOG_SUBDIR).join(format!("{name}.gz"))
    }

    fn failure_log_path_in(dir: &Path, name: &str) -> PathBuf {
        dir.join(LOG_SUBDIR).join(format!("{name}.log"))
    }

    fn heap_path_in(dir: &Path, name: &str) -> PathBuf {
        dir.join(HEAPS_SUBDIR).join(name)
    }

    /// Path of the session's heap artifact in the output directory.
    pub fn heap_path(&self, name: &str) -> PathBuf {
        Self::heap_path_in(&self.output_dir, name)
    }

    /// Path of the session's build record in the output directory.
    pub fn record_path(&self, name: &str) -> PathBuf {
        Self::record_path_in(&self.output_dir, name)
    }

    /// Path of the session's failure log in the output directory.
    pub fn failure_log_path(&self, name: &str) -> PathBuf {
        Self::failure_log_path_in(&self.output_dir, name)
    }

    /// Searches all directories for the session's build record.
    ///
    /// The heap stamp in the result is computed from the heap artifact in
    /// the *same* directory as the record, so a record from an input
    /// directory is validated against that directory's heap.
    pub fn find_record(&self, name: &str) -> Option<FoundRecord> {
        std::iter::once(&self.output_dir)
            .chain(self.input_dirs.iter())
            .find_map(|dir| {
                let record = BuildRecord::read(&Self::record_path_in(dir, name))?;
                Some(FoundRecord {
                    record,
                    heap: heap_stamp(&Self::heap_path_in(dir, name)),
                    dir: dir.clone(),
                })
            })
    }

    /// Locates the session's heap artifact, searching the output directory
    /// first and then each input directory in order.
    pub fn find_heap(&self, name: &str) -> Option<PathBuf> {
        std::iter::once(&self.output_dir)
            .chain(self.input_dirs.iter())
            .map(|dir| Self::heap_path_in(dir, name))
            .find(|p| p.is_file())
    }

    /// Writes a fresh build record for the session.
    pub fn write_record(&self, name: &str, record: &BuildRecord) -> Result<(), StoreError> {
        self.ensure_dirs()?;
        record.write(&self.record_path(name))
    }

    /// Writes the plain-text failure log for the session.
    pub fn write_failure_log(&self, name: &str, output: &str) -> Result<(), StoreError> {
        self.ensure_dirs()?;
        let path = self.failure_log_path(name);
        std::fs::write(&path, output).map_err(|e| StoreError::io(path, e))
    }

    /// Removes the session's build record, if present.
    pub fn remove_record(&self, name: &str) {
        let _ = std::fs::remove_file(self.record_path(name));
    }

    /// Removes the session's failure log, if present.
    pub fn remove_failure_log(&self, name: &str) {
        let _ = std::fs::remove_file(self.failure_log_path(name));
    }

    /// Removes the session's heap artifact, if present.
    pub fn remove_heap(&self, name: &str) {
        let _ = std::fs::remove_file(self.heap_path(name));
    }

    /// Removes every trace of the session from the output directory:
    /// heap, record, and failure log. Used by clean builds.
    pub fn purge(&self, name: &str) {
        self.remove_heap(name);
        self.remove_record(name);
        self.remove_failure_log(name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stamp::ABSENT_HEAP;
    use std::fs;

    fn record(tag: &str) -> BuildRecord {
        BuildRecord {
            sources: format!("{tag}-sources"),
            parent_heap: "-".to_string(),
            heap: "-".to_string(),
            output: String::new(),
        }
    }

    #[test]
    fn write_then_find_in_output_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let store = HeapStore::new(tmp.path(), vec![]);
        store.write_record("base", &record("out")).unwrap();

        let found = store.find_record("base").unwrap();
        assert_eq!(found.record.sources, "out-sources");
        assert_eq!(found.dir, tmp.path());
        assert_eq!(found.heap, ABSENT_HEAP);
    }

    #[test]
    fn find_missing_is_none() {
        let tmp = tempfile::tempdir().unwrap();
        let store = HeapStore::new(tmp.path(), vec![]);
        assert!(store.find_record("ghost").is_none());
    }

    #[test]
    fn output_dir_wins_over_input_dirs() {
        let tmp = tempfile::tempdir().unwrap();
        let out = tmp.path().join("out");
        let pre = tmp.path().join("pre");

        HeapStore::new(&out, vec![])
            .write_record("base", &record("out"))
            .unwrap();
        HeapStore::new(&pre, vec![])
            .write_record("base", &record("pre"))
            .unwrap();

        let store = HeapStore::new(&out, vec![pre]);
        let found = store.find_record("base").unwrap();
        assert_eq!(found.record.sources, "out-sources");
    }

    #[test]
    fn input_dirs_searched_in_order() {
        let tmp = tempfile::tempdir().unwrap();
        let out = tmp.path().join("out");
        let first = tmp.path().join("first");
        let second = tmp.path().join("second");

        HeapStore::new(&first, vec![])
            .write_record("base", &record("first"))
            .unwrap();
        HeapStore::new(&second, vec![])
            .write_record("base", &record("second"))
            .unwrap();

        let store = HeapStore::new(&out, vec![first.clone(), second]);
        let found = store.find_record("base").unwrap();
        assert_eq!(found.record.sources, "first-sources");
        assert_eq!(found.dir, first);
    }

    #[test]
    fn heap_stamp_comes_from_record_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let out = tmp.path().join("out");
        let pre = tmp.path().join("pre");

        let pre_store = HeapStore::new(&pre, vec![]);
        pre_store.write_record("base", &record("pre")).unwrap();
        fs::write(pre_store.heap_path("base"), b"heap-bytes").unwrap();

        let store = HeapStore::new(&out, vec![pre]);
        let found = store.find_record("base").unwrap();
        assert!(found.heap.starts_with("10:"), "heap was {}", found.heap);
    }

    #[test]
    fn find_heap_prefers_output_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let out = tmp.path().join("out");
        let pre = tmp.path().join("pre");
        let out_store = HeapStore::new(&out, vec![]);
        let pre_store = HeapStore::new(&pre, vec![]);
        out_store.ensure_dirs().unwrap();
        pre_store.ensure_dirs().unwrap();
        fs::write(out_store.heap_path("base"), b"new").unwrap();
        fs::write(pre_store.heap_path("base"), b"old").unwrap();

        let store = HeapStore::new(&out, vec![pre.clone()]);
        assert_eq!(store.find_heap("base").unwrap(), out_store.heap_path("base"));

        fs::remove_file(out_store.heap_path("base")).unwrap();
        assert_eq!(store.find_heap("base").unwrap(), pre_store.heap_path("base"));
        assert!(store.find_heap("other").is_none());
    }

    #[test]
    fn purge_removes_everything() {
        let tmp = tempfile::tempdir().unwrap();
        let store = HeapStore::new(tmp.path(), vec![]);
        store.write_record("base", &record("out")).unwrap();
        store.write_failure_log("base", "boom").unwrap();
        fs::write(store.heap_path("base"), b"heap").unwrap();

        store.purge("base");
        assert!(store.find_record("base").is_none());
        assert!(!store.failure_log_path("base").exists());
        assert!(!store.heap_path("base").exists());
    }

    #[test]
    fn purge_missing_session_is_quiet() {
        let tmp = tempfile::tempdir().unwrap();
        let store = HeapStore::new(tmp.path(), vec![]);
        store.purge("never-built");
    }

    #[test]
    fn failure_log_roundtrip() {
        let tmp = tempfile::tempdir().unwrap();
        let store = HeapStore::new(tmp.path(), vec![]);
        store.write_failure_log("base", "error: boom\n").unwrap();
        let content = fs::read_to_string(store.failure_log_path("base")).unwrap();
        assert_eq!(content, "error: boom\n");
    }
}
