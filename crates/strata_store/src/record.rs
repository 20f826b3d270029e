//! The persisted per-session build record.

use std::io::{Read, Write};
use std::path::Path;

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

use crate::error::StoreError;

/// A session's persisted build record.
///
/// Three stamp header lines followed by the captured build output. Written
/// only after a successful build, always as a full overwrite; a failed
/// build deletes the record instead of updating it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildRecord {
    /// Sorted, space-joined digests of the session's entry and sources.
    pub sources: String,

    /// The parent's heap stamp at the time this session was built.
    pub parent_heap: String,

    /// This session's own heap stamp ([`ABSENT_HEAP`](crate::ABSENT_HEAP)
    /// if no heap was produced).
    pub heap: String,

    /// Captured build output.
    pub output: String,
}

impl BuildRecord {
    /// Writes the record gzip-compressed to `path`, atomically.
    ///
    /// The content goes to a sibling temp file first and is renamed into
    /// place, so a crash mid-write can never leave a record that claims
    /// success with truncated stamps.
    pub fn write(&self, path: &Path) -> Result<(), StoreError> {
        let content = format!(
            "{}\n{}\n{}\n{}",
            self.sources, self.parent_heap, self.heap, self.output
        );
        let tmp = path.with_extension("tmp");
        let file =
            std::fs::File::create(&tmp).map_err(|e| StoreError::io(tmp.clone(), e))?;
        let mut encoder = GzEncoder::new(file, Compression::default());
        encoder
            .write_all(content.as_bytes())
            .and_then(|()| encoder.finish().map(|_| ()))
            .map_err(|e| StoreError::io(tmp.clone(), e))?;
        std::fs::rename(&tmp, path).map_err(|e| StoreError::io(path.to_path_buf(), e))
    }

    /// Reads a record from `path`, returning `None` if the file is missing,
    /// not valid gzip, or truncated before the three header lines.
    ///
    /// This is fail-safe: any problem is treated as "no record", which
    /// triggers a rebuild.
    pub fn read(path: &Path) -> Option<Self> {
        let file = std::fs::File::open(path).ok()?;
        let mut content = String::new();
        GzDecoder::new(file).read_to_string(&mut content).ok()?;
        let mut lines = content.splitn(4, '\n');
        let sources = lines.next()?.to_string();
        let parent_heap = lines.next()?.to_string();
        let heap = lines.next()?.to_string();
        let output = lines.next().unwrap_or_default().to_string();
        Some(Self {
            sources,
            parent_heap,
            heap,
            output,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> BuildRecord {
        BuildRecord {
            sources: "aa bb cc".to_string(),
            parent_heap: "100:1234".to_string(),
            heap: "200:5678".to_string(),
            output: "building...\ndone\n".to_string(),
        }
    }

    #[test]
    fn write_read_roundtrip() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("base.gz");
        record().write(&path).unwrap();
        assert_eq!(BuildRecord::read(&path).unwrap(), record());
    }

    #[test]
    fn overwrite_replaces_fully() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("base.gz");
        record().write(&path).unwrap();

        let mut updated = record();
        updated.sources = "dd".to_string();
        updated.output = String::new();
        updated.write(&path).unwrap();

        assert_eq!(BuildRecord::read(&path).unwrap(), updated);
    }

    #[test]
    fn no_stray_temp_file_left() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("base.gz");
        record().write(&path).unwrap();
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn read_missing_is_none() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(BuildRecord::read(&tmp.path().join("nope.gz")).is_none());
    }

    #[test]
    fn read_corrupt_is_none() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("bad.gz");
        std::fs::write(&path, b"not gzip at all").unwrap();
        assert!(BuildRecord::read(&path).is_none());
    }

    #[test]
    fn read_truncated_headers_is_none() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("short.gz");
        let file = std::fs::File::create(&path).unwrap();
        let mut enc = GzEncoder::new(file, Compression::default());
        enc.write_all(b"only-one-line").unwrap();
        enc.finish().unwrap();
        assert!(BuildRecord::read(&path).is_none());
    }

    #[test]
    fn empty_output_allowed() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("base.gz");
        let rec = BuildRecord {
            output: String::new(),
            ..record()
        };
        rec.write(&path).unwrap();
        assert_eq!(BuildRecord::read(&path).unwrap().output, "");
    }
}
