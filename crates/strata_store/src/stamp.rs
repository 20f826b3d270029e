//! Stamp computation for staleness comparison.
//!
//! Stamps are compared byte-for-byte across runs; there is no partial or
//! fuzzy matching. The sources stamp is content-hashed because it covers
//! inputs the orchestrator did not produce. The heap stamp is deliberately
//! coarse (size + mtime) because it tracks an output this orchestrator
//! itself just wrote; re-hashing large heaps buys nothing beyond detecting
//! external tampering, which size + mtime already does.

use std::path::Path;
use std::time::UNIX_EPOCH;

use strata_common::Digest;

/// Sentinel heap stamp meaning "no heap produced / none found".
pub const ABSENT_HEAP: &str = "-";

/// Builds the sources stamp from a session's input digests.
///
/// The digest list is sorted before joining so the stamp is independent of
/// enumeration order.
pub fn sources_stamp(digests: &[Digest]) -> String {
    let mut hex: Vec<String> = digests.iter().map(Digest::to_string).collect();
    hex.sort();
    hex.join(" ")
}

/// Stamps a heap artifact by size and modification time.
///
/// Returns [`ABSENT_HEAP`] if the artifact does not exist or cannot be
/// inspected.
pub fn heap_stamp(path: &Path) -> String {
    let Ok(meta) = std::fs::metadata(path) else {
        return ABSENT_HEAP.to_string();
    };
    let mtime = meta
        .modified()
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    format!("{}:{}", meta.len(), mtime)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn sources_stamp_order_independent() {
        let a = Digest::from_bytes(b"alpha");
        let b = Digest::from_bytes(b"beta");
        assert_eq!(sources_stamp(&[a, b]), sources_stamp(&[b, a]));
    }

    #[test]
    fn sources_stamp_sensitive_to_content() {
        let a = Digest::from_bytes(b"alpha");
        let b = Digest::from_bytes(b"beta");
        let c = Digest::from_bytes(b"gamma");
        assert_ne!(sources_stamp(&[a, b]), sources_stamp(&[a, c]));
    }

    #[test]
    fn sources_stamp_empty() {
        assert_eq!(sources_stamp(&[]), "");
    }

    #[test]
    fn heap_stamp_missing_is_absent() {
        let tmp = tempfile::tempdir().unwrap();
        assert_eq!(heap_stamp(&tmp.path().join("nope")), ABSENT_HEAP);
    }

    #[test]
    fn heap_stamp_reflects_size() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("heap");
        fs::write(&path, b"12345").unwrap();
        let stamp = heap_stamp(&path);
        assert!(stamp.starts_with("5:"), "stamp was {stamp}");
    }

    #[test]
    fn heap_stamp_stable_without_changes() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("heap");
        fs::write(&path, b"content").unwrap();
        assert_eq!(heap_stamp(&path), heap_stamp(&path));
    }
}
