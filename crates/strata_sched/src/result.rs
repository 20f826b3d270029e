//! Per-session outcomes and the run report.

use std::collections::BTreeMap;

use strata_store::ABSENT_HEAP;

/// Outcome of one session in a scheduling run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionResult {
    /// The session was already up to date and its build was skipped.
    pub current: bool,

    /// Heap stamp handed to children as their parent-heap input.
    pub heap: String,

    /// Status code; 0 means success or skipped-as-current.
    pub code: i32,
}

impl SessionResult {
    /// The synthetic result used as the parent of root sessions.
    pub fn root() -> Self {
        Self {
            current: true,
            heap: ABSENT_HEAP.to_string(),
            code: 0,
        }
    }

    /// Returns `true` for a zero status code.
    pub fn ok(&self) -> bool {
        self.code == 0
    }
}

/// Accumulated results of one scheduling run.
#[derive(Debug, Default)]
pub struct ScheduleReport {
    /// Per-session results, keyed by name.
    pub results: BTreeMap<String, SessionResult>,
}

impl ScheduleReport {
    /// The overall process exit status: the maximum per-session code.
    ///
    /// Zero only if every session succeeded or was already current.
    pub fn exit_code(&self) -> i32 {
        self.results.values().map(|r| r.code).max().unwrap_or(0)
    }

    /// Sorted names of sessions that failed or were cancelled.
    pub fn unfinished(&self) -> Vec<&str> {
        self.results
            .iter()
            .filter(|(_, r)| !r.ok())
            .map(|(n, _)| n.as_str())
            .collect()
    }
}
