//! The polling build loop.

use std::collections::BTreeMap;
use std::time::Duration;

use strata_exec::Job;
use strata_graph::{Session, SessionGraph};
use strata_store::{heap_stamp, sources_stamp, BuildRecord, HeapStore, ABSENT_HEAP};

use crate::error::SchedError;
use crate::resolver::{SourceCache, SourceNode, SourceResolver};
use crate::result::{ScheduleReport, SessionResult};

/// Number of trailing output lines echoed when a build fails.
const FAILURE_TAIL_LINES: usize = 20;

/// Options controlling one scheduling run.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Maximum number of concurrently running build jobs (minimum 1).
    pub jobs: usize,

    /// Staleness check only: report stale sessions as failures, start
    /// nothing.
    pub no_build: bool,

    /// Purge persisted state for the selection's descendants before
    /// scheduling, forcing every later staleness check to fail.
    pub clean_build: bool,

    /// Force heap persistence for every scheduled session.
    pub build_heap: bool,

    /// Print per-session progress lines.
    pub verbose: bool,

    /// Suppress all output except failure diagnostics.
    pub quiet: bool,

    /// External build command. Whitespace-split; the first token is the
    /// program, the rest become leading arguments.
    pub program: String,

    /// Idle sleep between polls when no progress is possible.
    pub poll_interval: Duration,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            jobs: 1,
            no_build: false,
            clean_build: false,
            build_heap: false,
            verbose: false,
            quiet: false,
            program: "strata-run".to_string(),
            poll_interval: Duration::from_millis(300),
        }
    }
}

/// Drives a selection of sessions to completion.
///
/// One coordinating control loop plus up to `jobs` concurrently running
/// external build processes. The loop owns the pending queue, the running
/// map, and the result map exclusively; nothing mutates them concurrently.
pub struct Scheduler<'a> {
    graph: &'a SessionGraph,
    store: &'a HeapStore,
    resolver: &'a dyn SourceResolver,
    opts: BuildOptions,
}

impl<'a> Scheduler<'a> {
    /// Creates a scheduler over the full session graph.
    pub fn new(
        graph: &'a SessionGraph,
        store: &'a HeapStore,
        resolver: &'a dyn SourceResolver,
        opts: BuildOptions,
    ) -> Self {
        Self {
            graph,
            store,
            resolver,
            opts,
        }
    }

    /// Runs the build for the given selection and returns the result map.
    ///
    /// Structural errors (undefined selection, missing source files) abort
    /// the run before any job is spawned; build-process failures become
    /// per-session codes, cancel their descendants, and leave unrelated
    /// branches running.
    pub fn run(
        &self,
        select_all: bool,
        groups: &[String],
        names: &[String],
    ) -> Result<ScheduleReport, SchedError> {
        let (descendants, mut pending) = self.graph.required(select_all, groups, names)?;

        // Every queued session is resolved up front, parents first, so a
        // missing source file surfaces before any process is started.
        let mut cache = SourceCache::new(self.resolver);
        for (_, session) in pending.topological_order() {
            self.resolve(session, &mut cache)?;
        }

        if self.opts.clean_build {
            for name in &descendants {
                self.store.purge(name);
            }
        }
        self.store.ensure_dirs()?;

        let mut running: BTreeMap<String, Job> = BTreeMap::new();
        let mut report = ScheduleReport::default();

        let outcome = self.drive(&mut pending, &mut running, &mut report, &mut cache);
        if outcome.is_err() {
            // A mid-run abort must not leak live build processes.
            for (_, mut job) in std::mem::take(&mut running) {
                job.terminate();
                let _ = job.join();
            }
        }
        outcome?;

        if !self.opts.quiet {
            let unfinished = report.unfinished();
            if !unfinished.is_empty() {
                eprintln!("Unfinished session(s): {}", unfinished.join(", "));
            }
        }
        Ok(report)
    }

    /// The polling loop proper: harvest finished jobs, dispatch ready
    /// sessions up to the parallelism bound, idle when neither is possible.
    fn drive(
        &self,
        pending: &mut SessionGraph,
        running: &mut BTreeMap<String, Job>,
        report: &mut ScheduleReport,
        cache: &mut SourceCache<'_>,
    ) -> Result<(), SchedError> {
        let jobs_bound = self.opts.jobs.max(1);
        while !pending.is_empty() {
            // Completion has priority over starting new work: the running
            // set stays tight against the parallelism bound.
            if let Some(name) = first_finished(running)? {
                self.harvest(&name, pending, running, report, cache)?;
                continue;
            }

            if running.len() < jobs_bound {
                if let Some((name, session)) = pending.dequeue(|n| running.contains_key(n)) {
                    self.dispatch(&name, &session, pending, running, report, cache)?;
                    continue;
                }
            }

            std::thread::sleep(self.opts.poll_interval);
        }
        Ok(())
    }

    /// Harvests one finished job: persist a record on success, a failure
    /// log on nonzero exit, and resolve the session either way.
    fn harvest(
        &self,
        name: &str,
        pending: &mut SessionGraph,
        running: &mut BTreeMap<String, Job>,
        report: &mut ScheduleReport,
        cache: &mut SourceCache<'_>,
    ) -> Result<(), SchedError> {
        let Some(job) = running.remove(name) else {
            return Ok(());
        };
        let out = job.join()?;
        let Some(session) = pending.get(name).cloned() else {
            return Ok(());
        };
        let parent = self.parent_result(&session, report);

        if out.code == 0 {
            // A fresh success supersedes any earlier failure log.
            self.store.remove_failure_log(name);
            let node = self.resolve(&session, cache)?;
            let persist = self.persists_heap(&session);
            let heap = if persist {
                heap_stamp(&self.store.heap_path(name))
            } else {
                ABSENT_HEAP.to_string()
            };
            let record = BuildRecord {
                sources: self.sources_stamp_of(&session, &node),
                parent_heap: parent.heap,
                heap: heap.clone(),
                output: out.stdout,
            };
            self.store.write_record(name, &record)?;
            if self.opts.verbose && !self.opts.quiet {
                eprintln!("Finished {name}");
            }
            report.results.insert(
                name.to_string(),
                SessionResult {
                    current: false,
                    heap,
                    code: 0,
                },
            );
        } else {
            // A failed build must never leave state implying success.
            self.store.remove_heap(name);
            self.store.remove_record(name);
            let log = format!("{}{}", out.stdout, out.stderr);
            self.store.write_failure_log(name, &log)?;
            if !self.opts.quiet {
                eprintln!(
                    "{name} FAILED (see also \"{}\")",
                    self.store.failure_log_path(name).display()
                );
                for line in tail_lines(&log, FAILURE_TAIL_LINES) {
                    eprintln!("{line}");
                }
            }
            report.results.insert(
                name.to_string(),
                SessionResult {
                    current: false,
                    heap: ABSENT_HEAP.to_string(),
                    code: out.code.max(1),
                },
            );
        }

        pending.remove(name);
        Ok(())
    }

    /// Decides what to do with a ready session: skip it as current, report
    /// it stale (no-build mode), start its job, or cancel it because an
    /// ancestor failed.
    fn dispatch(
        &self,
        name: &str,
        session: &Session,
        pending: &mut SessionGraph,
        running: &mut BTreeMap<String, Job>,
        report: &mut ScheduleReport,
        cache: &mut SourceCache<'_>,
    ) -> Result<(), SchedError> {
        let parent = self.parent_result(session, report);
        let node = self.resolve(session, cache)?;
        let stamp = self.sources_stamp_of(session, &node);
        let persist = self.persists_heap(session);

        let found = self.store.find_record(name);
        let current = found.as_ref().is_some_and(|f| {
            f.record.sources == stamp
                && f.record.parent_heap == parent.heap
                && f.record.heap == f.heap
                && !(persist && f.heap == ABSENT_HEAP)
        });

        if current && parent.current {
            let heap = found
                .map(|f| f.heap)
                .unwrap_or_else(|| ABSENT_HEAP.to_string());
            if self.opts.verbose && !self.opts.quiet {
                eprintln!("Skipping {name} (up to date)");
            }
            report.results.insert(
                name.to_string(),
                SessionResult {
                    current: true,
                    heap,
                    code: 0,
                },
            );
            pending.remove(name);
        } else if self.opts.no_build {
            report.results.insert(
                name.to_string(),
                SessionResult {
                    current: false,
                    heap: ABSENT_HEAP.to_string(),
                    code: 1,
                },
            );
            pending.remove(name);
        } else if parent.ok() {
            if !self.opts.quiet {
                eprintln!("Building {name} ...");
            }
            let job = self.start_job(name, session, &node, persist)?;
            running.insert(name.to_string(), job);
            // Stays pending until harvested.
        } else {
            // Failure is terminal: every descendant sees a nonzero parent
            // code in turn, so poisoning needs no explicit recursion.
            if !self.opts.quiet {
                eprintln!("Cancelled {name}");
            }
            report.results.insert(
                name.to_string(),
                SessionResult {
                    current: false,
                    heap: ABSENT_HEAP.to_string(),
                    code: 1,
                },
            );
            pending.remove(name);
        }
        Ok(())
    }

    /// Spawns the external build command for one session.
    ///
    /// The argument file carries the session name, the parent heap path,
    /// the output heap path (empty when no heap is persisted), the
    /// session's options, and its resolved sources.
    fn start_job(
        &self,
        name: &str,
        session: &Session,
        node: &SourceNode,
        persist: bool,
    ) -> Result<Job, SchedError> {
        let mut tokens = self.opts.program.split_whitespace();
        let program = tokens.next().unwrap_or("strata-run");
        let args: Vec<String> = tokens.map(str::to_string).collect();

        let parent_heap = session
            .parent
            .as_deref()
            .and_then(|p| self.store.find_heap(p))
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        let output_heap = if persist {
            self.store.heap_path(name).display().to_string()
        } else {
            String::new()
        };

        let mut lines = vec![
            format!("session={name}"),
            format!("parent_heap={parent_heap}"),
            format!("output_heap={output_heap}"),
        ];
        for (key, value) in &session.options {
            lines.push(format!("option:{key}={value}"));
        }
        for path in node.paths() {
            lines.push(format!("source:{}", path.display()));
        }

        let env = [("STRATA_SESSION".to_string(), name.to_string())];
        Ok(Job::start(name, program, &args, &env, &lines)?)
    }

    /// The parent's prior result, or the synthetic root result.
    fn parent_result(&self, session: &Session, report: &ScheduleReport) -> SessionResult {
        session
            .parent
            .as_deref()
            .and_then(|p| report.results.get(p).cloned())
            .unwrap_or_else(SessionResult::root)
    }

    /// Resolves the session's sources through the per-run cache, handing
    /// the resolver the parent's already-resolved paths.
    fn resolve(
        &self,
        session: &Session,
        cache: &mut SourceCache<'_>,
    ) -> Result<SourceNode, SchedError> {
        let parent_sources = session
            .parent
            .as_deref()
            .and_then(|p| cache.paths_of(p))
            .unwrap_or_default();
        cache.get(session, &parent_sources)
    }

    /// The sources stamp: entry digest plus every resolved source digest.
    fn sources_stamp_of(&self, session: &Session, node: &SourceNode) -> String {
        let mut digests = vec![session.entry_digest];
        digests.extend(node.digests());
        sources_stamp(&digests)
    }

    /// Whether the session's heap must be physically persisted: either an
    /// explicit request, or something else depends on its output.
    fn persists_heap(&self, session: &Session) -> bool {
        self.opts.build_heap || session.build_heap || !self.graph.is_leaf(&session.name)
    }
}

/// Name of the first finished running job, polled in name order.
fn first_finished(running: &mut BTreeMap<String, Job>) -> Result<Option<String>, SchedError> {
    for (name, job) in running.iter_mut() {
        if job.is_finished()? {
            return Ok(Some(name.clone()));
        }
    }
    Ok(None)
}

/// The last `n` lines of `text`.
fn tail_lines(text: &str, n: usize) -> Vec<&str> {
    let lines: Vec<&str> = text.lines().collect();
    let start = lines.len().saturating_sub(n);
    lines[start..].to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options() {
        let opts = BuildOptions::default();
        assert_eq!(opts.jobs, 1);
        assert!(!opts.no_build);
        assert!(!opts.clean_build);
        assert!(!opts.quiet);
    }

    #[test]
    fn tail_lines_short_text() {
        assert_eq!(tail_lines("a\nb", 20), vec!["a", "b"]);
    }

    #[test]
    fn tail_lines_truncates() {
        let text = (0..30).map(|i| i.to_string()).collect::<Vec<_>>().join("\n");
        let tail = tail_lines(&text, 20);
        assert_eq!(tail.len(), 20);
        assert_eq!(tail[0], "10");
        assert_eq!(tail[19], "29");
    }

    #[test]
    fn tail_lines_empty() {
        assert!(tail_lines("", 20).is_empty());
    }
}
