//! `strata build` — schedule and run a selection of sessions.

use std::path::PathBuf;

use strata_graph::SessionGraph;
use strata_sched::{BuildOptions, FileResolver, Scheduler};
use strata_store::HeapStore;

use crate::{BuildArgs, GlobalArgs};

/// Runs the `strata build` command.
///
/// Loads declarations, constructs the session graph, and drives the
/// scheduler. The exit code is the maximum per-session result code.
pub fn run(args: &BuildArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    if args.names.is_empty() && args.groups.is_empty() && !args.all {
        return Err("nothing selected; name sessions, use --groups, or pass --all".into());
    }

    let graph = load_graph(&args.dirs)?;
    let mut include: Vec<PathBuf> = args.include.iter().map(PathBuf::from).collect();
    if args.system {
        include.push(system_store_dir());
    }
    let store = HeapStore::new(&args.output, include);

    let opts = BuildOptions {
        jobs: args.jobs.max(1),
        no_build: args.no_build,
        clean_build: args.clean,
        build_heap: args.build_heap,
        verbose: global.verbose,
        quiet: global.quiet,
        program: args.program.clone(),
        ..BuildOptions::default()
    };

    let resolver = FileResolver;
    let scheduler = Scheduler::new(&graph, &store, &resolver, opts);
    let report = scheduler.run(args.all, &args.groups, &args.names)?;

    if !global.quiet && report.exit_code() == 0 {
        eprintln!("   Build complete ({} session(s)).", report.results.len());
    }
    Ok(report.exit_code())
}

/// Loads declarations from the working directory plus any extra
/// declaration directories and assembles the session graph.
pub fn load_graph(extra_dirs: &[String]) -> Result<SessionGraph, Box<dyn std::error::Error>> {
    let mut dirs = vec![PathBuf::from(".")];
    dirs.extend(extra_dirs.iter().map(PathBuf::from));
    let decls = strata_config::load_declarations(&dirs)?;
    if decls.is_empty() {
        return Err("no session declarations found; expected a strata.toml".into());
    }
    Ok(SessionGraph::from_decls(&decls)?)
}

/// The shared system heap store searched with `--system`: overridable via
/// `STRATA_SYSTEM_HEAPS`, defaulting to the conventional install path.
fn system_store_dir() -> PathBuf {
    std::env::var_os("STRATA_SYSTEM_HEAPS")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("/usr/local/share/strata"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn load_graph_from_extra_dir() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(
            tmp.path().join("strata.toml"),
            "[[session]]\nname = \"base\"\n",
        )
        .unwrap();

        let graph = load_graph(&[tmp.path().display().to_string()]).unwrap();
        assert!(graph.contains("base"));
    }

    #[test]
    fn empty_selection_is_rejected() {
        let args = crate::BuildArgs {
            names: vec![],
            all: false,
            groups: vec![],
            jobs: 1,
            no_build: false,
            clean: false,
            build_heap: false,
            dirs: vec![],
            include: vec![],
            system: false,
            output: "strata-out".to_string(),
            program: "strata-run".to_string(),
        };
        let global = crate::GlobalArgs {
            quiet: true,
            verbose: false,
        };
        let err = run(&args, &global).unwrap_err();
        assert!(err.to_string().contains("nothing selected"));
    }
}
