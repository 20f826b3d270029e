//! Strata CLI — the command-line interface for the Strata session builder.
//!
//! Provides `strata build` for scheduling incremental session builds and
//! `strata list` for printing the session graph in build order.

#![warn(missing_docs)]

mod build;
mod list;

use std::process;

use clap::{Parser, Subcommand};

/// Strata — an incremental, dependency-ordered session builder.
#[derive(Parser, Debug)]
#[command(name = "strata", version, about = "Strata session builder")]
pub struct Cli {
    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose progress output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build sessions and everything they require.
    Build(BuildArgs),
    /// List all declared sessions in build order.
    List(ListArgs),
}

/// Arguments for the `strata build` subcommand.
#[derive(Parser, Debug)]
pub struct BuildArgs {
    /// Session names to build.
    pub names: Vec<String>,

    /// Build every declared session.
    #[arg(short = 'a', long)]
    pub all: bool,

    /// Also build every session carrying one of these group tags.
    #[arg(short = 'g', long = "groups", num_args = 1..)]
    pub groups: Vec<String>,

    /// Maximum number of concurrently running build jobs.
    #[arg(short = 'j', long, default_value_t = 1)]
    pub jobs: usize,

    /// Check staleness only; report stale sessions without building.
    #[arg(short = 'n', long)]
    pub no_build: bool,

    /// Discard prior results for the selection before building.
    #[arg(short = 'c', long)]
    pub clean: bool,

    /// Persist the output heap even for sessions nothing depends on.
    #[arg(short = 'b', long)]
    pub build_heap: bool,

    /// Extra directories to scan for session declarations.
    #[arg(short = 'd', long = "dirs", num_args = 1..)]
    pub dirs: Vec<String>,

    /// Extra directories searched for pre-built heaps.
    #[arg(short = 'i', long = "include", num_args = 1..)]
    pub include: Vec<String>,

    /// Also search the shared system heap store.
    #[arg(short = 's', long)]
    pub system: bool,

    /// Directory new heaps and build records are written to.
    #[arg(short = 'o', long, default_value = "strata-out")]
    pub output: String,

    /// External build command invoked per session.
    #[arg(long, default_value = "strata-run")]
    pub program: String,
}

/// Arguments for the `strata list` subcommand.
#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Extra directories to scan for session declarations.
    #[arg(short = 'd', long = "dirs", num_args = 1..)]
    pub dirs: Vec<String>,
}

/// Global settings derived from CLI flags.
pub struct GlobalArgs {
    /// Whether to suppress non-error output.
    pub quiet: bool,
    /// Whether to print verbose progress information.
    pub verbose: bool,
}

fn main() {
    let cli = Cli::parse();

    let global = GlobalArgs {
        quiet: cli.quiet,
        verbose: cli.verbose,
    };

    let result = match cli.command {
        Command::Build(ref args) => build::run(args, &global),
        Command::List(ref args) => list::run(args, &global),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}
