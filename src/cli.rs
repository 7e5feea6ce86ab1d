use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Static-analysis engine that maps a repository into a structured codebase graph.
///
/// Walks a repository, parses every supported source file, resolves imports and
/// call sites, detects communities, and traces probable execution flows, emitting
/// one JSON codebase map.
#[derive(Parser, Debug)]
#[command(name = "mycelium", version, about, long_about = None, propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Analyse a repository and emit its codebase map as JSON.
    Analyze {
        /// Path to the repository root to analyse.
        path: PathBuf,

        /// Output file path. Defaults to `<repo_name>.mycelium.json` in the current
        /// directory.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Restrict analysis to these languages (comma-separated tags: cs, vb, ts,
        /// py, java, go, rust, c, cpp).
        #[arg(short, long, value_delimiter = ',')]
        languages: Vec<String>,

        /// Louvain community-detection resolution.
        #[arg(long, default_value_t = 1.0)]
        resolution: f64,

        /// Maximum number of execution processes to report.
        #[arg(long, default_value_t = 75)]
        max_processes: usize,

        /// Maximum BFS depth when tracing execution flows.
        #[arg(long, default_value_t = 10)]
        max_depth: usize,

        /// Glob pattern to exclude from the walk; may be given multiple times.
        #[arg(long)]
        exclude: Vec<String>,

        /// Print per-file diagnostics as each phase runs.
        #[arg(short, long)]
        verbose: bool,

        /// Suppress all non-error output.
        #[arg(short, long)]
        quiet: bool,
    },
}
