mod cli;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use cli::{Cli, Commands};
use mycelium::config::AnalysisConfig;
use mycelium::diag;
use mycelium::output::write_output;
use mycelium::pipeline::run_pipeline;

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze { path, output, languages, resolution, max_processes, max_depth, exclude, verbose, quiet } => {
            let repo_path = path.canonicalize().with_context(|| format!("cannot access repository path {}", path.display()))?;

            let config = AnalysisConfig {
                repo_path: repo_path.clone(),
                output_path: output.clone(),
                languages: if languages.is_empty() { None } else { Some(languages) },
                resolution,
                max_processes,
                max_depth,
                exclude_patterns: exclude,
                verbose,
                quiet,
                ..AnalysisConfig::default()
            };

            diag::note(quiet, &format!("Analyzing {}...", repo_path.display()));

            let mut cb = |_name: &str, label: &str| diag::note(quiet, label);
            let result = run_pipeline(&config, Some(&mut cb));

            let output_path = output.unwrap_or_else(|| default_output_path(&result.metadata.repo_name));
            write_output(&result, &output_path).with_context(|| format!("failed to write {}", output_path.display()))?;

            diag::note(
                quiet,
                &format!(
                    "Wrote {} ({} files, {} symbols, {} calls, {} processes) in {:.1}ms",
                    output_path.display(),
                    result.stats.files,
                    result.stats.symbols,
                    result.stats.calls,
                    result.stats.processes,
                    result.metadata.analysis_duration_ms,
                ),
            );

            Ok(())
        }
    }
}

fn default_output_path(repo_name: &str) -> PathBuf {
    PathBuf::from(format!("{repo_name}.mycelium.json"))
}
