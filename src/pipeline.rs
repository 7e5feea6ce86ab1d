//! Sequential phase orchestrator with timing. Grounded on `pipeline.py`.

use std::collections::BTreeMap;
use std::time::Instant;

use crate::config::{AnalysisConfig, AnalysisResult};
use crate::graph::KnowledgeGraph;
use crate::graph::namespace_index::NamespaceIndex;
use crate::graph::symbol_table::SymbolTable;
use crate::output::build_result;
use crate::phases::{calls, communities, imports, parsing, processes, structure};

/// Human-readable label for each phase, surfaced to an optional progress callback.
fn phase_label(name: &str) -> &'static str {
    match name {
        "structure" => "Mapping file tree",
        "parsing" => "Parsing source files",
        "imports" => "Resolving imports",
        "calls" => "Building call graph",
        "communities" => "Detecting communities",
        "processes" => "Tracing execution flows",
        _ => "Running",
    }
}

/// Execute the six-phase analysis pipeline and return the assembled result.
///
/// `progress` is invoked with `(phase_name, label)` just before each phase starts,
/// letting the CLI drive a progress indicator.
pub fn run_pipeline(config: &AnalysisConfig, mut progress: Option<&mut dyn FnMut(&str, &str)>) -> AnalysisResult {
    let mut kg = KnowledgeGraph::new();
    let mut st = SymbolTable::new();
    let mut ns_index = NamespaceIndex::new();
    let mut timings: BTreeMap<String, f64> = BTreeMap::new();
    let total_start = Instant::now();

    macro_rules! run_phase {
        ($name:literal, $body:expr) => {{
            if let Some(cb) = progress.as_deref_mut() {
                cb($name, phase_label($name));
            }
            let start = Instant::now();
            $body;
            timings.insert($name.to_string(), start.elapsed().as_secs_f64());
        }};
    }

    run_phase!("structure", structure::run(config, &mut kg));
    run_phase!("parsing", parsing::run(config, &mut kg, &mut st, Some(&mut ns_index)));
    run_phase!("imports", imports::run(config, &mut kg, &st, Some(&mut ns_index)));
    run_phase!("calls", calls::run(config, &mut kg, &st));
    run_phase!("communities", communities::run(config, &mut kg));
    run_phase!("processes", processes::run(config, &mut kg));

    let total_ms = total_start.elapsed().as_secs_f64() * 1000.0;
    build_result(config, &kg, &timings, total_ms)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn pipeline_runs_all_phases_on_a_small_repo() {
        let tmp = tempfile::TempDir::new().unwrap();
        let file_path = tmp.path().join("main.py");
        let mut f = std::fs::File::create(&file_path).unwrap();
        writeln!(f, "def main():\n    helper()\n\ndef helper():\n    pass\n").unwrap();

        let mut config = AnalysisConfig::default();
        config.repo_path = tmp.path().to_path_buf();

        let mut phase_names = Vec::new();
        let mut cb = |name: &str, _label: &str| phase_names.push(name.to_string());
        let result = run_pipeline(&config, Some(&mut cb));

        assert_eq!(phase_names.len(), 6);
        assert!(result.stats.files >= 1);
        assert_eq!(result.metadata.phase_timings.len(), 6);
    }

    #[test]
    fn pipeline_works_without_a_progress_callback() {
        let tmp = tempfile::TempDir::new().unwrap();
        let mut config = AnalysisConfig::default();
        config.repo_path = tmp.path().to_path_buf();
        let result = run_pipeline(&config, None);
        assert_eq!(result.stats.files, 0);
    }
}
