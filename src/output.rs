//! Assembly and JSON serialisation of the final [`AnalysisResult`]. Grounded on
//! `output.py`.

use std::collections::BTreeMap;
use std::path::Path;
use std::process::Command;
use std::sync::mpsc;
use std::time::Duration;

use chrono::Utc;

use crate::config::{
    AnalysisConfig, AnalysisMetadata, AnalysisResult, AnalysisStats, ImportsSection, StructureSection,
};
use crate::graph::KnowledgeGraph;

const MYCELIUM_VERSION: &str = env!("CARGO_PKG_VERSION");
const GIT_TIMEOUT: Duration = Duration::from_secs(5);

/// Try to get the current git commit hash (first 12 characters), with a 5-second
/// timeout. Absence (non-repo, git unavailable, or timeout) is not an error.
fn commit_hash(repo_path: &Path) -> Option<String> {
    let (tx, rx) = mpsc::channel();
    let repo_path = repo_path.to_path_buf();
    std::thread::spawn(move || {
        let output = Command::new("git").arg("rev-parse").arg("HEAD").current_dir(&repo_path).output();
        let _ = tx.send(output);
    });

    match rx.recv_timeout(GIT_TIMEOUT) {
        Ok(Ok(output)) if output.status.success() => {
            let hash = String::from_utf8_lossy(&output.stdout).trim().to_string();
            Some(hash.chars().take(12).collect())
        }
        _ => None,
    }
}

fn count_languages(kg: &KnowledgeGraph) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for file in kg.files() {
        if let Some(lang) = file.language {
            *counts.entry(lang).or_insert(0) += 1;
        }
    }
    counts
}

/// Build the complete [`AnalysisResult`] from the populated knowledge graph.
pub fn build_result(
    config: &AnalysisConfig,
    kg: &KnowledgeGraph,
    timings: &BTreeMap<String, f64>,
    total_ms: f64,
) -> AnalysisResult {
    let repo_path = config.repo_path.canonicalize().unwrap_or_else(|_| config.repo_path.clone());
    let repo_name = repo_path.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default();

    let calls = kg.all_call_edges();
    let import_edges = kg.all_import_edges();
    let communities = kg.communities();
    let processes = kg.processes();

    AnalysisResult {
        version: "1.0".to_string(),
        metadata: AnalysisMetadata {
            repo_name,
            repo_path: repo_path.to_string_lossy().to_string(),
            analysed_at: Utc::now().to_rfc3339(),
            mycelium_version: MYCELIUM_VERSION.to_string(),
            commit_hash: commit_hash(&repo_path),
            analysis_duration_ms: (total_ms * 10.0).round() / 10.0,
            phase_timings: timings.clone(),
        },
        stats: AnalysisStats {
            files: kg.file_count(),
            folders: kg.folder_count(),
            symbols: kg.symbol_count(),
            calls: calls.len(),
            imports: import_edges.len(),
            communities: communities.len(),
            processes: processes.len(),
            languages: count_languages(kg),
        },
        structure: StructureSection { files: kg.files(), folders: kg.folders() },
        symbols: kg.symbols(),
        imports: ImportsSection {
            file_imports: import_edges,
            project_references: kg.project_references(),
            package_references: kg.package_references(),
        },
        calls,
        communities,
        processes,
    }
}

/// Write the analysis result to a JSON file, creating parent directories as needed.
pub fn write_output(result: &AnalysisResult, output_path: &Path) -> std::io::Result<()> {
    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let json = serde_json::to_string_pretty(result)?;
    std::fs::write(output_path, json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FileNode;

    #[test]
    fn build_result_counts_files_and_languages() {
        let mut kg = KnowledgeGraph::new();
        kg.add_file(FileNode { path: "a.py".into(), language: Some("py".into()), size: 10, lines: 1 });
        kg.add_file(FileNode { path: "b.py".into(), language: Some("py".into()), size: 10, lines: 1 });
        kg.add_file(FileNode { path: "c.rs".into(), language: Some("rust".into()), size: 10, lines: 1 });

        let config = AnalysisConfig::default();
        let timings = BTreeMap::new();
        let result = build_result(&config, &kg, &timings, 12.5);

        assert_eq!(result.stats.files, 3);
        assert_eq!(result.stats.languages.get("py"), Some(&2));
        assert_eq!(result.stats.languages.get("rust"), Some(&1));
        assert_eq!(result.version, "1.0");
    }

    #[test]
    fn write_output_creates_parent_directories() {
        let tmp = tempfile::TempDir::new().unwrap();
        let nested_path = tmp.path().join("nested/dir/out.json");

        let kg = KnowledgeGraph::new();
        let config = AnalysisConfig::default();
        let result = build_result(&config, &kg, &BTreeMap::new(), 0.0);

        write_output(&result, &nested_path).unwrap();
        assert!(nested_path.exists());
    }
}
