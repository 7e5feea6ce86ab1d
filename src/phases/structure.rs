//! Phase 1: file tree construction. Walks the repository and populates file/folder
//! nodes in the knowledge graph. Grounded on `phases/structure.py`.

use std::fs;
use std::path::Path;

use crate::config::{AnalysisConfig, FileNode, FolderNode};
use crate::graph::KnowledgeGraph;
use crate::languages::analyser_for_extension;

const DEFAULT_IGNORE: &[&str] = &[
    ".git", "bin", "obj", "node_modules", "packages", ".vs", ".idea", "TestResults",
    "__pycache__", ".mypy_cache", ".pytest_cache", ".tox", "dist", "build", ".eggs",
    "target", ".venv", "venv", ".env",
];

fn should_ignore(name: &str, exclude_patterns: &[String]) -> bool {
    if name.starts_with('.') {
        return true;
    }
    DEFAULT_IGNORE.contains(&name) || exclude_patterns.iter().any(|p| p == name)
}

/// Map a file extension (without the leading dot) to a language tag, if a
/// registered analyser claims it — independent of whether the grammar itself is
/// available (VB.NET files are still tagged `"vb"` even though no symbols are
/// ever extracted from them).
fn language_for_extension(ext: &str) -> Option<&'static str> {
    match ext {
        "cs" => Some("cs"),
        "vb" => Some("vb"),
        "ts" | "tsx" | "js" | "jsx" | "mjs" | "cjs" => Some("ts"),
        "py" | "pyi" => Some("py"),
        "java" => Some("java"),
        "go" => Some("go"),
        "rs" => Some("rust"),
        "c" | "h" => Some("c"),
        "cc" | "cpp" | "cxx" | "hpp" | "hh" | "hxx" => Some("cpp"),
        _ => None,
    }
}

/// Walk the repository directory tree and build file/folder nodes. Directories are
/// visited in sorted order so the resulting graph is built deterministically.
pub fn run(config: &AnalysisConfig, kg: &mut KnowledgeGraph) {
    let root = &config.repo_path;
    if !root.is_dir() {
        return;
    }
    walk_dir(root, root, config, kg);
}

fn walk_dir(root: &Path, dir: &Path, config: &AnalysisConfig, kg: &mut KnowledgeGraph) {
    let Ok(entries) = fs::read_dir(dir) else { return };
    let mut subdirs = Vec::new();
    let mut files = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        let name = entry.file_name().to_string_lossy().to_string();
        if path.is_dir() {
            subdirs.push((name, path));
        } else {
            files.push((name, path));
        }
    }
    subdirs.sort_by(|a, b| a.0.cmp(&b.0));
    files.sort_by(|a, b| a.0.cmp(&b.0));

    let rel_dir = dir.strip_prefix(root).unwrap_or(dir);
    let rel_dir_str = if rel_dir.as_os_str().is_empty() {
        String::new()
    } else {
        rel_dir.to_string_lossy().replace('\\', "/")
    };
    let folder_path = if rel_dir_str.is_empty() { String::new() } else { format!("{}/", rel_dir_str) };
    let file_count = files.iter().filter(|(name, _)| !name.starts_with('.')).count();
    kg.add_folder(FolderNode { path: folder_path, file_count });

    for (filename, full_path) in &files {
        if filename.starts_with('.') {
            continue;
        }
        let rel_path = if rel_dir_str.is_empty() {
            filename.clone()
        } else {
            format!("{}/{}", rel_dir_str, filename)
        };

        let ext = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();
        let language = language_for_extension(&ext).map(|s| s.to_string());

        let size = fs::metadata(full_path).map(|m| m.len()).unwrap_or(0);
        if size > config.max_file_size {
            continue;
        }

        let lines = if language.is_some() {
            fs::read(full_path)
                .map(|bytes| {
                    let newlines = bytes.iter().filter(|&&b| b == b'\n').count();
                    if bytes.is_empty() || bytes.last() == Some(&b'\n') { newlines } else { newlines + 1 }
                })
                .unwrap_or(0)
        } else {
            0
        };

        kg.add_file(FileNode { path: rel_path, language, size, lines });
    }

    for (name, subdir) in &subdirs {
        if should_ignore(name, &config.exclude_patterns) {
            continue;
        }
        walk_dir(root, subdir, config, kg);
    }
}

/// Whether a registered analyser exists for `ext` (without the leading dot) and has
/// a working grammar — used by the parsing phase to decide whether to attempt a
/// parse at all.
pub fn has_available_analyser(ext: &str) -> bool {
    analyser_for_extension(ext).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_file(dir: &Path, rel: &str, contents: &str) {
        let path = dir.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        let mut file = fs::File::create(path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
    }

    #[test]
    fn walks_tree_and_ignores_defaults() {
        let tmp = TempDir::new().unwrap();
        write_file(tmp.path(), "src/main.py", "def main():\n    pass\n");
        write_file(tmp.path(), "node_modules/x.js", "ignored");
        write_file(tmp.path(), ".git/HEAD", "ignored");

        let mut config = AnalysisConfig::default();
        config.repo_path = tmp.path().to_path_buf();
        let mut kg = KnowledgeGraph::new();
        run(&config, &mut kg);

        let files = kg.files();
        assert!(files.iter().any(|f| f.path == "src/main.py"));
        assert!(!files.iter().any(|f| f.path.contains("node_modules")));
        assert!(!files.iter().any(|f| f.path.contains(".git")));
    }

    #[test]
    fn skips_files_over_max_size() {
        let tmp = TempDir::new().unwrap();
        write_file(tmp.path(), "big.py", &"x".repeat(100));

        let mut config = AnalysisConfig::default();
        config.repo_path = tmp.path().to_path_buf();
        config.max_file_size = 10;
        let mut kg = KnowledgeGraph::new();
        run(&config, &mut kg);

        assert!(kg.files().is_empty());
    }
}
