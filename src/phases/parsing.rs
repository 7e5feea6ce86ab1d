//! Phase 2: tree-sitter parse to symbol extraction. Parsing itself runs in
//! parallel across files (`rayon`, thread-local parsers); ID assignment and graph
//! mutation stay sequential so the `sym_NNNN` counter is a single deterministic
//! sequence. Grounded on `phases/parsing.py`.

use std::path::Path;

use rayon::prelude::*;

use crate::config::{AnalysisConfig, SymbolKind};
use crate::graph::KnowledgeGraph;
use crate::graph::namespace_index::NamespaceIndex;
use crate::graph::symbol_table::SymbolTable;
use crate::languages::{analyser_for_extension, parse_with_thread_local};

struct FileExtraction {
    file_path: String,
    language: String,
    symbols: Vec<crate::config::DraftSymbol>,
}

/// Parse every eligible file and populate the knowledge graph's symbols and the
/// symbol table, optionally registering namespace declarations.
pub fn run(config: &AnalysisConfig, kg: &mut KnowledgeGraph, st: &mut SymbolTable, ns_index: Option<&mut NamespaceIndex>) {
    let candidates: Vec<(String, String)> = kg
        .files()
        .into_iter()
        .filter_map(|f| f.language.map(|lang| (f.path, lang)))
        .filter(|(_, language)| {
            config.languages.as_ref().map_or(true, |allowed| allowed.iter().any(|l| l == language))
        })
        .collect();

    let extractions: Vec<FileExtraction> = candidates
        .par_iter()
        .filter_map(|(file_path, language)| {
            let ext = Path::new(file_path).extension().and_then(|e| e.to_str())?.to_lowercase();
            let analyser = analyser_for_extension(&ext)?;
            let full_path = config.repo_path.join(file_path);
            let source = std::fs::read(&full_path).ok()?;
            let tree = parse_with_thread_local(&ext, &source)?;
            let symbols = analyser.extract_symbols(&tree, &source, file_path);
            Some(FileExtraction { file_path: file_path.clone(), language: language.clone(), symbols })
        })
        .collect();

    let mut counter: u32 = 0;
    let mut ns_index = ns_index;
    for extraction in extractions {
        for draft in extraction.symbols {
            counter += 1;
            let stable_id = format!("sym_{:04}", counter);
            let is_namespace = draft.kind == SymbolKind::Namespace;
            let name = draft.name.clone();
            let symbol = draft.finalise(stable_id, Some(extraction.language.clone()));
            st.add(&symbol);
            if is_namespace {
                if let Some(ns_index) = ns_index.as_deref_mut() {
                    ns_index.register(&name, &extraction.file_path);
                }
            }
            kg.add_symbol(symbol);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FileNode;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn assigns_sequential_stable_ids_across_files() {
        let tmp = TempDir::new().unwrap();
        for (name, contents) in [("a.py", "def foo():\n    pass\n"), ("b.py", "def bar():\n    pass\n")] {
            let path = tmp.path().join(name);
            let mut file = std::fs::File::create(&path).unwrap();
            file.write_all(contents.as_bytes()).unwrap();
        }

        let mut config = AnalysisConfig::default();
        config.repo_path = tmp.path().to_path_buf();
        let mut kg = KnowledgeGraph::new();
        kg.add_file(FileNode { path: "a.py".into(), language: Some("py".into()), size: 1, lines: 2 });
        kg.add_file(FileNode { path: "b.py".into(), language: Some("py".into()), size: 1, lines: 2 });

        let mut st = SymbolTable::new();
        run(&config, &mut kg, &mut st, None);

        let mut ids: Vec<String> = kg.symbols().into_iter().map(|s| s.id).collect();
        ids.sort();
        assert_eq!(ids, vec!["sym_0001".to_string(), "sym_0002".to_string()]);
    }
}
