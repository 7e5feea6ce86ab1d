//! Phase 4: call graph construction with three-tier confidence scoring.
//! Grounded on `phases/calls.py`.

use std::collections::HashMap;
use std::path::Path;

use crate::config::{AnalysisConfig, CallEdge, RawCall, SymbolKind};
use crate::graph::KnowledgeGraph;
use crate::graph::symbol_table::SymbolTable;
use crate::languages::{analyser_for_extension, parse_with_thread_local};

/// Build the call graph with three-tier confidence scoring.
pub fn run(config: &AnalysisConfig, kg: &mut KnowledgeGraph, st: &SymbolTable) {
    let repo_root = &config.repo_path;
    let import_map = build_import_map(kg);
    let mut field_type_maps: HashMap<String, HashMap<String, String>> = HashMap::new();

    let files = kg.files();
    let mut edges = Vec::new();

    for file in &files {
        let Some(language) = file.language.as_deref() else { continue };
        let file_path = &file.path;
        let ext = Path::new(file_path).extension().and_then(|e| e.to_str()).unwrap_or("").to_lowercase();

        if let Some(allowed) = config.languages.as_ref() {
            if !allowed.iter().any(|l| l == language) {
                continue;
            }
        }

        let Some(analyser) = analyser_for_extension(&ext) else { continue };

        let full_path = repo_root.join(file_path);
        let Ok(source) = std::fs::read(&full_path) else { continue };
        let Some(tree) = parse_with_thread_local(&ext, &source) else { continue };
        let raw_calls = analyser.extract_calls(&tree, &source, file_path);

        let field_type_map = field_type_maps
            .entry(file_path.clone())
            .or_insert_with(|| build_field_type_map(file_path, kg))
            .clone();

        for raw_call in &raw_calls {
            if let Some(edge) = resolve_call(raw_call, file_path, st, &import_map, kg, &field_type_map) {
                edges.push(edge);
            }
        }
    }

    for edge in edges {
        kg.add_call(edge);
    }
}

fn build_import_map(kg: &KnowledgeGraph) -> HashMap<String, Vec<String>> {
    let mut import_map: HashMap<String, Vec<String>> = HashMap::new();
    for edge in kg.all_import_edges() {
        import_map.entry(edge.from).or_default().push(edge.to);
    }
    import_map
}

/// Field/parameter name -> type name, built from constructor `parameter_types`, for
/// dependency-injection call resolution. Both `paramName` and `_paramName` (the
/// conventional backing-field name) map to the same type.
fn build_field_type_map(file_path: &str, kg: &KnowledgeGraph) -> HashMap<String, String> {
    let mut field_map = HashMap::new();
    for sym in kg.symbols_in_file(file_path) {
        if let Some(param_types) = &sym.parameter_types {
            for (param_name, type_name) in param_types {
                field_map.insert(param_name.clone(), type_name.clone());
                field_map.insert(format!("_{param_name}"), type_name.clone());
            }
        }
    }
    field_map
}

fn is_interface_method(target_id: &str, kg: &KnowledgeGraph) -> bool {
    let Some(target) = kg.symbol(target_id) else { return false };
    let Some(parent_name) = &target.parent else { return false };
    kg.symbols().iter().any(|s| &s.name == parent_name && s.kind == SymbolKind::Interface)
}

fn is_interface_self_call(caller_name: &str, callee_name: &str, target_id: &str, kg: &KnowledgeGraph) -> bool {
    if caller_name != callee_name {
        return false;
    }
    is_interface_method(target_id, kg)
}

/// Find a concrete implementation of an interface method: a same-named method in a
/// file imported by `file_path` (or, failing that, anywhere in the codebase) that
/// isn't itself another interface's method.
fn find_implementation(
    callee_name: &str,
    interface_target_id: &str,
    st: &SymbolTable,
    import_map: &HashMap<String, Vec<String>>,
    file_path: &str,
    kg: &KnowledgeGraph,
) -> Option<String> {
    let interface_file = kg.symbol(interface_target_id).map(|s| s.file).unwrap_or_default();
    let imported_files = import_map.get(file_path).cloned().unwrap_or_default();

    for imported_file in &imported_files {
        if imported_file == &interface_file {
            continue;
        }
        if let Some(target_id) = st.lookup_exact(imported_file, callee_name) {
            if target_id != interface_target_id && !is_interface_method(&target_id, kg) {
                return Some(target_id);
            }
        }
    }

    for candidate in st.lookup_fuzzy(callee_name) {
        if candidate.symbol_id != interface_target_id
            && candidate.file != interface_file
            && !is_interface_method(&candidate.symbol_id, kg)
        {
            return Some(candidate.symbol_id);
        }
    }

    None
}

fn resolve_call(
    raw_call: &RawCall,
    file_path: &str,
    st: &SymbolTable,
    import_map: &HashMap<String, Vec<String>>,
    kg: &KnowledgeGraph,
    field_type_map: &HashMap<String, String>,
) -> Option<CallEdge> {
    let callee_name = &raw_call.callee_name;
    let caller_name = &raw_call.caller_name;

    let caller_id = match st.lookup_exact(file_path, caller_name) {
        Some(id) => id,
        None => st
            .lookup_fuzzy(caller_name)
            .into_iter()
            .find(|m| m.file == file_path)
            .map(|m| m.symbol_id)?,
    };

    // --- Tier A: import-resolved ---
    if let Some(imported_files) = import_map.get(file_path) {
        for imported_file in imported_files {
            if let Some(target_id) = st.lookup_exact(imported_file, callee_name) {
                if target_id == caller_id {
                    continue;
                }
                if is_interface_self_call(caller_name, callee_name, &target_id, kg) {
                    continue;
                }
                if is_interface_method(&target_id, kg) {
                    if let Some(impl_id) = find_implementation(callee_name, &target_id, st, import_map, file_path, kg) {
                        return Some(CallEdge {
                            from: caller_id,
                            to: impl_id,
                            confidence: 0.85,
                            tier: "A".to_string(),
                            reason: "impl-resolved".to_string(),
                            line: raw_call.line,
                        });
                    }
                }
                return Some(CallEdge {
                    from: caller_id,
                    to: target_id,
                    confidence: 0.9,
                    tier: "A".to_string(),
                    reason: "import-resolved".to_string(),
                    line: raw_call.line,
                });
            }
        }
    }

    // --- Tier A-DI: DI-resolved (qualifier is a field/parameter name) ---
    if let Some(qualifier) = &raw_call.qualifier {
        if let Some(type_name) = field_type_map.get(qualifier) {
            if let Some(imported_files) = import_map.get(file_path) {
                for imported_file in imported_files {
                    if st.lookup_exact(imported_file, type_name).is_none() {
                        continue;
                    }
                    if let Some(target_id) = st.lookup_exact(imported_file, callee_name) {
                        if target_id == caller_id {
                            continue;
                        }
                        if is_interface_self_call(caller_name, callee_name, &target_id, kg) {
                            continue;
                        }
                        if is_interface_method(&target_id, kg) {
                            if let Some(impl_id) = find_implementation(callee_name, &target_id, st, import_map, file_path, kg) {
                                return Some(CallEdge {
                                    from: caller_id,
                                    to: impl_id,
                                    confidence: 0.85,
                                    tier: "A".to_string(),
                                    reason: "di-impl-resolved".to_string(),
                                    line: raw_call.line,
                                });
                            }
                        }
                        return Some(CallEdge {
                            from: caller_id,
                            to: target_id,
                            confidence: 0.9,
                            tier: "A".to_string(),
                            reason: "di-resolved".to_string(),
                            line: raw_call.line,
                        });
                    }
                }
            }
        }
    }

    // --- Tier B: same-file ---
    if let Some(target_id) = st.lookup_exact(file_path, callee_name) {
        if target_id != caller_id {
            return Some(CallEdge {
                from: caller_id,
                to: target_id,
                confidence: 0.85,
                tier: "B".to_string(),
                reason: "same-file".to_string(),
                line: raw_call.line,
            });
        }
    }

    // --- Tier C: fuzzy global ---
    let fuzzy_matches: Vec<_> = st.lookup_fuzzy(callee_name).into_iter().filter(|m| m.file != file_path).collect();
    if !fuzzy_matches.is_empty() {
        let target_id = fuzzy_matches[0].symbol_id.clone();
        if is_interface_self_call(caller_name, callee_name, &target_id, kg) {
            return None;
        }
        let (confidence, reason) = if fuzzy_matches.len() == 1 {
            (0.5, "fuzzy-unique")
        } else {
            (0.3, "fuzzy-ambiguous")
        };
        return Some(CallEdge {
            from: caller_id,
            to: target_id,
            confidence,
            tier: "C".to_string(),
            reason: reason.to_string(),
            line: raw_call.line,
        });
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ImportEdge, Symbol, Visibility};

    fn symbol(id: &str, name: &str, file: &str, kind: SymbolKind, parent: Option<&str>) -> Symbol {
        Symbol {
            id: id.to_string(),
            name: name.to_string(),
            kind,
            file: file.to_string(),
            line: 1,
            visibility: Visibility::Public,
            exported: true,
            parent: parent.map(|p| p.to_string()),
            language: Some("py".to_string()),
            byte_range: None,
            parameter_types: None,
        }
    }

    #[test]
    fn tier_a_resolves_call_through_import() {
        let mut kg = KnowledgeGraph::new();
        let caller = symbol("sym_0001", "main", "a.py", SymbolKind::Function, None);
        let callee = symbol("sym_0002", "helper", "b.py", SymbolKind::Function, None);
        kg.add_symbol(caller);
        kg.add_symbol(callee);
        kg.add_import(ImportEdge { from: "a.py".into(), to: "b.py".into(), statement: "import b".into() });

        let mut st = SymbolTable::new();
        st.add(&symbol("sym_0001", "main", "a.py", SymbolKind::Function, None));
        st.add(&symbol("sym_0002", "helper", "b.py", SymbolKind::Function, None));

        let raw = RawCall { caller_file: "a.py".into(), caller_name: "main".into(), callee_name: "helper".into(), line: 3, qualifier: None };
        let import_map = build_import_map(&kg);
        let edge = resolve_call(&raw, "a.py", &st, &import_map, &kg, &HashMap::new()).unwrap();
        assert_eq!(edge.tier, "A");
        assert_eq!(edge.confidence, 0.9);
        assert_eq!(edge.to, "sym_0002");
    }

    #[test]
    fn tier_b_resolves_same_file_call() {
        let kg = KnowledgeGraph::new();
        let mut st = SymbolTable::new();
        st.add(&symbol("sym_0001", "main", "a.py", SymbolKind::Function, None));
        st.add(&symbol("sym_0002", "helper", "a.py", SymbolKind::Function, None));

        let raw = RawCall { caller_file: "a.py".into(), caller_name: "main".into(), callee_name: "helper".into(), line: 2, qualifier: None };
        let edge = resolve_call(&raw, "a.py", &st, &HashMap::new(), &kg, &HashMap::new()).unwrap();
        assert_eq!(edge.tier, "B");
        assert_eq!(edge.confidence, 0.85);
    }

    #[test]
    fn tier_c_ambiguous_fuzzy_match_gets_low_confidence() {
        let kg = KnowledgeGraph::new();
        let mut st = SymbolTable::new();
        st.add(&symbol("sym_0001", "main", "a.py", SymbolKind::Function, None));
        st.add(&symbol("sym_0002", "run", "b.py", SymbolKind::Function, None));
        st.add(&symbol("sym_0003", "run", "c.py", SymbolKind::Function, None));

        let raw = RawCall { caller_file: "a.py".into(), caller_name: "main".into(), callee_name: "run".into(), line: 5, qualifier: None };
        let edge = resolve_call(&raw, "a.py", &st, &HashMap::new(), &kg, &HashMap::new()).unwrap();
        assert_eq!(edge.tier, "C");
        assert_eq!(edge.confidence, 0.3);
    }

    #[test]
    fn no_match_returns_none() {
        let kg = KnowledgeGraph::new();
        let mut st = SymbolTable::new();
        st.add(&symbol("sym_0001", "main", "a.py", SymbolKind::Function, None));

        let raw = RawCall { caller_file: "a.py".into(), caller_name: "main".into(), callee_name: "print".into(), line: 1, qualifier: None };
        assert!(resolve_call(&raw, "a.py", &st, &HashMap::new(), &kg, &HashMap::new()).is_none());
    }

    #[test]
    fn interface_method_call_is_redirected_to_implementation() {
        let mut kg = KnowledgeGraph::new();
        kg.add_symbol(symbol("sym_iface", "IService", "iservice.py", SymbolKind::Interface, None));
        kg.add_symbol(symbol("sym_0001", "run", "iservice.py", SymbolKind::Method, Some("IService")));
        kg.add_symbol(symbol("sym_0002", "run", "service_impl.py", SymbolKind::Method, Some("ServiceImpl")));
        kg.add_symbol(symbol("sym_0003", "call_method", "caller.py", SymbolKind::Function, None));
        // The only import is to the interface's own file; the implementation is only
        // reachable via the fuzzy fallback inside find_implementation.
        kg.add_import(ImportEdge { from: "caller.py".into(), to: "iservice.py".into(), statement: "import iservice".into() });

        let mut st = SymbolTable::new();
        st.add(&symbol("sym_iface", "IService", "iservice.py", SymbolKind::Interface, None));
        st.add(&symbol("sym_0001", "run", "iservice.py", SymbolKind::Method, Some("IService")));
        st.add(&symbol("sym_0002", "run", "service_impl.py", SymbolKind::Method, Some("ServiceImpl")));
        st.add(&symbol("sym_0003", "call_method", "caller.py", SymbolKind::Function, None));

        let raw = RawCall { caller_file: "caller.py".into(), caller_name: "call_method".into(), callee_name: "run".into(), line: 4, qualifier: None };
        let import_map = build_import_map(&kg);
        let edge = resolve_call(&raw, "caller.py", &st, &import_map, &kg, &HashMap::new()).unwrap();
        assert_eq!(edge.to, "sym_0002");
        assert_eq!(edge.reason, "impl-resolved");
    }
}
