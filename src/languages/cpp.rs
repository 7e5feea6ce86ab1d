//! C++ analyser: shares the C mixin's function/struct/enum/typedef/include/call
//! extraction, adding `class_specifier` and `namespace_definition` handling.
//! Grounded on `languages/c_cpp.py`'s `CppAnalyser`.

use tree_sitter::{Language, Node, Tree};

use crate::config::{DraftSymbol, ImportStatement, RawCall, SymbolKind, Visibility};

use super::c::{extract_includes, extract_symbols_from_node, find_call_expressions, get_type_name};
use super::node_text;
use super::LanguageAnalyser;

pub struct CppAnalyser;

const CPP_BUILTIN_EXCLUSIONS: &[&str] = &[
    "printf", "malloc", "free", "memcpy", "memset", "strlen", "strcmp", "sizeof", "assert",
    "exit", "abort", "std::cout", "std::cerr", "std::endl", "std::move", "std::forward",
    "std::make_shared", "std::make_unique", "std::make_pair", "std::sort", "std::find",
    "std::begin", "std::end", "std::string", "std::to_string",
];

impl LanguageAnalyser for CppAnalyser {
    fn language_name(&self) -> &'static str {
        "cpp"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["cpp", "cc", "cxx", "hpp", "hxx", "hh"]
    }

    fn ts_language(&self) -> Language {
        tree_sitter_cpp::LANGUAGE.into()
    }

    fn extract_symbols(&self, tree: &Tree, source: &[u8], file_path: &str) -> Vec<DraftSymbol> {
        let mut symbols = Vec::new();
        extract_cpp_symbols(tree.root_node(), source, file_path, &mut symbols, None);
        symbols
    }

    fn extract_imports(&self, tree: &Tree, source: &[u8], file_path: &str) -> Vec<ImportStatement> {
        extract_includes(tree, source, file_path)
    }

    fn extract_calls(&self, tree: &Tree, source: &[u8], file_path: &str) -> Vec<RawCall> {
        let mut calls = Vec::new();
        find_call_expressions(tree.root_node(), source, file_path, &mut calls, CPP_BUILTIN_EXCLUSIONS);
        calls
    }

    fn builtin_exclusions(&self) -> &'static [&'static str] {
        CPP_BUILTIN_EXCLUSIONS
    }
}

fn extract_cpp_symbols(
    node: Node,
    source: &[u8],
    file_path: &str,
    symbols: &mut Vec<DraftSymbol>,
    parent_id: Option<String>,
) {
    extract_symbols_from_node(node, source, file_path, symbols, parent_id.clone());

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "class_specifier" => {
                if let Some(name) = get_type_name(child, source) {
                    symbols.push(DraftSymbol {
                        id: format!("_pending_{}", symbols.len()),
                        name,
                        kind: SymbolKind::Class,
                        file: file_path.to_string(),
                        line: child.start_position().row + 1,
                        visibility: Visibility::Public,
                        exported: true,
                        parent: parent_id.clone(),
                        byte_range: Some((child.start_byte(), child.end_byte())),
                        parameter_types: None,
                    });
                }
            }
            "namespace_definition" => {
                let mut name = None;
                let mut inner = child.walk();
                for c in child.children(&mut inner) {
                    if c.kind() == "namespace_identifier" {
                        name = Some(node_text(c, source).to_string());
                        break;
                    }
                }
                if let Some(name) = name {
                    symbols.push(DraftSymbol {
                        id: format!("_pending_{}", symbols.len()),
                        name: name.clone(),
                        kind: SymbolKind::Namespace,
                        file: file_path.to_string(),
                        line: child.start_position().row + 1,
                        visibility: Visibility::Public,
                        exported: true,
                        parent: parent_id.clone(),
                        byte_range: Some((child.start_byte(), child.end_byte())),
                        parameter_types: None,
                    });
                    let mut ns_cursor = child.walk();
                    for c in child.children(&mut ns_cursor) {
                        if c.kind() == "declaration_list" {
                            extract_cpp_symbols(c, source, file_path, symbols, Some(name.clone()));
                        }
                    }
                }
            }
            _ => {}
        }
    }
}
