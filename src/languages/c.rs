//! C analyser, and shared helpers reused by [`super::cpp`]. Grounded on
//! `languages/c_cpp.py`'s `_CBaseMixin`/`CAnalyser`.

use tree_sitter::{Language, Node, Tree};

use crate::config::{DraftSymbol, ImportStatement, RawCall, SymbolKind, Visibility};

use super::node_text;
use super::LanguageAnalyser;

pub struct CAnalyser;

pub(crate) const PREPROC_CONTAINERS: &[&str] =
    &["preproc_ifdef", "preproc_ifndef", "preproc_if", "preproc_else", "preproc_elif"];

const C_BUILTIN_EXCLUSIONS: &[&str] = &[
    "printf", "fprintf", "sprintf", "snprintf", "scanf", "sscanf", "malloc", "calloc",
    "realloc", "free", "memcpy", "memset", "memmove", "memcmp", "strlen", "strcmp",
    "strncmp", "strcpy", "strncpy", "strcat", "sizeof", "assert", "exit", "abort", "fopen",
    "fclose", "fread", "fwrite", "fgets", "fputs",
];

pub(crate) fn get_func_name(node: Node, source: &[u8]) -> Option<String> {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "function_declarator" => {
                let mut inner = child.walk();
                for c in child.children(&mut inner) {
                    if c.kind() == "identifier" {
                        return Some(node_text(c, source).to_string());
                    }
                }
            }
            "pointer_declarator" => {
                if let Some(result) = get_func_name(child, source) {
                    return Some(result);
                }
            }
            "identifier" => return Some(node_text(child, source).to_string()),
            _ => {}
        }
    }
    None
}

pub(crate) fn get_type_name(node: Node, source: &[u8]) -> Option<String> {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() == "type_identifier" {
            return Some(node_text(child, source).to_string());
        }
    }
    None
}

pub(crate) fn extract_symbols_from_node(
    node: Node,
    source: &[u8],
    file_path: &str,
    symbols: &mut Vec<DraftSymbol>,
    parent_id: Option<String>,
) {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "function_definition" | "declaration" => {
                if let Some(name) = get_func_name(child, source) {
                    push(symbols, &name, SymbolKind::Function, file_path, child, parent_id.clone());
                }
            }
            "struct_specifier" => {
                if let Some(name) = get_type_name(child, source) {
                    push(symbols, &name, SymbolKind::Struct, file_path, child, parent_id.clone());
                }
            }
            "enum_specifier" => {
                if let Some(name) = get_type_name(child, source) {
                    push(symbols, &name, SymbolKind::Enum, file_path, child, parent_id.clone());
                }
            }
            "type_definition" => {
                if let Some(name) = get_type_name(child, source) {
                    push(symbols, &name, SymbolKind::Typedef, file_path, child, parent_id.clone());
                }
            }
            kind if PREPROC_CONTAINERS.contains(&kind) => {
                extract_symbols_from_node(child, source, file_path, symbols, parent_id.clone());
            }
            _ => {}
        }
    }
}

fn push(symbols: &mut Vec<DraftSymbol>, name: &str, kind: SymbolKind, file: &str, node: Node, parent: Option<String>) {
    symbols.push(DraftSymbol {
        id: format!("_pending_{}", symbols.len()),
        name: name.to_string(),
        kind,
        file: file.to_string(),
        line: node.start_position().row + 1,
        visibility: Visibility::Public,
        exported: true,
        parent,
        byte_range: Some((node.start_byte(), node.end_byte())),
        parameter_types: None,
    });
}

pub(crate) fn extract_includes(tree: &Tree, source: &[u8], file_path: &str) -> Vec<ImportStatement> {
    let mut imports = Vec::new();
    let mut cursor = tree.root_node().walk();
    for child in tree.root_node().children(&mut cursor) {
        if child.kind() != "preproc_include" {
            continue;
        }
        let mut path = None;
        let mut inner = child.walk();
        for c in child.children(&mut inner) {
            match c.kind() {
                "string_literal" => {
                    let mut sc_cursor = c.walk();
                    for sc in c.children(&mut sc_cursor) {
                        if sc.kind() == "string_content" {
                            path = Some(node_text(sc, source).to_string());
                        }
                    }
                }
                "system_lib_string" => {
                    path = Some(node_text(c, source).trim_matches(|ch| ch == '<' || ch == '>').to_string());
                }
                _ => {}
            }
        }
        if let Some(path) = path {
            imports.push(ImportStatement {
                file: file_path.to_string(),
                statement: node_text(child, source).trim().to_string(),
                target_name: path,
                line: child.start_position().row + 1,
            });
        }
    }
    imports
}

pub(crate) fn find_call_expressions(
    node: Node,
    source: &[u8],
    file_path: &str,
    calls: &mut Vec<RawCall>,
    exclusions: &[&str],
) {
    if node.kind() == "call_expression" {
        if let Some((callee_name, qualifier)) = extract_callee(node, source) {
            if !exclusions.contains(&callee_name.as_str()) {
                let qualified = qualifier
                    .as_ref()
                    .map(|q| format!("{}.{}", q, callee_name))
                    .unwrap_or_else(|| callee_name.clone());
                if !exclusions.contains(&qualified.as_str()) {
                    let caller = find_enclosing_func(node, source).unwrap_or_else(|| "<module>".to_string());
                    calls.push(RawCall {
                        caller_file: file_path.to_string(),
                        caller_name: caller,
                        callee_name,
                        line: node.start_position().row + 1,
                        qualifier,
                    });
                }
            }
        }
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        find_call_expressions(child, source, file_path, calls, exclusions);
    }
}

fn extract_callee(node: Node, source: &[u8]) -> Option<(String, Option<String>)> {
    let first = node.child(0)?;
    match first.kind() {
        "identifier" => Some((node_text(first, source).to_string(), None)),
        "field_expression" => {
            let mut parts = Vec::new();
            let mut cursor = first.walk();
            for c in first.children(&mut cursor) {
                if matches!(c.kind(), "identifier" | "field_identifier") {
                    parts.push(node_text(c, source).to_string());
                }
            }
            if parts.len() >= 2 {
                let callee = parts[parts.len() - 1].clone();
                let qualifier = parts[parts.len() - 2].clone();
                Some((callee, Some(qualifier)))
            } else {
                parts.into_iter().next().map(|p| (p, None))
            }
        }
        "qualified_identifier" => {
            let text = node_text(first, source);
            if let Some(idx) = text.rfind("::") {
                Some((text[idx + 2..].to_string(), Some(text[..idx].to_string())))
            } else {
                Some((text.to_string(), None))
            }
        }
        _ => None,
    }
}

pub(crate) fn find_enclosing_func(node: Node, source: &[u8]) -> Option<String> {
    let mut current = node.parent();
    while let Some(n) = current {
        if n.kind() == "function_definition" {
            return get_func_name(n, source);
        }
        current = n.parent();
    }
    None
}

impl LanguageAnalyser for CAnalyser {
    fn language_name(&self) -> &'static str {
        "c"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["c", "h"]
    }

    fn ts_language(&self) -> Language {
        tree_sitter_c::LANGUAGE.into()
    }

    fn extract_symbols(&self, tree: &Tree, source: &[u8], file_path: &str) -> Vec<DraftSymbol> {
        let mut symbols = Vec::new();
        extract_symbols_from_node(tree.root_node(), source, file_path, &mut symbols, None);
        symbols
    }

    fn extract_imports(&self, tree: &Tree, source: &[u8], file_path: &str) -> Vec<ImportStatement> {
        extract_includes(tree, source, file_path)
    }

    fn extract_calls(&self, tree: &Tree, source: &[u8], file_path: &str) -> Vec<RawCall> {
        let mut calls = Vec::new();
        find_call_expressions(tree.root_node(), source, file_path, &mut calls, C_BUILTIN_EXCLUSIONS);
        calls
    }

    fn builtin_exclusions(&self) -> &'static [&'static str] {
        C_BUILTIN_EXCLUSIONS
    }
}
