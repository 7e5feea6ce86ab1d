//! Rust analyser.

use tree_sitter::{Language, Node, Tree};

use crate::config::{DraftSymbol, ImportStatement, RawCall, SymbolKind, Visibility};

use super::{LanguageAnalyser, node_text};

pub struct RustAnalyser;

const BUILTIN_EXCLUSIONS: &[&str] = &[
    "println!", "eprintln!", "format!", "vec!", "dbg!", "assert!", "assert_eq!",
    "assert_ne!", "todo!", "unimplemented!", "panic!", "unreachable!", "write!", "writeln!",
    "println", "eprintln", "format", "vec", "dbg", "assert", "assert_eq", "assert_ne",
    "todo", "unimplemented", "panic", "unreachable", "write", "writeln", "String::from",
    "Into::into", "From::from", "Clone::clone", "Default::default", "Some", "None", "Ok",
    "Err",
];

fn type_for_kind(kind: &str) -> Option<SymbolKind> {
    match kind {
        "function_item" => Some(SymbolKind::Function),
        "struct_item" => Some(SymbolKind::Struct),
        "enum_item" => Some(SymbolKind::Enum),
        "trait_item" => Some(SymbolKind::Trait),
        "impl_item" => Some(SymbolKind::Impl),
        "type_item" => Some(SymbolKind::TypeAlias),
        "const_item" => Some(SymbolKind::Constant),
        "static_item" => Some(SymbolKind::Static),
        "mod_item" => Some(SymbolKind::Module),
        "macro_definition" => Some(SymbolKind::Macro),
        _ => None,
    }
}

impl LanguageAnalyser for RustAnalyser {
    fn language_name(&self) -> &'static str {
        "rust"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["rs"]
    }

    fn ts_language(&self) -> Language {
        tree_sitter_rust::LANGUAGE.into()
    }

    fn extract_symbols(&self, tree: &Tree, source: &[u8], file_path: &str) -> Vec<DraftSymbol> {
        let mut symbols = Vec::new();
        walk(tree.root_node(), source, file_path, &mut symbols, None);
        symbols
    }

    fn extract_imports(&self, tree: &Tree, source: &[u8], file_path: &str) -> Vec<ImportStatement> {
        let mut imports = Vec::new();
        let mut cursor = tree.root_node().walk();
        for child in tree.root_node().children(&mut cursor) {
            if child.kind() != "use_declaration" {
                continue;
            }
            let mut path = None;
            let mut inner = child.walk();
            for c in child.children(&mut inner) {
                if matches!(c.kind(), "scoped_identifier" | "identifier" | "use_wildcard" | "scoped_use_list") {
                    path = Some(node_text(c, source).to_string());
                    break;
                }
            }
            if let Some(path) = path {
                let statement = node_text(child, source).trim_end_matches(';').trim().to_string();
                imports.push(ImportStatement {
                    file: file_path.to_string(),
                    statement,
                    target_name: path,
                    line: child.start_position().row + 1,
                });
            }
        }
        imports
    }

    fn extract_calls(&self, tree: &Tree, source: &[u8], file_path: &str) -> Vec<RawCall> {
        let mut calls = Vec::new();
        find_calls(tree.root_node(), source, file_path, &mut calls);
        calls
    }

    fn builtin_exclusions(&self) -> &'static [&'static str] {
        BUILTIN_EXCLUSIONS
    }
}

fn get_name(node: Node, source: &[u8]) -> Option<String> {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if matches!(child.kind(), "identifier" | "type_identifier") {
            return Some(node_text(child, source).to_string());
        }
    }
    None
}

fn is_pub(node: Node) -> bool {
    let mut cursor = node.walk();
    node.children(&mut cursor).any(|c| c.kind() == "visibility_modifier")
}

fn walk(
    node: Node,
    source: &[u8],
    file_path: &str,
    symbols: &mut Vec<DraftSymbol>,
    parent_id: Option<String>,
) {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        let Some(kind) = type_for_kind(child.kind()) else { continue };
        let Some(name) = get_name(child, source) else { continue };
        let exported = is_pub(child);
        symbols.push(DraftSymbol {
            id: format!("_pending_{}", symbols.len()),
            name: name.clone(),
            kind,
            file: file_path.to_string(),
            line: child.start_position().row + 1,
            visibility: if exported { Visibility::Public } else { Visibility::Private },
            exported,
            parent: parent_id.clone(),
            byte_range: Some((child.start_byte(), child.end_byte())),
            parameter_types: None,
        });

        if matches!(child.kind(), "impl_item" | "mod_item") {
            let mut inner = child.walk();
            for c in child.children(&mut inner) {
                if c.kind() == "declaration_list" {
                    walk(c, source, file_path, symbols, Some(name.clone()));
                }
            }
        }
    }
}

fn find_calls(node: Node, source: &[u8], file_path: &str, calls: &mut Vec<RawCall>) {
    match node.kind() {
        "call_expression" => {
            if let Some((callee_name, qualifier)) = extract_callee(node, source) {
                if !BUILTIN_EXCLUSIONS.contains(&callee_name.as_str()) {
                    let qualified = qualifier
                        .as_ref()
                        .map(|q| format!("{}::{}", q, callee_name))
                        .unwrap_or_else(|| callee_name.clone());
                    if !BUILTIN_EXCLUSIONS.contains(&qualified.as_str()) {
                        let caller = find_enclosing(node, source).unwrap_or_else(|| "<module>".to_string());
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
        "macro_invocation" => {
            let mut cursor = node.walk();
            for c in node.children(&mut cursor) {
                if c.kind() == "identifier" {
                    let name = node_text(c, source).to_string();
                    let with_bang = format!("{}!", name);
                    if !BUILTIN_EXCLUSIONS.contains(&name.as_str()) && !BUILTIN_EXCLUSIONS.contains(&with_bang.as_str()) {
                        let caller = find_enclosing(node, source).unwrap_or_else(|| "<module>".to_string());
                        calls.push(RawCall {
                            caller_file: file_path.to_string(),
                            caller_name: caller,
                            callee_name: name,
                            line: node.start_position().row + 1,
                            qualifier: None,
                        });
                    }
                    break;
                }
            }
        }
        _ => {}
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        find_calls(child, source, file_path, calls);
    }
}

fn extract_callee(node: Node, source: &[u8]) -> Option<(String, Option<String>)> {
    let first = node.child(0)?;
    match first.kind() {
        "identifier" => Some((node_text(first, source).to_string(), None)),
        "scoped_identifier" => collect_last_two(first, source, &["identifier", "type_identifier"]),
        "field_expression" => collect_last_two(first, source, &["identifier", "field_identifier"]),
        _ => None,
    }
}

fn collect_last_two(node: Node, source: &[u8], kinds: &[&str]) -> Option<(String, Option<String>)> {
    let mut parts = Vec::new();
    let mut cursor = node.walk();
    for c in node.children(&mut cursor) {
        if kinds.contains(&c.kind()) {
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

fn find_enclosing(node: Node, source: &[u8]) -> Option<String> {
    let mut current = node.parent();
    while let Some(n) = current {
        if n.kind() == "function_item" {
            return get_name(n, source);
        }
        current = n.parent();
    }
    None
}
