//! Python analyser. Grounded on `languages/python_lang.py`.

use tree_sitter::{Language, Node, Tree};

use crate::config::{DraftSymbol, ImportStatement, RawCall, SymbolKind, Visibility};

use super::{LanguageAnalyser, node_text};

pub struct PythonAnalyser;

const BUILTIN_EXCLUSIONS: &[&str] = &[
    "print", "len", "range", "enumerate", "zip", "map", "filter", "isinstance", "issubclass",
    "type", "super", "str", "int", "float", "list", "dict", "set", "tuple", "bool", "bytes",
    "sorted", "reversed", "any", "all", "min", "max", "sum", "abs", "round", "hash", "id",
    "repr", "format", "open", "getattr", "setattr", "hasattr", "delattr", "callable", "iter",
    "next", "input", "ord", "chr", "hex", "oct", "bin", "property", "staticmethod",
    "classmethod", "ValueError", "TypeError", "KeyError", "IndexError", "RuntimeError",
    "AttributeError", "Exception",
];

impl LanguageAnalyser for PythonAnalyser {
    fn language_name(&self) -> &'static str {
        "py"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["py", "pyi"]
    }

    fn ts_language(&self) -> Language {
        tree_sitter_python::LANGUAGE.into()
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
            match child.kind() {
                "import_statement" => {
                    let mut inner = child.walk();
                    for c in child.children(&mut inner) {
                        if c.kind() == "dotted_name" {
                            let target = node_text(c, source).to_string();
                            imports.push(ImportStatement {
                                file: file_path.to_string(),
                                statement: node_text(child, source).to_string(),
                                target_name: target,
                                line: child.start_position().row + 1,
                            });
                        }
                    }
                }
                "import_from_statement" => {
                    let mut module = None;
                    let mut inner = child.walk();
                    for c in child.children(&mut inner) {
                        if c.kind() == "dotted_name" || c.kind() == "relative_import" {
                            module = Some(node_text(c, source).to_string());
                            break;
                        }
                    }
                    if let Some(module) = module {
                        imports.push(ImportStatement {
                            file: file_path.to_string(),
                            statement: node_text(child, source).to_string(),
                            target_name: module,
                            line: child.start_position().row + 1,
                        });
                    }
                }
                _ => {}
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
        if child.kind() == "identifier" {
            return Some(node_text(child, source).to_string());
        }
    }
    None
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
        match child.kind() {
            "class_definition" => {
                if let Some(name) = get_name(child, source) {
                    symbols.push(DraftSymbol {
                        id: format!("_pending_{}", symbols.len()),
                        name: name.clone(),
                        kind: SymbolKind::Class,
                        file: file_path.to_string(),
                        line: child.start_position().row + 1,
                        visibility: Visibility::Public,
                        exported: !name.starts_with('_'),
                        parent: parent_id.clone(),
                        byte_range: Some((child.start_byte(), child.end_byte())),
                        parameter_types: None,
                    });
                    let mut inner = child.walk();
                    for c in child.children(&mut inner) {
                        if c.kind() == "block" {
                            walk(c, source, file_path, symbols, Some(name.clone()));
                        }
                    }
                }
            }
            "function_definition" => {
                if let Some(name) = get_name(child, source) {
                    let kind = if name == "__init__" {
                        SymbolKind::Constructor
                    } else if parent_id.is_some() {
                        SymbolKind::Method
                    } else {
                        SymbolKind::Function
                    };
                    let visibility = if name.starts_with('_') && !name.starts_with("__") {
                        Visibility::Private
                    } else {
                        Visibility::Public
                    };
                    symbols.push(DraftSymbol {
                        id: format!("_pending_{}", symbols.len()),
                        name: name.clone(),
                        kind,
                        file: file_path.to_string(),
                        line: child.start_position().row + 1,
                        visibility,
                        exported: !name.starts_with('_'),
                        parent: parent_id.clone(),
                        byte_range: Some((child.start_byte(), child.end_byte())),
                        parameter_types: None,
                    });
                }
            }
            "decorated_definition" => {
                let mut inner = child.walk();
                for c in child.children(&mut inner) {
                    if matches!(c.kind(), "class_definition" | "function_definition") {
                        walk(child, source, file_path, symbols, parent_id.clone());
                        break;
                    }
                }
            }
            _ => {}
        }
    }
}

fn find_calls(node: Node, source: &[u8], file_path: &str, calls: &mut Vec<RawCall>) {
    if node.kind() == "call" {
        if let Some((callee_name, qualifier)) = extract_callee(node, source) {
            if !BUILTIN_EXCLUSIONS.contains(&callee_name.as_str()) {
                let qualified = qualifier
                    .as_ref()
                    .map(|q| format!("{}.{}", q, callee_name))
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
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        find_calls(child, source, file_path, calls);
    }
}

fn extract_callee(node: Node, source: &[u8]) -> Option<(String, Option<String>)> {
    let first = node.child(0)?;
    match first.kind() {
        "identifier" => Some((node_text(first, source).to_string(), None)),
        "attribute" => {
            let mut parts = Vec::new();
            let mut cursor = first.walk();
            for c in first.children(&mut cursor) {
                if c.kind() == "identifier" {
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
        _ => None,
    }
}

fn find_enclosing(node: Node, source: &[u8]) -> Option<String> {
    let mut current = node.parent();
    while let Some(n) = current {
        if n.kind() == "function_definition" {
            return get_name(n, source);
        }
        current = n.parent();
    }
    None
}
