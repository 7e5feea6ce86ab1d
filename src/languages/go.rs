//! Go analyser. Grounded on `languages/go.py`.

use tree_sitter::{Language, Node, Tree};

use crate::config::{DraftSymbol, ImportStatement, RawCall, SymbolKind, Visibility};

use super::{LanguageAnalyser, node_text};

pub struct GoAnalyser;

const BUILTIN_EXCLUSIONS: &[&str] = &[
    "fmt.Println", "fmt.Printf", "fmt.Sprintf", "fmt.Fprintf", "fmt.Errorf", "fmt.Print",
    "log.Println", "log.Printf", "log.Fatal", "log.Fatalf", "append", "make", "len", "cap",
    "close", "delete", "new", "panic", "recover", "copy",
];

impl LanguageAnalyser for GoAnalyser {
    fn language_name(&self) -> &'static str {
        "go"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["go"]
    }

    fn ts_language(&self) -> Language {
        tree_sitter_go::LANGUAGE.into()
    }

    fn extract_symbols(&self, tree: &Tree, source: &[u8], file_path: &str) -> Vec<DraftSymbol> {
        let mut symbols = Vec::new();
        let mut cursor = tree.root_node().walk();
        for child in tree.root_node().children(&mut cursor) {
            match child.kind() {
                "function_declaration" => {
                    if let Some(name) = get_child_text(child, source, "identifier") {
                        push(&mut symbols, &name, SymbolKind::Function, file_path, child.start_position().row + 1, None);
                    }
                }
                "method_declaration" => {
                    if let Some(name) = get_child_text(child, source, "field_identifier") {
                        push(&mut symbols, &name, SymbolKind::Method, file_path, child.start_position().row + 1, None);
                    }
                }
                "type_declaration" => {
                    let mut inner = child.walk();
                    for spec in child.children(&mut inner) {
                        if spec.kind() == "type_spec" {
                            if let Some(name) = get_child_text(spec, source, "type_identifier") {
                                let mut kind = SymbolKind::TypeAlias;
                                let mut spec_cursor = spec.walk();
                                for c in spec.children(&mut spec_cursor) {
                                    match c.kind() {
                                        "struct_type" => kind = SymbolKind::Struct,
                                        "interface_type" => kind = SymbolKind::Interface,
                                        _ => {}
                                    }
                                }
                                push(&mut symbols, &name, kind, file_path, spec.start_position().row + 1, None);
                            }
                        }
                    }
                }
                "const_declaration" => {
                    let mut inner = child.walk();
                    for spec in child.children(&mut inner) {
                        if spec.kind() == "const_spec" {
                            if let Some(name) = get_child_text(spec, source, "identifier") {
                                push(&mut symbols, &name, SymbolKind::Constant, file_path, spec.start_position().row + 1, None);
                            }
                        }
                    }
                }
                _ => {}
            }
        }
        symbols
    }

    fn extract_imports(&self, tree: &Tree, source: &[u8], file_path: &str) -> Vec<ImportStatement> {
        let mut imports = Vec::new();
        let mut cursor = tree.root_node().walk();
        for child in tree.root_node().children(&mut cursor) {
            if child.kind() != "import_declaration" {
                continue;
            }
            let mut inner = child.walk();
            for spec in child.children(&mut inner) {
                match spec.kind() {
                    "import_spec" => push_import(spec, source, file_path, &mut imports),
                    "import_spec_list" => {
                        let mut sub_cursor = spec.walk();
                        for sub in spec.children(&mut sub_cursor) {
                            if sub.kind() == "import_spec" {
                                push_import(sub, source, file_path, &mut imports);
                            }
                        }
                    }
                    _ => {}
                }
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

fn push(symbols: &mut Vec<DraftSymbol>, name: &str, kind: SymbolKind, file: &str, line: usize, parent: Option<String>) {
    let exported = name.chars().next().map(|c| c.is_uppercase()).unwrap_or(false);
    symbols.push(DraftSymbol {
        id: format!("_pending_{}", symbols.len()),
        name: name.to_string(),
        kind,
        file: file.to_string(),
        line,
        visibility: if exported { Visibility::Public } else { Visibility::Private },
        exported,
        parent,
        byte_range: None,
        parameter_types: None,
    });
}

fn get_child_text(node: Node, source: &[u8], target_kind: &str) -> Option<String> {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() == target_kind {
            return Some(node_text(child, source).to_string());
        }
    }
    None
}

fn push_import(spec: Node, source: &[u8], file_path: &str, imports: &mut Vec<ImportStatement>) {
    let mut cursor = spec.walk();
    for child in spec.children(&mut cursor) {
        if child.kind() == "interpreted_string_literal" {
            if let Some(path) = string_content(child, source) {
                imports.push(ImportStatement {
                    file: file_path.to_string(),
                    statement: format!("import \"{}\"", path),
                    target_name: path,
                    line: spec.start_position().row + 1,
                });
            }
        }
    }
}

fn string_content(node: Node, source: &[u8]) -> Option<String> {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() == "interpreted_string_literal_content" {
            return Some(node_text(child, source).to_string());
        }
    }
    None
}

fn find_calls(node: Node, source: &[u8], file_path: &str, calls: &mut Vec<RawCall>) {
    if node.kind() == "call_expression" {
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
        "selector_expression" => {
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
        _ => None,
    }
}

fn find_enclosing(node: Node, source: &[u8]) -> Option<String> {
    let mut current = node.parent();
    while let Some(n) = current {
        match n.kind() {
            "function_declaration" => return get_child_text(n, source, "identifier"),
            "method_declaration" => return get_child_text(n, source, "field_identifier"),
            _ => {}
        }
        current = n.parent();
    }
    None
}
