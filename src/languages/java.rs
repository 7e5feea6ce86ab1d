//! Java analyser. Grounded on `languages/java.py`.

use tree_sitter::{Language, Node, Tree};

use crate::config::{DraftSymbol, ImportStatement, RawCall, SymbolKind, Visibility};

use super::{LanguageAnalyser, node_text};

pub struct JavaAnalyser;

const CONTAINER_TYPES: &[&str] = &["class_declaration", "interface_declaration", "enum_declaration"];

const BUILTIN_EXCLUSIONS: &[&str] = &[
    "System.out.println", "System.out.print", "System.err.println", "System.out.printf",
    "System.exit", "Objects.equals", "Objects.hash", "Objects.requireNonNull",
    "Arrays.asList", "Arrays.sort", "Arrays.copyOf", "Collections.sort",
    "Collections.unmodifiableList", "String.valueOf", "String.format", "String.join",
    "Integer.parseInt", "Integer.valueOf", "Math.abs", "Math.max", "Math.min", "Math.round",
    "toString", "equals", "hashCode", "getClass", "println", "printf",
];

fn type_for_kind(kind: &str) -> Option<SymbolKind> {
    match kind {
        "class_declaration" => Some(SymbolKind::Class),
        "interface_declaration" => Some(SymbolKind::Interface),
        "enum_declaration" => Some(SymbolKind::Enum),
        "method_declaration" => Some(SymbolKind::Method),
        "constructor_declaration" => Some(SymbolKind::Constructor),
        "record_declaration" => Some(SymbolKind::Record),
        "annotation_type_declaration" => Some(SymbolKind::Annotation),
        _ => None,
    }
}

impl LanguageAnalyser for JavaAnalyser {
    fn language_name(&self) -> &'static str {
        "java"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["java"]
    }

    fn ts_language(&self) -> Language {
        tree_sitter_java::LANGUAGE.into()
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
            if child.kind() == "import_declaration" {
                let mut target = None;
                let mut inner = child.walk();
                for c in child.children(&mut inner) {
                    if c.kind() == "scoped_identifier" {
                        target = Some(node_text(c, source).to_string());
                    }
                }
                if let Some(target) = target {
                    let statement = node_text(child, source).trim_end_matches(';').trim().to_string();
                    imports.push(ImportStatement {
                        file: file_path.to_string(),
                        statement,
                        target_name: target,
                        line: child.start_position().row + 1,
                    });
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

fn get_name(node: Node, source: &[u8]) -> Option<String> {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() == "identifier" {
            return Some(node_text(child, source).to_string());
        }
    }
    None
}

fn get_visibility(node: Node, source: &[u8]) -> Visibility {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() == "modifiers" {
            let mut inner = child.walk();
            for m in child.children(&mut inner) {
                if m.child_count() == 0 {
                    match node_text(m, source) {
                        "public" => return Visibility::Public,
                        "private" => return Visibility::Private,
                        "protected" => return Visibility::Protected,
                        _ => {}
                    }
                }
            }
        }
    }
    Visibility::Internal
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
        if let Some(kind) = type_for_kind(child.kind()) {
            let Some(name) = get_name(child, source) else { continue };
            let visibility = get_visibility(child, source);
            let exported = visibility == Visibility::Public;
            symbols.push(DraftSymbol {
                id: format!("_pending_{}", symbols.len()),
                name: name.clone(),
                kind,
                file: file_path.to_string(),
                line: child.start_position().row + 1,
                visibility,
                exported,
                parent: parent_id.clone(),
                byte_range: Some((child.start_byte(), child.end_byte())),
                parameter_types: None,
            });

            if CONTAINER_TYPES.contains(&child.kind()) {
                let mut inner = child.walk();
                for c in child.children(&mut inner) {
                    if matches!(c.kind(), "class_body" | "interface_body" | "enum_body") {
                        walk(c, source, file_path, symbols, Some(name.clone()));
                    }
                }
            }
        }
    }
}

fn find_calls(node: Node, source: &[u8], file_path: &str, calls: &mut Vec<RawCall>) {
    match node.kind() {
        "method_invocation" => {
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
        "object_creation_expression" => {
            let mut cursor = node.walk();
            for c in node.children(&mut cursor) {
                if matches!(c.kind(), "identifier" | "type_identifier") {
                    let name = node_text(c, source).to_string();
                    if !BUILTIN_EXCLUSIONS.contains(&name.as_str()) {
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
    let has_dot = {
        let mut cursor = node.walk();
        node.children(&mut cursor).any(|c| c.kind() == ".")
    };
    if has_dot {
        let mut parts = Vec::new();
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if matches!(child.kind(), "identifier" | "field_access") {
                parts.push(node_text(child, source).to_string());
            }
        }
        if parts.len() >= 2 {
            let callee = parts[parts.len() - 1].clone();
            let qualifier = parts[parts.len() - 2].clone();
            Some((callee, Some(qualifier)))
        } else {
            parts.into_iter().next().map(|p| (p, None))
        }
    } else {
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if child.kind() == "identifier" {
                return Some((node_text(child, source).to_string(), None));
            }
        }
        None
    }
}

fn find_enclosing(node: Node, source: &[u8]) -> Option<String> {
    let mut current = node.parent();
    while let Some(n) = current {
        if matches!(n.kind(), "method_declaration" | "constructor_declaration") {
            return get_name(n, source);
        }
        current = n.parent();
    }
    None
}
