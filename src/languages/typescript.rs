//! Shared TypeScript/JavaScript analyser. Grammar dispatch (`.tsx` -> TSX grammar,
//! `.js`/`.jsx`/`.mjs`/`.cjs` -> JavaScript grammar, else TypeScript grammar) happens
//! in [`super::parse_with_thread_local`]; this module only extracts from the parsed
//! tree, which is grammar-agnostic at the node-kind level. Grounded on
//! `languages/typescript.py`.

use tree_sitter::{Language, Node, Tree};

use crate::config::{DraftSymbol, ImportStatement, RawCall, SymbolKind, Visibility};

use super::{LanguageAnalyser, node_text};

pub struct TypeScriptAnalyser;

const BUILTIN_EXCLUSIONS: &[&str] = &[
    "console.log", "console.error", "console.warn", "console.info", "console.debug",
    "console.trace", "console.dir", "setTimeout", "setInterval", "clearTimeout",
    "clearInterval", "Promise.resolve", "Promise.reject", "Promise.all", "Promise.race",
    "JSON.stringify", "JSON.parse", "Array.from", "Array.isArray", "Object.keys",
    "Object.values", "Object.entries", "Object.assign", "Object.freeze", "Object.create",
    "parseInt", "parseFloat", "isNaN", "isFinite", "encodeURIComponent",
    "decodeURIComponent", "require",
];

fn type_for_kind(kind: &str) -> Option<SymbolKind> {
    match kind {
        "class_declaration" => Some(SymbolKind::Class),
        "interface_declaration" => Some(SymbolKind::Interface),
        "enum_declaration" => Some(SymbolKind::Enum),
        "function_declaration" => Some(SymbolKind::Function),
        "type_alias_declaration" => Some(SymbolKind::TypeAlias),
        _ => None,
    }
}

impl LanguageAnalyser for TypeScriptAnalyser {
    fn language_name(&self) -> &'static str {
        "ts"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["ts", "tsx", "js", "jsx", "mjs", "cjs"]
    }

    fn ts_language(&self) -> Language {
        tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into()
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
            if matches!(child.kind(), "import_statement" | "export_statement") {
                if let Some(source_path) = string_source(child, source) {
                    let statement = node_text(child, source).trim_end_matches(';').trim().to_string();
                    imports.push(ImportStatement {
                        file: file_path.to_string(),
                        statement,
                        target_name: source_path,
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
        if matches!(child.kind(), "identifier" | "type_identifier") {
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
        let mut exported = false;
        let mut decl = child;

        if child.kind() == "export_statement" {
            exported = true;
            let mut inner = child.walk();
            for c in child.children(&mut inner) {
                if type_for_kind(c.kind()).is_some() || c.kind() == "lexical_declaration" {
                    decl = c;
                    break;
                }
            }
        }

        if let Some(kind) = type_for_kind(decl.kind()) {
            if let Some(name) = get_name(decl, source) {
                symbols.push(DraftSymbol {
                    id: format!("_pending_{}", symbols.len()),
                    name: name.clone(),
                    kind,
                    file: file_path.to_string(),
                    line: decl.start_position().row + 1,
                    visibility: if exported { Visibility::Public } else { Visibility::Private },
                    exported,
                    parent: parent_id.clone(),
                    byte_range: Some((decl.start_byte(), decl.end_byte())),
                    parameter_types: None,
                });

                if decl.kind() == "class_declaration" {
                    let mut inner = decl.walk();
                    for c in decl.children(&mut inner) {
                        if c.kind() == "class_body" {
                            extract_class_members(c, source, file_path, symbols, &name);
                        }
                    }
                }
            }
        } else if decl.kind() == "lexical_declaration" {
            let mut inner = decl.walk();
            for vc in decl.children(&mut inner) {
                if vc.kind() == "variable_declarator" {
                    let mut vname = None;
                    let mut is_fn = false;
                    let mut vc_cursor = vc.walk();
                    for c in vc.children(&mut vc_cursor) {
                        if c.kind() == "identifier" {
                            vname = Some(node_text(c, source).to_string());
                        }
                        if c.kind() == "arrow_function" {
                            is_fn = true;
                        }
                    }
                    if let (Some(vname), true) = (vname, is_fn) {
                        symbols.push(DraftSymbol {
                            id: format!("_pending_{}", symbols.len()),
                            name: vname,
                            kind: SymbolKind::Function,
                            file: file_path.to_string(),
                            line: vc.start_position().row + 1,
                            visibility: if exported { Visibility::Public } else { Visibility::Private },
                            exported,
                            parent: parent_id.clone(),
                            byte_range: Some((vc.start_byte(), vc.end_byte())),
                            parameter_types: None,
                        });
                    }
                }
            }
        }
    }
}

fn extract_class_members(body: Node, source: &[u8], file_path: &str, symbols: &mut Vec<DraftSymbol>, parent_name: &str) {
    let mut cursor = body.walk();
    for child in body.children(&mut cursor) {
        match child.kind() {
            "method_definition" => {
                let mut inner = child.walk();
                let name = child.children(&mut inner).find(|c| c.kind() == "property_identifier").map(|c| node_text(c, source).to_string());
                if let Some(name) = name {
                    let kind = if name == "constructor" { SymbolKind::Constructor } else { SymbolKind::Method };
                    symbols.push(DraftSymbol {
                        id: format!("_pending_{}", symbols.len()),
                        name,
                        kind,
                        file: file_path.to_string(),
                        line: child.start_position().row + 1,
                        visibility: Visibility::Public,
                        exported: true,
                        parent: Some(parent_name.to_string()),
                        byte_range: Some((child.start_byte(), child.end_byte())),
                        parameter_types: None,
                    });
                }
            }
            "public_field_definition" => {
                let mut inner = child.walk();
                let name = child.children(&mut inner).find(|c| c.kind() == "property_identifier").map(|c| node_text(c, source).to_string());
                if let Some(name) = name {
                    symbols.push(DraftSymbol {
                        id: format!("_pending_{}", symbols.len()),
                        name,
                        kind: SymbolKind::Property,
                        file: file_path.to_string(),
                        line: child.start_position().row + 1,
                        visibility: Visibility::Public,
                        exported: true,
                        parent: Some(parent_name.to_string()),
                        byte_range: None,
                        parameter_types: None,
                    });
                }
            }
            _ => {}
        }
    }
}

fn string_source(node: Node, source: &[u8]) -> Option<String> {
    let mut cursor = node.walk();
    for c in node.children(&mut cursor) {
        if c.kind() == "string" {
            let mut sc_cursor = c.walk();
            for sc in c.children(&mut sc_cursor) {
                if sc.kind() == "string_fragment" {
                    return Some(node_text(sc, source).to_string());
                }
            }
        }
    }
    None
}

fn find_calls(node: Node, source: &[u8], file_path: &str, calls: &mut Vec<RawCall>) {
    if matches!(node.kind(), "call_expression" | "new_expression") {
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
    if first.kind() == "new" {
        let mut cursor = node.walk();
        for c in node.children(&mut cursor).skip(1) {
            if matches!(c.kind(), "identifier" | "type_identifier") {
                return Some((node_text(c, source).to_string(), None));
            }
        }
        return None;
    }
    match first.kind() {
        "identifier" | "type_identifier" => Some((node_text(first, source).to_string(), None)),
        "member_expression" => {
            let mut parts = Vec::new();
            let mut cursor = first.walk();
            for c in first.children(&mut cursor) {
                if matches!(c.kind(), "identifier" | "property_identifier" | "type_identifier") {
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
        if matches!(n.kind(), "method_definition" | "function_declaration") {
            let mut cursor = n.walk();
            for c in n.children(&mut cursor) {
                if matches!(c.kind(), "identifier" | "property_identifier") {
                    return Some(node_text(c, source).to_string());
                }
            }
        }
        if n.kind() == "variable_declarator" {
            let mut cursor = n.walk();
            for c in n.children(&mut cursor) {
                if c.kind() == "identifier" {
                    return Some(node_text(c, source).to_string());
                }
            }
        }
        current = n.parent();
    }
    None
}
