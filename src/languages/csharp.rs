//! C# analyser. Grounded on `languages/csharp.py`. The only analyser that also
//! populates `parameter_types` on constructors, feeding the calls phase's
//! dependency-injection field-type tracking.

use tree_sitter::{Language, Node, Tree};

use crate::config::{DraftSymbol, ImportStatement, ParameterType, RawCall, SymbolKind, Visibility};

use super::{LanguageAnalyser, node_text};

pub struct CSharpAnalyser;

const CONTAINER_TYPES: &[&str] = &[
    "class_declaration", "interface_declaration", "struct_declaration",
    "record_declaration", "namespace_declaration",
];

const BUILTIN_EXCLUSIONS: &[&str] = &[
    "Task", "ValueTask", "Console.WriteLine", "Console.ReadLine", "Console.Write",
    "Console.ReadKey", "Console.Clear", "String.Format", "String.IsNullOrEmpty",
    "String.IsNullOrWhiteSpace", "String.Join", "String.Concat", "String.Compare",
    "string.Format", "string.IsNullOrEmpty", "string.IsNullOrWhiteSpace", "string.Join",
    "string.Concat", "string.Compare", "Convert.ToInt32", "Convert.ToString",
    "Convert.ToDecimal", "Convert.ToDouble", "Convert.ToBoolean", "Convert.ToDateTime",
    "Math.Abs", "Math.Max", "Math.Min", "Math.Round", "Math.Floor", "Math.Ceiling",
    "Math.Pow", "Math.Sqrt", "ToString", "Equals", "GetHashCode", "GetType",
    "Debug.WriteLine", "Debug.Assert", "Debug.Print", "Trace.WriteLine",
    "Trace.TraceInformation", "GC.Collect", "GC.SuppressFinalize", "Task.Run",
    "Task.WhenAll", "Task.WhenAny", "Task.Delay", "Task.FromResult", "Task.CompletedTask",
    "Select", "Where", "FirstOrDefault", "First", "Last", "LastOrDefault",
    "SingleOrDefault", "Single", "Any", "All", "Count", "Sum", "Average", "Min", "Max",
    "OrderBy", "OrderByDescending", "GroupBy", "ToList", "ToArray", "ToDictionary",
    "AsEnumerable", "AsQueryable", "Skip", "Take", "Distinct", "Union", "Intersect",
    "Except", "Aggregate", "Zip", "SelectMany", "Contains", "Dispose", "Close",
];

fn type_for_kind(kind: &str) -> Option<SymbolKind> {
    match kind {
        "class_declaration" => Some(SymbolKind::Class),
        "interface_declaration" => Some(SymbolKind::Interface),
        "struct_declaration" => Some(SymbolKind::Struct),
        "enum_declaration" => Some(SymbolKind::Enum),
        "method_declaration" => Some(SymbolKind::Method),
        "constructor_declaration" => Some(SymbolKind::Constructor),
        "property_declaration" => Some(SymbolKind::Property),
        "namespace_declaration" => Some(SymbolKind::Namespace),
        "record_declaration" => Some(SymbolKind::Record),
        "delegate_declaration" => Some(SymbolKind::Delegate),
        _ => None,
    }
}

impl LanguageAnalyser for CSharpAnalyser {
    fn language_name(&self) -> &'static str {
        "cs"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["cs"]
    }

    fn ts_language(&self) -> Language {
        tree_sitter_c_sharp::LANGUAGE.into()
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
                "using_directive" => {
                    if let Some((target, statement)) = using_target(child, source) {
                        imports.push(ImportStatement {
                            file: file_path.to_string(),
                            statement,
                            target_name: target,
                            line: child.start_position().row + 1,
                        });
                    }
                }
                "namespace_declaration" | "file_scoped_namespace_declaration" => {
                    let mut ns_cursor = child.walk();
                    for ns_child in child.children(&mut ns_cursor) {
                        if ns_child.kind() == "declaration_list" {
                            let mut decl_cursor = ns_child.walk();
                            for decl_child in ns_child.children(&mut decl_cursor) {
                                if decl_child.kind() == "using_directive" {
                                    if let Some((target, statement)) = using_target(decl_child, source) {
                                        imports.push(ImportStatement {
                                            file: file_path.to_string(),
                                            statement,
                                            target_name: target,
                                            line: decl_child.start_position().row + 1,
                                        });
                                    }
                                }
                            }
                        }
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

fn using_target(node: Node, source: &[u8]) -> Option<(String, String)> {
    let mut name_node = None;
    let mut cursor = node.walk();
    for c in node.children(&mut cursor) {
        if matches!(c.kind(), "identifier" | "qualified_name" | "name") {
            name_node = Some(c);
            break;
        }
    }
    let name_node = name_node?;
    let target = node_text(name_node, source).to_string();
    let statement = node_text(node, source).trim_end_matches(';').trim().to_string();
    Some((target, statement))
}

fn get_name(node: Node, source: &[u8]) -> Option<String> {
    if let Some(name_node) = node.child_by_field_name("name") {
        return Some(node_text(name_node, source).to_string());
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if matches!(child.kind(), "identifier" | "qualified_name") {
            return Some(node_text(child, source).to_string());
        }
    }
    None
}

fn get_visibility(node: Node, source: &[u8]) -> Visibility {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() == "modifier" {
            match node_text(child, source).to_lowercase().as_str() {
                "public" => return Visibility::Public,
                "private" => return Visibility::Private,
                "internal" => return Visibility::Internal,
                "protected" => return Visibility::Protected,
                _ => {}
            }
        }
    }
    Visibility::Private
}

fn extract_parameter_types(node: Node, source: &[u8]) -> Option<Vec<ParameterType>> {
    let param_list = node.child_by_field_name("parameters")?;
    let mut params = Vec::new();
    let mut cursor = param_list.walk();
    for child in param_list.children(&mut cursor) {
        if child.kind() == "parameter" {
            if let (Some(type_node), Some(name_node)) =
                (child.child_by_field_name("type"), child.child_by_field_name("name"))
            {
                params.push((node_text(name_node, source).to_string(), node_text(type_node, source).to_string()));
            }
        }
    }
    if params.is_empty() { None } else { Some(params) }
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
            let mut visibility = get_visibility(child, source);
            if kind == SymbolKind::Namespace {
                visibility = Visibility::Unknown;
            }
            let exported = matches!(visibility, Visibility::Public | Visibility::Internal);
            let parameter_types = if child.kind() == "constructor_declaration" {
                extract_parameter_types(child, source)
            } else {
                None
            };

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
                parameter_types,
            });

            if CONTAINER_TYPES.contains(&child.kind()) {
                let mut decl_list = child.child_by_field_name("body");
                if decl_list.is_none() {
                    let mut inner = child.walk();
                    for c in child.children(&mut inner) {
                        if c.kind() == "declaration_list" {
                            decl_list = Some(c);
                            break;
                        }
                    }
                }
                if let Some(decl_list) = decl_list {
                    walk(decl_list, source, file_path, symbols, Some(name.clone()));
                }
            }
        } else if child.kind() == "file_scoped_namespace_declaration" {
            if let Some(name) = get_name(child, source) {
                symbols.push(DraftSymbol {
                    id: format!("_pending_{}", symbols.len()),
                    name: name.clone(),
                    kind: SymbolKind::Namespace,
                    file: file_path.to_string(),
                    line: child.start_position().row + 1,
                    visibility: Visibility::Unknown,
                    exported: true,
                    parent: parent_id.clone(),
                    byte_range: Some((child.start_byte(), child.end_byte())),
                    parameter_types: None,
                });
                walk(child, source, file_path, symbols, Some(name.clone()));
            }
        }
    }
}

fn find_calls(node: Node, source: &[u8], file_path: &str, calls: &mut Vec<RawCall>) {
    match node.kind() {
        "invocation_expression" => {
            if let Some((callee_name, qualifier)) = extract_callee(node, source) {
                if !BUILTIN_EXCLUSIONS.contains(&callee_name.as_str()) {
                    let qualified = qualifier
                        .as_ref()
                        .map(|q| format!("{}.{}", q, callee_name))
                        .unwrap_or_else(|| callee_name.clone());
                    if !BUILTIN_EXCLUSIONS.contains(&qualified.as_str()) {
                        let caller = find_enclosing_method(node, source).unwrap_or_else(|| "<module>".to_string());
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
            let mut callee_name = None;
            let mut cursor = node.walk();
            for child in node.children(&mut cursor) {
                if matches!(child.kind(), "identifier" | "qualified_name") {
                    callee_name = Some(node_text(child, source).to_string());
                    break;
                }
            }
            if let Some(callee_name) = callee_name {
                if !BUILTIN_EXCLUSIONS.contains(&callee_name.as_str()) {
                    let caller = find_enclosing_method(node, source).unwrap_or_else(|| "<module>".to_string());
                    calls.push(RawCall {
                        caller_file: file_path.to_string(),
                        caller_name: caller,
                        callee_name,
                        line: node.start_position().row + 1,
                        qualifier: None,
                    });
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
        "member_access_expression" => {
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
        "qualified_name" => {
            let text = node_text(first, source);
            if let Some(idx) = text.rfind('.') {
                Some((text[idx + 1..].to_string(), Some(text[..idx].to_string())))
            } else {
                Some((text.to_string(), None))
            }
        }
        _ => None,
    }
}

/// Walk up to the enclosing method/constructor/local-function, stopping (and
/// returning `None`) at property/event/operator/indexer boundaries so calls
/// inside accessors aren't misattributed to the outer declaration.
fn find_enclosing_method(node: Node, source: &[u8]) -> Option<String> {
    let mut current = node.parent();
    while let Some(n) = current {
        if matches!(n.kind(), "method_declaration" | "constructor_declaration" | "local_function_statement") {
            if let Some(name_node) = n.child_by_field_name("name") {
                return Some(node_text(name_node, source).to_string());
            }
            let mut cursor = n.walk();
            for child in n.children(&mut cursor) {
                if child.kind() == "identifier" {
                    return Some(node_text(child, source).to_string());
                }
            }
        }
        if matches!(n.kind(), "property_declaration" | "event_declaration" | "operator_declaration" | "indexer_declaration") {
            return None;
        }
        current = n.parent();
    }
    None
}
