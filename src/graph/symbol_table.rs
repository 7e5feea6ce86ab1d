//! Dual index: `file_index` (file -> name -> symbol_id, last-definition-per-file-wins)
//! and `global_index` (name -> all definitions, insertion order preserved) for fuzzy
//! lookup. Grounded on `graph/symbol_table.py`.

use std::collections::HashMap;

use crate::config::Symbol;

/// Lightweight record stored in the global index — just enough to resolve a call
/// without cloning the full [`Symbol`].
#[derive(Debug, Clone)]
pub struct SymbolDefinition {
    pub symbol_id: String,
    pub name: String,
    pub file: String,
    pub symbol_type: String,
    pub language: Option<String>,
}

#[derive(Debug, Default)]
pub struct SymbolTable {
    file_index: HashMap<String, HashMap<String, String>>,
    global_index: HashMap<String, Vec<SymbolDefinition>>,
}

impl SymbolTable {
    pub fn new() -> Self {
        SymbolTable::default()
    }

    pub fn add(&mut self, symbol: &Symbol) {
        self.file_index
            .entry(symbol.file.clone())
            .or_default()
            .insert(symbol.name.clone(), symbol.id.clone());

        let defn = SymbolDefinition {
            symbol_id: symbol.id.clone(),
            name: symbol.name.clone(),
            file: symbol.file.clone(),
            symbol_type: format!("{:?}", symbol.kind),
            language: symbol.language.clone(),
        };
        self.global_index.entry(symbol.name.clone()).or_default().push(defn);
    }

    /// Exact lookup: symbol named `name` defined directly in `file_path`.
    pub fn lookup_exact(&self, file_path: &str, name: &str) -> Option<String> {
        self.file_index.get(file_path)?.get(name).cloned()
    }

    /// Fuzzy lookup: every definition of `name` anywhere in the codebase, in
    /// insertion order.
    pub fn lookup_fuzzy(&self, name: &str) -> Vec<SymbolDefinition> {
        self.global_index.get(name).cloned().unwrap_or_default()
    }

    pub fn symbols_in_file(&self, file_path: &str) -> HashMap<String, String> {
        self.file_index.get(file_path).cloned().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{SymbolKind, Visibility};

    fn sym(id: &str, name: &str, file: &str) -> Symbol {
        Symbol {
            id: id.to_string(),
            name: name.to_string(),
            kind: SymbolKind::Function,
            file: file.to_string(),
            line: 1,
            visibility: Visibility::Public,
            exported: true,
            parent: None,
            language: Some("py".to_string()),
            byte_range: None,
            parameter_types: None,
        }
    }

    #[test]
    fn exact_lookup_finds_same_file_definition() {
        let mut table = SymbolTable::new();
        table.add(&sym("sym_0001", "foo", "a.py"));
        assert_eq!(table.lookup_exact("a.py", "foo"), Some("sym_0001".to_string()));
        assert_eq!(table.lookup_exact("b.py", "foo"), None);
    }

    #[test]
    fn later_definition_in_same_file_overwrites_earlier() {
        let mut table = SymbolTable::new();
        table.add(&sym("sym_0001", "foo", "a.py"));
        table.add(&sym("sym_0002", "foo", "a.py"));
        assert_eq!(table.lookup_exact("a.py", "foo"), Some("sym_0002".to_string()));
    }

    #[test]
    fn fuzzy_lookup_returns_all_definitions_in_insertion_order() {
        let mut table = SymbolTable::new();
        table.add(&sym("sym_0001", "foo", "a.py"));
        table.add(&sym("sym_0002", "foo", "b.py"));
        let defs = table.lookup_fuzzy("foo");
        assert_eq!(defs.len(), 2);
        assert_eq!(defs[0].symbol_id, "sym_0001");
        assert_eq!(defs[1].symbol_id, "sym_0002");
    }
}
