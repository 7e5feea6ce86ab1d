//! `.NET`-specific namespace index: which files declare a namespace, and which
//! namespaces a file imports. Grounded on `graph/namespace_index.py`; used only by
//! the C# and VB.NET import-resolution path.

use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct NamespaceIndex {
    ns_to_files: HashMap<String, Vec<String>>,
    file_to_ns: HashMap<String, Vec<String>>,
    file_imports: HashMap<String, Vec<String>>,
}

impl NamespaceIndex {
    pub fn new() -> Self {
        NamespaceIndex::default()
    }

    /// Record that `file_path` declares `namespace`.
    pub fn register(&mut self, namespace: &str, file_path: &str) {
        let files = self.ns_to_files.entry(namespace.to_string()).or_default();
        if !files.iter().any(|f| f == file_path) {
            files.push(file_path.to_string());
        }
        let namespaces = self.file_to_ns.entry(file_path.to_string()).or_default();
        if !namespaces.iter().any(|n| n == namespace) {
            namespaces.push(namespace.to_string());
        }
    }

    pub fn files_for_namespace(&self, namespace: &str) -> Vec<String> {
        self.ns_to_files.get(namespace).cloned().unwrap_or_default()
    }

    /// Record that `file_path` has a `using`/`Imports` statement for `namespace`.
    pub fn register_file_import(&mut self, file_path: &str, namespace: &str) {
        let namespaces = self.file_imports.entry(file_path.to_string()).or_default();
        if !namespaces.iter().any(|n| n == namespace) {
            namespaces.push(namespace.to_string());
        }
    }

    pub fn imported_namespaces(&self, file_path: &str) -> Vec<String> {
        self.file_imports.get(file_path).cloned().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_is_idempotent_and_bidirectional() {
        let mut idx = NamespaceIndex::new();
        idx.register("Acme.Services", "Services/Foo.cs");
        idx.register("Acme.Services", "Services/Foo.cs");
        idx.register("Acme.Services", "Services/Bar.cs");
        assert_eq!(idx.files_for_namespace("Acme.Services").len(), 2);
        assert_eq!(idx.file_to_ns.get("Services/Foo.cs").unwrap().len(), 1);
    }

    #[test]
    fn file_imports_are_tracked_separately_from_declarations() {
        let mut idx = NamespaceIndex::new();
        idx.register("Acme.Services", "Services/Foo.cs");
        idx.register_file_import("Controllers/Baz.cs", "Acme.Services");
        assert_eq!(idx.imported_namespaces("Controllers/Baz.cs"), vec!["Acme.Services"]);
        assert!(idx.imported_namespaces("Services/Foo.cs").is_empty());
    }
}
