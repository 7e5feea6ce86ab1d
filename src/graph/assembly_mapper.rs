//! Namespace-to-project mapping for cross-project `.NET` call/import resolution.
//! Seeded from `<RootNamespace>` in `.csproj`/`.vbproj` files, then supplemented by
//! namespace declarations observed in source. Grounded on `dotnet/assembly.py`.

use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct AssemblyMapper {
    namespace_map: HashMap<String, String>,
}

impl AssemblyMapper {
    pub fn new() -> Self {
        AssemblyMapper::default()
    }

    pub fn register_namespace(&mut self, namespace: &str, project_path: &str) {
        self.namespace_map.insert(namespace.to_string(), project_path.to_string());
    }

    /// Resolve a namespace to the project that owns it: exact match first, then the
    /// longest registered prefix that ends at a dot boundary.
    pub fn resolve_namespace(&self, namespace: &str) -> Option<String> {
        if let Some(project) = self.namespace_map.get(namespace) {
            return Some(project.clone());
        }

        let mut best: Option<(&str, &str)> = None;
        for (ns, project) in &self.namespace_map {
            if namespace.starts_with(ns.as_str()) {
                let boundary_ok = namespace.len() == ns.len()
                    || namespace.as_bytes().get(ns.len()) == Some(&b'.');
                if boundary_ok {
                    if best.map_or(true, |(b, _)| ns.len() > b.len()) {
                        best = Some((ns.as_str(), project.as_str()));
                    }
                }
            }
        }
        best.map(|(_, project)| project.to_string())
    }

    pub fn all_namespaces(&self) -> HashMap<String, String> {
        self.namespace_map.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_match_wins_over_prefix() {
        let mut mapper = AssemblyMapper::new();
        mapper.register_namespace("Absence", "Absence.csproj");
        mapper.register_namespace("Absence.Services", "Absence.Services.csproj");
        assert_eq!(
            mapper.resolve_namespace("Absence.Services").as_deref(),
            Some("Absence.Services.csproj")
        );
    }

    #[test]
    fn longest_prefix_at_dot_boundary_wins() {
        let mut mapper = AssemblyMapper::new();
        mapper.register_namespace("Absence", "Absence.csproj");
        assert_eq!(
            mapper.resolve_namespace("Absence.Services.Internal").as_deref(),
            Some("Absence.csproj")
        );
    }

    #[test]
    fn prefix_must_land_on_dot_boundary() {
        let mut mapper = AssemblyMapper::new();
        mapper.register_namespace("Abs", "Abs.csproj");
        assert_eq!(mapper.resolve_namespace("Absence.Services"), None);
    }

    #[test]
    fn unregistered_namespace_resolves_to_none() {
        let mapper = AssemblyMapper::new();
        assert_eq!(mapper.resolve_namespace("Unknown.Namespace"), None);
    }
}
