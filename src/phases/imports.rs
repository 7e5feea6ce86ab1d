//! Phase 3: import/dependency resolution — `.sln`/`.csproj` project and package
//! references, then per-language source import resolution to file targets.
//! Grounded on `phases/imports.py`.

use std::collections::HashMap;
use std::path::Path;

use crate::config::{AnalysisConfig, ImportEdge, PackageReference, ProjectReference};
use crate::dotnet::{parse_project, parse_solution};
use crate::graph::KnowledgeGraph;
use crate::graph::assembly_mapper::AssemblyMapper;
use crate::graph::namespace_index::NamespaceIndex;
use crate::graph::symbol_table::SymbolTable;
use crate::languages::{analyser_for_extension, parse_with_thread_local};

const PROJECT_REFERENCE_TYPE: &str = "project_reference";

/// Resolve file imports, project references, and package references.
pub fn run(
    config: &AnalysisConfig,
    kg: &mut KnowledgeGraph,
    st: &SymbolTable,
    mut ns_index: Option<&mut NamespaceIndex>,
) {
    let mut assembly_mapper = AssemblyMapper::new();

    process_dotnet_projects(config, kg, &mut assembly_mapper);
    register_observed_namespaces(kg, &mut assembly_mapper);
    process_source_imports(config, kg, st, &assembly_mapper, ns_index.as_deref_mut());
}

fn process_dotnet_projects(config: &AnalysisConfig, kg: &mut KnowledgeGraph, assembly_mapper: &mut AssemblyMapper) {
    let repo_root = &config.repo_path;

    let mut sln_files = Vec::new();
    let mut project_files = Vec::new();
    for file in kg.files() {
        if file.path.ends_with(".sln") {
            sln_files.push(file.path);
        } else if file.path.ends_with(".csproj") || file.path.ends_with(".vbproj") {
            project_files.push(file.path);
        }
    }

    // Solutions are parsed purely to discover/log projects; they don't feed
    // downstream resolution beyond what the .csproj/.vbproj files themselves provide.
    for sln_path in &sln_files {
        let full_sln_path = repo_root.join(sln_path);
        let _ = parse_solution(&full_sln_path.to_string_lossy());
    }

    for proj_path in &project_files {
        let full_proj_path = repo_root.join(proj_path);
        let info = parse_project(&full_proj_path.to_string_lossy());

        if !info.root_namespace.is_empty() {
            assembly_mapper.register_namespace(&info.root_namespace, proj_path);
        }

        for ref_path in &info.project_references {
            let proj_dir = Path::new(proj_path).parent().unwrap_or_else(|| Path::new(""));
            let resolved = normalize_path(&proj_dir.join(ref_path));
            let rel_resolved = relative_to(&resolved, repo_root);
            kg.add_project_reference(ProjectReference {
                from: proj_path.clone(),
                to: rel_resolved,
                ref_type: PROJECT_REFERENCE_TYPE.to_string(),
            });
        }

        for (pkg_name, pkg_version) in &info.package_references {
            kg.add_package_reference(PackageReference {
                project: proj_path.clone(),
                package: pkg_name.clone(),
                version: pkg_version.clone(),
            });
        }
    }
}

fn register_observed_namespaces(kg: &KnowledgeGraph, assembly_mapper: &mut AssemblyMapper) {
    use crate::config::SymbolKind;

    let project_files: Vec<String> = kg
        .files()
        .into_iter()
        .map(|f| f.path)
        .filter(|p| p.ends_with(".csproj") || p.ends_with(".vbproj"))
        .collect();

    for symbol in kg.symbols() {
        if symbol.kind != SymbolKind::Namespace {
            continue;
        }
        if let Some(project) = find_project_for_file(&symbol.file, &project_files) {
            assembly_mapper.register_namespace(&symbol.name, project);
        }
    }
}

fn find_project_for_file<'a>(file_path: &str, project_files: &'a [String]) -> Option<&'a str> {
    let file_dir = Path::new(file_path).parent().map(|p| p.to_string_lossy().to_string()).unwrap_or_default();
    for path in project_files {
        let proj_dir = Path::new(path).parent().map(|p| p.to_string_lossy().to_string()).unwrap_or_default();
        if file_dir.starts_with(&proj_dir) || proj_dir.is_empty() {
            return Some(path);
        }
    }
    None
}

fn process_source_imports(
    config: &AnalysisConfig,
    kg: &mut KnowledgeGraph,
    st: &SymbolTable,
    assembly_mapper: &AssemblyMapper,
    mut ns_index: Option<&mut NamespaceIndex>,
) {
    let repo_root = &config.repo_path;
    let files = kg.files();
    let file_set: std::collections::HashSet<String> = files.iter().map(|f| f.path.clone()).collect();

    let go_module = parse_go_mod(&file_set, repo_root);
    let go_dir_index = if go_module.is_some() { build_go_dir_index(&file_set) } else { HashMap::new() };

    let mut java_basename_index: HashMap<String, Vec<String>> = HashMap::new();
    for path in &file_set {
        if path.ends_with(".java") {
            if let Some(basename) = Path::new(path).file_name().and_then(|n| n.to_str()) {
                java_basename_index.entry(basename.to_string()).or_default().push(path.clone());
            }
        }
    }

    for file in &files {
        let Some(language) = file.language.as_deref() else { continue };
        let file_path = &file.path;
        let ext = Path::new(file_path).extension().and_then(|e| e.to_str()).unwrap_or("").to_lowercase();

        if let Some(allowed) = config.languages.as_ref() {
            if !allowed.iter().any(|l| l == language) {
                continue;
            }
        }

        let Some(analyser) = analyser_for_extension(&ext) else { continue };

        let full_path = repo_root.join(file_path);
        let Ok(source) = std::fs::read(&full_path) else { continue };
        let Some(tree) = parse_with_thread_local(&ext, &source) else { continue };
        let imports = analyser.extract_imports(&tree, &source, file_path);

        for imp in &imports {
            if let Some(ns_index) = ns_index.as_deref_mut() {
                if language == "cs" || language == "vb" {
                    let ns_files = ns_index.files_for_namespace(&imp.target_name);
                    if !ns_files.is_empty() {
                        ns_index.register_file_import(file_path, &imp.target_name);
                        for target in &ns_files {
                            if target != file_path {
                                kg.add_import(ImportEdge {
                                    from: file_path.clone(),
                                    to: target.clone(),
                                    statement: imp.statement.clone(),
                                });
                            }
                        }
                        continue;
                    }
                }
            }

            if language == "py" {
                if let Some(target) = resolve_python_import(&imp.target_name, file_path, &file_set) {
                    if target != *file_path {
                        kg.add_import(ImportEdge { from: file_path.clone(), to: target, statement: imp.statement.clone() });
                    }
                }
                continue;
            }

            if language == "ts" {
                if let Some(target) = resolve_ts_import(&imp.target_name, file_path, &file_set) {
                    if target != *file_path {
                        kg.add_import(ImportEdge { from: file_path.clone(), to: target, statement: imp.statement.clone() });
                    }
                }
                continue;
            }

            if language == "java" {
                if let Some(target) = resolve_java_import(&imp.target_name, file_path, &file_set, &java_basename_index) {
                    if target != *file_path {
                        kg.add_import(ImportEdge { from: file_path.clone(), to: target, statement: imp.statement.clone() });
                    }
                }
                continue;
            }

            if language == "go" {
                for target in resolve_go_import(&imp.target_name, go_module.as_deref(), &go_dir_index) {
                    if target != *file_path {
                        kg.add_import(ImportEdge { from: file_path.clone(), to: target, statement: imp.statement.clone() });
                    }
                }
                continue;
            }

            if language == "rust" {
                if let Some(target) = resolve_rust_import(&imp.target_name, file_path, &file_set) {
                    if target != *file_path {
                        kg.add_import(ImportEdge { from: file_path.clone(), to: target, statement: imp.statement.clone() });
                    }
                }
                continue;
            }

            if language == "c" || language == "cpp" {
                if let Some(target) = resolve_c_include(&imp.target_name, &imp.statement, file_path, &file_set) {
                    if target != *file_path {
                        kg.add_import(ImportEdge { from: file_path.clone(), to: target, statement: imp.statement.clone() });
                    }
                }
                continue;
            }

            // Fallback for any remaining language.
            if let Some(target) = resolve_import_fallback(&imp.target_name, st, assembly_mapper, &files) {
                if target != *file_path {
                    kg.add_import(ImportEdge { from: file_path.clone(), to: target, statement: imp.statement.clone() });
                    if let Some(ns_index) = ns_index.as_deref_mut() {
                        if language == "cs" || language == "vb" {
                            ns_index.register_file_import(file_path, &imp.target_name);
                        }
                    }
                }
            }
        }
    }
}

fn normalize_path(path: &Path) -> std::path::PathBuf {
    let mut result = std::path::PathBuf::new();
    for component in path.components() {
        use std::path::Component;
        match component {
            Component::ParentDir => {
                result.pop();
            }
            Component::CurDir => {}
            other => result.push(other.as_os_str()),
        }
    }
    result
}

fn relative_to(path: &Path, base: &Path) -> String {
    let path_str = path.to_string_lossy().replace('\\', "/");
    let base_str = base.to_string_lossy().replace('\\', "/");
    path_str.strip_prefix(&format!("{base_str}/")).map(|s| s.to_string()).unwrap_or(path_str)
}

fn resolve_python_import(target_name: &str, source_file: &str, file_set: &std::collections::HashSet<String>) -> Option<String> {
    if target_name.starts_with('.') {
        return resolve_python_relative(target_name, source_file, file_set);
    }
    let path = target_name.replace('.', "/");
    let candidate = format!("{path}.py");
    if file_set.contains(&candidate) {
        return Some(candidate);
    }
    let candidate = format!("{path}/__init__.py");
    if file_set.contains(&candidate) {
        return Some(candidate);
    }
    None
}

fn resolve_python_relative(target_name: &str, source_file: &str, file_set: &std::collections::HashSet<String>) -> Option<String> {
    let dots = target_name.chars().take_while(|&c| c == '.').count();
    let remainder = &target_name[dots..];

    let mut base = Path::new(source_file).parent().map(|p| p.to_string_lossy().to_string()).unwrap_or_default();
    for _ in 0..dots.saturating_sub(1) {
        base = Path::new(&base).parent().map(|p| p.to_string_lossy().to_string()).unwrap_or_default();
    }

    if base.is_empty() && remainder.is_empty() {
        return None;
    }

    let path = if !remainder.is_empty() {
        let rem_path = remainder.replace('.', "/");
        if base.is_empty() { rem_path } else { format!("{base}/{rem_path}") }
    } else {
        if !base.is_empty() {
            let candidate = format!("{base}/__init__.py");
            if file_set.contains(&candidate) {
                return Some(candidate);
            }
        }
        return None;
    };
    let path = path.replace('\\', "/");

    let candidate = format!("{path}.py");
    if file_set.contains(&candidate) {
        return Some(candidate);
    }
    let candidate = format!("{path}/__init__.py");
    if file_set.contains(&candidate) {
        return Some(candidate);
    }
    None
}

fn resolve_ts_import(target_name: &str, source_file: &str, file_set: &std::collections::HashSet<String>) -> Option<String> {
    if !(target_name.starts_with("./") || target_name.starts_with("../")) {
        return None;
    }
    let source_dir = Path::new(source_file).parent().unwrap_or_else(|| Path::new(""));
    let resolved = normalize_path(&source_dir.join(target_name)).to_string_lossy().replace('\\', "/");

    if file_set.contains(&resolved) {
        return Some(resolved);
    }
    for ext in [".ts", ".tsx", ".js", ".jsx"] {
        let candidate = format!("{resolved}{ext}");
        if file_set.contains(&candidate) {
            return Some(candidate);
        }
    }
    for ext in [".ts", ".tsx", ".js", ".jsx"] {
        let candidate = format!("{resolved}/index{ext}");
        if file_set.contains(&candidate) {
            return Some(candidate);
        }
    }
    None
}

fn resolve_java_import(
    target_name: &str,
    source_file: &str,
    file_set: &std::collections::HashSet<String>,
    basename_index: &HashMap<String, Vec<String>>,
) -> Option<String> {
    let path = format!("{}.java", target_name.replace('.', "/"));
    if file_set.contains(&path) {
        return Some(path);
    }
    let class_name = target_name.rsplit('.').next().unwrap_or(target_name);
    let basename = format!("{class_name}.java");
    if let Some(candidates) = basename_index.get(&basename) {
        for candidate in candidates {
            if candidate != source_file {
                return Some(candidate.clone());
            }
        }
    }
    None
}

fn parse_go_mod(file_set: &std::collections::HashSet<String>, repo_root: &Path) -> Option<String> {
    let go_mod_path = file_set.iter().find(|p| Path::new(p).file_name().and_then(|n| n.to_str()) == Some("go.mod"))?;
    let full = repo_root.join(go_mod_path);
    let content = std::fs::read_to_string(full).ok()?;
    for line in content.lines() {
        let line = line.trim();
        if let Some(rest) = line.strip_prefix("module ") {
            return Some(rest.trim().to_string());
        }
    }
    None
}

fn build_go_dir_index(file_set: &std::collections::HashSet<String>) -> HashMap<String, Vec<String>> {
    let mut index: HashMap<String, Vec<String>> = HashMap::new();
    for path in file_set {
        if path.ends_with(".go") {
            let dir = Path::new(path).parent().map(|p| p.to_string_lossy().to_string()).unwrap_or_default();
            index.entry(dir).or_default().push(path.clone());
        }
    }
    index
}

fn resolve_go_import(target_name: &str, go_module: Option<&str>, go_dir_index: &HashMap<String, Vec<String>>) -> Vec<String> {
    let Some(go_module) = go_module else { return Vec::new() };
    if !target_name.contains('/') {
        return Vec::new();
    }
    let Some(rel_dir) = target_name.strip_prefix(go_module) else { return Vec::new() };
    let rel_dir = rel_dir.strip_prefix('/').unwrap_or(rel_dir);
    go_dir_index.get(rel_dir).cloned().unwrap_or_default()
}

const RUST_EXTERNAL_PREFIXES: &[&str] = &["std::", "core::", "alloc::"];

fn resolve_rust_import(target_name: &str, source_file: &str, file_set: &std::collections::HashSet<String>) -> Option<String> {
    if RUST_EXTERNAL_PREFIXES.iter().any(|p| target_name.starts_with(p)) {
        return None;
    }

    let source_dir = Path::new(source_file).parent().map(|p| p.to_string_lossy().to_string()).unwrap_or_default();

    let (remainder, base) = if let Some(rest) = target_name.strip_prefix("crate::") {
        (rest.to_string(), String::new())
    } else if target_name.starts_with("super::") {
        let mut remainder = target_name.to_string();
        let mut base = source_dir;
        while let Some(rest) = remainder.strip_prefix("super::") {
            remainder = rest.to_string();
            base = Path::new(&base).parent().map(|p| p.to_string_lossy().to_string()).unwrap_or_default();
        }
        (remainder, base)
    } else if let Some(rest) = target_name.strip_prefix("self::") {
        (rest.to_string(), source_dir)
    } else {
        (target_name.to_string(), source_dir)
    };

    let segments: Vec<&str> = remainder.split("::").collect();

    for end in (1..=segments.len()).rev() {
        let rel_path = segments[..end].join("/");
        let full_rel = if base.is_empty() { rel_path } else { format!("{base}/{rel_path}") };
        let full_rel = full_rel.replace('\\', "/");

        let candidate = format!("{full_rel}.rs");
        if file_set.contains(&candidate) {
            return Some(candidate);
        }
        let candidate = format!("{full_rel}/mod.rs");
        if file_set.contains(&candidate) {
            return Some(candidate);
        }
    }
    None
}

fn resolve_c_include(target_name: &str, statement: &str, source_file: &str, file_set: &std::collections::HashSet<String>) -> Option<String> {
    if statement.contains('<') {
        return None;
    }

    let source_dir = Path::new(source_file).parent().map(|p| p.to_string_lossy().to_string()).unwrap_or_default();
    let candidate = if !source_dir.is_empty() {
        normalize_path(Path::new(&format!("{source_dir}/{target_name}"))).to_string_lossy().replace('\\', "/")
    } else {
        target_name.to_string()
    };
    if file_set.contains(&candidate) {
        return Some(candidate);
    }

    let candidate = normalize_path(Path::new(target_name)).to_string_lossy().replace('\\', "/");
    if file_set.contains(&candidate) {
        return Some(candidate);
    }
    None
}

fn resolve_import_fallback(
    target_name: &str,
    st: &SymbolTable,
    assembly_mapper: &AssemblyMapper,
    files: &[crate::config::FileNode],
) -> Option<String> {
    let matches = st.lookup_fuzzy(target_name);
    if let Some(first) = matches.first() {
        return Some(first.file.clone());
    }

    let project = assembly_mapper.resolve_namespace(target_name)?;
    let proj_dir = Path::new(&project).parent().map(|p| p.to_string_lossy().to_string()).unwrap_or_default();
    for file in files {
        if !(file.path.ends_with(".cs") || file.path.ends_with(".vb")) {
            continue;
        }
        if file.path.starts_with(&proj_dir) || proj_dir.is_empty() {
            if !st.symbols_in_file(&file.path).is_empty() {
                return Some(file.path.clone());
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FileNode;

    #[test]
    fn resolves_python_dotted_import_to_file() {
        let mut file_set = std::collections::HashSet::new();
        file_set.insert("app/config/settings.py".to_string());
        let target = resolve_python_import("app.config.settings", "app/main.py", &file_set);
        assert_eq!(target, Some("app/config/settings.py".to_string()));
    }

    #[test]
    fn resolves_relative_ts_import_with_extension_probing() {
        let mut file_set = std::collections::HashSet::new();
        file_set.insert("src/utils/helpers.ts".to_string());
        let target = resolve_ts_import("../utils/helpers", "src/components/widget.ts", &file_set);
        assert_eq!(target, Some("src/utils/helpers.ts".to_string()));
    }

    #[test]
    fn bare_ts_specifier_is_external() {
        let file_set = std::collections::HashSet::new();
        assert_eq!(resolve_ts_import("react", "src/widget.ts", &file_set), None);
    }

    #[test]
    fn resolves_rust_crate_path_with_progressive_shortening() {
        let mut file_set = std::collections::HashSet::new();
        file_set.insert("src/service.rs".to_string());
        let target = resolve_rust_import("crate::service::DataService", "src/main.rs", &file_set);
        assert_eq!(target, Some("src/service.rs".to_string()));
    }

    #[test]
    fn rust_stdlib_path_is_external() {
        let file_set = std::collections::HashSet::new();
        assert_eq!(resolve_rust_import("std::collections::HashMap", "src/main.rs", &file_set), None);
    }

    #[test]
    fn resolves_go_import_within_module() {
        let mut go_dir_index = HashMap::new();
        go_dir_index.insert("internal/util".to_string(), vec!["internal/util/helpers.go".to_string()]);
        let targets = resolve_go_import("example.com/app/internal/util", Some("example.com/app"), &go_dir_index);
        assert_eq!(targets, vec!["internal/util/helpers.go".to_string()]);
    }

    #[test]
    fn go_stdlib_import_has_no_targets() {
        let go_dir_index = HashMap::new();
        assert!(resolve_go_import("fmt", Some("example.com/app"), &go_dir_index).is_empty());
    }

    #[test]
    fn resolves_c_include_relative_to_source_dir() {
        let mut file_set = std::collections::HashSet::new();
        file_set.insert("src/util.h".to_string());
        let target = resolve_c_include("util.h", "#include \"util.h\"", "src/main.c", &file_set);
        assert_eq!(target, Some("src/util.h".to_string()));
    }

    #[test]
    fn system_c_include_is_external() {
        let file_set = std::collections::HashSet::new();
        assert_eq!(resolve_c_include("stdio.h", "#include <stdio.h>", "src/main.c", &file_set), None);
    }

    #[test]
    fn project_reference_resolves_relative_to_project_dir() {
        let mut config = AnalysisConfig::default();
        let tmp = tempfile::TempDir::new().unwrap();
        config.repo_path = tmp.path().to_path_buf();

        std::fs::create_dir_all(tmp.path().join("Acme.Services")).unwrap();
        std::fs::create_dir_all(tmp.path().join("Acme.Core")).unwrap();
        std::fs::write(
            tmp.path().join("Acme.Services/Acme.Services.csproj"),
            r#"<Project Sdk="Microsoft.NET.Sdk">
                <PropertyGroup><RootNamespace>Acme.Services</RootNamespace></PropertyGroup>
                <ItemGroup><ProjectReference Include="..\Acme.Core\Acme.Core.csproj" /></ItemGroup>
            </Project>"#,
        )
        .unwrap();
        std::fs::write(tmp.path().join("Acme.Core/Acme.Core.csproj"), "<Project></Project>").unwrap();

        let mut kg = KnowledgeGraph::new();
        kg.add_file(FileNode { path: "Acme.Services/Acme.Services.csproj".into(), language: None, size: 1, lines: 0 });
        kg.add_file(FileNode { path: "Acme.Core/Acme.Core.csproj".into(), language: None, size: 1, lines: 0 });

        let st = SymbolTable::new();
        run(&config, &mut kg, &st, None);

        let refs = kg.project_references();
        assert!(refs.iter().any(|r| r.from == "Acme.Services/Acme.Services.csproj" && r.to == "Acme.Core/Acme.Core.csproj"));
    }
}
