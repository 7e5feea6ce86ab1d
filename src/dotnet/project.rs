//! Parse `.csproj`/`.vbproj` files (MSBuild XML). Grounded on `dotnet/project.py`.

use std::path::Path;

use roxmltree::Document;

/// Parsed information from a `.csproj`/`.vbproj` file.
#[derive(Debug, Clone, Default)]
pub struct ProjectInfo {
    pub path: String,
    pub root_namespace: String,
    pub assembly_name: String,
    pub target_framework: String,
    pub project_references: Vec<String>,
    pub package_references: Vec<(String, String)>,
}

/// Parse a `.csproj`/`.vbproj` file, tolerating both SDK-style and legacy formats.
/// Returns a mostly-empty [`ProjectInfo`] (just the derived name defaults) if the
/// file cannot be read or parsed.
pub fn parse_project(project_path: &str) -> ProjectInfo {
    let mut info = ProjectInfo {
        path: project_path.to_string(),
        ..Default::default()
    };

    let project_name = Path::new(project_path)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("")
        .to_string();

    let Ok(content) = std::fs::read_to_string(project_path) else {
        info.root_namespace = project_name.clone();
        info.assembly_name = project_name;
        return info;
    };
    let Ok(doc) = Document::parse(&content) else {
        info.root_namespace = project_name.clone();
        info.assembly_name = project_name;
        return info;
    };

    for pg in doc.descendants().filter(|n| n.has_tag_name("PropertyGroup")) {
        if let Some(text) = child_text(pg, "RootNamespace") {
            info.root_namespace = text;
        }
        if let Some(text) = child_text(pg, "AssemblyName") {
            info.assembly_name = text;
        }
        if let Some(text) = child_text(pg, "TargetFramework") {
            info.target_framework = text;
        }
        if info.target_framework.is_empty() {
            if let Some(text) = child_text(pg, "TargetFrameworks") {
                if let Some(first) = text.split(';').next() {
                    info.target_framework = first.to_string();
                }
            }
        }
    }

    for pr in doc.descendants().filter(|n| n.has_tag_name("ProjectReference")) {
        if let Some(include) = pr.attribute("Include") {
            if !include.is_empty() {
                info.project_references.push(include.replace('\\', "/"));
            }
        }
    }

    for pkg in doc.descendants().filter(|n| n.has_tag_name("PackageReference")) {
        let name = pkg.attribute("Include").unwrap_or("").to_string();
        let mut version = pkg.attribute("Version").unwrap_or("").to_string();
        if version.is_empty() {
            if let Some(text) = child_text(pkg, "Version") {
                version = text;
            }
        }
        if !name.is_empty() {
            info.package_references.push((name, version));
        }
    }

    if info.root_namespace.is_empty() {
        info.root_namespace = project_name.clone();
    }
    if info.assembly_name.is_empty() {
        info.assembly_name = project_name;
    }

    info
}

fn child_text(node: roxmltree::Node, tag: &str) -> Option<String> {
    node.children()
        .find(|c| c.has_tag_name(tag))
        .and_then(|c| c.text())
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parses_sdk_style_project() {
        let mut file = tempfile::Builder::new().suffix(".csproj").tempfile().unwrap();
        write!(
            file,
            r#"<Project Sdk="Microsoft.NET.Sdk">
                <PropertyGroup>
                    <TargetFramework>net8.0</TargetFramework>
                    <RootNamespace>Acme.Services</RootNamespace>
                </PropertyGroup>
                <ItemGroup>
                    <ProjectReference Include="..\Acme.Core\Acme.Core.csproj" />
                    <PackageReference Include="Newtonsoft.Json" Version="13.0.1" />
                </ItemGroup>
            </Project>"#
        )
        .unwrap();
        let info = parse_project(file.path().to_str().unwrap());
        assert_eq!(info.root_namespace, "Acme.Services");
        assert_eq!(info.target_framework, "net8.0");
        assert_eq!(info.project_references, vec!["../Acme.Core/Acme.Core.csproj"]);
        assert_eq!(info.package_references, vec![("Newtonsoft.Json".to_string(), "13.0.1".to_string())]);
    }

    #[test]
    fn missing_file_falls_back_to_derived_name() {
        let info = parse_project("/nonexistent/Acme.Widgets.csproj");
        assert_eq!(info.root_namespace, "Acme.Widgets");
        assert_eq!(info.assembly_name, "Acme.Widgets");
    }
}
