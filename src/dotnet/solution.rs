//! Parse `.sln` files — a custom text format, not XML. Grounded on `dotnet/solution.py`.

use regex::Regex;
use std::sync::OnceLock;

/// A project entry from a `.sln` file.
#[derive(Debug, Clone)]
pub struct SolutionProject {
    pub type_guid: String,
    pub name: String,
    pub path: String,
    pub project_guid: String,
}

const SOLUTION_FOLDER_GUID: &str = "2150E333-8FDC-42A3-9474-1A3956D46DE8";

fn project_line_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?m)^Project\("\{([^}]+)\}"\)\s*=\s*"([^"]+)"\s*,\s*"([^"]+)"\s*,\s*"\{([^}]+)\}"#)
            .expect("static solution-project regex is valid")
    })
}

/// Parse a `.sln` file and return its project entries, excluding solution folders
/// (virtual grouping entries, not real projects).
pub fn parse_solution(sln_path: &str) -> Vec<SolutionProject> {
    let Ok(content) = std::fs::read_to_string(sln_path) else {
        return Vec::new();
    };
    let content = content.strip_prefix('\u{feff}').unwrap_or(&content);

    let mut projects = Vec::new();
    for caps in project_line_re().captures_iter(content) {
        let type_guid = caps[1].to_uppercase();
        if type_guid == SOLUTION_FOLDER_GUID {
            continue;
        }
        let name = caps[2].to_string();
        let path = caps[3].replace('\\', "/");
        let project_guid = caps[4].to_uppercase();
        projects.push(SolutionProject { type_guid, name, path, project_guid });
    }
    projects
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = "Microsoft Visual Studio Solution File, Format Version 12.00\r\n\
Project(\"{FAE04EC0-301F-11D3-BF4B-00C04F79EFBC}\") = \"Acme.Core\", \"Acme.Core\\Acme.Core.csproj\", \"{11111111-1111-1111-1111-111111111111}\"\r\nEndProject\r\n\
Project(\"{2150E333-8FDC-42A3-9474-1A3956D46DE8}\") = \"Solution Items\", \"Solution Items\", \"{22222222-2222-2222-2222-222222222222}\"\r\nEndProject\r\n";

    #[test]
    fn parses_project_lines_and_skips_solution_folders() {
        let mut file = tempfile::Builder::new().suffix(".sln").tempfile().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let projects = parse_solution(file.path().to_str().unwrap());
        assert_eq!(projects.len(), 1);
        assert_eq!(projects[0].name, "Acme.Core");
        assert_eq!(projects[0].path, "Acme.Core/Acme.Core.csproj");
    }

    #[test]
    fn missing_file_returns_empty() {
        assert!(parse_solution("/nonexistent.sln").is_empty());
    }
}
