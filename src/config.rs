//! Core data-model types shared across every phase, plus the analysis configuration
//! record that drives a single run.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// The kind of a symbol definition. `Template` is carried for forward compatibility
/// with C++ template symbols even though no shipped analyser currently emits it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolKind {
    Class,
    Interface,
    Struct,
    Enum,
    Record,
    Delegate,
    TypeAlias,
    Typedef,
    Module,
    Namespace,
    Trait,
    Impl,
    Macro,
    Function,
    Method,
    Constructor,
    Property,
    Constant,
    Static,
    Variable,
    Annotation,
    Template,
}

/// Visibility as inferred from modifier nodes, with a language-specific default when
/// no modifier is present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    Public,
    Private,
    Internal,
    Protected,
    Friend,
    Unknown,
}

/// A single `(param_name, type_name)` pair recovered from a constructor or method
/// signature, used for dependency-injection field-type tracking in the calls phase.
pub type ParameterType = (String, String);

/// A finalised symbol definition, inserted into the knowledge graph and symbol table
/// during the parsing phase. Before finalisation, analysers emit a [`DraftSymbol`]
/// carrying a placeholder ID.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Symbol {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: SymbolKind,
    pub file: String,
    pub line: usize,
    pub visibility: Visibility,
    pub exported: bool,
    pub parent: Option<String>,
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub byte_range: Option<(usize, usize)>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameter_types: Option<Vec<ParameterType>>,
}

/// A symbol as emitted directly by a language analyser, before the parsing phase
/// assigns it a stable ID. The `id` field holds a placeholder of the form
/// `_pending_<n>` assigned by the analyser in emission order within one file.
#[derive(Debug, Clone)]
pub struct DraftSymbol {
    pub id: String,
    pub name: String,
    pub kind: SymbolKind,
    pub file: String,
    pub line: usize,
    pub visibility: Visibility,
    pub exported: bool,
    pub parent: Option<String>,
    pub byte_range: Option<(usize, usize)>,
    pub parameter_types: Option<Vec<ParameterType>>,
}

impl DraftSymbol {
    /// Finalise this draft into a real `Symbol` with a stable ID and language tag.
    pub fn finalise(self, stable_id: String, language: Option<String>) -> Symbol {
        Symbol {
            id: stable_id,
            name: self.name,
            kind: self.kind,
            file: self.file,
            line: self.line,
            visibility: self.visibility,
            exported: self.exported,
            parent: self.parent,
            language,
            byte_range: self.byte_range,
            parameter_types: self.parameter_types,
        }
    }
}

/// A raw import statement as extracted by an analyser, before resolution to a target
/// file.
#[derive(Debug, Clone)]
pub struct ImportStatement {
    pub file: String,
    pub statement: String,
    pub target_name: String,
    pub line: usize,
}

/// A raw call site as extracted by an analyser, before resolution to a callee symbol.
#[derive(Debug, Clone)]
pub struct RawCall {
    pub caller_file: String,
    pub caller_name: String,
    pub callee_name: String,
    pub line: usize,
    pub qualifier: Option<String>,
}

/// A resolved file-to-file import edge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportEdge {
    pub from: String,
    pub to: String,
    pub statement: String,
}

/// A resolved symbol-to-symbol call edge with its confidence tier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallEdge {
    pub from: String,
    pub to: String,
    pub confidence: f64,
    pub tier: String,
    pub reason: String,
    pub line: usize,
}

/// A `.csproj`/`.vbproj`-to-project reference edge (`<ProjectReference>`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectReference {
    pub from: String,
    pub to: String,
    #[serde(rename = "type")]
    pub ref_type: String,
}

/// A `<PackageReference>` edge from a project to an external package.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageReference {
    pub project: String,
    pub package: String,
    pub version: String,
}

/// A Louvain-detected community of tightly coupled symbols.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Community {
    pub id: String,
    pub label: String,
    pub members: Vec<String>,
    pub cohesion: f64,
    pub primary_language: String,
}

/// The classification of a traced execution flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessKind {
    IntraCommunity,
    CrossCommunity,
}

/// A ranked execution flow traced from a probable entry point through the call graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Process {
    pub id: String,
    pub entry: String,
    pub terminal: String,
    pub steps: Vec<String>,
    #[serde(rename = "type")]
    pub kind: ProcessKind,
    pub total_confidence: f64,
}

/// A file discovered by the structure phase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileNode {
    pub path: String,
    pub language: Option<String>,
    pub size: u64,
    pub lines: usize,
}

/// A directory discovered by the structure phase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FolderNode {
    pub path: String,
    pub file_count: usize,
}

/// Run metadata: when/what/how long, attached to the top of the output document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisMetadata {
    pub repo_name: String,
    pub repo_path: String,
    pub analysed_at: String,
    pub mycelium_version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commit_hash: Option<String>,
    pub analysis_duration_ms: f64,
    pub phase_timings: std::collections::BTreeMap<String, f64>,
}

/// Aggregate counts summarising a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisStats {
    pub files: usize,
    pub folders: usize,
    pub symbols: usize,
    pub calls: usize,
    pub imports: usize,
    pub communities: usize,
    pub processes: usize,
    pub languages: std::collections::BTreeMap<String, usize>,
}

/// The file/folder tree section of the output document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructureSection {
    pub files: Vec<FileNode>,
    pub folders: Vec<FolderNode>,
}

/// The import/dependency section of the output document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportsSection {
    pub file_imports: Vec<ImportEdge>,
    pub project_references: Vec<ProjectReference>,
    pub package_references: Vec<PackageReference>,
}

/// The complete result of one analysis run, serialised as the output JSON document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub version: String,
    pub metadata: AnalysisMetadata,
    pub stats: AnalysisStats,
    pub structure: StructureSection,
    pub symbols: Vec<Symbol>,
    pub imports: ImportsSection,
    pub calls: Vec<CallEdge>,
    pub communities: Vec<Community>,
    pub processes: Vec<Process>,
}

/// Configuration for a single analysis run. Populated entirely from CLI flags; there
/// is no project-level configuration file.
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    pub repo_path: PathBuf,
    pub output_path: Option<PathBuf>,
    pub languages: Option<Vec<String>>,
    pub resolution: f64,
    pub max_processes: usize,
    pub max_depth: usize,
    pub max_branching: usize,
    pub min_steps: usize,
    pub exclude_patterns: Vec<String>,
    pub verbose: bool,
    pub quiet: bool,
    pub max_file_size: u64,
    pub max_community_size: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        AnalysisConfig {
            repo_path: PathBuf::from("."),
            output_path: None,
            languages: None,
            resolution: 1.0,
            max_processes: 75,
            max_depth: 10,
            max_branching: 4,
            min_steps: 2,
            exclude_patterns: Vec::new(),
            verbose: false,
            quiet: false,
            max_file_size: 1_000_000,
            max_community_size: 50,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_spec_defaults() {
        let cfg = AnalysisConfig::default();
        assert_eq!(cfg.resolution, 1.0);
        assert_eq!(cfg.max_processes, 75);
        assert_eq!(cfg.max_depth, 10);
        assert_eq!(cfg.max_branching, 4);
        assert_eq!(cfg.min_steps, 2);
        assert_eq!(cfg.max_file_size, 1_000_000);
        assert_eq!(cfg.max_community_size, 50);
    }

    #[test]
    fn draft_symbol_finalise_assigns_stable_id() {
        let draft = DraftSymbol {
            id: "_pending_0".to_string(),
            name: "Foo".to_string(),
            kind: SymbolKind::Class,
            file: "a.py".to_string(),
            line: 1,
            visibility: Visibility::Public,
            exported: true,
            parent: None,
            byte_range: None,
            parameter_types: None,
        };
        let sym = draft.finalise("sym_0001".to_string(), Some("py".to_string()));
        assert_eq!(sym.id, "sym_0001");
        assert_eq!(sym.name, "Foo");
        assert_eq!(sym.language.as_deref(), Some("py"));
    }
}
