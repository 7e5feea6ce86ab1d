//! Typed edges between knowledge-graph nodes.

/// The kind of directed edge between two nodes in the knowledge graph.
#[derive(Debug, Clone)]
pub enum GraphEdge {
    /// file -> symbol: the file defines this symbol.
    Defines,
    /// file -> file: the source file imports from the target file.
    Imports { statement: String },
    /// symbol -> symbol: a resolved call with its confidence tier.
    Calls {
        confidence: f64,
        tier: String,
        reason: String,
        line: usize,
    },
    /// project -> project: an MSBuild `<ProjectReference>`.
    ProjectReference { ref_type: String },
    /// project -> package: an MSBuild `<PackageReference>`.
    PackageReference { version: String },
    /// symbol -> community: membership in a Louvain community.
    MemberOf,
    /// process -> symbol: the symbol is step `order` (0-based) of this process trace.
    Step { order: usize },
}
