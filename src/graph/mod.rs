//! The knowledge graph: a directed labelled multigraph over string node IDs with
//! prefix conventions (`file:<path>`, `folder:<path>`, `project:<path>`,
//! `package:<name>`, bare IDs for symbols/communities/processes). Backed by
//! `petgraph::stable_graph::StableGraph`, with a side `HashMap<String, NodeIndex>`
//! index for O(1) ID lookup. All queries return owned copies — never a borrow into
//! graph storage.

pub mod assembly_mapper;
pub mod edge;
pub mod namespace_index;
pub mod node;
pub mod scoring;
pub mod symbol_table;

use std::collections::HashMap;

use petgraph::Directed;
use petgraph::stable_graph::{NodeIndex, StableGraph};
use petgraph::Direction;

use crate::config::{
    CallEdge, Community, FileNode, FolderNode, ImportEdge, PackageReference, Process,
    ProcessKind, ProjectReference, Symbol,
};

pub use edge::GraphEdge;
pub use node::GraphNode;

pub struct KnowledgeGraph {
    graph: StableGraph<GraphNode, GraphEdge, Directed>,
    index: HashMap<String, NodeIndex>,
}

impl KnowledgeGraph {
    pub fn new() -> Self {
        KnowledgeGraph {
            graph: StableGraph::new(),
            index: HashMap::new(),
        }
    }

    fn get_or_create(&mut self, id: &str, make: impl FnOnce() -> GraphNode) -> NodeIndex {
        if let Some(&idx) = self.index.get(id) {
            return idx;
        }
        let idx = self.graph.add_node(make());
        self.index.insert(id.to_string(), idx);
        idx
    }

    fn node_id_of(&self, idx: NodeIndex) -> Option<&str> {
        self.index
            .iter()
            .find(|(_, &v)| v == idx)
            .map(|(k, _)| k.as_str())
    }

    // --- Node/edge addition ---

    pub fn add_file(&mut self, node: FileNode) {
        let id = format!("file:{}", node.path);
        self.get_or_create(&id, || GraphNode::File(node));
    }

    pub fn add_folder(&mut self, node: FolderNode) {
        let id = format!("folder:{}", node.path);
        self.get_or_create(&id, || GraphNode::Folder(node));
    }

    /// Insert a finalised symbol and its `DEFINES` edge from the owning file.
    pub fn add_symbol(&mut self, symbol: Symbol) {
        let file_id = format!("file:{}", symbol.file);
        let file_idx = self.get_or_create(&file_id, || GraphNode::File(FileNode {
            path: symbol.file.clone(),
            language: None,
            size: 0,
            lines: 0,
        }));
        let sym_id = symbol.id.clone();
        let sym_idx = self.get_or_create(&sym_id, || GraphNode::Symbol(symbol));
        self.graph.add_edge(file_idx, sym_idx, GraphEdge::Defines);
    }

    pub fn add_import(&mut self, edge: ImportEdge) {
        let from_id = format!("file:{}", edge.from);
        let to_id = format!("file:{}", edge.to);
        let from_idx = self.get_or_create(&from_id, || GraphNode::File(FileNode {
            path: edge.from.clone(),
            language: None,
            size: 0,
            lines: 0,
        }));
        let to_idx = self.get_or_create(&to_id, || GraphNode::File(FileNode {
            path: edge.to.clone(),
            language: None,
            size: 0,
            lines: 0,
        }));
        self.graph
            .add_edge(from_idx, to_idx, GraphEdge::Imports { statement: edge.statement });
    }

    pub fn add_call(&mut self, edge: CallEdge) {
        let from_idx = self.get_or_create(&edge.from, || GraphNode::Symbol(placeholder_symbol(&edge.from)));
        let to_idx = self.get_or_create(&edge.to, || GraphNode::Symbol(placeholder_symbol(&edge.to)));
        self.graph.add_edge(
            from_idx,
            to_idx,
            GraphEdge::Calls {
                confidence: edge.confidence,
                tier: edge.tier,
                reason: edge.reason,
                line: edge.line,
            },
        );
    }

    pub fn add_project_reference(&mut self, reference: ProjectReference) {
        let from_id = format!("project:{}", reference.from);
        let to_id = format!("project:{}", reference.to);
        let from_idx = self.get_or_create(&from_id, || GraphNode::Project { path: reference.from.clone() });
        let to_idx = self.get_or_create(&to_id, || GraphNode::Project { path: reference.to.clone() });
        self.graph
            .add_edge(from_idx, to_idx, GraphEdge::ProjectReference { ref_type: reference.ref_type });
    }

    pub fn add_package_reference(&mut self, reference: PackageReference) {
        let project_id = format!("project:{}", reference.project);
        let package_id = format!("package:{}", reference.package);
        let project_idx = self.get_or_create(&project_id, || GraphNode::Project { path: reference.project.clone() });
        let package_idx = self.get_or_create(&package_id, || GraphNode::Package { name: reference.package.clone() });
        self.graph
            .add_edge(project_idx, package_idx, GraphEdge::PackageReference { version: reference.version });
    }

    pub fn add_community(&mut self, community: Community) {
        let community_id = community.id.clone();
        let members = community.members.clone();
        let community_idx = self.get_or_create(&community_id, || GraphNode::Community {
            label: community.label,
            cohesion: community.cohesion,
            primary_language: community.primary_language,
        });
        for member in members {
            if let Some(&member_idx) = self.index.get(&member) {
                self.graph.add_edge(member_idx, community_idx, GraphEdge::MemberOf);
            }
        }
    }

    pub fn add_process(&mut self, process: Process) {
        let process_id = process.id.clone();
        let steps = process.steps.clone();
        let process_idx = self.get_or_create(&process_id, || GraphNode::Process {
            entry: process.entry,
            terminal: process.terminal,
            process_type: match process.kind {
                ProcessKind::IntraCommunity => "intra_community".to_string(),
                ProcessKind::CrossCommunity => "cross_community".to_string(),
            },
            total_confidence: process.total_confidence,
        });
        for (order, step) in steps.into_iter().enumerate() {
            if let Some(&step_idx) = self.index.get(&step) {
                self.graph.add_edge(process_idx, step_idx, GraphEdge::Step { order });
            }
        }
    }

    // --- Queries ---

    pub fn files(&self) -> Vec<FileNode> {
        self.graph
            .node_weights()
            .filter_map(|n| match n {
                GraphNode::File(f) => Some(f.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn folders(&self) -> Vec<FolderNode> {
        self.graph
            .node_weights()
            .filter_map(|n| match n {
                GraphNode::Folder(f) => Some(f.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn symbols(&self) -> Vec<Symbol> {
        self.graph
            .node_weights()
            .filter_map(|n| match n {
                GraphNode::Symbol(s) => Some(s.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn symbol(&self, id: &str) -> Option<Symbol> {
        let idx = *self.index.get(id)?;
        match self.graph.node_weight(idx)? {
            GraphNode::Symbol(s) => Some(s.clone()),
            _ => None,
        }
    }

    pub fn symbols_in_file(&self, path: &str) -> Vec<Symbol> {
        let file_id = format!("file:{}", path);
        let Some(&file_idx) = self.index.get(&file_id) else {
            return Vec::new();
        };
        self.graph
            .edges_directed(file_idx, Direction::Outgoing)
            .filter_map(|e| match e.weight() {
                GraphEdge::Defines => match self.graph.node_weight(e.target()) {
                    Some(GraphNode::Symbol(s)) => Some(s.clone()),
                    _ => None,
                },
                _ => None,
            })
            .collect()
    }

    pub fn callers_of(&self, symbol_id: &str) -> Vec<(String, CallEdge)> {
        let Some(&idx) = self.index.get(symbol_id) else {
            return Vec::new();
        };
        self.graph
            .edges_directed(idx, Direction::Incoming)
            .filter_map(|e| match e.weight() {
                GraphEdge::Calls { confidence, tier, reason, line } => {
                    let from = self.node_id_of(e.source())?.to_string();
                    Some((
                        from.clone(),
                        CallEdge {
                            from,
                            to: symbol_id.to_string(),
                            confidence: *confidence,
                            tier: tier.clone(),
                            reason: reason.clone(),
                            line: *line,
                        },
                    ))
                }
                _ => None,
            })
            .collect()
    }

    pub fn callees_of(&self, symbol_id: &str) -> Vec<(String, CallEdge)> {
        let Some(&idx) = self.index.get(symbol_id) else {
            return Vec::new();
        };
        self.graph
            .edges_directed(idx, Direction::Outgoing)
            .filter_map(|e| match e.weight() {
                GraphEdge::Calls { confidence, tier, reason, line } => {
                    let to = self.node_id_of(e.target())?.to_string();
                    Some((
                        to.clone(),
                        CallEdge {
                            from: symbol_id.to_string(),
                            to,
                            confidence: *confidence,
                            tier: tier.clone(),
                            reason: reason.clone(),
                            line: *line,
                        },
                    ))
                }
                _ => None,
            })
            .collect()
    }

    pub fn all_call_edges(&self) -> Vec<CallEdge> {
        self.graph
            .edge_indices()
            .filter_map(|e| {
                let (src, tgt) = self.graph.edge_endpoints(e)?;
                match self.graph.edge_weight(e)? {
                    GraphEdge::Calls { confidence, tier, reason, line } => Some(CallEdge {
                        from: self.node_id_of(src)?.to_string(),
                        to: self.node_id_of(tgt)?.to_string(),
                        confidence: *confidence,
                        tier: tier.clone(),
                        reason: reason.clone(),
                        line: *line,
                    }),
                    _ => None,
                }
            })
            .collect()
    }

    pub fn all_import_edges(&self) -> Vec<ImportEdge> {
        self.graph
            .edge_indices()
            .filter_map(|e| {
                let (src, tgt) = self.graph.edge_endpoints(e)?;
                match self.graph.edge_weight(e)? {
                    GraphEdge::Imports { statement } => Some(ImportEdge {
                        from: self.node_id_of(src)?.trim_start_matches("file:").to_string(),
                        to: self.node_id_of(tgt)?.trim_start_matches("file:").to_string(),
                        statement: statement.clone(),
                    }),
                    _ => None,
                }
            })
            .collect()
    }

    pub fn project_references(&self) -> Vec<ProjectReference> {
        self.graph
            .edge_indices()
            .filter_map(|e| {
                let (src, tgt) = self.graph.edge_endpoints(e)?;
                match self.graph.edge_weight(e)? {
                    GraphEdge::ProjectReference { ref_type } => Some(ProjectReference {
                        from: self.node_id_of(src)?.trim_start_matches("project:").to_string(),
                        to: self.node_id_of(tgt)?.trim_start_matches("project:").to_string(),
                        ref_type: ref_type.clone(),
                    }),
                    _ => None,
                }
            })
            .collect()
    }

    pub fn package_references(&self) -> Vec<PackageReference> {
        self.graph
            .edge_indices()
            .filter_map(|e| {
                let (src, tgt) = self.graph.edge_endpoints(e)?;
                match self.graph.edge_weight(e)? {
                    GraphEdge::PackageReference { version } => {
                        let package = match self.graph.node_weight(tgt)? {
                            GraphNode::Package { name } => name.clone(),
                            _ => return None,
                        };
                        Some(PackageReference {
                            project: self.node_id_of(src)?.trim_start_matches("project:").to_string(),
                            package,
                            version: version.clone(),
                        })
                    }
                    _ => None,
                }
            })
            .collect()
    }

    pub fn communities(&self) -> Vec<Community> {
        self.graph
            .node_indices()
            .filter_map(|idx| match self.graph.node_weight(idx)? {
                GraphNode::Community { label, cohesion, primary_language } => {
                    let mut members: Vec<String> = self
                        .graph
                        .edges_directed(idx, Direction::Incoming)
                        .filter(|e| matches!(e.weight(), GraphEdge::MemberOf))
                        .filter_map(|e| self.node_id_of(e.source()).map(|s| s.to_string()))
                        .collect();
                    members.sort();
                    Some(Community {
                        id: self.node_id_of(idx)?.to_string(),
                        label: label.clone(),
                        members,
                        cohesion: *cohesion,
                        primary_language: primary_language.clone(),
                    })
                }
                _ => None,
            })
            .collect()
    }

    pub fn processes(&self) -> Vec<Process> {
        self.graph
            .node_indices()
            .filter_map(|idx| match self.graph.node_weight(idx)? {
                GraphNode::Process { entry, terminal, process_type, total_confidence } => {
                    let mut ordered: Vec<(usize, String)> = self
                        .graph
                        .edges_directed(idx, Direction::Outgoing)
                        .filter_map(|e| match e.weight() {
                            GraphEdge::Step { order } => {
                                self.node_id_of(e.target()).map(|s| (*order, s.to_string()))
                            }
                            _ => None,
                        })
                        .collect();
                    ordered.sort_by_key(|(order, _)| *order);
                    let kind = if process_type == "cross_community" {
                        ProcessKind::CrossCommunity
                    } else {
                        ProcessKind::IntraCommunity
                    };
                    Some(Process {
                        id: self.node_id_of(idx)?.to_string(),
                        entry: entry.clone(),
                        terminal: terminal.clone(),
                        steps: ordered.into_iter().map(|(_, s)| s).collect(),
                        kind,
                        total_confidence: *total_confidence,
                    })
                }
                _ => None,
            })
            .collect()
    }

    pub fn symbol_count(&self) -> usize {
        self.graph
            .node_weights()
            .filter(|n| matches!(n, GraphNode::Symbol(_)))
            .count()
    }

    pub fn file_count(&self) -> usize {
        self.graph
            .node_weights()
            .filter(|n| matches!(n, GraphNode::File(_)))
            .count()
    }

    pub fn folder_count(&self) -> usize {
        self.graph
            .node_weights()
            .filter(|n| matches!(n, GraphNode::Folder(_)))
            .count()
    }
}

impl Default for KnowledgeGraph {
    fn default() -> Self {
        Self::new()
    }
}

/// A minimal placeholder symbol used when an edge endpoint is added before the
/// symbol itself exists.
fn placeholder_symbol(id: &str) -> GraphNode {
    GraphNode::Symbol(Symbol {
        id: id.to_string(),
        name: String::new(),
        kind: crate::config::SymbolKind::Function,
        file: String::new(),
        line: 0,
        visibility: crate::config::Visibility::Unknown,
        exported: false,
        parent: None,
        language: None,
        byte_range: None,
        parameter_types: None,
    })
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
    fn add_file_and_symbol_creates_defines_edge() {
        let mut g = KnowledgeGraph::new();
        g.add_file(FileNode { path: "a.py".into(), language: Some("py".into()), size: 10, lines: 1 });
        g.add_symbol(sym("sym_0001", "foo", "a.py"));
        assert_eq!(g.file_count(), 1);
        assert_eq!(g.symbol_count(), 1);
        let defined = g.symbols_in_file("a.py");
        assert_eq!(defined.len(), 1);
        assert_eq!(defined[0].name, "foo");
    }

    #[test]
    fn add_duplicate_file_does_not_duplicate_node() {
        let mut g = KnowledgeGraph::new();
        g.add_file(FileNode { path: "a.py".into(), language: Some("py".into()), size: 10, lines: 1 });
        g.add_file(FileNode { path: "a.py".into(), language: Some("py".into()), size: 10, lines: 1 });
        assert_eq!(g.file_count(), 1);
    }

    #[test]
    fn add_call_auto_creates_placeholder_endpoints() {
        let mut g = KnowledgeGraph::new();
        g.add_call(CallEdge {
            from: "sym_0001".into(),
            to: "sym_0002".into(),
            confidence: 0.9,
            tier: "A".into(),
            reason: "import-resolved".into(),
            line: 5,
        });
        assert_eq!(g.all_call_edges().len(), 1);
        let callees = g.callees_of("sym_0001");
        assert_eq!(callees.len(), 1);
        assert_eq!(callees[0].0, "sym_0002");
    }

    #[test]
    fn communities_query_reconstructs_members() {
        let mut g = KnowledgeGraph::new();
        g.add_symbol(sym("sym_0001", "a", "x.py"));
        g.add_symbol(sym("sym_0002", "b", "x.py"));
        g.add_community(Community {
            id: "community_0".into(),
            label: "x".into(),
            members: vec!["sym_0001".into(), "sym_0002".into()],
            cohesion: 1.0,
            primary_language: "py".into(),
        });
        let communities = g.communities();
        assert_eq!(communities.len(), 1);
        assert_eq!(communities[0].members.len(), 2);
    }

    #[test]
    fn processes_query_sorts_steps_by_order() {
        let mut g = KnowledgeGraph::new();
        g.add_symbol(sym("sym_0001", "a", "x.py"));
        g.add_symbol(sym("sym_0002", "b", "x.py"));
        g.add_symbol(sym("sym_0003", "c", "x.py"));
        g.add_process(Process {
            id: "process_0".into(),
            entry: "sym_0001".into(),
            terminal: "sym_0003".into(),
            steps: vec!["sym_0001".into(), "sym_0002".into(), "sym_0003".into()],
            kind: ProcessKind::IntraCommunity,
            total_confidence: 0.81,
        });
        let processes = g.processes();
        assert_eq!(processes.len(), 1);
        assert_eq!(processes[0].steps, vec!["sym_0001", "sym_0002", "sym_0003"]);
    }
}
