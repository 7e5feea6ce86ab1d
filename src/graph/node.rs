//! Node payloads stored in the knowledge graph. Each variant corresponds to one
//! `node_type` discriminator.

use crate::config::{FileNode, FolderNode, Symbol};

/// A node in the knowledge graph. The string ID used to address a node externally
/// (e.g. `file:<path>`, bare symbol IDs) is *not* stored on the node itself — it
/// lives in [`super::KnowledgeGraph`]'s side index, a prefix-convention string ID
/// layered over an opaque graph backing store.
#[derive(Debug, Clone)]
pub enum GraphNode {
    File(FileNode),
    Folder(FolderNode),
    Symbol(Symbol),
    Project { path: String },
    Package { name: String },
    Community {
        label: String,
        cohesion: f64,
        primary_language: String,
    },
    Process {
        entry: String,
        terminal: String,
        process_type: String,
        total_confidence: f64,
    },
}
