//! Phase 5: Louvain community detection over the call graph. Grounded on
//! `phases/communities.py`; the Louvain algorithm itself lives in [`louvain`].

pub mod louvain;

use std::collections::{HashMap, HashSet};
use std::path::Path;

use louvain::WeightedGraph;

use crate::config::{AnalysisConfig, Community};
use crate::graph::KnowledgeGraph;

const LOUVAIN_SEED: u64 = 42;
const MAX_RESOLUTION: f64 = 10.0;
const STRIP_DIR_SEGMENTS: &[&str] = &["src", "source", "sourcecode", "lib", "app"];

/// Cluster the call graph using Louvain community detection.
pub fn run(config: &AnalysisConfig, kg: &mut KnowledgeGraph) {
    let call_edges = kg.all_call_edges();
    if call_edges.is_empty() {
        return;
    }

    let mut id_of: HashMap<String, u32> = HashMap::new();
    let mut symbol_of: Vec<String> = Vec::new();
    let mut intern = |id: &str, id_of: &mut HashMap<String, u32>, symbol_of: &mut Vec<String>| -> u32 {
        if let Some(&idx) = id_of.get(id) {
            return idx;
        }
        let idx = symbol_of.len() as u32;
        symbol_of.push(id.to_string());
        id_of.insert(id.to_string(), idx);
        idx
    };

    let mut graph = WeightedGraph::new();
    for edge in &call_edges {
        let a = intern(&edge.from, &mut id_of, &mut symbol_of);
        let b = intern(&edge.to, &mut id_of, &mut symbol_of);
        if a == b {
            continue;
        }
        graph.add_edge(a, b, edge.confidence);
    }

    if graph.node_count() < 2 {
        return;
    }

    let mut resolution = config.resolution;
    let mut communities = louvain::louvain_communities(&graph, resolution, LOUVAIN_SEED);

    let mut largest = communities.iter().map(|c| c.len()).max().unwrap_or(0);
    while largest > config.max_community_size && resolution < MAX_RESOLUTION {
        resolution *= 2.0;
        communities = louvain::louvain_communities(&graph, resolution, LOUVAIN_SEED);
        largest = communities.iter().map(|c| c.len()).max().unwrap_or(0);
    }

    let mut final_communities: Vec<HashSet<u32>> = Vec::new();
    for comm in communities {
        if comm.len() > config.max_community_size {
            final_communities.extend(split_oversized(&comm, &graph, config.max_community_size));
        } else {
            final_communities.push(comm);
        }
    }

    let symbols = kg.symbols();
    let symbol_by_id: HashMap<&str, &crate::config::Symbol> = symbols.iter().map(|s| (s.id.as_str(), s)).collect();

    let mut label_counts: HashMap<String, usize> = HashMap::new();
    let mut pending: Vec<(String, Vec<String>, f64, String)> = Vec::new();

    for members in &final_communities {
        if members.len() <= 1 {
            continue;
        }
        let member_ids: Vec<String> = members.iter().map(|&idx| symbol_of[idx as usize].clone()).collect();

        let label = generate_label(&member_ids, &symbol_by_id);
        let cohesion = compute_cohesion(members, &graph);
        let primary_lang = primary_language(&member_ids, &symbol_by_id);

        *label_counts.entry(label.clone()).or_insert(0) += 1;
        pending.push((label, member_ids, cohesion, primary_lang));
    }

    let mut used_labels: HashSet<String> = HashSet::new();
    for (i, (label, member_ids, cohesion, primary_lang)) in pending.into_iter().enumerate() {
        let final_label = if label_counts[&label] > 1 || used_labels.contains(&label) {
            disambiguate_label(&label, &member_ids, &symbol_by_id, &used_labels)
        } else {
            label
        };
        used_labels.insert(final_label.clone());

        kg.add_community(Community {
            id: format!("community_{i}"),
            label: final_label,
            members: member_ids,
            cohesion: (cohesion * 1000.0).round() / 1000.0,
            primary_language: primary_lang,
        });
    }
}

/// Recursively split an oversized community using Louvain on its subgraph at
/// increasingly high resolution.
fn split_oversized(community: &HashSet<u32>, full_graph: &WeightedGraph, max_size: usize) -> Vec<HashSet<u32>> {
    if community.len() <= max_size {
        return vec![community.clone()];
    }

    let subgraph = full_graph.subgraph(community);
    if subgraph.edge_count() == 0 {
        return vec![community.clone()];
    }

    let mut resolution = 2.0;
    for _ in 0..8 {
        let sub_communities = louvain::louvain_communities(&subgraph, resolution, LOUVAIN_SEED);
        if sub_communities.len() > 1 {
            let mut result = Vec::new();
            for sc in &sub_communities {
                result.extend(split_oversized(sc, full_graph, max_size));
            }
            return result;
        }
        resolution *= 2.0;
    }

    vec![community.clone()]
}

fn generate_label(members: &[String], symbol_by_id: &HashMap<&str, &crate::config::Symbol>) -> String {
    let (file_paths, names, parents) = member_attrs(members, symbol_by_id);

    if !parents.is_empty() {
        let (most_common_parent, count) = most_common(&parents);
        if count as f64 >= members.len() as f64 * 0.3 {
            return most_common_parent.rsplit('.').next().unwrap_or(&most_common_parent).to_string();
        }
    }

    if !file_paths.is_empty() {
        let dirs: Vec<String> = file_paths.iter().filter(|p| !p.is_empty()).map(|p| dirname(p)).collect();
        if !dirs.is_empty() {
            let (most_common_dir, _) = most_common(&dirs);
            if !most_common_dir.is_empty() {
                let normalized = most_common_dir.replace('\\', "/");
                let parts: Vec<String> = normalized
                    .split('/')
                    .filter(|p| !STRIP_DIR_SEGMENTS.contains(&p.to_lowercase().as_str()))
                    .map(|p| p.to_string())
                    .collect();
                if let Some(last) = parts.last() {
                    if !last.is_empty() {
                        return last.clone();
                    }
                }
            }
        }
    }

    if !names.is_empty() {
        let prefix = common_prefix(&names);
        if prefix.len() >= 3 {
            return prefix.trim_end_matches('_').to_string();
        }
    }

    format!("Community ({} members)", members.len())
}

fn disambiguate_label(
    label: &str,
    members: &[String],
    symbol_by_id: &HashMap<&str, &crate::config::Symbol>,
    used_labels: &HashSet<String>,
) -> String {
    let (file_paths, names, parents) = member_attrs(members, symbol_by_id);

    if !parents.is_empty() {
        let counts = count_map(&parents);
        if counts.len() > 1 {
            let mut items: Vec<(&String, &usize)> = counts.iter().collect();
            items.sort_by(|a, b| b.1.cmp(a.1));
            if let Some((secondary, _)) = items.get(1) {
                let secondary = secondary.rsplit('.').next().unwrap_or(secondary);
                let candidate = format!("{label}/{secondary}");
                if !used_labels.contains(&candidate) {
                    return candidate;
                }
            }
        }
    }

    if !file_paths.is_empty() {
        let dirs: Vec<String> = file_paths.iter().filter(|p| !p.is_empty()).map(|p| dirname(p)).collect();
        if !dirs.is_empty() {
            let (most_common_dir, _) = most_common(&dirs);
            if !most_common_dir.is_empty() {
                let parts: Vec<String> = most_common_dir
                    .replace('\\', "/")
                    .split('/')
                    .filter(|p| !STRIP_DIR_SEGMENTS.contains(&p.to_lowercase().as_str()) && *p != label)
                    .map(|p| p.to_string())
                    .collect();
                if let Some(last) = parts.last() {
                    let candidate = format!("{label}/{last}");
                    if !used_labels.contains(&candidate) {
                        return candidate;
                    }
                }
            }
        }
    }

    if !names.is_empty() {
        let mut sorted_names = names.clone();
        sorted_names.sort_by_key(|n| std::cmp::Reverse(n.len()));
        for name in &sorted_names {
            if name != label {
                let candidate = format!("{label}:{name}");
                if !used_labels.contains(&candidate) {
                    return candidate;
                }
            }
        }
    }

    let mut idx = 1;
    loop {
        let candidate = format!("{label} #{idx}");
        if !used_labels.contains(&candidate) {
            return candidate;
        }
        idx += 1;
    }
}

fn member_attrs(
    members: &[String],
    symbol_by_id: &HashMap<&str, &crate::config::Symbol>,
) -> (Vec<String>, Vec<String>, Vec<String>) {
    let mut file_paths = Vec::new();
    let mut names = Vec::new();
    let mut parents = Vec::new();
    for id in members {
        if let Some(sym) = symbol_by_id.get(id.as_str()) {
            file_paths.push(sym.file.clone());
            names.push(sym.name.clone());
            if let Some(parent) = &sym.parent {
                if !parent.is_empty() {
                    parents.push(parent.clone());
                }
            }
        }
    }
    (file_paths, names, parents)
}

fn dirname(path: &str) -> String {
    Path::new(path).parent().map(|p| p.to_string_lossy().replace('\\', "/")).unwrap_or_default()
}

fn count_map(items: &[String]) -> HashMap<String, usize> {
    let mut counts = HashMap::new();
    for item in items {
        *counts.entry(item.clone()).or_insert(0) += 1;
    }
    counts
}

fn most_common(items: &[String]) -> (String, usize) {
    let counts = count_map(items);
    counts.into_iter().max_by_key(|(_, c)| *c).unwrap_or_default()
}

fn common_prefix(names: &[String]) -> String {
    let Some(first) = names.first() else { return String::new() };
    let mut prefix = first.clone();
    for name in &names[1..] {
        let common_len = prefix.chars().zip(name.chars()).take_while(|(a, b)| a == b).count();
        prefix.truncate(prefix.char_indices().nth(common_len).map(|(i, _)| i).unwrap_or(prefix.len()));
        if prefix.is_empty() {
            break;
        }
    }
    prefix
}

fn compute_cohesion(members: &HashSet<u32>, graph: &WeightedGraph) -> f64 {
    let n = members.len();
    if n < 2 {
        return 0.0;
    }
    let mut internal_edges = 0usize;
    for &node in members {
        for (&neighbor, _) in graph.neighbors(node) {
            if neighbor != node && members.contains(&neighbor) && neighbor > node {
                internal_edges += 1;
            }
        }
    }
    let max_possible = (n * (n - 1)) as f64 / 2.0;
    if max_possible == 0.0 {
        return 0.0;
    }
    internal_edges as f64 / max_possible
}

fn primary_language(members: &[String], symbol_by_id: &HashMap<&str, &crate::config::Symbol>) -> String {
    let mut langs = Vec::new();
    for id in members {
        if let Some(sym) = symbol_by_id.get(id.as_str()) {
            if let Some(lang) = &sym.language {
                if !lang.is_empty() {
                    langs.push(lang.clone());
                }
            }
        }
    }
    if langs.is_empty() {
        return String::new();
    }
    most_common(&langs).0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CallEdge, Symbol, SymbolKind, Visibility};

    fn symbol(id: &str, name: &str, file: &str, parent: Option<&str>, language: &str) -> Symbol {
        Symbol {
            id: id.to_string(),
            name: name.to_string(),
            kind: SymbolKind::Function,
            file: file.to_string(),
            line: 1,
            visibility: Visibility::Public,
            exported: true,
            parent: parent.map(|p| p.to_string()),
            language: Some(language.to_string()),
            byte_range: None,
            parameter_types: None,
        }
    }

    #[test]
    fn clusters_tightly_connected_symbols_into_one_community() {
        let mut kg = KnowledgeGraph::new();
        for (id, name) in [("sym_0001", "a"), ("sym_0002", "b"), ("sym_0003", "c")] {
            kg.add_symbol(symbol(id, name, "svc/handler.py", Some("Handler"), "py"));
        }
        kg.add_call(CallEdge { from: "sym_0001".into(), to: "sym_0002".into(), confidence: 0.9, tier: "A".into(), reason: "import-resolved".into(), line: 1 });
        kg.add_call(CallEdge { from: "sym_0002".into(), to: "sym_0003".into(), confidence: 0.9, tier: "A".into(), reason: "import-resolved".into(), line: 2 });
        kg.add_call(CallEdge { from: "sym_0001".into(), to: "sym_0003".into(), confidence: 0.9, tier: "A".into(), reason: "import-resolved".into(), line: 3 });

        let mut config = AnalysisConfig::default();
        config.max_community_size = 50;
        run(&config, &mut kg);

        let communities = kg.communities();
        assert_eq!(communities.len(), 1);
        assert_eq!(communities[0].members.len(), 3);
        assert_eq!(communities[0].label, "Handler");
        assert_eq!(communities[0].primary_language, "py");
    }

    #[test]
    fn no_call_edges_produces_no_communities() {
        let mut kg = KnowledgeGraph::new();
        let config = AnalysisConfig::default();
        run(&config, &mut kg);
        assert!(kg.communities().is_empty());
    }
}
