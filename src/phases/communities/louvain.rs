//! Hand-rolled weighted Louvain community detection, modelled on
//! `networkx.community.louvain_communities` (modularity-gain local moving phase
//! followed by graph aggregation, repeated to convergence). No corpus crate
//! implements Louvain, so this follows the textbook two-phase algorithm; the `rand`
//! crate (seeded) stands in for networkx's `seed=42` node-visit shuffling.

use std::collections::{HashMap, HashSet};

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

/// An undirected, edge-weighted simple graph over `u32` node indices.
pub struct WeightedGraph {
    pub nodes: Vec<u32>,
    adjacency: HashMap<u32, HashMap<u32, f64>>,
}

impl WeightedGraph {
    pub fn new() -> Self {
        WeightedGraph { nodes: Vec::new(), adjacency: HashMap::new() }
    }

    pub fn add_edge(&mut self, a: u32, b: u32, weight: f64) {
        if a == b {
            *self.adjacency.entry(a).or_default().entry(a).or_insert(0.0) += weight;
            self.ensure_node(a);
            return;
        }
        *self.adjacency.entry(a).or_default().entry(b).or_insert(0.0) += weight;
        *self.adjacency.entry(b).or_default().entry(a).or_insert(0.0) += weight;
        self.ensure_node(a);
        self.ensure_node(b);
    }

    pub fn ensure_node(&mut self, n: u32) {
        if !self.nodes.contains(&n) {
            self.nodes.push(n);
        }
        self.adjacency.entry(n).or_default();
    }

    pub fn neighbors(&self, n: u32) -> impl Iterator<Item = (&u32, &f64)> {
        self.adjacency.get(&n).into_iter().flat_map(|m| m.iter())
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        let mut total = 0.0;
        for (&n, neighbors) in &self.adjacency {
            for (&m, _) in neighbors {
                if m == n {
                    continue;
                }
                total += 1.0;
            }
        }
        (total / 2.0).round() as usize
    }

    pub fn total_weight(&self) -> f64 {
        let mut total = 0.0;
        for (&n, neighbors) in &self.adjacency {
            for (&m, &w) in neighbors {
                total += if m == n { w } else { w / 2.0 };
            }
        }
        total
    }

    /// The subgraph induced by `members`, with node indices unchanged.
    pub fn subgraph(&self, members: &HashSet<u32>) -> WeightedGraph {
        let mut sub = WeightedGraph::new();
        for &n in members {
            sub.ensure_node(n);
        }
        for &n in members {
            if let Some(neighbors) = self.adjacency.get(&n) {
                for (&m, &w) in neighbors {
                    if members.contains(&m) && (m > n || m == n) {
                        sub.add_edge_raw(n, m, w);
                    }
                }
            }
        }
        sub
    }

    fn add_edge_raw(&mut self, a: u32, b: u32, weight: f64) {
        self.adjacency.entry(a).or_default().insert(b, weight);
        if a != b {
            self.adjacency.entry(b).or_default().insert(a, weight);
        }
        self.ensure_node(a);
        self.ensure_node(b);
    }
}

impl Default for WeightedGraph {
    fn default() -> Self {
        Self::new()
    }
}

/// Run Louvain community detection at the given resolution and seed, returning
/// node-index sets.
pub fn louvain_communities(graph: &WeightedGraph, resolution: f64, seed: u64) -> Vec<HashSet<u32>> {
    if graph.node_count() == 0 {
        return Vec::new();
    }

    let mut rng = StdRng::seed_from_u64(seed);

    // partition[level] maps aggregated-node id -> set of original node ids it represents.
    let mut partition: HashMap<u32, HashSet<u32>> =
        graph.nodes.iter().map(|&n| (n, HashSet::from([n]))).collect();

    let mut current = clone_graph(graph);

    loop {
        let (communities, improved) = one_level(&current, resolution, &mut rng);
        if !improved {
            break;
        }

        // Aggregate: each community becomes a single node in the next-level graph.
        let mut next_partition: HashMap<u32, HashSet<u32>> = HashMap::new();
        let mut community_id_of: HashMap<u32, u32> = HashMap::new();
        for (new_id, (_, members)) in communities.iter().enumerate() {
            let new_id = new_id as u32;
            let mut combined = HashSet::new();
            for &old_node in members {
                if let Some(orig) = partition.get(&old_node) {
                    combined.extend(orig.iter().copied());
                }
                community_id_of.insert(old_node, new_id);
            }
            next_partition.insert(new_id, combined);
        }

        let mut next_graph = WeightedGraph::new();
        for &n in &current.nodes {
            next_graph.ensure_node(*community_id_of.get(&n).unwrap_or(&n));
        }
        for &n in &current.nodes {
            let cn = *community_id_of.get(&n).unwrap_or(&n);
            for (&m, &w) in current.neighbors(n) {
                let cm = *community_id_of.get(&m).unwrap_or(&m);
                if m < n {
                    continue; // count each undirected pair once
                }
                if m == n {
                    next_graph.add_edge(cn, cn, w);
                } else {
                    next_graph.add_edge(cn, cm, w);
                }
            }
        }

        partition = next_partition;
        current = next_graph;

        if current.node_count() == partition.len() && current.node_count() == graph.node_count() {
            // No further aggregation happened — converged.
            break;
        }
    }

    partition.into_values().collect()
}

fn clone_graph(graph: &WeightedGraph) -> WeightedGraph {
    let mut copy = WeightedGraph::new();
    for &n in &graph.nodes {
        copy.ensure_node(n);
    }
    for &n in &graph.nodes {
        for (&m, &w) in graph.neighbors(n) {
            if m >= n {
                copy.add_edge_raw(n, m, w);
            }
        }
    }
    copy
}

/// One pass of local node moving, returning (community_id -> member node ids, whether
/// any move happened).
fn one_level(graph: &WeightedGraph, resolution: f64, rng: &mut StdRng) -> (Vec<(u32, HashSet<u32>)>, bool) {
    let m2 = graph.total_weight() * 2.0;
    if m2 <= 0.0 {
        let communities: Vec<(u32, HashSet<u32>)> = graph.nodes.iter().map(|&n| (n, HashSet::from([n]))).collect();
        return (communities, false);
    }

    let mut node_community: HashMap<u32, u32> = graph.nodes.iter().map(|&n| (n, n)).collect();
    let mut community_degree: HashMap<u32, f64> = HashMap::new();
    let mut node_degree: HashMap<u32, f64> = HashMap::new();

    for &n in &graph.nodes {
        let deg: f64 = graph.neighbors(n).map(|(&m, &w)| if m == n { 2.0 * w } else { w }).sum();
        node_degree.insert(n, deg);
        *community_degree.entry(n).or_insert(0.0) += deg;
    }

    let mut order: Vec<u32> = graph.nodes.clone();
    order.shuffle(rng);

    let mut improved = false;
    let mut moved_any = true;
    let mut passes = 0;
    while moved_any && passes < 100 {
        moved_any = false;
        passes += 1;
        for &node in &order {
            let current_comm = node_community[&node];
            let node_deg = node_degree[&node];

            let mut neighbor_weight: HashMap<u32, f64> = HashMap::new();
            for (&m, &w) in graph.neighbors(node) {
                if m == node {
                    continue;
                }
                let c = node_community[&m];
                *neighbor_weight.entry(c).or_insert(0.0) += w;
            }

            *community_degree.get_mut(&current_comm).unwrap() -= node_deg;

            let mut best_comm = current_comm;
            let mut best_gain = 0.0;
            let current_in = *neighbor_weight.get(&current_comm).unwrap_or(&0.0);
            let current_gain = current_in - resolution * node_deg * community_degree.get(&current_comm).copied().unwrap_or(0.0) / m2;

            let mut candidates: Vec<u32> = neighbor_weight.keys().copied().collect();
            candidates.push(current_comm);
            candidates.sort_unstable();
            candidates.dedup();

            for &cand in &candidates {
                let in_weight = *neighbor_weight.get(&cand).unwrap_or(&0.0);
                let tot = community_degree.get(&cand).copied().unwrap_or(0.0);
                let gain = in_weight - resolution * node_deg * tot / m2;
                if gain > current_gain + best_gain + 1e-12 {
                    best_gain = gain - current_gain;
                    best_comm = cand;
                }
            }

            *community_degree.entry(best_comm).or_insert(0.0) += node_deg;
            if best_comm != current_comm {
                node_community.insert(node, best_comm);
                moved_any = true;
                improved = true;
            }
        }
    }

    let mut grouped: HashMap<u32, HashSet<u32>> = HashMap::new();
    for (&node, &comm) in &node_community {
        grouped.entry(comm).or_default().insert(node);
    }
    (grouped.into_iter().collect(), improved)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_disconnected_triangles_form_two_communities() {
        let mut g = WeightedGraph::new();
        g.add_edge(1, 2, 1.0);
        g.add_edge(2, 3, 1.0);
        g.add_edge(1, 3, 1.0);
        g.add_edge(4, 5, 1.0);
        g.add_edge(5, 6, 1.0);
        g.add_edge(4, 6, 1.0);

        let communities = louvain_communities(&g, 1.0, 42);
        let non_empty: Vec<_> = communities.into_iter().filter(|c| !c.is_empty()).collect();
        assert_eq!(non_empty.len(), 2);
        for c in &non_empty {
            assert_eq!(c.len(), 3);
        }
    }

    #[test]
    fn single_node_graph_is_its_own_community() {
        let mut g = WeightedGraph::new();
        g.ensure_node(1);
        let communities = louvain_communities(&g, 1.0, 42);
        assert_eq!(communities.len(), 1);
        assert_eq!(communities[0], HashSet::from([1]));
    }
}
