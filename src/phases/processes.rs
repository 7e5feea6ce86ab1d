//! Phase 6: BFS execution flow detection from scored entry points. Grounded on
//! `phases/processes.py` and `graph/scoring.py`.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::config::{AnalysisConfig, Process, ProcessKind};
use crate::graph::KnowledgeGraph;
use crate::graph::scoring::score_entry_points;

/// Detect execution flows via multi-branch BFS from scored entry points.
pub fn run(config: &AnalysisConfig, kg: &mut KnowledgeGraph) {
    let max_processes = config.max_processes;
    let max_depth = config.max_depth;
    let max_branching = config.max_branching;
    let min_steps = config.min_steps;

    let entry_points = score_entry_points(kg);
    if entry_points.is_empty() {
        return;
    }

    let candidates = &entry_points[..entry_points.len().min(max_processes * 2)];

    let mut traces: Vec<Vec<String>> = Vec::new();
    for (entry_id, _) in candidates {
        traces.extend(bfs_traces(kg, entry_id, max_depth, max_branching, min_steps));
    }

    let traces = deduplicate(traces);
    let community_map = build_community_map(kg);

    let mut process_data: Vec<(Vec<String>, f64)> =
        traces.into_iter().map(|trace| { let conf = compute_total_confidence(kg, &trace); (trace, conf) }).collect();

    process_data.sort_by(|a, b| sort_key(b).partial_cmp(&sort_key(a)).unwrap_or(std::cmp::Ordering::Equal));

    let deep: Vec<(Vec<String>, f64)> = process_data.iter().filter(|(t, _)| t.len() > 2).cloned().collect();
    let shallow: Vec<(Vec<String>, f64)> = process_data.iter().filter(|(t, _)| t.len() <= 2).cloned().collect();
    let max_deep = max_processes / 2;
    let selected_deep: Vec<(Vec<String>, f64)> = deep.into_iter().take(max_deep).collect();
    let remaining = max_processes.saturating_sub(selected_deep.len());
    let mut selected: Vec<(Vec<String>, f64)> = selected_deep;
    selected.extend(shallow.into_iter().take(remaining));
    selected.sort_by(|a, b| sort_key(b).partial_cmp(&sort_key(a)).unwrap_or(std::cmp::Ordering::Equal));

    for (i, (trace, total_conf)) in selected.into_iter().enumerate() {
        let process_type = classify_process(&trace, &community_map);
        kg.add_process(Process {
            id: format!("process_{i}"),
            entry: trace[0].clone(),
            terminal: trace[trace.len() - 1].clone(),
            steps: trace,
            kind: process_type,
            total_confidence: (total_conf * 10000.0).round() / 10000.0,
        });
    }
}

/// `(normalised_confidence, trace_length)` — geometric mean per hop, tiebreak by
/// length, both ascending-sorted so callers can reverse for highest-first.
fn sort_key(item: &(Vec<String>, f64)) -> (f64, f64) {
    let (trace, total_conf) = item;
    let n_edges = trace.len() as i64 - 1;
    if n_edges <= 0 {
        return (1.0, 0.0);
    }
    let normalised = total_conf.powf(1.0 / n_edges as f64);
    (normalised, trace.len() as f64)
}

fn bfs_traces(
    kg: &KnowledgeGraph,
    start: &str,
    max_depth: usize,
    max_branching: usize,
    min_steps: usize,
) -> Vec<Vec<String>> {
    let mut traces = Vec::new();
    let max_traces = max_branching * 3;
    let mut queue: VecDeque<(String, Vec<String>)> = VecDeque::from([(start.to_string(), vec![start.to_string()])]);

    while let Some((current, path)) = queue.pop_front() {
        if traces.len() >= max_traces {
            break;
        }

        let mut callees = kg.callees_of(&current);
        if callees.is_empty() || path.len() >= max_depth {
            if path.len() >= min_steps {
                traces.push(path);
            }
            continue;
        }

        callees.sort_by(|a, b| b.1.confidence.partial_cmp(&a.1.confidence).unwrap_or(std::cmp::Ordering::Equal));

        let mut extended = false;
        for (callee_id, _) in callees.into_iter().take(max_branching) {
            if !path.contains(&callee_id) {
                let mut next_path = path.clone();
                next_path.push(callee_id.clone());
                queue.push_back((callee_id, next_path));
                extended = true;
            }
        }

        if !extended && path.len() >= min_steps {
            traces.push(path);
        }
    }

    traces
}

fn deduplicate(mut traces: Vec<Vec<String>>) -> Vec<Vec<String>> {
    traces.sort_by_key(|t| std::cmp::Reverse(t.len()));

    let mut result: Vec<Vec<String>> = Vec::new();
    for trace in traces {
        let trace_set: HashSet<&String> = trace.iter().collect();
        let is_subset = result.iter().any(|existing| {
            let existing_set: HashSet<&String> = existing.iter().collect();
            trace_set.is_subset(&existing_set) && trace_set != existing_set
        });
        if !is_subset {
            result.push(trace);
        }
    }
    result
}

fn build_community_map(kg: &KnowledgeGraph) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for comm in kg.communities() {
        for member in comm.members {
            map.insert(member, comm.id.clone());
        }
    }
    map
}

fn classify_process(trace: &[String], community_map: &HashMap<String, String>) -> ProcessKind {
    let mut communities_seen = HashSet::new();
    for sym_id in trace {
        if let Some(comm) = community_map.get(sym_id) {
            communities_seen.insert(comm);
        }
    }
    if communities_seen.len() <= 1 {
        ProcessKind::IntraCommunity
    } else {
        ProcessKind::CrossCommunity
    }
}

fn compute_total_confidence(kg: &KnowledgeGraph, trace: &[String]) -> f64 {
    if trace.len() < 2 {
        return 1.0;
    }
    let mut total = 1.0;
    for pair in trace.windows(2) {
        let (from_id, to_id) = (&pair[0], &pair[1]);
        let callees = kg.callees_of(from_id);
        let edge_conf = callees.iter().find(|(id, _)| id == to_id).map(|(_, edge)| edge.confidence).unwrap_or(0.5);
        total *= edge_conf;
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CallEdge, Symbol, SymbolKind, Visibility};

    fn symbol(id: &str, name: &str, file: &str) -> Symbol {
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
    fn traces_a_simple_call_chain_to_a_process() {
        let mut kg = KnowledgeGraph::new();
        kg.add_symbol(symbol("sym_0001", "MainHandler", "app/main.py"));
        kg.add_symbol(symbol("sym_0002", "step_two", "app/main.py"));
        kg.add_symbol(symbol("sym_0003", "step_three", "app/main.py"));
        kg.add_call(CallEdge { from: "sym_0001".into(), to: "sym_0002".into(), confidence: 0.9, tier: "A".into(), reason: "import-resolved".into(), line: 1 });
        kg.add_call(CallEdge { from: "sym_0002".into(), to: "sym_0003".into(), confidence: 0.85, tier: "B".into(), reason: "same-file".into(), line: 2 });

        let mut config = AnalysisConfig::default();
        config.max_processes = 10;
        config.min_steps = 2;
        run(&config, &mut kg);

        let processes = kg.processes();
        assert!(!processes.is_empty());
        assert_eq!(processes[0].entry, "sym_0001");
    }

    #[test]
    fn no_entry_points_produces_no_processes() {
        let mut kg = KnowledgeGraph::new();
        let config = AnalysisConfig::default();
        run(&config, &mut kg);
        assert!(kg.processes().is_empty());
    }

    #[test]
    fn deduplicate_drops_strict_subsequence_traces() {
        let traces = vec![vec!["a".to_string(), "b".to_string()], vec!["a".to_string(), "b".to_string(), "c".to_string()]];
        let result = deduplicate(traces);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0], vec!["a", "b", "c"]);
    }
}
