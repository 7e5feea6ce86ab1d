//! Entry-point scoring for process detection. Grounded on `graph/scoring.py`.

use std::sync::OnceLock;

use regex::Regex;

use crate::config::SymbolKind;
use crate::graph::KnowledgeGraph;

const UTILITY_SEGMENTS: &[&str] = &["utils", "helpers", "extensions", "common", "shared", "utilities"];

const FRAMEWORK_TYPE_EXCLUSIONS: &[&str] = &[
    "Task", "ValueTask", "ILogger", "IConfiguration", "IServiceCollection", "IServiceProvider",
    "CancellationToken", "HttpClient",
];

fn entry_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            r"(?i)^.*Controller$",
            r"(?i)^.*Handler$",
            r"(?i)^.*Endpoint$",
            r"(?i)^.*Middleware$",
            r"(?i)^Main$",
            r"(?i)^Startup$",
            r"(?i)^Configure.*$",
            r"(?i)^Map.*Endpoints$",
            r"(?i)^.*Route$",
            r"(?i)^.*Listener$",
            r"(?i)^handle.*$",
            r"^on[A-Z].*$",
            r"(?i)^process.*$",
        ]
        .iter()
        .map(|p| Regex::new(p).expect("static entry-point regex is valid"))
        .collect()
    })
}

fn test_path_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            r"(?i)(?:^|[/\\])tests?[/\\]",
            r"(?i)(?:^|[/\\])specs?[/\\]",
            r"(?i)(?:^|[/\\])__tests__[/\\]",
            r"(?i)(?:^|[/\\])TestHarness[/\\]",
            r"(?i)(?:Tests?|Specs?|_test|_spec)\.",
            r"(?i)\.Tests?[/\\]",
        ]
        .iter()
        .map(|p| Regex::new(p).expect("static test-path regex is valid"))
        .collect()
    })
}

fn probe_depth(kg: &KnowledgeGraph, sym_id: &str, max_hops: usize) -> usize {
    use std::collections::HashSet;

    let mut visited: HashSet<String> = HashSet::from([sym_id.to_string()]);
    let mut frontier = vec![sym_id.to_string()];
    let mut depth = 0;

    for _ in 0..max_hops {
        let mut next_frontier = Vec::new();
        for node in &frontier {
            for (callee_id, _) in kg.callees_of(node) {
                if visited.insert(callee_id.clone()) {
                    next_frontier.push(callee_id);
                }
            }
        }
        if next_frontier.is_empty() {
            break;
        }
        frontier = next_frontier;
        depth += 1;
    }
    depth
}

fn matches_any(patterns: &[Regex], text: &str) -> bool {
    patterns.iter().any(|p| p.is_match(text))
}

/// Score every function/method/constructor symbol as a potential process entry
/// point, returning `(symbol_id, score)` sorted highest-score first.
pub fn score_entry_points(kg: &KnowledgeGraph) -> Vec<(String, f64)> {
    let mut scores = Vec::new();

    for sym in kg.symbols() {
        if !matches!(sym.kind, SymbolKind::Method | SymbolKind::Function | SymbolKind::Constructor) {
            continue;
        }
        if FRAMEWORK_TYPE_EXCLUSIONS.contains(&sym.name.as_str()) {
            continue;
        }
        if matches_any(test_path_patterns(), &sym.file) {
            continue;
        }

        let out_degree = kg.callees_of(&sym.id).len();
        let in_degree = kg.callers_of(&sym.id).len();
        let base_score = out_degree as f64 / (in_degree as f64 + 1.0);
        if base_score == 0.0 {
            continue;
        }

        let export_mult = if sym.exported { 2.0 } else { 1.0 };

        let mut name_mult: f64 = 1.0;
        if matches_any_match(entry_patterns(), &sym.name) {
            name_mult = 1.5;
        }
        if let Some(parent) = &sym.parent {
            if matches_any_match(entry_patterns(), parent) {
                name_mult = name_mult.max(1.3);
            }
        }

        let utility_penalty = if UTILITY_SEGMENTS.iter().any(|seg| sym.file.to_lowercase().contains(seg)) {
            0.3
        } else {
            1.0
        };

        let depth = probe_depth(kg, &sym.id, 3);
        let depth_bonus = 1.0 + (depth as f64 * 0.5);

        let score = base_score * export_mult * name_mult * utility_penalty * depth_bonus;
        scores.push((sym.id.clone(), score));
    }

    scores.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    scores
}

/// `entry_patterns` are anchored with `^`/`$` like Python's `re.match` (anchored at
/// the start only) — matching the whole name via full-match semantics here since
/// every pattern already carries its own `$`/`^` anchors.
fn matches_any_match(patterns: &[Regex], text: &str) -> bool {
    patterns.iter().any(|p| p.find(text).map(|m| m.start() == 0).unwrap_or(false))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CallEdge, Symbol, Visibility};

    fn symbol(id: &str, name: &str, file: &str, kind: SymbolKind, exported: bool) -> Symbol {
        Symbol {
            id: id.to_string(),
            name: name.to_string(),
            kind,
            file: file.to_string(),
            line: 1,
            visibility: Visibility::Public,
            exported,
            parent: None,
            language: Some("py".to_string()),
            byte_range: None,
            parameter_types: None,
        }
    }

    #[test]
    fn handler_name_pattern_boosts_score() {
        let mut kg = KnowledgeGraph::new();
        kg.add_symbol(symbol("sym_0001", "OrderHandler", "app/orders.py", SymbolKind::Function, true));
        kg.add_symbol(symbol("sym_0002", "callee", "app/orders.py", SymbolKind::Function, false));
        kg.add_call(CallEdge { from: "sym_0001".into(), to: "sym_0002".into(), confidence: 0.9, tier: "A".into(), reason: "import-resolved".into(), line: 1 });

        let scores = score_entry_points(&kg);
        let (top_id, _) = &scores[0];
        assert_eq!(top_id, "sym_0001");
    }

    #[test]
    fn test_file_symbols_are_excluded() {
        let mut kg = KnowledgeGraph::new();
        kg.add_symbol(symbol("sym_0001", "run", "tests/test_orders.py", SymbolKind::Function, true));
        kg.add_symbol(symbol("sym_0002", "callee", "tests/test_orders.py", SymbolKind::Function, false));
        kg.add_call(CallEdge { from: "sym_0001".into(), to: "sym_0002".into(), confidence: 0.9, tier: "A".into(), reason: "import-resolved".into(), line: 1 });

        assert!(score_entry_points(&kg).is_empty());
    }

    #[test]
    fn leaf_symbol_with_no_callees_scores_zero_and_is_excluded() {
        let mut kg = KnowledgeGraph::new();
        kg.add_symbol(symbol("sym_0001", "leaf", "app/util.py", SymbolKind::Function, true));
        assert!(score_entry_points(&kg).is_empty());
    }
}
