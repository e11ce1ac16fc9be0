//! Graph Utilities (C4): dependency graph construction, cycle detection,
//! priority-aware topological sort, critical path, and dependency-chain
//! length.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use crate::model::ScheduleItem;

/// Adjacency map: item id -> ids it depends on.
pub type DependencyGraph = HashMap<String, Vec<String>>;

/// Builds the dependency graph from a set of converted items. Missing
/// dependency ids (referring to nothing in `items`) are left as-is; checking
/// for them is the caller's responsibility (§4.6 validation upstream of the
/// allocator).
pub fn build_graph(items: &[ScheduleItem]) -> DependencyGraph {
    items.iter().map(|item| (item.id.clone(), item.dependencies.clone())).collect()
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub has_cycle: bool,
    pub cycles: Vec<Vec<String>>,
}

/// DFS cycle detection over `graph`'s dependency edges. Traversal order is
/// deterministic (ids visited in sorted order) so repeated calls on the same
/// graph report the same cycle paths.
pub fn detect_cycles(graph: &DependencyGraph) -> CycleReport {
    let mut ids: Vec<&String> = graph.keys().collect();
    ids.sort();

    let mut visited: HashSet<String> = HashSet::new();
    let mut cycles: Vec<Vec<String>> = Vec::new();

    for id in ids {
        if !visited.contains(id) {
            let mut stack: Vec<String> = Vec::new();
            let mut in_stack: HashSet<String> = HashSet::new();
            dfs_visit(id, graph, &mut visited, &mut stack, &mut in_stack, &mut cycles);
        }
    }

    CycleReport { has_cycle: !cycles.is_empty(), cycles }
}

fn dfs_visit(
    node: &str,
    graph: &DependencyGraph,
    visited: &mut HashSet<String>,
    stack: &mut Vec<String>,
    in_stack: &mut HashSet<String>,
    cycles: &mut Vec<Vec<String>>,
) {
    visited.insert(node.to_string());
    stack.push(node.to_string());
    in_stack.insert(node.to_string());

    if let Some(deps) = graph.get(node) {
        let mut deps_sorted = deps.clone();
        deps_sorted.sort();
        for dep in deps_sorted {
            if in_stack.contains(&dep) {
                let start = stack.iter().position(|n| n == &dep).expect("dep is in_stack");
                let mut cycle = stack[start..].to_vec();
                cycle.push(dep);
                cycles.push(cycle);
            } else if !visited.contains(&dep) {
                dfs_visit(&dep, graph, visited, stack, in_stack, cycles);
            }
        }
    }

    stack.pop();
    in_stack.remove(node);
}

/// Kahn's algorithm with a priority-ordered ready queue: among nodes with
/// satisfied dependencies, the highest-`priority` one (ties broken by id,
/// ascending) is always emitted next.
pub fn topological_sort(graph: &DependencyGraph, priority: &HashMap<String, f64>) -> Vec<String> {
    let mut in_degree: HashMap<String, usize> = graph.keys().map(|k| (k.clone(), 0)).collect();
    let mut dependents: HashMap<String, Vec<String>> = HashMap::new();

    for (id, deps) in graph {
        for dep in deps {
            *in_degree.entry(id.clone()).or_insert(0) += 1;
            dependents.entry(dep.clone()).or_default().push(id.clone());
        }
    }

    let priority_of = |id: &str| priority.get(id).copied().unwrap_or(0.0);
    let order_key = |a: &str, b: &str| -> Ordering {
        priority_of(b).partial_cmp(&priority_of(a)).unwrap_or(Ordering::Equal).then_with(|| a.cmp(b))
    };

    let mut ready: Vec<String> = in_degree.iter().filter(|(_, &d)| d == 0).map(|(k, _)| k.clone()).collect();
    let mut result: Vec<String> = Vec::with_capacity(graph.len());
    let mut emitted: HashSet<String> = HashSet::new();

    while !ready.is_empty() {
        ready.sort_by(|a, b| order_key(a, b));
        let next = ready.remove(0);
        emitted.insert(next.clone());
        result.push(next.clone());

        if let Some(deps_of_next) = dependents.get(&next).cloned() {
            for dependent in deps_of_next {
                if let Some(d) = in_degree.get_mut(&dependent) {
                    *d -= 1;
                    if *d == 0 {
                        ready.push(dependent);
                    }
                }
            }
        }
    }

    // Defensive: any nodes left unvisited imply a cycle that validation
    // should already have caught upstream; append them in priority order
    // rather than dropping them silently.
    if result.len() < graph.len() {
        let mut remaining: Vec<String> = graph.keys().filter(|k| !emitted.contains(*k)).cloned().collect();
        remaining.sort_by(|a, b| order_key(a, b));
        result.extend(remaining);
    }

    result
}

/// Longest path (in whatever unit `duration` is expressed) through a node
/// set given as `(id, duration, dependency_ids)` triples. Assumes the input
/// is acyclic; callers must validate that separately.
pub fn critical_path_minutes<'a>(nodes: impl Iterator<Item = (&'a str, i64, &'a [String])>) -> i64 {
    let nodes: Vec<(&str, i64, &[String])> = nodes.collect();
    let mut duration_of: HashMap<&str, i64> = HashMap::new();
    let mut deps_of: HashMap<&str, &[String]> = HashMap::new();
    for (id, dur, deps) in &nodes {
        duration_of.insert(id, *dur);
        deps_of.insert(id, deps);
    }

    let mut memo: HashMap<String, i64> = HashMap::new();

    fn longest_path(id: &str, duration_of: &HashMap<&str, i64>, deps_of: &HashMap<&str, &[String]>, memo: &mut HashMap<String, i64>) -> i64 {
        if let Some(&cached) = memo.get(id) {
            return cached;
        }
        let duration = *duration_of.get(id).unwrap_or(&0);
        let deps = deps_of.get(id).copied().unwrap_or(&[]);
        let best_dep = deps.iter().map(|d| longest_path(d, duration_of, deps_of, memo)).max().unwrap_or(0);
        let total = duration + best_dep;
        memo.insert(id.to_string(), total);
        total
    }

    nodes.iter().map(|(id, _, _)| longest_path(id, &duration_of, &deps_of, &mut memo)).max().unwrap_or(0)
}

/// Maximum depth of the dependency DAG rooted at `id`: `1` for a leaf with no
/// dependencies, `maxDepth(deps) + 1` otherwise.
pub fn dependency_chain_length(graph: &DependencyGraph, id: &str) -> usize {
    let mut memo: HashMap<String, usize> = HashMap::new();

    fn depth(id: &str, graph: &DependencyGraph, memo: &mut HashMap<String, usize>) -> usize {
        if let Some(&cached) = memo.get(id) {
            return cached;
        }
        let deps = graph.get(id).cloned().unwrap_or_default();
        let max_child = deps.iter().map(|d| depth(d, graph, memo)).max().unwrap_or(0);
        let result = max_child + 1;
        memo.insert(id.to_string(), result);
        result
    }

    depth(id, graph, &mut memo)
}
