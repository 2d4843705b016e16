//! Call graph construction from a frozen profile.

use std::collections::HashMap;

use log::{debug, info};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;

use super::{CallGraph, CallNode, CallWeight};
use crate::profile_data::Profile;

/// Build the call graph: one node per (file, function), one edge per call
/// site, stub nodes for unresolved targets, inclusive totals computed from
/// the edge costs the profile itself recorded.
#[must_use]
pub fn build_graph(profile: &Profile) -> CallGraph {
    let primary = profile.events.primary();
    let mut graph: DiGraph<CallNode, CallWeight> = DiGraph::new();
    let mut index: HashMap<String, HashMap<String, NodeIndex>> = HashMap::new();

    // Pass 1: a node for every function the profile defines, in input order.
    for file in profile.files() {
        for function in file.functions() {
            let node = graph.add_node(CallNode {
                file: file.path.clone(),
                name: function.name.clone(),
                exclusive: function.totals.get(primary),
                inclusive: 0,
                pc_range: function.pc_range(),
                stub: false,
            });
            index.entry(file.path.clone()).or_default().insert(function.name.clone(), node);
        }
    }

    // Pass 2: edges. Targets fall back to the caller's own file when the
    // profile omitted `cfi=`; targets the profile never defined become stubs.
    for file in profile.files() {
        for function in file.functions() {
            let source = index[&file.path][&function.name];
            for edge in &function.calls {
                let target_file = edge.target_file.as_deref().unwrap_or(&file.path);
                let target = match index.get(target_file).and_then(|m| m.get(&edge.target_name)) {
                    Some(&node) => node,
                    None => {
                        debug!("stub node for unresolved callee {target_file}:{}", edge.target_name);
                        let node = graph.add_node(CallNode {
                            file: target_file.to_string(),
                            name: edge.target_name.clone(),
                            exclusive: 0,
                            inclusive: 0,
                            pc_range: None,
                            stub: true,
                        });
                        index
                            .entry(target_file.to_string())
                            .or_default()
                            .insert(edge.target_name.clone(), node);
                        node
                    }
                };
                graph.add_edge(
                    source,
                    target,
                    CallWeight {
                        count: edge.count,
                        inclusive: edge.inclusive.clone(),
                        source_pc: edge.source_pc,
                    },
                );
            }
        }
    }

    // Inclusive = exclusive + the inclusive cost charged to each outgoing
    // call site. The edge value already carries the callee's transitive
    // cost, so children are never re-entered; recursion cycles would
    // otherwise double-count.
    for node in graph.node_indices() {
        let from_calls: u64 = graph
            .edges_directed(node, Direction::Outgoing)
            .filter_map(|e| e.weight().inclusive.as_ref())
            .map(|counts| counts.get(primary))
            .sum();
        let exclusive = graph[node].exclusive;
        graph[node].inclusive = exclusive.saturating_add(from_calls);
    }

    let roots: Vec<NodeIndex> = graph.externals(Direction::Incoming).collect();

    info!(
        "call graph: {} node(s), {} edge(s), {} root(s)",
        graph.node_count(),
        graph.edge_count(),
        roots.len()
    );
    CallGraph { graph, index, roots }
}
