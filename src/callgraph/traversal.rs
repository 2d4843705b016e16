//! Cycle-safe call-tree materialization.
//!
//! Recursion makes the raw graph cyclic, so a plain depth-first expansion
//! would never terminate. The traversal carries a visited set keyed by node
//! identity: the first visit expands a node's children, every later visit
//! emits a bare leaf marked `repeated`. Output is therefore a finite tree
//! with at most one expansion per node.

use std::collections::HashSet;

use petgraph::graph::NodeIndex;

use super::CallGraph;

/// One node of a materialized call tree.
#[derive(Debug, Clone)]
pub struct CallTree {
    pub node: NodeIndex,
    /// Call count on the edge from the parent; `None` for the entry node.
    pub calls: Option<u64>,
    /// This node was already expanded elsewhere in the tree; its children
    /// are not repeated here.
    pub repeated: bool,
    pub children: Vec<CallTree>,
}

impl CallTree {
    /// Total number of tree nodes, leaves included.
    #[must_use]
    pub fn size(&self) -> usize {
        1 + self.children.iter().map(CallTree::size).sum::<usize>()
    }
}

/// Expand the call tree rooted at `entry`.
#[must_use]
pub fn subtree_from(graph: &CallGraph, entry: NodeIndex) -> CallTree {
    let mut visited = HashSet::new();
    expand(graph, entry, None, &mut visited)
}

fn expand(
    graph: &CallGraph,
    node: NodeIndex,
    calls: Option<u64>,
    visited: &mut HashSet<NodeIndex>,
) -> CallTree {
    if !visited.insert(node) {
        return CallTree { node, calls, repeated: true, children: Vec::new() };
    }
    let children = graph
        .child_edges(node)
        .into_iter()
        .map(|(target, weight)| expand(graph, target, Some(weight.count), visited))
        .collect();
    CallTree { node, calls, repeated: false, children }
}
