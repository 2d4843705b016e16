//! Call graph of the profiled program
//!
//! One node per (file, function) pair, one directed edge per recorded call
//! site. The graph is a multigraph (a caller with two call sites into the
//! same callee keeps two edges) and may contain cycles for recursive
//! programs, so every traversal carries a visited set.
//!
//! Callees the profile references but never defines (external library
//! functions) become *stub nodes*: zero exclusive cost, no PC range, still
//! traversable.

pub mod builder;
pub mod traversal;

use std::collections::{HashMap, HashSet};

use petgraph::graph::DiGraph;
use petgraph::visit::EdgeRef;
use petgraph::Direction;

use crate::domain::Pc;
use crate::profile_data::Counts;

pub use builder::build_graph;
pub use petgraph::graph::NodeIndex;
pub use traversal::CallTree;

/// A function in the call graph.
#[derive(Debug, Clone)]
pub struct CallNode {
    pub file: String,
    pub name: String,
    /// Cost incurred directly in this function (primary event).
    pub exclusive: u64,
    /// Exclusive cost plus the inclusive cost charged to each outgoing call
    /// site. Computed once at build time.
    pub inclusive: u64,
    /// First and last PC in unsigned address order; `None` for stubs and
    /// line-level profiles.
    pub pc_range: Option<(Pc, Pc)>,
    /// Referenced but never defined by the profile.
    pub stub: bool,
}

/// Weight of one call edge.
#[derive(Debug, Clone)]
pub struct CallWeight {
    /// Number of calls made from this site.
    pub count: u64,
    /// Inclusive event vector charged to the call site, when recorded.
    pub inclusive: Option<Counts>,
    pub source_pc: Option<Pc>,
}

/// The frozen call graph plus its lookup index and root set.
#[derive(Debug)]
pub struct CallGraph {
    graph: DiGraph<CallNode, CallWeight>,
    /// file → function name → node
    index: HashMap<String, HashMap<String, NodeIndex>>,
    roots: Vec<NodeIndex>,
}

impl CallGraph {
    #[must_use]
    pub fn node(&self, index: NodeIndex) -> &CallNode {
        &self.graph[index]
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// All nodes, in first-appearance order.
    pub fn nodes(&self) -> impl Iterator<Item = NodeIndex> {
        self.graph.node_indices()
    }

    #[must_use]
    pub fn lookup(&self, file: &str, name: &str) -> Option<NodeIndex> {
        self.index.get(file)?.get(name).copied()
    }

    /// Nodes with no incoming edges. Empty when every function participates
    /// in a cycle.
    #[must_use]
    pub fn roots(&self) -> &[NodeIndex] {
        &self.roots
    }

    /// Outgoing edges as (callee, weight), in call-site appearance order.
    #[must_use]
    pub fn child_edges(&self, node: NodeIndex) -> Vec<(NodeIndex, &CallWeight)> {
        let mut edges: Vec<(NodeIndex, &CallWeight)> = self
            .graph
            .edges_directed(node, Direction::Outgoing)
            .map(|e| (e.target(), e.weight()))
            .collect();
        // petgraph iterates most-recently-added first; restore input order
        edges.reverse();
        edges
    }

    /// Distinct direct callers, in first-appearance order.
    #[must_use]
    pub fn callers(&self, node: NodeIndex) -> Vec<NodeIndex> {
        self.neighbors_in_order(node, Direction::Incoming)
    }

    /// Distinct direct callees, in first-appearance order.
    #[must_use]
    pub fn callees(&self, node: NodeIndex) -> Vec<NodeIndex> {
        self.neighbors_in_order(node, Direction::Outgoing)
    }

    /// Materialize the finite call tree rooted at `entry`.
    #[must_use]
    pub fn subtree_from(&self, entry: NodeIndex) -> CallTree {
        traversal::subtree_from(self, entry)
    }

    fn neighbors_in_order(&self, node: NodeIndex, direction: Direction) -> Vec<NodeIndex> {
        let mut neighbors: Vec<NodeIndex> =
            self.graph.neighbors_directed(node, direction).collect();
        neighbors.reverse();
        let mut seen = HashSet::new();
        neighbors.retain(|&n| seen.insert(n));
        neighbors
    }
}
