//! Function-name search index.
//!
//! An inverted map from search terms to call-graph nodes. Terms for a name
//! are its full lowercase form, its words, a band of prefixes and suffixes,
//! and, for short names, small internal substrings. The substring indexing
//! is a deliberate memory/quality trade-off: worst case O(len²) terms per
//! short name, which is cheap at typical function-name counts and makes
//! two-character fragments findable.

use std::collections::{BTreeSet, HashMap, HashSet};

use petgraph::graph::NodeIndex;

use crate::callgraph::CallGraph;

/// Index every prefix of the lowercase name up to this length.
const MAX_PREFIX_LEN: usize = 12;

/// Index suffixes of these lengths.
const MIN_SUFFIX_LEN: usize = 3;
const MAX_SUFFIX_LEN: usize = 8;

/// Names at most this long also get internal substrings of length 2..=4.
const SHORT_NAME_LEN: usize = 8;

/// Below this many exact hits, widen the query to term prefixes.
const PREFIX_WIDEN_THRESHOLD: usize = 10;

/// Below this many hits, widen again to term substrings.
const SUBSTRING_WIDEN_THRESHOLD: usize = 5;

/// Cap on how many matches get ancestor expansion (UI responsiveness).
const MAX_EXPANDED_MATCHES: usize = 30;

/// Cap on how far up the parent chain expansion walks.
const MAX_ANCESTOR_DEPTH: usize = 20;

/// Inverted term index over function names.
#[derive(Debug)]
pub struct SearchIndex {
    terms: HashMap<String, BTreeSet<NodeIndex>>,
    /// node → its terms; kept so entries could be invalidated, unused at
    /// query time.
    #[allow(dead_code)]
    by_node: HashMap<NodeIndex, BTreeSet<String>>,
}

impl SearchIndex {
    #[must_use]
    pub fn build(graph: &CallGraph) -> Self {
        let mut terms: HashMap<String, BTreeSet<NodeIndex>> = HashMap::new();
        let mut by_node: HashMap<NodeIndex, BTreeSet<String>> = HashMap::new();

        for node in graph.nodes() {
            let name_terms = terms_for(&graph.node(node).name);
            for term in &name_terms {
                terms.entry(term.clone()).or_default().insert(node);
            }
            by_node.insert(node, name_terms);
        }

        Self { terms, by_node }
    }

    /// Look up nodes matching a query.
    ///
    /// Exact term hits come first; sparse results widen to term prefixes,
    /// then to term substrings. The empty query matches nothing.
    #[must_use]
    pub fn search(&self, query: &str) -> Vec<NodeIndex> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return Vec::new();
        }

        let mut results: BTreeSet<NodeIndex> = BTreeSet::new();
        if let Some(nodes) = self.terms.get(&query) {
            results.extend(nodes.iter().copied());
        }

        if results.len() < PREFIX_WIDEN_THRESHOLD {
            for (term, nodes) in &self.terms {
                if term.starts_with(&query) {
                    results.extend(nodes.iter().copied());
                }
            }
        }

        if results.len() < SUBSTRING_WIDEN_THRESHOLD {
            for (term, nodes) in &self.terms {
                if term.contains(&query) {
                    results.extend(nodes.iter().copied());
                }
            }
        }

        results.into_iter().collect()
    }
}

/// Collect the ancestors of each match for UI-side tree expansion.
///
/// One DFS from the roots builds a node→parent map (first parent found
/// wins), then each match, capped for responsiveness, walks its parent
/// chain up to a bounded depth.
#[must_use]
pub fn expand_ancestors(graph: &CallGraph, matches: &[NodeIndex]) -> BTreeSet<NodeIndex> {
    let mut parent: HashMap<NodeIndex, NodeIndex> = HashMap::new();
    let mut visited: HashSet<NodeIndex> = graph.roots().iter().copied().collect();
    let mut stack: Vec<NodeIndex> = graph.roots().to_vec();

    while let Some(node) = stack.pop() {
        for (child, _) in graph.child_edges(node) {
            if visited.insert(child) {
                parent.insert(child, node);
                stack.push(child);
            }
        }
    }

    let mut ancestors = BTreeSet::new();
    for &matched in matches.iter().take(MAX_EXPANDED_MATCHES) {
        let mut current = matched;
        for _ in 0..MAX_ANCESTOR_DEPTH {
            match parent.get(&current) {
                Some(&p) => {
                    ancestors.insert(p);
                    current = p;
                }
                None => break,
            }
        }
    }
    ancestors
}

/// All index terms for one function name.
pub(crate) fn terms_for(name: &str) -> BTreeSet<String> {
    let mut terms = BTreeSet::new();
    let lower = name.to_lowercase();
    if lower.is_empty() {
        return terms;
    }
    terms.insert(lower.clone());

    for word in split_words(name) {
        if word.len() >= 2 {
            terms.insert(word);
        }
    }

    let chars: Vec<char> = lower.chars().collect();
    let n = chars.len();

    for len in 1..=n.min(MAX_PREFIX_LEN) {
        terms.insert(chars[..len].iter().collect());
    }

    for len in MIN_SUFFIX_LEN..=n.min(MAX_SUFFIX_LEN) {
        terms.insert(chars[n - len..].iter().collect());
    }

    if n <= SHORT_NAME_LEN {
        for len in 2..=n.min(4) {
            for start in 0..=n - len {
                terms.insert(chars[start..start + len].iter().collect());
            }
        }
    }

    terms
}

/// Split an identifier into lowercase words on non-alphanumerics,
/// underscores, and camelCase boundaries.
pub(crate) fn split_words(name: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut prev_was_lower = false;

    for c in name.chars() {
        if !c.is_alphanumeric() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            prev_was_lower = false;
            continue;
        }
        if c.is_uppercase() && prev_was_lower && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
        current.extend(c.to_lowercase());
        prev_was_lower = c.is_lowercase() || c.is_numeric();
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}
