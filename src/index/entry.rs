//! Entry-point resolution.
//!
//! Maps user input (a function name, a partial name, or a PC address) to a
//! call-graph node. Address lookups try an exact PC-start hit first, then
//! binary-search the sorted range table for a containing function.

use std::collections::{BTreeSet, HashMap, HashSet};

use petgraph::graph::NodeIndex;

use super::search::split_words;
use crate::callgraph::CallGraph;
use crate::domain::{EntryError, Pc};

/// Full-name prefixes of these lengths go into the partial map.
const NAME_PREFIX_MIN: usize = 3;
const NAME_PREFIX_MAX: usize = 8;

/// Per-word prefixes of these lengths go into the partial map.
const WORD_PREFIX_MIN: usize = 3;
const WORD_PREFIX_MAX: usize = 6;

/// Minimum query length for partial-name resolution.
const PARTIAL_QUERY_MIN: usize = 3;

#[derive(Debug)]
struct NameEntry {
    lower: String,
    original: String,
    node: NodeIndex,
}

/// A candidate shown while the user is still typing.
#[derive(Debug, Clone)]
pub struct Suggestion {
    pub node: NodeIndex,
    /// Function name, or formatted PC for address suggestions.
    pub label: String,
}

/// Immutable entry-point index over the call graph.
#[derive(Debug)]
pub struct EntryIndex {
    by_name: HashMap<String, NodeIndex>,
    /// Names with leading underscores stripped (`__libc_start` → `libc_start`).
    by_stripped: HashMap<String, NodeIndex>,
    partial: HashMap<String, BTreeSet<NodeIndex>>,
    by_pc_start: HashMap<Pc, NodeIndex>,
    /// (start, end, node), sorted by start for binary search.
    ranges: Vec<(Pc, Pc, NodeIndex)>,
    /// All names in first-appearance order, for fallback scans and
    /// suggestions.
    names: Vec<NameEntry>,
}

impl EntryIndex {
    #[must_use]
    pub fn build(graph: &CallGraph) -> Self {
        let mut by_name = HashMap::new();
        let mut by_stripped = HashMap::new();
        let mut partial: HashMap<String, BTreeSet<NodeIndex>> = HashMap::new();
        let mut by_pc_start = HashMap::new();
        let mut ranges = Vec::new();
        let mut names = Vec::new();

        for node in graph.nodes() {
            let original = graph.node(node).name.clone();
            let lower = original.to_lowercase();

            by_name.entry(lower.clone()).or_insert(node);
            let stripped = lower.trim_start_matches('_');
            if stripped != lower && !stripped.is_empty() {
                by_stripped.entry(stripped.to_string()).or_insert(node);
            }

            let chars: Vec<char> = lower.chars().collect();
            for len in NAME_PREFIX_MIN..=chars.len().min(NAME_PREFIX_MAX) {
                partial.entry(chars[..len].iter().collect()).or_default().insert(node);
            }
            for word in split_words(&original) {
                let word_chars: Vec<char> = word.chars().collect();
                for len in WORD_PREFIX_MIN..=word_chars.len().min(WORD_PREFIX_MAX) {
                    partial.entry(word_chars[..len].iter().collect()).or_default().insert(node);
                }
            }

            if let Some((start, end)) = graph.node(node).pc_range {
                by_pc_start.entry(start).or_insert(node);
                ranges.push((start, end, node));
            }

            names.push(NameEntry { lower, original, node });
        }

        ranges.sort_by_key(|&(start, _, _)| start);

        Self { by_name, by_stripped, partial, by_pc_start, ranges, names }
    }

    /// Resolve user input to a node.
    ///
    /// # Errors
    /// Returns [`EntryError::NotFound`] when nothing matches; never panics
    /// on odd input.
    pub fn resolve(&self, input: &str) -> Result<NodeIndex, EntryError> {
        let query = input.trim().to_lowercase();
        let not_found = || EntryError::NotFound(input.trim().to_string());
        if query.is_empty() {
            return Err(not_found());
        }

        if let Some(&node) = self.by_name.get(&query) {
            return Ok(node);
        }
        if let Some(&node) = self.by_stripped.get(&query) {
            return Ok(node);
        }

        if let Some(pc) = Pc::parse_lenient(&query) {
            if let Some(&node) = self.by_pc_start.get(&pc) {
                return Ok(node);
            }
            if let Some(node) = self.range_lookup(pc) {
                return Ok(node);
            }
        }

        if query.len() >= PARTIAL_QUERY_MIN {
            if let Some(nodes) = self.partial.get(&query) {
                if let Some(&node) = nodes.iter().next() {
                    return Ok(node);
                }
            }
            if let Some(entry) = self.names.iter().find(|e| e.lower.starts_with(&query)) {
                return Ok(entry.node);
            }
        }

        Err(not_found())
    }

    /// Candidates whose name contains the query, plus PC-start entries when
    /// the query looks like an address. Capped at `limit`.
    #[must_use]
    pub fn suggest(&self, input: &str, limit: usize) -> Vec<Suggestion> {
        let query = input.trim().to_lowercase();
        if query.is_empty() || limit == 0 {
            return Vec::new();
        }

        let mut suggestions = Vec::new();
        let mut seen: HashSet<NodeIndex> = HashSet::new();

        for entry in &self.names {
            if suggestions.len() == limit {
                return suggestions;
            }
            if entry.lower.contains(&query) && seen.insert(entry.node) {
                suggestions.push(Suggestion { node: entry.node, label: entry.original.clone() });
            }
        }

        if Pc::parse_lenient(&query).is_some() {
            let prefix = format!("0x{}", query.trim_start_matches("0x"));
            for &(start, _, node) in &self.ranges {
                if suggestions.len() == limit {
                    break;
                }
                if start.to_string().starts_with(&prefix) && seen.insert(node) {
                    suggestions.push(Suggestion { node, label: start.to_string() });
                }
            }
        }

        suggestions
    }

    /// Binary-search the range table for a function containing `pc`.
    fn range_lookup(&self, pc: Pc) -> Option<NodeIndex> {
        let upper = self.ranges.partition_point(|&(start, _, _)| start <= pc);
        // Nearest-start candidate first; earlier ranges may still contain
        // the address when functions overlap
        self.ranges[..upper]
            .iter()
            .rev()
            .find(|&&(_, end, _)| end >= pc)
            .map(|&(_, _, node)| node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callgraph::build_graph;
    use crate::parsing::{parse_profile, ParseOptions};
    use std::io::Cursor;

    const TWO_FUNCTIONS: &str = "# callgrind format\n\
        events: Ir\n\
        positions: instr line\n\
        fl=a.c\n\
        fn=frobnicate_buffer\n\
        0x1000 1 1\n\
        0x1010 2 1\n\
        fn=_quiesce\n\
        0x2000 5 1\n\
        0x2040 6 1\n";

    fn index_of(text: &str) -> (CallGraph, EntryIndex) {
        let profile = parse_profile(Cursor::new(text), &ParseOptions::default()).expect("parse");
        let graph = build_graph(&profile);
        let index = EntryIndex::build(&graph);
        (graph, index)
    }

    #[test]
    fn test_resolve_exact_name_case_insensitive() {
        let (graph, index) = index_of(TWO_FUNCTIONS);
        let node = index.resolve("Frobnicate_Buffer").unwrap();
        assert_eq!(graph.node(node).name, "frobnicate_buffer");
    }

    #[test]
    fn test_resolve_stripped_leading_underscores() {
        let (graph, index) = index_of(TWO_FUNCTIONS);
        let node = index.resolve("quiesce").unwrap();
        assert_eq!(graph.node(node).name, "_quiesce");
    }

    #[test]
    fn test_resolve_pc_start_and_range() {
        let (graph, index) = index_of(TWO_FUNCTIONS);
        // Exact start, with and without prefix
        assert_eq!(graph.node(index.resolve("0x1000").unwrap()).name, "frobnicate_buffer");
        assert_eq!(graph.node(index.resolve("2000").unwrap()).name, "_quiesce");
        // Inside the range
        assert_eq!(graph.node(index.resolve("0x1008").unwrap()).name, "frobnicate_buffer");
        assert_eq!(graph.node(index.resolve("0x2040").unwrap()).name, "_quiesce");
        // Past the last PC
        assert!(index.resolve("0x2041").is_err());
        assert!(index.resolve("0x999").is_err());
    }

    #[test]
    fn test_resolve_partial_prefix() {
        let (graph, index) = index_of(TWO_FUNCTIONS);
        assert_eq!(graph.node(index.resolve("fro").unwrap()).name, "frobnicate_buffer");
        // Word prefix: "buffer" is a word of frobnicate_buffer
        assert_eq!(graph.node(index.resolve("buf").unwrap()).name, "frobnicate_buffer");
    }

    #[test]
    fn test_resolve_linear_fallback_for_long_prefixes() {
        let (graph, index) = index_of(TWO_FUNCTIONS);
        // 11 chars: past the partial map's indexed widths
        assert_eq!(graph.node(index.resolve("frobnicate_").unwrap()).name, "frobnicate_buffer");
    }

    #[test]
    fn test_resolve_miss_is_not_found() {
        let (_, index) = index_of(TWO_FUNCTIONS);
        let err = index.resolve("does_not_exist").unwrap_err();
        assert!(matches!(err, EntryError::NotFound(_)));
        assert!(index.resolve("").is_err());
        assert!(index.resolve("zz").is_err());
    }

    #[test]
    fn test_suggest_names_and_addresses() {
        let (_, index) = index_of(TWO_FUNCTIONS);
        let byname: Vec<String> = index.suggest("buffer", 10).into_iter().map(|s| s.label).collect();
        assert_eq!(byname, ["frobnicate_buffer"]);

        let bypc: Vec<String> = index.suggest("0x10", 10).into_iter().map(|s| s.label).collect();
        assert_eq!(bypc, ["0x1000"]);
    }

    #[test]
    fn test_suggest_respects_limit() {
        let (_, index) = index_of(TWO_FUNCTIONS);
        assert_eq!(index.suggest("f", 1).len(), 1);
        assert!(index.suggest("f", 0).is_empty());
    }
}
