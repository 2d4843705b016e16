use std::fs::File;
use std::io::BufReader;

use callscope::callgraph::{build_graph, CallGraph, NodeIndex};
use callscope::domain::EntryError;
use callscope::index::{expand_ancestors, EntryIndex, SearchIndex};
use callscope::parsing::{parse_profile, ParseOptions};

fn load_graph() -> CallGraph {
    let file = File::open("tests/fixtures/hardware_sim.cg").expect("fixture exists");
    let profile =
        parse_profile(BufReader::new(file), &ParseOptions::default()).expect("fixture parses");
    build_graph(&profile)
}

fn names(graph: &CallGraph, nodes: &[NodeIndex]) -> Vec<String> {
    nodes.iter().map(|&n| graph.node(n).name.clone()).collect()
}

#[test]
fn test_search_word_hits_both_processing_functions() {
    let graph = load_graph();
    let index = SearchIndex::build(&graph);

    let found = names(&graph, &index.search("processing"));
    assert_eq!(found, ["advanced_processing"]);

    let found = names(&graph, &index.search("process"));
    assert!(found.contains(&"process_cycle".to_string()));
    assert!(found.contains(&"advanced_processing".to_string()));
}

#[test]
fn test_search_empty_is_empty() {
    let graph = load_graph();
    let index = SearchIndex::build(&graph);
    assert!(index.search("").is_empty());
}

#[test]
fn test_search_every_function_findable_by_name() {
    let graph = load_graph();
    let index = SearchIndex::build(&graph);
    for node in graph.nodes() {
        let name = graph.node(node).name.clone();
        assert!(index.search(&name).contains(&node), "{name} not found by its own name");
    }
}

#[test]
fn test_expand_ancestors_reaches_the_root() {
    let graph = load_graph();
    let index = SearchIndex::build(&graph);

    let matches = index.search("advanced_processing");
    let ancestors = expand_ancestors(&graph, &matches);
    let ancestor_names: Vec<String> =
        ancestors.iter().map(|&n| graph.node(n).name.clone()).collect();

    assert!(ancestor_names.contains(&"main".to_string()));
    assert!(ancestor_names.contains(&"process_cycle".to_string()));
}

#[test]
fn test_entry_by_name_and_partial() {
    let graph = load_graph();
    let index = EntryIndex::build(&graph);

    let by_name = index.resolve("init_hardware").unwrap();
    assert_eq!(graph.node(by_name).name, "init_hardware");

    let by_prefix = index.resolve("init").unwrap();
    assert_eq!(by_prefix, by_name);

    // Word prefix: "hardware" is the second word
    let by_word = index.resolve("hardw").unwrap();
    assert_eq!(by_word, by_name);
}

#[test]
fn test_entry_by_pc_start_and_range() {
    let graph = load_graph();
    let index = EntryIndex::build(&graph);

    let cycle = graph.lookup("src/utils.c", "process_cycle").unwrap();
    assert_eq!(index.resolve("0x2100").unwrap(), cycle);
    assert_eq!(index.resolve("0x2104").unwrap(), cycle);
    assert_eq!(index.resolve("2108").unwrap(), cycle);

    // Past every function's last PC
    let err = index.resolve("0x9000").unwrap_err();
    assert!(matches!(err, EntryError::NotFound(_)));
}

#[test]
fn test_entry_prefers_exact_pc_start_over_containing_range() {
    let graph = load_graph();
    let index = EntryIndex::build(&graph);

    // 0x2200 is advanced_processing's start; no other range contains it
    let advanced = graph.lookup("src/utils.c", "advanced_processing").unwrap();
    assert_eq!(index.resolve("0x2200").unwrap(), advanced);
}

#[test]
fn test_suggestions_capped_and_relevant() {
    let graph = load_graph();
    let index = EntryIndex::build(&graph);

    let labels: Vec<String> =
        index.suggest("process", 10).into_iter().map(|s| s.label).collect();
    assert_eq!(labels, ["process_cycle", "advanced_processing"]);

    assert_eq!(index.suggest("process", 1).len(), 1);

    let pc_labels: Vec<String> =
        index.suggest("0x21", 10).into_iter().map(|s| s.label).collect();
    assert_eq!(pc_labels, ["0x2100"]);
}
