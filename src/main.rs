//! # callscope - Main Entry Point
//!
//! Headless inspection tool over the callscope engine. Loads a
//! cachegrind/callgrind profile, optionally a source tree, and answers from
//! the frozen model:
//!
//! - default: profile summary, per-file coverage, hotspot ranking
//! - `--search QUERY`: function-name search results
//! - `--calltree ENTRY`: the call tree below a function name or PC
//! - `--disassemble FUNCTION`: annotated disassembly (needs the object file
//!   on disk and a working `objdump`)
//! - `--export FILE`: the full JSON report for dashboard consumers
//!
//! ```bash
//! callscope callgrind.out.1234 --source-dir ./src --hotspots 20
//! callscope callgrind.out.1234 --calltree main
//! callscope cachegrind.out.1234 --export report.json
//! ```

use std::fs::File;
use std::io::{BufReader, BufWriter};

use anyhow::{Context, Result};
use clap::Parser;
use log::warn;

use callscope::analyzer::{Analyzer, AnalyzerOptions};
use callscope::callgraph::{CallGraph, CallTree};
use callscope::cli::Args;
use callscope::export::{build_report, write_report};
use callscope::profile_data::DEFAULT_INPUT_CAP;
use callscope::sources::SourceTree;

fn main() -> Result<()> {
    env_logger::init();

    let args = Args::parse();

    let sources = match &args.source_dir {
        Some(dir) => SourceTree::from_dir(dir, args.subdir.clone())?,
        None => SourceTree::empty(),
    };

    let options = AnalyzerOptions {
        max_bytes: args.max_bytes.unwrap_or(DEFAULT_INPUT_CAP),
        subdir: args.subdir.clone(),
        disassembler: args.objdump.clone(),
        ..AnalyzerOptions::default()
    };

    let file = File::open(&args.profile)
        .with_context(|| format!("Failed to open profile {}", args.profile.display()))?;
    let analyzer = Analyzer::load(BufReader::new(file), sources, options)
        .with_context(|| format!("Failed to parse profile {}", args.profile.display()))?;

    print_summary(&analyzer, &args);

    if let Some(query) = &args.search {
        print_search(&analyzer, query);
    }

    if let Some(entry) = &args.calltree {
        print_calltree(&analyzer, entry)?;
    }

    if let Some(target) = &args.disassemble {
        print_disassembly(&analyzer, target)?;
    }

    if let Some(path) = &args.export {
        let out = File::create(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        let report = build_report(&analyzer, args.hotspots);
        write_report(BufWriter::new(out), &report)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!("\n📊 Report written to {}", path.display());
    }

    Ok(())
}

fn print_summary(analyzer: &Analyzer, args: &Args) {
    let profile = analyzer.profile();

    println!("🔍 callscope v0.1.0");
    println!("📦 Profile: {} ({})", args.profile.display(), profile.kind);
    if let Some(command) = &profile.command {
        println!("   Command: {command}");
    }
    println!(
        "   Events: {} (primary: {})",
        profile.events.names().join(" "),
        profile.events.primary_name()
    );
    println!(
        "   {} file(s), {}/{} lines covered ({:.1}%)",
        profile.files_analyzed(),
        profile.total_covered_lines,
        profile.total_compiled_lines,
        profile.coverage()
    );

    println!("\nFILES");
    for file in profile.files() {
        println!(
            "  {:<40} {:>5} lines  {:>6.1}%",
            file.path, file.compiled_lines, file.coverage
        );
    }

    let hotspots = analyzer.hotspots(args.hotspots);
    if !hotspots.is_empty() {
        println!("\nHOTSPOTS ({})", profile.events.primary_name());
        for hotspot in &hotspots {
            println!(
                "  {:>6.1}%  {:>12}  {} ({})",
                hotspot.percentage, hotspot.cost, hotspot.name, hotspot.file
            );
        }
    }
}

fn print_search(analyzer: &Analyzer, query: &str) {
    let matches = analyzer.search(query);
    println!("\nSEARCH `{query}`: {} match(es)", matches.len());
    for node in &matches {
        let node = analyzer.graph().node(*node);
        println!("  {} ({})", node.name, node.file);
    }
    if matches.is_empty() {
        for suggestion in analyzer.suggest_entry(query, 5) {
            println!("  did you mean {}?", suggestion.label);
        }
    }
}

fn print_calltree(analyzer: &Analyzer, entry: &str) -> Result<()> {
    let node = analyzer
        .resolve_entry(entry)
        .with_context(|| format!("Cannot resolve entry point `{entry}`"))?;
    let tree = analyzer.subtree_from(node);
    println!("\nCALL TREE from {}", analyzer.graph().node(node).name);
    print_tree_node(analyzer.graph(), &tree, 0);
    Ok(())
}

fn print_tree_node(graph: &CallGraph, tree: &CallTree, depth: usize) {
    let node = graph.node(tree.node);
    let indent = "  ".repeat(depth + 1);
    let calls = tree.calls.map_or(String::new(), |n| format!(" ×{n}"));
    let marker = if tree.repeated { " ↩" } else { "" };
    println!("{indent}{}{calls}  incl {}  excl {}{marker}", node.name, node.inclusive, node.exclusive);
    for child in &tree.children {
        print_tree_node(graph, child, depth + 1);
    }
}

fn print_disassembly(analyzer: &Analyzer, target: &str) -> Result<()> {
    let node = analyzer
        .resolve_entry(target)
        .with_context(|| format!("Cannot resolve function `{target}`"))?;
    let (file, name) = {
        let node = analyzer.graph().node(node);
        (node.file.clone(), node.name.clone())
    };
    let Some(function) = analyzer.function(&file, &name) else {
        warn!("`{name}` is only referenced by the profile, nothing to disassemble");
        return Ok(());
    };

    let listing = analyzer
        .disassemble(function)
        .with_context(|| format!("Failed to disassemble `{name}`"))?;
    println!("\nDISASSEMBLY of {name} ({file})");
    for instruction in &listing {
        let counts = instruction
            .counts
            .as_ref()
            .map_or(String::new(), |c| format!("  [{}]", format_counts(c.as_slice())));
        let marker = if instruction.executed { "▶" } else { " " };
        println!("  {marker} {}  {}{counts}", instruction.pc, instruction.text);
    }
    if listing.is_empty() {
        println!("  (no instructions in range)");
    }
    Ok(())
}

fn format_counts(counts: &[u64]) -> String {
    counts.iter().map(ToString::to_string).collect::<Vec<_>>().join(" ")
}
