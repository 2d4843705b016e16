//! # callscope - Cachegrind/Callgrind Profile Analysis Engine
//!
//! callscope ingests profiler output in the cachegrind/callgrind textual
//! format and builds an indexed, query-ready model of the profiled program:
//! per-file and per-function event counters, line- and PC-level attribution,
//! coverage, and a reconstructed call graph with inclusive/exclusive costs.
//! It answers the lookups an interactive explorer needs: entry-point
//! resolution, function search, call-tree navigation, annotated disassembly.
//!
//! ## Architecture Overview
//!
//! ```text
//! profile text ──▶ ┌──────────────┐     ┌──────────────┐
//!                  │   Parsing    │────▶│   Analysis   │
//!                  │ (state       │     │ (coverage,   │
//!                  │  machine)    │     │  hotspots)   │
//!                  └──────────────┘     └──────┬───────┘
//!                                              │ frozen Profile
//!                         ┌────────────────────┼────────────────────┐
//!                         ▼                    ▼                    ▼
//!                  ┌──────────────┐     ┌──────────────┐     ┌──────────────┐
//!                  │  Call Graph  │     │   Indices    │     │   Sources    │
//!                  │ (petgraph,   │     │ (search,     │     │ (path        │
//!                  │  cycle-safe) │     │  entry)      │     │  resolver)   │
//!                  └──────┬───────┘     └──────┬───────┘     └──────┬───────┘
//!                         └────────────────────┼────────────────────┘
//!                                              ▼
//!                  ┌──────────────────────────────────────────────┐
//!                  │              Analyzer (query API)            │
//!                  │  file/function lookups · roots · subtrees    │
//!                  │  search · resolve_entry · disassemble        │
//!                  └──────────────────────┬───────────────────────┘
//!                                         │
//!                         ┌───────────────┴───────────────┐
//!                         ▼                               ▼
//!                  ┌──────────────┐                ┌──────────────┐
//!                  │  CLI binary  │                │ JSON report  │
//!                  │  (headless)  │                │  (export)    │
//!                  └──────────────┘                └──────────────┘
//! ```
//!
//! ## Module Structure
//!
//! - [`parsing`]: streaming state-machine parser; linear in input size,
//!   memory bounded by distinct (file, function) pairs
//! - [`profile_data`]: the frozen data model (vocabulary, line/PC records,
//!   call edges, files, functions)
//! - [`analysis`]: coverage roll-ups and hotspot ranking
//! - [`callgraph`]: directed multigraph of functions with cycle-safe
//!   traversals and repeat-leaf subtree materialization
//! - [`index`]: search index (prefix/suffix/word terms) and entry-point
//!   matcher (name, PC, PC-range binary search)
//! - [`sources`]: resolver from profile paths to an uploaded source tree
//! - [`disasm`]: external-disassembler adapter behind a capability trait
//! - [`analyzer`]: the outward query facade; builds everything, then only
//!   reads
//! - [`export`]: JSON report for front-end consumers
//! - [`cli`], `main`: headless inspection binary
//!
//! ## Concurrency Model
//!
//! The engine is single-threaded per profile: parse → analyze → index runs
//! to completion before any query observes the model, and the model never
//! mutates afterwards. Queries are pure reads and safe to run concurrently.
//! The disassembler adapter blocks on a child process; run it off the
//! interactive path.
//!
//! ## Typical Usage
//!
//! ```no_run
//! use std::fs::File;
//! use std::io::BufReader;
//! use callscope::analyzer::{Analyzer, AnalyzerOptions};
//! use callscope::sources::SourceTree;
//!
//! # fn main() -> anyhow::Result<()> {
//! let profile = BufReader::new(File::open("callgrind.out.1234")?);
//! let sources = SourceTree::from_dir("./src".as_ref(), None)?;
//! let analyzer = Analyzer::load(profile, sources, AnalyzerOptions::default())?;
//!
//! let entry = analyzer.resolve_entry("main")?;
//! let tree = analyzer.subtree_from(entry);
//! println!("{} nodes below main", tree.size());
//! # Ok(())
//! # }
//! ```

pub mod analysis;
pub mod analyzer;
pub mod callgraph;
pub mod cli;
pub mod disasm;
pub mod domain;
pub mod export;
pub mod index;
pub mod parsing;
pub mod profile_data;
pub mod sources;

pub use analyzer::{Analyzer, AnalyzerOptions};
pub use domain::{AnalysisKind, DisasmError, EntryError, ParseError, Pc, PcRange};
