//! The outward query surface of the engine.
//!
//! [`Analyzer::load`] runs the whole pipeline (parse, coverage, source
//! resolution, call graph, indices) and freezes the result. Every query
//! afterwards is a pure read over the frozen model, so an `Analyzer` can be
//! shared across readers without synchronization. The one impure corner is
//! disassembly, which shells out to an external tool; results are memoized
//! per (object file, PC range) behind a `RefCell`, and only successful
//! listings are cached.

use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap};
use std::io::BufRead;
use std::path::Path;

use crate::analysis::{compute_coverage, rank_hotspots, FunctionHotspot};
use crate::callgraph::{build_graph, CallGraph, CallTree, NodeIndex};
use crate::disasm::{annotate, range_for, AssemblyInstruction, Disassembler, ObjdumpDisassembler,
    RawInstruction, DEFAULT_RANGE_LEAD, DEFAULT_RANGE_TAIL};
use crate::domain::{DisasmError, EntryError, ParseError, PcRange};
use crate::index::{expand_ancestors, EntryIndex, SearchIndex, Suggestion};
use crate::parsing::{parse_profile, ParseOptions};
use crate::profile_data::{FileRecord, FunctionRecord, Profile, DEFAULT_INPUT_CAP};
use crate::sources::SourceTree;

/// Configuration handed in by the caller (the UI collaborator supplies
/// these as plain values; there is no CLI/env handling at this level).
#[derive(Debug, Clone)]
pub struct AnalyzerOptions {
    /// Cap on profile input size in bytes.
    pub max_bytes: u64,
    /// Subdirectory prefix for source resolution probes.
    pub subdir: Option<String>,
    /// Disassembler executable name.
    pub disassembler: String,
    /// Bytes of context disassembled before a function's first sampled PC.
    pub disasm_lead: u64,
    /// Bytes disassembled past a function's last sampled PC.
    pub disasm_tail: u64,
}

impl Default for AnalyzerOptions {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_INPUT_CAP,
            subdir: None,
            disassembler: ObjdumpDisassembler::DEFAULT_TOOL.to_string(),
            disasm_lead: DEFAULT_RANGE_LEAD,
            disasm_tail: DEFAULT_RANGE_TAIL,
        }
    }
}

/// A loaded profile with its graph and indices, ready for queries.
pub struct Analyzer {
    profile: Profile,
    graph: CallGraph,
    search: SearchIndex,
    entries: EntryIndex,
    disassembler: Box<dyn Disassembler>,
    disasm_lead: u64,
    disasm_tail: u64,
    disasm_cache: RefCell<HashMap<(String, PcRange), Vec<RawInstruction>>>,
}

impl Analyzer {
    /// Parse a profile and build the full query model.
    ///
    /// # Errors
    /// Only fatal parser errors abort the load; see [`ParseError`].
    pub fn load<R: BufRead>(
        input: R,
        mut sources: SourceTree,
        options: AnalyzerOptions,
    ) -> Result<Self, ParseError> {
        let disassembler = Box::new(ObjdumpDisassembler::new(options.disassembler.clone()));
        if let Some(subdir) = options.subdir.clone() {
            sources = sources.with_subdir(subdir);
        }
        Self::load_with_disassembler(input, sources, &options, disassembler)
    }

    /// Same as [`Analyzer::load`] but with an injected disassembler, so
    /// tests can use a canned implementation.
    pub fn load_with_disassembler<R: BufRead>(
        input: R,
        sources: SourceTree,
        options: &AnalyzerOptions,
        disassembler: Box<dyn Disassembler>,
    ) -> Result<Self, ParseError> {
        let parse_options = ParseOptions { max_bytes: options.max_bytes };
        let mut profile = parse_profile(input, &parse_options)?;
        compute_coverage(&mut profile);

        // Cache resolved source text per file while the model is still ours
        for file in profile.files_mut() {
            file.source = sources.resolve(&file.path).map(str::to_string);
        }

        let graph = build_graph(&profile);
        let search = SearchIndex::build(&graph);
        let entries = EntryIndex::build(&graph);

        Ok(Self {
            profile,
            graph,
            search,
            entries,
            disassembler,
            disasm_lead: options.disasm_lead,
            disasm_tail: options.disasm_tail,
            disasm_cache: RefCell::new(HashMap::new()),
        })
    }

    #[must_use]
    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    #[must_use]
    pub fn file(&self, path: &str) -> Option<&FileRecord> {
        self.profile.file(path)
    }

    #[must_use]
    pub fn function(&self, file: &str, name: &str) -> Option<&FunctionRecord> {
        self.profile.function(file, name)
    }

    #[must_use]
    pub fn graph(&self) -> &CallGraph {
        &self.graph
    }

    #[must_use]
    pub fn roots(&self) -> &[NodeIndex] {
        self.graph.roots()
    }

    #[must_use]
    pub fn subtree_from(&self, entry: NodeIndex) -> CallTree {
        self.graph.subtree_from(entry)
    }

    #[must_use]
    pub fn callers(&self, node: NodeIndex) -> Vec<NodeIndex> {
        self.graph.callers(node)
    }

    #[must_use]
    pub fn callees(&self, node: NodeIndex) -> Vec<NodeIndex> {
        self.graph.callees(node)
    }

    #[must_use]
    pub fn search(&self, query: &str) -> Vec<NodeIndex> {
        self.search.search(query)
    }

    /// Ancestor IDs the UI should expand so every match is visible.
    #[must_use]
    pub fn expand_ancestors(&self, matches: &[NodeIndex]) -> BTreeSet<NodeIndex> {
        expand_ancestors(&self.graph, matches)
    }

    /// Resolve a user-supplied entry point (name, partial name, or PC).
    ///
    /// # Errors
    /// [`EntryError::NotFound`] when nothing matches.
    pub fn resolve_entry(&self, input: &str) -> Result<NodeIndex, EntryError> {
        self.entries.resolve(input)
    }

    #[must_use]
    pub fn suggest_entry(&self, input: &str, limit: usize) -> Vec<Suggestion> {
        self.entries.suggest(input, limit)
    }

    /// Functions ranked by exclusive primary cost. `limit = 0` = all.
    #[must_use]
    pub fn hotspots(&self, limit: usize) -> Vec<FunctionHotspot> {
        rank_hotspots(&self.profile, limit)
    }

    /// Disassemble a function's PC window and join the listing with the
    /// profile's per-PC counters.
    ///
    /// # Errors
    /// [`DisasmError::MissingObject`] when the profile recorded no object
    /// file for the function; tool failures per [`DisasmError`]. A function
    /// without instruction-level rows yields an empty listing.
    pub fn disassemble(
        &self,
        function: &FunctionRecord,
    ) -> Result<Vec<AssemblyInstruction>, DisasmError> {
        let object = function
            .object
            .as_deref()
            .or_else(|| self.profile.file(&function.file).and_then(|f| f.object.as_deref()))
            .ok_or_else(|| DisasmError::MissingObject(function.name.clone()))?;

        let Some(range) = range_for(function, self.disasm_lead, self.disasm_tail) else {
            return Ok(Vec::new());
        };

        let key = (object.to_string(), range);
        if let Some(cached) = self.disasm_cache.borrow().get(&key) {
            return Ok(annotate(cached.clone(), function));
        }

        let raw = self.disassembler.disassemble(Path::new(object), range)?;
        let annotated = annotate(raw.clone(), function);
        self.disasm_cache.borrow_mut().insert(key, raw);
        Ok(annotated)
    }
}
