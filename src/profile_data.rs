//! Profile data model
//!
//! The frozen, query-ready representation of a parsed profile. Everything in
//! here is built in a single pass by `parsing` and finalized by
//! `analysis::coverage` before any query observes it; after that the model is
//! read-only and safe for unsynchronized shared reads.
//!
//! Iteration order for files, functions, and call edges follows first
//! appearance in the input, which the tests rely on for stability. Lines and
//! PCs are kept in `BTreeMap`s so they iterate in source/address order.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::domain::{AnalysisKind, Pc};

/// Default cap on profile input size (100 MB).
pub const DEFAULT_INPUT_CAP: u64 = 100 * 1024 * 1024;

/// The event vocabulary declared by the profile's `events:` header.
///
/// Its order is the column order of every subsequent data row. Frozen once
/// the header is consumed.
#[derive(Debug, Clone, Default)]
pub struct EventSet {
    names: Vec<String>,
    index: HashMap<String, usize>,
}

impl EventSet {
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        let index = names.iter().enumerate().map(|(i, n)| (n.clone(), i)).collect();
        Self { names, index }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Column index of a named event.
    #[must_use]
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Column index of the primary cost metric: cycles when the profile
    /// recorded them, instruction count otherwise. Falls back to the first
    /// event for exotic vocabularies.
    #[must_use]
    pub fn primary(&self) -> usize {
        self.index_of("Cy").or_else(|| self.index_of("Ir")).unwrap_or(0)
    }

    /// Name of the primary cost metric (see [`EventSet::primary`]).
    #[must_use]
    pub fn primary_name(&self) -> &str {
        self.names.get(self.primary()).map_or("", String::as_str)
    }
}

/// A vocabulary-indexed vector of event counters.
///
/// Rows may abbreviate trailing zeros; construction pads the width back out
/// so every vocabulary event has an entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Counts(Vec<u64>);

impl Counts {
    #[must_use]
    pub fn zeroed(width: usize) -> Self {
        Self(vec![0; width])
    }

    /// Build from a parsed row, padding missing trailing columns with 0 and
    /// ignoring columns beyond the vocabulary width.
    #[must_use]
    pub fn from_row(values: &[u64], width: usize) -> Self {
        let mut v: Vec<u64> = values.iter().copied().take(width).collect();
        v.resize(width, 0);
        Self(v)
    }

    /// Element-wise saturating accumulate.
    pub fn add(&mut self, other: &Counts) {
        for (a, b) in self.0.iter_mut().zip(other.0.iter()) {
            *a = a.saturating_add(*b);
        }
    }

    #[must_use]
    pub fn get(&self, index: usize) -> u64 {
        self.0.get(index).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn any_positive(&self) -> bool {
        self.0.iter().any(|&v| v > 0)
    }

    #[must_use]
    pub fn as_slice(&self) -> &[u64] {
        &self.0
    }

    /// Widen to the vocabulary width. Records created before the header was
    /// fully consumed start narrow; the first accumulation fixes them up.
    pub(crate) fn ensure_width(&mut self, width: usize) {
        if self.0.len() < width {
            self.0.resize(width, 0);
        }
    }
}

/// Aggregated event counts for one source line of one function.
///
/// Multiple rows can hit the same line (distinct PCs); their counts sum.
#[derive(Debug, Clone)]
pub struct LineRecord {
    pub counts: Counts,
}

impl LineRecord {
    /// A line is executed when any event fired on it. Summing preserves the
    /// logical OR over component rows because counts are non-negative.
    #[must_use]
    pub fn executed(&self) -> bool {
        self.counts.any_positive()
    }
}

/// Event counts for a single instruction address.
#[derive(Debug, Clone)]
pub struct PcRecord {
    /// Source line this PC belongs to (first one seen wins on duplicates).
    pub line: u32,
    pub counts: Counts,
}

impl PcRecord {
    #[must_use]
    pub fn executed(&self) -> bool {
        self.counts.any_positive()
    }
}

/// An outgoing call recorded by the profile.
#[derive(Debug, Clone)]
pub struct CallEdge {
    /// Callee's file; `None` means same file as the caller.
    pub target_file: Option<String>,
    pub target_name: String,
    /// Callee's object file (`cob=`), when the profile recorded one.
    pub target_object: Option<String>,
    /// Number of calls made from this site.
    pub count: u64,
    /// Cost incurred inside the callee and transitively, as charged to the
    /// call site by the profile.
    pub inclusive: Option<Counts>,
    /// Address of the call site (instruction-level profiles only).
    pub source_pc: Option<Pc>,
}

/// Per-function slice of the profile.
#[derive(Debug, Clone)]
pub struct FunctionRecord {
    pub name: String,
    /// Path of the owning file, as spelled in the profile.
    pub file: String,
    /// Object file this function was loaded from (`ob=`), if known.
    pub object: Option<String>,
    pub lines: BTreeMap<u32, LineRecord>,
    /// Instruction-level records; empty in pure cachegrind mode.
    pub pcs: BTreeMap<Pc, PcRecord>,
    /// Exclusive totals: sum of line counts per event.
    pub totals: Counts,
    pub calls: Vec<CallEdge>,
    /// Lines with at least one event, filled by the coverage pass.
    pub covered: Vec<u32>,
    /// Compiled lines that never executed, filled by the coverage pass.
    pub uncovered: Vec<u32>,
}

impl FunctionRecord {
    pub(crate) fn new(name: String, file: String, object: Option<String>, width: usize) -> Self {
        Self {
            name,
            file,
            object,
            lines: BTreeMap::new(),
            pcs: BTreeMap::new(),
            totals: Counts::zeroed(width),
            calls: Vec::new(),
            covered: Vec::new(),
            uncovered: Vec::new(),
        }
    }

    /// First and last PC of this function in unsigned address order.
    /// `None` when the profile carried no instruction-level rows.
    #[must_use]
    pub fn pc_range(&self) -> Option<(Pc, Pc)> {
        let first = *self.pcs.keys().next()?;
        let last = *self.pcs.keys().next_back()?;
        Some((first, last))
    }
}

/// Per-file slice of the profile.
#[derive(Debug, Clone)]
pub struct FileRecord {
    pub path: String,
    /// Object file in effect when this file was first declared (`ob=`).
    pub object: Option<String>,
    functions: Vec<FunctionRecord>,
    fn_index: HashMap<String, usize>,
    /// Union of covered lines over contained functions.
    pub covered: BTreeSet<u32>,
    /// Union of uncovered lines over contained functions.
    pub uncovered: BTreeSet<u32>,
    /// `|covered ∪ uncovered|`: lines the compiler emitted code for.
    pub compiled_lines: usize,
    /// Percentage in [0, 100]; 0 when no compiled lines.
    pub coverage: f64,
    /// Resolved source text, cached at load time when available.
    pub source: Option<String>,
}

impl FileRecord {
    pub(crate) fn new(path: String, object: Option<String>) -> Self {
        Self {
            path,
            object,
            functions: Vec::new(),
            fn_index: HashMap::new(),
            covered: BTreeSet::new(),
            uncovered: BTreeSet::new(),
            compiled_lines: 0,
            coverage: 0.0,
            source: None,
        }
    }

    /// Functions in first-appearance order.
    #[must_use]
    pub fn functions(&self) -> &[FunctionRecord] {
        &self.functions
    }

    #[must_use]
    pub fn function(&self, name: &str) -> Option<&FunctionRecord> {
        self.fn_index.get(name).map(|&i| &self.functions[i])
    }

    pub(crate) fn function_mut(&mut self, index: usize) -> &mut FunctionRecord {
        &mut self.functions[index]
    }

    pub(crate) fn functions_mut(&mut self) -> &mut [FunctionRecord] {
        &mut self.functions
    }

    /// Index of the named function, creating an empty record on first sight.
    pub(crate) fn intern_function(
        &mut self,
        name: &str,
        object: Option<&str>,
        width: usize,
    ) -> usize {
        if let Some(&i) = self.fn_index.get(name) {
            return i;
        }
        let record = FunctionRecord::new(
            name.to_string(),
            self.path.clone(),
            object.map(str::to_string),
            width,
        );
        self.functions.push(record);
        let i = self.functions.len() - 1;
        self.fn_index.insert(name.to_string(), i);
        i
    }
}

/// A fully parsed, frozen profile.
#[derive(Debug, Clone)]
pub struct Profile {
    pub events: EventSet,
    pub kind: AnalysisKind,
    /// The profiled command line (`cmd:`), verbatim.
    pub command: Option<String>,
    pub pid: Option<u32>,
    files: Vec<FileRecord>,
    file_index: HashMap<String, usize>,
    /// Totals from the `summary:` row, aligned to the vocabulary.
    pub summary: Option<Counts>,
    /// Filled by the coverage pass.
    pub total_compiled_lines: usize,
    pub total_covered_lines: usize,
}

impl Profile {
    pub(crate) fn new() -> Self {
        Self {
            events: EventSet::default(),
            kind: AnalysisKind::Cachegrind,
            command: None,
            pid: None,
            files: Vec::new(),
            file_index: HashMap::new(),
            summary: None,
            total_compiled_lines: 0,
            total_covered_lines: 0,
        }
    }

    /// Files in first-appearance order.
    #[must_use]
    pub fn files(&self) -> &[FileRecord] {
        &self.files
    }

    #[must_use]
    pub fn file(&self, path: &str) -> Option<&FileRecord> {
        self.file_index.get(path).map(|&i| &self.files[i])
    }

    #[must_use]
    pub fn function(&self, file: &str, name: &str) -> Option<&FunctionRecord> {
        self.file(file)?.function(name)
    }

    #[must_use]
    pub fn files_analyzed(&self) -> usize {
        self.files.len()
    }

    /// Overall covered percentage across all files, in [0, 100].
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn coverage(&self) -> f64 {
        if self.total_compiled_lines == 0 {
            return 0.0;
        }
        self.total_covered_lines as f64 / self.total_compiled_lines as f64 * 100.0
    }

    /// Sum of per-function exclusive totals across the whole profile.
    #[must_use]
    pub fn exclusive_totals(&self) -> Counts {
        let mut totals = Counts::zeroed(self.events.len());
        for file in &self.files {
            for function in file.functions() {
                totals.add(&function.totals);
            }
        }
        totals
    }

    pub(crate) fn files_mut(&mut self) -> &mut [FileRecord] {
        &mut self.files
    }

    pub(crate) fn file_mut(&mut self, index: usize) -> &mut FileRecord {
        &mut self.files[index]
    }

    /// Index of the file at `path`, creating an empty record on first sight.
    pub(crate) fn intern_file(&mut self, path: &str, object: Option<&str>) -> usize {
        if let Some(&i) = self.file_index.get(path) {
            return i;
        }
        self.files.push(FileRecord::new(path.to_string(), object.map(str::to_string)));
        let i = self.files.len() - 1;
        self.file_index.insert(path.to_string(), i);
        i
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_set_primary_prefers_cycles() {
        let events = EventSet::from_names(["Ir", "Cy", "Dr"]);
        assert_eq!(events.primary(), 1);
        assert_eq!(events.primary_name(), "Cy");
    }

    #[test]
    fn test_event_set_primary_falls_back_to_ir() {
        let events = EventSet::from_names(["Ir", "Dr", "Dw"]);
        assert_eq!(events.primary(), 0);
        assert_eq!(events.primary_name(), "Ir");
    }

    #[test]
    fn test_counts_from_row_pads_missing_columns() {
        let counts = Counts::from_row(&[3, 7], 4);
        assert_eq!(counts.as_slice(), &[3, 7, 0, 0]);
    }

    #[test]
    fn test_counts_from_row_ignores_extra_columns() {
        let counts = Counts::from_row(&[1, 2, 3, 4], 2);
        assert_eq!(counts.as_slice(), &[1, 2]);
    }

    #[test]
    fn test_counts_add_accumulates() {
        let mut a = Counts::from_row(&[1, 2], 2);
        a.add(&Counts::from_row(&[10, 0], 2));
        assert_eq!(a.as_slice(), &[11, 2]);
    }

    #[test]
    fn test_line_record_executed_is_any_positive() {
        let executed = LineRecord { counts: Counts::from_row(&[0, 1], 2) };
        let idle = LineRecord { counts: Counts::zeroed(2) };
        assert!(executed.executed());
        assert!(!idle.executed());
    }

    #[test]
    fn test_pc_range_orders_by_address() {
        let mut function = FunctionRecord::new("f".into(), "a.c".into(), None, 1);
        for addr in [0x2000u64, 0x1000, 0x1800] {
            function
                .pcs
                .insert(Pc(addr), PcRecord { line: 1, counts: Counts::zeroed(1) });
        }
        assert_eq!(function.pc_range(), Some((Pc(0x1000), Pc(0x2000))));
    }

    #[test]
    fn test_intern_preserves_first_appearance_order() {
        let mut profile = Profile::new();
        profile.intern_file("b.c", None);
        profile.intern_file("a.c", None);
        profile.intern_file("b.c", None);
        let paths: Vec<&str> = profile.files().iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, ["b.c", "a.c"]);
    }
}
