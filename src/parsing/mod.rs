//! Streaming cachegrind/callgrind parser
//!
//! Consumes the profile as a lazy sequence of text lines and emits a fully
//! populated [`Profile`] in one pass. The input may exceed 100 MB, so the
//! parser never materializes the whole stream; auxiliary memory is bounded by
//! the number of distinct (file, function) pairs.
//!
//! ## State machine
//!
//! ```text
//! ┌──────────┐  first body directive   ┌──────────┐
//! │  Header  │────────────────────────▶│   Body   │
//! │ events:  │                         │ fl=/fn=  │
//! │ cmd:/pid:│                         │ data rows│
//! └──────────┘                         └──────────┘
//! ```
//!
//! In `Body` the parser tracks: current file, current function, current
//! object file, the pending call target (`cob=`/`cfi=`/`cfn=`), a flag armed
//! by `calls=` (the next data row is the edge's source site, not just a
//! counter row), and a flag armed by `jump=`/`jcnd=` (the next PC-prefixed
//! row is branch metadata and is dropped).
//!
//! ## Error policy
//!
//! - Data row before `events:` → [`ParseError::NoVocabulary`], fatal.
//! - Oversized input → [`ParseError::InputTooLarge`], fatal.
//! - Malformed rows are skipped with a warning; unknown directives are
//!   ignored silently. The parser never panics on hostile input.

mod row;

use std::io::BufRead;

use log::{debug, info, warn};

use crate::domain::{AnalysisKind, ParseError, Pc};
use crate::profile_data::{CallEdge, Counts, EventSet, LineRecord, PcRecord, Profile,
    DEFAULT_INPUT_CAP};

use row::DataRow;

/// File path functions are attributed to when the profile names a function
/// before any `fl=` directive (valgrind's own unknown-file marker).
const UNKNOWN_FILE: &str = "???";

/// Knobs for a single parse run.
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Abort with [`ParseError::InputTooLarge`] past this many input bytes.
    pub max_bytes: u64,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self { max_bytes: DEFAULT_INPUT_CAP }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Header,
    Body,
}

/// Call target accumulated from `cob=`/`cfi=`/`cfn=`, consumed by the data
/// row following `calls=`.
#[derive(Debug, Default)]
struct PendingCall {
    object: Option<String>,
    file: Option<String>,
    name: Option<String>,
}

/// Everything the body state machine carries between lines. Owned by the
/// parse routine; nothing in here escapes into the built [`Profile`].
struct ParserState {
    profile: Profile,
    phase: Phase,
    /// `positions: instr line` was declared, so rows carry a PC column.
    instr_positions: bool,
    cur_file: Option<usize>,
    cur_fn: Option<(usize, usize)>,
    cur_object: Option<String>,
    pending: PendingCall,
    /// Call count from the last `calls=`, armed until the next data row.
    calls_pending: Option<u64>,
    /// Armed by `jump=`/`jcnd=`; drops the next PC-prefixed row.
    skip_jump_row: bool,
    line_no: usize,
    skipped_rows: usize,
}

impl ParserState {
    fn new() -> Self {
        Self {
            profile: Profile::new(),
            phase: Phase::Header,
            instr_positions: false,
            cur_file: None,
            cur_fn: None,
            cur_object: None,
            pending: PendingCall::default(),
            calls_pending: None,
            skip_jump_row: false,
            line_no: 0,
            skipped_rows: 0,
        }
    }
}

/// Parse a profile from a buffered reader.
///
/// # Errors
/// Returns [`ParseError::NoVocabulary`] on a data row before `events:`,
/// [`ParseError::InputTooLarge`] past the configured cap, or the underlying
/// I/O error. Malformed rows and unknown directives never abort.
pub fn parse_profile<R: BufRead>(reader: R, options: &ParseOptions) -> Result<Profile, ParseError> {
    let mut state = ParserState::new();
    let mut bytes_read: u64 = 0;

    for line in reader.lines() {
        let line = line?;
        state.line_no += 1;
        bytes_read += line.len() as u64 + 1;
        if bytes_read > options.max_bytes {
            return Err(ParseError::InputTooLarge { limit: options.max_bytes });
        }
        consume_line(&mut state, line.trim_end())?;
    }

    info!(
        "parsed {} file(s), {} event(s), {} skipped row(s)",
        state.profile.files_analyzed(),
        state.profile.events.len(),
        state.skipped_rows
    );
    Ok(state.profile)
}

fn consume_line(state: &mut ParserState, line: &str) -> Result<(), ParseError> {
    if line.is_empty() {
        return Ok(());
    }

    if let Some(comment) = line.strip_prefix('#') {
        if comment.trim() == "callgrind format" {
            state.profile.kind = AnalysisKind::Callgrind;
        }
        return Ok(());
    }

    // Data rows start with a digit (`10 ...` or `0x1000 ...`); directives
    // start with a letter, so the first byte disambiguates.
    if line.as_bytes()[0].is_ascii_digit() {
        return consume_data_row(state, line);
    }

    if let Some((key, value)) = split_directive(line, '=') {
        consume_assignment(state, key, value);
        return Ok(());
    }

    if let Some((key, value)) = split_directive(line, ':') {
        consume_declaration(state, key, value);
        return Ok(());
    }

    debug!("line {}: unrecognized line ignored", state.line_no);
    Ok(())
}

/// Split `key SEP rest`, requiring a non-empty alphabetic key so data rows
/// and free-form text never masquerade as directives.
fn split_directive(line: &str, sep: char) -> Option<(&str, &str)> {
    let (key, value) = line.split_once(sep)?;
    let key = key.trim();
    if key.is_empty() || !key.bytes().all(|b| b.is_ascii_alphabetic()) {
        return None;
    }
    Some((key, value))
}

/// Colon-form directives: the header vocabulary plus `summary:`.
fn consume_declaration(state: &mut ParserState, key: &str, value: &str) {
    match key {
        "events" => {
            // Vocabulary is frozen once the header has been consumed
            if state.phase == Phase::Body || !state.profile.events.is_empty() {
                warn!("line {}: `events:` outside the header ignored", state.line_no);
                return;
            }
            state.profile.events = EventSet::from_names(value.split_whitespace());
        }
        "cmd" => state.profile.command = Some(value.trim().to_string()),
        "pid" => state.profile.pid = value.trim().parse().ok(),
        "positions" => {
            // `positions:` only appears in callgrind output
            state.profile.kind = AnalysisKind::Callgrind;
            state.instr_positions = value.split_whitespace().any(|t| t == "instr");
        }
        // Multi-part markers carry no data we track
        "part" | "desc" | "version" | "creator" => {}
        // Valgrind writes `summary:` (cachegrind) or `totals:` (callgrind)
        "summary" | "totals" => {
            if state.profile.events.is_empty() {
                warn!("line {}: `{key}:` before `events:` ignored", state.line_no);
                return;
            }
            match row::parse_count_list(value) {
                Some(values) => {
                    state.profile.summary =
                        Some(Counts::from_row(&values, state.profile.events.len()));
                }
                None => warn!("line {}: malformed `{key}:` row ignored", state.line_no),
            }
        }
        _ => debug!("line {}: unknown directive `{key}:` ignored", state.line_no),
    }
}

/// Assignment-form directives: position/scope state and call metadata.
fn consume_assignment(state: &mut ParserState, key: &str, value: &str) {
    state.phase = Phase::Body;
    match key {
        "ob" => {
            state.profile.kind = AnalysisKind::Callgrind;
            state.cur_object = Some(value.to_string());
        }
        "fl" => {
            let index = state.profile.intern_file(value, state.cur_object.as_deref());
            let file = state.profile.file_mut(index);
            if file.object.is_none() {
                file.object = state.cur_object.clone();
            }
            state.cur_file = Some(index);
            state.cur_fn = None;
        }
        // File include/end markers: lines stay attributed to the current file
        "fi" | "fe" => {}
        "fn" => {
            let file_index = match state.cur_file {
                Some(i) => i,
                None => {
                    let i = state.profile.intern_file(UNKNOWN_FILE, state.cur_object.as_deref());
                    state.cur_file = Some(i);
                    i
                }
            };
            let width = state.profile.events.len();
            let object = state.cur_object.clone();
            let fn_index = state
                .profile
                .file_mut(file_index)
                .intern_function(value, object.as_deref(), width);
            state.cur_fn = Some((file_index, fn_index));
        }
        "cob" => state.pending.object = Some(value.to_string()),
        // Valgrind emits `cfi=` or `cfl=` for the callee file, version-dependent
        "cfi" | "cfl" => state.pending.file = Some(value.to_string()),
        "cfn" => state.pending.name = Some(value.to_string()),
        "calls" => match value.split_whitespace().next().and_then(|t| t.parse::<u64>().ok()) {
            Some(count) => state.calls_pending = Some(count),
            None => warn!("line {}: malformed `calls=` ignored", state.line_no),
        },
        // Branch metadata: drop the directive and its PC-prefixed cost row
        "jump" | "jcnd" => state.skip_jump_row = true,
        "jfi" => {}
        _ => debug!("line {}: unknown directive `{key}=` ignored", state.line_no),
    }
}

fn consume_data_row(state: &mut ParserState, line: &str) -> Result<(), ParseError> {
    state.phase = Phase::Body;

    if state.skip_jump_row {
        state.skip_jump_row = false;
        if line.starts_with("0x") {
            return Ok(());
        }
    }

    if state.profile.events.is_empty() {
        return Err(ParseError::NoVocabulary);
    }

    let width = state.profile.events.len();
    let parsed = match row::parse_data_row(line, state.instr_positions, width, state.line_no) {
        Ok(parsed) => parsed,
        Err(err) => {
            warn!("skipping row: {err}");
            state.skipped_rows += 1;
            return Ok(());
        }
    };

    let (pc, line_no, values) = match parsed {
        DataRow::Instr { pc, line, counts } => {
            state.profile.kind = AnalysisKind::Callgrind;
            (Some(pc), line, counts)
        }
        DataRow::Line { line, counts } => (None, line, counts),
    };

    let Some((file_index, fn_index)) = state.cur_fn else {
        warn!("line {}: data row outside any function, skipped", state.line_no);
        state.skipped_rows += 1;
        return Ok(());
    };

    let counts = Counts::from_row(&values, width);
    accumulate_row(state, file_index, fn_index, pc, line_no, &counts);

    if let Some(call_count) = state.calls_pending.take() {
        attach_call_edge(state, file_index, fn_index, pc, call_count, counts);
    }

    Ok(())
}

/// Fold one row into the line, PC, and function-total aggregates.
fn accumulate_row(
    state: &mut ParserState,
    file_index: usize,
    fn_index: usize,
    pc: Option<Pc>,
    line_no: u32,
    counts: &Counts,
) {
    let width = counts.as_slice().len();
    let function = state.profile.file_mut(file_index).function_mut(fn_index);

    let record = function
        .lines
        .entry(line_no)
        .or_insert_with(|| LineRecord { counts: Counts::zeroed(width) });
    record.counts.ensure_width(width);
    record.counts.add(counts);

    if let Some(pc) = pc {
        let record = function
            .pcs
            .entry(pc)
            .or_insert_with(|| PcRecord { line: line_no, counts: Counts::zeroed(width) });
        record.counts.ensure_width(width);
        record.counts.add(counts);
    }

    function.totals.ensure_width(width);
    function.totals.add(counts);
}

/// Consume the pending `cob=`/`cfi=`/`cfn=` target into a call edge whose
/// source site and inclusive cost come from the row that followed `calls=`.
fn attach_call_edge(
    state: &mut ParserState,
    file_index: usize,
    fn_index: usize,
    source_pc: Option<Pc>,
    count: u64,
    inclusive: Counts,
) {
    let Some(target_name) = state.pending.name.take() else {
        warn!("line {}: `calls=` without a `cfn=` target, edge dropped", state.line_no);
        state.pending = PendingCall::default();
        return;
    };
    let edge = CallEdge {
        target_file: state.pending.file.take(),
        target_name,
        target_object: state.pending.object.take(),
        count,
        inclusive: Some(inclusive),
        source_pc,
    };
    state.profile.file_mut(file_index).function_mut(fn_index).calls.push(edge);
}
