//! Disassembly adapter
//!
//! The engine never parses object files itself; it shells out to an external
//! disassembler and joins the textual result against the profile's per-PC
//! records. The tool boundary is a capability trait so tests can inject a
//! fake that returns canned instruction listings.

pub mod objdump;

use crate::domain::{Pc, PcRange};
use crate::profile_data::{Counts, FunctionRecord};

pub use objdump::ObjdumpDisassembler;

/// Default padding applied around a function's PC span when choosing the
/// disassembly window: a little context before, more after (alignment
/// padding and the final instruction's width live past the last sampled PC).
/// Callers may override both through their options.
pub const DEFAULT_RANGE_LEAD: u64 = 16;
pub const DEFAULT_RANGE_TAIL: u64 = 64;

/// One line of disassembler output, before profile annotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawInstruction {
    pub pc: Pc,
    pub text: String,
}

/// One instruction joined with the profile's per-PC counters.
#[derive(Debug, Clone)]
pub struct AssemblyInstruction {
    pub pc: Pc,
    pub text: String,
    /// Event counts for this PC; `None` when the profile never sampled it.
    pub counts: Option<Counts>,
    pub executed: bool,
}

/// Capability seam over the external disassembly tool.
pub trait Disassembler {
    /// Disassemble `object` between the range bounds.
    ///
    /// # Errors
    /// See [`crate::domain::DisasmError`]; an empty listing is not an error.
    fn disassemble(
        &self,
        object: &std::path::Path,
        range: PcRange,
    ) -> Result<Vec<RawInstruction>, crate::domain::DisasmError>;
}

/// The disassembly window for a function: its sampled PC span plus padding.
/// `None` when the profile carried no instruction-level rows for it.
#[must_use]
pub fn range_for(function: &FunctionRecord, lead: u64, tail: u64) -> Option<PcRange> {
    let (first, last) = function.pc_range()?;
    Some(PcRange::new(
        Pc(first.value().saturating_sub(lead)),
        Pc(last.value().saturating_add(tail)),
    ))
}

/// Join raw disassembly against a function's PC records.
///
/// Instructions the profile never sampled keep `counts: None`; PCs outside
/// the requested window are retained as-is.
#[must_use]
pub fn annotate(raw: Vec<RawInstruction>, function: &FunctionRecord) -> Vec<AssemblyInstruction> {
    raw.into_iter()
        .map(|instruction| {
            let record = function.pcs.get(&instruction.pc);
            AssemblyInstruction {
                pc: instruction.pc,
                text: instruction.text,
                counts: record.map(|r| r.counts.clone()),
                executed: record.is_some_and(|r| r.executed()),
            }
        })
        .collect()
}

/// Parse one disassembler output line of the form `  1000:\tpush %rbp`.
/// Returns `None` for headers, blank lines, and symbol markers.
#[must_use]
pub(crate) fn parse_listing_line(line: &str) -> Option<RawInstruction> {
    let trimmed = line.trim_start_matches(' ');
    let (addr, rest) = trimmed.split_once(':')?;
    if addr.is_empty() || !addr.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let text = rest.trim_start_matches([' ', '\t']);
    if text.is_empty() {
        return None;
    }
    let pc = Pc(u64::from_str_radix(addr, 16).ok()?);
    Some(RawInstruction { pc, text: text.to_string() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile_data::PcRecord;

    fn function_with_pcs(pcs: &[(u64, u64)]) -> FunctionRecord {
        let mut function = FunctionRecord::new("f".into(), "a.c".into(), None, 1);
        for &(addr, count) in pcs {
            function
                .pcs
                .insert(Pc(addr), PcRecord { line: 1, counts: Counts::from_row(&[count], 1) });
        }
        function
    }

    #[test]
    fn test_parse_listing_line() {
        let parsed = parse_listing_line("    1000:\tpush   %rbp").unwrap();
        assert_eq!(parsed.pc, Pc(0x1000));
        assert_eq!(parsed.text, "push   %rbp");
    }

    #[test]
    fn test_parse_listing_rejects_non_instruction_lines() {
        assert!(parse_listing_line("").is_none());
        assert!(parse_listing_line("Disassembly of section .text:").is_none());
        assert!(parse_listing_line("0000000000001000 <main>:").is_none());
        assert!(parse_listing_line("  1000:").is_none());
    }

    #[test]
    fn test_range_pads_lead_and_tail() {
        let function = function_with_pcs(&[(0x1000, 1), (0x1040, 1)]);
        let range = range_for(&function, DEFAULT_RANGE_LEAD, DEFAULT_RANGE_TAIL).unwrap();
        assert_eq!(range.lo, Pc(0x1000 - 16));
        assert_eq!(range.hi, Pc(0x1040 + 64));
    }

    #[test]
    fn test_range_saturates_at_zero() {
        let function = function_with_pcs(&[(0x8, 1)]);
        assert_eq!(range_for(&function, 16, 64).unwrap().lo, Pc(0));
    }

    #[test]
    fn test_range_none_without_pc_data() {
        let function = function_with_pcs(&[]);
        assert!(range_for(&function, 16, 64).is_none());
    }

    #[test]
    fn test_annotate_joins_profile_counts() {
        let function = function_with_pcs(&[(0x1000, 5), (0x1004, 0)]);
        let raw = vec![
            RawInstruction { pc: Pc(0x1000), text: "push %rbp".into() },
            RawInstruction { pc: Pc(0x1004), text: "mov %rsp,%rbp".into() },
            RawInstruction { pc: Pc(0x1008), text: "ret".into() },
        ];
        let annotated = annotate(raw, &function);

        assert!(annotated[0].executed);
        assert_eq!(annotated[0].counts.as_ref().unwrap().as_slice(), &[5]);
        // Sampled but never fired
        assert!(!annotated[1].executed);
        assert!(annotated[1].counts.is_some());
        // Unknown to the profile: tolerated, no counts attached
        assert!(!annotated[2].executed);
        assert!(annotated[2].counts.is_none());
    }
}
