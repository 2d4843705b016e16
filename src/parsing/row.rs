//! Data-row tokenization.
//!
//! Rows are whitespace-separated integers, optionally led by a PC column
//! when the profile declared `positions: instr line`. Anything that fails to
//! lex becomes a [`ParseError::MalformedRow`] which the caller downgrades to
//! a skip.

use crate::domain::{ParseError, Pc};

/// One lexed data row, shape depending on the `positions:` header.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum DataRow {
    Line { line: u32, counts: Vec<u64> },
    Instr { pc: Pc, line: u32, counts: Vec<u64> },
}

pub(crate) fn parse_data_row(
    text: &str,
    instr_mode: bool,
    width: usize,
    line_no: usize,
) -> Result<DataRow, ParseError> {
    let malformed = |reason: &str| ParseError::MalformedRow {
        line: line_no,
        reason: reason.to_string(),
    };

    let mut tokens = text.split_whitespace();

    if instr_mode {
        let pc = tokens
            .next()
            .and_then(Pc::parse)
            .ok_or_else(|| malformed("expected a 0x-prefixed PC"))?;
        let line = parse_line_number(tokens.next()).ok_or_else(|| malformed("bad line number"))?;
        // Instruction rows from merged parts may carry extra columns; tolerate
        let counts = parse_counts(tokens).ok_or_else(|| malformed("non-integer count"))?;
        Ok(DataRow::Instr { pc, line, counts })
    } else {
        let line = parse_line_number(tokens.next()).ok_or_else(|| malformed("bad line number"))?;
        let counts = parse_counts(tokens).ok_or_else(|| malformed("non-integer count"))?;
        if counts.len() > width {
            return Err(malformed("more count columns than declared events"));
        }
        Ok(DataRow::Line { line, counts })
    }
}

/// Parse a whitespace-separated list of non-negative integers (`summary:`).
pub(crate) fn parse_count_list(text: &str) -> Option<Vec<u64>> {
    parse_counts(text.split_whitespace())
}

fn parse_line_number(token: Option<&str>) -> Option<u32> {
    token?.parse().ok()
}

fn parse_counts<'a, I: Iterator<Item = &'a str>>(tokens: I) -> Option<Vec<u64>> {
    tokens.map(|t| t.parse::<u64>().ok()).collect()
}
