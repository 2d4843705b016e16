//! Structured error types for callscope
//!
//! Using thiserror for automatic Display implementation and error chaining.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("data row encountered before an `events:` header")]
    NoVocabulary,

    #[error("data row at line {line} is malformed: {reason}")]
    MalformedRow { line: usize, reason: String },

    #[error("profile input exceeds the {limit} byte cap")]
    InputTooLarge { limit: u64 },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum EntryError {
    #[error("no function or address matches `{0}`")]
    NotFound(String),
}

#[derive(Error, Debug)]
pub enum DisasmError {
    #[error("object file {0} is not readable")]
    PermissionDenied(PathBuf),

    #[error("disassembler `{0}` not found on PATH")]
    ToolMissing(String),

    #[error("{0} is not a recognized object file")]
    InvalidObjectFile(PathBuf),

    #[error("function `{0}` has no object file attribution")]
    MissingObject(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum ExportError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_display() {
        let err = ParseError::NoVocabulary;
        assert_eq!(err.to_string(), "data row encountered before an `events:` header");
    }

    #[test]
    fn test_entry_error_carries_query() {
        let err = EntryError::NotFound("main".to_string());
        assert!(err.to_string().contains("main"));
    }

    #[test]
    fn test_disasm_tool_missing_names_tool() {
        let err = DisasmError::ToolMissing("objdump".to_string());
        assert!(err.to_string().contains("objdump"));
    }
}
