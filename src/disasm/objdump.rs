//! objdump-backed disassembler.

use std::fs::File;
use std::io::ErrorKind;
use std::path::Path;
use std::process::Command;

use log::debug;

use super::{parse_listing_line, Disassembler, RawInstruction};
use crate::domain::{DisasmError, PcRange};

/// Phrase binutils prints to stderr for files it cannot interpret.
const BAD_FORMAT_PHRASE: &str = "file format not recognized";

/// Invokes an external `objdump`-compatible tool with start/stop address
/// flags and demangling enabled.
#[derive(Debug, Clone)]
pub struct ObjdumpDisassembler {
    tool: String,
}

impl ObjdumpDisassembler {
    pub const DEFAULT_TOOL: &'static str = "objdump";

    #[must_use]
    pub fn new(tool: impl Into<String>) -> Self {
        Self { tool: tool.into() }
    }

    #[must_use]
    pub fn tool(&self) -> &str {
        &self.tool
    }
}

impl Default for ObjdumpDisassembler {
    fn default() -> Self {
        Self::new(Self::DEFAULT_TOOL)
    }
}

impl Disassembler for ObjdumpDisassembler {
    fn disassemble(
        &self,
        object: &Path,
        range: PcRange,
    ) -> Result<Vec<RawInstruction>, DisasmError> {
        // Probe readability up front so a missing or protected object file
        // is distinguishable from a missing tool
        if let Err(err) = File::open(object) {
            debug!("object file {} not readable: {err}", object.display());
            return Err(DisasmError::PermissionDenied(object.to_path_buf()));
        }

        let output = Command::new(&self.tool)
            .arg("-d")
            .arg("-C")
            .arg(format!("--start-address={}", range.lo))
            .arg(format!("--stop-address={}", range.hi))
            .arg(object)
            .output()
            .map_err(|err| match err.kind() {
                ErrorKind::NotFound => DisasmError::ToolMissing(self.tool.clone()),
                _ => DisasmError::Io(err),
            })?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        if stderr.to_lowercase().contains(BAD_FORMAT_PHRASE) {
            return Err(DisasmError::InvalidObjectFile(object.to_path_buf()));
        }

        // Empty stdout is a legitimate answer (range outside any section)
        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(stdout.lines().filter_map(parse_listing_line).collect())
    }
}
