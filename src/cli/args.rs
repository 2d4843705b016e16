//! CLI argument definitions

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
pub struct Args {
    /// Path to a cachegrind/callgrind profile file
    pub profile: PathBuf,

    /// Directory holding the profiled program's sources
    #[arg(short, long, value_name = "DIR")]
    pub source_dir: Option<PathBuf>,

    /// Subdirectory prefix to probe when resolving source paths
    #[arg(long, requires = "source_dir")]
    pub subdir: Option<String>,

    /// Disassembler executable to invoke
    #[arg(long, default_value = "objdump")]
    pub objdump: String,

    /// Search function names and print the matches
    #[arg(long, value_name = "QUERY")]
    pub search: Option<String>,

    /// Print the call tree below an entry point (function name or PC)
    #[arg(long, value_name = "ENTRY")]
    pub calltree: Option<String>,

    /// Disassemble a function (name or PC) with per-PC event counts
    #[arg(long, value_name = "FUNCTION")]
    pub disassemble: Option<String>,

    /// Write the full JSON report to a file
    #[arg(long, value_name = "FILE")]
    pub export: Option<PathBuf>,

    /// How many hotspots to print (0 = all)
    #[arg(long, default_value = "10")]
    pub hotspots: usize,

    /// Input size cap in bytes (default 100 MB)
    #[arg(long)]
    pub max_bytes: Option<u64>,
}
