//! JSON report of an analyzed profile.
//!
//! This is the hand-off artifact for front-end collaborators: everything a
//! dashboard needs (summary totals, per-file coverage, hotspot ranking,
//! and the call tree from every root) in one serializable document.

use std::io::Write;

use serde::Serialize;

use crate::analysis::FunctionHotspot;
use crate::analyzer::Analyzer;
use crate::callgraph::{CallGraph, CallTree};
use crate::domain::ExportError;

#[derive(Debug, Serialize)]
pub struct ProfileReport {
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pid: Option<u32>,
    pub events: Vec<String>,
    pub primary_event: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<Vec<u64>>,
    pub files_analyzed: usize,
    pub total_compiled_lines: usize,
    pub total_covered_lines: usize,
    pub coverage: f64,
    pub files: Vec<FileReport>,
    pub hotspots: Vec<FunctionHotspot>,
    pub call_tree: Vec<CallTreeReport>,
}

#[derive(Debug, Serialize)]
pub struct FileReport {
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object: Option<String>,
    pub functions: usize,
    pub compiled_lines: usize,
    pub covered_lines: usize,
    pub coverage: f64,
}

#[derive(Debug, Serialize)]
pub struct CallTreeReport {
    pub file: String,
    pub name: String,
    /// Call count on the edge from the parent; absent on roots.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calls: Option<u64>,
    pub exclusive: u64,
    pub inclusive: u64,
    /// Expanded earlier in the tree; children omitted here.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub repeated: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<CallTreeReport>,
}

/// Assemble the full report. `hotspot_limit = 0` includes every function.
#[must_use]
pub fn build_report(analyzer: &Analyzer, hotspot_limit: usize) -> ProfileReport {
    let profile = analyzer.profile();
    let graph = analyzer.graph();

    let files = profile
        .files()
        .iter()
        .map(|file| FileReport {
            path: file.path.clone(),
            object: file.object.clone(),
            functions: file.functions().len(),
            compiled_lines: file.compiled_lines,
            covered_lines: file.covered.len(),
            coverage: file.coverage,
        })
        .collect();

    let call_tree = graph
        .roots()
        .iter()
        .map(|&root| tree_report(graph, &graph.subtree_from(root)))
        .collect();

    ProfileReport {
        kind: profile.kind.to_string(),
        command: profile.command.clone(),
        pid: profile.pid,
        events: profile.events.names().to_vec(),
        primary_event: profile.events.primary_name().to_string(),
        summary: profile.summary.as_ref().map(|s| s.as_slice().to_vec()),
        files_analyzed: profile.files_analyzed(),
        total_compiled_lines: profile.total_compiled_lines,
        total_covered_lines: profile.total_covered_lines,
        coverage: profile.coverage(),
        files,
        hotspots: analyzer.hotspots(hotspot_limit),
        call_tree,
    }
}

/// Serialize the report as pretty-printed JSON and flush the writer, so
/// buffered writers surface their I/O errors here instead of on drop.
///
/// # Errors
/// Serialization and I/O failures map to [`ExportError`].
pub fn write_report<W: Write>(mut writer: W, report: &ProfileReport) -> Result<(), ExportError> {
    serde_json::to_writer_pretty(&mut writer, report)?;
    writer.flush()?;
    Ok(())
}

fn tree_report(graph: &CallGraph, tree: &CallTree) -> CallTreeReport {
    let node = graph.node(tree.node);
    CallTreeReport {
        file: node.file.clone(),
        name: node.name.clone(),
        calls: tree.calls,
        exclusive: node.exclusive,
        inclusive: node.inclusive,
        repeated: tree.repeated,
        children: tree.children.iter().map(|child| tree_report(graph, child)).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::AnalyzerOptions;
    use crate::sources::SourceTree;
    use std::io::Cursor;

    const PROFILE: &str = "# callgrind format\n\
        events: Ir\n\
        positions: instr line\n\
        fl=a.c\n\
        fn=main\n\
        cfn=helper\n\
        calls=1 0x0\n\
        0x10 1 5\n\
        fn=helper\n\
        0x20 2 3\n\
        summary: 8\n";

    #[test]
    fn test_report_round_trips_through_json() {
        let analyzer = Analyzer::load(
            Cursor::new(PROFILE),
            SourceTree::empty(),
            AnalyzerOptions::default(),
        )
        .expect("load");
        let report = build_report(&analyzer, 10);

        let mut buffer = Vec::new();
        write_report(&mut buffer, &report).unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&buffer).unwrap();

        assert_eq!(parsed["kind"], "callgrind");
        assert_eq!(parsed["events"][0], "Ir");
        assert_eq!(parsed["summary"][0], 8);
        assert_eq!(parsed["files"][0]["path"], "a.c");
        assert_eq!(parsed["hotspots"][0]["name"], "main");
        assert_eq!(parsed["call_tree"][0]["name"], "main");
        assert_eq!(parsed["call_tree"][0]["children"][0]["name"], "helper");
        assert_eq!(parsed["call_tree"][0]["children"][0]["calls"], 1);
    }
}
