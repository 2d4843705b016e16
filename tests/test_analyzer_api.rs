use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use callscope::analyzer::{Analyzer, AnalyzerOptions};
use callscope::disasm::{Disassembler, RawInstruction};
use callscope::domain::{DisasmError, Pc, PcRange};
use callscope::export::{build_report, write_report};
use callscope::sources::SourceTree;

fn fixture_reader() -> BufReader<File> {
    BufReader::new(File::open("tests/fixtures/hardware_sim.cg").expect("fixture exists"))
}

fn load() -> Analyzer {
    let sources = SourceTree::from_dir(Path::new("tests/fixtures"), None).expect("source tree");
    Analyzer::load(fixture_reader(), sources, AnalyzerOptions::default()).expect("load")
}

#[test]
fn test_source_text_cached_on_file_records() {
    let analyzer = load();
    // Profile says "src/main.c"; the fixture tree has exactly that key
    let main_c = analyzer.file("src/main.c").unwrap();
    assert!(main_c.source.as_deref().unwrap().contains("init_hardware()"));

    let utils_c = analyzer.file("src/utils.c").unwrap();
    assert!(utils_c.source.as_deref().unwrap().contains("advanced_processing"));
}

#[test]
fn test_subdir_probing_resolves_absolute_profile_paths() {
    // Same tree, but the profile spells absolute build paths
    let profile = "events: Ir\n\
                   fl=/build/worker/hw/src/utils.c\n\
                   fn=init_hardware\n\
                   7 3\n";
    let sources =
        SourceTree::from_dir(Path::new("tests/fixtures"), Some("src".to_string())).unwrap();
    let analyzer = Analyzer::load(
        std::io::Cursor::new(profile),
        sources,
        AnalyzerOptions::default(),
    )
    .unwrap();

    let record = analyzer.file("/build/worker/hw/src/utils.c").unwrap();
    assert!(record.source.as_deref().unwrap().contains("hardware_state"));
}

#[test]
fn test_end_to_end_queries() {
    let analyzer = load();

    let entry = analyzer.resolve_entry("main").unwrap();
    assert_eq!(analyzer.roots(), [entry]);

    let tree = analyzer.subtree_from(entry);
    assert_eq!(tree.size(), 5);

    let matches = analyzer.search("hardware");
    assert_eq!(matches.len(), 1);
    let ancestors = analyzer.expand_ancestors(&matches);
    assert!(ancestors.contains(&entry));

    let hotspots = analyzer.hotspots(2);
    assert_eq!(hotspots.len(), 2);
    assert_eq!(hotspots[0].name, "main");
    assert_eq!(hotspots[0].cost, 1302);
}

#[test]
fn test_export_report_shape() {
    let analyzer = load();
    let report = build_report(&analyzer, 3);

    let mut buffer = Vec::new();
    write_report(&mut buffer, &report).unwrap();
    let json: serde_json::Value = serde_json::from_slice(&buffer).unwrap();

    assert_eq!(json["kind"], "callgrind");
    assert_eq!(json["primary_event"], "Cy");
    assert_eq!(json["files_analyzed"], 2);
    assert_eq!(json["summary"][0], 1171);
    assert_eq!(json["call_tree"][0]["name"], "main");
    assert_eq!(json["call_tree"][0]["inclusive"], 2592);
    assert_eq!(json["hotspots"].as_array().unwrap().len(), 3);
}

/// Canned disassembler covering main's padded PC window.
struct CannedDisassembler;

impl Disassembler for CannedDisassembler {
    fn disassemble(
        &self,
        _object: &Path,
        range: PcRange,
    ) -> Result<Vec<RawInstruction>, DisasmError> {
        assert_eq!(range.lo, Pc(0x1000 - 16));
        assert_eq!(range.hi, Pc(0x1028 + 64));
        Ok(vec![
            RawInstruction { pc: Pc(0x1000), text: "push %rbp".into() },
            RawInstruction { pc: Pc(0x1004), text: "mov %rsp,%rbp".into() },
            RawInstruction { pc: Pc(0x1008), text: "call 2000 <init_hardware>".into() },
        ])
    }
}

#[test]
fn test_disassembly_annotated_from_pc_records() {
    let analyzer = Analyzer::load_with_disassembler(
        fixture_reader(),
        SourceTree::empty(),
        &AnalyzerOptions::default(),
        Box::new(CannedDisassembler),
    )
    .expect("load");

    let main = analyzer.function("src/main.c", "main").unwrap().clone();
    let listing = analyzer.disassemble(&main).unwrap();
    assert_eq!(listing.len(), 3);

    assert!(listing[0].executed);
    assert_eq!(listing[0].counts.as_ref().unwrap().as_slice(), &[3, 6]);
    // 0x1004 never sampled: tolerated, no counts
    assert!(!listing[1].executed);
    assert!(listing[1].counts.is_none());
    assert!(listing[2].executed);
    assert_eq!(listing[2].counts.as_ref().unwrap().as_slice(), &[2, 4]);
}
