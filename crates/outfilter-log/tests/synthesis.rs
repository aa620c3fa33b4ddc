use std::time::Duration;

use outfilter_log::section::SectionLevel;
use outfilter_log::{CommandKind, Document, Line, LineKind, RtlKind, ScopeState, Severity, ToolVersion};

fn parse() -> Document {
    Document::parse(include_str!("fixtures/synth.vds")).expect("synthesis log should classify")
}

fn find<'a>(document: &'a Document, prefix: &str) -> &'a Line {
    document
        .lines()
        .iter()
        .find(|line| line.text().starts_with(prefix))
        .unwrap_or_else(|| panic!("no line starting with {prefix:?}"))
}

fn offset<'a>(document: &'a Document, line: &Line, delta: isize) -> &'a Line {
    let number = line.number().checked_add_signed(delta).unwrap();
    document.line(number).unwrap()
}

#[test]
fn test_preamble() {
    let document = parse();
    assert_eq!(document.tool_version(), Some(ToolVersion::new(2023, 2)));
    assert_eq!(
        document.start_time().map(|time| time.to_string()),
        Some("2024-01-17 09:26:33".to_string())
    );

    let kinds: Vec<_> = document.lines()[..9].iter().map(Line::kind).collect();
    assert_eq!(kinds[0], LineKind::SECTION_START | LineKind::DELIMITER);
    assert_eq!(kinds[1], LineKind::NORMAL);
    assert_eq!(kinds[2], LineKind::VERBOSE);
    assert_eq!(kinds[4], LineKind::NORMAL);
    assert_eq!(kinds[7], LineKind::SECTION_END | LineKind::DELIMITER);
    // `source ...` before the first command
    assert_eq!(kinds[8], LineKind::VERBOSE);
    assert_eq!(document.preamble().span().map(|span| (span.first, span.last)), Some((1, 8)));
}

#[test]
fn test_clean_log_has_no_diagnostics() {
    let document = parse();
    assert!(document.diagnostics().is_empty(), "{:#?}", document.diagnostics());
    assert!(document.lines().iter().all(|line| !line.kind().contains(LineKind::PROCESSOR_ERROR)));
}

#[test]
fn test_command_facts() {
    let document = parse();
    let synth = document.command(CommandKind::SynthDesign).unwrap();

    assert_eq!(synth.tcl().arguments(), &["-top", "system_top", "-part", "xc7z020clg400-1"]);
    assert_eq!(synth.state(), ScopeState::Finished);
    assert_eq!(synth.success(), Some(true));
    assert_eq!(synth.timing().map(|timing| timing.elapsed), Some(Duration::from_secs(50)));
    assert_eq!(synth.part(), Some("xc7z020clg400-1"));
    assert_eq!(document.part(), Some("xc7z020clg400-1"));

    assert_eq!(synth.cells().get("LD"), Some(&4));
    assert_eq!(synth.cells().get("FDRE"), Some(&12));
    assert_eq!(synth.cells().len(), 5);
    assert_eq!(synth.blackboxes().get("axi_bbox"), Some(&1));
    assert!(synth.has_blackboxes());
    assert!(synth.has_latches());
    assert_eq!(synth.latches().count(), 1);
    assert!(document.has_latches());
    assert!(document.has_blackboxes());

    assert!(document.command(CommandKind::RouteDesign).is_err());
}

#[test]
fn test_completion_lines() {
    let document = parse();
    let end = find(&document, "synth_design completed successfully");
    assert_eq!(end.kind(), LineKind::TCL_COMMAND_END | LineKind::SUCCESS);
    assert_eq!(offset(&document, end, 1).kind(), LineKind::TCL_COMMAND_TIME);
    assert_eq!(find(&document, "Starting synth_design").kind(), LineKind::VERBOSE);
}

#[test]
fn test_section_delimiters() {
    let document = parse();

    let start = find(&document, "Start Handling Custom Attributes");
    assert_eq!(start.kind(), LineKind::SECTION_START);
    assert_eq!(offset(&document, start, -1).kind(), LineKind::SECTION_START | LineKind::DELIMITER);
    assert_eq!(offset(&document, start, 1).kind(), LineKind::SECTION_START | LineKind::DELIMITER);

    let finish = find(&document, "Finished Handling Custom Attributes");
    assert_eq!(finish.kind(), LineKind::SECTION_END);
    assert_eq!(offset(&document, finish, -1).kind(), LineKind::SECTION_END | LineKind::DELIMITER);
    assert_eq!(offset(&document, finish, 1).kind(), LineKind::SECTION_END | LineKind::DELIMITER);
}

#[test]
fn test_sub_sections() {
    let document = parse();
    let synth = document.command(CommandKind::SynthDesign).unwrap();

    let flattening = find(&document, "Start Flattening Before IO Insertion");
    assert_eq!(flattening.kind(), LineKind::SUB_SECTION_START);
    assert_eq!(
        offset(&document, flattening, -1).kind(),
        LineKind::SUB_SECTION_START | LineKind::DELIMITER
    );
    let cleanup = find(&document, "Finished Final Netlist Cleanup");
    assert_eq!(cleanup.kind(), LineKind::SUB_SECTION_END);
    assert_eq!(offset(&document, cleanup, 1).kind(), LineKind::SUB_SECTION_END | LineKind::DELIMITER);

    let io = synth.section("IO Insertion").unwrap();
    assert_eq!(io.timing().map(|timing| timing.elapsed), Some(Duration::from_secs(21)));
    let child = io.child("Final Netlist Cleanup").unwrap();
    assert_eq!(child.level(), SectionLevel::SubSection);
    assert_eq!(child.state(), ScopeState::Finished);
    assert!(io.span().unwrap().contains(&child.span().unwrap()));

    let finish = find(&document, "Finished IO Insertion");
    assert_eq!(offset(&document, finish, -1).kind(), LineKind::SECTION_END | LineKind::DELIMITER);
}

#[test]
fn test_optimization_milestones() {
    let document = parse();
    let synth = document.command(CommandKind::SynthDesign).unwrap();

    let phase_one = find(&document, "Finished RTL Optimization Phase 1");
    assert_eq!(phase_one.kind(), LineKind::SECTION_START);
    let validation = synth.section("Constraint Validation").unwrap();
    assert_eq!(validation.span().unwrap().first, phase_one.number());

    let phase_two = find(&document, "Finished RTL Optimization Phase 2");
    assert_eq!(phase_two.kind(), LineKind::PHASE_END);
    assert_eq!(offset(&document, phase_two, -1).kind(), LineKind::PHASE_END | LineKind::DELIMITER);
    assert_eq!(offset(&document, phase_two, 1).kind(), LineKind::PHASE_END | LineKind::DELIMITER);
}

#[test]
fn test_rtl_diagnostics() {
    let document = parse();
    let synth = document.command(CommandKind::SynthDesign).unwrap();

    let reports = synth.vhdl_report_messages();
    assert_eq!(reports.len(), 1);
    let rtl = reports[0].rtl().unwrap();
    assert_eq!(rtl.kind(), RtlKind::Report);
    assert_eq!(rtl.inner_text(), "clock divider = 50000");
    assert_eq!(rtl.source_line(), 42);

    let asserts = synth.vhdl_assert_messages();
    assert_eq!(asserts.len(), 1);
    assert_eq!(asserts[0].rtl().map(|rtl| rtl.kind()), Some(RtlKind::Assertion));

    let line = find(&document, "INFO: [Synth 8-6031]");
    assert!(line.message().and_then(|message| message.rtl()).is_some());
    assert_eq!(line.kind(), LineKind::INFO_MESSAGE);

    let elaboration = synth.section("RTL Elaboration").unwrap();
    assert_eq!(elaboration.messages().total(), 5);
    assert_eq!(elaboration.messages().of_severity(Severity::Warning).len(), 1);
}

#[test]
fn test_report_tables() {
    let document = parse();
    assert_eq!(find(&document, "Report Cell Usage:").kind(), LineKind::PARAGRAPH_HEADLINE);
    assert_eq!(find(&document, "|      |Cell  |Count |").kind(), LineKind::TABLE_HEADER);
    assert_eq!(find(&document, "|4     |LD    |     4|").kind(), LineKind::TABLE_ROW);
    assert_eq!(find(&document, "Report Instance Areas:").kind(), LineKind::VERBOSE);

    let header = find(&document, "|      |BlackBox name |Instances |");
    assert_eq!(offset(&document, header, -1).kind(), LineKind::TABLE_FRAME);
    assert_eq!(offset(&document, header, 3).kind(), LineKind::TABLE_FOOTER);
}

#[test]
fn test_message_totals() {
    let document = parse();
    let counts = document.messages().counts();
    assert_eq!(counts.info, 10);
    assert_eq!(counts.warning, 1);
    assert_eq!(counts.critical_warning, 0);
    assert_eq!(counts.error, 0);

    // The exit message follows the command.
    let synth = document.command(CommandKind::SynthDesign).unwrap();
    assert_eq!(synth.messages().total(), 10);
    assert_eq!(synth.messages().tool_name(8), Some("Synth"));
}

#[test]
fn test_missing_sections_are_not_present() {
    let document = parse();
    let synth = document.command(CommandKind::SynthDesign).unwrap();
    let missing = synth.section("Timing Optimization").unwrap_err();
    assert!(missing.to_string().contains("Timing Optimization"));
    assert!(synth.section("IO Insertion").unwrap().child("Unknown").is_err());
}
