use crate::command::CommandKind;
use crate::diagnostics::DiagnosticKind;
use crate::document::{Document, ParseOptions};
use crate::error::ParseError;
use crate::line::{Line, LineKind};
use crate::scope::ScopeState;
use crate::version::ToolVersion;

const TIME: &str =
    "Time (s): cpu = 00:00:01 ; elapsed = 00:00:02 . Memory (MB): peak = 1500.000 ; gain = 0.000";

fn log(version: Option<&str>, body: &[&str]) -> String {
    let mut text = String::new();
    if let Some(version) = version {
        text.push_str("#-----------------------------------------------------------\n");
        text.push_str(&format!("# Vivado v{version} (64-bit)\n"));
        text.push_str("#-----------------------------------------------------------\n");
    }
    for line in body {
        text.push_str(line);
        text.push('\n');
    }
    text
}

fn parse(version: Option<&str>, body: &[&str]) -> Document {
    Document::parse(&log(version, body)).unwrap()
}

fn find<'a>(document: &'a Document, prefix: &str) -> &'a Line {
    document
        .lines()
        .iter()
        .find(|line| line.text().starts_with(prefix))
        .unwrap()
}

fn unterminated(document: &Document) -> Vec<(usize, String)> {
    document
        .diagnostics()
        .iter()
        .filter_map(|diagnostic| match &diagnostic.kind {
            DiagnosticKind::UnterminatedScope { scope, .. } => Some((diagnostic.line, scope.clone())),
            _ => None,
        })
        .collect()
}

#[test]
fn test_parse_empty_log() {
    let document = Document::parse("").unwrap();
    assert!(document.lines().is_empty());
    assert!(document.commands().is_empty());
    assert!(document.diagnostics().is_empty());
    assert_eq!(document.tool_version(), None);
}

#[test]
fn test_lines_outside_commands() {
    let document = parse(
        Some("2023.2"),
        &[
            "source run.tcl",
            "Command: link_design -top top",
            "link_design completed successfully",
            "INFO: [Common 17-206] Exiting Vivado at Wed Jan 17 09:30:00 2024...",
        ],
    );
    assert_eq!(find(&document, "source run.tcl").kind(), LineKind::VERBOSE);
    assert_eq!(find(&document, "Command: link_design").kind(), LineKind::VIVADO_TCL_COMMAND);

    let exit = find(&document, "INFO: [Common 17-206]");
    assert_eq!(exit.kind(), LineKind::INFO_MESSAGE);
    assert_eq!(document.messages().total(), 1);
    assert!(document.command(CommandKind::LinkDesign).unwrap().messages().is_empty());
}

#[test]
fn test_sub_phase_matching_uses_parent_index() {
    let document = parse(
        Some("2023.2"),
        &[
            "Command: opt_design",
            "Starting Logic Optimization Task",
            "Phase 3 Initialization",
            "Phase 2.2 Setup Constraints And Sort Netlist",
            "Phase 3.2 Setup Constraints And Sort Netlist",
            "Phase 3.1 Core Generation And Design Setup | Checksum: 1",
            "Phase 3.2 Setup Constraints And Sort Netlist | Checksum: 2",
            TIME,
            "Phase 3 Initialization | Checksum: 3",
            TIME,
            "Ending Logic Optimization Task | Checksum: 4",
            TIME,
            "opt_design completed successfully",
        ],
    );
    assert!(document.diagnostics().is_empty(), "{:#?}", document.diagnostics());

    let stale = find(&document, "Phase 2.2 Setup");
    assert_eq!(stale.kind(), LineKind::VERBOSE);
    let start = find(&document, "Phase 3.2 Setup Constraints And Sort Netlist");
    assert_eq!(start.kind(), LineKind::SUB_PHASE | LineKind::START);
    assert_eq!(find(&document, "Phase 3.1 Core Generation").kind(), LineKind::VERBOSE);
    assert_eq!(
        find(&document, "Phase 3.2 Setup Constraints And Sort Netlist | Checksum").kind(),
        LineKind::SUB_PHASE | LineKind::END
    );

    let opt = document.command(CommandKind::OptDesign).unwrap();
    let initialization = opt
        .task("Logic Optimization Task")
        .and_then(|task| task.phase("Initialization"))
        .unwrap();
    let setup = initialization.child("Setup Constraints And Sort Netlist").unwrap();
    assert_eq!(setup.index().map(ToString::to_string), Some("3.2".to_string()));
    let span = setup.span().unwrap();
    assert_eq!((span.first, span.last), (start.number(), start.number() + 3));
    assert_eq!(setup.timing().map(|timing| timing.elapsed.as_secs()), Some(2));
    assert!(initialization.child("Core Generation And Design Setup").is_err());
}

#[test]
fn test_unknown_task_degrades_command() {
    let document = parse(
        None,
        &[
            "Command: opt_design",
            "Starting Mystery Task",
            "Phase 1 Something",
            "Ending Mystery Task | Checksum: 1",
            "opt_design completed successfully",
            "opt_design: Time (s): cpu = 00:00:01 ; elapsed = 00:00:01 . Memory (MB): peak = 1.0 ; gain = 0.0",
            "Command: route_design",
            "route_design completed successfully",
        ],
    );

    let kinds: Vec<_> = document.diagnostics().iter().map(|diagnostic| &diagnostic.kind).collect();
    assert_eq!(kinds.len(), 3, "{:#?}", document.diagnostics());
    assert_eq!(kinds[0], &DiagnosticKind::MissingPreamble);
    assert_eq!(kinds[1], &DiagnosticKind::UnsupportedVersion { version: None });
    assert_eq!(
        kinds[2],
        &DiagnosticKind::UnknownConstruct {
            scope: "opt_design".to_string(),
            construct: "task",
        }
    );
    assert_eq!(document.diagnostics()[2].line, 2);
    assert_eq!(document.diagnostics()[2].text, "Starting Mystery Task");

    assert_eq!(document.line(2).unwrap().kind(), LineKind::PROCESSOR_ERROR);
    assert!(document.line(3).unwrap().kind().is_unprocessed());
    assert!(document.line(4).unwrap().kind().is_unprocessed());
    assert_eq!(document.line(5).unwrap().kind(), LineKind::TCL_COMMAND_END | LineKind::SUCCESS);
    assert_eq!(document.line(6).unwrap().kind(), LineKind::TCL_COMMAND_TIME);

    // The next command is classified normally.
    let route = document.command(CommandKind::RouteDesign).unwrap();
    assert_eq!(route.success(), Some(true));
}

#[test]
fn test_strict_mode_fails_on_unknown_construct() {
    let text = log(
        Some("2023.2"),
        &[
            "Command: opt_design",
            "Starting Mystery Task",
            "opt_design completed successfully",
        ],
    );
    let error = Document::parse_with(&text, ParseOptions::strict()).unwrap_err();
    assert_eq!(error.line(), 5);
    assert!(matches!(
        error,
        ParseError::UnknownConstruct { construct: "task", .. }
    ));

    let lenient = Document::parse(&text).unwrap();
    assert_eq!(lenient.diagnostics().len(), 1);
}

#[test]
fn test_unterminated_scopes_at_end_of_input() {
    let document = parse(
        Some("2023.2"),
        &[
            "Command: place_design",
            "Starting Placer Task",
            "Phase 1 Placer Initialization",
            "INFO: [Place 30-1] Placer started",
        ],
    );
    let last = document.lines().len();
    assert_eq!(
        unterminated(&document),
        vec![
            (last, "Phase 1 Placer Initialization".to_string()),
            (last, "Placer Task".to_string()),
            (last, "place_design".to_string()),
        ]
    );

    let place = document.command(CommandKind::PlaceDesign).unwrap();
    assert!(place.is_interrupted());
    assert_eq!(place.state(), ScopeState::Finished);
    assert_eq!(place.success(), None);
    let placer = place.task("Placer Task").unwrap();
    assert!(placer.is_interrupted());
    assert!(placer.phase("Placer Initialization").unwrap().is_interrupted());
    assert_eq!(placer.messages().total(), 1);
}

#[test]
fn test_next_command_interrupts_open_scopes() {
    let document = parse(
        Some("2023.2"),
        &[
            "Command: opt_design",
            "Starting Logic Optimization Task",
            "Phase 1 Initialization",
            "Command: place_design",
            "place_design completed successfully",
        ],
    );
    let next = find(&document, "Command: place_design").number();
    let scopes = unterminated(&document);
    assert_eq!(scopes.len(), 3);
    assert!(scopes.iter().all(|(line, _)| *line == next));

    let last_lines: Vec<_> = document
        .diagnostics()
        .iter()
        .filter_map(|diagnostic| match diagnostic.kind {
            DiagnosticKind::UnterminatedScope { last_line, .. } => Some(last_line),
            _ => None,
        })
        .collect();
    assert_eq!(last_lines, vec![next - 1; 3]);
    assert_eq!(document.commands().len(), 2);
    assert_eq!(
        document.command(CommandKind::PlaceDesign).unwrap().success(),
        Some(true)
    );
}

#[test]
fn test_cell_usage_without_index_column() {
    let document = parse(
        Some("2023.2"),
        &[
            "Command: synth_design -top top",
            "---------------------------------------------------------------------------------",
            "Start Writing Synthesis Report",
            "---------------------------------------------------------------------------------",
            "",
            "Report Cell Usage: ",
            "+-----+------+",
            "|Cell |Count |",
            "+-----+------+",
            "| LD | 4 |",
            "+-----+------+",
            "---------------------------------------------------------------------------------",
            "Finished Writing Synthesis Report : Time (s): cpu = 00:00:01 ; elapsed = 00:00:01 . Memory (MB): peak = 1.0 ; gain = 0.0",
            "---------------------------------------------------------------------------------",
            "synth_design completed successfully",
        ],
    );
    assert!(document.diagnostics().is_empty(), "{:#?}", document.diagnostics());
    assert_eq!(find(&document, "| LD | 4 |").kind(), LineKind::TABLE_ROW);
    assert_eq!(find(&document, "Finished Writing").kind(), LineKind::SECTION_END);

    let synth = document.command(CommandKind::SynthDesign).unwrap();
    assert_eq!(synth.cells().get("LD"), Some(&4));
    assert!(synth.has_latches());
    assert_eq!(synth.latches().count(), 0);
    assert!(document.has_latches());
    assert!(!document.has_blackboxes());
}

#[test]
fn test_malformed_table_row() {
    let document = parse(
        Some("2023.2"),
        &[
            "Command: synth_design -top top",
            "---------------------------------------------------------------------------------",
            "Start Writing Synthesis Report",
            "---------------------------------------------------------------------------------",
            "Report Cell Usage: ",
            "+-+-----+------+",
            "| |Cell |Count |",
            "+-+-----+------+",
            "|1|LD   |many  |",
            "|2|FDRE |     3|",
            "+-+-----+------+",
            "---------------------------------------------------------------------------------",
            "Finished Writing Synthesis Report : Time (s): cpu = 00:00:01 ; elapsed = 00:00:01 . Memory (MB): peak = 1.0 ; gain = 0.0",
            "---------------------------------------------------------------------------------",
            "synth_design completed successfully",
        ],
    );
    let row = find(&document, "|1|LD");
    assert_eq!(row.kind(), LineKind::TABLE_ROW | LineKind::PROCESSOR_ERROR);
    assert_eq!(document.diagnostics().len(), 1);
    assert_eq!(document.diagnostics()[0].line, row.number());
    assert_eq!(
        document.diagnostics()[0].kind,
        DiagnosticKind::MalformedTableRow { table: "cell usage" }
    );

    let synth = document.command(CommandKind::SynthDesign).unwrap();
    assert_eq!(synth.cells().len(), 1);
    assert_eq!(synth.cells().get("FDRE"), Some(&3));
    assert!(!synth.has_latches());
}

#[test]
fn test_mismatched_xdc_file() {
    let document = parse(
        Some("2023.2"),
        &[
            "Command: link_design -top top",
            "Parsing XDC File [/work/a.xdc]",
            "Finished Parsing XDC File [/work/b.xdc]",
            "link_design completed successfully",
        ],
    );
    let end = find(&document, "Finished Parsing XDC File");
    assert_eq!(end.kind(), LineKind::XDC_END | LineKind::PROCESSOR_ERROR);
    assert_eq!(
        document.diagnostics()[0].kind,
        DiagnosticKind::MismatchedXdcFile {
            expected: Some("/work/a.xdc".to_string())
        }
    );

    let link = document.command(CommandKind::LinkDesign).unwrap();
    assert_eq!(link.xdc_files().len(), 1);
    assert!(!link.xdc_files()[0].is_finished());
}

const ROUTE: &[&str] = &[
    "Command: route_design",
    "Starting Routing Task",
    "Phase 1 Build RT Design",
    "Phase 1 Build RT Design | Checksum: 1a2b3c",
    TIME,
    "Phase 2 Global Routing",
    "Phase 2 Global Routing | Checksum: 4d5e6f",
    TIME,
    "Ending Routing Task | Checksum: 7a8b9c",
    TIME,
    "route_design completed successfully",
];

#[test]
fn test_catalog_follows_tool_version() {
    let current = parse(Some("2023.2"), ROUTE);
    assert!(current.diagnostics().is_empty(), "{:#?}", current.diagnostics());
    assert_eq!(find(&current, "Phase 2 Global Routing").kind(), LineKind::PHASE_START);

    let older = parse(Some("2019.1"), ROUTE);
    assert_eq!(older.tool_version(), Some(ToolVersion::new(2019, 1)));
    assert_eq!(older.diagnostics().len(), 1);
    let start = find(&older, "Phase 2 Global Routing");
    assert_eq!(older.diagnostics()[0].line, start.number());
    assert_eq!(start.kind(), LineKind::PROCESSOR_ERROR);
    assert!(find(&older, "Phase 2 Global Routing | Checksum").kind().is_unprocessed());
    assert_eq!(find(&older, "Ending Routing Task").kind(), LineKind::TASK_END);

    let routing = older
        .command(CommandKind::RouteDesign)
        .and_then(|route| route.task("Routing Task"))
        .unwrap();
    assert_eq!(routing.state(), ScopeState::Finished);
    assert!(routing.phase("Global Routing").is_err());
}

#[test]
fn test_unsupported_version_uses_oldest_catalog() {
    let document = parse(Some("2018.3"), ROUTE);
    assert_eq!(
        document.diagnostics()[0].kind,
        DiagnosticKind::UnsupportedVersion {
            version: Some(ToolVersion::new(2018, 3))
        }
    );
    // 2018.3 predates the global routing phase.
    assert!(matches!(
        document.diagnostics()[1].kind,
        DiagnosticKind::UnknownConstruct { construct: "phase", .. }
    ));
}

#[test]
fn test_reclassify_restores_tags() {
    let mut document = parse(Some("2023.2"), ROUTE);
    let before: Vec<_> = document.lines().iter().map(Line::kind).collect();
    document.reclassify().unwrap();
    let after: Vec<_> = document.lines().iter().map(Line::kind).collect();
    assert_eq!(before, after);
    assert_eq!(document.commands().len(), 1);
}

#[test]
fn test_sibling_phase_closes_unfinished_phase() {
    let document = parse(
        Some("2023.2"),
        &[
            "Command: place_design",
            "Starting Placer Task",
            "Phase 1 Placer Initialization",
            "INFO: [Place 30-1] Placer started",
            "Phase 2 Global Placement",
            "Phase 2 Global Placement | Checksum: 9a8b7c6d",
            TIME,
            "Ending Placer Task | Checksum: 11b1f2e3c",
            TIME,
            "place_design completed successfully",
        ],
    );
    let sibling = find(&document, "Phase 2 Global Placement").number();
    assert_eq!(sibling, 8);
    assert_eq!(document.line(sibling).unwrap().kind(), LineKind::PHASE | LineKind::START);
    assert_eq!(unterminated(&document), vec![(sibling, "Phase 1 Placer Initialization".to_string())]);
    assert_eq!(document.diagnostics().len(), 1);
    assert_eq!(
        document.diagnostics()[0].kind,
        DiagnosticKind::UnterminatedScope {
            scope: "Phase 1 Placer Initialization".to_string(),
            last_line: sibling - 1,
        }
    );

    let placer = document.command(CommandKind::PlaceDesign).unwrap().task("Placer Task").unwrap();
    assert!(!placer.is_interrupted());
    let initialization = placer.phase("Placer Initialization").unwrap();
    assert!(initialization.is_interrupted());
    assert_eq!(initialization.messages().total(), 1);
    let global = placer.phase("Global Placement").unwrap();
    assert!(!global.is_interrupted());
    assert_eq!(global.timing().map(|timing| timing.elapsed.as_secs()), Some(2));
}

#[test]
fn test_sibling_task_closes_unfinished_task() {
    let document = parse(
        Some("2023.2"),
        &[
            "Command: opt_design",
            "Starting Cache Timing Information Task",
            "INFO: [Timing 38-35] Done setting XDC timing constraints.",
            "Starting Logic Optimization Task",
            "Phase 1 Initialization",
            "Phase 1 Initialization | Checksum: 1",
            TIME,
            "Ending Logic Optimization Task | Checksum: 2",
            TIME,
            "opt_design completed successfully",
        ],
    );
    let sibling = find(&document, "Starting Logic Optimization Task").number();
    assert_eq!(sibling, 7);
    assert_eq!(document.line(sibling).unwrap().kind(), LineKind::TASK_START);
    assert_eq!(unterminated(&document), vec![(sibling, "Cache Timing Information Task".to_string())]);
    assert_eq!(document.diagnostics().len(), 1);

    let opt = document.command(CommandKind::OptDesign).unwrap();
    let cache = opt.task("Cache Timing Information Task").unwrap();
    assert!(cache.is_interrupted());
    assert_eq!(cache.span().map(|span| span.last), Some(sibling - 1));
    let logic = opt.task("Logic Optimization Task").unwrap();
    assert!(!logic.is_interrupted());
    assert!(logic.phase("Initialization").is_ok());
    assert_eq!(opt.success(), Some(true));
}

const DELIMITER: &str = "---------------------------------------------------------------------------------";

#[test]
fn test_parent_section_end_closes_sub_section() {
    let document = parse(
        Some("2023.2"),
        &[
            "Command: synth_design -top top",
            DELIMITER,
            "Start IO Insertion",
            DELIMITER,
            DELIMITER,
            "Start Flattening Before IO Insertion",
            DELIMITER,
            DELIMITER,
            "Finished IO Insertion : Time (s): cpu = 00:00:10 ; elapsed = 00:00:12 . Memory (MB): peak = 1.0 ; gain = 0.0",
            DELIMITER,
            "synth_design completed successfully",
        ],
    );
    let finished = find(&document, "Finished IO Insertion").number();
    assert_eq!(finished, 12);
    assert_eq!(
        unterminated(&document),
        vec![(finished, "Flattening Before IO Insertion".to_string())]
    );
    assert_eq!(document.diagnostics().len(), 1);
    assert_eq!(document.line(finished).unwrap().kind(), LineKind::SECTION_END);
    for number in [finished - 1, finished + 1] {
        assert_eq!(
            document.line(number).unwrap().kind(),
            LineKind::SECTION_END | LineKind::DELIMITER
        );
    }

    let io = document.command(CommandKind::SynthDesign).unwrap().section("IO Insertion").unwrap();
    assert_eq!(io.state(), ScopeState::Finished);
    assert!(!io.is_interrupted());
    assert_eq!(io.timing().map(|timing| timing.elapsed.as_secs()), Some(12));
    assert!(io.child("Flattening Before IO Insertion").unwrap().is_interrupted());
}

#[test]
fn test_sibling_sub_section_closes_unfinished_one() {
    let document = parse(
        Some("2023.2"),
        &[
            "Command: synth_design -top top",
            DELIMITER,
            "Start IO Insertion",
            DELIMITER,
            DELIMITER,
            "Start Flattening Before IO Insertion",
            DELIMITER,
            DELIMITER,
            "Start Final Netlist Cleanup",
            DELIMITER,
            DELIMITER,
            "Finished Final Netlist Cleanup : Time (s): cpu = 00:00:01 ; elapsed = 00:00:01 . Memory (MB): peak = 1.0 ; gain = 0.0",
            DELIMITER,
            DELIMITER,
            "Finished IO Insertion : Time (s): cpu = 00:00:10 ; elapsed = 00:00:12 . Memory (MB): peak = 1.0 ; gain = 0.0",
            DELIMITER,
            "synth_design completed successfully",
        ],
    );
    let sibling = find(&document, "Start Final Netlist Cleanup").number();
    assert_eq!(sibling, 12);
    assert_eq!(
        unterminated(&document),
        vec![(sibling, "Flattening Before IO Insertion".to_string())]
    );
    assert_eq!(document.diagnostics().len(), 1);
    assert_eq!(document.line(sibling).unwrap().kind(), LineKind::SUB_SECTION | LineKind::START);
    assert_eq!(
        document.line(sibling - 1).unwrap().kind(),
        LineKind::SUB_SECTION_START | LineKind::DELIMITER
    );

    let io = document.command(CommandKind::SynthDesign).unwrap().section("IO Insertion").unwrap();
    assert!(!io.is_interrupted());
    assert_eq!(io.timing().map(|timing| timing.elapsed.as_secs()), Some(12));
    let cleanup = io.child("Final Netlist Cleanup").unwrap();
    assert!(!cleanup.is_interrupted());
    assert_eq!(cleanup.state(), ScopeState::Finished);
}
