use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::aggregate::MessageAggregator;
use crate::catalog::{self, CommandCatalog};
use crate::diagnostics::DiagnosticKind;
use crate::error::{NotPresent, ParseError};
use crate::line::LineKind;
use crate::message::Message;
use crate::scope::{
    Cursor, Feed, Scope, ScopeCore, ScopeState, Span, active_mut, forward, interrupt_active,
};
use crate::section::{DELIMITER_PREFIX, Section, find_section};
use crate::task::{Task, find_task};
use crate::timing::{TIME_MARKER, Timing};
use crate::version::ToolVersion;

/// Prefix of the line Vivado echoes before running a Tcl command.
pub const COMMAND_PREFIX: &str = "Command: ";

/// Tool and kind ID of `Loading part <part>`.
const LOADING_PART_ID: (u32, u32) = (21, 403);

const RTL_OPTIMIZATION_MILESTONE: &str = "Finished RTL Optimization Phase";

static PARSING_XDC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^Parsing XDC File \[(.*?)\](?: for cell '(.*)')?$").unwrap());
static FINISHED_XDC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^Finished Parsing XDC File \[(.*?)\](?: for cell '(.*)')?$").unwrap());

static NO_ROWS: BTreeMap<String, u32> = BTreeMap::new();

/// Tcl commands with a known log structure.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum CommandKind {
    SynthDesign,
    LinkDesign,
    OptDesign,
    PlaceDesign,
    PhysOptDesign,
    RouteDesign,
    WriteBitstream,
    ReportDrc,
    ReportMethodology,
    ReportPower,
    Other(String),
}

impl CommandKind {
    pub fn from_name(name: &str) -> Self {
        match name {
            "synth_design" => CommandKind::SynthDesign,
            "link_design" => CommandKind::LinkDesign,
            "opt_design" => CommandKind::OptDesign,
            "place_design" => CommandKind::PlaceDesign,
            "phys_opt_design" => CommandKind::PhysOptDesign,
            "route_design" => CommandKind::RouteDesign,
            "write_bitstream" => CommandKind::WriteBitstream,
            "report_drc" => CommandKind::ReportDrc,
            "report_methodology" => CommandKind::ReportMethodology,
            "report_power" => CommandKind::ReportPower,
            other => CommandKind::Other(other.to_string()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            CommandKind::SynthDesign => "synth_design",
            CommandKind::LinkDesign => "link_design",
            CommandKind::OptDesign => "opt_design",
            CommandKind::PlaceDesign => "place_design",
            CommandKind::PhysOptDesign => "phys_opt_design",
            CommandKind::RouteDesign => "route_design",
            CommandKind::WriteBitstream => "write_bitstream",
            CommandKind::ReportDrc => "report_drc",
            CommandKind::ReportMethodology => "report_methodology",
            CommandKind::ReportPower => "report_power",
            CommandKind::Other(name) => name,
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A `Command: <name> <arguments...>` echo line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TclCommand {
    command: String,
    arguments: Vec<String>,
}

impl TclCommand {
    pub fn parse(text: &str) -> Option<Self> {
        let mut words = text.strip_prefix(COMMAND_PREFIX)?.split_whitespace();
        let command = words.next()?.to_string();
        Some(Self {
            command,
            arguments: words.map(str::to_string).collect(),
        })
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn arguments(&self) -> &[String] {
        &self.arguments
    }
}

impl fmt::Display for TclCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{COMMAND_PREFIX}{}", self.command)?;
        for argument in &self.arguments {
            write!(f, " {argument}")?;
        }
        Ok(())
    }
}

/// One `Parsing XDC File [...]` block of `link_design`.
#[derive(Debug, Clone, Serialize)]
pub struct XdcFile {
    path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    cell: Option<String>,
    span: Span,
    messages: Vec<Arc<Message>>,
    finished: bool,
}

impl XdcFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Cell the constraints were scoped to, for `... for cell '<cell>'`.
    pub fn cell(&self) -> Option<&str> {
        self.cell.as_deref()
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn messages(&self) -> &[Arc<Message>] {
        &self.messages
    }

    /// `false` if the matching `Finished Parsing XDC File` line never came.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    fn matches(&self, path: &str, cell: Option<&str>) -> bool {
        self.path == Path::new(path) && self.cell.as_deref() == cell
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Body,
    AwaitTime,
    Done,
}

/// One Tcl command and everything it logged up to its completion line.
#[derive(Debug)]
pub struct Command {
    kind: CommandKind,
    tcl: TclCommand,
    core: ScopeCore,
    stage: Stage,
    sections: Vec<Section>,
    tasks: Vec<Task>,
    active_section: Option<usize>,
    active_task: Option<usize>,
    milestone: bool,
    xdc_files: Vec<XdcFile>,
    open_xdc: Option<usize>,
    success: Option<bool>,
    completion: String,
    banner: String,
    time_marker: String,
}

impl Command {
    /// Builds the command and its child catalog for `version`.
    pub(crate) fn new(tcl: TclCommand, version: Option<ToolVersion>) -> Self {
        let kind = CommandKind::from_name(tcl.command());
        let (sections, tasks) = match catalog::for_command(&kind) {
            CommandCatalog::None => (Vec::new(), Vec::new()),
            CommandCatalog::Sections(specs) => (specs.iter().map(Section::new).collect(), Vec::new()),
            CommandCatalog::Tasks(specs) => (
                Vec::new(),
                specs.iter().map(|spec| Task::new(spec, version)).collect(),
            ),
        };
        let name = kind.name();
        Self {
            completion: format!("{name} "),
            banner: format!("Starting {name}"),
            time_marker: format!("{name}: {TIME_MARKER}"),
            kind,
            tcl,
            core: ScopeCore::default(),
            stage: Stage::Body,
            sections,
            tasks,
            active_section: None,
            active_task: None,
            milestone: false,
            xdc_files: Vec::new(),
            open_xdc: None,
            success: None,
        }
    }

    pub fn kind(&self) -> &CommandKind {
        &self.kind
    }

    pub fn tcl(&self) -> &TclCommand {
        &self.tcl
    }

    pub fn state(&self) -> ScopeState {
        self.core.state
    }

    pub fn span(&self) -> Option<Span> {
        self.core.span
    }

    /// Timing from the `<command>: Time (s): ...` line.
    pub fn timing(&self) -> Option<Timing> {
        self.core.timing
    }

    pub fn messages(&self) -> &MessageAggregator {
        &self.core.messages
    }

    pub fn is_interrupted(&self) -> bool {
        self.core.interrupted
    }

    /// `Some(true)` after `<command> completed successfully`, `Some(false)`
    /// after any other completion line, `None` if none was seen.
    pub fn success(&self) -> Option<bool> {
        self.success
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// The first section named `name` that appeared in the log.
    pub fn section(&self, name: &str) -> Result<&Section, NotPresent> {
        self.sections
            .iter()
            .find(|section| section.name() == name && section.state() != ScopeState::NotStarted)
            .ok_or_else(|| NotPresent::new(format!("section {name:?} of {}", self.kind)))
    }

    pub fn task(&self, name: &str) -> Result<&Task, NotPresent> {
        self.tasks
            .iter()
            .find(|task| task.name() == name && task.state() != ScopeState::NotStarted)
            .ok_or_else(|| NotPresent::new(format!("task {name:?} of {}", self.kind)))
    }

    pub fn xdc_files(&self) -> &[XdcFile] {
        &self.xdc_files
    }

    /// Target part, from the part loading section of `synth_design` or from
    /// the `[Device 21-403] Loading part` message.
    pub fn part(&self) -> Option<&str> {
        if let Some(part) = self.sections.iter().find_map(Section::part) {
            return Some(part);
        }
        let (tool_id, kind_id) = LOADING_PART_ID;
        self.core
            .messages
            .by_id(tool_id, kind_id)
            .first()
            .and_then(|message| message.text().strip_prefix("Loading part "))
            .map(str::trim)
    }

    /// Cell usage table of the synthesis report; empty for other commands.
    pub fn cells(&self) -> &BTreeMap<String, u32> {
        self.sections
            .iter()
            .find(|section| !section.cells().is_empty())
            .map_or(&NO_ROWS, Section::cells)
    }

    pub fn blackboxes(&self) -> &BTreeMap<String, u32> {
        self.sections
            .iter()
            .find(|section| !section.blackboxes().is_empty())
            .map_or(&NO_ROWS, Section::blackboxes)
    }

    pub fn has_blackboxes(&self) -> bool {
        !self.blackboxes().is_empty()
    }

    /// A latch was inferred: `[Synth 8-327]` was reported or the cell usage
    /// lists `LD` cells.
    pub fn has_latches(&self) -> bool {
        !self.core.messages.latch_messages().is_empty()
            || self.cells().get("LD").is_some_and(|count| *count > 0)
    }

    pub fn latches(&self) -> impl Iterator<Item = &Arc<Message>> + '_ {
        self.core.messages.latch_messages().iter()
    }

    pub fn vhdl_report_messages(&self) -> &[Arc<Message>] {
        self.core.messages.vhdl_report_messages()
    }

    pub fn vhdl_assert_messages(&self) -> &[Arc<Message>] {
        self.core.messages.vhdl_assert_messages()
    }

    pub(crate) fn start(&mut self, cx: &mut Cursor<'_>) -> Result<(), ParseError> {
        if !cx.starts_with(COMMAND_PREFIX) {
            return Err(cx.violation(format!("{COMMAND_PREFIX}{}", self.kind)));
        }
        cx.classify(LineKind::VIVADO_TCL_COMMAND);
        self.core.begin(cx.number());
        self.stage = Stage::Body;
        log::debug!("line {}: {} started", cx.number(), self.tcl);
        Ok(())
    }

    fn done(&mut self) {
        self.stage = Stage::Done;
        self.core.finish();
        log::debug!("{} finished", self.kind);
    }

    fn body(&mut self, cx: &mut Cursor<'_>) -> Result<Feed, ParseError> {
        if cx.starts_with(&self.completion) {
            interrupt_active(&mut self.sections, &mut self.active_section, cx);
            interrupt_active(&mut self.tasks, &mut self.active_task, cx);
            return Ok(self.complete(cx));
        }
        // Report commands print their time line without a completion line.
        if cx.starts_with(&self.time_marker) {
            interrupt_active(&mut self.sections, &mut self.active_section, cx);
            interrupt_active(&mut self.tasks, &mut self.active_task, cx);
            return Ok(self.await_time(cx));
        }

        if !self.core.degraded && self.open_section(cx)? {
            return Ok(Feed::Consumed);
        }
        if forward(&mut self.sections, &mut self.active_section, cx)?
            || forward(&mut self.tasks, &mut self.active_task, cx)?
        {
            return Ok(Feed::Consumed);
        }

        if cx.is_passthrough() {
            if let (Some(open), Some(message)) = (self.open_xdc, cx.message()) {
                let file = &mut self.xdc_files[open];
                file.messages.push(Arc::clone(message));
                file.span.last = cx.number();
            }
            return Ok(Feed::Consumed);
        }
        if let Some(open) = self.open_xdc {
            self.xdc_files[open].span.last = cx.number();
        }
        if self.core.degraded {
            cx.classify(LineKind::UNPROCESSED);
            return Ok(Feed::Consumed);
        }
        if cx.starts_with(&self.banner) {
            cx.classify(LineKind::VERBOSE);
            return Ok(Feed::Consumed);
        }

        let after_milestone = std::mem::take(&mut self.milestone);
        if !self.sections.is_empty() {
            self.section_level(cx, after_milestone)?;
        } else if !self.tasks.is_empty() {
            self.task_level(cx)?;
        } else if self.kind == CommandKind::LinkDesign {
            self.xdc(cx);
        } else {
            cx.classify(LineKind::VERBOSE);
        }
        Ok(Feed::Consumed)
    }

    /// Starts a top-level section, closing the active one if its end never
    /// appeared.
    fn open_section(&mut self, cx: &mut Cursor<'_>) -> Result<bool, ParseError> {
        let Some(position) = find_section(&self.sections, cx.text()) else {
            return Ok(false);
        };
        interrupt_active(&mut self.sections, &mut self.active_section, cx);
        if let Some(previous) = cx.previous_mut().filter(|line| line.starts_with(DELIMITER_PREFIX)) {
            previous.classify(LineKind::SECTION_START | LineKind::DELIMITER);
        }
        self.sections[position].start(cx)?;
        self.active_section = Some(position);
        Ok(true)
    }

    fn section_level(&mut self, cx: &mut Cursor<'_>, after_milestone: bool) -> Result<(), ParseError> {
        if cx.starts_with(RTL_OPTIMIZATION_MILESTONE) {
            cx.classify(LineKind::PHASE_END);
            if let Some(previous) = cx.previous_mut().filter(|line| line.starts_with(DELIMITER_PREFIX)) {
                previous.classify(LineKind::PHASE_END | LineKind::DELIMITER);
            }
            self.milestone = true;
        } else if cx.starts_with(DELIMITER_PREFIX) {
            if after_milestone {
                cx.classify(LineKind::PHASE_END | LineKind::DELIMITER);
            } else {
                cx.classify(LineKind::DELIMITER);
            }
        } else if cx.starts_with("Start ") || cx.starts_with("Starting ") {
            cx.unknown(self.kind.name(), "section")?;
            self.core.degraded = true;
        } else {
            cx.classify(LineKind::VERBOSE);
        }
        Ok(())
    }

    fn task_level(&mut self, cx: &mut Cursor<'_>) -> Result<(), ParseError> {
        if !cx.starts_with("Starting ") {
            cx.classify(LineKind::VERBOSE);
            return Ok(());
        }
        match find_task(&self.tasks, cx.text()) {
            Some(position) => {
                self.tasks[position].start(cx)?;
                self.active_task = Some(position);
            }
            None => {
                cx.unknown(self.kind.name(), "task")?;
                self.core.degraded = true;
            }
        }
        Ok(())
    }

    fn xdc(&mut self, cx: &mut Cursor<'_>) {
        if let Some(caps) = PARSING_XDC.captures(cx.text()) {
            let file = XdcFile {
                path: PathBuf::from(&caps[1]),
                cell: caps.get(2).map(|cell| cell.as_str().to_string()),
                span: Span {
                    first: cx.number(),
                    last: cx.number(),
                },
                messages: Vec::new(),
                finished: false,
            };
            self.xdc_files.push(file);
            self.open_xdc = Some(self.xdc_files.len() - 1);
            cx.classify(LineKind::XDC_START);
            return;
        }

        let Some(caps) = FINISHED_XDC.captures(cx.text()) else {
            cx.classify(LineKind::VERBOSE);
            return;
        };
        let matching = self
            .open_xdc
            .map(|open| &self.xdc_files[open])
            .is_some_and(|file| file.matches(&caps[1], caps.get(2).map(|cell| cell.as_str())));
        let open = self.open_xdc.take();
        cx.classify(LineKind::XDC_END);
        if matching {
            if let Some(open) = open {
                self.xdc_files[open].finished = true;
            }
        } else {
            let expected = open.map(|open| self.xdc_files[open].path.display().to_string());
            cx.flag(LineKind::PROCESSOR_ERROR);
            cx.report(DiagnosticKind::MismatchedXdcFile { expected });
        }
    }

    fn complete(&mut self, cx: &mut Cursor<'_>) -> Feed {
        let success = cx.starts_with(&format!("{}completed successfully", self.completion));
        cx.classify(LineKind::TCL_COMMAND_END);
        cx.flag(if success { LineKind::SUCCESS } else { LineKind::FAILED });
        self.success = Some(success);
        self.open_xdc = None;
        self.stage = Stage::AwaitTime;
        Feed::Consumed
    }

    fn await_time(&mut self, cx: &mut Cursor<'_>) -> Feed {
        if cx.starts_with(&self.time_marker) {
            cx.classify(LineKind::TCL_COMMAND_TIME);
            self.core.record_timing(cx.text());
            self.done();
            Feed::Consumed
        } else if cx.is_empty() {
            Feed::Consumed
        } else {
            self.done();
            Feed::Returned
        }
    }
}

impl Scope for Command {
    fn core(&self) -> &ScopeCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ScopeCore {
        &mut self.core
    }

    fn label(&self) -> String {
        self.kind.name().to_string()
    }

    fn step(&mut self, cx: &mut Cursor<'_>) -> Result<Feed, ParseError> {
        match self.stage {
            Stage::Body => self.body(cx),
            Stage::AwaitTime => Ok(self.await_time(cx)),
            Stage::Done => Ok(Feed::Returned),
        }
    }

    fn active_child(&mut self) -> Option<&mut dyn Scope> {
        match (self.active_section, self.active_task) {
            (Some(_), _) => active_mut(&mut self.sections, self.active_section),
            (None, Some(_)) => active_mut(&mut self.tasks, self.active_task),
            (None, None) => None,
        }
    }

    /// Commands without a known structure end wherever the next command
    /// starts.
    fn is_closing(&self) -> bool {
        self.stage != Stage::Body || matches!(self.kind, CommandKind::Other(_))
    }
}
