use std::collections::BTreeMap;

use serde::Serialize;

use crate::aggregate::MessageAggregator;
use crate::diagnostics::DiagnosticKind;
use crate::error::{NotPresent, ParseError};
use crate::line::LineKind;
use crate::scope::{
    Cursor, Feed, Scope, ScopeCore, ScopeState, Span, active_mut, forward, interrupt_active,
};
use crate::table::{TableKind, TableScanner};
use crate::timing::Timing;

pub(crate) const DELIMITER_PREFIX: &str = "----";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SectionLevel {
    Section,
    SubSection,
}

impl SectionLevel {
    pub fn axis(self) -> LineKind {
        match self {
            SectionLevel::Section => LineKind::SECTION,
            SectionLevel::SubSection => LineKind::SUB_SECTION,
        }
    }

    fn construct(self) -> &'static str {
        match self {
            SectionLevel::Section => "section",
            SectionLevel::SubSection => "sub-section",
        }
    }
}

/// Facts a section reads from its body besides messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extract {
    None,
    /// VHDL `report` and `assert` messages are re-read as RTL diagnostics.
    RtlDiagnostics,
    /// `Loading part: <part>`.
    Part,
    /// Black box and cell usage tables.
    SynthesisReport,
}

/// Static description of one section.
#[derive(Debug)]
pub struct SectionSpec {
    pub name: &'static str,
    pub start: &'static str,
    pub finish: &'static str,
    pub level: SectionLevel,
    pub extract: Extract,
    pub children: &'static [SectionSpec],
}

impl SectionSpec {
    pub const fn new(name: &'static str, start: &'static str, finish: &'static str) -> Self {
        Self {
            name,
            start,
            finish,
            level: SectionLevel::Section,
            extract: Extract::None,
            children: &[],
        }
    }

    pub const fn sub(name: &'static str, start: &'static str, finish: &'static str) -> Self {
        Self {
            level: SectionLevel::SubSection,
            ..Self::new(name, start, finish)
        }
    }

    pub const fn extracting(self, extract: Extract) -> Self {
        Self { extract, ..self }
    }

    pub const fn with_children(self, children: &'static [SectionSpec]) -> Self {
        Self { children, ..self }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Opening,
    Body,
    /// A `----` line was seen; the next line tells whether it closed the body
    /// or opened a sub-section.
    Delimited,
    Closing,
    Done,
}

/// A synthesis section or sub-section.
#[derive(Debug)]
pub struct Section {
    spec: &'static SectionSpec,
    core: ScopeCore,
    stage: Stage,
    children: Vec<Section>,
    active: Option<usize>,
    delimiter: Option<usize>,
    table: Option<TableScanner>,
    part: Option<String>,
    blackboxes: BTreeMap<String, u32>,
    cells: BTreeMap<String, u32>,
}

/// Position of the first idle section starting on `text`.
pub(crate) fn find_section(sections: &[Section], text: &str) -> Option<usize> {
    sections
        .iter()
        .position(|section| section.core.is_fresh() && text.starts_with(section.spec.start))
}

impl Section {
    pub(crate) fn new(spec: &'static SectionSpec) -> Self {
        Self {
            spec,
            core: ScopeCore::default(),
            stage: Stage::Opening,
            children: spec.children.iter().map(Section::new).collect(),
            active: None,
            delimiter: None,
            table: None,
            part: None,
            blackboxes: BTreeMap::new(),
            cells: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.spec.name
    }

    pub fn level(&self) -> SectionLevel {
        self.spec.level
    }

    pub fn state(&self) -> ScopeState {
        self.core.state
    }

    pub fn span(&self) -> Option<Span> {
        self.core.span
    }

    /// Timing printed on the `Finished ...` line.
    pub fn timing(&self) -> Option<Timing> {
        self.core.timing
    }

    pub fn messages(&self) -> &MessageAggregator {
        &self.core.messages
    }

    pub fn is_interrupted(&self) -> bool {
        self.core.interrupted
    }

    pub fn children(&self) -> &[Section] {
        &self.children
    }

    pub fn child(&self, name: &str) -> Result<&Section, NotPresent> {
        self.children
            .iter()
            .find(|child| child.name() == name && !child.core.is_fresh())
            .ok_or_else(|| NotPresent::new(format!("sub-section {name:?}")))
    }

    /// Target part, from the `Loading part:` line.
    pub fn part(&self) -> Option<&str> {
        self.part.as_deref()
    }

    /// Black box name to instance count, from the `Report BlackBoxes:` table.
    pub fn blackboxes(&self) -> &BTreeMap<String, u32> {
        &self.blackboxes
    }

    /// Cell name to count, from the `Report Cell Usage:` table.
    pub fn cells(&self) -> &BTreeMap<String, u32> {
        &self.cells
    }

    pub(crate) fn start(&mut self, cx: &mut Cursor<'_>) -> Result<(), ParseError> {
        if !cx.starts_with(self.spec.start) {
            return Err(cx.violation(format!("{:?}", self.spec.start)));
        }
        cx.classify(self.axis() | LineKind::START);
        self.core.begin(cx.number());
        self.stage = Stage::Opening;
        log::debug!("line {}: {} {:?} started", cx.number(), self.spec.level.construct(), self.spec.name);
        Ok(())
    }

    fn axis(&self) -> LineKind {
        self.spec.level.axis()
    }

    fn done(&mut self) {
        self.stage = Stage::Done;
        self.core.finish();
        log::debug!("{} {:?} finished", self.spec.level.construct(), self.spec.name);
    }

    fn opening(&mut self, cx: &mut Cursor<'_>) -> Result<Feed, ParseError> {
        self.stage = Stage::Body;
        if cx.starts_with(DELIMITER_PREFIX) {
            cx.classify(self.axis() | LineKind::START | LineKind::DELIMITER);
            return Ok(Feed::Consumed);
        }
        cx.flag(LineKind::PROCESSOR_ERROR);
        cx.report(DiagnosticKind::UnexpectedLine {
            scope: self.spec.name.to_string(),
            expected: "delimiter",
        });
        self.body(cx)
    }

    fn body(&mut self, cx: &mut Cursor<'_>) -> Result<Feed, ParseError> {
        if self.overrides_child(cx) {
            interrupt_active(&mut self.children, &mut self.active, cx);
            if cx.starts_with(self.spec.finish) {
                let axis = self.axis();
                if let Some(previous) = cx.previous_mut().filter(|line| line.starts_with(DELIMITER_PREFIX)) {
                    previous.classify(axis | LineKind::END | LineKind::DELIMITER);
                }
                self.finish(cx);
                return Ok(Feed::Consumed);
            }
            if let Some(previous) = cx.previous_mut().filter(|line| line.starts_with(DELIMITER_PREFIX)) {
                previous.classify(LineKind::SUB_SECTION_START | LineKind::DELIMITER);
            }
        } else if forward(&mut self.children, &mut self.active, cx)? {
            return Ok(Feed::Consumed);
        }

        if let Some(table) = self.table.as_mut() {
            let rows = match table.kind() {
                TableKind::BlackBoxes => &mut self.blackboxes,
                TableKind::CellUsage => &mut self.cells,
            };
            let consumed = table.feed(cx, rows);
            if table.is_done() {
                self.table = None;
            }
            if consumed {
                return Ok(Feed::Consumed);
            }
        }

        if cx.is_passthrough() {
            if self.spec.extract == Extract::RtlDiagnostics {
                if let Some(rtl) = cx.message().and_then(|message| message.to_rtl()) {
                    cx.replace_message(rtl);
                }
            }
            return Ok(Feed::Consumed);
        }
        if cx.starts_with(DELIMITER_PREFIX) {
            cx.classify(self.axis() | LineKind::END | LineKind::DELIMITER);
            self.delimiter = Some(cx.number());
            self.stage = Stage::Delimited;
            return Ok(Feed::Consumed);
        }
        if self.core.degraded {
            cx.classify(LineKind::UNPROCESSED);
            return Ok(Feed::Consumed);
        }
        if self.open_child(cx)? {
            return Ok(Feed::Consumed);
        }

        match self.spec.extract {
            Extract::Part if cx.starts_with("Loading part: ") => {
                self.part = cx
                    .text()
                    .strip_prefix("Loading part: ")
                    .map(|part| part.trim().to_string());
                cx.classify(LineKind::NORMAL);
            }
            Extract::SynthesisReport if cx.starts_with("Report BlackBoxes:") => {
                cx.classify(LineKind::PARAGRAPH_HEADLINE);
                self.table = Some(TableScanner::new(TableKind::BlackBoxes));
            }
            Extract::SynthesisReport if cx.starts_with("Report Cell Usage:") => {
                cx.classify(LineKind::PARAGRAPH_HEADLINE);
                self.table = Some(TableScanner::new(TableKind::CellUsage));
            }
            _ => cx.classify(LineKind::VERBOSE),
        }
        Ok(Feed::Consumed)
    }

    /// The parent's own end or the start of another sub-section closes the
    /// active sub-section even if its end never appeared.
    fn overrides_child(&self, cx: &Cursor<'_>) -> bool {
        let open = self
            .active
            .and_then(|index| self.children.get(index))
            .is_some_and(|child| child.core.state == ScopeState::Active);
        if !open {
            return false;
        }
        cx.starts_with(self.spec.finish)
            || (cx.starts_with("Start ") && find_section(&self.children, cx.text()).is_some())
    }

    fn finish(&mut self, cx: &mut Cursor<'_>) {
        cx.classify(self.axis() | LineKind::END);
        self.core.record_timing(cx.text());
        self.delimiter = None;
        self.stage = Stage::Closing;
    }

    /// Starts the sub-section opening on the current line, if any.
    fn open_child(&mut self, cx: &mut Cursor<'_>) -> Result<bool, ParseError> {
        if self.children.is_empty() || !cx.starts_with("Start ") {
            return Ok(false);
        }
        let Some(position) = find_section(&self.children, cx.text()) else {
            cx.unknown(self.spec.name, "sub-section")?;
            self.core.degraded = true;
            return Ok(true);
        };
        if let Some(delimiter) = self.delimiter.take().and_then(|number| cx.line_mut(number)) {
            delimiter.classify(LineKind::SUB_SECTION_START | LineKind::DELIMITER);
        }
        self.children[position].start(cx)?;
        self.active = Some(position);
        Ok(true)
    }

    fn delimited(&mut self, cx: &mut Cursor<'_>) -> Result<Feed, ParseError> {
        if cx.is_passthrough() {
            return Ok(Feed::Consumed);
        }
        if cx.starts_with(self.spec.finish) {
            self.finish(cx);
            return Ok(Feed::Consumed);
        }

        self.stage = Stage::Body;
        if cx.starts_with(DELIMITER_PREFIX) {
            // Another delimiter: the remembered one closed nothing.
            if let Some(previous) = self.delimiter.and_then(|number| cx.line_mut(number)) {
                previous.classify(LineKind::DELIMITER);
            }
            return self.body(cx);
        }
        let child_start = !self.children.is_empty() && cx.starts_with("Start ");
        if !child_start {
            if let Some(previous) = self.delimiter.take().and_then(|number| cx.line_mut(number)) {
                previous.classify(LineKind::DELIMITER);
            }
        }
        self.body(cx)
    }

    fn closing(&mut self, cx: &mut Cursor<'_>) -> Feed {
        if cx.starts_with(DELIMITER_PREFIX) {
            cx.classify(self.axis() | LineKind::END | LineKind::DELIMITER);
            self.done();
            Feed::Consumed
        } else {
            self.done();
            Feed::Returned
        }
    }
}

impl Scope for Section {
    fn core(&self) -> &ScopeCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ScopeCore {
        &mut self.core
    }

    fn label(&self) -> String {
        self.spec.name.to_string()
    }

    fn step(&mut self, cx: &mut Cursor<'_>) -> Result<Feed, ParseError> {
        match self.stage {
            Stage::Opening => self.opening(cx),
            Stage::Body => self.body(cx),
            Stage::Delimited => self.delimited(cx),
            Stage::Closing => Ok(self.closing(cx)),
            Stage::Done => Ok(Feed::Returned),
        }
    }

    fn active_child(&mut self) -> Option<&mut dyn Scope> {
        active_mut(&mut self.children, self.active)
    }

    fn is_closing(&self) -> bool {
        self.stage == Stage::Closing
    }
}
