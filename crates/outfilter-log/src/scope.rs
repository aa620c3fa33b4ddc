//! Plumbing shared by every parsing scope.
//!
//! A scope is an explicit state machine. The document hands each line to the
//! active command, which forwards it to its active child, and so on down the
//! chain of active children. Each scope answers with a [`Feed`]: either it
//! consumed the line, or it has already ended and returns the line untouched
//! so the parent can classify it.

use std::sync::Arc;

use serde::Serialize;

use crate::aggregate::MessageAggregator;
use crate::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
use crate::error::ParseError;
use crate::line::{Line, LineKind};
use crate::message::Message;
use crate::timing::Timing;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ScopeState {
    NotStarted,
    Active,
    Finished,
}

/// First and last line number (inclusive) of a scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Span {
    pub first: usize,
    pub last: usize,
}

impl Span {
    pub fn contains(&self, other: &Span) -> bool {
        self.first <= other.first && other.last <= self.last
    }

    pub fn overlaps(&self, other: &Span) -> bool {
        self.first <= other.last && other.first <= self.last
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Feed {
    Consumed,
    Returned,
}

/// The line in flight plus everything a scope may touch while handling it.
pub(crate) struct Cursor<'a> {
    lines: &'a mut [Line],
    index: usize,
    strict: bool,
    diagnostics: &'a mut Diagnostics,
}

impl<'a> Cursor<'a> {
    pub(crate) fn new(
        lines: &'a mut [Line],
        index: usize,
        strict: bool,
        diagnostics: &'a mut Diagnostics,
    ) -> Self {
        debug_assert!(index < lines.len());
        Self {
            lines,
            index,
            strict,
            diagnostics,
        }
    }

    pub(crate) fn line(&self) -> &Line {
        &self.lines[self.index]
    }

    pub(crate) fn number(&self) -> usize {
        self.line().number()
    }

    pub(crate) fn text(&self) -> &str {
        self.line().text()
    }

    pub(crate) fn kind(&self) -> LineKind {
        self.line().kind()
    }

    pub(crate) fn starts_with(&self, prefix: &str) -> bool {
        self.line().starts_with(prefix)
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.kind().contains(LineKind::EMPTY)
    }

    pub(crate) fn message(&self) -> Option<&Arc<Message>> {
        self.line().message()
    }

    /// Empty lines and messages pass through every scope body unchanged.
    pub(crate) fn is_passthrough(&self) -> bool {
        self.is_empty() || self.message().is_some()
    }

    pub(crate) fn is_tcl_command(&self) -> bool {
        self.kind().contains(LineKind::VIVADO_TCL_COMMAND)
    }

    pub(crate) fn classify(&mut self, kind: LineKind) {
        self.lines[self.index].classify(kind);
    }

    pub(crate) fn flag(&mut self, kind: LineKind) {
        self.lines[self.index].flag(kind);
    }

    pub(crate) fn replace_message(&mut self, message: Message) {
        self.lines[self.index].set_message(message);
    }

    /// The line before the current one, for retroactive classification.
    pub(crate) fn previous_mut(&mut self) -> Option<&mut Line> {
        let previous = self.lines[self.index].previous()?;
        self.lines.get_mut(previous)
    }

    /// An earlier line by number, for retagging a remembered delimiter.
    pub(crate) fn line_mut(&mut self, number: usize) -> Option<&mut Line> {
        number.checked_sub(1).and_then(|index| self.lines.get_mut(index))
    }

    pub(crate) fn text_of(&self, number: usize) -> &str {
        number
            .checked_sub(1)
            .and_then(|index| self.lines.get(index))
            .map_or("", Line::text)
    }

    pub(crate) fn report(&mut self, kind: DiagnosticKind) {
        let diagnostic = Diagnostic {
            line: self.number(),
            text: self.text().to_string(),
            kind,
        };
        self.diagnostics.push(diagnostic);
    }

    pub(crate) fn report_at(&mut self, line: usize, kind: DiagnosticKind) {
        let diagnostic = Diagnostic {
            line,
            text: self.text_of(line).to_string(),
            kind,
        };
        self.diagnostics.push(diagnostic);
    }

    /// Handles a line that looks like a nested construct no child matches.
    ///
    /// In strict mode this is fatal. Otherwise the line is flagged and a
    /// diagnostic is collected; the caller degrades its remaining body.
    pub(crate) fn unknown(&mut self, scope: &str, construct: &'static str) -> Result<(), ParseError> {
        if self.strict {
            return Err(ParseError::UnknownConstruct {
                line: self.number(),
                construct,
                scope: scope.to_string(),
                text: self.text().to_string(),
            });
        }
        self.flag(LineKind::PROCESSOR_ERROR);
        self.report(DiagnosticKind::UnknownConstruct {
            scope: scope.to_string(),
            construct,
        });
        Ok(())
    }

    pub(crate) fn violation(&self, expected: impl Into<String>) -> ParseError {
        ParseError::ContractViolation {
            line: self.number(),
            expected: expected.into(),
            found: self.text().to_string(),
        }
    }
}

/// State every scope carries regardless of its kind.
#[derive(Debug, Clone)]
pub(crate) struct ScopeCore {
    pub(crate) state: ScopeState,
    pub(crate) span: Option<Span>,
    pub(crate) messages: MessageAggregator,
    pub(crate) timing: Option<Timing>,
    pub(crate) interrupted: bool,
    pub(crate) degraded: bool,
}

impl Default for ScopeCore {
    fn default() -> Self {
        Self {
            state: ScopeState::NotStarted,
            span: None,
            messages: MessageAggregator::new(),
            timing: None,
            interrupted: false,
            degraded: false,
        }
    }
}

impl ScopeCore {
    pub(crate) fn begin(&mut self, line: usize) {
        self.state = ScopeState::Active;
        self.span = Some(Span { first: line, last: line });
    }

    pub(crate) fn touch(&mut self, line: usize) {
        if let Some(span) = &mut self.span {
            span.last = line;
        }
    }

    pub(crate) fn finish(&mut self) {
        self.state = ScopeState::Finished;
    }

    pub(crate) fn last_line(&self) -> usize {
        self.span.map_or(0, |span| span.last)
    }

    pub(crate) fn is_fresh(&self) -> bool {
        self.state == ScopeState::NotStarted
    }

    pub(crate) fn record_timing(&mut self, text: &str) {
        if let Some(timing) = Timing::find(text) {
            self.timing = Some(timing);
        }
    }
}

pub(crate) trait Scope {
    fn core(&self) -> &ScopeCore;

    fn core_mut(&mut self) -> &mut ScopeCore;

    /// Name used in diagnostics and the outline.
    fn label(&self) -> String;

    /// Classifies one line while the scope is active.
    fn step(&mut self, cx: &mut Cursor<'_>) -> Result<Feed, ParseError>;

    fn active_child(&mut self) -> Option<&mut dyn Scope>;

    /// `true` once the end marker was seen and only optional trailing lines
    /// (time, footer, delimiter) are outstanding.
    fn is_closing(&self) -> bool;

    /// Hands one line to the scope and records its message on consumption.
    fn feed(&mut self, cx: &mut Cursor<'_>) -> Result<Feed, ParseError> {
        let feed = self.step(cx)?;
        if feed == Feed::Consumed {
            let core = self.core_mut();
            core.touch(cx.number());
            if let Some(message) = cx.message() {
                core.messages.add(Arc::clone(message));
            }
        }
        Ok(feed)
    }

    /// Closes a scope whose end marker never appeared, innermost first.
    ///
    /// `by` is the line that revealed the missing end, `None` at end of input.
    fn interrupt(&mut self, cx: &mut Cursor<'_>, by: Option<usize>) {
        if let Some(child) = self.active_child() {
            child.interrupt(cx, by);
        }
        let label = self.label();
        let closing = self.is_closing();
        let core = self.core_mut();
        if core.state != ScopeState::Active {
            return;
        }
        core.finish();
        if closing {
            return;
        }
        core.interrupted = true;
        let last_line = core.last_line();
        let kind = DiagnosticKind::UnterminatedScope {
            scope: label,
            last_line,
        };
        match by {
            Some(_) => cx.report(kind),
            None => cx.report_at(last_line, kind),
        }
    }

    /// Closes the scope on a line that opens a sibling or belongs further up.
    ///
    /// The caller hands the line back to its parent.
    fn unwind(&mut self, cx: &mut Cursor<'_>) {
        let by = cx.number();
        log::debug!("line {by}: {} left open", self.label());
        self.interrupt(cx, Some(by));
    }
}

/// Forwards the line to the active child, if any.
///
/// Returns `true` when the child consumed it. A child that hands the line
/// back is no longer active.
pub(crate) fn forward<S: Scope>(
    children: &mut [S],
    active: &mut Option<usize>,
    cx: &mut Cursor<'_>,
) -> Result<bool, ParseError> {
    let Some(child) = active.and_then(|index| children.get_mut(index)) else {
        *active = None;
        return Ok(false);
    };
    match child.feed(cx)? {
        Feed::Consumed => Ok(true),
        Feed::Returned => {
            *active = None;
            Ok(false)
        }
    }
}

/// Interrupts the active child because the parent saw its own end marker.
pub(crate) fn interrupt_active<S: Scope>(
    children: &mut [S],
    active: &mut Option<usize>,
    cx: &mut Cursor<'_>,
) {
    let by = cx.number();
    if let Some(child) = active.take().and_then(|index| children.get_mut(index)) {
        child.interrupt(cx, Some(by));
    }
}

pub(crate) fn active_mut<S: Scope>(children: &mut [S], active: Option<usize>) -> Option<&mut dyn Scope> {
    active
        .and_then(|index| children.get_mut(index))
        .map(|child| child as &mut dyn Scope)
}

/// Lines that open or close a structure at some level. Tails waiting for an
/// optional time or footer line stop at these.
pub(crate) fn is_structural(cx: &Cursor<'_>) -> bool {
    cx.is_tcl_command()
        || ["Phase ", "Starting ", "Ending ", "Start ", "Finished ", "----"]
            .iter()
            .any(|prefix| cx.starts_with(prefix))
}
