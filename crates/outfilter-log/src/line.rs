use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign, Not};
use std::sync::Arc;

use serde::{Serialize, Serializer};

use crate::message::Message;

/// Classification tag of a line.
///
/// A tag combines at most one *axis* (the structural level a line belongs to,
/// e.g. [`LineKind::PHASE`]) with *roles* (start, end, time, ...) and leaf
/// classes. Message severities, the message marker, the success/failure status
/// bits and [`LineKind::PROCESSOR_ERROR`] are *cross-cutting*: they survive
/// structural reclassification (see [`Line::classify`]).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct LineKind(u64);

impl LineKind {
    pub const UNPROCESSED: Self = Self(0);
    pub const PROCESSOR_ERROR: Self = Self(1 << 0);
    pub const EMPTY: Self = Self(1 << 1);
    pub const DELIMITER: Self = Self(1 << 2);
    pub const SUCCESS: Self = Self(1 << 3);
    pub const FAILED: Self = Self(1 << 4);

    pub const VERBOSE: Self = Self(1 << 10);
    pub const NORMAL: Self = Self(1 << 11);
    pub const INFO: Self = Self(1 << 12);
    pub const WARNING: Self = Self(1 << 13);
    pub const CRITICAL_WARNING: Self = Self(1 << 14);
    pub const ERROR: Self = Self(1 << 15);
    pub const FATAL: Self = Self(1 << 16);

    pub const START: Self = Self(1 << 20);
    pub const END: Self = Self(1 << 21);
    pub const HEADER: Self = Self(1 << 22);
    pub const CONTENT: Self = Self(1 << 23);
    pub const TIME: Self = Self(1 << 24);
    pub const FOOTER: Self = Self(1 << 25);

    pub const MESSAGE: Self = Self(1 << 30);

    pub const TASK: Self = Self(1 << 31);
    pub const PHASE: Self = Self(1 << 32);
    pub const SUB_PHASE: Self = Self(1 << 33);
    pub const SUB_SUB_PHASE: Self = Self(1 << 34);
    pub const SUB_SUB_SUB_PHASE: Self = Self(1 << 35);
    pub const SECTION: Self = Self(1 << 36);
    pub const SUB_SECTION: Self = Self(1 << 37);
    pub const PARAGRAPH: Self = Self(1 << 38);
    pub const HIERARCHY: Self = Self(1 << 39);
    pub const XDC: Self = Self(1 << 40);
    pub const TABLE: Self = Self(1 << 41);
    pub const TCL_COMMAND: Self = Self(1 << 42);

    pub const INFO_MESSAGE: Self = Self::MESSAGE.union(Self::INFO);
    pub const WARNING_MESSAGE: Self = Self::MESSAGE.union(Self::WARNING);
    pub const CRITICAL_WARNING_MESSAGE: Self = Self::MESSAGE.union(Self::CRITICAL_WARNING);
    pub const ERROR_MESSAGE: Self = Self::MESSAGE.union(Self::ERROR);

    pub const VIVADO_TCL_COMMAND: Self = Self::TCL_COMMAND.union(Self::START);
    pub const TCL_COMMAND_END: Self = Self::TCL_COMMAND.union(Self::END);
    pub const TCL_COMMAND_TIME: Self = Self::TCL_COMMAND.union(Self::TIME);

    pub const SECTION_START: Self = Self::SECTION.union(Self::START);
    pub const SECTION_END: Self = Self::SECTION.union(Self::END);
    pub const SECTION_DELIMITER: Self = Self::SECTION.union(Self::DELIMITER);
    pub const SUB_SECTION_START: Self = Self::SUB_SECTION.union(Self::START);
    pub const SUB_SECTION_END: Self = Self::SUB_SECTION.union(Self::END);

    pub const TASK_START: Self = Self::TASK.union(Self::START);
    pub const TASK_END: Self = Self::TASK.union(Self::END);
    pub const TASK_TIME: Self = Self::TASK.union(Self::TIME);

    pub const PHASE_START: Self = Self::PHASE.union(Self::START);
    pub const PHASE_END: Self = Self::PHASE.union(Self::END);
    pub const PHASE_TIME: Self = Self::PHASE.union(Self::TIME);
    pub const PHASE_FINAL: Self = Self::PHASE.union(Self::FOOTER);
    pub const PHASE_DELIMITER: Self = Self::PHASE.union(Self::DELIMITER);

    pub const PARAGRAPH_HEADLINE: Self = Self::PARAGRAPH.union(Self::HEADER);

    pub const TABLE_FRAME: Self = Self::TABLE.union(Self::DELIMITER);
    pub const TABLE_HEADER: Self = Self::TABLE.union(Self::HEADER);
    pub const TABLE_ROW: Self = Self::TABLE.union(Self::CONTENT);
    pub const TABLE_FOOTER: Self = Self::TABLE.union(Self::FOOTER);

    pub const XDC_START: Self = Self::XDC.union(Self::START);
    pub const XDC_END: Self = Self::XDC.union(Self::END);

    const AXES: Self = Self(
        Self::TASK.0
            | Self::PHASE.0
            | Self::SUB_PHASE.0
            | Self::SUB_SUB_PHASE.0
            | Self::SUB_SUB_SUB_PHASE.0
            | Self::SECTION.0
            | Self::SUB_SECTION.0
            | Self::PARAGRAPH.0
            | Self::HIERARCHY.0
            | Self::XDC.0
            | Self::TABLE.0
            | Self::TCL_COMMAND.0,
    );

    const CROSS_CUTTING: Self = Self(
        Self::PROCESSOR_ERROR.0
            | Self::SUCCESS.0
            | Self::FAILED.0
            | Self::INFO.0
            | Self::WARNING.0
            | Self::CRITICAL_WARNING.0
            | Self::ERROR.0
            | Self::FATAL.0
            | Self::MESSAGE.0,
    );

    const NAMES: &'static [(LineKind, &'static str)] = &[
        (Self::PROCESSOR_ERROR, "ProcessorError"),
        (Self::EMPTY, "Empty"),
        (Self::DELIMITER, "Delimiter"),
        (Self::SUCCESS, "Success"),
        (Self::FAILED, "Failed"),
        (Self::VERBOSE, "Verbose"),
        (Self::NORMAL, "Normal"),
        (Self::INFO, "Info"),
        (Self::WARNING, "Warning"),
        (Self::CRITICAL_WARNING, "CriticalWarning"),
        (Self::ERROR, "Error"),
        (Self::FATAL, "Fatal"),
        (Self::START, "Start"),
        (Self::END, "End"),
        (Self::HEADER, "Header"),
        (Self::CONTENT, "Content"),
        (Self::TIME, "Time"),
        (Self::FOOTER, "Footer"),
        (Self::MESSAGE, "Message"),
        (Self::TASK, "Task"),
        (Self::PHASE, "Phase"),
        (Self::SUB_PHASE, "SubPhase"),
        (Self::SUB_SUB_PHASE, "SubSubPhase"),
        (Self::SUB_SUB_SUB_PHASE, "SubSubSubPhase"),
        (Self::SECTION, "Section"),
        (Self::SUB_SECTION, "SubSection"),
        (Self::PARAGRAPH, "Paragraph"),
        (Self::HIERARCHY, "Hierarchy"),
        (Self::XDC, "Xdc"),
        (Self::TABLE, "Table"),
        (Self::TCL_COMMAND, "TclCommand"),
    ];

    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    pub const fn bits(self) -> u64 {
        self.0
    }

    pub const fn is_unprocessed(self) -> bool {
        self.0 == 0
    }

    /// Returns `true` if every bit of `other` is set in `self`.
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    /// The axis bit of this tag, if any.
    pub fn axis(self) -> Option<Self> {
        let axes = self & Self::AXES;
        (!axes.is_unprocessed()).then_some(axes)
    }

    /// A tag is well formed when it names at most one axis.
    pub fn is_well_formed(self) -> bool {
        (self & Self::AXES).0.count_ones() <= 1
    }

    pub fn structural(self) -> Self {
        self & !Self::CROSS_CUTTING
    }

    pub fn cross_cutting(self) -> Self {
        self & Self::CROSS_CUTTING
    }
}

impl BitOr for LineKind {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for LineKind {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for LineKind {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl Not for LineKind {
    type Output = Self;

    fn not(self) -> Self {
        Self(!self.0)
    }
}

impl fmt::Display for LineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unprocessed() {
            return f.write_str("Unprocessed");
        }
        let mut first = true;
        for (bit, name) in Self::NAMES {
            if self.contains(*bit) {
                if !first {
                    f.write_str("|")?;
                }
                f.write_str(name)?;
                first = false;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for LineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LineKind({self})")
    }
}

impl Serialize for LineKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// One input line and its classification.
///
/// Neighbour links are indices into the owning [`LineBuffer`]; they are
/// navigation aids, not ownership.
#[derive(Debug, Clone, Serialize)]
pub struct Line {
    number: usize,
    kind: LineKind,
    text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<Arc<Message>>,
    #[serde(skip)]
    previous: Option<usize>,
    #[serde(skip)]
    next: Option<usize>,
}

impl Line {
    /// Creates an unprocessed line. `number` is 1-based.
    pub fn new(number: usize, text: impl Into<String>) -> Self {
        Self {
            number,
            kind: LineKind::UNPROCESSED,
            text: text.into(),
            message: None,
            previous: None,
            next: None,
        }
    }

    pub fn number(&self) -> usize {
        self.number
    }

    pub fn kind(&self) -> LineKind {
        self.kind
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn message(&self) -> Option<&Arc<Message>> {
        self.message.as_ref()
    }

    /// Buffer index of the preceding line.
    pub fn previous(&self) -> Option<usize> {
        self.previous
    }

    /// Buffer index of the following line.
    pub fn next(&self) -> Option<usize> {
        self.next
    }

    pub fn starts_with(&self, prefix: &str) -> bool {
        self.text.starts_with(prefix)
    }

    /// Overwrites the structural part of the tag, keeping cross-cutting bits.
    pub fn classify(&mut self, kind: LineKind) {
        self.kind = self.kind.cross_cutting() | kind;
        debug_assert!(self.kind.is_well_formed(), "{self:?}");
    }

    /// Adds cross-cutting bits to the tag.
    pub fn flag(&mut self, kind: LineKind) {
        debug_assert_eq!(kind.structural(), LineKind::UNPROCESSED);
        self.kind |= kind.cross_cutting();
    }

    pub(crate) fn set_message(&mut self, message: Message) {
        self.kind = self.kind.structural() | message.severity().line_kind() | LineKind::MESSAGE;
        self.message = Some(Arc::new(message));
    }

    /// Restores the tag a line gets before any scope has seen it: empty lines,
    /// decoded messages and Tcl command echoes are recognised here, everything
    /// else is unprocessed.
    pub fn reset(&mut self) {
        self.kind = LineKind::UNPROCESSED;
        self.message = None;

        if self.text.trim().is_empty() {
            self.kind = LineKind::EMPTY;
        } else if let Some(message) = Message::decode(self.number, &self.text) {
            self.set_message(message);
        } else if self.text.starts_with(crate::command::COMMAND_PREFIX) {
            self.kind = LineKind::VIVADO_TCL_COMMAND;
        }
    }
}

/// Ordered line sequence with neighbour links.
#[derive(Debug, Clone, Default)]
pub struct LineBuffer {
    lines: Vec<Line>,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Splits `text` into lines (`\n` or `\r\n`) numbered from 1.
    pub fn from_text(text: &str) -> Self {
        let mut buffer = Self::new();
        for line in text.lines() {
            buffer.push(line);
        }
        buffer
    }

    /// Appends a line and links it to its predecessor.
    pub fn push(&mut self, text: impl Into<String>) -> usize {
        let index = self.lines.len();
        let mut line = Line::new(index + 1, text);
        line.reset();
        self.lines.push(line);
        if index > 0 {
            self.set_previous(index, index - 1);
        }
        index
    }

    /// Links `line` back to `previous` and `previous` forward to `line`.
    pub fn set_previous(&mut self, line: usize, previous: usize) {
        if line >= self.lines.len() || previous >= self.lines.len() {
            return;
        }
        self.lines[line].previous = Some(previous);
        self.lines[previous].next = Some(line);
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Line> {
        self.lines.get(index)
    }

    pub fn as_slice(&self) -> &[Line] {
        &self.lines
    }

    pub(crate) fn as_mut_slice(&mut self) -> &mut [Line] {
        &mut self.lines
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Line> {
        self.lines.iter()
    }

    pub(crate) fn reset_all(&mut self) {
        for line in &mut self.lines {
            line.reset();
        }
    }
}

impl<'a> IntoIterator for &'a LineBuffer {
    type Item = &'a Line;
    type IntoIter = std::slice::Iter<'a, Line>;

    fn into_iter(self) -> Self::IntoIter {
        self.lines.iter()
    }
}
