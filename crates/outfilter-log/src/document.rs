use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::NaiveDateTime;

use crate::aggregate::MessageAggregator;
use crate::command::{Command, CommandKind, TclCommand};
use crate::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
use crate::error::{NotPresent, ParseError};
use crate::line::{Line, LineBuffer, LineKind};
use crate::preamble::Preamble;
use crate::scope::{Cursor, Feed, Scope};
use crate::version::{SUPPORTED, ToolVersion};

/// Knobs for one classification run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseOptions {
    /// Fail on the first unknown construct instead of degrading the scope
    /// that contains it.
    pub strict: bool,
}

impl ParseOptions {
    pub fn strict() -> Self {
        Self { strict: true }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Driver {
    Preamble,
    Idle,
    Command(usize),
}

/// A classified Vivado log.
///
/// Every line carries its [`LineKind`] after [`Document::parse`]; the
/// commands found in the log expose the reconstructed scope tree.
#[derive(Debug)]
pub struct Document {
    lines: LineBuffer,
    options: ParseOptions,
    preamble: Preamble,
    commands: Vec<Command>,
    messages: MessageAggregator,
    diagnostics: Diagnostics,
    processing_duration: Duration,
}

impl Document {
    /// Splits `text` into lines and classifies them with default options.
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        Self::parse_with(text, ParseOptions::default())
    }

    pub fn parse_with(text: &str, options: ParseOptions) -> Result<Self, ParseError> {
        Self::classify(LineBuffer::from_text(text), options)
    }

    /// Classifies lines that were already split.
    pub fn from_lines<I, S>(lines: I, options: ParseOptions) -> Result<Self, ParseError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut buffer = LineBuffer::new();
        for line in lines {
            buffer.push(line);
        }
        Self::classify(buffer, options)
    }

    fn classify(lines: LineBuffer, options: ParseOptions) -> Result<Self, ParseError> {
        let mut document = Self {
            lines,
            options,
            preamble: Preamble::new(),
            commands: Vec::new(),
            messages: MessageAggregator::new(),
            diagnostics: Diagnostics::default(),
            processing_duration: Duration::ZERO,
        };
        document.run()?;
        Ok(document)
    }

    /// Resets every line to its initial tag and classifies the log again.
    pub fn reclassify(&mut self) -> Result<(), ParseError> {
        self.run()
    }

    fn run(&mut self) -> Result<(), ParseError> {
        let started = Instant::now();
        self.lines.reset_all();
        self.preamble = Preamble::new();
        self.commands.clear();
        self.messages = MessageAggregator::new();
        self.diagnostics.clear();

        let strict = self.options.strict;
        let lines = self.lines.as_mut_slice();
        let count = lines.len();
        let mut driver = Driver::Preamble;
        let mut version = None;

        for index in 0..count {
            let mut cx = Cursor::new(&mut *lines, index, strict, &mut self.diagnostics);
            loop {
                match driver {
                    Driver::Preamble => {
                        let feed = self.preamble.feed(&mut cx);
                        if self.preamble.is_done() {
                            version = self.preamble.tool_version();
                            check_version(&mut cx, version);
                            driver = Driver::Idle;
                        }
                        if feed == Feed::Consumed {
                            break;
                        }
                    }
                    Driver::Idle => {
                        if cx.is_tcl_command() {
                            if let Some(tcl) = TclCommand::parse(cx.text()) {
                                let mut command = Command::new(tcl, version);
                                command.start(&mut cx)?;
                                self.commands.push(command);
                                driver = Driver::Command(self.commands.len() - 1);
                                break;
                            }
                        }
                        if !cx.is_passthrough() {
                            cx.classify(LineKind::VERBOSE);
                        }
                        break;
                    }
                    Driver::Command(active) => {
                        let command = &mut self.commands[active];
                        if cx.is_tcl_command() {
                            let by = cx.number();
                            command.interrupt(&mut cx, Some(by));
                            driver = Driver::Idle;
                            continue;
                        }
                        match command.feed(&mut cx)? {
                            Feed::Consumed => break,
                            Feed::Returned => driver = Driver::Idle,
                        }
                    }
                }
            }
            if let Some(message) = cx.message() {
                self.messages.add(Arc::clone(message));
            }
        }

        if count > 0 {
            let mut cx = Cursor::new(&mut *lines, count - 1, strict, &mut self.diagnostics);
            match driver {
                Driver::Preamble => check_version(&mut cx, self.preamble.tool_version()),
                Driver::Command(active) => self.commands[active].interrupt(&mut cx, None),
                Driver::Idle => {}
            }
        }

        self.processing_duration = started.elapsed();
        log::info!(
            "classified {} lines: {} commands, {} messages, {} diagnostics",
            count,
            self.commands.len(),
            self.messages.total(),
            self.diagnostics.as_slice().len()
        );
        Ok(())
    }

    pub fn options(&self) -> ParseOptions {
        self.options
    }

    pub fn lines(&self) -> &[Line] {
        self.lines.as_slice()
    }

    /// Line by its 1-based number.
    pub fn line(&self, number: usize) -> Option<&Line> {
        number.checked_sub(1).and_then(|index| self.lines.get(index))
    }

    pub fn preamble(&self) -> &Preamble {
        &self.preamble
    }

    pub fn tool_version(&self) -> Option<ToolVersion> {
        self.preamble.tool_version()
    }

    pub fn start_time(&self) -> Option<NaiveDateTime> {
        self.preamble.start_time()
    }

    /// Commands in log order.
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// The first command of `kind` in the log.
    pub fn command(&self, kind: CommandKind) -> Result<&Command, NotPresent> {
        self.commands
            .iter()
            .find(|command| *command.kind() == kind)
            .ok_or_else(|| NotPresent::new(format!("command {kind}")))
    }

    /// Every message in the log, inside or outside commands.
    pub fn messages(&self) -> &MessageAggregator {
        &self.messages
    }

    /// Recoverable problems, in the order they were found.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        self.diagnostics.as_slice()
    }

    /// Wall time the last classification run took.
    pub fn processing_duration(&self) -> Duration {
        self.processing_duration
    }

    pub fn part(&self) -> Option<&str> {
        self.commands.iter().find_map(Command::part)
    }

    pub fn has_latches(&self) -> bool {
        !self.messages.latch_messages().is_empty() || self.commands.iter().any(Command::has_latches)
    }

    pub fn has_blackboxes(&self) -> bool {
        self.commands.iter().any(Command::has_blackboxes)
    }
}

fn check_version(cx: &mut Cursor<'_>, version: Option<ToolVersion>) {
    if !version.is_some_and(|version| SUPPORTED.contains(version)) {
        cx.report(DiagnosticKind::UnsupportedVersion { version });
    }
}
