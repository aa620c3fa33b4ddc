use std::fmt;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::Serialize;

use crate::line::LineKind;

/// Tool ID of the synthesis engine (`[Synth 8-...]`).
pub const SYNTH_TOOL_ID: u32 = 8;
/// `[Synth 8-6031] RTL report: ...`
pub const RTL_REPORT_KIND_ID: u32 = 6031;
/// `[Synth 8-63] RTL assertion: ...`
pub const RTL_ASSERTION_KIND_ID: u32 = 63;
/// `[Synth 8-327] inferring latch for variable ...`
pub const LATCH_KIND_ID: u32 = 327;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Severity {
    Info,
    Warning,
    CriticalWarning,
    Error,
}

impl Severity {
    pub const ALL: [Severity; 4] = [
        Severity::Info,
        Severity::Warning,
        Severity::CriticalWarning,
        Severity::Error,
    ];

    /// The keyword that opens a message of this severity.
    pub fn prefix(self) -> &'static str {
        match self {
            Severity::Info => "INFO",
            Severity::Warning => "WARNING",
            Severity::CriticalWarning => "CRITICAL WARNING",
            Severity::Error => "ERROR",
        }
    }

    pub fn line_kind(self) -> LineKind {
        match self {
            Severity::Info => LineKind::INFO,
            Severity::Warning => LineKind::WARNING,
            Severity::CriticalWarning => LineKind::CRITICAL_WARNING,
            Severity::Error => LineKind::ERROR,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

struct Patterns {
    regular: Regex,
    bracketed: Option<Regex>,
    bare: Option<Regex>,
}

impl Patterns {
    fn new(prefix: &str, loose: bool) -> Self {
        // Identifiers longer than nine digits do not fit a u32 and fall
        // through to the looser forms.
        let regular = format!(r"^{prefix}: \[(\w+) (\d{{1,9}})-(\d{{1,9}})\] (.*)$");
        let bracketed = format!(r"^{prefix}: \[(\w+)-(\d{{1,9}})\] (.*)$");
        let bare = format!(r"^{prefix}: (.*)$");
        Self {
            regular: compile(&regular),
            bracketed: loose.then(|| compile(&bracketed)),
            bare: loose.then(|| compile(&bare)),
        }
    }
}

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap()
}

static INFO_PATTERNS: Lazy<Patterns> = Lazy::new(|| Patterns::new("INFO", true));
static WARNING_PATTERNS: Lazy<Patterns> = Lazy::new(|| Patterns::new("WARNING", true));
static CRITICAL_WARNING_PATTERNS: Lazy<Patterns> =
    Lazy::new(|| Patterns::new("CRITICAL WARNING", false));
static ERROR_PATTERNS: Lazy<Patterns> = Lazy::new(|| Patterns::new("ERROR", false));

static RTL_REPORT_PATTERN: Lazy<Regex> =
    Lazy::new(|| compile(r#"^RTL report: "(.*)" \[(.*):(\d+)\]"#));
static RTL_ASSERTION_PATTERN: Lazy<Regex> =
    Lazy::new(|| compile(r#"^RTL assertion: "(.*)" \[(.*):(\d+)\]"#));

/// A decoded tool message.
///
/// Regular messages carry a tool name, tool ID and kind ID
/// (`INFO: [Synth 8-7079] ...`). The irregular Info/Warning forms carry less:
/// `INFO: [Tool-25] ...` has no tool ID, `WARNING: ...` has no identifiers at
/// all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    line_number: usize,
    severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_id: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    kind_id: Option<u32>,
    text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    rtl: Option<RtlDiagnostic>,
}

impl Message {
    /// Decodes `text` with the decoder matching its severity keyword.
    pub fn decode(line_number: usize, text: &str) -> Option<Self> {
        if text.starts_with("INFO") {
            decode_info(line_number, text)
        } else if text.starts_with("WARNING") {
            decode_warning(line_number, text)
        } else if text.starts_with("CRITICAL WARNING") {
            decode_critical_warning(line_number, text)
        } else if text.starts_with("ERROR") {
            decode_error(line_number, text)
        } else {
            None
        }
    }

    pub fn line_number(&self) -> usize {
        self.line_number
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn tool_name(&self) -> Option<&str> {
        self.tool_name.as_deref()
    }

    pub fn tool_id(&self) -> Option<u32> {
        self.tool_id
    }

    pub fn kind_id(&self) -> Option<u32> {
        self.kind_id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn rtl(&self) -> Option<&RtlDiagnostic> {
        self.rtl.as_ref()
    }

    pub fn is(&self, tool_id: u32, kind_id: u32) -> bool {
        self.tool_id == Some(tool_id) && self.kind_id == Some(kind_id)
    }

    /// Re-reads an Info `[Synth 8-6031]` / `[Synth 8-63]` message as a VHDL
    /// report or assertion.
    ///
    /// Returns `None` for any other message and when the text does not carry
    /// the quoted message and `[file:line]` location.
    pub fn to_rtl(&self) -> Option<Self> {
        if self.severity != Severity::Info || self.tool_id != Some(SYNTH_TOOL_ID) {
            return None;
        }
        let (kind, pattern) = match self.kind_id? {
            RTL_REPORT_KIND_ID => (RtlKind::Report, &*RTL_REPORT_PATTERN),
            RTL_ASSERTION_KIND_ID => (RtlKind::Assertion, &*RTL_ASSERTION_PATTERN),
            _ => return None,
        };
        let caps = pattern.captures(&self.text)?;
        let rtl = RtlDiagnostic {
            kind,
            inner_text: caps[1].to_string(),
            source_file: PathBuf::from(&caps[2]),
            source_line: caps[3].parse().ok()?,
        };
        Some(Self {
            rtl: Some(rtl),
            ..self.clone()
        })
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = self.severity.prefix();
        match (&self.tool_name, self.tool_id, self.kind_id) {
            (Some(tool), Some(tool_id), Some(kind_id)) => {
                write!(f, "{prefix}: [{tool} {tool_id}-{kind_id}] {}", self.text)
            }
            (Some(tool), None, Some(kind_id)) => {
                write!(f, "{prefix}: [{tool}-{kind_id}] {}", self.text)
            }
            _ => write!(f, "{prefix}: {}", self.text),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RtlKind {
    Report,
    Assertion,
}

/// Payload of a VHDL `report` statement or `assert` failure echoed by synthesis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RtlDiagnostic {
    kind: RtlKind,
    inner_text: String,
    source_file: PathBuf,
    source_line: u32,
}

impl RtlDiagnostic {
    pub fn kind(&self) -> RtlKind {
        self.kind
    }

    pub fn inner_text(&self) -> &str {
        &self.inner_text
    }

    pub fn source_file(&self) -> &Path {
        &self.source_file
    }

    pub fn source_line(&self) -> u32 {
        self.source_line
    }
}

fn decode(line_number: usize, text: &str, severity: Severity, patterns: &Patterns) -> Option<Message> {
    let build = |tool_name: Option<String>, tool_id, kind_id, text: &str| Message {
        line_number,
        severity,
        tool_name,
        tool_id,
        kind_id,
        text: text.to_string(),
        rtl: None,
    };
    let id = |caps: &Captures<'_>, index: usize| caps[index].parse::<u32>().ok();

    if let Some(caps) = patterns.regular.captures(text) {
        return Some(build(
            Some(caps[1].to_string()),
            Some(id(&caps, 2)?),
            Some(id(&caps, 3)?),
            &caps[4],
        ));
    }
    if let Some(caps) = patterns.bracketed.as_ref().and_then(|p| p.captures(text)) {
        return Some(build(Some(caps[1].to_string()), None, Some(id(&caps, 2)?), &caps[3]));
    }
    let caps = patterns.bare.as_ref()?.captures(text)?;
    Some(build(None, None, None, &caps[1]))
}

/// Decodes `INFO: [Tool 1-2] text`, `INFO: [Tool-2] text` or `INFO: text`.
pub fn decode_info(line_number: usize, text: &str) -> Option<Message> {
    decode(line_number, text, Severity::Info, &INFO_PATTERNS)
}

/// Decodes `WARNING: [Tool 1-2] text`, `WARNING: [Tool-2] text` or `WARNING: text`.
pub fn decode_warning(line_number: usize, text: &str) -> Option<Message> {
    decode(line_number, text, Severity::Warning, &WARNING_PATTERNS)
}

/// Decodes `CRITICAL WARNING: [Tool 1-2] text`; there is no loose form.
pub fn decode_critical_warning(line_number: usize, text: &str) -> Option<Message> {
    decode(line_number, text, Severity::CriticalWarning, &CRITICAL_WARNING_PATTERNS)
}

/// Decodes `ERROR: [Tool 1-2] text`; there is no loose form.
pub fn decode_error(line_number: usize, text: &str) -> Option<Message> {
    decode(line_number, text, Severity::Error, &ERROR_PATTERNS)
}
