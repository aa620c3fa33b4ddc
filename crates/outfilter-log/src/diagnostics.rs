use std::fmt;

use serde::Serialize;

use crate::version::ToolVersion;

/// What went wrong at a recoverable point of the classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// A line looks like the start of a nested construct none of the known
    /// children match; the rest of `scope` is passed through unclassified.
    UnknownConstruct {
        scope: String,
        construct: &'static str,
    },
    /// `scope` never printed its end marker. `last_line` is the last line it
    /// consumed; the diagnostic line is the one that interrupted it, or the
    /// last line of the log.
    UnterminatedScope { scope: String, last_line: usize },
    /// A structural line expected by `scope` did not appear.
    UnexpectedLine {
        scope: String,
        expected: &'static str,
    },
    MalformedTableRow { table: &'static str },
    MismatchedXdcFile { expected: Option<String> },
    MissingPreamble,
    UnsupportedVersion { version: Option<ToolVersion> },
}

/// A recoverable problem found while classifying a log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub line: usize,
    pub text: String,
    #[serde(flatten)]
    pub kind: DiagnosticKind,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: ", self.line)?;
        match &self.kind {
            DiagnosticKind::UnknownConstruct { scope, construct } => {
                write!(f, "unknown {construct} in {scope}")?
            }
            DiagnosticKind::UnterminatedScope { scope, last_line } => {
                write!(f, "{scope} did not end (last line {last_line})")?
            }
            DiagnosticKind::UnexpectedLine { scope, expected } => {
                write!(f, "{scope} expected {expected}")?
            }
            DiagnosticKind::MalformedTableRow { table } => write!(f, "malformed {table} row")?,
            DiagnosticKind::MismatchedXdcFile { expected: Some(path) } => {
                write!(f, "XDC file does not match open file {path}")?
            }
            DiagnosticKind::MismatchedXdcFile { expected: None } => {
                write!(f, "XDC file finished without being opened")?
            }
            DiagnosticKind::MissingPreamble => f.write_str("log does not start with a banner")?,
            DiagnosticKind::UnsupportedVersion { version: Some(version) } => {
                write!(f, "tool version {version} is outside the known catalogs")?
            }
            DiagnosticKind::UnsupportedVersion { version: None } => {
                f.write_str("tool version unknown, using the newest catalogs")?
            }
        }
        write!(f, ": {:?}", self.text)
    }
}

/// Diagnostics collected during one classification run.
#[derive(Debug, Clone, Default)]
pub(crate) struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub(crate) fn push(&mut self, diagnostic: Diagnostic) {
        log::warn!("{diagnostic}");
        self.items.push(diagnostic);
    }

    pub(crate) fn as_slice(&self) -> &[Diagnostic] {
        &self.items
    }

    pub(crate) fn clear(&mut self) {
        self.items.clear();
    }
}
