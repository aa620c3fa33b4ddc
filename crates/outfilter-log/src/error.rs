use thiserror::Error;

/// Fatal classification failure.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseError {
    /// A scope was started on a line that does not carry its start marker.
    #[error("line {line}: expected {expected}, found {found:?}")]
    ContractViolation {
        line: usize,
        expected: String,
        found: String,
    },
    /// Raised instead of a diagnostic when strict parsing is enabled.
    #[error("line {line}: unknown {construct} in {scope}: {text:?}")]
    UnknownConstruct {
        line: usize,
        construct: &'static str,
        scope: String,
        text: String,
    },
}

impl ParseError {
    pub fn line(&self) -> usize {
        match self {
            ParseError::ContractViolation { line, .. } | ParseError::UnknownConstruct { line, .. } => *line,
        }
    }
}

/// A construct was looked up that never appeared in the log.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{what} is not present in this log")]
pub struct NotPresent {
    what: String,
}

impl NotPresent {
    pub(crate) fn new(what: impl Into<String>) -> Self {
        Self { what: what.into() }
    }

    pub fn what(&self) -> &str {
        &self.what
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum VersionError {
    #[error("malformed tool version {0:?}")]
    Malformed(String),
}
