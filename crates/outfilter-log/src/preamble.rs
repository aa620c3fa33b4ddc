use chrono::NaiveDateTime;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::diagnostics::DiagnosticKind;
use crate::line::LineKind;
use crate::scope::{Cursor, Feed, Span};
use crate::version::ToolVersion;

const BANNER_DELIMITER: &str = "#----";
const SESSION_TIME_FORMAT: &str = "%a %b %d %H:%M:%S %Y";

static VERSION_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^# Vivado v(\d+\.\d+(?:\.\d+)?) \(64-bit\)").unwrap());
static SESSION_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^# Start of session at: (\w+ \w+ +\d+ \d+:\d+:\d+ \d+)").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Expect,
    Body,
    Done,
}

/// The `#----` banner Vivado writes before the first command:
///
/// ```text
/// #-----------------------------------------------------------
/// # Vivado v2025.1 (64-bit)
/// # Start of session at: Tue Jun 10 09:15:02 2025
/// #-----------------------------------------------------------
/// ```
#[derive(Debug, Clone)]
pub struct Preamble {
    stage: Stage,
    span: Option<Span>,
    tool_version: Option<ToolVersion>,
    start_time: Option<NaiveDateTime>,
}

impl Default for Preamble {
    fn default() -> Self {
        Self::new()
    }
}

impl Preamble {
    pub fn new() -> Self {
        Self {
            stage: Stage::Expect,
            span: None,
            tool_version: None,
            start_time: None,
        }
    }

    pub fn span(&self) -> Option<Span> {
        self.span
    }

    pub fn tool_version(&self) -> Option<ToolVersion> {
        self.tool_version
    }

    pub fn start_time(&self) -> Option<NaiveDateTime> {
        self.start_time
    }

    pub(crate) fn is_done(&self) -> bool {
        self.stage == Stage::Done
    }

    pub(crate) fn feed(&mut self, cx: &mut Cursor<'_>) -> Feed {
        match self.stage {
            Stage::Expect => self.expect(cx),
            Stage::Body => self.body(cx),
            Stage::Done => Feed::Returned,
        }
    }

    fn expect(&mut self, cx: &mut Cursor<'_>) -> Feed {
        if cx.is_empty() {
            return Feed::Consumed;
        }
        if !cx.starts_with(BANNER_DELIMITER) {
            cx.report(DiagnosticKind::MissingPreamble);
            self.stage = Stage::Done;
            return Feed::Returned;
        }
        cx.classify(LineKind::SECTION_START | LineKind::DELIMITER);
        self.span = Some(Span {
            first: cx.number(),
            last: cx.number(),
        });
        self.stage = Stage::Body;
        Feed::Consumed
    }

    fn body(&mut self, cx: &mut Cursor<'_>) -> Feed {
        if cx.is_empty() {
            return Feed::Consumed;
        }
        if !cx.starts_with("#") {
            cx.report(DiagnosticKind::UnexpectedLine {
                scope: "preamble".to_string(),
                expected: "banner delimiter",
            });
            self.stage = Stage::Done;
            return Feed::Returned;
        }

        if let Some(span) = &mut self.span {
            span.last = cx.number();
        }
        if cx.starts_with(BANNER_DELIMITER) {
            cx.classify(LineKind::SECTION_END | LineKind::DELIMITER);
            self.stage = Stage::Done;
            log::debug!("line {}: preamble finished, tool version {:?}", cx.number(), self.tool_version);
        } else if let Some(version) = VERSION_PATTERN
            .captures(cx.text())
            .and_then(|caps| caps[1].parse().ok())
        {
            self.tool_version = Some(version);
            cx.classify(LineKind::NORMAL);
        } else if let Some(time) = SESSION_PATTERN.captures(cx.text()).and_then(|caps| parse_session_time(&caps[1])) {
            self.start_time = Some(time);
            cx.classify(LineKind::NORMAL);
        } else {
            cx.classify(LineKind::VERBOSE);
        }
        Feed::Consumed
    }
}

/// Parses `Wed Jan 17 09:26:33 2024`; a space-padded day is accepted.
fn parse_session_time(text: &str) -> Option<NaiveDateTime> {
    let normalized = text.split_whitespace().collect::<Vec<_>>().join(" ");
    NaiveDateTime::parse_from_str(&normalized, SESSION_TIME_FORMAT).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};

    #[test]
    fn test_session_time() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 17)
            .unwrap()
            .and_time(NaiveTime::from_hms_opt(9, 26, 33).unwrap());
        assert_eq!(parse_session_time("Wed Jan 17 09:26:33 2024"), Some(expected));

        let padded = NaiveDate::from_ymd_opt(2025, 6, 3)
            .unwrap()
            .and_time(NaiveTime::from_hms_opt(14, 0, 1).unwrap());
        assert_eq!(parse_session_time("Tue Jun  3 14:00:01 2025"), Some(padded));

        assert_eq!(parse_session_time("yesterday"), None);
    }

    #[test]
    fn test_version_pattern() {
        let caps = VERSION_PATTERN.captures("# Vivado v2023.2.1 (64-bit)").unwrap();
        assert_eq!(&caps[1], "2023.2.1");
        assert!(VERSION_PATTERN.captures("# Vivado v2023.2 (32-bit)").is_none());
    }
}
