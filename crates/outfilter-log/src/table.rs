use std::collections::BTreeMap;

use serde::Serialize;

use crate::diagnostics::DiagnosticKind;
use crate::line::LineKind;
use crate::scope::Cursor;

/// Tables of the synthesis report that are extracted into facts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TableKind {
    BlackBoxes,
    CellUsage,
}

impl TableKind {
    fn label(self) -> &'static str {
        match self {
            TableKind::BlackBoxes => "black box",
            TableKind::CellUsage => "cell usage",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    TopFrame,
    Header,
    HeaderFrame,
    Rows,
    Done,
}

/// Reads one ASCII table:
///
/// ```text
/// +------+-------+------+
/// |      |Cell   |Count |
/// +------+-------+------+
/// |1     |LD     |     4|
/// +------+-------+------+
/// ```
#[derive(Debug)]
pub(crate) struct TableScanner {
    kind: TableKind,
    stage: Stage,
}

impl TableScanner {
    pub(crate) fn new(kind: TableKind) -> Self {
        Self {
            kind,
            stage: Stage::TopFrame,
        }
    }

    pub(crate) fn kind(&self) -> TableKind {
        self.kind
    }

    pub(crate) fn is_done(&self) -> bool {
        self.stage == Stage::Done
    }

    /// Classifies the current line as part of the table.
    ///
    /// Returns `false` (and ends the scan) when the line does not belong to
    /// the table; the caller classifies it instead.
    pub(crate) fn feed(&mut self, cx: &mut Cursor<'_>, rows: &mut BTreeMap<String, u32>) -> bool {
        let frame = cx.starts_with("+-");
        let row = cx.starts_with("|");
        match self.stage {
            Stage::TopFrame if cx.is_empty() => {}
            Stage::TopFrame if frame => {
                cx.classify(LineKind::TABLE_FRAME);
                self.stage = Stage::Header;
            }
            Stage::Header if row => {
                cx.classify(LineKind::TABLE_HEADER);
                self.stage = Stage::HeaderFrame;
            }
            Stage::HeaderFrame if frame => {
                cx.classify(LineKind::TABLE_FRAME);
                self.stage = Stage::Rows;
            }
            Stage::Rows if row => {
                cx.classify(LineKind::TABLE_ROW);
                match parse_row(cx.text()) {
                    Some((name, count)) => {
                        rows.insert(name, count);
                    }
                    None => {
                        cx.flag(LineKind::PROCESSOR_ERROR);
                        cx.report(DiagnosticKind::MalformedTableRow {
                            table: self.kind.label(),
                        });
                    }
                }
            }
            Stage::Rows if frame => {
                cx.classify(LineKind::TABLE_FOOTER);
                self.stage = Stage::Done;
            }
            _ => {
                self.stage = Stage::Done;
                return false;
            }
        }
        true
    }
}

/// Reads `(name, count)` from the last two pipe-delimited columns of a row.
///
/// Vivado prints an index column first (`|1 |LD | 4|`); short tables may
/// omit it (`| LD | 4 |`).
pub(crate) fn parse_row(text: &str) -> Option<(String, u32)> {
    let columns: Vec<&str> = text.trim().trim_matches('|').split('|').map(str::trim).collect();
    let [.., name, count] = columns.as_slice() else {
        return None;
    };
    if name.is_empty() {
        return None;
    }
    Some((name.to_string(), count.parse().ok()?))
}
