use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;

use crate::message::{
    LATCH_KIND_ID, Message, RTL_ASSERTION_KIND_ID, RTL_REPORT_KIND_ID, SYNTH_TOOL_ID, Severity,
};

/// Message counts per severity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MessageCounts {
    pub info: usize,
    pub warning: usize,
    pub critical_warning: usize,
    pub error: usize,
}

impl MessageCounts {
    pub fn total(&self) -> usize {
        self.info + self.warning + self.critical_warning + self.error
    }
}

/// Collects the messages seen inside one scope.
///
/// Every scope owns one aggregator; a message is recorded by the scope that
/// consumed its line and by every enclosing scope. Lists keep document order.
#[derive(Debug, Clone, Default)]
pub struct MessageAggregator {
    info: Vec<Arc<Message>>,
    warnings: Vec<Arc<Message>>,
    critical_warnings: Vec<Arc<Message>>,
    errors: Vec<Arc<Message>>,
    by_id: BTreeMap<u32, BTreeMap<u32, Vec<Arc<Message>>>>,
    tool_names: BTreeMap<u32, String>,
    tool_ids: BTreeMap<String, u32>,
}

impl MessageAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, message: Arc<Message>) {
        if let (Some(tool_id), Some(kind_id)) = (message.tool_id(), message.kind_id()) {
            if !self.tool_names.contains_key(&tool_id) {
                if let Some(name) = message.tool_name() {
                    self.tool_names.insert(tool_id, name.to_string());
                    self.tool_ids.insert(name.to_string(), tool_id);
                }
            }
            self.by_id
                .entry(tool_id)
                .or_default()
                .entry(kind_id)
                .or_default()
                .push(Arc::clone(&message));
        }

        match message.severity() {
            Severity::Info => self.info.push(message),
            Severity::Warning => self.warnings.push(message),
            Severity::CriticalWarning => self.critical_warnings.push(message),
            Severity::Error => self.errors.push(message),
        }
    }

    pub fn info(&self) -> &[Arc<Message>] {
        &self.info
    }

    pub fn warnings(&self) -> &[Arc<Message>] {
        &self.warnings
    }

    pub fn critical_warnings(&self) -> &[Arc<Message>] {
        &self.critical_warnings
    }

    pub fn errors(&self) -> &[Arc<Message>] {
        &self.errors
    }

    pub fn of_severity(&self, severity: Severity) -> &[Arc<Message>] {
        match severity {
            Severity::Info => &self.info,
            Severity::Warning => &self.warnings,
            Severity::CriticalWarning => &self.critical_warnings,
            Severity::Error => &self.errors,
        }
    }

    pub fn counts(&self) -> MessageCounts {
        MessageCounts {
            info: self.info.len(),
            warning: self.warnings.len(),
            critical_warning: self.critical_warnings.len(),
            error: self.errors.len(),
        }
    }

    pub fn total(&self) -> usize {
        self.counts().total()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Messages with the given `[Tool toolID-kindID]`; empty if none were seen.
    pub fn by_id(&self, tool_id: u32, kind_id: u32) -> &[Arc<Message>] {
        self.by_id
            .get(&tool_id)
            .and_then(|kinds| kinds.get(&kind_id))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn contains(&self, tool_id: u32, kind_id: u32) -> bool {
        !self.by_id(tool_id, kind_id).is_empty()
    }

    /// Every indexed `(tool ID, kind ID, messages)` triple in ascending ID order.
    pub fn indexed(&self) -> impl Iterator<Item = (u32, u32, &[Arc<Message>])> + '_ {
        self.by_id.iter().flat_map(|(tool_id, kinds)| {
            kinds
                .iter()
                .map(move |(kind_id, messages)| (*tool_id, *kind_id, messages.as_slice()))
        })
    }

    pub fn tool_name(&self, tool_id: u32) -> Option<&str> {
        self.tool_names.get(&tool_id).map(String::as_str)
    }

    pub fn tool_id(&self, tool_name: &str) -> Option<u32> {
        self.tool_ids.get(tool_name).copied()
    }

    pub fn vhdl_report_messages(&self) -> &[Arc<Message>] {
        self.by_id(SYNTH_TOOL_ID, RTL_REPORT_KIND_ID)
    }

    pub fn vhdl_assert_messages(&self) -> &[Arc<Message>] {
        self.by_id(SYNTH_TOOL_ID, RTL_ASSERTION_KIND_ID)
    }

    pub fn latch_messages(&self) -> &[Arc<Message>] {
        self.by_id(SYNTH_TOOL_ID, LATCH_KIND_ID)
    }
}
