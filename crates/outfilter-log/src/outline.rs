//! Tree view of the scopes a command went through.

use std::fmt;

use serde::Serialize;

use crate::command::Command;
use crate::phase::{Phase, PhaseDepth};
use crate::scope::{ScopeState, Span};
use crate::section::{Section, SectionLevel};
use crate::task::Task;
use crate::timing::Timing;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutlineLevel {
    Command,
    Section,
    SubSection,
    Task,
    Phase(PhaseDepth),
}

/// One started scope. Children that never appeared in the log are left out.
#[derive(Debug, Clone, Serialize)]
pub struct OutlineNode {
    pub name: String,
    pub level: OutlineLevel,
    pub state: ScopeState,
    pub span: Option<Span>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timing: Option<Timing>,
    pub message_count: usize,
    pub interrupted: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<OutlineNode>,
}

impl OutlineNode {
    /// This node and all descendants, depth first.
    pub fn walk(&self) -> Vec<&OutlineNode> {
        let mut nodes = vec![self];
        for child in &self.children {
            nodes.extend(child.walk());
        }
        nodes
    }

    fn write_indented(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        write!(f, "{:indent$}{}", "", self.name, indent = depth * 2)?;
        if let Some(span) = self.span {
            write!(f, " [{}-{}]", span.first, span.last)?;
        }
        if let Some(timing) = self.timing {
            write!(f, " {:.1}s", timing.elapsed.as_secs_f64())?;
        }
        if self.message_count > 0 {
            write!(f, " ({} messages)", self.message_count)?;
        }
        if self.interrupted {
            f.write_str(" interrupted")?;
        }
        writeln!(f)?;
        for child in &self.children {
            child.write_indented(f, depth + 1)?;
        }
        Ok(())
    }
}

impl fmt::Display for OutlineNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_indented(f, 0)
    }
}

fn started(state: ScopeState) -> bool {
    state != ScopeState::NotStarted
}

fn section_node(section: &Section) -> OutlineNode {
    OutlineNode {
        name: section.name().to_string(),
        level: match section.level() {
            SectionLevel::Section => OutlineLevel::Section,
            SectionLevel::SubSection => OutlineLevel::SubSection,
        },
        state: section.state(),
        span: section.span(),
        timing: section.timing(),
        message_count: section.messages().total(),
        interrupted: section.is_interrupted(),
        children: section
            .children()
            .iter()
            .filter(|child| started(child.state()))
            .map(section_node)
            .collect(),
    }
}

fn phase_node(phase: &Phase) -> OutlineNode {
    let name = match phase.index() {
        Some(index) => format!("Phase {index} {}", phase.name()),
        None => phase.name().to_string(),
    };
    OutlineNode {
        name,
        level: OutlineLevel::Phase(phase.depth()),
        state: phase.state(),
        span: phase.span(),
        timing: phase.timing(),
        message_count: phase.messages().total(),
        interrupted: phase.is_interrupted(),
        children: phase
            .children()
            .iter()
            .filter(|child| started(child.state()))
            .map(phase_node)
            .collect(),
    }
}

fn task_node(task: &Task) -> OutlineNode {
    let phases = task
        .phases()
        .iter()
        .filter(|phase| started(phase.state()))
        .map(phase_node);
    let subtasks = task
        .subtasks()
        .iter()
        .filter(|subtask| started(subtask.state()))
        .map(task_node);
    OutlineNode {
        name: task.name().to_string(),
        level: OutlineLevel::Task,
        state: task.state(),
        span: task.span(),
        timing: task.timing(),
        message_count: task.messages().total(),
        interrupted: task.is_interrupted(),
        children: phases.chain(subtasks).collect(),
    }
}

impl Command {
    pub fn outline(&self) -> OutlineNode {
        let sections = self
            .sections()
            .iter()
            .filter(|section| started(section.state()))
            .map(section_node);
        let tasks = self
            .tasks()
            .iter()
            .filter(|task| started(task.state()))
            .map(task_node);
        OutlineNode {
            name: self.kind().name().to_string(),
            level: OutlineLevel::Command,
            state: self.state(),
            span: self.span(),
            timing: self.timing(),
            message_count: self.messages().total(),
            interrupted: self.is_interrupted(),
            children: sections.chain(tasks).collect(),
        }
    }
}
