use crate::aggregate::MessageAggregator;
use crate::error::{NotPresent, ParseError};
use crate::line::LineKind;
use crate::phase::{Opening, Phase, PhaseDepth, PhaseSpec, opening};
use crate::scope::{
    Cursor, Feed, Scope, ScopeCore, ScopeState, Span, active_mut, forward, interrupt_active,
    is_structural,
};
use crate::timing::{TIME_MARKER, Timing};
use crate::version::{Catalog, ToolVersion, VersionRange};

/// How a task body ends.
#[derive(Debug)]
pub enum TaskEnd {
    /// `Ending <name> Task | Checksum: ...`, then the time line.
    Ending(&'static str),
    /// The time line closes the task directly.
    Time,
}

#[derive(Debug)]
pub enum TaskChildren {
    None,
    Phases(Catalog<PhaseSpec>),
    SubTasks(&'static [TaskSpec]),
}

/// Static description of one task.
#[derive(Debug)]
pub struct TaskSpec {
    pub name: &'static str,
    pub start: &'static str,
    pub end: TaskEnd,
    pub time: Option<&'static str>,
    pub children: TaskChildren,
}

impl TaskSpec {
    /// A task delimited by `start` and `finish` lines.
    pub const fn new(name: &'static str, start: &'static str, finish: &'static str) -> Self {
        Self {
            name,
            start,
            end: TaskEnd::Ending(finish),
            time: Some(TIME_MARKER),
            children: TaskChildren::None,
        }
    }

    /// A task without an end line; its time line closes it.
    pub const fn timed(name: &'static str, start: &'static str) -> Self {
        Self {
            name,
            start,
            end: TaskEnd::Time,
            time: Some(TIME_MARKER),
            children: TaskChildren::None,
        }
    }

    pub const fn with_phases(self, phases: &'static [PhaseSpec]) -> Self {
        Self {
            children: TaskChildren::Phases(Catalog::Fixed(phases)),
            ..self
        }
    }

    pub const fn with_versioned_phases(
        self,
        phases: &'static [(VersionRange, &'static [PhaseSpec])],
    ) -> Self {
        Self {
            children: TaskChildren::Phases(Catalog::Versioned(phases)),
            ..self
        }
    }

    pub const fn with_subtasks(self, tasks: &'static [TaskSpec]) -> Self {
        Self {
            children: TaskChildren::SubTasks(tasks),
            ..self
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Body,
    AwaitTime,
    Done,
}

/// A task, with phases or nested tasks as its catalog declares.
#[derive(Debug)]
pub struct Task {
    spec: &'static TaskSpec,
    core: ScopeCore,
    stage: Stage,
    phases: Vec<Phase>,
    subtasks: Vec<Task>,
    active_phase: Option<usize>,
    active_task: Option<usize>,
}

/// Position of the first idle task starting on `text`.
pub(crate) fn find_task(tasks: &[Task], text: &str) -> Option<usize> {
    tasks
        .iter()
        .position(|task| task.core.is_fresh() && text.starts_with(task.spec.start))
}

/// `Starting <name> Task`, whether or not any catalog knows the task.
pub(crate) fn is_task_start(text: &str) -> bool {
    text.starts_with("Starting ") && text.trim_end().ends_with(" Task")
}

impl Task {
    pub(crate) fn new(spec: &'static TaskSpec, version: Option<ToolVersion>) -> Self {
        let (phases, subtasks) = match &spec.children {
            TaskChildren::None => (Vec::new(), Vec::new()),
            TaskChildren::Phases(catalog) => (
                catalog
                    .resolve(version)
                    .iter()
                    .map(|phase| Phase::new(phase, version))
                    .collect(),
                Vec::new(),
            ),
            TaskChildren::SubTasks(tasks) => (
                Vec::new(),
                tasks.iter().map(|task| Task::new(task, version)).collect(),
            ),
        };
        Self {
            spec,
            core: ScopeCore::default(),
            stage: Stage::Body,
            phases,
            subtasks,
            active_phase: None,
            active_task: None,
        }
    }

    pub fn name(&self) -> &'static str {
        self.spec.name
    }

    pub fn state(&self) -> ScopeState {
        self.core.state
    }

    pub fn span(&self) -> Option<Span> {
        self.core.span
    }

    pub fn timing(&self) -> Option<Timing> {
        self.core.timing
    }

    pub fn messages(&self) -> &MessageAggregator {
        &self.core.messages
    }

    pub fn is_interrupted(&self) -> bool {
        self.core.interrupted
    }

    pub fn phases(&self) -> &[Phase] {
        &self.phases
    }

    pub fn subtasks(&self) -> &[Task] {
        &self.subtasks
    }

    /// The first phase named `name` that appeared in the log.
    pub fn phase(&self, name: &str) -> Result<&Phase, NotPresent> {
        self.phases
            .iter()
            .find(|phase| phase.name() == name && phase.state() != ScopeState::NotStarted)
            .ok_or_else(|| NotPresent::new(format!("phase {name:?} of {}", self.spec.name)))
    }

    pub fn subtask(&self, name: &str) -> Result<&Task, NotPresent> {
        self.subtasks
            .iter()
            .find(|task| task.name() == name && task.state() != ScopeState::NotStarted)
            .ok_or_else(|| NotPresent::new(format!("task {name:?} of {}", self.spec.name)))
    }

    pub(crate) fn start(&mut self, cx: &mut Cursor<'_>) -> Result<(), ParseError> {
        if !cx.starts_with(self.spec.start) {
            return Err(cx.violation(format!("{:?}", self.spec.start)));
        }
        cx.classify(LineKind::TASK_START);
        self.core.begin(cx.number());
        self.stage = Stage::Body;
        log::debug!("line {}: {} started", cx.number(), self.spec.name);
        Ok(())
    }

    fn done(&mut self) {
        self.stage = Stage::Done;
        self.core.finish();
        log::debug!("{} finished", self.spec.name);
    }

    fn body(&mut self, cx: &mut Cursor<'_>) -> Result<Feed, ParseError> {
        let ending = matches!(self.spec.end, TaskEnd::Ending(marker) if cx.starts_with(marker));
        if ending {
            interrupt_active(&mut self.phases, &mut self.active_phase, cx);
            interrupt_active(&mut self.subtasks, &mut self.active_task, cx);
        } else if forward(&mut self.phases, &mut self.active_phase, cx)?
            || forward(&mut self.subtasks, &mut self.active_task, cx)?
        {
            return Ok(Feed::Consumed);
        }

        if cx.is_passthrough() {
            return Ok(Feed::Consumed);
        }
        if ending {
            cx.classify(LineKind::TASK_END);
            self.core.record_timing(cx.text());
            if self.spec.time.is_some() {
                self.stage = Stage::AwaitTime;
            } else {
                self.done();
            }
            return Ok(Feed::Consumed);
        }
        if matches!(self.spec.end, TaskEnd::Time) && cx.starts_with(self.spec.time.unwrap_or(TIME_MARKER)) {
            cx.classify(LineKind::TASK_TIME);
            self.core.record_timing(cx.text());
            self.done();
            return Ok(Feed::Consumed);
        }
        // Another task starting means this one missed its end.
        if is_task_start(cx.text()) && find_task(&self.subtasks, cx.text()).is_none() {
            self.unwind(cx);
            self.active_phase = None;
            self.active_task = None;
            self.stage = Stage::Done;
            return Ok(Feed::Returned);
        }
        if self.core.degraded {
            cx.classify(LineKind::UNPROCESSED);
            return Ok(Feed::Consumed);
        }

        match &self.spec.children {
            TaskChildren::Phases(_) => match opening(&self.phases, PhaseDepth::Phase, "Phase ", cx.text()) {
                Opening::Known(position) => {
                    self.phases[position].start(cx)?;
                    self.active_phase = Some(position);
                    return Ok(Feed::Consumed);
                }
                Opening::Unknown => {
                    cx.unknown(self.spec.name, "phase")?;
                    self.core.degraded = true;
                    return Ok(Feed::Consumed);
                }
                Opening::None => {}
            },
            TaskChildren::SubTasks(_) if cx.starts_with("Starting ") => {
                match find_task(&self.subtasks, cx.text()) {
                    Some(position) => {
                        self.subtasks[position].start(cx)?;
                        self.active_task = Some(position);
                    }
                    None => {
                        cx.unknown(self.spec.name, "task")?;
                        self.core.degraded = true;
                    }
                }
                return Ok(Feed::Consumed);
            }
            _ => {}
        }

        cx.classify(LineKind::VERBOSE);
        Ok(Feed::Consumed)
    }

    fn await_time(&mut self, cx: &mut Cursor<'_>) -> Feed {
        if cx.starts_with(self.spec.time.unwrap_or(TIME_MARKER)) {
            cx.classify(LineKind::TASK_TIME);
            self.core.record_timing(cx.text());
            self.done();
            Feed::Consumed
        } else if cx.is_passthrough() {
            Feed::Consumed
        } else if is_structural(cx) {
            self.done();
            Feed::Returned
        } else {
            cx.classify(LineKind::VERBOSE);
            Feed::Consumed
        }
    }
}

impl Scope for Task {
    fn core(&self) -> &ScopeCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ScopeCore {
        &mut self.core
    }

    fn label(&self) -> String {
        self.spec.name.to_string()
    }

    fn step(&mut self, cx: &mut Cursor<'_>) -> Result<Feed, ParseError> {
        match self.stage {
            Stage::Body => self.body(cx),
            Stage::AwaitTime => Ok(self.await_time(cx)),
            Stage::Done => Ok(Feed::Returned),
        }
    }

    fn active_child(&mut self) -> Option<&mut dyn Scope> {
        match (self.active_phase, self.active_task) {
            (Some(_), _) => active_mut(&mut self.phases, self.active_phase),
            (None, Some(_)) => active_mut(&mut self.subtasks, self.active_task),
            (None, None) => None,
        }
    }

    fn is_closing(&self) -> bool {
        self.stage != Stage::Body
    }
}
