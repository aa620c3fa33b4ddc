use std::fmt;

use serde::Serialize;

use crate::aggregate::MessageAggregator;
use crate::error::{NotPresent, ParseError};
use crate::line::LineKind;
use crate::scope::{
    Cursor, Feed, Scope, ScopeCore, ScopeState, Span, active_mut, forward, interrupt_active,
    is_structural,
};
use crate::task::is_task_start;
use crate::timing::{TIME_MARKER, Timing};
use crate::version::{Catalog, ToolVersion, VersionRange};

/// Nesting level of a phase; `Phase 2.5.1` is a [`PhaseDepth::SubSubPhase`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum PhaseDepth {
    Phase,
    SubPhase,
    SubSubPhase,
    SubSubSubPhase,
}

impl PhaseDepth {
    /// Number of components in the index of a phase at this depth.
    pub fn components(self) -> usize {
        match self {
            PhaseDepth::Phase => 1,
            PhaseDepth::SubPhase => 2,
            PhaseDepth::SubSubPhase => 3,
            PhaseDepth::SubSubSubPhase => 4,
        }
    }

    pub fn axis(self) -> LineKind {
        match self {
            PhaseDepth::Phase => LineKind::PHASE,
            PhaseDepth::SubPhase => LineKind::SUB_PHASE,
            PhaseDepth::SubSubPhase => LineKind::SUB_SUB_PHASE,
            PhaseDepth::SubSubSubPhase => LineKind::SUB_SUB_SUB_PHASE,
        }
    }

    pub fn child(self) -> Option<Self> {
        match self {
            PhaseDepth::Phase => Some(PhaseDepth::SubPhase),
            PhaseDepth::SubPhase => Some(PhaseDepth::SubSubPhase),
            PhaseDepth::SubSubPhase => Some(PhaseDepth::SubSubSubPhase),
            PhaseDepth::SubSubSubPhase => None,
        }
    }

    pub(crate) fn construct(self) -> &'static str {
        match self {
            PhaseDepth::Phase => "phase",
            PhaseDepth::SubPhase => "sub-phase",
            PhaseDepth::SubSubPhase => "sub-sub-phase",
            PhaseDepth::SubSubSubPhase => "sub-sub-sub-phase",
        }
    }
}

/// How a phase body ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseEnd {
    /// `Phase <index> <name> | Checksum: ...`, followed by the optional time
    /// and final lines.
    Checksum,
    /// No end line; the time line closes the phase.
    Time,
}

/// Static description of one phase.
#[derive(Debug)]
pub struct PhaseSpec {
    pub name: &'static str,
    pub depth: PhaseDepth,
    pub end: PhaseEnd,
    pub time: Option<&'static str>,
    pub last: Option<&'static str>,
    pub children: Catalog<PhaseSpec>,
}

impl PhaseSpec {
    pub const fn new(depth: PhaseDepth, name: &'static str) -> Self {
        Self {
            name,
            depth,
            end: PhaseEnd::Checksum,
            time: Some(TIME_MARKER),
            last: None,
            children: Catalog::EMPTY,
        }
    }

    pub const fn phase(name: &'static str) -> Self {
        Self::new(PhaseDepth::Phase, name)
    }

    pub const fn sub(name: &'static str) -> Self {
        Self::new(PhaseDepth::SubPhase, name)
    }

    pub const fn sub_sub(name: &'static str) -> Self {
        Self::new(PhaseDepth::SubSubPhase, name)
    }

    pub const fn sub_sub_sub(name: &'static str) -> Self {
        Self::new(PhaseDepth::SubSubSubPhase, name)
    }

    pub const fn ends_at_time(self) -> Self {
        Self {
            end: PhaseEnd::Time,
            ..self
        }
    }

    pub const fn with_final(self, marker: &'static str) -> Self {
        Self {
            last: Some(marker),
            ..self
        }
    }

    pub const fn with_children(self, children: &'static [PhaseSpec]) -> Self {
        Self {
            children: Catalog::Fixed(children),
            ..self
        }
    }

    pub const fn with_versioned_children(
        self,
        children: &'static [(VersionRange, &'static [PhaseSpec])],
    ) -> Self {
        Self {
            children: Catalog::Versioned(children),
            ..self
        }
    }
}

/// Dotted phase index such as `3.2`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhaseIndex(Vec<u32>);

impl PhaseIndex {
    pub fn components(&self) -> &[u32] {
        &self.0
    }

    pub fn depth(&self) -> usize {
        self.0.len()
    }
}

impl fmt::Display for PhaseIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (position, component) in self.0.iter().enumerate() {
            if position > 0 {
                f.write_str(".")?;
            }
            write!(f, "{component}")?;
        }
        Ok(())
    }
}

/// Splits `Phase 3.2 Some Title` into its index and title.
pub(crate) fn heading(text: &str) -> Option<(PhaseIndex, &str)> {
    let rest = text.strip_prefix("Phase ")?;
    let (index, title) = rest.split_once(' ')?;
    let components = index
        .split('.')
        .map(|component| component.parse().ok())
        .collect::<Option<Vec<u32>>>()?;
    Some((PhaseIndex(components), title))
}

/// `true` if `text` opens a phase that cannot nest in the phase `own`: one at
/// the same depth with another index, or one further up.
pub(crate) fn is_outer_heading(own: &PhaseIndex, text: &str) -> bool {
    if text.contains("| Checksum") {
        return false;
    }
    heading(text).is_some_and(|(index, _)| {
        index.depth() < own.depth() || (index.depth() == own.depth() && index != *own)
    })
}

/// Result of looking for a child phase start on a line.
pub(crate) enum Opening {
    None,
    Known(usize),
    Unknown,
}

/// Finds which of `phases` (all at `depth`) starts on `text`.
///
/// Only lines beginning with `prefix` are considered, which ties sub-phases
/// to the index of their parent. A heading of the right depth that matches no
/// idle phase is reported as [`Opening::Unknown`].
pub(crate) fn opening(phases: &[Phase], depth: PhaseDepth, prefix: &str, text: &str) -> Opening {
    if phases.is_empty() || !text.starts_with(prefix) || text.contains("| Checksum") {
        return Opening::None;
    }
    let Some((index, title)) = heading(text) else {
        return Opening::None;
    };
    if index.depth() != depth.components() {
        return Opening::None;
    }
    let title = title.trim_end();
    let idle = || phases.iter().enumerate().filter(|(_, phase)| phase.core.is_fresh());
    idle()
        .find(|(_, phase)| title == phase.spec.name)
        .or_else(|| idle().find(|(_, phase)| title.starts_with(phase.spec.name)))
        .map_or(Opening::Unknown, |(position, _)| Opening::Known(position))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Body,
    AwaitTime,
    AwaitFinal,
    Done,
}

/// A phase at any depth, driven by its [`PhaseSpec`].
#[derive(Debug)]
pub struct Phase {
    spec: &'static PhaseSpec,
    index: Option<PhaseIndex>,
    core: ScopeCore,
    stage: Stage,
    children: Vec<Phase>,
    active: Option<usize>,
    finish_marker: String,
    child_prefix: String,
}

impl Phase {
    pub(crate) fn new(spec: &'static PhaseSpec, version: Option<ToolVersion>) -> Self {
        let children = spec
            .children
            .resolve(version)
            .iter()
            .map(|child| Phase::new(child, version))
            .collect();
        Self {
            spec,
            index: None,
            core: ScopeCore::default(),
            stage: Stage::Body,
            children,
            active: None,
            finish_marker: String::new(),
            child_prefix: String::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.spec.name
    }

    pub fn depth(&self) -> PhaseDepth {
        self.spec.depth
    }

    /// Index printed by the tool; known once the phase started.
    pub fn index(&self) -> Option<&PhaseIndex> {
        self.index.as_ref()
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

    /// `true` if the phase was closed without its end marker.
    pub fn is_interrupted(&self) -> bool {
        self.core.interrupted
    }

    /// Every declared child, started or not, in catalog order.
    pub fn children(&self) -> &[Phase] {
        &self.children
    }

    /// The first child named `name` that appeared in the log.
    pub fn child(&self, name: &str) -> Result<&Phase, NotPresent> {
        self.children
            .iter()
            .find(|child| child.name() == name && !child.core.is_fresh())
            .ok_or_else(|| {
                let construct = self.spec.depth.child().map_or("phase", PhaseDepth::construct);
                NotPresent::new(format!("{construct} {name:?}"))
            })
    }

    pub(crate) fn start(&mut self, cx: &mut Cursor<'_>) -> Result<(), ParseError> {
        let components = self.spec.depth.components();
        let index = heading(cx.text())
            .filter(|(index, title)| {
                index.depth() == components && title.trim_end().starts_with(self.spec.name)
            })
            .map(|(index, _)| index);
        let Some(index) = index else {
            return Err(cx.violation(format!("start of {} {:?}", self.spec.depth.construct(), self.spec.name)));
        };

        self.finish_marker = format!("Phase {index} {} | Checksum:", self.spec.name);
        self.child_prefix = format!("Phase {index}.");
        self.index = Some(index);
        cx.classify(self.spec.depth.axis() | LineKind::START);
        self.core.begin(cx.number());
        self.stage = Stage::Body;
        log::debug!("line {}: {} started", cx.number(), self.label());
        Ok(())
    }

    fn axis(&self) -> LineKind {
        self.spec.depth.axis()
    }

    fn done(&mut self) {
        self.stage = Stage::Done;
        self.core.finish();
        log::debug!("{} finished", self.label());
    }

    fn after_finish(&mut self) {
        if self.spec.time.is_some() {
            self.stage = Stage::AwaitTime;
        } else {
            self.after_time();
        }
    }

    fn after_time(&mut self) {
        if self.spec.last.is_some() {
            self.stage = Stage::AwaitFinal;
        } else {
            self.done();
        }
    }

    fn body(&mut self, cx: &mut Cursor<'_>) -> Result<Feed, ParseError> {
        let finishing = self.spec.end == PhaseEnd::Checksum && cx.starts_with(&self.finish_marker);
        if finishing {
            interrupt_active(&mut self.children, &mut self.active, cx);
        } else if forward(&mut self.children, &mut self.active, cx)? {
            return Ok(Feed::Consumed);
        }

        if cx.is_passthrough() {
            return Ok(Feed::Consumed);
        }
        if finishing {
            cx.classify(self.axis() | LineKind::END);
            self.core.record_timing(cx.text());
            self.after_finish();
            return Ok(Feed::Consumed);
        }
        if self.spec.end == PhaseEnd::Time && cx.starts_with(self.spec.time.unwrap_or(TIME_MARKER)) {
            cx.classify(self.axis() | LineKind::TIME);
            self.core.record_timing(cx.text());
            self.after_time();
            return Ok(Feed::Consumed);
        }
        let outer = self.index.as_ref().is_some_and(|own| is_outer_heading(own, cx.text()));
        if outer || is_task_start(cx.text()) {
            self.unwind(cx);
            self.active = None;
            self.stage = Stage::Done;
            return Ok(Feed::Returned);
        }
        if self.core.degraded {
            cx.classify(LineKind::UNPROCESSED);
            return Ok(Feed::Consumed);
        }

        if let Some(depth) = self.spec.depth.child() {
            match opening(&self.children, depth, &self.child_prefix, cx.text()) {
                Opening::Known(position) => {
                    self.children[position].start(cx)?;
                    self.active = Some(position);
                    return Ok(Feed::Consumed);
                }
                Opening::Unknown => {
                    cx.unknown(&self.label(), depth.construct())?;
                    self.core.degraded = true;
                    return Ok(Feed::Consumed);
                }
                Opening::None => {}
            }
        }

        cx.classify(LineKind::VERBOSE);
        Ok(Feed::Consumed)
    }

    fn tail(&mut self, cx: &mut Cursor<'_>, marker: &str, role: LineKind) -> Feed {
        if cx.starts_with(marker) {
            cx.classify(self.axis() | role);
            if role == LineKind::TIME {
                self.core.record_timing(cx.text());
                self.after_time();
            } else {
                self.done();
            }
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

impl Scope for Phase {
    fn core(&self) -> &ScopeCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ScopeCore {
        &mut self.core
    }

    fn label(&self) -> String {
        match &self.index {
            Some(index) => format!("Phase {index} {}", self.spec.name),
            None => format!("Phase {}", self.spec.name),
        }
    }

    fn step(&mut self, cx: &mut Cursor<'_>) -> Result<Feed, ParseError> {
        match self.stage {
            Stage::Body => self.body(cx),
            Stage::AwaitTime => Ok(self.tail(cx, self.spec.time.unwrap_or(TIME_MARKER), LineKind::TIME)),
            Stage::AwaitFinal => Ok(self.tail(cx, self.spec.last.unwrap_or_default(), LineKind::FOOTER)),
            Stage::Done => Ok(Feed::Returned),
        }
    }

    fn active_child(&mut self) -> Option<&mut dyn Scope> {
        active_mut(&mut self.children, self.active)
    }

    fn is_closing(&self) -> bool {
        self.stage != Stage::Body
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heading_parses_index() {
        let (index, title) = heading("Phase 3.2 Setup Constraints And Sort Netlist").unwrap();
        assert_eq!(index.components(), &[3, 2]);
        assert_eq!(index.to_string(), "3.2");
        assert_eq!(title, "Setup Constraints And Sort Netlist");

        assert!(heading("Phase x Retarget").is_none());
        assert!(heading("Phase 1.").is_none());
        assert!(heading("Starting Placer Task").is_none());
    }

    #[test]
    fn test_depth_navigation() {
        assert_eq!(PhaseDepth::Phase.child(), Some(PhaseDepth::SubPhase));
        assert_eq!(PhaseDepth::SubSubSubPhase.child(), None);
        assert_eq!(PhaseDepth::SubSubPhase.components(), 3);
        assert_eq!(PhaseDepth::SubPhase.axis(), LineKind::SUB_PHASE);
    }

    #[test]
    fn test_outer_headings() {
        let (own, _) = heading("Phase 2.1 Floorplanning").unwrap();
        assert!(is_outer_heading(&own, "Phase 2.4 Global Place Phase1"));
        assert!(is_outer_heading(&own, "Phase 3 Detail Placement"));
        assert!(!is_outer_heading(&own, "Phase 2.1 Floorplanning"));
        assert!(!is_outer_heading(&own, "Phase 2.1.1 Something Nested"));
        assert!(!is_outer_heading(&own, "Phase 2 Global Placement | Checksum: 9a8b7c6d"));
        assert!(!is_outer_heading(&own, "Starting Placer Task"));
    }

    const SUBS: &[PhaseSpec] = &[
        PhaseSpec::sub("Update Timing"),
        PhaseSpec::sub("Update Timing for Bus Skew"),
    ];
    const PARENT: PhaseSpec = PhaseSpec::phase("Router Initialization").with_children(SUBS);

    #[test]
    fn test_opening_prefers_exact_titles() {
        static SPEC: PhaseSpec = PARENT;
        let phase = Phase::new(&SPEC, None);
        let children = phase.children();

        match opening(children, PhaseDepth::SubPhase, "Phase 2.", "Phase 2.5 Update Timing for Bus Skew") {
            Opening::Known(position) => assert_eq!(children[position].name(), "Update Timing for Bus Skew"),
            _ => panic!("Expected a known sub-phase"),
        }
        assert!(matches!(
            opening(children, PhaseDepth::SubPhase, "Phase 2.", "Phase 3.1 Update Timing"),
            Opening::None
        ));
        assert!(matches!(
            opening(children, PhaseDepth::SubPhase, "Phase 2.", "Phase 2.1 Update Timing | Checksum: 1"),
            Opening::None
        ));
        assert!(matches!(
            opening(children, PhaseDepth::SubPhase, "Phase 2.", "Phase 2.9 Something New"),
            Opening::Unknown
        ));
    }
}
