//! `phys_opt_design` tasks.

use crate::phase::PhaseSpec;
use crate::task::TaskSpec;

const PHYSICAL_SYNTHESIS: &[PhaseSpec] = &[
    PhaseSpec::phase("Physical Synthesis Initialization"),
    PhaseSpec::phase("DSP Register Optimization"),
    PhaseSpec::phase("Critical Path Optimization"),
    PhaseSpec::phase("Critical Path Optimization"),
];

pub const TASKS: &[TaskSpec] = &[
    TaskSpec::timed("Initial Update Timing Task", "Starting Initial Update Timing Task"),
    TaskSpec::new(
        "Physical Synthesis Task",
        "Starting Physical Synthesis Task",
        "Ending Physical Synthesis Task",
    )
    .with_phases(PHYSICAL_SYNTHESIS),
];
