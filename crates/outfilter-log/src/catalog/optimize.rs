//! `opt_design` tasks.

use crate::phase::PhaseSpec;
use crate::task::TaskSpec;

const INITIALIZATION: &[PhaseSpec] = &[
    PhaseSpec::sub("Core Generation And Design Setup"),
    PhaseSpec::sub("Setup Constraints And Sort Netlist"),
];

const TIMER_UPDATE_AND_TIMING_DATA_COLLECTION: &[PhaseSpec] = &[
    PhaseSpec::sub("Timer Update"),
    PhaseSpec::sub("Timing Data Collection"),
];

const FINALIZATION: &[PhaseSpec] = &[
    PhaseSpec::sub("Finalizing Design Cores and Updating Shapes"),
    PhaseSpec::sub("Verifying Netlist Connectivity"),
];

// Each optimization pass repeats its checksum after the time line.
const LOGIC_OPTIMIZATION: &[PhaseSpec] = &[
    PhaseSpec::phase("Initialization").with_children(INITIALIZATION),
    PhaseSpec::phase("Timer Update And Timing Data Collection")
        .with_children(TIMER_UPDATE_AND_TIMING_DATA_COLLECTION),
    PhaseSpec::phase("Retarget").with_final("Retarget | Checksum:"),
    PhaseSpec::phase("Constant propagation").with_final("Constant propagation | Checksum:"),
    PhaseSpec::phase("Sweep").with_final("Sweep | Checksum:"),
    PhaseSpec::phase("BUFG optimization").with_final("BUFG optimization | Checksum:"),
    PhaseSpec::phase("Shift Register Optimization")
        .with_final("Shift Register Optimization | Checksum:"),
    PhaseSpec::phase("Post Processing Netlist").with_final("Post Processing Netlist | Checksum:"),
    PhaseSpec::phase("Finalization").with_children(FINALIZATION),
];

const POWER_OPTIMIZATION: &[TaskSpec] = &[TaskSpec::new(
    "PowerOpt Patch Enables Task",
    "Starting PowerOpt Patch Enables Task",
    "Ending PowerOpt Patch Enables Task",
)];

const FINAL_CLEANUP: &[TaskSpec] = &[TaskSpec::new(
    "Logic Optimization Task",
    "Starting Logic Optimization Task",
    "Ending Logic Optimization Task",
)];

pub const TASKS: &[TaskSpec] = &[
    TaskSpec::timed("DRC Task", "Starting DRC Task"),
    TaskSpec::new(
        "Cache Timing Information Task",
        "Starting Cache Timing Information Task",
        "Ending Cache Timing Information Task",
    ),
    TaskSpec::new(
        "Logic Optimization Task",
        "Starting Logic Optimization Task",
        "Ending Logic Optimization Task",
    )
    .with_phases(LOGIC_OPTIMIZATION),
    TaskSpec::timed("Connectivity Check Task", "Starting Connectivity Check Task"),
    TaskSpec::new(
        "Power Optimization Task",
        "Starting Power Optimization Task",
        "Ending Power Optimization Task",
    )
    .with_subtasks(POWER_OPTIMIZATION),
    TaskSpec::new(
        "Final Cleanup Task",
        "Starting Final Cleanup Task",
        "Ending Final Cleanup Task",
    )
    .with_subtasks(FINAL_CLEANUP),
    TaskSpec::new(
        "Netlist Obfuscation Task",
        "Starting Netlist Obfuscation Task",
        "Ending Netlist Obfuscation Task",
    ),
];
