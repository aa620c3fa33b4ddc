//! `place_design` tasks.

use crate::phase::PhaseSpec;
use crate::task::TaskSpec;
use crate::version::{V2019_1, V2023_2, V2025_1, V2030_1, VersionRange};

const PLACER_INITIALIZATION: &[PhaseSpec] = &[
    PhaseSpec::sub("Placer Initialization Netlist Sorting"),
    PhaseSpec::sub("IO Placement/ Clock Placement/ Build Placer Device"),
    PhaseSpec::sub("Build Placer Netlist Model"),
    PhaseSpec::sub("Constrain Clocks/Macros"),
];

const PHYSICAL_SYNTHESIS_IN_PLACER: &[PhaseSpec] = &[
    PhaseSpec::sub_sub("UpdateTiming Before Physical Synthesis"),
    PhaseSpec::sub_sub("Physical Synthesis In Placer"),
];

const GLOBAL_PLACEMENT_UNTIL_2025_1: &[PhaseSpec] = &[
    PhaseSpec::sub("Floorplanning"),
    PhaseSpec::sub("Update Timing before SLR Path Opt"),
    PhaseSpec::sub("Post-Processing in Floorplanning"),
    PhaseSpec::sub("Global Place Phase1"),
    PhaseSpec::sub("Global Place Phase2").with_children(PHYSICAL_SYNTHESIS_IN_PLACER),
    PhaseSpec::sub("Global Placement Core").with_children(PHYSICAL_SYNTHESIS_IN_PLACER),
];

const GLOBAL_PLACEMENT_FROM_2025_1: &[PhaseSpec] = &[
    PhaseSpec::sub("Floorplanning"),
    PhaseSpec::sub("Update Timing before SLR Path Opt"),
    PhaseSpec::sub("Post-Processing in Floorplanning"),
    PhaseSpec::sub("Global Place Phase1"),
    PhaseSpec::sub("Global Place Phase2").with_children(PHYSICAL_SYNTHESIS_IN_PLACER),
];

const GLOBAL_PLACEMENT: &[(VersionRange, &[PhaseSpec])] = &[
    (VersionRange::new(V2019_1, V2025_1), GLOBAL_PLACEMENT_UNTIL_2025_1),
    (VersionRange::new(V2025_1, V2030_1), GLOBAL_PLACEMENT_FROM_2025_1),
];

const SLICE_AREA_SWAP: &[PhaseSpec] = &[PhaseSpec::sub_sub_sub("Slice Area Swap Initial")];

const SMALL_SHAPE_DP: &[PhaseSpec] = &[
    PhaseSpec::sub_sub("Small Shape Clustering"),
    PhaseSpec::sub_sub("Slice Area Swap").with_children(SLICE_AREA_SWAP),
];

const DETAIL_PLACEMENT_UNTIL_2023_2: &[PhaseSpec] = &[
    PhaseSpec::sub("Commit Multi Column Macros"),
    PhaseSpec::sub("Commit Most Macros & LUTRAMs"),
    PhaseSpec::sub("Small Shape DP").with_children(SMALL_SHAPE_DP),
    PhaseSpec::sub("Re-assign LUT pins"),
    PhaseSpec::sub("Pipeline Register Optimization"),
    PhaseSpec::sub("Pipeline Register Optimization"),
    PhaseSpec::sub("Fast Optimization"),
    PhaseSpec::sub("Fast Optimization"),
];

const DETAIL_PLACEMENT_FROM_2023_2: &[PhaseSpec] = &[
    PhaseSpec::sub("Commit Multi Column Macros"),
    PhaseSpec::sub("Commit Most Macros & LUTRAMs"),
    PhaseSpec::sub("Small Shape DP").with_children(SMALL_SHAPE_DP),
    PhaseSpec::sub("Area Swap Optimization"),
    PhaseSpec::sub("Pipeline Register Optimization"),
    PhaseSpec::sub("Pipeline Register Optimization"),
    PhaseSpec::sub("Fast Optimization"),
    PhaseSpec::sub("Fast Optimization"),
    PhaseSpec::sub("Small Shape Detail Placement"),
    PhaseSpec::sub("Re-assign LUT pins"),
];

const DETAIL_PLACEMENT: &[(VersionRange, &[PhaseSpec])] = &[
    (VersionRange::new(V2019_1, V2023_2), DETAIL_PLACEMENT_UNTIL_2023_2),
    (VersionRange::new(V2023_2, V2030_1), DETAIL_PLACEMENT_FROM_2023_2),
];

const POST_PLACEMENT_OPTIMIZATION: &[PhaseSpec] = &[
    PhaseSpec::sub_sub_sub("BUFG Insertion"),
    PhaseSpec::sub_sub_sub("Post Placement Timing Optimization"),
];

const POST_COMMIT_OPTIMIZATION: &[PhaseSpec] = &[PhaseSpec::sub_sub("Post Placement Optimization")
    .ends_at_time()
    .with_children(POST_PLACEMENT_OPTIMIZATION)];

const PLACER_REPORTING: &[PhaseSpec] = &[PhaseSpec::sub_sub("Print Estimated Congestion")];

const POST_PLACEMENT_CLEAN_UP: &[PhaseSpec] = &[
    PhaseSpec::sub("Post Commit Optimization").with_children(POST_COMMIT_OPTIMIZATION),
    PhaseSpec::sub("Post Placement Cleanup"),
    PhaseSpec::sub("Placer Reporting").with_children(PLACER_REPORTING),
    PhaseSpec::sub("Final Placement Cleanup").ends_at_time(),
];

const PLACER: &[PhaseSpec] = &[
    PhaseSpec::phase("Placer Initialization").with_children(PLACER_INITIALIZATION),
    PhaseSpec::phase("Global Placement").with_versioned_children(GLOBAL_PLACEMENT),
    PhaseSpec::phase("Detail Placement").with_versioned_children(DETAIL_PLACEMENT),
    PhaseSpec::phase("Post Placement Optimization and Clean-Up")
        .with_children(POST_PLACEMENT_CLEAN_UP),
];

pub const TASKS: &[TaskSpec] = &[TaskSpec::new(
    "Placer Task",
    "Starting Placer Task",
    "Ending Placer Task",
)
.with_phases(PLACER)];
