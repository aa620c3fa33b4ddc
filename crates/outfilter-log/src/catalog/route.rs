//! `route_design` tasks.

use crate::phase::PhaseSpec;
use crate::task::TaskSpec;
use crate::version::{V2019_1, V2023_2, V2030_1, VersionRange};

const UPDATE_TIMING_FOR_BUS_SKEW: &[PhaseSpec] = &[PhaseSpec::sub_sub("Update Timing")];

const ROUTER_INITIALIZATION_UNTIL_2023_2: &[PhaseSpec] = &[
    PhaseSpec::sub("Fix Topology Constraints"),
    PhaseSpec::sub("Pre Route Cleanup"),
    PhaseSpec::sub("Global Clock Net Routing"),
    PhaseSpec::sub("Update Timing"),
    PhaseSpec::sub("Update Timing for Bus Skew").with_children(UPDATE_TIMING_FOR_BUS_SKEW),
];

const ROUTER_INITIALIZATION_FROM_2023_2: &[PhaseSpec] = &[
    PhaseSpec::sub("Fix Topology Constraints"),
    PhaseSpec::sub("Pre Route Cleanup"),
    PhaseSpec::sub("Global Clock Net Routing"),
    PhaseSpec::sub("Update Timing"),
    PhaseSpec::sub("Update Timing for Bus Skew").with_children(UPDATE_TIMING_FOR_BUS_SKEW),
    PhaseSpec::sub("Soft Constraint Pins - Fast Budgeting"),
];

const ROUTER_INITIALIZATION: &[(VersionRange, &[PhaseSpec])] = &[
    (VersionRange::new(V2019_1, V2023_2), ROUTER_INITIALIZATION_UNTIL_2023_2),
    (VersionRange::new(V2023_2, V2030_1), ROUTER_INITIALIZATION_FROM_2023_2),
];

const INITIAL_ROUTING: &[PhaseSpec] = &[
    PhaseSpec::sub("Initial Net Routing Pass"),
    PhaseSpec::sub("Global Routing"),
    PhaseSpec::sub("Initial Net Routing"),
];

const RIP_UP_AND_REROUTE: &[PhaseSpec] = &[
    PhaseSpec::sub("Global Iteration 0"),
    PhaseSpec::sub("Global Iteration 1"),
];

const DELAY_AND_SKEW_OPTIMIZATION: &[PhaseSpec] = &[
    PhaseSpec::sub("Delay CleanUp"),
    PhaseSpec::sub("Clock Skew Optimization"),
];

const POST_HOLD_FIX: &[PhaseSpec] = &[PhaseSpec::sub("Hold Fix Iter")];

const ROUTING_UNTIL_2023_2: &[PhaseSpec] = &[
    PhaseSpec::phase("Build RT Design"),
    PhaseSpec::phase("Router Initialization").with_versioned_children(ROUTER_INITIALIZATION),
    PhaseSpec::phase("Initial Routing").with_children(INITIAL_ROUTING),
    PhaseSpec::phase("Rip-up And Reroute").with_children(RIP_UP_AND_REROUTE),
    PhaseSpec::phase("Delay and Skew Optimization").with_children(DELAY_AND_SKEW_OPTIMIZATION),
    PhaseSpec::phase("Post Hold Fix").with_children(POST_HOLD_FIX),
    PhaseSpec::phase("Route finalize"),
    PhaseSpec::phase("Verifying routed nets"),
    PhaseSpec::phase("Depositing Routes"),
    PhaseSpec::phase("Resolve XTalk"),
    PhaseSpec::phase("Route finalize"),
    PhaseSpec::phase("Post Router Timing"),
    PhaseSpec::phase("Post-Route Event Processing"),
];

const ROUTING_FROM_2023_2: &[PhaseSpec] = &[
    PhaseSpec::phase("Build RT Design"),
    PhaseSpec::phase("Router Initialization").with_versioned_children(ROUTER_INITIALIZATION),
    PhaseSpec::phase("Global Routing"),
    PhaseSpec::phase("Initial Routing").with_children(INITIAL_ROUTING),
    PhaseSpec::phase("Rip-up And Reroute").with_children(RIP_UP_AND_REROUTE),
    PhaseSpec::phase("Delay and Skew Optimization").with_children(DELAY_AND_SKEW_OPTIMIZATION),
    PhaseSpec::phase("Post Hold Fix").with_children(POST_HOLD_FIX),
    PhaseSpec::phase("Route finalize"),
    PhaseSpec::phase("Verifying routed nets"),
    PhaseSpec::phase("Depositing Routes"),
    PhaseSpec::phase("Resolve XTalk"),
    PhaseSpec::phase("Route finalize"),
    PhaseSpec::phase("Post Router Timing"),
    PhaseSpec::phase("Post Process Routing"),
    PhaseSpec::phase("Post Router Timing"),
    PhaseSpec::phase("Post-Route Event Processing"),
];

const ROUTING: &[(VersionRange, &[PhaseSpec])] = &[
    (VersionRange::new(V2019_1, V2023_2), ROUTING_UNTIL_2023_2),
    (VersionRange::new(V2023_2, V2030_1), ROUTING_FROM_2023_2),
];

pub const TASKS: &[TaskSpec] = &[TaskSpec::new(
    "Routing Task",
    "Starting Routing Task",
    "Ending Routing Task",
)
.with_versioned_phases(ROUTING)];
