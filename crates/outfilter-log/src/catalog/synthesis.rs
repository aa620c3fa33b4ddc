//! `synth_design` sections.

use crate::section::{Extract, SectionSpec};

pub const RTL_ELABORATION: &str = "RTL Elaboration";
pub const LOADING_PART: &str = "Loading Part and Timing Information";
pub const IO_INSERTION: &str = "IO Insertion";
pub const WRITING_SYNTHESIS_REPORT: &str = "Writing Synthesis Report";

const HANDLING_CUSTOM_ATTRIBUTES: SectionSpec = SectionSpec::new(
    "Handling Custom Attributes",
    "Start Handling Custom Attributes",
    "Finished Handling Custom Attributes : ",
);

const RETIMING_REPORTING: SectionSpec = SectionSpec::new(
    "ROM, RAM, DSP, Shift Register and Retiming Reporting",
    "Start ROM, RAM, DSP, Shift Register and Retiming Reporting",
    "Finished ROM, RAM, DSP, Shift Register and Retiming Reporting",
);

const IO_INSERTION_STEPS: &[SectionSpec] = &[
    SectionSpec::sub(
        "Flattening Before IO Insertion",
        "Start Flattening Before IO Insertion",
        "Finished Flattening Before IO Insertion",
    ),
    SectionSpec::sub(
        "Final Netlist Cleanup",
        "Start Final Netlist Cleanup",
        "Finished Final Netlist Cleanup",
    ),
];

/// Sections in the order Vivado prints them. Some appear more than once.
pub const SECTIONS: &[SectionSpec] = &[
    SectionSpec::new(
        RTL_ELABORATION,
        "Starting RTL Elaboration : ",
        "Finished RTL Elaboration : ",
    )
    .extracting(Extract::RtlDiagnostics),
    HANDLING_CUSTOM_ATTRIBUTES,
    // Opens on the end of the first RTL optimization phase.
    SectionSpec::new(
        "Constraint Validation",
        "Finished RTL Optimization Phase 1",
        "Finished Constraint Validation : ",
    ),
    SectionSpec::new(
        LOADING_PART,
        "Start Loading Part and Timing Information",
        "Finished Loading Part and Timing Information : ",
    )
    .extracting(Extract::Part),
    SectionSpec::new(
        "Applying 'set_property' XDC Constraints",
        "Start Applying 'set_property' XDC Constraints",
        "Finished applying 'set_property' XDC Constraints : ",
    ),
    SectionSpec::new(
        "RTL Component Statistics",
        "Start RTL Component Statistics",
        "Finished RTL Component Statistics",
    ),
    SectionSpec::new(
        "RTL Hierarchical Component Statistics",
        "Start RTL Hierarchical Component Statistics",
        "Finished RTL Hierarchical Component Statistics",
    ),
    SectionSpec::new(
        "Part Resource Summary",
        "Start Part Resource Summary",
        "Finished Part Resource Summary",
    ),
    SectionSpec::new(
        "Cross Boundary and Area Optimization",
        "Start Cross Boundary and Area Optimization",
        "Finished Cross Boundary and Area Optimization : ",
    ),
    RETIMING_REPORTING,
    SectionSpec::new(
        "Applying XDC Timing Constraints",
        "Start Applying XDC Timing Constraints",
        "Finished Applying XDC Timing Constraints : ",
    ),
    SectionSpec::new(
        "Timing Optimization",
        "Start Timing Optimization",
        "Finished Timing Optimization : ",
    ),
    RETIMING_REPORTING,
    SectionSpec::new(
        "Technology Mapping",
        "Start Technology Mapping",
        "Finished Technology Mapping : ",
    ),
    SectionSpec::new(IO_INSERTION, "Start IO Insertion", "Finished IO Insertion : ")
        .with_children(IO_INSERTION_STEPS),
    SectionSpec::new(
        "Renaming Generated Instances",
        "Start Renaming Generated Instances",
        "Finished Renaming Generated Instances : ",
    ),
    SectionSpec::new(
        "Rebuilding User Hierarchy",
        "Start Rebuilding User Hierarchy",
        "Finished Rebuilding User Hierarchy : ",
    ),
    SectionSpec::new(
        "Renaming Generated Ports",
        "Start Renaming Generated Ports",
        "Finished Renaming Generated Ports : ",
    ),
    HANDLING_CUSTOM_ATTRIBUTES,
    SectionSpec::new(
        "Renaming Generated Nets",
        "Start Renaming Generated Nets",
        "Finished Renaming Generated Nets : ",
    ),
    RETIMING_REPORTING,
    SectionSpec::new(
        WRITING_SYNTHESIS_REPORT,
        "Start Writing Synthesis Report",
        "Finished Writing Synthesis Report : ",
    )
    .extracting(Extract::SynthesisReport),
];
