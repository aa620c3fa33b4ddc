//! Static descriptions of the structure each Tcl command logs.
//!
//! The engines in [`crate::section`], [`crate::task`] and [`crate::phase`]
//! know how to read a construct; the tables here say which constructs exist,
//! in which order, and for which tool versions.

pub mod optimize;
pub mod physical;
pub mod place;
pub mod route;
pub mod synthesis;

use crate::command::CommandKind;
use crate::section::SectionSpec;
use crate::task::TaskSpec;

/// Children a command drives.
#[derive(Debug, Clone, Copy)]
pub enum CommandCatalog {
    None,
    Sections(&'static [SectionSpec]),
    Tasks(&'static [TaskSpec]),
}

pub fn for_command(kind: &CommandKind) -> CommandCatalog {
    match kind {
        CommandKind::SynthDesign => CommandCatalog::Sections(synthesis::SECTIONS),
        CommandKind::OptDesign => CommandCatalog::Tasks(optimize::TASKS),
        CommandKind::PlaceDesign => CommandCatalog::Tasks(place::TASKS),
        CommandKind::PhysOptDesign => CommandCatalog::Tasks(physical::TASKS),
        CommandKind::RouteDesign => CommandCatalog::Tasks(route::TASKS),
        _ => CommandCatalog::None,
    }
}
