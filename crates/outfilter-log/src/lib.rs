//! # Outfilter Log Classifier
//!
//! Single-pass classifier for AMD/Xilinx Vivado synthesis (`*.vds`) and
//! implementation (`*.vdi`) logs.
//!
//! ## Overview
//!
//! Every input line receives a [`LineKind`] tag (message severity, section
//! boundary, table row, ...). While tagging, the classifier rebuilds the
//! nested structure the tool printed purely from textual markers:
//!
//! - **Commands**: `Command: synth_design ...` up to `synth_design completed successfully`
//! - **Sections**: `Start Technology Mapping` / `Finished Technology Mapping`
//! - **Tasks**: `Starting Placer Task` / `Ending Placer Task`
//! - **Phases**: `Phase 2.1 Floorplanning` down to four levels of nesting
//!
//! Logs that deviate from the known structure degrade gracefully: the
//! affected scope is passed through unclassified and a [`Diagnostic`] is
//! collected, unless [`ParseOptions::strict`] asks for a hard failure.
//!
//! ## Architecture
//!
//! ```text
//! Document ──line──► Command ──► Section / Task ──► Phase ──► SubPhase ...
//!     │                 ▲                │
//!     │                 └─── residual ───┘
//!     ▼
//! MessageAggregator (document, every scope)
//! ```
//!
//! Each scope is an explicit state machine. The chain of active children is
//! the parse stack; a scope that reaches its end hands the line it could not
//! use back to its parent. The structure each command prints is data, kept in
//! [`catalog`] and selected by tool version.
//!
//! ## Examples
//!
//! ```
//! use outfilter_log::{CommandKind, Document, LineKind};
//!
//! let log = "\
//! Command: link_design -top top
//! INFO: [Device 21-403] Loading part xc7z020clg400-1
//! link_design completed successfully
//! ";
//! let document = Document::parse(log)?;
//! let link = document.command(CommandKind::LinkDesign)?;
//! assert_eq!(link.part(), Some("xc7z020clg400-1"));
//! assert_eq!(link.success(), Some(true));
//! assert!(document.lines()[1].kind().contains(LineKind::INFO_MESSAGE));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

/// Line records and their classification tags.
pub mod line;
/// Message decoding.
pub mod message;
pub mod aggregate;
pub mod version;
pub mod timing;
pub mod error;
pub mod diagnostics;
mod scope;
mod table;
pub mod section;
pub mod task;
pub mod phase;
/// Tcl command scopes.
pub mod command;
pub mod catalog;
pub mod preamble;
/// Document driver.
pub mod document;
pub mod outline;

#[cfg(test)]
mod tests;

pub use aggregate::{MessageAggregator, MessageCounts};
pub use command::{Command, CommandKind, TclCommand, XdcFile};
pub use diagnostics::{Diagnostic, DiagnosticKind};
pub use document::{Document, ParseOptions};
pub use error::{NotPresent, ParseError};
pub use line::{Line, LineKind};
pub use message::{Message, RtlDiagnostic, RtlKind, Severity};
pub use outline::{OutlineLevel, OutlineNode};
pub use scope::{ScopeState, Span};
pub use table::TableKind;
pub use timing::Timing;
pub use version::ToolVersion;
