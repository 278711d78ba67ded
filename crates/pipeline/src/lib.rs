//! Zone macro engine.
//!
//! [`MacroEngine`] runs every operator macro (move, copy, delete, undelete,
//! auto-grid, group by color/title, pin/unpin) against a [`CanvasApi`].
//! Bulk creation goes through [`BulkMutator`], which submits widgets in an
//! order that respects parent links and connector endpoints and rewrites
//! those references to the ids the canvas assigns.
//!
//! [`CanvasApi`]: zoneops_canvas::CanvasApi

pub mod engine;
pub mod error;
pub mod mutator;

pub use engine::{MacroEngine, MacroReport, MacroSettings};
pub use error::MacroError;
pub use mutator::{BulkMutator, BulkOutcome, Patch};
