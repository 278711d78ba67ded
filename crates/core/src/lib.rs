//! Canvas domain model and pure zone algorithms.
//!
//! This crate has no I/O. It defines the widget and zone records exchanged
//! with the remote canvas service, the zone geometry used to select widgets,
//! the zone-to-zone coordinate transform, and the layout macro algorithms
//! (auto-grid, group by color, group by title).

pub mod color;
pub mod error;
pub mod geometry;
pub mod layout;
pub mod transform;
pub mod types;
pub mod widget;
