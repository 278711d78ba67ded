//! Macro progress reporting.
//!
//! - [`ProgressSink`] is the per-operation interface every macro reports
//!   through; a caller passes one into each macro invocation.
//! - [`EventBus`] is an in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`, and [`BusProgress`] adapts it into a sink
//!   that tags each update with an operation id.

pub mod bus;
pub mod progress;

pub use bus::{EventBus, MacroEvent};
pub use progress::{BusProgress, NoProgress, ProgressSink, ProgressUpdate};
