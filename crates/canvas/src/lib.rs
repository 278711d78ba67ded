//! Remote canvas REST client.
//!
//! [`CanvasApi`] is the seam between the macro engine and the canvas
//! service: list widgets, fetch zones, and create/patch/delete widgets in
//! their typed sub-collections. [`HttpCanvasClient`] implements it over
//! HTTP with [`reqwest`]. With the `test-support` feature, `InMemoryCanvas`
//! implements it in memory for tests. [`with_retry`] wraps individual calls
//! with a bounded fixed-delay retry.

pub mod api;
pub mod client;
pub mod error;
#[cfg(any(test, feature = "test-support"))]
pub mod memory;
pub mod retry;

pub use api::CanvasApi;
pub use client::{CanvasConfig, HttpCanvasClient};
pub use error::CanvasError;
#[cfg(any(test, feature = "test-support"))]
pub use memory::{CanvasCall, InMemoryCanvas};
pub use retry::{with_retry, RetryPolicy};
