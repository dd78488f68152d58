//! captable-core
//!
//! Core library for cap-table ownership and dilution math.
//!
//! This crate defines the data model (stakeholders, instruments, round terms),
//! the dilution engine that turns a pre-round cap table plus round terms into
//! a pre/post ownership comparison, and small display helpers.
//!
//! The goal is to keep all substantive logic here so it is fully testable and
//! reusable from multiple frontends (CLI, web bindings, etc.). The engine is
//! pure: no I/O, no shared state, every call allocates fresh output.

pub mod engine;
pub mod format;
pub mod model;

/// Returns the library version as encoded at compile time.
///
/// Useful for tests and for frontends to report consistent version info.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
