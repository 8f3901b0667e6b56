//! placement-core
//!
//! Core library for detecting memory-placement hazards of variables in
//! RP2040-class firmware images.
//!
//! This crate defines the data model, the target memory map, the placement
//! rule engine, symbol resolver backends, and the report model.
//!
//! The goal is to keep all substantive logic here so it is fully testable and
//! reusable from multiple frontends (CLI, CI hooks, etc.).

pub mod config;
pub mod memory_map;
pub mod model;
pub mod rules;
pub mod services;

/// Returns the library version as encoded at compile time.
///
/// Useful for tests and for frontends to report consistent version info.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
