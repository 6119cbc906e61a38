//! # Workdash App
//!
//! Application layer - commands and the `workdash` CLI entry point.
//!
//! This crate contains:
//! - Commands that aggregate schedules and tasks for a worker
//! - Application context (dependency injection)
//! - Logging bootstrap and health reporting
//!
//! ## Architecture
//! - Depends on `domain`, `core`, and `infra`
//! - Wires the built-in plugins into a registry and manager

pub mod commands;
pub mod context;
pub mod utils;

// Re-export for convenience
pub use commands::*;
pub use context::*;
