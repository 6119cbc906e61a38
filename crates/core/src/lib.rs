//! # Workdash Core
//!
//! Pure plugin framework logic - no infrastructure dependencies.
//!
//! This crate contains:
//! - The source adapter contract and its envelope-producing runner
//! - Shared normalization rules for source vocabularies
//! - The plugin registry and the manager that executes plugins per worker
//! - Port interfaces implemented by infrastructure (manual entry storage)
//!
//! ## Architecture Principles
//! - Only depends on `workdash-domain`
//! - No database, HTTP, or platform code
//! - All external dependencies via traits

pub mod manual_ports;
pub mod plugins;

// Re-export specific items to avoid ambiguity
pub use manual_ports::ManualItemStore;
pub use plugins::adapter::{run_schedule, run_tasks, Plugin, PluginDescriptor, SourceAdapter};
pub use plugins::manager::PluginManager;
pub use plugins::registry::PluginRegistry;
