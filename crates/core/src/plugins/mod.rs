//! Plugin framework
//!
//! - [`adapter`]: the contract every source adapter implements and the
//!   runner that turns fetch results into envelopes
//! - [`normalize`]: vocabulary and timestamp rules shared by adapters
//! - [`registry`]: id to plugin lookup
//! - [`manager`]: executes configured plugins for a worker

pub mod adapter;
pub mod manager;
pub mod normalize;
pub mod registry;

pub use adapter::{run_schedule, run_tasks, Plugin, PluginDescriptor, SourceAdapter};
pub use manager::PluginManager;
pub use registry::PluginRegistry;
