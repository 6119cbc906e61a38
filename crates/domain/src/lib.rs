//! # Workdash Domain
//!
//! Business domain types for the Workdash plugin framework.
//!
//! This crate contains:
//! - The standard schedule/task item model every source normalizes into
//! - Plugin configuration with typed per-source settings
//! - Response envelopes, batch results and the envelope error taxonomy
//! - Domain error types and Result definitions
//! - Configuration structures
//!
//! ## Architecture
//! - No dependencies on other Workdash crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
