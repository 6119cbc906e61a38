//! # Workdash Infrastructure
//!
//! Infrastructure implementations of core ports.
//!
//! This crate contains:
//! - The HTTP client shared by network adapters
//! - Source adapters (Google Calendar, Airtable, Notion, manual entry)
//! - The SQLite store behind manual entry
//! - Configuration loading
//!
//! ## Architecture
//! - Implements traits defined in `workdash-core`
//! - Contains all "impure" code (network and database I/O)

pub mod config;
pub mod database;
pub mod errors;
pub mod http;
pub mod plugins;

// Re-export commonly used items
pub use database::{DbManager, SqliteManualItemStore};
pub use errors::InfraError;
pub use http::{HttpClient, HttpClientBuilder};
pub use plugins::{
    builtin_registry, AirtablePlugin, GoogleCalendarPlugin, ManualPlugin, NotionPlugin,
};
