//! Application constants
//!
//! Centralized location for domain-level constants shared by the plugin
//! framework and its adapters.

// Default titles substituted when a source record has none
pub const UNTITLED_EVENT: &str = "Untitled Event";
pub const UNTITLED_SCHEDULE: &str = "Untitled Schedule";
pub const UNTITLED_TASK: &str = "Untitled Task";

/// Duration applied when a source provides a start but no end time.
pub const DEFAULT_EVENT_DURATION_MINUTES: i64 = 60;

/// Upper bound on followed pagination cursors per fetch.
pub const MAX_PAGES: usize = 10;

/// How far ahead task-like calendar events are looked up.
pub const TASK_LOOKAHEAD_DAYS: i64 = 30;

// Plugin identifiers of the built-in adapters
pub const GOOGLE_CALENDAR_PLUGIN_ID: &str = "google-calendar";
pub const AIRTABLE_PLUGIN_ID: &str = "airtable";
pub const NOTION_PLUGIN_ID: &str = "notion";
pub const MANUAL_PLUGIN_ID: &str = "manual";

/// Pinned Notion API version header value.
pub const NOTION_API_VERSION: &str = "2022-06-28";

// Manual entry tables
pub const MANUAL_SCHEDULE_TABLE: &str = "manual_schedule_items";
pub const MANUAL_TASK_TABLE: &str = "manual_task_items";
