//! Shared test helpers for `workdash-core` integration tests.
//!
//! Scripted plugins let manager tests focus on ordering and failure
//! isolation instead of adapter details.

pub mod plugins;

use chrono::{TimeZone, Utc};
use workdash_domain::{DateRange, ManualSettings, NotionSettings, PluginConfig, PluginSettings};

/// One-week range starting 2024-01-15.
pub fn week_range() -> DateRange {
    DateRange::from_start(Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap(), 7)
}

/// Manual-kind config for plugin `id`.
pub fn manual_config(id: &str) -> PluginConfig {
    PluginConfig::new(id, id, "1.0.0", PluginSettings::Manual(ManualSettings::default()))
}

/// Notion-kind config for plugin `id`.
pub fn notion_config(id: &str) -> PluginConfig {
    PluginConfig::new(id, id, "1.0.0", PluginSettings::Notion(NotionSettings::default()))
}
