//! Shared helpers for `workdash-infra` integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use tempfile::TempDir;
use workdash_domain::{
    AirtableSettings, DateRange, GoogleCalendarSettings, ManualSettings, NotionSettings,
    PluginConfig, PluginSettings,
};
use workdash_infra::{DbManager, HttpClient, SqliteManualItemStore};

/// One-week range starting 2024-01-01.
pub fn week_range() -> DateRange {
    DateRange::from_start(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(), 7)
}

/// Client that fails fast, without retries.
pub fn http() -> HttpClient {
    HttpClient::builder()
        .timeout(std::time::Duration::from_secs(5))
        .max_attempts(1)
        .build()
        .expect("http client should build")
}

pub fn airtable_config(api_key: Option<&str>, base_id: Option<&str>) -> PluginConfig {
    let settings = AirtableSettings {
        api_key: api_key.map(str::to_string),
        base_id: base_id.map(str::to_string),
        ..AirtableSettings::default()
    };
    PluginConfig::new("airtable", "Airtable", "1.0.0", PluginSettings::Airtable(settings))
}

pub fn notion_config(secret: Option<&str>, schedule_db: Option<&str>) -> PluginConfig {
    let settings = NotionSettings {
        integration_secret: secret.map(str::to_string),
        schedule_database_id: schedule_db.map(str::to_string),
        task_database_id: Some("tasks-db".into()),
        ..NotionSettings::default()
    };
    PluginConfig::new("notion", "Notion", "1.0.0", PluginSettings::Notion(settings))
}

pub fn google_config(api_key: &str, calendar_id: &str) -> PluginConfig {
    let settings = GoogleCalendarSettings {
        api_key: Some(api_key.into()),
        calendar_id: Some(calendar_id.into()),
        ..GoogleCalendarSettings::default()
    };
    PluginConfig::new(
        "google-calendar",
        "Google Calendar",
        "1.0.0",
        PluginSettings::GoogleCalendar(settings),
    )
}

pub fn manual_config() -> PluginConfig {
    PluginConfig::new("manual", "Manual Entry", "1.0.0", PluginSettings::Manual(ManualSettings::default()))
}

/// Temporary migrated database. Keep the `TempDir` alive for the test.
pub struct TestStore {
    pub store: Arc<SqliteManualItemStore>,
    _dir: TempDir,
}

impl TestStore {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("temp dir should be created");
        let db = DbManager::new(dir.path().join("workdash.db"), 2).expect("db should open");
        db.run_migrations().expect("migrations should apply");
        Self { store: Arc::new(SqliteManualItemStore::new(db)), _dir: dir }
    }
}
