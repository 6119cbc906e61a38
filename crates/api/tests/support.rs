#![allow(dead_code)]

use tempfile::TempDir;
use workdash_domain::{
    AirtableSettings, Config, DatabaseConfig, HttpConfig, ManualScheduleRow, ManualSettings,
    ManualTaskRow, PluginConfig, PluginSettings,
};
use workdash_lib::AppContext;

/// Context over a throwaway database; keeps the directory alive.
pub struct TestContext {
    pub ctx: AppContext,
    _temp_dir: TempDir,
}

pub fn manual_plugin() -> PluginConfig {
    PluginConfig::new("manual", "Manual Entry", "1.0.0", PluginSettings::Manual(ManualSettings::default()))
}

/// Airtable config that would fail immediately if it were ever executed.
pub fn disabled_airtable() -> PluginConfig {
    PluginConfig::new(
        "airtable",
        "Airtable",
        "1.0.0",
        PluginSettings::Airtable(AirtableSettings::default()),
    )
    .with_enabled(false)
}

pub fn test_config(dir: &TempDir, plugins: Vec<PluginConfig>) -> Config {
    Config {
        database: DatabaseConfig {
            path: dir.path().join("workdash.db").to_string_lossy().to_string(),
            pool_size: 2,
        },
        http: HttpConfig { timeout_secs: 5, max_attempts: 1 },
        plugins,
        ..Config::default()
    }
}

pub fn setup_test_context(plugins: Vec<PluginConfig>) -> TestContext {
    let temp_dir = TempDir::new().expect("failed to create temporary database directory");
    let ctx = AppContext::new_with_config(test_config(&temp_dir, plugins))
        .expect("failed to build application context");
    TestContext { ctx, _temp_dir: temp_dir }
}

pub fn shift(id: &str, worker_id: &str, start: &str, end: &str) -> ManualScheduleRow {
    ManualScheduleRow {
        id: id.into(),
        worker_id: worker_id.into(),
        title: Some(format!("Shift {}", id)),
        start_time: Some(start.into()),
        end_time: Some(end.into()),
        ..ManualScheduleRow::default()
    }
}

pub fn task(id: &str, worker_id: &str, status: &str) -> ManualTaskRow {
    ManualTaskRow {
        id: id.into(),
        worker_id: worker_id.into(),
        title: Some(format!("Task {}", id)),
        status: Some(status.into()),
        ..ManualTaskRow::default()
    }
}
