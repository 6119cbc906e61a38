//! Integration tests for AppContext lifecycle
//!
//! Tests verify that AppContext can be built from a loaded configuration and
//! that the services it wires share the same database and registry.

mod support;

use std::sync::Arc;

use support::{manual_plugin, setup_test_context, shift, test_config};
use tempfile::TempDir;
use workdash_core::ManualItemStore;
use workdash_domain::DatabaseConfig;
use workdash_infra::config;
use workdash_lib::context::AppContext;

#[test]
fn test_context_creation_succeeds() {
    let test = setup_test_context(vec![manual_plugin()]);

    assert!(Arc::strong_count(&test.ctx.db) >= 1, "db should be initialized");
    assert_eq!(test.ctx.registry.ids(), vec!["airtable", "google-calendar", "manual", "notion"]);
    assert!(Arc::ptr_eq(&test.ctx.registry, test.ctx.manager.registry()));
    assert_eq!(test.ctx.active_plugins().len(), 1);
}

#[test]
fn test_context_from_config_file() {
    let dir = TempDir::new().expect("temp dir");
    let config_path = dir.path().join("workdash.toml");
    let db_path = dir.path().join("from-file.db");
    std::fs::write(
        &config_path,
        format!(
            r#"
[database]
path = "{}"

[manager]
max_concurrency = 4

[[plugins]]
id = "manual"
name = "Manual Entry"
version = "1.0.0"

[plugins.settings]
source = "manual"
includeClosedTasks = true
"#,
            db_path.display()
        ),
    )
    .expect("write config");

    let loaded = config::load_from_file(Some(config_path)).expect("config loads");
    let ctx = AppContext::new_with_config(loaded).expect("context builds");

    assert_eq!(ctx.manager.config().max_concurrency, 4);
    assert_eq!(ctx.db.path(), db_path.as_path());
    assert!(db_path.exists(), "database file should be created on startup");
}

#[test]
fn test_context_rejects_unopenable_database() {
    let dir = TempDir::new().expect("temp dir");
    let mut config = test_config(&dir, Vec::new());
    config.database = DatabaseConfig {
        path: dir.path().join("missing").join("nested").join("w.db").to_string_lossy().to_string(),
        pool_size: 1,
    };

    assert!(AppContext::new_with_config(config).is_err());
}

#[tokio::test]
async fn test_manual_store_shares_context_database() {
    let test = setup_test_context(vec![manual_plugin()]);
    test.ctx
        .manual_store
        .upsert_schedule_row(&shift("s1", "w1", "2024-01-01T09:00:00Z", "2024-01-01T17:00:00Z"))
        .expect("insert row");

    assert!(test.ctx.manual_store.ping().await.is_ok());

    let report = test.ctx.health_check().await;
    let manual = report.components.iter().find(|c| c.name == "manual").expect("manual line");
    assert!(manual.is_healthy);
    assert!(manual.response_time_ms.is_some());
}
