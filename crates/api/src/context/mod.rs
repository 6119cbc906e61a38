//! Application context - dependency injection container

use std::sync::Arc;

use workdash_core::{PluginManager, PluginRegistry};
use workdash_domain::{Config, PluginConfig, Result};
use workdash_infra::{builtin_registry, config, DbManager, HttpClient, SqliteManualItemStore};

use crate::utils::health::{ComponentHealth, HealthReport};

/// Application context - holds all services and dependencies
pub struct AppContext {
    pub config: Config,
    pub db: Arc<DbManager>,
    pub manual_store: Arc<SqliteManualItemStore>,
    pub registry: Arc<PluginRegistry>,
    pub manager: Arc<PluginManager>,
}

impl AppContext {
    /// Load configuration (environment first, then config files) and wire
    /// every service.
    pub fn new() -> Result<Self> {
        let config = config::load()?;
        Self::new_with_config(config)
    }

    /// Wire every service from an already loaded configuration.
    ///
    /// Opens the manual-entry database and runs its migrations, builds the
    /// shared HTTP client and registers the built-in plugins.
    pub fn new_with_config(config: Config) -> Result<Self> {
        tracing::info!(
            db_path = %config.database.path,
            plugins = config.plugins.len(),
            "initializing application context"
        );

        let db_manager = DbManager::from_config(&config.database)?;
        let db = Arc::new(db_manager.clone());

        let manual_store = Arc::new(SqliteManualItemStore::new(db_manager));
        let http = HttpClient::from_config(&config.http)?;

        let registry = Arc::new(builtin_registry(http, manual_store.clone())?);
        let manager = Arc::new(PluginManager::with_config(
            Arc::clone(&registry),
            config.manager.clone(),
        ));

        tracing::info!(registered = registry.len(), "application context ready");

        Ok(Self { config, db, manual_store, registry, manager })
    }

    /// Configs handed to the manager; disabled entries never run.
    pub fn active_plugins(&self) -> Vec<PluginConfig> {
        self.config.enabled_plugins()
    }

    /// Database connectivity plus one line per registered plugin.
    pub async fn health_check(&self) -> HealthReport {
        let database = match self.db.health_check() {
            Ok(()) => ComponentHealth::healthy("database"),
            Err(err) => ComponentHealth::unhealthy("database", err.message()),
        };

        let mut report = HealthReport::new().add_component(database);
        for plugin in self.manager.audit_plugins().await {
            report = report.add_component(ComponentHealth::from(plugin));
        }
        report.calculate_score();
        report
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;
    use workdash_domain::{DatabaseConfig, ManualSettings, PluginSettings};

    use super::*;

    fn test_config(dir: &TempDir) -> Config {
        Config {
            database: DatabaseConfig {
                path: dir.path().join("workdash.db").to_string_lossy().to_string(),
                pool_size: 2,
            },
            plugins: vec![
                PluginConfig::new(
                    "manual",
                    "Manual",
                    "1.0.0",
                    PluginSettings::Manual(ManualSettings::default()),
                )
                .with_enabled(false),
                PluginConfig::new(
                    "manual",
                    "Manual (enabled)",
                    "1.0.0",
                    PluginSettings::Manual(ManualSettings::default()),
                ),
            ],
            ..Config::default()
        }
    }

    #[test]
    fn active_plugins_filters_disabled_configs() {
        let dir = TempDir::new().unwrap();
        let ctx = AppContext::new_with_config(test_config(&dir)).unwrap();

        let active = ctx.active_plugins();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].name, "Manual (enabled)");
    }

    #[test]
    fn registry_is_shared_with_manager() {
        let dir = TempDir::new().unwrap();
        let ctx = AppContext::new_with_config(test_config(&dir)).unwrap();

        assert!(Arc::ptr_eq(&ctx.registry, ctx.manager.registry()));
        assert_eq!(ctx.registry.len(), 4);
    }
}
