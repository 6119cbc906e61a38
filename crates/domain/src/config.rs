//! Configuration management

use serde::{Deserialize, Serialize};

use crate::types::PluginConfig;

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub manager: ManagerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Source configurations, in display order.
    #[serde(default)]
    pub plugins: Vec<PluginConfig>,
}

impl Config {
    /// Plugin configs with `enabled = true`, order preserved.
    pub fn enabled_plugins(&self) -> Vec<PluginConfig> {
        self.plugins.iter().filter(|config| config.enabled).cloned().collect()
    }
}

/// Manual-entry database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub path: String,
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { path: "workdash.db".to_string(), pool_size: default_pool_size() }
    }
}

/// Outbound HTTP configuration shared by the network adapters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Total attempts per request; 1 disables retries.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self { timeout_secs: default_timeout_secs(), max_attempts: default_max_attempts() }
    }
}

/// Plugin manager execution policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagerConfig {
    /// Plugins run at once per kind; 1 keeps execution sequential.
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
    /// Upper bound on a single plugin call. `None` waits indefinitely.
    #[serde(default)]
    pub plugin_timeout_secs: Option<u64>,
    /// Run the schedule and task passes of `execute_all_plugins` together.
    #[serde(default)]
    pub concurrent_kinds: bool,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            max_concurrency: default_max_concurrency(),
            plugin_timeout_secs: None,
            concurrent_kinds: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: default_log_level(), json: false }
    }
}

fn default_pool_size() -> u32 {
    4
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_attempts() -> u32 {
    1
}

fn default_max_concurrency() -> usize {
    1
}

fn default_log_level() -> String {
    "info".to_string()
}
