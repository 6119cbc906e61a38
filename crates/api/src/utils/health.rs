//! Health report types for AppContext components
//!
//! Aggregates the database check and every plugin's health line into one
//! scored report.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use workdash_domain::PluginHealthResult;

/// Scored snapshot of the database and every registered plugin.
///
/// ```no_run
/// use workdash_lib::utils::health::{ComponentHealth, HealthReport};
///
/// let mut report = HealthReport::new()
///     .add_component(ComponentHealth::healthy("database"))
///     .add_component(ComponentHealth::unhealthy("notion", "missing secret"));
/// report.calculate_score();
///
/// assert_eq!(report.score, 0.5);
/// assert!(!report.is_healthy);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub is_healthy: bool,

    /// Share of healthy components, 0.0 to 1.0.
    pub score: f64,

    pub components: Vec<ComponentHealth>,

    /// Unix seconds at creation.
    pub timestamp: i64,
}

/// Minimum share of healthy components for an overall healthy report.
pub const HEALTHY_THRESHOLD: f64 = 0.8;

impl HealthReport {
    /// An empty report counts as healthy.
    pub fn new() -> Self {
        Self { is_healthy: true, score: 1.0, components: Vec::new(), timestamp: Utc::now().timestamp() }
    }

    pub fn add_component(mut self, component: ComponentHealth) -> Self {
        self.components.push(component);
        self
    }

    /// Recompute `score` and `is_healthy` from the current components.
    pub fn calculate_score(&mut self) {
        let total = self.components.len();
        if total == 0 {
            return;
        }

        let up = self.components.iter().filter(|component| component.is_healthy).count();
        self.score = up as f64 / total as f64;
        self.is_healthy = self.score >= HEALTHY_THRESHOLD;
    }
}

impl Default for HealthReport {
    fn default() -> Self {
        Self::new()
    }
}

/// One line of a [`HealthReport`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentHealth {
    /// Component identifier ("database" or a plugin id)
    pub name: String,

    pub is_healthy: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_time_ms: Option<u64>,
}

impl ComponentHealth {
    pub fn healthy(name: impl Into<String>) -> Self {
        Self { name: name.into(), is_healthy: true, message: None, response_time_ms: None }
    }

    pub fn unhealthy(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_healthy: false,
            message: Some(message.into()),
            response_time_ms: None,
        }
    }
}

impl From<PluginHealthResult> for ComponentHealth {
    fn from(result: PluginHealthResult) -> Self {
        Self {
            is_healthy: result.is_healthy(),
            name: result.plugin_id,
            message: result.message,
            response_time_ms: result.response_time_ms,
        }
    }
}
