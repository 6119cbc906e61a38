//! Plugin inventory and health commands

use serde::{Deserialize, Serialize};
use workdash_domain::{ConfigSchema, Result, SourceKind};

use crate::utils::command_helpers::execute_logged;
use crate::utils::health::HealthReport;
use crate::AppContext;

/// Registered plugin as shown to operators
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginSummary {
    pub id: String,
    pub name: String,
    pub version: String,
    pub kind: SourceKind,
    /// Whether any enabled config targets this plugin.
    pub configured: bool,
    pub schema: ConfigSchema,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginOverview {
    pub plugins: Vec<PluginSummary>,
    pub health: HealthReport,
}

/// Every registered plugin, sorted by id, with the application health report.
pub async fn list_plugins(ctx: &AppContext) -> Result<PluginOverview> {
    execute_logged("plugins::list_plugins", || async {
        let active = ctx.active_plugins();

        let mut plugins: Vec<PluginSummary> = ctx
            .registry
            .get_all()
            .into_iter()
            .map(|plugin| PluginSummary {
                id: plugin.id().to_string(),
                name: plugin.name().to_string(),
                version: plugin.version().to_string(),
                kind: plugin.kind(),
                configured: active.iter().any(|config| config.id == plugin.id()),
                schema: plugin.schema(),
            })
            .collect();
        plugins.sort_by(|a, b| a.id.cmp(&b.id));

        let health = ctx.health_check().await;
        Ok(PluginOverview { plugins, health })
    })
    .await
}
