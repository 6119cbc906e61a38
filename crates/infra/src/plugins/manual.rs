//! Manual entry adapter
//!
//! Reads rows entered by hand from the local store. There are no credentials
//! to check, so validation always passes and health pings the store.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, instrument};
use workdash_core::plugins::adapter::settings_mismatch;
use workdash_core::plugins::normalize::{
    non_empty, normalize_priority, normalize_status, parse_timestamp,
};
use workdash_core::{ManualItemStore, PluginDescriptor, SourceAdapter};
use workdash_domain::constants::MANUAL_PLUGIN_ID;
use workdash_domain::{
    ConfigFieldType, ConfigSchema, DateRange, ItemMetadata, ManualScheduleRow, ManualSettings,
    ManualTaskRow, PluginConfig, PluginHealthResult, PluginSettings, Result, SourceKind,
    StandardScheduleItem, StandardTaskItem, TaskPriority, TaskStatus, ValidationResult,
};

const KIND: SourceKind = SourceKind::Manual;

/// Adapter over the manual-entry tables.
pub struct ManualPlugin {
    descriptor: PluginDescriptor,
    store: Arc<dyn ManualItemStore>,
}

impl ManualPlugin {
    pub fn new(store: Arc<dyn ManualItemStore>) -> Self {
        Self {
            descriptor: PluginDescriptor::new(MANUAL_PLUGIN_ID, "Manual Entry", "1.0.0", KIND),
            store,
        }
    }
}

fn settings_of(config: &PluginConfig) -> Result<&ManualSettings> {
    match &config.settings {
        PluginSettings::Manual(settings) => Ok(settings),
        other => Err(settings_mismatch(KIND, other.kind())),
    }
}

/// Stored priority token, or the shared vocabulary rules for free text.
fn row_priority(raw: Option<&str>) -> TaskPriority {
    match non_empty(raw) {
        Some(value) => {
            TaskPriority::from_str(&value).unwrap_or_else(|_| normalize_priority(&value))
        }
        None => TaskPriority::default(),
    }
}

fn row_status(raw: Option<&str>) -> TaskStatus {
    match non_empty(raw) {
        Some(value) => TaskStatus::from_str(&value).unwrap_or_else(|_| normalize_status(&value)),
        None => TaskStatus::default(),
    }
}

fn metadata(id: &str, worker_id: &str, created_at: Option<&str>) -> ItemMetadata {
    let mut metadata = ItemMetadata::new();
    metadata.insert("source".into(), json!(KIND.to_string()));
    metadata.insert("recordId".into(), json!(id));
    metadata.insert("workerId".into(), json!(worker_id));
    if let Some(created) = non_empty(created_at) {
        metadata.insert("createdTime".into(), json!(created));
    }
    metadata
}

#[async_trait]
impl SourceAdapter for ManualPlugin {
    type ScheduleRecord = ManualScheduleRow;
    type TaskRecord = ManualTaskRow;

    fn descriptor(&self) -> &PluginDescriptor {
        &self.descriptor
    }

    fn config_schema(&self) -> ConfigSchema {
        ConfigSchema::new().optional(
            "includeClosedTasks",
            ConfigFieldType::Boolean,
            "Also return completed and cancelled tasks",
        )
    }

    #[instrument(skip(self, range, config), fields(plugin_id = %self.descriptor.id))]
    async fn fetch_schedule(
        &self,
        worker_id: &str,
        range: &DateRange,
        config: &PluginConfig,
    ) -> Result<Vec<ManualScheduleRow>> {
        settings_of(config)?;
        let rows = self.store.schedule_rows(worker_id, range).await?;
        debug!(count = rows.len(), "Loaded manual schedule rows");
        Ok(rows)
    }

    #[instrument(skip(self, config), fields(plugin_id = %self.descriptor.id))]
    async fn fetch_tasks(
        &self,
        worker_id: &str,
        config: &PluginConfig,
    ) -> Result<Vec<ManualTaskRow>> {
        let settings = settings_of(config)?;
        let mut rows = self.store.task_rows(worker_id).await?;
        if !settings.include_closed_tasks {
            rows.retain(|row| !row_status(row.status.as_deref()).is_terminal());
        }
        debug!(count = rows.len(), "Loaded manual task rows");
        Ok(rows)
    }

    fn transform_schedule_item(&self, raw: &ManualScheduleRow) -> Option<StandardScheduleItem> {
        let id = non_empty(Some(raw.id.as_str()))?;
        let title = non_empty(raw.title.as_deref())?;
        let start = raw.start_time.as_deref().and_then(parse_timestamp)?;
        let end = raw.end_time.as_deref().and_then(parse_timestamp)?;
        if start > end {
            return None;
        }

        Some(StandardScheduleItem {
            metadata: metadata(&id, &raw.worker_id, raw.created_at.as_deref()),
            id,
            title,
            start_time: start,
            end_time: end,
            location: non_empty(raw.location.as_deref()),
            description: non_empty(raw.description.as_deref()),
        })
    }

    fn transform_task_item(&self, raw: &ManualTaskRow) -> Option<StandardTaskItem> {
        let id = non_empty(Some(raw.id.as_str()))?;
        let title = non_empty(raw.title.as_deref())?;

        Some(StandardTaskItem {
            metadata: Some(metadata(&id, &raw.worker_id, raw.created_at.as_deref())),
            id,
            title,
            description: non_empty(raw.description.as_deref()),
            due_date: raw.due_date.as_deref().and_then(parse_timestamp),
            priority: row_priority(raw.priority.as_deref()),
            status: row_status(raw.status.as_deref()),
        })
    }

    async fn validate_config(&self, _config: &PluginConfig) -> Result<ValidationResult> {
        Ok(ValidationResult::valid())
    }

    async fn health_check(&self) -> Option<PluginHealthResult> {
        let started = Instant::now();
        let outcome = self.store.ping().await;
        let elapsed = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        let health = match outcome {
            Ok(()) => PluginHealthResult::healthy(&self.descriptor.id),
            Err(error) => PluginHealthResult::unhealthy(
                &self.descriptor.id,
                format!("Manual entry store unavailable: {}", error.message()),
            ),
        };
        Some(health.with_response_time(elapsed))
    }
}
