use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use workdash_core::Plugin;
use workdash_domain::{
    ConfigFieldType, ConfigSchema, DateRange, ItemMetadata, PluginConfig, PluginError,
    PluginHealthResult, PluginResponse, Result, SourceKind, StandardScheduleItem,
    StandardTaskItem, TaskPriority, TaskStatus, ValidationResult,
};

/// What a scripted plugin does when called.
#[derive(Debug, Clone)]
pub enum Behavior {
    /// Return one item per id.
    Items(Vec<&'static str>),
    /// Return a `PLUGIN_ERROR` envelope.
    Fail(&'static str),
    /// Panic inside the call.
    Panic,
    /// Sleep, then return one item per id.
    Slow(Duration, Vec<&'static str>),
}

/// Plugin whose responses are fixed at construction.
pub struct ScriptedPlugin {
    id: &'static str,
    kind: SourceKind,
    behavior: Behavior,
    health: Option<PluginHealthResult>,
    calls: Arc<AtomicUsize>,
}

impl ScriptedPlugin {
    pub fn new(id: &'static str, behavior: Behavior) -> Self {
        Self { id, kind: SourceKind::Manual, behavior, health: None, calls: Arc::default() }
    }

    pub fn with_kind(mut self, kind: SourceKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_health(mut self, health: PluginHealthResult) -> Self {
        self.health = Some(health);
        self
    }

    /// Shared counter of schedule and task calls.
    pub fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }

    async fn ids(&self) -> std::result::Result<Vec<&'static str>, &'static str> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.behavior {
            Behavior::Items(ids) => Ok(ids.clone()),
            Behavior::Fail(message) => Err(message),
            Behavior::Panic => panic!("scripted plugin {} exploded", self.id),
            Behavior::Slow(delay, ids) => {
                tokio::time::sleep(*delay).await;
                Ok(ids.clone())
            }
        }
    }
}

#[async_trait]
impl Plugin for ScriptedPlugin {
    fn id(&self) -> &str {
        self.id
    }

    fn name(&self) -> &str {
        self.id
    }

    fn version(&self) -> &str {
        "1.0.0"
    }

    fn kind(&self) -> SourceKind {
        self.kind
    }

    fn schema(&self) -> ConfigSchema {
        match self.kind {
            SourceKind::Manual => ConfigSchema::new(),
            _ => ConfigSchema::new().required("apiKey", ConfigFieldType::String, "API key"),
        }
    }

    async fn get_schedule(
        &self,
        _worker_id: &str,
        _range: &DateRange,
        _config: &PluginConfig,
    ) -> PluginResponse<StandardScheduleItem> {
        match self.ids().await {
            Ok(ids) => PluginResponse::ok(ids.into_iter().map(schedule_item).collect(), self.id, "1.0.0"),
            Err(message) => PluginResponse::failed(PluginError::plugin(message), self.id, "1.0.0"),
        }
    }

    async fn get_tasks(
        &self,
        _worker_id: &str,
        _config: &PluginConfig,
    ) -> PluginResponse<StandardTaskItem> {
        match self.ids().await {
            Ok(ids) => PluginResponse::ok(ids.into_iter().map(task_item).collect(), self.id, "1.0.0"),
            Err(message) => PluginResponse::failed(PluginError::plugin(message), self.id, "1.0.0"),
        }
    }

    async fn validate(&self, config: &PluginConfig) -> Result<ValidationResult> {
        Ok(match self.kind {
            SourceKind::Manual => ValidationResult::valid(),
            _ => ValidationResult::invalid(format!("{} credentials are required", config.name)),
        })
    }

    async fn health(&self) -> Option<PluginHealthResult> {
        self.health.clone()
    }
}

fn schedule_item(id: &str) -> StandardScheduleItem {
    let start = Utc.with_ymd_and_hms(2024, 1, 15, 9, 0, 0).unwrap();
    StandardScheduleItem {
        id: id.to_string(),
        title: format!("Shift {}", id),
        start_time: start,
        end_time: start + chrono::Duration::hours(8),
        location: None,
        description: None,
        metadata: ItemMetadata::new(),
    }
}

fn task_item(id: &str) -> StandardTaskItem {
    StandardTaskItem {
        id: id.to_string(),
        title: format!("Task {}", id),
        description: None,
        due_date: None,
        priority: TaskPriority::Medium,
        status: TaskStatus::Pending,
        metadata: None,
    }
}
