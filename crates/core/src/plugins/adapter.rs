//! Source adapter contract
//!
//! [`SourceAdapter`] is what each integration implements: fetch raw records
//! from its service and transform them one by one into standard items.
//! [`run_schedule`] and [`run_tasks`] drive that pipeline and always produce
//! an envelope, so fetch failures never escape to the caller.
//!
//! [`Plugin`] is the object-safe face stored in the registry. Every
//! `SourceAdapter` is a `Plugin` through the blanket implementation below.

use async_trait::async_trait;
use tracing::{debug, warn};
use workdash_domain::{
    ConfigSchema, DateRange, PluginConfig, PluginError, PluginHealthResult, PluginResponse,
    Result, SourceKind, StandardScheduleItem, StandardTaskItem, ValidationResult, WorkdashError,
};

/// Constant identity of an adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginDescriptor {
    pub id: String,
    pub name: String,
    pub version: String,
    pub kind: SourceKind,
}

impl PluginDescriptor {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        version: impl Into<String>,
        kind: SourceKind,
    ) -> Self {
        Self { id: id.into(), name: name.into(), version: version.into(), kind }
    }
}

/// Adapter-specific half of a plugin.
///
/// Transforms must be pure: no I/O and no clock reads, so transforming the
/// same record twice yields equal output. A transform returns `None` for a
/// record that lacks required fields; the runner drops it.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Raw schedule record as returned by the service.
    type ScheduleRecord: Send + Sync;
    /// Raw task record as returned by the service.
    type TaskRecord: Send + Sync;

    fn descriptor(&self) -> &PluginDescriptor;

    /// Settings keys this adapter understands.
    fn config_schema(&self) -> ConfigSchema;

    async fn fetch_schedule(
        &self,
        worker_id: &str,
        range: &DateRange,
        config: &PluginConfig,
    ) -> Result<Vec<Self::ScheduleRecord>>;

    async fn fetch_tasks(
        &self,
        worker_id: &str,
        config: &PluginConfig,
    ) -> Result<Vec<Self::TaskRecord>>;

    fn transform_schedule_item(&self, raw: &Self::ScheduleRecord) -> Option<StandardScheduleItem>;

    fn transform_task_item(&self, raw: &Self::TaskRecord) -> Option<StandardTaskItem>;

    /// Check credentials and, when they are present, connectivity.
    async fn validate_config(&self, config: &PluginConfig) -> Result<ValidationResult>;

    /// Adapter-specific health probe. `None` lets the manager fall back to
    /// config validation.
    async fn health_check(&self) -> Option<PluginHealthResult> {
        None
    }
}

/// Object-safe plugin interface held by the registry.
#[async_trait]
pub trait Plugin: Send + Sync {
    fn id(&self) -> &str;

    fn name(&self) -> &str;

    fn version(&self) -> &str;

    fn kind(&self) -> SourceKind;

    fn schema(&self) -> ConfigSchema;

    async fn get_schedule(
        &self,
        worker_id: &str,
        range: &DateRange,
        config: &PluginConfig,
    ) -> PluginResponse<StandardScheduleItem>;

    async fn get_tasks(&self, worker_id: &str, config: &PluginConfig)
        -> PluginResponse<StandardTaskItem>;

    async fn validate(&self, config: &PluginConfig) -> Result<ValidationResult>;

    async fn health(&self) -> Option<PluginHealthResult>;
}

#[async_trait]
impl<A> Plugin for A
where
    A: SourceAdapter,
{
    fn id(&self) -> &str {
        &self.descriptor().id
    }

    fn name(&self) -> &str {
        &self.descriptor().name
    }

    fn version(&self) -> &str {
        &self.descriptor().version
    }

    fn kind(&self) -> SourceKind {
        self.descriptor().kind
    }

    fn schema(&self) -> ConfigSchema {
        self.config_schema()
    }

    async fn get_schedule(
        &self,
        worker_id: &str,
        range: &DateRange,
        config: &PluginConfig,
    ) -> PluginResponse<StandardScheduleItem> {
        run_schedule(self, worker_id, range, config).await
    }

    async fn get_tasks(
        &self,
        worker_id: &str,
        config: &PluginConfig,
    ) -> PluginResponse<StandardTaskItem> {
        run_tasks(self, worker_id, config).await
    }

    async fn validate(&self, config: &PluginConfig) -> Result<ValidationResult> {
        self.validate_config(config).await
    }

    async fn health(&self) -> Option<PluginHealthResult> {
        self.health_check().await
    }
}

/// Fetch, transform and wrap schedule items for one worker.
pub async fn run_schedule<A>(
    adapter: &A,
    worker_id: &str,
    range: &DateRange,
    config: &PluginConfig,
) -> PluginResponse<StandardScheduleItem>
where
    A: SourceAdapter + ?Sized,
{
    let descriptor = adapter.descriptor();
    match adapter.fetch_schedule(worker_id, range, config).await {
        Ok(records) => {
            let items: Vec<_> =
                records.iter().filter_map(|raw| adapter.transform_schedule_item(raw)).collect();
            log_dropped(descriptor, "schedule", records.len(), items.len());
            PluginResponse::ok(items, &descriptor.id, &descriptor.version)
        }
        Err(error) => failure(descriptor, "schedule", &error),
    }
}

/// Fetch, transform and wrap task items for one worker.
pub async fn run_tasks<A>(
    adapter: &A,
    worker_id: &str,
    config: &PluginConfig,
) -> PluginResponse<StandardTaskItem>
where
    A: SourceAdapter + ?Sized,
{
    let descriptor = adapter.descriptor();
    match adapter.fetch_tasks(worker_id, config).await {
        Ok(records) => {
            let items: Vec<_> =
                records.iter().filter_map(|raw| adapter.transform_task_item(raw)).collect();
            log_dropped(descriptor, "tasks", records.len(), items.len());
            PluginResponse::ok(items, &descriptor.id, &descriptor.version)
        }
        Err(error) => failure(descriptor, "tasks", &error),
    }
}

/// Error raised by an adapter handed settings for another source.
pub fn settings_mismatch(expected: SourceKind, received: SourceKind) -> WorkdashError {
    WorkdashError::Config(format!(
        "{} plugin received settings for '{}'",
        expected.display_name(),
        received
    ))
}

fn log_dropped(descriptor: &PluginDescriptor, operation: &str, fetched: usize, kept: usize) {
    if kept < fetched {
        debug!(
            plugin_id = %descriptor.id,
            operation,
            fetched,
            dropped = fetched - kept,
            "Dropped records that failed transformation"
        );
    }
}

fn failure<T>(
    descriptor: &PluginDescriptor,
    operation: &str,
    error: &WorkdashError,
) -> PluginResponse<T> {
    warn!(
        plugin_id = %descriptor.id,
        operation,
        error_type = error.label(),
        error = %error,
        "Plugin fetch failed"
    );
    PluginResponse::failed(PluginError::plugin(error.message()), &descriptor.id, &descriptor.version)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use chrono::{TimeZone, Utc};
    use workdash_domain::{
        ItemMetadata, ManualSettings, PluginErrorCode, PluginSettings, TaskPriority, TaskStatus,
    };

    use super::*;

    struct FixtureAdapter {
        descriptor: PluginDescriptor,
        fail_with: Option<WorkdashError>,
        transforms: AtomicUsize,
    }

    impl FixtureAdapter {
        fn new(fail_with: Option<WorkdashError>) -> Self {
            Self {
                descriptor: PluginDescriptor::new("fixture", "Fixture", "2.1.0", SourceKind::Manual),
                fail_with,
                transforms: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl SourceAdapter for FixtureAdapter {
        type ScheduleRecord = (String, i64);
        type TaskRecord = Option<String>;

        fn descriptor(&self) -> &PluginDescriptor {
            &self.descriptor
        }

        fn config_schema(&self) -> ConfigSchema {
            ConfigSchema::new()
        }

        async fn fetch_schedule(
            &self,
            _worker_id: &str,
            _range: &DateRange,
            _config: &PluginConfig,
        ) -> Result<Vec<Self::ScheduleRecord>> {
            match &self.fail_with {
                Some(error) => Err(error.clone()),
                None => Ok(vec![("a".into(), 1), ("bad".into(), -1), ("b".into(), 2)]),
            }
        }

        async fn fetch_tasks(
            &self,
            _worker_id: &str,
            _config: &PluginConfig,
        ) -> Result<Vec<Self::TaskRecord>> {
            Ok(vec![Some("Write report".into()), None])
        }

        fn transform_schedule_item(
            &self,
            raw: &Self::ScheduleRecord,
        ) -> Option<StandardScheduleItem> {
            self.transforms.fetch_add(1, Ordering::SeqCst);
            let (id, hours) = raw;
            let start = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).single()?;
            let end = start + chrono::Duration::hours(*hours);
            let item = StandardScheduleItem {
                id: id.clone(),
                title: "Shift".into(),
                start_time: start,
                end_time: end,
                location: None,
                description: None,
                metadata: ItemMetadata::new(),
            };
            item.is_well_formed().then_some(item)
        }

        fn transform_task_item(&self, raw: &Self::TaskRecord) -> Option<StandardTaskItem> {
            let title = raw.clone()?;
            Some(StandardTaskItem {
                id: title.to_lowercase(),
                title,
                description: None,
                due_date: None,
                priority: TaskPriority::Medium,
                status: TaskStatus::Pending,
                metadata: None,
            })
        }

        async fn validate_config(&self, _config: &PluginConfig) -> Result<ValidationResult> {
            Ok(ValidationResult::valid())
        }
    }

    fn config() -> PluginConfig {
        PluginConfig::new("fixture", "Fixture", "2.1.0", PluginSettings::Manual(ManualSettings::default()))
    }

    fn range() -> DateRange {
        DateRange::from_start(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(), 7)
    }

    #[tokio::test]
    async fn invalid_records_are_dropped_from_success_envelope() {
        let adapter = FixtureAdapter::new(None);
        let response = run_schedule(&adapter, "w1", &range(), &config()).await;

        assert!(response.success);
        assert!(response.errors.is_none());
        let ids: Vec<_> = response.data.iter().map(|item| item.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(adapter.transforms.load(Ordering::SeqCst), 3);
        assert_eq!(response.metadata.source, "fixture");
        assert_eq!(response.metadata.version, "2.1.0");
    }

    #[tokio::test]
    async fn fetch_failure_becomes_retryable_plugin_error() {
        let adapter = FixtureAdapter::new(Some(WorkdashError::Config(
            "Airtable API key and base ID are required".into(),
        )));
        let response = run_schedule(&adapter, "w1", &range(), &config()).await;

        assert!(!response.success);
        assert!(response.data.is_empty());
        let error = response.first_error().expect("one error");
        assert_eq!(error.code, PluginErrorCode::PluginError);
        assert!(error.retryable);
        assert_eq!(error.message, "Airtable API key and base ID are required");
        assert_eq!(adapter.transforms.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn blanket_plugin_delegates_to_adapter() {
        let adapter = FixtureAdapter::new(None);
        let plugin: &dyn Plugin = &adapter;

        assert_eq!(plugin.id(), "fixture");
        assert_eq!(plugin.kind(), SourceKind::Manual);
        assert!(plugin.health().await.is_none());

        let tasks = plugin.get_tasks("w1", &config()).await;
        assert_eq!(tasks.item_count(), 1);
        assert_eq!(tasks.data[0].title, "Write report");
    }

    #[test]
    fn settings_mismatch_names_both_sources() {
        let error = settings_mismatch(SourceKind::Notion, SourceKind::Airtable);
        assert_eq!(error.message(), "Notion plugin received settings for 'airtable'");
    }
}
