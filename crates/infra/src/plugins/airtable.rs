//! Airtable adapter
//!
//! Reads one table for schedule rows and one for tasks. Column names come
//! from the configured field mappings, which are resolved while fetching so
//! the transforms only see the mapped values.

use async_trait::async_trait;
use reqwest::Method;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::{debug, instrument, warn};
use url::Url;
use workdash_core::plugins::adapter::settings_mismatch;
use workdash_core::plugins::normalize::{
    combine_date_time, date_only, default_end, non_empty, normalize_priority, normalize_status,
    parse_timestamp,
};
use workdash_core::{PluginDescriptor, SourceAdapter};
use workdash_domain::constants::{AIRTABLE_PLUGIN_ID, MAX_PAGES, UNTITLED_SCHEDULE, UNTITLED_TASK};
use workdash_domain::{
    AirtableFieldMappings, AirtableSettings, ConfigFieldType, ConfigSchema, DateRange,
    ItemMetadata, PluginConfig, PluginSettings, Result, SourceKind, StandardScheduleItem,
    StandardTaskItem, ValidationResult, WorkdashError,
};

use super::{ensure_success, join_url, parse_base_url, probe_result, read_json};
use crate::http::HttpClient;

const AIRTABLE_API_BASE: &str = "https://api.airtable.com";
const KIND: SourceKind = SourceKind::Airtable;

/// Schedule row with mapped columns already resolved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AirtableScheduleRecord {
    pub id: String,
    pub created_time: Option<String>,
    pub title: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub end_time: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
}

/// Task row with mapped columns already resolved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AirtableTaskRecord {
    pub id: String,
    pub created_time: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub due_date: Option<String>,
    pub priority: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AirtableRecord {
    #[serde(default)]
    id: String,
    created_time: Option<String>,
    #[serde(default)]
    fields: Map<String, Value>,
}

impl AirtableRecord {
    fn text(&self, column: &str) -> Option<String> {
        self.fields.get(column).and_then(field_text)
    }

    fn into_schedule(self, mappings: &AirtableFieldMappings) -> AirtableScheduleRecord {
        AirtableScheduleRecord {
            title: self.text(&mappings.title),
            date: self.text(&mappings.date),
            time: self.text(&mappings.time),
            end_time: self.text(&mappings.end_time),
            location: self.text(&mappings.location),
            description: self.text(&mappings.description),
            id: self.id,
            created_time: self.created_time,
        }
    }

    fn into_task(self, mappings: &AirtableFieldMappings) -> AirtableTaskRecord {
        AirtableTaskRecord {
            title: self.text(&mappings.title),
            description: self.text(&mappings.description),
            due_date: self.text(&mappings.due_date),
            priority: self.text(&mappings.priority),
            status: self.text(&mappings.status),
            id: self.id,
            created_time: self.created_time,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RecordsPage {
    #[serde(default)]
    records: Vec<AirtableRecord>,
    offset: Option<String>,
}

/// Cell value as text. Lists (multi-select, lookups) are joined with `", "`,
/// collaborators and attachments contribute their name.
fn field_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => non_empty(Some(text.as_str())),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Array(values) => {
            let parts: Vec<String> = values.iter().filter_map(field_text).collect();
            (!parts.is_empty()).then(|| parts.join(", "))
        }
        Value::Object(object) => object
            .get("name")
            .or_else(|| object.get("filename"))
            .and_then(Value::as_str)
            .and_then(|name| non_empty(Some(name))),
        Value::Null => None,
    }
}

struct BaseTarget {
    api_key: String,
    base_id: String,
}

impl BaseTarget {
    fn from_settings(settings: &AirtableSettings) -> Result<Self> {
        match (non_empty(settings.api_key.as_deref()), non_empty(settings.base_id.as_deref())) {
            (Some(api_key), Some(base_id)) => Ok(Self { api_key, base_id }),
            _ => Err(WorkdashError::Config("Airtable API key and base ID are required".into())),
        }
    }
}

fn schedule_formula(mappings: &AirtableFieldMappings, worker_id: &str, range: &DateRange) -> String {
    format!(
        "AND({{{worker}}} = '{worker_id}', NOT(IS_BEFORE({{{date}}}, '{start}')), NOT(IS_AFTER({{{date}}}, '{end}')))",
        worker = mappings.worker,
        date = mappings.date,
        start = date_only(range.start()),
        end = date_only(range.end()),
    )
}

fn task_formula(mappings: &AirtableFieldMappings, worker_id: &str) -> String {
    format!("{{{worker}}} = '{worker_id}'", worker = mappings.worker)
}

/// Airtable REST adapter.
pub struct AirtablePlugin {
    descriptor: PluginDescriptor,
    http: HttpClient,
    base_url: Url,
}

impl AirtablePlugin {
    pub fn new(http: HttpClient) -> Result<Self> {
        Ok(Self {
            descriptor: PluginDescriptor::new(AIRTABLE_PLUGIN_ID, "Airtable", "1.0.0", KIND),
            http,
            base_url: parse_base_url(AIRTABLE_API_BASE)?,
        })
    }

    /// Point the adapter at another API root (tests, proxies).
    pub fn with_base_url(mut self, base_url: &str) -> Result<Self> {
        self.base_url = parse_base_url(base_url)?;
        Ok(self)
    }

    /// Every record of `table` matching `formula`, following `offset` cursors.
    async fn list_records(
        &self,
        target: &BaseTarget,
        table: &str,
        formula: &str,
    ) -> Result<Vec<AirtableRecord>> {
        let url = join_url(&self.base_url, &["v0", &target.base_id, table])?;

        let mut records = Vec::new();
        let mut offset: Option<String> = None;
        for _ in 0..MAX_PAGES {
            let mut query = vec![("filterByFormula", formula.to_string())];
            if let Some(cursor) = &offset {
                query.push(("offset", cursor.clone()));
            }

            let request = self
                .http
                .request(Method::GET, url.clone())
                .bearer_auth(&target.api_key)
                .query(&query);
            let response = ensure_success(self.http.send(request).await?, KIND).await?;
            let page: RecordsPage = read_json(response, KIND).await?;
            records.extend(page.records);

            match page.offset.filter(|cursor| !cursor.is_empty()) {
                Some(cursor) => offset = Some(cursor),
                None => return Ok(records),
            }
        }

        warn!(
            table,
            max_pages = MAX_PAGES,
            "Airtable pagination limit reached; remaining records ignored"
        );
        Ok(records)
    }

    async fn probe(&self, target: &BaseTarget, table: &str) -> Result<()> {
        let url = join_url(&self.base_url, &["v0", &target.base_id, table])?;
        let request = self
            .http
            .request(Method::GET, url)
            .bearer_auth(&target.api_key)
            .query(&[("maxRecords", "1")]);
        ensure_success(self.http.send(request).await?, KIND).await?;
        Ok(())
    }
}

fn settings_of(config: &PluginConfig) -> Result<&AirtableSettings> {
    match &config.settings {
        PluginSettings::Airtable(settings) => Ok(settings),
        other => Err(settings_mismatch(KIND, other.kind())),
    }
}

fn warn_on_quote(worker_id: &str) {
    if worker_id.contains('\'') {
        warn!(worker_id, "Worker id contains a quote; Airtable formula is not escaped");
    }
}

fn metadata(id: &str, created_time: Option<&str>) -> ItemMetadata {
    let mut metadata = ItemMetadata::new();
    metadata.insert("source".into(), json!(KIND.to_string()));
    metadata.insert("recordId".into(), json!(id));
    if let Some(created) = non_empty(created_time) {
        metadata.insert("createdTime".into(), json!(created));
    }
    metadata
}

#[async_trait]
impl SourceAdapter for AirtablePlugin {
    type ScheduleRecord = AirtableScheduleRecord;
    type TaskRecord = AirtableTaskRecord;

    fn descriptor(&self) -> &PluginDescriptor {
        &self.descriptor
    }

    fn config_schema(&self) -> ConfigSchema {
        ConfigSchema::new()
            .required("apiKey", ConfigFieldType::String, "Personal access token")
            .required("baseId", ConfigFieldType::String, "Base holding the schedule and task tables")
            .optional("scheduleTable", ConfigFieldType::String, "Schedule table name")
            .optional("taskTable", ConfigFieldType::String, "Task table name")
    }

    #[instrument(skip(self, range, config), fields(plugin_id = %self.descriptor.id))]
    async fn fetch_schedule(
        &self,
        worker_id: &str,
        range: &DateRange,
        config: &PluginConfig,
    ) -> Result<Vec<AirtableScheduleRecord>> {
        let settings = settings_of(config)?;
        let target = BaseTarget::from_settings(settings)?;
        warn_on_quote(worker_id);

        let mappings = &settings.field_mappings;
        let formula = schedule_formula(mappings, worker_id, range);
        let records = self.list_records(&target, &settings.schedule_table, &formula).await?;
        debug!(count = records.len(), "Fetched Airtable schedule records");
        Ok(records.into_iter().map(|record| record.into_schedule(mappings)).collect())
    }

    #[instrument(skip(self, config), fields(plugin_id = %self.descriptor.id))]
    async fn fetch_tasks(
        &self,
        worker_id: &str,
        config: &PluginConfig,
    ) -> Result<Vec<AirtableTaskRecord>> {
        let settings = settings_of(config)?;
        let target = BaseTarget::from_settings(settings)?;
        warn_on_quote(worker_id);

        let mappings = &settings.field_mappings;
        let formula = task_formula(mappings, worker_id);
        let records = self.list_records(&target, &settings.task_table, &formula).await?;
        debug!(count = records.len(), "Fetched Airtable task records");
        Ok(records.into_iter().map(|record| record.into_task(mappings)).collect())
    }

    fn transform_schedule_item(
        &self,
        raw: &AirtableScheduleRecord,
    ) -> Option<StandardScheduleItem> {
        let id = non_empty(Some(raw.id.as_str()))?;
        let date = non_empty(raw.date.as_deref())?;

        let start = match non_empty(raw.time.as_deref()) {
            Some(time) => combine_date_time(&date, &time)?,
            None => parse_timestamp(&date)?,
        };
        let end = match non_empty(raw.end_time.as_deref()) {
            Some(end_time) => combine_date_time(&date, &end_time)?,
            None => default_end(start),
        };
        if end < start {
            return None;
        }

        Some(StandardScheduleItem {
            metadata: metadata(&id, raw.created_time.as_deref()),
            id,
            title: non_empty(raw.title.as_deref()).unwrap_or_else(|| UNTITLED_SCHEDULE.to_string()),
            start_time: start,
            end_time: end,
            location: non_empty(raw.location.as_deref()),
            description: non_empty(raw.description.as_deref()),
        })
    }

    fn transform_task_item(&self, raw: &AirtableTaskRecord) -> Option<StandardTaskItem> {
        let id = non_empty(Some(raw.id.as_str()))?;

        Some(StandardTaskItem {
            metadata: Some(metadata(&id, raw.created_time.as_deref())),
            id,
            title: non_empty(raw.title.as_deref()).unwrap_or_else(|| UNTITLED_TASK.to_string()),
            description: non_empty(raw.description.as_deref()),
            due_date: raw.due_date.as_deref().and_then(parse_timestamp),
            priority: raw.priority.as_deref().map(normalize_priority).unwrap_or_default(),
            status: raw.status.as_deref().map(normalize_status).unwrap_or_default(),
        })
    }

    async fn validate_config(&self, config: &PluginConfig) -> Result<ValidationResult> {
        let settings = match settings_of(config) {
            Ok(settings) => settings,
            Err(error) => return Ok(ValidationResult::invalid(error.message())),
        };

        let mut errors = Vec::new();
        if non_empty(settings.api_key.as_deref()).is_none() {
            errors.push("API key is required".to_string());
        }
        if non_empty(settings.base_id.as_deref()).is_none() {
            errors.push("Base ID is required".to_string());
        }
        if !errors.is_empty() {
            return Ok(ValidationResult::from_errors(errors));
        }

        let target = BaseTarget::from_settings(settings)?;
        Ok(probe_result(KIND, self.probe(&target, &settings.schedule_table).await))
    }
}
