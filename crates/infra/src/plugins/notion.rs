//! Notion adapter
//!
//! Queries a schedule database and a task database. Page properties are
//! decoded into [`NotionProperty`] and read through a small per-type visitor,
//! then mapped by the configured property names while fetching.

use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::Method;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, instrument, warn};
use url::Url;
use workdash_core::plugins::adapter::settings_mismatch;
use workdash_core::plugins::normalize::{
    default_end, non_empty, normalize_priority, normalize_status, parse_timestamp, to_utc_string,
};
use workdash_core::{PluginDescriptor, SourceAdapter};
use workdash_domain::constants::{
    MAX_PAGES, NOTION_API_VERSION, NOTION_PLUGIN_ID, UNTITLED_SCHEDULE, UNTITLED_TASK,
};
use workdash_domain::{
    ConfigFieldType, ConfigSchema, DateRange, ItemMetadata, NotionPropertyMappings,
    NotionSettings, PluginConfig, PluginSettings, Result, SourceKind, StandardScheduleItem,
    StandardTaskItem, ValidationResult, WorkdashError,
};

use super::{ensure_success, join_url, parse_base_url, probe_result, read_json};
use crate::http::HttpClient;

const NOTION_API_BASE: &str = "https://api.notion.com";
const KIND: SourceKind = SourceKind::Notion;
const PAGE_SIZE: u32 = 100;

/// One segment of a Notion rich text array.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RichText {
    pub plain_text: Option<String>,
    pub text: Option<TextContent>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TextContent {
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SelectOption {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DateValue {
    pub start: Option<String>,
    pub end: Option<String>,
}

/// Page property value, keyed by its `type`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NotionProperty {
    Title {
        #[serde(default)]
        title: Vec<RichText>,
    },
    RichText {
        #[serde(default)]
        rich_text: Vec<RichText>,
    },
    Select {
        select: Option<SelectOption>,
    },
    Status {
        status: Option<SelectOption>,
    },
    Date {
        date: Option<DateValue>,
    },
    #[serde(other)]
    Unsupported,
}

impl NotionProperty {
    /// Text content of the property; a date yields its start.
    pub fn text(&self) -> Option<String> {
        match self {
            Self::Title { title: segments } | Self::RichText { rich_text: segments } => {
                let joined: String = segments.iter().filter_map(RichText::content).collect();
                non_empty(Some(joined.as_str()))
            }
            Self::Select { select: option } | Self::Status { status: option } => {
                option.as_ref().and_then(|option| non_empty(Some(option.name.as_str())))
            }
            Self::Date { date } => date.as_ref().and_then(|date| non_empty(date.start.as_deref())),
            Self::Unsupported => None,
        }
    }

    /// `(start, end)` of a date property.
    pub fn date_span(&self) -> Option<(String, Option<String>)> {
        match self {
            Self::Date { date: Some(date) } => {
                Some((non_empty(date.start.as_deref())?, non_empty(date.end.as_deref())))
            }
            _ => None,
        }
    }
}

impl RichText {
    fn content(&self) -> Option<&str> {
        self.plain_text.as_deref().or_else(|| self.text.as_ref().map(|text| text.content.as_str()))
    }
}

/// Database row as returned by a query.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NotionPage {
    pub id: String,
    pub created_time: Option<String>,
    pub url: Option<String>,
    #[serde(default)]
    pub properties: HashMap<String, NotionProperty>,
}

impl NotionPage {
    fn text(&self, property: &str) -> Option<String> {
        self.properties.get(property).and_then(NotionProperty::text)
    }

    fn into_schedule(self, mappings: &NotionPropertyMappings) -> NotionScheduleRecord {
        let span = self.properties.get(&mappings.date).and_then(NotionProperty::date_span);
        NotionScheduleRecord {
            title: self.text(&mappings.title),
            start: span.as_ref().map(|(start, _)| start.clone()),
            end: span.and_then(|(_, end)| end),
            location: self.text(&mappings.location),
            description: self.text(&mappings.description),
            id: self.id,
            created_time: self.created_time,
            url: self.url,
        }
    }

    fn into_task(self, mappings: &NotionPropertyMappings) -> NotionTaskRecord {
        NotionTaskRecord {
            title: self.text(&mappings.title),
            description: self.text(&mappings.description),
            due_date: self.text(&mappings.due_date),
            priority: self.text(&mappings.priority),
            status: self.text(&mappings.status),
            id: self.id,
            created_time: self.created_time,
            url: self.url,
        }
    }
}

/// Schedule page with mapped properties resolved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotionScheduleRecord {
    pub id: String,
    pub created_time: Option<String>,
    pub url: Option<String>,
    pub title: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
}

/// Task page with mapped properties resolved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotionTaskRecord {
    pub id: String,
    pub created_time: Option<String>,
    pub url: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub due_date: Option<String>,
    pub priority: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct QueryPage {
    #[serde(default)]
    results: Vec<NotionPage>,
    #[serde(default)]
    has_more: bool,
    next_cursor: Option<String>,
}

fn worker_condition(mappings: &NotionPropertyMappings, worker_id: &str) -> Value {
    json!({ "property": mappings.worker, "rich_text": { "equals": worker_id } })
}

fn schedule_filter(mappings: &NotionPropertyMappings, worker_id: &str, range: &DateRange) -> Value {
    json!({
        "and": [
            worker_condition(mappings, worker_id),
            { "property": mappings.date, "date": { "on_or_after": to_utc_string(range.start()) } },
            { "property": mappings.date, "date": { "on_or_before": to_utc_string(range.end()) } }
        ]
    })
}

fn task_filter(mappings: &NotionPropertyMappings, worker_id: &str) -> Value {
    json!({ "and": [worker_condition(mappings, worker_id)] })
}

fn required_config() -> WorkdashError {
    WorkdashError::Config("Notion integration secret and database ID are required".into())
}

/// Secret plus the database one call reads.
fn credentials(settings: &NotionSettings, database_id: Option<&str>) -> Result<(String, String)> {
    match (non_empty(settings.integration_secret.as_deref()), non_empty(database_id)) {
        (Some(secret), Some(database_id)) => Ok((secret, database_id)),
        _ => Err(required_config()),
    }
}

/// Notion database adapter.
pub struct NotionPlugin {
    descriptor: PluginDescriptor,
    http: HttpClient,
    base_url: Url,
}

impl NotionPlugin {
    pub fn new(http: HttpClient) -> Result<Self> {
        Ok(Self {
            descriptor: PluginDescriptor::new(NOTION_PLUGIN_ID, "Notion", "1.0.0", KIND),
            http,
            base_url: parse_base_url(NOTION_API_BASE)?,
        })
    }

    /// Point the adapter at another API root (tests, proxies).
    pub fn with_base_url(mut self, base_url: &str) -> Result<Self> {
        self.base_url = parse_base_url(base_url)?;
        Ok(self)
    }

    async fn query_database(
        &self,
        secret: &str,
        database_id: &str,
        filter: Value,
    ) -> Result<Vec<NotionPage>> {
        let url = join_url(&self.base_url, &["v1", "databases", database_id, "query"])?;

        let mut pages = Vec::new();
        let mut cursor: Option<String> = None;
        for _ in 0..MAX_PAGES {
            let mut body = json!({ "filter": &filter, "page_size": PAGE_SIZE });
            if let Some(cursor) = &cursor {
                body["start_cursor"] = json!(cursor);
            }

            let request = self
                .http
                .request(Method::POST, url.clone())
                .bearer_auth(secret)
                .header("Notion-Version", NOTION_API_VERSION)
                .json(&body);
            let response = ensure_success(self.http.send(request).await?, KIND).await?;
            let page: QueryPage = read_json(response, KIND).await?;
            pages.extend(page.results);

            match page.next_cursor.filter(|next| page.has_more && !next.is_empty()) {
                Some(next) => cursor = Some(next),
                None => return Ok(pages),
            }
        }

        warn!(
            database_id,
            max_pages = MAX_PAGES,
            "Notion pagination limit reached; remaining pages ignored"
        );
        Ok(pages)
    }

    async fn probe(&self, secret: &str, database_id: &str) -> Result<()> {
        let url = join_url(&self.base_url, &["v1", "databases", database_id])?;
        let request = self
            .http
            .request(Method::GET, url)
            .bearer_auth(secret)
            .header("Notion-Version", NOTION_API_VERSION);
        ensure_success(self.http.send(request).await?, KIND).await?;
        Ok(())
    }
}

fn settings_of(config: &PluginConfig) -> Result<&NotionSettings> {
    match &config.settings {
        PluginSettings::Notion(settings) => Ok(settings),
        other => Err(settings_mismatch(KIND, other.kind())),
    }
}

fn metadata(id: &str, created_time: Option<&str>, url: Option<&str>) -> ItemMetadata {
    let mut metadata = ItemMetadata::new();
    metadata.insert("source".into(), json!(KIND.to_string()));
    metadata.insert("pageId".into(), json!(id));
    if let Some(created) = non_empty(created_time) {
        metadata.insert("createdTime".into(), json!(created));
    }
    if let Some(url) = non_empty(url) {
        metadata.insert("url".into(), json!(url));
    }
    metadata
}

#[async_trait]
impl SourceAdapter for NotionPlugin {
    type ScheduleRecord = NotionScheduleRecord;
    type TaskRecord = NotionTaskRecord;

    fn descriptor(&self) -> &PluginDescriptor {
        &self.descriptor
    }

    fn config_schema(&self) -> ConfigSchema {
        ConfigSchema::new()
            .required("integrationSecret", ConfigFieldType::String, "Internal integration secret")
            .optional("scheduleDatabaseId", ConfigFieldType::String, "Database holding schedule pages")
            .optional("taskDatabaseId", ConfigFieldType::String, "Database holding task pages")
    }

    #[instrument(skip(self, range, config), fields(plugin_id = %self.descriptor.id))]
    async fn fetch_schedule(
        &self,
        worker_id: &str,
        range: &DateRange,
        config: &PluginConfig,
    ) -> Result<Vec<NotionScheduleRecord>> {
        let settings = settings_of(config)?;
        let (secret, database_id) =
            credentials(settings, settings.schedule_database_id.as_deref())?;

        let mappings = &settings.property_mappings;
        let filter = schedule_filter(mappings, worker_id, range);
        let pages = self.query_database(&secret, &database_id, filter).await?;
        debug!(count = pages.len(), "Fetched Notion schedule pages");
        Ok(pages.into_iter().map(|page| page.into_schedule(mappings)).collect())
    }

    #[instrument(skip(self, config), fields(plugin_id = %self.descriptor.id))]
    async fn fetch_tasks(
        &self,
        worker_id: &str,
        config: &PluginConfig,
    ) -> Result<Vec<NotionTaskRecord>> {
        let settings = settings_of(config)?;
        let (secret, database_id) = credentials(settings, settings.task_database_id.as_deref())?;

        let mappings = &settings.property_mappings;
        let filter = task_filter(mappings, worker_id);
        let pages = self.query_database(&secret, &database_id, filter).await?;
        debug!(count = pages.len(), "Fetched Notion task pages");
        Ok(pages.into_iter().map(|page| page.into_task(mappings)).collect())
    }

    fn transform_schedule_item(&self, raw: &NotionScheduleRecord) -> Option<StandardScheduleItem> {
        let id = non_empty(Some(raw.id.as_str()))?;
        let start = raw.start.as_deref().and_then(parse_timestamp)?;
        let end = match non_empty(raw.end.as_deref()) {
            Some(end) => parse_timestamp(&end)?,
            None => default_end(start),
        };
        if end < start {
            return None;
        }

        Some(StandardScheduleItem {
            metadata: metadata(&id, raw.created_time.as_deref(), raw.url.as_deref()),
            id,
            title: non_empty(raw.title.as_deref()).unwrap_or_else(|| UNTITLED_SCHEDULE.to_string()),
            start_time: start,
            end_time: end,
            location: non_empty(raw.location.as_deref()),
            description: non_empty(raw.description.as_deref()),
        })
    }

    fn transform_task_item(&self, raw: &NotionTaskRecord) -> Option<StandardTaskItem> {
        let id = non_empty(Some(raw.id.as_str()))?;

        Some(StandardTaskItem {
            metadata: Some(metadata(&id, raw.created_time.as_deref(), raw.url.as_deref())),
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

        let database_id = non_empty(settings.schedule_database_id.as_deref())
            .or_else(|| non_empty(settings.task_database_id.as_deref()));
        let mut errors = Vec::new();
        if non_empty(settings.integration_secret.as_deref()).is_none() {
            errors.push("Integration secret is required".to_string());
        }
        if database_id.is_none() {
            errors.push("Schedule or task database ID is required".to_string());
        }
        if !errors.is_empty() {
            return Ok(ValidationResult::from_errors(errors));
        }

        let (secret, database_id) = credentials(settings, database_id.as_deref())?;
        Ok(probe_result(KIND, self.probe(&secret, &database_id).await))
    }
}
