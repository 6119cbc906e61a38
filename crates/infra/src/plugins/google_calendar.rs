//! Google Calendar adapter
//!
//! Schedule items are the events of one calendar inside the requested range.
//! Google has no task list of its own here, so tasks are the events of the
//! next [`TASK_LOOKAHEAD_DAYS`] days whose summary or description carries a
//! task marker (`Task:`, `TODO:`) or the word "task".

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::{Method, RequestBuilder};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, instrument, warn};
use url::Url;
use workdash_core::plugins::adapter::settings_mismatch;
use workdash_core::plugins::normalize::{non_empty, parse_timestamp};
use workdash_core::{PluginDescriptor, SourceAdapter};
use workdash_domain::constants::{
    GOOGLE_CALENDAR_PLUGIN_ID, MAX_PAGES, TASK_LOOKAHEAD_DAYS, UNTITLED_EVENT,
};
use workdash_domain::{
    ConfigFieldType, ConfigSchema, DateRange, GoogleCalendarSettings, ItemMetadata, PluginConfig,
    PluginSettings, Result, SourceKind, StandardScheduleItem, StandardTaskItem, TaskPriority,
    TaskStatus, ValidationResult, WorkdashError,
};

use super::{ensure_success, join_url, parse_base_url, probe_result, read_json};
use crate::http::HttpClient;

const GOOGLE_CALENDAR_API_BASE: &str = "https://www.googleapis.com/calendar/v3";
const KIND: SourceKind = SourceKind::GoogleCalendar;

static TASK_WORD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\btask\b").expect("task word pattern should compile - this is a bug")
});

/// Event as returned by `events.list`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleEvent {
    #[serde(default)]
    pub id: String,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    /// `confirmed`, `tentative` or `cancelled`.
    pub status: Option<String>,
    pub html_link: Option<String>,
    pub start: Option<EventDateTime>,
    pub end: Option<EventDateTime>,
}

/// Either a timed (`dateTime`) or an all-day (`date`) boundary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDateTime {
    pub date_time: Option<String>,
    pub date: Option<String>,
}

impl EventDateTime {
    fn instant(&self) -> Option<DateTime<Utc>> {
        self.date_time
            .as_deref()
            .and_then(parse_timestamp)
            .or_else(|| self.date.as_deref().and_then(parse_timestamp))
    }

    fn is_all_day(&self) -> bool {
        self.date_time.is_none() && self.date.is_some()
    }
}

/// Event selected as a task, with the marker its summary starts with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoogleTaskEvent {
    pub event: GoogleEvent,
    pub marker: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventsPage {
    #[serde(default)]
    items: Vec<GoogleEvent>,
    next_page_token: Option<String>,
}

enum Credentials {
    Bearer(String),
    ApiKey(String),
}

impl Credentials {
    fn apply(&self, request: RequestBuilder) -> RequestBuilder {
        match self {
            Self::Bearer(token) => request.bearer_auth(token),
            Self::ApiKey(key) => request.query(&[("key", key.as_str())]),
        }
    }
}

struct CalendarTarget {
    calendar_id: String,
    credentials: Credentials,
}

impl CalendarTarget {
    fn from_settings(settings: &GoogleCalendarSettings) -> Result<Self> {
        let calendar_id = non_empty(settings.calendar_id.as_deref());
        let credentials = non_empty(settings.access_token.as_deref())
            .map(Credentials::Bearer)
            .or_else(|| non_empty(settings.api_key.as_deref()).map(Credentials::ApiKey));

        match (calendar_id, credentials) {
            (Some(calendar_id), Some(credentials)) => Ok(Self { calendar_id, credentials }),
            _ => Err(WorkdashError::Config(
                "Google Calendar credentials and calendar ID are required".into(),
            )),
        }
    }
}

/// Google Calendar v3 adapter.
pub struct GoogleCalendarPlugin {
    descriptor: PluginDescriptor,
    http: HttpClient,
    base_url: Url,
}

impl GoogleCalendarPlugin {
    pub fn new(http: HttpClient) -> Result<Self> {
        Ok(Self {
            descriptor: PluginDescriptor::new(
                GOOGLE_CALENDAR_PLUGIN_ID,
                "Google Calendar",
                "1.0.0",
                KIND,
            ),
            http,
            base_url: parse_base_url(GOOGLE_CALENDAR_API_BASE)?,
        })
    }

    /// Point the adapter at another API root (tests, proxies).
    pub fn with_base_url(mut self, base_url: &str) -> Result<Self> {
        self.base_url = parse_base_url(base_url)?;
        Ok(self)
    }

    async fn list_events(
        &self,
        target: &CalendarTarget,
        range: &DateRange,
    ) -> Result<Vec<GoogleEvent>> {
        let url = join_url(&self.base_url, &["calendars", &target.calendar_id, "events"])?;
        let (time_min, time_max) = range.to_rfc3339();

        let mut events = Vec::new();
        let mut page_token: Option<String> = None;
        for _ in 0..MAX_PAGES {
            let mut query = vec![
                ("timeMin", time_min.clone()),
                ("timeMax", time_max.clone()),
                ("singleEvents", "true".to_string()),
                ("orderBy", "startTime".to_string()),
            ];
            if let Some(token) = &page_token {
                query.push(("pageToken", token.clone()));
            }

            let request =
                target.credentials.apply(self.http.request(Method::GET, url.clone()).query(&query));
            let response = ensure_success(self.http.send(request).await?, KIND).await?;
            let page: EventsPage = read_json(response, KIND).await?;
            events.extend(page.items);

            match page.next_page_token.filter(|token| !token.is_empty()) {
                Some(token) => page_token = Some(token),
                None => return Ok(events),
            }
        }

        warn!(
            calendar_id = %target.calendar_id,
            max_pages = MAX_PAGES,
            "Google Calendar pagination limit reached; remaining events ignored"
        );
        Ok(events)
    }

    async fn probe(&self, target: &CalendarTarget) -> Result<()> {
        let url = join_url(&self.base_url, &["calendars", &target.calendar_id])?;
        let request = target.credentials.apply(self.http.request(Method::GET, url));
        ensure_success(self.http.send(request).await?, KIND).await?;
        Ok(())
    }
}

fn settings_of(config: &PluginConfig) -> Result<&GoogleCalendarSettings> {
    match &config.settings {
        PluginSettings::GoogleCalendar(settings) => Ok(settings),
        other => Err(settings_mismatch(KIND, other.kind())),
    }
}

/// Select `event` as a task when it carries a marker or the word "task".
fn as_task(event: GoogleEvent, markers: &[String]) -> Option<GoogleTaskEvent> {
    let summary = event.summary.as_deref().unwrap_or_default();
    let description = event.description.as_deref().unwrap_or_default();
    let markers: Vec<&str> =
        markers.iter().map(String::as_str).filter(|marker| !marker.is_empty()).collect();

    let leading = markers
        .iter()
        .find(|marker| summary.trim_start().starts_with(*marker))
        .map(|marker| marker.to_string());
    let marked = leading.is_some()
        || markers.iter().any(|marker| summary.contains(marker) || description.contains(marker))
        || TASK_WORD.is_match(summary)
        || TASK_WORD.is_match(description);

    marked.then_some(GoogleTaskEvent { event, marker: leading })
}

fn strip_marker(summary: &str, marker: Option<&str>) -> String {
    let trimmed = summary.trim();
    marker
        .and_then(|marker| trimmed.strip_prefix(marker))
        .and_then(|rest| non_empty(Some(rest)))
        .unwrap_or_else(|| trimmed.to_string())
}

#[async_trait]
impl SourceAdapter for GoogleCalendarPlugin {
    type ScheduleRecord = GoogleEvent;
    type TaskRecord = GoogleTaskEvent;

    fn descriptor(&self) -> &PluginDescriptor {
        &self.descriptor
    }

    fn config_schema(&self) -> ConfigSchema {
        ConfigSchema::new()
            .required("calendarId", ConfigFieldType::String, "Calendar to read events from")
            .optional("accessToken", ConfigFieldType::String, "OAuth access token")
            .optional("apiKey", ConfigFieldType::String, "API key, used without an access token")
            .optional("taskMarkers", ConfigFieldType::StringList, "Prefixes that mark a task")
    }

    #[instrument(skip(self, range, config), fields(plugin_id = %self.descriptor.id))]
    async fn fetch_schedule(
        &self,
        worker_id: &str,
        range: &DateRange,
        config: &PluginConfig,
    ) -> Result<Vec<GoogleEvent>> {
        let target = CalendarTarget::from_settings(settings_of(config)?)?;
        let events = self.list_events(&target, range).await?;
        debug!(count = events.len(), "Fetched Google Calendar events");
        Ok(events)
    }

    #[instrument(skip(self, config), fields(plugin_id = %self.descriptor.id))]
    async fn fetch_tasks(
        &self,
        worker_id: &str,
        config: &PluginConfig,
    ) -> Result<Vec<GoogleTaskEvent>> {
        let settings = settings_of(config)?;
        let target = CalendarTarget::from_settings(settings)?;
        let window = DateRange::from_start(Utc::now(), TASK_LOOKAHEAD_DAYS);

        let events = self.list_events(&target, &window).await?;
        let fetched = events.len();
        let tasks: Vec<_> =
            events.into_iter().filter_map(|event| as_task(event, &settings.task_markers)).collect();
        debug!(fetched, tasks = tasks.len(), "Selected task-like Google Calendar events");
        Ok(tasks)
    }

    fn transform_schedule_item(&self, raw: &GoogleEvent) -> Option<StandardScheduleItem> {
        let id = non_empty(Some(raw.id.as_str()))?;
        let start_boundary = raw.start.as_ref()?;
        let start = start_boundary.instant()?;
        let end = raw.end.as_ref()?.instant()?;
        if start > end {
            return None;
        }

        let mut metadata = ItemMetadata::new();
        metadata.insert("source".into(), json!(KIND.to_string()));
        metadata.insert("eventId".into(), json!(id));
        if let Some(link) = non_empty(raw.html_link.as_deref()) {
            metadata.insert("htmlLink".into(), json!(link));
        }
        metadata.insert("allDay".into(), json!(start_boundary.is_all_day()));

        Some(StandardScheduleItem {
            id,
            title: non_empty(raw.summary.as_deref()).unwrap_or_else(|| UNTITLED_EVENT.to_string()),
            start_time: start,
            end_time: end,
            location: non_empty(raw.location.as_deref()),
            description: non_empty(raw.description.as_deref()),
            metadata,
        })
    }

    fn transform_task_item(&self, raw: &GoogleTaskEvent) -> Option<StandardTaskItem> {
        let event = &raw.event;
        let id = non_empty(Some(event.id.as_str()))?;
        let summary = non_empty(event.summary.as_deref())?;

        let due_date = event
            .end
            .as_ref()
            .and_then(EventDateTime::instant)
            .or_else(|| event.start.as_ref().and_then(EventDateTime::instant));
        let status = match event.status.as_deref() {
            Some("cancelled") => TaskStatus::Cancelled,
            _ => TaskStatus::Pending,
        };

        let mut metadata = ItemMetadata::new();
        metadata.insert("source".into(), json!(KIND.to_string()));
        metadata.insert("eventId".into(), json!(id));

        Some(StandardTaskItem {
            id,
            title: strip_marker(&summary, raw.marker.as_deref()),
            description: non_empty(event.description.as_deref()),
            due_date,
            priority: TaskPriority::Medium,
            status,
            metadata: Some(metadata),
        })
    }

    async fn validate_config(&self, config: &PluginConfig) -> Result<ValidationResult> {
        let settings = match settings_of(config) {
            Ok(settings) => settings,
            Err(error) => return Ok(ValidationResult::invalid(error.message())),
        };

        let mut errors = Vec::new();
        if non_empty(settings.calendar_id.as_deref()).is_none() {
            errors.push("Calendar ID is required".to_string());
        }
        if non_empty(settings.access_token.as_deref()).is_none()
            && non_empty(settings.api_key.as_deref()).is_none()
        {
            errors.push("Access token or API key is required".to_string());
        }
        if !errors.is_empty() {
            return Ok(ValidationResult::from_errors(errors));
        }

        let target = CalendarTarget::from_settings(settings)?;
        Ok(probe_result(KIND, self.probe(&target).await))
    }
}
