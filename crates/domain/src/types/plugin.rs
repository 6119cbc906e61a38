//! Plugin configuration types
//!
//! Settings are a tagged union keyed by `source`, one strongly typed struct
//! per adapter. Shape errors (wrong types, unknown source) surface when a
//! config is built or deserialized; presence of credentials is checked by the
//! adapter at call time so its messages stay specific.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
#[cfg(feature = "ts-gen")]
use ts_rs::TS;

use crate::errors::{Result, WorkdashError};
use crate::impl_wire_name_conversions;

/// The external system an adapter talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "ts-gen", derive(TS))]
#[cfg_attr(feature = "ts-gen", ts(export, rename_all = "snake_case"))]
pub enum SourceKind {
    GoogleCalendar,
    Airtable,
    Notion,
    Manual,
}

impl_wire_name_conversions!(SourceKind {
    GoogleCalendar => "google_calendar",
    Airtable => "airtable",
    Notion => "notion",
    Manual => "manual",
});

impl SourceKind {
    /// Human readable name used in error messages.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::GoogleCalendar => "Google Calendar",
            Self::Airtable => "Airtable",
            Self::Notion => "Notion",
            Self::Manual => "Manual",
        }
    }
}

fn default_task_markers() -> Vec<String> {
    vec!["Task:".to_string(), "TODO:".to_string()]
}

/// Google Calendar credentials and options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "ts-gen", derive(TS))]
#[cfg_attr(feature = "ts-gen", ts(export, rename_all = "camelCase"))]
pub struct GoogleCalendarSettings {
    /// OAuth bearer token; preferred over `api_key` when both are set.
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub calendar_id: Option<String>,
    /// Summary/description prefixes that mark an event as a task.
    #[serde(default = "default_task_markers")]
    pub task_markers: Vec<String>,
}

impl Default for GoogleCalendarSettings {
    fn default() -> Self {
        Self {
            access_token: None,
            api_key: None,
            calendar_id: None,
            task_markers: default_task_markers(),
        }
    }
}

/// Airtable column names, overridable per organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
#[cfg_attr(feature = "ts-gen", derive(TS))]
#[cfg_attr(feature = "ts-gen", ts(export, rename_all = "camelCase"))]
pub struct AirtableFieldMappings {
    pub worker: String,
    pub date: String,
    pub time: String,
    pub end_time: String,
    pub title: String,
    pub location: String,
    pub description: String,
    pub due_date: String,
    pub priority: String,
    pub status: String,
}

impl Default for AirtableFieldMappings {
    fn default() -> Self {
        Self {
            worker: "Worker".into(),
            date: "Date".into(),
            time: "Time".into(),
            end_time: "End Time".into(),
            title: "Title".into(),
            location: "Location".into(),
            description: "Description".into(),
            due_date: "Due Date".into(),
            priority: "Priority".into(),
            status: "Status".into(),
        }
    }
}

fn default_schedule_table() -> String {
    "Schedule".to_string()
}

fn default_task_table() -> String {
    "Tasks".to_string()
}

/// Airtable credentials, tables and column mappings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "ts-gen", derive(TS))]
#[cfg_attr(feature = "ts-gen", ts(export, rename_all = "camelCase"))]
pub struct AirtableSettings {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub base_id: Option<String>,
    #[serde(default = "default_schedule_table")]
    pub schedule_table: String,
    #[serde(default = "default_task_table")]
    pub task_table: String,
    #[serde(default)]
    pub field_mappings: AirtableFieldMappings,
}

impl Default for AirtableSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            base_id: None,
            schedule_table: default_schedule_table(),
            task_table: default_task_table(),
            field_mappings: AirtableFieldMappings::default(),
        }
    }
}

/// Notion property names, overridable per organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
#[cfg_attr(feature = "ts-gen", derive(TS))]
#[cfg_attr(feature = "ts-gen", ts(export, rename_all = "camelCase"))]
pub struct NotionPropertyMappings {
    pub worker: String,
    pub date: String,
    pub title: String,
    pub location: String,
    pub description: String,
    pub due_date: String,
    pub priority: String,
    pub status: String,
}

impl Default for NotionPropertyMappings {
    fn default() -> Self {
        Self {
            worker: "Worker".into(),
            date: "Date".into(),
            title: "Name".into(),
            location: "Location".into(),
            description: "Description".into(),
            due_date: "Due Date".into(),
            priority: "Priority".into(),
            status: "Status".into(),
        }
    }
}

/// Notion integration secret, databases and property mappings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "ts-gen", derive(TS))]
#[cfg_attr(feature = "ts-gen", ts(export, rename_all = "camelCase"))]
pub struct NotionSettings {
    #[serde(default)]
    pub integration_secret: Option<String>,
    #[serde(default)]
    pub schedule_database_id: Option<String>,
    #[serde(default)]
    pub task_database_id: Option<String>,
    #[serde(default)]
    pub property_mappings: NotionPropertyMappings,
}

/// Manual entry needs no credentials; rows live in the local database.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "ts-gen", derive(TS))]
#[cfg_attr(feature = "ts-gen", ts(export, rename_all = "camelCase"))]
pub struct ManualSettings {
    /// Include tasks already completed or cancelled.
    #[serde(default)]
    pub include_closed_tasks: bool,
}

/// Typed settings, one variant per adapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
#[cfg_attr(feature = "ts-gen", derive(TS))]
#[cfg_attr(feature = "ts-gen", ts(export))]
pub enum PluginSettings {
    GoogleCalendar(GoogleCalendarSettings),
    Airtable(AirtableSettings),
    Notion(NotionSettings),
    Manual(ManualSettings),
}

impl PluginSettings {
    /// Parse an untyped settings object (must carry a `source` tag).
    pub fn from_value(value: Value) -> Result<Self> {
        serde_json::from_value(value)
            .map_err(|e| WorkdashError::Config(format!("invalid plugin settings: {}", e)))
    }

    pub fn kind(&self) -> SourceKind {
        match self {
            Self::GoogleCalendar(_) => SourceKind::GoogleCalendar,
            Self::Airtable(_) => SourceKind::Airtable,
            Self::Notion(_) => SourceKind::Notion,
            Self::Manual(_) => SourceKind::Manual,
        }
    }

    /// Settings for `kind` where every required schema field holds an
    /// empty value of its declared type.
    pub fn placeholder(kind: SourceKind, schema: &ConfigSchema) -> Result<Self> {
        let mut object = Map::new();
        object.insert("source".to_string(), Value::String(kind.to_string()));
        for field in schema.required_fields() {
            object.insert(field.key.clone(), field.field_type.placeholder());
        }
        Self::from_value(Value::Object(object))
    }
}

fn default_enabled() -> bool {
    true
}

/// Per-organization configuration of one plugin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "ts-gen", derive(TS))]
#[cfg_attr(feature = "ts-gen", ts(export, rename_all = "camelCase"))]
pub struct PluginConfig {
    /// Matches the id of a registered plugin.
    pub id: String,
    pub name: String,
    pub version: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    pub settings: PluginSettings,
}

impl PluginConfig {
    /// Enabled config with typed settings.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        version: impl Into<String>,
        settings: PluginSettings,
    ) -> Self {
        Self { id: id.into(), name: name.into(), version: version.into(), enabled: true, settings }
    }

    /// Build a config from an untyped settings bag, validating its shape.
    pub fn from_parts(
        id: impl Into<String>,
        name: impl Into<String>,
        version: impl Into<String>,
        enabled: bool,
        settings: Value,
    ) -> Result<Self> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(WorkdashError::Config("plugin id must not be empty".into()));
        }
        let settings = PluginSettings::from_value(settings)?;
        Ok(Self { id, name: name.into(), version: version.into(), enabled, settings })
    }

    pub fn kind(&self) -> SourceKind {
        self.settings.kind()
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

/// Declared type of a settings field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "ts-gen", derive(TS))]
#[cfg_attr(feature = "ts-gen", ts(export, rename_all = "snake_case"))]
pub enum ConfigFieldType {
    String,
    Number,
    Boolean,
    StringList,
}

impl ConfigFieldType {
    /// Empty value of this type.
    pub fn placeholder(&self) -> Value {
        match self {
            Self::String => Value::String(String::new()),
            Self::Number => Value::from(0),
            Self::Boolean => Value::Bool(false),
            Self::StringList => Value::Array(Vec::new()),
        }
    }
}

/// One settings key an adapter understands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "ts-gen", derive(TS))]
#[cfg_attr(feature = "ts-gen", ts(export, rename_all = "camelCase"))]
pub struct ConfigField {
    pub key: String,
    pub field_type: ConfigFieldType,
    pub required: bool,
    pub description: String,
}

/// Settings schema published by an adapter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts-gen", derive(TS))]
#[cfg_attr(feature = "ts-gen", ts(export))]
pub struct ConfigSchema {
    pub fields: Vec<ConfigField>,
}

impl ConfigSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn required(self, key: &str, field_type: ConfigFieldType, description: &str) -> Self {
        self.field(key, field_type, true, description)
    }

    pub fn optional(self, key: &str, field_type: ConfigFieldType, description: &str) -> Self {
        self.field(key, field_type, false, description)
    }

    fn field(
        mut self,
        key: &str,
        field_type: ConfigFieldType,
        required: bool,
        description: &str,
    ) -> Self {
        self.fields.push(ConfigField {
            key: key.to_string(),
            field_type,
            required,
            description: description.to_string(),
        });
        self
    }

    pub fn required_fields(&self) -> impl Iterator<Item = &ConfigField> {
        self.fields.iter().filter(|field| field.required)
    }
}
