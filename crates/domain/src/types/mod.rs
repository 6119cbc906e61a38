//! Domain types and models

pub mod items;
pub mod manual;
pub mod plugin;
pub mod response;

pub use items::{
    DateRange, ItemMetadata, StandardScheduleItem, StandardTaskItem, TaskPriority, TaskStatus,
};
pub use manual::{ManualScheduleRow, ManualTaskRow};
pub use plugin::{
    AirtableFieldMappings, AirtableSettings, ConfigField, ConfigFieldType, ConfigSchema,
    GoogleCalendarSettings, ManualSettings, NotionPropertyMappings, NotionSettings, PluginConfig,
    PluginSettings, SourceKind,
};
pub use response::{
    AllPluginsResult, HealthStatus, PluginBatchResult, PluginError, PluginErrorCode,
    PluginExecutionResult, PluginHealthResult, PluginResponse, ResponseMetadata, ValidationResult,
};
