//! Response envelopes returned by plugins and the plugin manager
//!
//! Plugins never return `Err` from a schedule or task fetch; every outcome is
//! an envelope so the dashboard can degrade gracefully and show whatever
//! succeeded.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "ts-gen")]
use ts_rs::TS;

use super::items::{StandardScheduleItem, StandardTaskItem};

/// Closed taxonomy of envelope error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "ts-gen", derive(TS))]
#[cfg_attr(feature = "ts-gen", ts(export, rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum PluginErrorCode {
    /// Failure inside an adapter's fetch or transform.
    PluginError,
    /// The manager found no registered plugin for a config id.
    PluginNotFound,
    /// Failure escaping the manager's call into a plugin.
    PluginExecutionError,
    /// Config rejected before any network call.
    ValidationError,
}

impl PluginErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PluginError => "PLUGIN_ERROR",
            Self::PluginNotFound => "PLUGIN_NOT_FOUND",
            Self::PluginExecutionError => "PLUGIN_EXECUTION_ERROR",
            Self::ValidationError => "VALIDATION_ERROR",
        }
    }

    pub fn default_retryable(&self) -> bool {
        matches!(self, Self::PluginError | Self::PluginExecutionError)
    }
}

impl std::fmt::Display for PluginErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error entry inside an envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "ts-gen", derive(TS))]
#[cfg_attr(feature = "ts-gen", ts(export, rename_all = "camelCase"))]
pub struct PluginError {
    pub code: PluginErrorCode,
    pub message: String,
    pub retryable: bool,
}

impl PluginError {
    /// Error with the code's default retry classification.
    pub fn new(code: PluginErrorCode, message: impl Into<String>) -> Self {
        Self { code, message: message.into(), retryable: code.default_retryable() }
    }

    pub fn plugin(message: impl Into<String>) -> Self {
        Self::new(PluginErrorCode::PluginError, message)
    }

    pub fn not_found(plugin_id: &str) -> Self {
        Self::new(PluginErrorCode::PluginNotFound, format!("Plugin {} not found", plugin_id))
    }

    pub fn execution(message: impl Into<String>) -> Self {
        Self::new(PluginErrorCode::PluginExecutionError, message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(PluginErrorCode::ValidationError, message)
    }
}

/// Provenance of an envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "ts-gen", derive(TS))]
#[cfg_attr(feature = "ts-gen", ts(export, rename_all = "camelCase"))]
pub struct ResponseMetadata {
    /// Id of the plugin (or config) that produced the envelope.
    pub source: String,
    #[cfg_attr(feature = "ts-gen", ts(type = "string"))]
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

/// Uniform result of one plugin call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "ts-gen", derive(TS))]
#[cfg_attr(feature = "ts-gen", ts(export, rename_all = "camelCase"))]
pub struct PluginResponse<T> {
    pub success: bool,
    pub data: Vec<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "ts-gen", ts(optional))]
    pub errors: Option<Vec<PluginError>>,
    pub metadata: ResponseMetadata,
}

impl<T> PluginResponse<T> {
    /// Successful envelope stamped with the current time.
    pub fn ok(data: Vec<T>, source: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            success: true,
            data,
            errors: None,
            metadata: ResponseMetadata {
                source: source.into(),
                timestamp: Utc::now(),
                version: version.into(),
            },
        }
    }

    /// Failed envelope carrying exactly one error and no data.
    pub fn failed(
        error: PluginError,
        source: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            success: false,
            data: Vec::new(),
            errors: Some(vec![error]),
            metadata: ResponseMetadata {
                source: source.into(),
                timestamp: Utc::now(),
                version: version.into(),
            },
        }
    }

    pub fn first_error(&self) -> Option<&PluginError> {
        self.errors.as_ref().and_then(|errors| errors.first())
    }

    pub fn item_count(&self) -> usize {
        self.data.len()
    }
}

/// Per-plugin line of a batch result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "ts-gen", derive(TS))]
#[cfg_attr(feature = "ts-gen", ts(export, rename_all = "camelCase"))]
pub struct PluginExecutionResult {
    pub plugin_id: String,
    pub success: bool,
    pub item_count: usize,
    #[serde(default)]
    pub errors: Vec<PluginError>,
    #[cfg_attr(feature = "ts-gen", ts(type = "string"))]
    pub timestamp: DateTime<Utc>,
}

/// Aggregate of every envelope produced by one manager run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "ts-gen", derive(TS))]
#[cfg_attr(feature = "ts-gen", ts(export, rename_all = "camelCase"))]
pub struct PluginBatchResult<T> {
    pub total_plugins: usize,
    pub successful_plugins: usize,
    pub failed_plugins: usize,
    pub results: Vec<PluginExecutionResult>,
    /// Data of every successful plugin, in config order, not deduplicated.
    pub aggregated_data: Vec<T>,
}

impl<T> PluginBatchResult<T> {
    pub fn empty() -> Self {
        Self {
            total_plugins: 0,
            successful_plugins: 0,
            failed_plugins: 0,
            results: Vec::new(),
            aggregated_data: Vec::new(),
        }
    }

    /// Whether at least one plugin failed.
    pub fn is_partial(&self) -> bool {
        self.failed_plugins > 0
    }
}

/// Schedule and task batches produced for one worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "ts-gen", derive(TS))]
#[cfg_attr(feature = "ts-gen", ts(export, rename_all = "camelCase"))]
pub struct AllPluginsResult {
    pub schedule: PluginBatchResult<StandardScheduleItem>,
    pub tasks: PluginBatchResult<StandardTaskItem>,
}

/// Outcome of an adapter's config validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "ts-gen", derive(TS))]
#[cfg_attr(feature = "ts-gen", ts(export, rename_all = "camelCase"))]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<String>,
}

impl ValidationResult {
    pub fn valid() -> Self {
        Self { valid: true, errors: Vec::new() }
    }

    /// Valid exactly when `errors` is empty.
    pub fn from_errors(errors: Vec<String>) -> Self {
        Self { valid: errors.is_empty(), errors }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self { valid: false, errors: vec![message.into()] }
    }
}

/// Health of a registered plugin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "ts-gen", derive(TS))]
#[cfg_attr(feature = "ts-gen", ts(export, rename_all = "snake_case"))]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "ts-gen", derive(TS))]
#[cfg_attr(feature = "ts-gen", ts(export, rename_all = "camelCase"))]
pub struct PluginHealthResult {
    pub plugin_id: String,
    pub status: HealthStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "ts-gen", ts(optional))]
    pub message: Option<String>,
    #[cfg_attr(feature = "ts-gen", ts(type = "string"))]
    pub checked_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "ts-gen", ts(type = "number", optional))]
    pub response_time_ms: Option<u64>,
}

impl PluginHealthResult {
    pub fn new(plugin_id: impl Into<String>, status: HealthStatus) -> Self {
        Self {
            plugin_id: plugin_id.into(),
            status,
            message: None,
            checked_at: Utc::now(),
            response_time_ms: None,
        }
    }

    pub fn healthy(plugin_id: impl Into<String>) -> Self {
        Self::new(plugin_id, HealthStatus::Healthy)
    }

    pub fn unhealthy(plugin_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(plugin_id, HealthStatus::Unhealthy).with_message(message)
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_response_time(mut self, millis: u64) -> Self {
        self.response_time_ms = Some(millis);
        self
    }

    pub fn is_healthy(&self) -> bool {
        self.status == HealthStatus::Healthy
    }
}
