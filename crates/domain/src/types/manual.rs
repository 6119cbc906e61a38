//! Raw rows of the manual-entry tables
//!
//! Payload columns are stored as nullable text; the manual adapter decides
//! which gaps make a row unusable.

use serde::{Deserialize, Serialize};

/// Row of `manual_schedule_items`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManualScheduleRow {
    pub id: String,
    pub worker_id: String,
    pub title: Option<String>,
    /// RFC-3339 text.
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub created_at: Option<String>,
}

/// Row of `manual_task_items`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManualTaskRow {
    pub id: String,
    pub worker_id: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub due_date: Option<String>,
    pub priority: Option<String>,
    pub status: Option<String>,
    pub created_at: Option<String>,
}
