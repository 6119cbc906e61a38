//! SQLite implementation of the ManualItemStore port.

use async_trait::async_trait;
use rusqlite::{params, OptionalExtension, Row};
use tokio::task;
use tracing::{debug, instrument};
use workdash_core::plugins::normalize::{parse_timestamp, to_utc_string};
use workdash_core::ManualItemStore;
use workdash_domain::constants::{MANUAL_SCHEDULE_TABLE, MANUAL_TASK_TABLE};
use workdash_domain::{DateRange, ManualScheduleRow, ManualTaskRow, Result, WorkdashError};

use super::manager::{map_sql_error, DbManager};

/// Manual schedule/task rows stored in the local database
#[derive(Debug, Clone)]
pub struct SqliteManualItemStore {
    db: DbManager,
}

impl SqliteManualItemStore {
    /// Store over an already migrated database.
    pub fn new(db: DbManager) -> Self {
        Self { db }
    }

    /// Insert or replace a schedule row.
    #[instrument(skip(self, row), fields(id = %row.id, worker_id = %row.worker_id))]
    pub fn upsert_schedule_row(&self, row: &ManualScheduleRow) -> Result<()> {
        let conn = self.db.get_connection()?;
        conn.execute(
            &format!(
                "INSERT OR REPLACE INTO {MANUAL_SCHEDULE_TABLE}
                    (id, worker_id, title, start_time, end_time, location, description, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7,
                    COALESCE(?8, strftime('%Y-%m-%dT%H:%M:%SZ', 'now')))"
            ),
            params![
                row.id,
                row.worker_id,
                row.title,
                canonical_time(row.start_time.as_deref()),
                canonical_time(row.end_time.as_deref()),
                row.location,
                row.description,
                row.created_at,
            ],
        )
        .map_err(map_sql_error)?;
        Ok(())
    }

    /// Insert or replace a task row.
    #[instrument(skip(self, row), fields(id = %row.id, worker_id = %row.worker_id))]
    pub fn upsert_task_row(&self, row: &ManualTaskRow) -> Result<()> {
        let conn = self.db.get_connection()?;
        conn.execute(
            &format!(
                "INSERT OR REPLACE INTO {MANUAL_TASK_TABLE}
                    (id, worker_id, title, description, due_date, priority, status, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7,
                    COALESCE(?8, strftime('%Y-%m-%dT%H:%M:%SZ', 'now')))"
            ),
            params![
                row.id,
                row.worker_id,
                row.title,
                row.description,
                canonical_time(row.due_date.as_deref()),
                row.priority,
                row.status,
                row.created_at,
            ],
        )
        .map_err(map_sql_error)?;
        Ok(())
    }

    /// Fetch one task row by id.
    pub fn find_task_row(&self, id: &str) -> Result<Option<ManualTaskRow>> {
        let conn = self.db.get_connection()?;
        conn.query_row(
            &format!("SELECT {TASK_COLUMNS} FROM {MANUAL_TASK_TABLE} WHERE id = ?1"),
            params![id],
            task_from_row,
        )
        .optional()
        .map_err(map_sql_error)
    }
}

const SCHEDULE_COLUMNS: &str =
    "id, worker_id, title, start_time, end_time, location, description, created_at";
const TASK_COLUMNS: &str =
    "id, worker_id, title, description, due_date, priority, status, created_at";

#[async_trait]
impl ManualItemStore for SqliteManualItemStore {
    #[instrument(skip(self, range))]
    async fn schedule_rows(
        &self,
        worker_id: &str,
        range: &DateRange,
    ) -> Result<Vec<ManualScheduleRow>> {
        let db = self.db.clone();
        let worker_id = worker_id.to_string();
        let (start, end) = range.to_rfc3339();

        let rows = task::spawn_blocking(move || -> Result<Vec<ManualScheduleRow>> {
            let conn = db.get_connection()?;
            // Rows with missing times are kept so the adapter can report them as dropped.
            let mut stmt = conn
                .prepare(&format!(
                    "SELECT {SCHEDULE_COLUMNS} FROM {MANUAL_SCHEDULE_TABLE}
                     WHERE worker_id = ?1
                       AND (start_time IS NULL OR end_time IS NULL
                            OR (start_time <= ?3 AND end_time >= ?2))
                     ORDER BY start_time, id"
                ))
                .map_err(map_sql_error)?;

            let rows = stmt
                .query_map(params![worker_id, start, end], schedule_from_row)
                .map_err(map_sql_error)?
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(map_sql_error)?;
            Ok(rows)
        })
        .await
        .map_err(map_join_error)??;

        debug!(count = rows.len(), "loaded manual schedule rows");
        Ok(rows)
    }

    #[instrument(skip(self))]
    async fn task_rows(&self, worker_id: &str) -> Result<Vec<ManualTaskRow>> {
        let db = self.db.clone();
        let worker_id = worker_id.to_string();

        let rows = task::spawn_blocking(move || -> Result<Vec<ManualTaskRow>> {
            let conn = db.get_connection()?;
            let mut stmt = conn
                .prepare(&format!(
                    "SELECT {TASK_COLUMNS} FROM {MANUAL_TASK_TABLE}
                     WHERE worker_id = ?1
                     ORDER BY created_at, id"
                ))
                .map_err(map_sql_error)?;

            let rows = stmt
                .query_map(params![worker_id], task_from_row)
                .map_err(map_sql_error)?
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(map_sql_error)?;
            Ok(rows)
        })
        .await
        .map_err(map_join_error)??;

        debug!(count = rows.len(), "loaded manual task rows");
        Ok(rows)
    }

    async fn ping(&self) -> Result<()> {
        let db = self.db.clone();
        task::spawn_blocking(move || db.health_check()).await.map_err(map_join_error)?
    }
}

fn map_join_error(err: task::JoinError) -> WorkdashError {
    if err.is_cancelled() {
        WorkdashError::Internal("manual store task cancelled".to_string())
    } else {
        WorkdashError::Internal(format!("manual store task failed: {err}"))
    }
}

/// Store timestamps as `...Z` text so range comparisons stay lexical.
fn canonical_time(raw: Option<&str>) -> Option<String> {
    raw.map(|value| {
        parse_timestamp(value).map_or_else(|| value.to_string(), to_utc_string)
    })
}

fn schedule_from_row(row: &Row<'_>) -> rusqlite::Result<ManualScheduleRow> {
    Ok(ManualScheduleRow {
        id: row.get(0)?,
        worker_id: row.get(1)?,
        title: row.get(2)?,
        start_time: row.get(3)?,
        end_time: row.get(4)?,
        location: row.get(5)?,
        description: row.get(6)?,
        created_at: row.get(7)?,
    })
}

fn task_from_row(row: &Row<'_>) -> rusqlite::Result<ManualTaskRow> {
    Ok(ManualTaskRow {
        id: row.get(0)?,
        worker_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        due_date: row.get(4)?,
        priority: row.get(5)?,
        status: row.get(6)?,
        created_at: row.get(7)?,
    })
}
