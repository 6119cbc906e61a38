//! Worker dashboard commands: schedule and task aggregation

use chrono::{DateTime, Duration, Utc};
use tracing::info;
use workdash_core::plugins::normalize::parse_timestamp;
use workdash_domain::{
    AllPluginsResult, DateRange, PluginBatchResult, Result, StandardScheduleItem,
    StandardTaskItem, WorkdashError,
};

use crate::utils::command_helpers::execute_logged;
use crate::AppContext;

/// Window used when `--end` is omitted.
pub const DEFAULT_RANGE_DAYS: i64 = 7;

/// Build the schedule window from optional CLI bounds.
///
/// Missing start means midnight UTC of `now`'s day; missing end means
/// [`DEFAULT_RANGE_DAYS`] after the start.
pub fn resolve_range(
    start: Option<&str>,
    end: Option<&str>,
    now: DateTime<Utc>,
) -> Result<DateRange> {
    let start = match start {
        Some(raw) => parse_bound("start", raw)?,
        None => now
            .date_naive()
            .and_hms_opt(0, 0, 0)
            .map(|midnight| midnight.and_utc())
            .unwrap_or(now),
    };
    let end = match end {
        Some(raw) => parse_bound("end", raw)?,
        None => start + Duration::days(DEFAULT_RANGE_DAYS),
    };
    DateRange::new(start, end)
}

fn parse_bound(which: &str, raw: &str) -> Result<DateTime<Utc>> {
    parse_timestamp(raw).ok_or_else(|| {
        WorkdashError::InvalidInput(format!("invalid {} timestamp: {}", which, raw))
    })
}

fn require_worker(worker_id: &str) -> Result<&str> {
    let trimmed = worker_id.trim();
    if trimmed.is_empty() {
        return Err(WorkdashError::InvalidInput("worker id must not be empty".into()));
    }
    Ok(trimmed)
}

/// Schedule items for one worker across every enabled plugin.
pub async fn get_schedule(
    ctx: &AppContext,
    worker_id: &str,
    range: &DateRange,
) -> Result<PluginBatchResult<StandardScheduleItem>> {
    execute_logged("dashboard::get_schedule", || async {
        let worker_id = require_worker(worker_id)?;
        let configs = ctx.active_plugins();
        info!(worker_id, plugins = configs.len(), "fetching schedule");

        let responses = ctx.manager.execute_schedule_plugins(worker_id, range, &configs).await;
        Ok(ctx.manager.create_batch_result(responses))
    })
    .await
}

/// Tasks for one worker across every enabled plugin.
pub async fn get_tasks(
    ctx: &AppContext,
    worker_id: &str,
) -> Result<PluginBatchResult<StandardTaskItem>> {
    execute_logged("dashboard::get_tasks", || async {
        let worker_id = require_worker(worker_id)?;
        let configs = ctx.active_plugins();
        info!(worker_id, plugins = configs.len(), "fetching tasks");

        let responses = ctx.manager.execute_task_plugins(worker_id, &configs).await;
        Ok(ctx.manager.create_batch_result(responses))
    })
    .await
}

/// Schedule and task batches in one call.
pub async fn get_dashboard(
    ctx: &AppContext,
    worker_id: &str,
    range: &DateRange,
) -> Result<AllPluginsResult> {
    execute_logged("dashboard::get_dashboard", || async {
        let worker_id = require_worker(worker_id)?;
        let configs = ctx.active_plugins();
        Ok(ctx.manager.execute_all_plugins(worker_id, range, &configs).await)
    })
    .await
}
