//! Port interfaces for manual schedule/task entry
//!
//! Implemented by infrastructure on top of the local database. The manual
//! adapter only ever reads; entry creation belongs to the store itself.

use async_trait::async_trait;
use workdash_domain::{DateRange, ManualScheduleRow, ManualTaskRow, Result};

/// Read access to manually entered schedule and task rows
#[async_trait]
pub trait ManualItemStore: Send + Sync {
    /// Schedule rows of `worker_id` whose time span overlaps `range`.
    ///
    /// Rows with missing times are still returned; the adapter decides
    /// whether they are usable.
    async fn schedule_rows(
        &self,
        worker_id: &str,
        range: &DateRange,
    ) -> Result<Vec<ManualScheduleRow>>;

    /// All task rows of `worker_id`, oldest first.
    async fn task_rows(&self, worker_id: &str) -> Result<Vec<ManualTaskRow>>;

    /// Cheap liveness check of the underlying storage.
    async fn ping(&self) -> Result<()>;
}
