//! Command execution helpers
//!
//! Times a command and logs its outcome so every command reports the same
//! structured fields.

use std::future::Future;
use std::time::Instant;

use workdash_domain::Result as DomainResult;

use crate::utils::logging::log_command_execution;

/// Execute a command with timing and outcome logging
///
/// # Example
///
/// ```rust,ignore
/// pub async fn my_command(ctx: &AppContext, worker_id: &str) -> Result<MyResponse> {
///     execute_logged("plugins::my_command", || async {
///         ctx.manager.do_something(worker_id).await
///     })
///     .await
/// }
/// ```
pub async fn execute_logged<F, Fut, T>(command_name: &str, command_fn: F) -> DomainResult<T>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = DomainResult<T>>,
{
    let start = Instant::now();

    let result = command_fn().await;

    log_command_execution(command_name, start.elapsed(), result.as_ref().err());
    result
}
