//! Plugin manager
//!
//! Executes the configured plugins for one worker and aggregates their
//! envelopes. Every config yields exactly one envelope, in config order:
//! unknown ids, kind mismatches, panics and timeouts are all turned into
//! error envelopes so one source never hides another.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::stream::{self, StreamExt};
use futures::FutureExt;
use tracing::{debug, info, instrument, warn};
use workdash_domain::{
    AllPluginsResult, DateRange, ManagerConfig, PluginBatchResult, PluginConfig, PluginError,
    PluginExecutionResult, PluginHealthResult, PluginResponse, PluginSettings,
    StandardScheduleItem, StandardTaskItem,
};

use super::adapter::Plugin;
use super::registry::PluginRegistry;

/// Runs registered plugins against a list of configs.
#[derive(Debug, Clone)]
pub struct PluginManager {
    registry: Arc<PluginRegistry>,
    config: ManagerConfig,
}

impl PluginManager {
    /// Manager with sequential execution and no timeout.
    pub fn new(registry: Arc<PluginRegistry>) -> Self {
        Self::with_config(registry, ManagerConfig::default())
    }

    pub fn with_config(registry: Arc<PluginRegistry>, config: ManagerConfig) -> Self {
        Self { registry, config }
    }

    pub fn registry(&self) -> &Arc<PluginRegistry> {
        &self.registry
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    /// One schedule envelope per config, in config order.
    #[instrument(skip(self, range, configs), fields(configs = configs.len()))]
    pub async fn execute_schedule_plugins(
        &self,
        worker_id: &str,
        range: &DateRange,
        configs: &[PluginConfig],
    ) -> Vec<PluginResponse<StandardScheduleItem>> {
        let runs = configs.iter().map(|config| self.execute_schedule(worker_id, range, config));
        self.collect_in_order(runs).await
    }

    /// One task envelope per config, in config order.
    #[instrument(skip(self, configs), fields(configs = configs.len()))]
    pub async fn execute_task_plugins(
        &self,
        worker_id: &str,
        configs: &[PluginConfig],
    ) -> Vec<PluginResponse<StandardTaskItem>> {
        let runs = configs.iter().map(|config| self.execute_tasks(worker_id, config));
        self.collect_in_order(runs).await
    }

    /// Schedule and task batches for one worker.
    pub async fn execute_all_plugins(
        &self,
        worker_id: &str,
        range: &DateRange,
        configs: &[PluginConfig],
    ) -> AllPluginsResult {
        let (schedule, tasks) = if self.config.concurrent_kinds {
            tokio::join!(
                self.execute_schedule_plugins(worker_id, range, configs),
                self.execute_task_plugins(worker_id, configs)
            )
        } else {
            let schedule = self.execute_schedule_plugins(worker_id, range, configs).await;
            let tasks = self.execute_task_plugins(worker_id, configs).await;
            (schedule, tasks)
        };

        AllPluginsResult {
            schedule: self.create_batch_result(schedule),
            tasks: self.create_batch_result(tasks),
        }
    }

    /// Aggregate envelopes: counts, per-plugin lines and the concatenated
    /// data of successful plugins.
    pub fn create_batch_result<T>(&self, responses: Vec<PluginResponse<T>>) -> PluginBatchResult<T> {
        let mut batch = PluginBatchResult::empty();
        batch.total_plugins = responses.len();

        for response in responses {
            batch.results.push(PluginExecutionResult {
                plugin_id: response.metadata.source.clone(),
                success: response.success,
                item_count: response.data.len(),
                errors: response.errors.clone().unwrap_or_default(),
                timestamp: response.metadata.timestamp,
            });
            if response.success {
                batch.successful_plugins += 1;
                batch.aggregated_data.extend(response.data);
            } else {
                batch.failed_plugins += 1;
            }
        }

        batch
    }

    /// Validate a plugin against placeholder settings built from its
    /// schema. Errors count as invalid.
    pub async fn validate_plugin(&self, plugin: &dyn Plugin) -> bool {
        let settings = match PluginSettings::placeholder(plugin.kind(), &plugin.schema()) {
            Ok(settings) => settings,
            Err(e) => {
                debug!(plugin_id = plugin.id(), error = %e, "Placeholder settings rejected");
                return false;
            }
        };
        let config = PluginConfig::new(plugin.id(), plugin.name(), plugin.version(), settings);

        match plugin.validate(&config).await {
            Ok(result) => result.valid,
            Err(e) => {
                debug!(plugin_id = plugin.id(), error = %e, "Plugin validation errored");
                false
            }
        }
    }

    /// Health of a registered plugin.
    pub async fn get_plugin_status(&self, plugin_id: &str) -> PluginHealthResult {
        let Some(plugin) = self.registry.get(plugin_id) else {
            return PluginHealthResult::unhealthy(plugin_id, "Plugin not found");
        };

        let started = Instant::now();
        if let Some(health) = plugin.health().await {
            return health;
        }

        let valid = self.validate_plugin(plugin.as_ref()).await;
        let elapsed = elapsed_millis(started);
        let health = if valid {
            PluginHealthResult::healthy(plugin_id)
        } else {
            PluginHealthResult::unhealthy(plugin_id, "Plugin configuration is incomplete")
        };
        health.with_response_time(elapsed)
    }

    /// Health of every registered plugin, sorted by id.
    pub async fn audit_plugins(&self) -> Vec<PluginHealthResult> {
        let mut report = Vec::with_capacity(self.registry.len());
        for plugin in self.registry.get_all() {
            report.push(self.get_plugin_status(plugin.id()).await);
        }
        report
    }

    async fn execute_schedule(
        &self,
        worker_id: &str,
        range: &DateRange,
        config: &PluginConfig,
    ) -> PluginResponse<StandardScheduleItem> {
        let plugin = match self.resolve(config) {
            Ok(plugin) => plugin,
            Err(error) => return PluginResponse::failed(error, &config.id, &config.version),
        };
        let started = Instant::now();
        let response = self.guarded(config, plugin.get_schedule(worker_id, range, config)).await;
        log_execution(config, "schedule", &response, started);
        response
    }

    async fn execute_tasks(
        &self,
        worker_id: &str,
        config: &PluginConfig,
    ) -> PluginResponse<StandardTaskItem> {
        let plugin = match self.resolve(config) {
            Ok(plugin) => plugin,
            Err(error) => return PluginResponse::failed(error, &config.id, &config.version),
        };
        let started = Instant::now();
        let response = self.guarded(config, plugin.get_tasks(worker_id, config)).await;
        log_execution(config, "tasks", &response, started);
        response
    }

    fn resolve(&self, config: &PluginConfig) -> Result<Arc<dyn Plugin>, PluginError> {
        let Some(plugin) = self.registry.get(&config.id) else {
            warn!(plugin_id = %config.id, "No plugin registered for config");
            return Err(PluginError::not_found(&config.id));
        };
        if plugin.kind() != config.kind() {
            warn!(
                plugin_id = %config.id,
                expected = %plugin.kind(),
                received = %config.kind(),
                "Config settings do not match plugin kind"
            );
            return Err(PluginError::validation(format!(
                "Plugin {} expects {} settings, got {}",
                config.id,
                plugin.kind(),
                config.kind()
            )));
        }
        Ok(plugin)
    }

    /// Await a plugin call, turning panics and timeouts into
    /// `PLUGIN_EXECUTION_ERROR` envelopes.
    async fn guarded<T, F>(&self, config: &PluginConfig, call: F) -> PluginResponse<T>
    where
        F: Future<Output = PluginResponse<T>>,
    {
        let call = AssertUnwindSafe(call).catch_unwind();
        let outcome = match self.config.plugin_timeout_secs {
            Some(secs) => match tokio::time::timeout(Duration::from_secs(secs), call).await {
                Ok(outcome) => outcome,
                Err(_) => {
                    return PluginResponse::failed(
                        PluginError::execution(format!(
                            "Plugin {} timed out after {}s",
                            config.id, secs
                        )),
                        &config.id,
                        &config.version,
                    );
                }
            },
            None => call.await,
        };

        outcome.unwrap_or_else(|payload| {
            let message = panic_message(payload.as_ref());
            warn!(plugin_id = %config.id, %message, "Plugin panicked");
            PluginResponse::failed(PluginError::execution(message), &config.id, &config.version)
        })
    }

    async fn collect_in_order<T, F>(&self, runs: impl Iterator<Item = F>) -> Vec<T>
    where
        F: Future<Output = T>,
    {
        if self.config.max_concurrency <= 1 {
            let mut responses = Vec::new();
            for run in runs {
                responses.push(run.await);
            }
            responses
        } else {
            stream::iter(runs).buffered(self.config.max_concurrency).collect().await
        }
    }
}

fn log_execution<T>(
    config: &PluginConfig,
    operation: &str,
    response: &PluginResponse<T>,
    started: Instant,
) {
    let duration_ms = elapsed_millis(started);
    if response.success {
        info!(
            plugin_id = %config.id,
            operation,
            success = true,
            item_count = response.data.len(),
            duration_ms,
            "Plugin executed"
        );
    } else {
        let code = response.first_error().map(|e| e.code.as_str()).unwrap_or_default();
        info!(
            plugin_id = %config.id,
            operation,
            success = false,
            error_code = code,
            duration_ms,
            "Plugin executed"
        );
    }
}

fn elapsed_millis(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("Plugin panicked: {}", message)
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("Plugin panicked: {}", message)
    } else {
        "Plugin panicked".to_string()
    }
}
