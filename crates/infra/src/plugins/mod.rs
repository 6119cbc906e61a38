//! Source adapters
//!
//! One module per external system, each implementing
//! [`SourceAdapter`](workdash_core::SourceAdapter). HTTP adapters share the
//! response helpers below; [`builtin_registry`] wires all four under their
//! default ids.

pub mod airtable;
pub mod google_calendar;
pub mod manual;
pub mod notion;

use std::sync::Arc;

use reqwest::Response;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;
use workdash_core::{ManualItemStore, PluginRegistry};
use workdash_domain::{Result, SourceKind, ValidationResult, WorkdashError};

pub use airtable::AirtablePlugin;
pub use google_calendar::GoogleCalendarPlugin;
pub use manual::ManualPlugin;
pub use notion::NotionPlugin;

use crate::errors::InfraError;
use crate::http::HttpClient;

/// Registry holding the four built-in adapters.
pub fn builtin_registry(
    http: HttpClient,
    store: Arc<dyn ManualItemStore>,
) -> Result<PluginRegistry> {
    let mut registry = PluginRegistry::new();
    registry.register(Arc::new(GoogleCalendarPlugin::new(http.clone())?));
    registry.register(Arc::new(AirtablePlugin::new(http.clone())?));
    registry.register(Arc::new(NotionPlugin::new(http)?));
    registry.register(Arc::new(ManualPlugin::new(store)));
    Ok(registry)
}

pub(crate) fn parse_base_url(raw: &str) -> Result<Url> {
    Url::parse(raw).map_err(|e| InfraError::from(e).into())
}

/// Append path segments to `base`, percent-encoding each one.
pub(crate) fn join_url(base: &Url, segments: &[&str]) -> Result<Url> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| WorkdashError::Config(format!("base URL cannot carry a path: {}", base)))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Pass through 2xx responses; anything else becomes
/// `"{Source} API error: {status text}"`.
pub(crate) async fn ensure_success(response: Response, source: SourceKind) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    debug!(source = %source, %status, body = %body, "source API returned an error status");

    let reason =
        status.canonical_reason().map(str::to_string).unwrap_or_else(|| status.as_str().to_string());
    Err(WorkdashError::Network(format!("{} API error: {}", source.display_name(), reason)))
}

pub(crate) async fn read_json<T>(response: Response, source: SourceKind) -> Result<T>
where
    T: DeserializeOwned,
{
    response.json::<T>().await.map_err(|e| {
        WorkdashError::InvalidInput(format!(
            "Failed to parse {} response: {}",
            source.display_name(),
            e
        ))
    })
}

/// Outcome of a liveness probe, reported apart from missing-config errors.
pub(crate) fn probe_result(source: SourceKind, outcome: Result<()>) -> ValidationResult {
    match outcome {
        Ok(()) => ValidationResult::valid(),
        Err(error) => ValidationResult::invalid(format!(
            "Failed to connect to {}: {}",
            source.display_name(),
            error.message()
        )),
    }
}
