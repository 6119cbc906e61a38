//! Conversions from external infrastructure errors into domain errors.

use reqwest::Error as HttpError;
use rusqlite::Error as SqlError;
use workdash_domain::WorkdashError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub WorkdashError);

impl From<InfraError> for WorkdashError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<WorkdashError> for InfraError {
    fn from(value: WorkdashError) -> Self {
        InfraError(value)
    }
}

/* -------------------------------------------------------------------------- */
/* Manual-entry store: rusqlite / r2d2 */
/* -------------------------------------------------------------------------- */

fn sqlite_error(err: SqlError) -> WorkdashError {
    use rusqlite::ffi::ErrorCode;

    match err {
        SqlError::SqliteFailure(failure, detail) => match failure.code {
            ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked => {
                WorkdashError::Database("manual-entry database is busy".into())
            }
            ErrorCode::NotADatabase => {
                WorkdashError::Database("manual-entry file is not a SQLite database".into())
            }
            ErrorCode::CannotOpen => WorkdashError::Database(format!(
                "cannot open manual-entry database: {}",
                detail.unwrap_or_default()
            )),
            code => WorkdashError::Database(format!(
                "sqlite {:?}: {}",
                code,
                detail.unwrap_or_else(|| failure.to_string())
            )),
        },
        SqlError::QueryReturnedNoRows => WorkdashError::NotFound("no matching manual entry".into()),
        SqlError::InvalidColumnType(_, column, ty) => {
            WorkdashError::Database(format!("manual-entry column {column} has type {ty}"))
        }
        other => WorkdashError::Database(other.to_string()),
    }
}

impl From<SqlError> for InfraError {
    fn from(value: SqlError) -> Self {
        InfraError(sqlite_error(value))
    }
}

impl From<r2d2::Error> for InfraError {
    fn from(value: r2d2::Error) -> Self {
        InfraError(WorkdashError::Database(format!("connection pool error: {}", value)))
    }
}

/* -------------------------------------------------------------------------- */
/* Source APIs: reqwest */
/* -------------------------------------------------------------------------- */

/// Transport and body-decode failures. Adapters inspect statuses themselves.
fn http_error(err: &HttpError) -> WorkdashError {
    if err.is_timeout() {
        return WorkdashError::Network("HTTP request timed out".into());
    }
    if err.is_connect() {
        return WorkdashError::Network("HTTP connection failure".into());
    }
    if err.is_decode() {
        return WorkdashError::InvalidInput(format!("undecodable response body: {}", err));
    }
    WorkdashError::Network(format!("HTTP request failed: {}", err))
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(http_error(&value))
    }
}

/* -------------------------------------------------------------------------- */
/* Payloads and configuration: serde_json / toml / url */
/* -------------------------------------------------------------------------- */

impl From<serde_json::Error> for InfraError {
    fn from(value: serde_json::Error) -> Self {
        InfraError(WorkdashError::InvalidInput(format!("invalid JSON: {}", value)))
    }
}

impl From<toml::de::Error> for InfraError {
    fn from(value: toml::de::Error) -> Self {
        InfraError(WorkdashError::Config(format!("invalid TOML: {}", value)))
    }
}

impl From<url::ParseError> for InfraError {
    fn from(value: url::ParseError) -> Self {
        InfraError(WorkdashError::Config(format!("invalid URL: {}", value)))
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
