//! Where workdash finds its configuration
//!
//! [`load`] prefers the process environment and only reads a file when
//! `WORKDASH_DB_PATH` is absent. Files are JSON or TOML, chosen by extension.
//!
//! Recognised variables:
//! - `WORKDASH_DB_PATH`: manual-entry database file (required)
//! - `WORKDASH_DB_POOL_SIZE`: connection pool size
//! - `WORKDASH_HTTP_TIMEOUT_SECS`: per-request HTTP timeout
//! - `WORKDASH_HTTP_MAX_ATTEMPTS`: HTTP attempts per request (1 = no retry)
//! - `WORKDASH_MAX_CONCURRENCY`: plugins executed at once per kind
//! - `WORKDASH_PLUGIN_TIMEOUT_SECS`: upper bound on one plugin call
//! - `WORKDASH_LOG_LEVEL`: log filter used when `RUST_LOG` is unset
//! - `WORKDASH_LOG_JSON`: JSON log output
//! - `WORKDASH_PLUGINS_JSON`: JSON array of plugin entries
//!
//! Without an explicit path, [`probe_config_paths`] checks `config.*` and
//! `workdash.*` in the working directory, then `config.*` up to two
//! directories higher, then the same names next to the executable.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use workdash_domain::{
    Config, DatabaseConfig, HttpConfig, LoggingConfig, ManagerConfig, PluginConfig, Result,
    WorkdashError,
};

use crate::errors::InfraError;

const FILE_STEMS: &[&str] = &["config", "workdash"];
const ANCESTOR_STEMS: &[&str] = &["../config", "../../config"];
const EXTENSIONS: &[&str] = &["json", "toml"];

/// Environment first, probed config file second.
///
/// # Errors
/// `WorkdashError::Config` when the environment is incomplete and no usable
/// file is found, or when the chosen source fails to parse.
pub fn load() -> Result<Config> {
    if std::env::var_os("WORKDASH_DB_PATH").is_some() {
        let config = load_from_env()?;
        tracing::info!(plugins = config.plugins.len(), "configuration taken from environment");
        return Ok(config);
    }

    tracing::debug!("WORKDASH_DB_PATH unset, looking for a config file");
    load_from_file(None)
}

/// Build a [`Config`] purely from `WORKDASH_*` variables.
///
/// Only `WORKDASH_DB_PATH` is required; everything else falls back to the
/// same defaults a config file gets.
pub fn load_from_env() -> Result<Config> {
    let defaults = Config::default();

    let database = DatabaseConfig {
        path: required_env("WORKDASH_DB_PATH")?,
        pool_size: env_parse("WORKDASH_DB_POOL_SIZE", "pool size")?
            .unwrap_or(defaults.database.pool_size),
    };

    let http = HttpConfig {
        timeout_secs: env_parse("WORKDASH_HTTP_TIMEOUT_SECS", "HTTP timeout")?
            .unwrap_or(defaults.http.timeout_secs),
        max_attempts: env_parse("WORKDASH_HTTP_MAX_ATTEMPTS", "HTTP attempt count")?
            .unwrap_or(defaults.http.max_attempts),
    };

    let manager = ManagerConfig {
        max_concurrency: env_parse("WORKDASH_MAX_CONCURRENCY", "max concurrency")?
            .unwrap_or(defaults.manager.max_concurrency),
        plugin_timeout_secs: env_parse("WORKDASH_PLUGIN_TIMEOUT_SECS", "plugin timeout")?,
        concurrent_kinds: defaults.manager.concurrent_kinds,
    };

    let logging = LoggingConfig {
        level: std::env::var("WORKDASH_LOG_LEVEL").unwrap_or(defaults.logging.level),
        json: env_flag("WORKDASH_LOG_JSON").unwrap_or(defaults.logging.json),
    };

    let plugins = std::env::var("WORKDASH_PLUGINS_JSON")
        .ok()
        .map(|raw| parse_plugins(&raw))
        .transpose()?
        .unwrap_or_default();

    Ok(Config { database, http, manager, logging, plugins })
}

/// Read a config file, probing the usual locations when `path` is `None`.
///
/// # Errors
/// `WorkdashError::Config` for a missing file, an unreadable file, an
/// unknown extension or content that does not describe a [`Config`].
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let file = match path {
        Some(explicit) if explicit.exists() => explicit,
        Some(explicit) => {
            return Err(WorkdashError::Config(format!(
                "Config file not found: {}",
                explicit.display()
            )))
        }
        None => probe_config_paths().ok_or_else(|| {
            WorkdashError::Config(
                "no config file found and WORKDASH_DB_PATH is not set".to_string(),
            )
        })?,
    };

    tracing::info!(path = %file.display(), "reading configuration file");
    let contents = std::fs::read_to_string(&file).map_err(|e| {
        WorkdashError::Config(format!("cannot read {}: {}", file.display(), e))
    })?;

    decode(&contents, &file)
}

fn decode(contents: &str, file: &Path) -> Result<Config> {
    match file.extension().and_then(|ext| ext.to_str()) {
        Some("toml") => toml::from_str(contents).map_err(|e| InfraError::from(e).into()),
        Some("json") | None => serde_json::from_str(contents)
            .map_err(|e| WorkdashError::Config(format!("Invalid JSON format: {}", e))),
        Some(other) => Err(WorkdashError::Config(format!("Unsupported config format: {}", other))),
    }
}

fn parse_plugins(raw: &str) -> Result<Vec<PluginConfig>> {
    serde_json::from_str(raw)
        .map_err(|e| WorkdashError::Config(format!("Invalid WORKDASH_PLUGINS_JSON: {}", e)))
}

/// First existing config file in the probe order, if any.
pub fn probe_config_paths() -> Option<PathBuf> {
    let cwd = std::env::current_dir().ok();
    let exe_dir = std::env::current_exe().ok().and_then(|exe| exe.parent().map(Path::to_path_buf));

    cwd.into_iter().chain(exe_dir).flat_map(|dir| candidates_in(&dir)).find(|path| path.exists())
}

fn candidates_in(dir: &Path) -> Vec<PathBuf> {
    FILE_STEMS
        .iter()
        .chain(ANCESTOR_STEMS)
        .flat_map(|stem| EXTENSIONS.iter().map(move |ext| dir.join(format!("{}.{}", stem, ext))))
        .collect()
}

fn required_env(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| {
        WorkdashError::Config(format!("Missing required environment variable: {}", key))
    })
}

/// Optional numeric variable; present but unparsable is an error.
fn env_parse<T>(key: &str, what: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let Ok(raw) = std::env::var(key) else {
        return Ok(None);
    };
    raw.trim()
        .parse::<T>()
        .map(Some)
        .map_err(|e| WorkdashError::Config(format!("Invalid {}: {}", what, e)))
}

/// `1/true/yes/on` are true, anything else set is false.
fn env_flag(key: &str) -> Option<bool> {
    let raw = std::env::var(key).ok()?;
    Some(matches!(raw.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::Mutex;

    use once_cell::sync::Lazy;
    use tempfile::Builder;
    use workdash_domain::SourceKind;

    use super::*;

    static ENV_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

    const ALL_VARS: &[&str] = &[
        "WORKDASH_DB_PATH",
        "WORKDASH_DB_POOL_SIZE",
        "WORKDASH_HTTP_TIMEOUT_SECS",
        "WORKDASH_HTTP_MAX_ATTEMPTS",
        "WORKDASH_MAX_CONCURRENCY",
        "WORKDASH_PLUGIN_TIMEOUT_SECS",
        "WORKDASH_LOG_LEVEL",
        "WORKDASH_LOG_JSON",
        "WORKDASH_PLUGINS_JSON",
    ];

    fn clear_env() {
        for key in ALL_VARS {
            std::env::remove_var(key);
        }
    }

    #[test]
    fn env_flag_accepts_common_spellings() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");

        std::env::set_var("WD_TEST_FLAG_YES", "yes");
        std::env::set_var("WD_TEST_FLAG_UPPER", " TRUE ");
        std::env::set_var("WD_TEST_FLAG_OFF", "off");
        std::env::remove_var("WD_TEST_FLAG_MISSING");

        assert_eq!(env_flag("WD_TEST_FLAG_YES"), Some(true));
        assert_eq!(env_flag("WD_TEST_FLAG_UPPER"), Some(true));
        assert_eq!(env_flag("WD_TEST_FLAG_OFF"), Some(false));
        assert_eq!(env_flag("WD_TEST_FLAG_MISSING"), None);

        std::env::remove_var("WD_TEST_FLAG_YES");
        std::env::remove_var("WD_TEST_FLAG_UPPER");
        std::env::remove_var("WD_TEST_FLAG_OFF");
    }

    #[test]
    fn probe_order_prefers_local_files() {
        let names: Vec<_> = candidates_in(Path::new("/srv/app"))
            .into_iter()
            .map(|path| path.to_string_lossy().into_owned())
            .collect();
        assert_eq!(names[0], "/srv/app/config.json");
        assert_eq!(names[3], "/srv/app/workdash.toml");
        assert_eq!(names.last().map(String::as_str), Some("/srv/app/../../config.toml"));
        assert_eq!(names.len(), 8);
    }

    #[test]
    fn env_overrides_every_section() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();

        std::env::set_var("WORKDASH_DB_PATH", "/tmp/workdash.db");
        std::env::set_var("WORKDASH_DB_POOL_SIZE", "2");
        std::env::set_var("WORKDASH_HTTP_TIMEOUT_SECS", "5");
        std::env::set_var("WORKDASH_HTTP_MAX_ATTEMPTS", "3");
        std::env::set_var("WORKDASH_MAX_CONCURRENCY", "4");
        std::env::set_var("WORKDASH_PLUGIN_TIMEOUT_SECS", "20");
        std::env::set_var("WORKDASH_LOG_LEVEL", "debug");
        std::env::set_var("WORKDASH_LOG_JSON", "true");
        std::env::set_var(
            "WORKDASH_PLUGINS_JSON",
            r#"[{"id":"manual","name":"Manual","version":"1.0.0","settings":{"source":"manual"}}]"#,
        );

        let result = load_from_env();
        clear_env();

        let config = result.expect("config from env");
        assert_eq!(config.database.path, "/tmp/workdash.db");
        assert_eq!(config.database.pool_size, 2);
        assert_eq!(config.http.timeout_secs, 5);
        assert_eq!(config.http.max_attempts, 3);
        assert_eq!(config.manager.max_concurrency, 4);
        assert_eq!(config.manager.plugin_timeout_secs, Some(20));
        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.json);
        assert_eq!(config.plugins.len(), 1);
        assert_eq!(config.plugins[0].kind(), SourceKind::Manual);
    }

    #[test]
    fn test_load_from_env_uses_defaults_for_optional_vars() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();
        std::env::set_var("WORKDASH_DB_PATH", "/tmp/workdash.db");

        let result = load_from_env();
        clear_env();

        let config = result.expect("config from env");
        assert_eq!(config.database.pool_size, DatabaseConfig::default().pool_size);
        assert_eq!(config.http, HttpConfig::default());
        assert_eq!(config.manager, ManagerConfig::default());
        assert!(config.plugins.is_empty());
    }

    #[test]
    fn test_load_from_env_missing_db_path() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();

        let err = load_from_env().unwrap_err();
        assert!(matches!(err, WorkdashError::Config(_)), "Should be a Config error");
        assert!(err.message().contains("WORKDASH_DB_PATH"));
    }

    #[test]
    fn non_numeric_env_value_is_rejected() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();
        std::env::set_var("WORKDASH_DB_PATH", "/tmp/workdash.db");
        std::env::set_var("WORKDASH_MAX_CONCURRENCY", "lots");

        let result = load_from_env();
        clear_env();

        let err = result.unwrap_err();
        assert!(matches!(err, WorkdashError::Config(_)));
        assert!(err.message().contains("max concurrency"));
    }

    #[test]
    fn test_load_from_env_invalid_plugins_json() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();
        std::env::set_var("WORKDASH_DB_PATH", "/tmp/workdash.db");
        std::env::set_var("WORKDASH_PLUGINS_JSON", r#"[{"id":"x","settings":{"source":"jira"}}]"#);

        let result = load_from_env();
        clear_env();

        assert!(matches!(result, Err(WorkdashError::Config(_))));
    }

    #[test]
    fn json_file_with_notion_plugin() {
        let mut file = Builder::new().suffix(".json").tempfile().expect("temp file");
        write!(
            file,
            r#"{{
                "database": {{ "path": "manual.db" }},
                "manager": {{ "max_concurrency": 2 }},
                "plugins": [
                    {{ "id": "notion", "name": "Notion", "version": "1.0.0",
                       "settings": {{ "source": "notion", "integrationSecret": "secret" }} }}
                ]
            }}"#
        )
        .expect("write config");

        let config = load_from_file(Some(file.path().to_path_buf())).expect("config loads");
        assert_eq!(config.database.path, "manual.db");
        assert_eq!(config.manager.max_concurrency, 2);
        assert_eq!(config.plugins[0].kind(), SourceKind::Notion);
    }

    #[test]
    fn toml_file_with_airtable_plugin() {
        let mut file = Builder::new().suffix(".toml").tempfile().expect("temp file");
        write!(
            file,
            r#"
[database]
path = "manual.db"
pool_size = 1

[http]
timeout_secs = 10

[[plugins]]
id = "airtable"
name = "Airtable"
version = "1.0.0"

[plugins.settings]
source = "airtable"
apiKey = "key"
baseId = "app123"
"#
        )
        .expect("write config");

        let config = load_from_file(Some(file.path().to_path_buf())).expect("config loads");
        assert_eq!(config.database.pool_size, 1);
        assert_eq!(config.http.timeout_secs, 10);
        assert_eq!(config.http.max_attempts, 1);
        assert_eq!(config.plugins[0].kind(), SourceKind::Airtable);
    }

    #[test]
    fn test_load_from_file_missing_path() {
        let err = load_from_file(Some(PathBuf::from("/definitely/not/here.json"))).unwrap_err();
        assert!(err.message().contains("Config file not found"));
    }

    #[test]
    fn test_unsupported_extension() {
        let err = decode("path: x", Path::new("config.yaml")).unwrap_err();
        assert!(err.message().contains("Unsupported config format"));
    }
}
