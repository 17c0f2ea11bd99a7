use std::env;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub blob_store: BlobStoreConfig,
    pub notifications: NotificationConfig,
    pub server: ServerConfig,
    pub runtime: RuntimeConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct BlobStoreConfig {
    pub root_dir: PathBuf,
    pub key_prefix: String,
}

#[derive(Clone, Debug)]
pub struct NotificationConfig {
    pub enabled: bool,
    pub webhook_url: Option<String>,
    pub auth_token: Option<SecretString>,
    pub subject_prefix: String,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub graceful_shutdown_secs: u64,
}

#[derive(Clone, Debug)]
pub struct RuntimeConfig {
    pub timezone: String,
}

impl RuntimeConfig {
    /// Points `TZ` at the configured zone so booking timestamps are taken in
    /// it. Call while the process is still single-threaded.
    pub fn apply_process_timezone(&self) {
        env::set_var("TZ", self.timezone.trim());
    }
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub database_url: Option<String>,
    pub blob_root_dir: Option<PathBuf>,
    pub log_level: Option<String>,
    pub notifications_enabled: Option<bool>,
    pub notifications_webhook_url: Option<String>,
    pub server_port: Option<u16>,
    pub timezone: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite://flightbook.db?mode=rwc".to_string(),
                max_connections: 5,
                timeout_secs: 30,
            },
            blob_store: BlobStoreConfig {
                root_dir: PathBuf::from("data/blobs"),
                key_prefix: "flight".to_string(),
            },
            notifications: NotificationConfig {
                enabled: false,
                webhook_url: None,
                auth_token: None,
                subject_prefix: "[flightbook]".to_string(),
            },
            server: ServerConfig {
                bind_address: "127.0.0.1".to_string(),
                port: 8080,
                graceful_shutdown_secs: 15,
            },
            runtime: RuntimeConfig { timezone: "America/New_York".to_string() },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected =
                options.config_path.unwrap_or_else(|| PathBuf::from("flightbook.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(database) = patch.database {
            if let Some(url) = database.url {
                self.database.url = url;
            }
            if let Some(max_connections) = database.max_connections {
                self.database.max_connections = max_connections;
            }
            if let Some(timeout_secs) = database.timeout_secs {
                self.database.timeout_secs = timeout_secs;
            }
        }

        if let Some(blob_store) = patch.blob_store {
            if let Some(root_dir) = blob_store.root_dir {
                self.blob_store.root_dir = root_dir;
            }
            if let Some(key_prefix) = blob_store.key_prefix {
                self.blob_store.key_prefix = key_prefix;
            }
        }

        if let Some(notifications) = patch.notifications {
            if let Some(enabled) = notifications.enabled {
                self.notifications.enabled = enabled;
            }
            if let Some(webhook_url) = notifications.webhook_url {
                self.notifications.webhook_url = Some(webhook_url);
            }
            if let Some(auth_token_value) = notifications.auth_token {
                self.notifications.auth_token = Some(secret_value(auth_token_value));
            }
            if let Some(subject_prefix) = notifications.subject_prefix {
                self.notifications.subject_prefix = subject_prefix;
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
            if let Some(graceful_shutdown_secs) = server.graceful_shutdown_secs {
                self.server.graceful_shutdown_secs = graceful_shutdown_secs;
            }
        }

        if let Some(runtime) = patch.runtime {
            if let Some(timezone) = runtime.timezone {
                self.runtime.timezone = timezone;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("FLIGHTBOOK_DATABASE_URL") {
            self.database.url = value;
        }
        if let Some(value) = read_env("FLIGHTBOOK_DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections =
                parse_env("FLIGHTBOOK_DATABASE_MAX_CONNECTIONS", &value)?;
        }
        if let Some(value) = read_env("FLIGHTBOOK_DATABASE_TIMEOUT_SECS") {
            self.database.timeout_secs = parse_env("FLIGHTBOOK_DATABASE_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("FLIGHTBOOK_BLOB_ROOT_DIR") {
            self.blob_store.root_dir = PathBuf::from(value);
        }
        if let Some(value) = read_env("FLIGHTBOOK_BLOB_KEY_PREFIX") {
            self.blob_store.key_prefix = value;
        }

        if let Some(value) = read_env("FLIGHTBOOK_NOTIFICATIONS_ENABLED") {
            self.notifications.enabled = parse_env("FLIGHTBOOK_NOTIFICATIONS_ENABLED", &value)?;
        }
        if let Some(value) = read_env("FLIGHTBOOK_NOTIFICATIONS_WEBHOOK_URL") {
            self.notifications.webhook_url = Some(value);
        }
        if let Some(value) = read_env("FLIGHTBOOK_NOTIFICATIONS_AUTH_TOKEN") {
            self.notifications.auth_token = Some(secret_value(value));
        }
        if let Some(value) = read_env("FLIGHTBOOK_NOTIFICATIONS_SUBJECT_PREFIX") {
            self.notifications.subject_prefix = value;
        }

        if let Some(value) = read_env("FLIGHTBOOK_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("FLIGHTBOOK_SERVER_PORT") {
            self.server.port = parse_env("FLIGHTBOOK_SERVER_PORT", &value)?;
        }
        if let Some(value) = read_env("FLIGHTBOOK_SERVER_GRACEFUL_SHUTDOWN_SECS") {
            self.server.graceful_shutdown_secs =
                parse_env("FLIGHTBOOK_SERVER_GRACEFUL_SHUTDOWN_SECS", &value)?;
        }

        if let Some(value) = read_env("FLIGHTBOOK_RUNTIME_TIMEZONE") {
            self.runtime.timezone = value;
        }

        let log_level =
            read_env("FLIGHTBOOK_LOGGING_LEVEL").or_else(|| read_env("FLIGHTBOOK_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("FLIGHTBOOK_LOGGING_FORMAT").or_else(|| read_env("FLIGHTBOOK_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(database_url) = overrides.database_url {
            self.database.url = database_url;
        }
        if let Some(blob_root_dir) = overrides.blob_root_dir {
            self.blob_store.root_dir = blob_root_dir;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(enabled) = overrides.notifications_enabled {
            self.notifications.enabled = enabled;
        }
        if let Some(webhook_url) = overrides.notifications_webhook_url {
            self.notifications.webhook_url = Some(webhook_url);
        }
        if let Some(port) = overrides.server_port {
            self.server.port = port;
        }
        if let Some(timezone) = overrides.timezone {
            self.runtime.timezone = timezone;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_database(&self.database)?;
        validate_blob_store(&self.blob_store)?;
        validate_notifications(&self.notifications)?;
        validate_server(&self.server)?;
        validate_runtime(&self.runtime)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("flightbook.toml"), PathBuf::from("config/flightbook.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_database(database: &DatabaseConfig) -> Result<(), ConfigError> {
    let url = database.url.trim();
    let sqlite_url =
        url.starts_with("sqlite://") || url.starts_with("sqlite::") || url == ":memory:";
    if !sqlite_url {
        return Err(ConfigError::Validation(
            "database.url must be a sqlite URL (`sqlite://...`, `sqlite::...`, or `:memory:`)"
                .to_string(),
        ));
    }

    if database.max_connections == 0 {
        return Err(ConfigError::Validation(
            "database.max_connections must be greater than zero".to_string(),
        ));
    }

    if database.timeout_secs == 0 || database.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "database.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_blob_store(blob_store: &BlobStoreConfig) -> Result<(), ConfigError> {
    if blob_store.root_dir.as_os_str().is_empty() {
        return Err(ConfigError::Validation("blob_store.root_dir must not be empty".to_string()));
    }

    let prefix = blob_store.key_prefix.as_str();
    let relative = !prefix.trim().is_empty()
        && !prefix.starts_with('/')
        && Path::new(prefix)
            .components()
            .all(|component| matches!(component, Component::Normal(_)));
    if !relative {
        return Err(ConfigError::Validation(
            "blob_store.key_prefix must be relative, without `.` or `..` segments".to_string(),
        ));
    }

    Ok(())
}

fn validate_notifications(notifications: &NotificationConfig) -> Result<(), ConfigError> {
    if let Some(url) = &notifications.webhook_url {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ConfigError::Validation(
                "notifications.webhook_url must start with http:// or https://".to_string(),
            ));
        }
    }

    if notifications.enabled && notifications.webhook_url.is_none() {
        return Err(ConfigError::Validation(
            "notifications.enabled is true but notifications.webhook_url is not set".to_string(),
        ));
    }

    let blank_token = notifications
        .auth_token
        .as_ref()
        .map(|token| token.expose_secret().trim().is_empty())
        .unwrap_or(false);
    if blank_token {
        return Err(ConfigError::Validation(
            "notifications.auth_token must not be blank when set".to_string(),
        ));
    }

    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.port == 0 {
        return Err(ConfigError::Validation("server.port must be greater than zero".to_string()));
    }

    if server.graceful_shutdown_secs == 0 {
        return Err(ConfigError::Validation(
            "server.graceful_shutdown_secs must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_runtime(runtime: &RuntimeConfig) -> Result<(), ConfigError> {
    let timezone = runtime.timezone.trim();
    if timezone == "UTC" {
        return Ok(());
    }

    let well_formed = timezone.contains('/')
        && timezone.split('/').all(|part| {
            !part.is_empty()
                && part.chars().all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '_' | '-' | '+'))
        });
    if !well_formed {
        return Err(ConfigError::Validation(format!(
            "runtime.timezone `{timezone}` must be an IANA zone name such as `America/New_York` or `UTC`"
        )));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_env<T: FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse::<T>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    database: Option<DatabasePatch>,
    blob_store: Option<BlobStorePatch>,
    notifications: Option<NotificationPatch>,
    server: Option<ServerPatch>,
    runtime: Option<RuntimePatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct DatabasePatch {
    url: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct BlobStorePatch {
    root_dir: Option<PathBuf>,
    key_prefix: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct NotificationPatch {
    enabled: Option<bool>,
    webhook_url: Option<String>,
    auth_token: Option<String>,
    subject_prefix: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
    graceful_shutdown_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct RuntimePatch {
    timezone: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::fs;
    use std::io;
    use std::path::PathBuf;
    use std::sync::{Mutex, OnceLock};

    use secrecy::ExposeSecret;
    use tempfile::TempDir;

    use super::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat, RuntimeConfig};
    use crate::domain::booking::{fixtures::complete_slots, BookingRecord};

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    fn env_lock() -> &'static Mutex<()> {
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    fn clear_vars(vars: &[&str]) {
        for var in vars {
            env::remove_var(var);
        }
    }

    fn ensure(condition: bool, message: &'static str) -> Result<(), String> {
        if condition {
            Ok(())
        } else {
            Err(message.to_string())
        }
    }

    #[test]
    fn defaults_are_valid_and_pin_new_york_timezone() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let config = AppConfig::load(LoadOptions::default())
            .map_err(|err| format!("config load failed: {err}"))?;

        ensure(config.runtime.timezone == "America/New_York", "default timezone")?;
        ensure(config.blob_store.key_prefix == "flight", "default blob prefix")?;
        ensure(!config.notifications.enabled, "notifications are off by default")?;
        ensure(
            matches!(config.logging.format, LogFormat::Compact),
            "default logging format should be compact",
        )
    }

    #[test]
    fn file_load_supports_env_interpolation() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("TEST_FLIGHTBOOK_WEBHOOK", "https://alerts.example.com/hook");
        env::set_var("TEST_FLIGHTBOOK_TOKEN", "token-from-env");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("flightbook.toml");
            fs::write(
                &path,
                r#"
[notifications]
enabled = true
webhook_url = "${TEST_FLIGHTBOOK_WEBHOOK}"
auth_token = "${TEST_FLIGHTBOOK_TOKEN}"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config =
                AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
                    .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.notifications.webhook_url.as_deref()
                    == Some("https://alerts.example.com/hook"),
                "webhook url should be loaded from environment",
            )?;
            ensure(
                config
                    .notifications
                    .auth_token
                    .as_ref()
                    .map(|token| token.expose_secret() == "token-from-env")
                    .unwrap_or(false),
                "auth token should be loaded from environment",
            )?;
            Ok(())
        })();

        clear_vars(&["TEST_FLIGHTBOOK_WEBHOOK", "TEST_FLIGHTBOOK_TOKEN"]);
        result
    }

    #[test]
    fn missing_interpolation_variable_is_reported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(&["TEST_FLIGHTBOOK_UNSET"]);

        let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
        let path = dir.path().join("flightbook.toml");
        fs::write(&path, "[database]\nurl = \"${TEST_FLIGHTBOOK_UNSET}\"\n")
            .map_err(|err| err.to_string())?;

        let error =
            match AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
            {
                Ok(_) => return Err("expected interpolation failure".to_string()),
                Err(error) => error,
            };
        ensure(
            matches!(error, ConfigError::MissingEnvInterpolation { ref var } if var == "TEST_FLIGHTBOOK_UNSET"),
            "interpolation error should name the variable",
        )
    }

    #[test]
    fn logging_env_aliases_are_supported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("FLIGHTBOOK_LOG_LEVEL", "warn");
        env::set_var("FLIGHTBOOK_LOG_FORMAT", "pretty");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.logging.level == "warn", "warning log level should be set from env var")?;
            ensure(
                matches!(config.logging.format, LogFormat::Pretty),
                "pretty logging format should be set from env var",
            )?;
            Ok(())
        })();

        clear_vars(&["FLIGHTBOOK_LOG_LEVEL", "FLIGHTBOOK_LOG_FORMAT"]);
        result
    }

    #[test]
    fn precedence_defaults_file_env_overrides() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("FLIGHTBOOK_DATABASE_URL", "sqlite://from-env.db");
        env::set_var("FLIGHTBOOK_BLOB_ROOT_DIR", "/var/lib/flightbook/env-blobs");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("flightbook.toml");
            fs::write(
                &path,
                r#"
[database]
url = "sqlite://from-file.db"

[blob_store]
root_dir = "/var/lib/flightbook/file-blobs"
key_prefix = "bookings"

[runtime]
timezone = "Europe/Lisbon"

[logging]
level = "warn"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config = AppConfig::load(LoadOptions {
                config_path: Some(path),
                overrides: ConfigOverrides {
                    database_url: Some("sqlite://from-override.db".to_string()),
                    log_level: Some("debug".to_string()),
                    ..ConfigOverrides::default()
                },
                ..LoadOptions::default()
            })
            .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.database.url == "sqlite://from-override.db",
                "override database url should win",
            )?;
            ensure(config.logging.level == "debug", "overridden log level should be debug")?;
            ensure(
                config.blob_store.root_dir == PathBuf::from("/var/lib/flightbook/env-blobs"),
                "env blob root should win over file and defaults",
            )?;
            ensure(config.blob_store.key_prefix == "bookings", "file key prefix should apply")?;
            ensure(config.runtime.timezone == "Europe/Lisbon", "file timezone should apply")?;
            Ok(())
        })();

        clear_vars(&["FLIGHTBOOK_DATABASE_URL", "FLIGHTBOOK_BLOB_ROOT_DIR"]);
        result
    }

    #[test]
    fn validation_fails_fast_with_actionable_error() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("FLIGHTBOOK_NOTIFICATIONS_ENABLED", "true");

        let result = (|| -> Result<(), String> {
            let error = match AppConfig::load(LoadOptions::default()) {
                Ok(_) => {
                    return Err("expected validation failure but config load succeeded".to_string())
                }
                Err(error) => error,
            };
            let has_message = matches!(
                error,
                ConfigError::Validation(ref message) if message.contains("notifications.webhook_url")
            );
            ensure(has_message, "validation failure should mention notifications.webhook_url")
        })();

        clear_vars(&["FLIGHTBOOK_NOTIFICATIONS_ENABLED"]);
        result
    }

    #[test]
    fn malformed_timezone_is_rejected() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let result = AppConfig::load(LoadOptions {
            overrides: ConfigOverrides {
                timezone: Some("Eastern Time".to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        });

        ensure(
            matches!(result, Err(ConfigError::Validation(ref message)) if message.contains("runtime.timezone")),
            "timezone validation should fail",
        )
    }

    #[test]
    fn key_prefix_must_match_blob_key_rules() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        for prefix in ["./flight", "flight/../other", "/flight"] {
            env::set_var("FLIGHTBOOK_BLOB_KEY_PREFIX", prefix);
            let result = AppConfig::load(LoadOptions::default());
            clear_vars(&["FLIGHTBOOK_BLOB_KEY_PREFIX"]);

            let rejected = matches!(
                result,
                Err(ConfigError::Validation(ref message)) if message.contains("key_prefix")
            );
            if !rejected {
                return Err(format!("prefix `{prefix}` should be rejected"));
            }
        }

        env::set_var("FLIGHTBOOK_BLOB_KEY_PREFIX", "archive/flight");
        let result = AppConfig::load(LoadOptions::default());
        clear_vars(&["FLIGHTBOOK_BLOB_KEY_PREFIX"]);
        let config = result.map_err(|err| format!("nested prefix should load: {err}"))?;
        ensure(config.blob_store.key_prefix == "archive/flight", "nested prefix kept")
    }

    #[test]
    fn process_timezone_drives_booking_timestamps() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        let previous = env::var("TZ").ok();

        let offsets = ["FBT-3", "UTC"]
            .into_iter()
            .map(|timezone| {
                RuntimeConfig { timezone: timezone.to_string() }.apply_process_timezone();
                BookingRecord::from_slots(&complete_slots("Business"))
                    .map(|record| record.recorded_at.offset().local_minus_utc())
                    .map_err(|err| err.to_string())
            })
            .collect::<Result<Vec<_>, _>>();

        match previous {
            Some(value) => env::set_var("TZ", value),
            None => env::remove_var("TZ"),
        }

        let offsets = offsets?;
        ensure(offsets[0] == 3 * 3600, "fixed +03:00 zone should stamp a +03:00 offset")?;
        ensure(offsets[1] == 0, "UTC should stamp a zero offset")
    }

    #[test]
    fn invalid_numeric_env_override_is_reported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("FLIGHTBOOK_SERVER_PORT", "eighty");
        let result = AppConfig::load(LoadOptions::default());
        clear_vars(&["FLIGHTBOOK_SERVER_PORT"]);

        ensure(
            matches!(result, Err(ConfigError::InvalidEnvOverride { ref key, .. }) if key == "FLIGHTBOOK_SERVER_PORT"),
            "port override should be rejected",
        )
    }

    #[test]
    fn secret_values_are_not_leaked_by_debug() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("FLIGHTBOOK_NOTIFICATIONS_AUTH_TOKEN", "hook-secret-value");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;
            let debug = format!("{config:?}");

            ensure(
                !debug.contains("hook-secret-value"),
                "debug output should not contain the webhook token",
            )
        })();

        clear_vars(&["FLIGHTBOOK_NOTIFICATIONS_AUTH_TOKEN"]);
        result
    }

    #[test]
    fn required_file_must_exist() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let result = AppConfig::load(LoadOptions {
            config_path: Some(PathBuf::from("/nonexistent/flightbook.toml")),
            require_file: true,
            ..LoadOptions::default()
        });

        ensure(
            matches!(result, Err(ConfigError::MissingConfigFile(_))),
            "missing required file should be reported",
        )
    }
}
