use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use flightbook_core::config::{AppConfig, LoadOptions};
use secrecy::ExposeSecret;
use toml::Value;

struct Field {
    key: &'static str,
    env_keys: &'static [&'static str],
    value: String,
}

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for field in fields(&config) {
        let source = field_source(
            field.key,
            field.env_keys,
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        );
        lines.push(format!("- {} = {} (source: {source})", field.key, field.value));
    }

    lines.join("\n")
}

fn fields(config: &AppConfig) -> Vec<Field> {
    let auth_token = config
        .notifications
        .auth_token
        .as_ref()
        .map(|token| redact_token(token.expose_secret()))
        .unwrap_or_else(|| "<unset>".to_string());

    vec![
        Field {
            key: "database.url",
            env_keys: &["FLIGHTBOOK_DATABASE_URL"],
            value: config.database.url.clone(),
        },
        Field {
            key: "database.max_connections",
            env_keys: &["FLIGHTBOOK_DATABASE_MAX_CONNECTIONS"],
            value: config.database.max_connections.to_string(),
        },
        Field {
            key: "database.timeout_secs",
            env_keys: &["FLIGHTBOOK_DATABASE_TIMEOUT_SECS"],
            value: config.database.timeout_secs.to_string(),
        },
        Field {
            key: "blob_store.root_dir",
            env_keys: &["FLIGHTBOOK_BLOB_ROOT_DIR"],
            value: config.blob_store.root_dir.display().to_string(),
        },
        Field {
            key: "blob_store.key_prefix",
            env_keys: &["FLIGHTBOOK_BLOB_KEY_PREFIX"],
            value: config.blob_store.key_prefix.clone(),
        },
        Field {
            key: "notifications.enabled",
            env_keys: &["FLIGHTBOOK_NOTIFICATIONS_ENABLED"],
            value: config.notifications.enabled.to_string(),
        },
        Field {
            key: "notifications.webhook_url",
            env_keys: &["FLIGHTBOOK_NOTIFICATIONS_WEBHOOK_URL"],
            value: config.notifications.webhook_url.clone().unwrap_or_else(|| "<unset>".into()),
        },
        Field {
            key: "notifications.auth_token",
            env_keys: &["FLIGHTBOOK_NOTIFICATIONS_AUTH_TOKEN"],
            value: auth_token,
        },
        Field {
            key: "notifications.subject_prefix",
            env_keys: &["FLIGHTBOOK_NOTIFICATIONS_SUBJECT_PREFIX"],
            value: config.notifications.subject_prefix.clone(),
        },
        Field {
            key: "server.bind_address",
            env_keys: &["FLIGHTBOOK_SERVER_BIND_ADDRESS"],
            value: config.server.bind_address.clone(),
        },
        Field {
            key: "server.port",
            env_keys: &["FLIGHTBOOK_SERVER_PORT"],
            value: config.server.port.to_string(),
        },
        Field {
            key: "server.graceful_shutdown_secs",
            env_keys: &["FLIGHTBOOK_SERVER_GRACEFUL_SHUTDOWN_SECS"],
            value: config.server.graceful_shutdown_secs.to_string(),
        },
        Field {
            key: "runtime.timezone",
            env_keys: &["FLIGHTBOOK_RUNTIME_TIMEZONE"],
            value: config.runtime.timezone.clone(),
        },
        Field {
            key: "logging.level",
            env_keys: &["FLIGHTBOOK_LOGGING_LEVEL", "FLIGHTBOOK_LOG_LEVEL"],
            value: config.logging.level.clone(),
        },
        Field {
            key: "logging.format",
            env_keys: &["FLIGHTBOOK_LOGGING_FORMAT", "FLIGHTBOOK_LOG_FORMAT"],
            value: format!("{:?}", config.logging.format),
        },
    ]
}

fn detect_config_path() -> Option<PathBuf> {
    [PathBuf::from("flightbook.toml"), PathBuf::from("config/flightbook.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn redact_token(token: &str) -> String {
    let trimmed = token.trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }

    let visible: String = trimmed.chars().take(4).collect();
    if trimmed.chars().count() > 8 {
        return format!("{visible}***");
    }

    "<redacted>".to_string()
}
