use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use toml::Value;

use crate::commands::{load_config, CommandResult};

#[derive(Debug, Serialize)]
struct ConfigEntry {
    key: &'static str,
    value: String,
    source: String,
}

pub fn run() -> CommandResult {
    let config = match load_config("config") {
        Ok(config) => config,
        Err(result) => return result,
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());
    let source = |key_path: &str, env_keys: &[&str]| {
        field_source(key_path, env_keys, config_file_doc.as_ref(), config_file_path.as_deref())
    };

    let reference_data = config
        .engine
        .reference_data_path
        .as_ref()
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| "<embedded>".to_string());

    let entries = vec![
        ConfigEntry {
            key: "database.url",
            value: config.database.url.clone(),
            source: source("database.url", &["FENGSHUI_DATABASE_URL"]),
        },
        ConfigEntry {
            key: "database.max_connections",
            value: config.database.max_connections.to_string(),
            source: source("database.max_connections", &["FENGSHUI_DATABASE_MAX_CONNECTIONS"]),
        },
        ConfigEntry {
            key: "database.timeout_secs",
            value: config.database.timeout_secs.to_string(),
            source: source("database.timeout_secs", &["FENGSHUI_DATABASE_TIMEOUT_SECS"]),
        },
        ConfigEntry {
            key: "logging.level",
            value: config.logging.level.clone(),
            source: source("logging.level", &["FENGSHUI_LOGGING_LEVEL", "FENGSHUI_LOG_LEVEL"]),
        },
        ConfigEntry {
            key: "logging.format",
            value: format!("{:?}", config.logging.format).to_ascii_lowercase(),
            source: source("logging.format", &["FENGSHUI_LOGGING_FORMAT", "FENGSHUI_LOG_FORMAT"]),
        },
        ConfigEntry {
            key: "engine.reference_data_path",
            value: reference_data,
            source: source(
                "engine.reference_data_path",
                &["FENGSHUI_ENGINE_REFERENCE_DATA_PATH"],
            ),
        },
        ConfigEntry {
            key: "engine.default_rank_limit",
            value: config.engine.default_rank_limit.to_string(),
            source: source("engine.default_rank_limit", &["FENGSHUI_ENGINE_DEFAULT_RANK_LIMIT"]),
        },
        ConfigEntry {
            key: "engine.max_rank_limit",
            value: config.engine.max_rank_limit.to_string(),
            source: source("engine.max_rank_limit", &["FENGSHUI_ENGINE_MAX_RANK_LIMIT"]),
        },
    ];

    CommandResult::success_with_data(
        "config",
        "effective config (source precedence: env > file > default)",
        entries,
    )
}

fn detect_config_path() -> Option<PathBuf> {
    [PathBuf::from("fengshui.toml"), PathBuf::from("config/fengshui.toml")]
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
