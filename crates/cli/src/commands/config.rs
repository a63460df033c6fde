use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use hearth_core::config::{AppConfig, LoadOptions};
use secrecy::ExposeSecret;
use toml::Value;

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];

    let mut push = |key: &str, value: &str, env_keys: &[&str]| {
        lines.push(render_line(
            key,
            value,
            field_source(key, env_keys, config_file_doc.as_ref(), config_file_path.as_deref()),
        ));
    };

    push(
        "server.bind_address",
        &config.server.bind_address,
        &["HEARTH_SERVER_BIND_ADDRESS"],
    );
    push("server.port", &config.server.port.to_string(), &["HEARTH_SERVER_PORT"]);
    push(
        "server.graceful_shutdown_secs",
        &config.server.graceful_shutdown_secs.to_string(),
        &["HEARTH_SERVER_GRACEFUL_SHUTDOWN_SECS"],
    );

    push("llm.provider", &format!("{:?}", config.llm.provider), &["HEARTH_LLM_PROVIDER"]);
    push("llm.model", &config.llm.model, &["HEARTH_LLM_MODEL"]);
    push(
        "llm.base_url",
        config.llm.base_url.as_deref().unwrap_or("<unset>"),
        &["HEARTH_LLM_BASE_URL"],
    );

    let api_key = match &config.llm.api_key {
        Some(key) => redact_token(key.expose_secret()),
        None => "<unset>".to_string(),
    };
    push("llm.api_key", &api_key, &["HEARTH_LLM_API_KEY"]);
    push("llm.timeout_secs", &config.llm.timeout_secs.to_string(), &["HEARTH_LLM_TIMEOUT_SECS"]);
    push("llm.max_retries", &config.llm.max_retries.to_string(), &["HEARTH_LLM_MAX_RETRIES"]);

    push("logging.level", &config.logging.level, &["HEARTH_LOGGING_LEVEL", "HEARTH_LOG_LEVEL"]);
    push(
        "logging.format",
        &format!("{:?}", config.logging.format),
        &["HEARTH_LOGGING_FORMAT", "HEARTH_LOG_FORMAT"],
    );

    lines.join("\n")
}

fn detect_config_path() -> Option<PathBuf> {
    let root = PathBuf::from("hearth.toml");
    if root.exists() {
        return Some(root);
    }

    let nested = PathBuf::from("config/hearth.toml");
    if nested.exists() {
        return Some(nested);
    }

    None
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
    for env_key in env_keys {
        if env::var_os(env_key).is_some() {
            return format!("env ({env_key})");
        }
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

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

fn redact_token(token: &str) -> String {
    let trimmed = token.trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }

    if let Some((prefix, _)) = trimmed.split_once('-') {
        return format!("{prefix}-***");
    }

    "<redacted>".to_string()
}
