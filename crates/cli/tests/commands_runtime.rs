use std::env;
use std::sync::{Mutex, OnceLock};

use hearth_cli::commands::{config, doctor};
use serde_json::Value;

#[test]
fn config_reports_defaults_with_source_attribution() {
    with_env(&[], || {
        let output = config::run();

        assert!(output.starts_with("effective config (source precedence: env > file > default):"));
        assert!(output.contains("- llm.provider = Scripted (source: default)"));
        assert!(output.contains("- llm.api_key = <unset> (source: default)"));
        assert!(output.contains("- server.port = 8080 (source: default)"));
    });
}

#[test]
fn config_attributes_environment_overrides() {
    with_env(
        &[("HEARTH_LLM_MODEL", "llama3"), ("HEARTH_LOG_LEVEL", "debug")],
        || {
            let output = config::run();

            assert!(output.contains("- llm.model = llama3 (source: env (HEARTH_LLM_MODEL))"));
            assert!(output.contains("- logging.level = debug (source: env (HEARTH_LOG_LEVEL))"));
        },
    );
}

#[test]
fn config_never_prints_a_raw_api_key() {
    with_env(
        &[("HEARTH_LLM_PROVIDER", "openai"), ("HEARTH_LLM_API_KEY", "sk-very-secret-value")],
        || {
            let output = config::run();

            assert!(!output.contains("sk-very-secret-value"));
            assert!(output.contains("- llm.api_key = sk-*** (source: env (HEARTH_LLM_API_KEY))"));
        },
    );
}

#[test]
fn doctor_passes_with_the_default_scripted_provider() {
    with_env(&[], || {
        let report = parse_payload(&doctor::run(true));

        assert_eq!(report["overall_status"], "pass");
        let checks = report["checks"].as_array().expect("checks array");
        assert_eq!(checks.len(), 3);
        assert_eq!(checks[0]["name"], "config_validation");
        assert_eq!(checks[1]["name"], "llm_provider_readiness");
        assert_eq!(checks[2]["name"], "engine_self_check");
        assert!(checks.iter().all(|check| check["status"] == "pass"));
    });
}

#[test]
fn doctor_fails_when_openai_is_selected_without_a_key() {
    with_env(&[("HEARTH_LLM_PROVIDER", "openai")], || {
        let report = parse_payload(&doctor::run(true));

        assert_eq!(report["overall_status"], "fail");
        let checks = report["checks"].as_array().expect("checks array");
        assert_eq!(checks[0]["status"], "fail");
        assert_eq!(checks[1]["status"], "skipped");
        // The engine check still runs; it does not depend on configuration.
        assert_eq!(checks[2]["status"], "pass");
    });
}

#[test]
fn doctor_human_output_lists_every_check() {
    with_env(&[], || {
        let output = doctor::run(false);

        assert!(output.starts_with("doctor: all readiness checks passed"));
        assert!(output.contains("- [ok] config_validation:"));
        assert!(output.contains("- [ok] llm_provider_readiness:"));
        assert!(output.contains("- [ok] engine_self_check:"));
    });
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "HEARTH_SERVER_BIND_ADDRESS",
        "HEARTH_SERVER_PORT",
        "HEARTH_SERVER_GRACEFUL_SHUTDOWN_SECS",
        "HEARTH_LLM_PROVIDER",
        "HEARTH_LLM_API_KEY",
        "HEARTH_LLM_BASE_URL",
        "HEARTH_LLM_MODEL",
        "HEARTH_LLM_TIMEOUT_SECS",
        "HEARTH_LLM_MAX_RETRIES",
        "HEARTH_LOGGING_LEVEL",
        "HEARTH_LOGGING_FORMAT",
        "HEARTH_LOG_LEVEL",
        "HEARTH_LOG_FORMAT",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in &keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, value) in previous_values {
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
    }
}
