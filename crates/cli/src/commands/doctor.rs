use hearth_core::config::{AppConfig, LlmProvider, LoadOptions};
use hearth_core::{compute_repayment, compute_stamp_duty, LoanTerms, StampDutyQuery};
use secrecy::ExposeSecret;
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(json_output: bool) -> String {
    let report = build_report();

    if json_output {
        return serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        });
    }

    render_human(&report)
}

fn build_report() -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            checks.push(check_provider_readiness(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            checks.push(DoctorCheck {
                name: "llm_provider_readiness",
                status: CheckStatus::Skipped,
                details: "skipped because configuration did not load".to_string(),
            });
        }
    }

    // The engine is pure, so this check never depends on configuration.
    checks.push(check_engine_reference_figures());

    let all_pass = checks
        .iter()
        .all(|check| check.status == CheckStatus::Pass);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_provider_readiness(config: &AppConfig) -> DoctorCheck {
    let (status, details) = match config.llm.provider {
        LlmProvider::Scripted => {
            (CheckStatus::Pass, "scripted provider needs no credentials".to_string())
        }
        LlmProvider::OpenAi => match &config.llm.api_key {
            Some(key) => (
                CheckStatus::Pass,
                format!("api key present ({})", redact_prefix(key.expose_secret())),
            ),
            None => (CheckStatus::Fail, "openai provider has no api key".to_string()),
        },
        LlmProvider::Ollama => match &config.llm.base_url {
            Some(url) => (CheckStatus::Pass, format!("ollama endpoint configured (`{url}`)")),
            None => (CheckStatus::Fail, "ollama provider has no base url".to_string()),
        },
    };

    DoctorCheck { name: "llm_provider_readiness", status, details }
}

/// Recomputes two figures with well-known answers. A failure here means the
/// binary was built against a broken engine, not that the host is misconfigured.
fn check_engine_reference_figures() -> DoctorCheck {
    let repayment = compute_repayment(&LoanTerms {
        principal: 300_000.0,
        annual_rate_percent: 4.5,
        term_years: 25,
    });
    let stamp_duty = compute_stamp_duty(&StampDutyQuery {
        property_value: 300_000.0,
        is_first_time_buyer: false,
        is_additional_property: false,
    });

    let repayment_ok = matches!(&repayment, Ok(result) if result.monthly_payment == 1667.5);
    let stamp_duty_ok = matches!(&stamp_duty, Ok(result) if result.stamp_duty == 2500.0);

    if repayment_ok && stamp_duty_ok {
        DoctorCheck {
            name: "engine_self_check",
            status: CheckStatus::Pass,
            details: "engine reproduced the reference repayment and stamp duty figures"
                .to_string(),
        }
    } else {
        DoctorCheck {
            name: "engine_self_check",
            status: CheckStatus::Fail,
            details: format!(
                "unexpected reference figures: repayment {repayment:?}, stamp duty {stamp_duty:?}"
            ),
        }
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn redact_prefix(token: &str) -> String {
    match token.trim().split_once('-') {
        Some((prefix, _)) => format!("{prefix}-***"),
        None => "<redacted>".to_string(),
    }
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
