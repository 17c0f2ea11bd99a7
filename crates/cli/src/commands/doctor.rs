use flightbook_core::config::{AppConfig, LoadOptions};
use flightbook_db::{connect_with_settings, migrations, ping, DbPool, FsBlobStore};
use serde::Serialize;

use crate::commands::{escape_json, CommandResult};

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

impl DoctorCheck {
    fn pass(name: &'static str, details: impl Into<String>) -> Self {
        Self { name, status: CheckStatus::Pass, details: details.into() }
    }

    fn fail(name: &'static str, details: impl Into<String>) -> Self {
        Self { name, status: CheckStatus::Fail, details: details.into() }
    }

    fn skipped(name: &'static str) -> Self {
        Self {
            name,
            status: CheckStatus::Skipped,
            details: "skipped because configuration did not load".to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(json_output: bool) -> CommandResult {
    let report = build_report();
    let exit_code = if report.overall_status == CheckStatus::Pass { 0 } else { 1 };

    let output = if json_output {
        serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        })
    } else {
        render_human(&report)
    };

    CommandResult { exit_code, output }
}

fn build_report() -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(DoctorCheck::pass(
                "config_validation",
                "configuration loaded and validated",
            ));
            checks.extend(check_stores(&config));
            checks.push(check_notifications(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck::fail("config_validation", error.to_string()));
            checks.push(DoctorCheck::skipped("database_connectivity"));
            checks.push(DoctorCheck::skipped("database_schema"));
            checks.push(DoctorCheck::skipped("blob_store_root"));
            checks.push(DoctorCheck::skipped("admin_notifications"));
        }
    }

    let all_pass = checks.iter().all(|check| check.status == CheckStatus::Pass);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_stores(config: &AppConfig) -> Vec<DoctorCheck> {
    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            let details = format!("failed to initialize async runtime: {error}");
            return vec![
                DoctorCheck::fail("database_connectivity", details.clone()),
                DoctorCheck::fail("database_schema", details.clone()),
                DoctorCheck::fail("blob_store_root", details),
            ];
        }
    };

    runtime.block_on(async {
        let mut checks = Vec::new();

        match connect_with_settings(
            &config.database.url,
            config.database.max_connections,
            config.database.timeout_secs,
        )
        .await
        {
            Ok(pool) => {
                checks.push(match ping(&pool).await {
                    Ok(()) => DoctorCheck::pass(
                        "database_connectivity",
                        format!("connected using `{}`", config.database.url),
                    ),
                    Err(error) => DoctorCheck::fail(
                        "database_connectivity",
                        format!("database query failed: {error}"),
                    ),
                });
                checks.push(check_schema(&pool).await);
                pool.close().await;
            }
            Err(error) => {
                checks.push(DoctorCheck::fail(
                    "database_connectivity",
                    format!("failed to connect to database: {error}"),
                ));
                checks.push(DoctorCheck::fail(
                    "database_schema",
                    "skipped because the database is unreachable",
                ));
            }
        }

        checks.push(match FsBlobStore::new(&config.blob_store.root_dir).await {
            Ok(store) => DoctorCheck::pass(
                "blob_store_root",
                format!(
                    "blobs are written under `{}/{}`",
                    store.root_dir().display(),
                    config.blob_store.key_prefix
                ),
            ),
            Err(error) => DoctorCheck::fail("blob_store_root", error.to_string()),
        });

        checks
    })
}

async fn check_schema(pool: &DbPool) -> DoctorCheck {
    let known = migrations::known_count();
    match migrations::applied_count(pool).await {
        Ok(applied) if applied >= known => {
            DoctorCheck::pass("database_schema", format!("{applied} of {known} migrations applied"))
        }
        Ok(applied) => DoctorCheck::fail(
            "database_schema",
            format!("{applied} of {known} migrations applied; run `flightbook migrate`"),
        ),
        Err(error) => {
            DoctorCheck::fail("database_schema", format!("cannot read migrations: {error}"))
        }
    }
}

fn check_notifications(config: &AppConfig) -> DoctorCheck {
    let notifications = &config.notifications;
    match (&notifications.webhook_url, notifications.enabled) {
        (Some(url), true) => DoctorCheck::pass(
            "admin_notifications",
            format!(
                "alerts are posted to `{url}`{}",
                if notifications.auth_token.is_some() { " with a bearer token" } else { "" }
            ),
        ),
        _ => DoctorCheck::pass(
            "admin_notifications",
            "webhook disabled; alerts are written to the log",
        ),
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = vec![report.summary.clone()];

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
