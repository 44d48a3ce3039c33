//! Doctor command - validate configuration and show status

use anyhow::Result;
use newsrelay_domain::usecases::KeywordClassifier;
use reqwest::Client;
use serde::Serialize;
use std::path::PathBuf;

use crate::args::DoctorArgs;
use crate::commands::classify::load_taxonomy;
use crate::commands::run::build_store;
use crate::config::{AppConfig, DedupBackend};

#[derive(Debug, Serialize)]
struct DoctorReport {
    config: CheckResult,
    sources: CheckResult,
    taxonomy: CheckResult,
    dedup: CheckResult,
    telegram: CheckResult,
    translation: CheckResult,
    overall: String,
}

#[derive(Debug, Serialize)]
struct CheckResult {
    status: String,
    message: String,
    details: Option<serde_json::Value>,
}

impl CheckResult {
    fn ok(message: impl Into<String>) -> Self {
        Self::with_status("ok", message)
    }

    fn warn(message: impl Into<String>) -> Self {
        Self::with_status("warn", message)
    }

    fn error(message: impl Into<String>) -> Self {
        Self::with_status("error", message)
    }

    fn with_status(status: &str, message: impl Into<String>) -> Self {
        Self {
            status: status.to_string(),
            message: message.into(),
            details: None,
        }
    }

    fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    fn is_ok(&self) -> bool {
        self.status == "ok"
    }

    fn is_error(&self) -> bool {
        self.status == "error"
    }
}

pub async fn execute(args: DoctorArgs, config_path: Option<PathBuf>) -> Result<()> {
    let mut report = DoctorReport {
        config: CheckResult::error("Not checked"),
        sources: CheckResult::error("Not checked"),
        taxonomy: CheckResult::error("Not checked"),
        dedup: CheckResult::error("Not checked"),
        telegram: CheckResult::error("Not checked"),
        translation: CheckResult::error("Not checked"),
        overall: "error".to_string(),
    };

    let config = match AppConfig::load(config_path.as_deref()) {
        Ok(c) => {
            report.config = CheckResult::ok("Configuration loaded successfully");
            Some(c)
        }
        Err(e) => {
            report.config = CheckResult::error(format!("Failed to load config: {:#}", e));
            None
        }
    };

    if let Some(ref config) = config {
        report.sources = check_sources(config);
        report.taxonomy = check_taxonomy(config).await;
        report.dedup = check_dedup(config).await;
        report.telegram = check_telegram(config);
        report.translation = check_translation(config);
    }

    let checks = [
        &report.config,
        &report.sources,
        &report.taxonomy,
        &report.dedup,
        &report.telegram,
        &report.translation,
    ];

    let has_error = checks.iter().any(|c| c.is_error());
    let all_ok = checks.iter().all(|c| c.is_ok());

    report.overall = if has_error {
        "error".to_string()
    } else if all_ok {
        "ok".to_string()
    } else {
        "warn".to_string()
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    if report.overall == "error" {
        std::process::exit(1);
    }

    Ok(())
}

fn check_sources(config: &AppConfig) -> CheckResult {
    match config.domain_sources() {
        Ok(sources) if sources.is_empty() => CheckResult::error("No sources configured"),
        Ok(sources) => CheckResult::ok(format!("{} sources configured", sources.len()))
            .with_details(serde_json::json!(
                sources
                    .iter()
                    .map(|s| serde_json::json!({ "name": s.name, "kind": s.kind.as_str() }))
                    .collect::<Vec<_>>()
            )),
        Err(e) => CheckResult::error(format!("Invalid sources: {:#}", e)),
    }
}

async fn check_taxonomy(config: &AppConfig) -> CheckResult {
    let (specs, origin) = match load_taxonomy(config.taxonomy.path.as_deref()).await {
        Ok(loaded) => loaded,
        Err(e) => return CheckResult::error(format!("{:#}", e)),
    };

    match KeywordClassifier::compile(&specs) {
        Ok(classifier) => CheckResult::ok(format!(
            "{} categories from {}",
            specs.len(),
            origin
        ))
        .with_details(serde_json::json!({
            "origin": origin,
            "ids": specs.iter().map(|s| &s.id).collect::<Vec<_>>(),
            "patterns": classifier.pattern_count(),
            "fingerprint": classifier.fingerprint(),
        })),
        Err(e) => CheckResult::error(format!("Validation failed: {}", e)),
    }
}

async fn check_dedup(config: &AppConfig) -> CheckResult {
    let store = match build_store(config, Client::new()).await {
        Ok(store) => store,
        Err(e) => return CheckResult::error(format!("{:#}", e)),
    };

    match store.health_check().await {
        Ok(()) if config.dedup.backend == DedupBackend::Memory => CheckResult::warn(
            "Backend: memory (seen items are forgotten on restart)",
        ),
        Ok(()) => CheckResult::ok(format!("Backend: {} (reachable)", store.backend())),
        Err(e) => CheckResult::error(format!("Backend: {} unavailable: {}", store.backend(), e)),
    }
}

fn check_telegram(config: &AppConfig) -> CheckResult {
    let env_var = &config.telegram.bot_token_env;
    let channels = &config.telegram.channels;

    if env_var.trim().is_empty() {
        return CheckResult::error("No bot token env var configured");
    }

    if channels.is_empty() {
        return CheckResult::warn("No channels configured");
    }

    match std::env::var(env_var) {
        Ok(val) if !val.trim().is_empty() => CheckResult::ok(format!(
            "Bot token: {} (set), Channels: {}",
            env_var,
            channels.join(", ")
        )),
        _ => CheckResult::warn(format!(
            "Bot token: {} (not set), Channels: {}",
            env_var,
            channels.join(", ")
        )),
    }
}

fn check_translation(config: &AppConfig) -> CheckResult {
    if !config.translation.enabled {
        return CheckResult::ok("Translation disabled");
    }

    if config.translation.target_language.trim().is_empty() {
        return CheckResult::error("Translation enabled but target_language is empty");
    }

    CheckResult::ok(format!(
        "Target language: {}, endpoint: {}",
        config.translation.target_language, config.translation.api_base
    ))
}

fn print_report(report: &DoctorReport) {
    println!("newsrelay Doctor Report");
    println!("=======================");
    println!();

    print_check("Config", &report.config);
    print_check("Sources", &report.sources);
    print_check("Taxonomy", &report.taxonomy);
    print_check("Dedup store", &report.dedup);
    print_check("Telegram", &report.telegram);
    print_check("Translation", &report.translation);

    println!();
    println!(
        "{} Overall: {}",
        status_symbol(&report.overall),
        report.overall.to_uppercase()
    );

    if report.overall == "ok" {
        println!();
        println!("Ready to run! Try: newsrelay run --dry-run --once");
    }
}

fn print_check(name: &str, result: &CheckResult) {
    println!("{} {}: {}", status_symbol(&result.status), name, result.message);
}

fn status_symbol(status: &str) -> &'static str {
    match status {
        "ok" => "✓",
        "warn" => "⚠",
        _ => "✗",
    }
}
