//! KVGuard command-line scanner
//!
//! Reads text from a file or stdin, detects Turkish personal data and prints
//! the masked text or a JSON report. Logs go to stderr so stdout carries only
//! the output.

use anyhow::Result;
use clap::Parser;
use kvguard_core::PiiCategory;
use kvguard_detect::{
    validate_iban, validate_national_id, CategoryPolicy, ChatCompletionsDetector, DetectionEngine,
    PatternRegistry,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tokio::io::AsyncReadExt;
use tracing::info;

mod cli;
mod config;
mod report;

use cli::{Cli, Commands, OutputFormat, ValidateKind};
use config::ScanOverrides;
use report::ScanReport;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Initialize tracing
    init_tracing(cli.verbose, cli.log_json);

    match cli.command {
        Commands::Scan {
            path,
            config,
            no_semantic,
            timeout_ms,
            format,
        } => {
            let overrides = ScanOverrides {
                no_semantic,
                timeout_ms,
            };
            scan(path, &config, &overrides, format).await?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Validate { kind, value } => Ok(validate(kind, &value)),
        Commands::Categories => {
            print_categories();
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn scan(
    path: Option<PathBuf>,
    config_path: &Path,
    overrides: &ScanOverrides,
    format: OutputFormat,
) -> Result<()> {
    let config = config::load(config_path, overrides)?;

    let registry = PatternRegistry::from_config(&config.patterns)?;
    let semantic = ChatCompletionsDetector::from_config(&config.semantic)?;
    info!(
        rules = registry.len(),
        semantic = semantic.is_some(),
        "Scanner ready"
    );

    let engine = DetectionEngine::with_config(registry, semantic, &config);

    let text = read_input(path.as_deref()).await?;
    let result = engine.detect(&text).await;

    info!(
        detections = result.spans.len(),
        elapsed_ms = result.processing_time_ms,
        "Scan complete"
    );

    match format {
        OutputFormat::Text => print!("{}", result.masked_text),
        OutputFormat::Json => {
            let report = ScanReport::from(result);
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}

async fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => Ok(tokio::fs::read_to_string(path).await?),
        None => {
            let mut text = String::new();
            tokio::io::stdin().read_to_string(&mut text).await?;
            Ok(text)
        }
    }
}

fn validate(kind: ValidateKind, value: &str) -> ExitCode {
    let valid = match kind {
        ValidateKind::NationalId => validate_national_id(value),
        ValidateKind::Iban => validate_iban(value),
    };

    if valid {
        println!("valid");
        ExitCode::SUCCESS
    } else {
        println!("invalid");
        ExitCode::FAILURE
    }
}

fn print_categories() {
    println!("{:<15} {:>10}  {:<9}  {}", "CATEGORY", "CONFIDENCE", "PATTERN", "CHECKSUM");
    for category in PiiCategory::ALL {
        let policy = CategoryPolicy::of(category);
        println!(
            "{:<15} {:>10.2}  {:<9}  {}",
            category.as_str(),
            policy.confidence,
            if policy.pattern.is_some() { "built-in" } else { "semantic" },
            if policy.validator.is_some() { "yes" } else { "no" },
        );
    }
}

/// Initialize tracing/logging
fn init_tracing(verbose: bool, json: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("kvguard=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("kvguard=info"))
    };

    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
