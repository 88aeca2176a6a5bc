//! `salespulse doctor` — Diagnose system health.

use salespulse_analytics::{ColumnKind, Dataset, DatasetOptions};
use salespulse_config::AppConfig;
use salespulse_core::Provider;
use salespulse_providers::router::{build_from_config, model_for};
use std::path::{Path, PathBuf};

pub async fn run(
    explicit: Option<&Path>,
    dataset_override: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("🩺 SalesPulse Doctor — System Diagnostics");
    println!("=========================================\n");

    let mut issues = 0;

    // Check config
    let config_path = super::config_path(explicit);
    if !config_path.exists() {
        println!(
            "  ⚠️  No config file at {}, using defaults (run `salespulse onboard`)",
            config_path.display()
        );
        issues += 1;
    }

    let mut config = match AppConfig::load_with_env(&config_path) {
        Ok(config) => {
            println!("  ✅ Config valid");
            config
        }
        Err(e) => {
            println!("  ❌ Config invalid: {e}");
            println!("\n  ⚠️  Fix the config file before running other checks.");
            return Ok(());
        }
    };
    if let Some(dataset) = dataset_override {
        config.dataset.path = dataset;
    }

    // Check API key
    if config.has_api_key() {
        println!("  ✅ API key configured");
    } else {
        println!("  ⚠️  No API key — set OPENAI_API_KEY (or add api_key to config.toml)");
        issues += 1;
    }
    println!(
        "  ℹ️  Provider: {}, model: {}",
        config.default_provider,
        model_for(&config, &config.default_provider)
    );

    // Check provider reachability
    match build_from_config(&config).default() {
        Some(provider) => match provider.health_check().await {
            Ok(true) => println!("  ✅ Provider {} reachable", provider.name()),
            Ok(false) => {
                println!("  ⚠️  Provider {} answered but rejected the request", provider.name());
                issues += 1;
            }
            Err(e) => {
                println!("  ❌ Provider {} unreachable: {e}", provider.name());
                issues += 1;
            }
        },
        None => {
            println!("  ❌ Provider '{}' is not configured", config.default_provider);
            issues += 1;
        }
    }

    // Check dataset
    let options = DatasetOptions::from(&config.dataset);
    match Dataset::load(&config.dataset.path, &options) {
        Ok(dataset) => {
            let numeric = dataset
                .columns()
                .iter()
                .filter(|c| c.kind == ColumnKind::Numeric)
                .count();
            println!(
                "  ✅ Dataset {} loaded: {} records, {} employees, {} months, {} numeric columns",
                config.dataset.path.display(),
                dataset.len(),
                dataset.employee_ids().count(),
                dataset.month_count(),
                numeric
            );
        }
        Err(e) => {
            println!("  ❌ Dataset unusable: {e}");
            issues += 1;
        }
    }

    println!(
        "  ℹ️  Pipeline: {} team chunks, {} concurrent calls, {} attempt(s) per call",
        config.pipeline.team_chunks, config.pipeline.max_concurrency, config.retry.max_attempts
    );

    // Summary
    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}
