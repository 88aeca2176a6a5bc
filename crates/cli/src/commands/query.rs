//! `salespulse rep|team|trends` — One-shot queries printed to stdout.

use salespulse_analytics::{AnalyticsService, TimePeriod};
use salespulse_config::AppConfig;

pub async fn rep(config: AppConfig, employee_id: i64) -> Result<(), Box<dyn std::error::Error>> {
    let service = AnalyticsService::from_config(&config)?;
    println!("{}", service.rep_performance(employee_id).await?);
    Ok(())
}

pub async fn team(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let service = AnalyticsService::from_config(&config)?;
    println!("{}", service.team_performance().await?);
    Ok(())
}

pub async fn trends(config: AppConfig, time_period: &str) -> Result<(), Box<dyn std::error::Error>> {
    // Reject bad tokens before loading the dataset
    let period: TimePeriod = time_period.parse()?;
    let service = AnalyticsService::from_config(&config)?;
    println!("{}", service.performance_trends(&period.to_string()).await?);
    Ok(())
}
