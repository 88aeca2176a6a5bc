pub mod doctor;
pub mod onboard;
pub mod query;
pub mod serve;

use salespulse_config::AppConfig;
use std::path::{Path, PathBuf};

/// The config file in use: the explicit path, else `~/.salespulse/config.toml`.
pub fn config_path(explicit: Option<&Path>) -> PathBuf {
    explicit
        .map(Path::to_path_buf)
        .unwrap_or_else(|| AppConfig::config_dir().join("config.toml"))
}

/// Load config with environment overrides, then apply the `--dataset` flag.
pub fn load_config(
    explicit: Option<&Path>,
    dataset: Option<PathBuf>,
) -> Result<AppConfig, Box<dyn std::error::Error>> {
    let mut config = AppConfig::load_with_env(&config_path(explicit))
        .map_err(|e| format!("Failed to load config: {e}"))?;
    if let Some(dataset) = dataset {
        config.dataset.path = dataset;
    }
    Ok(config)
}
