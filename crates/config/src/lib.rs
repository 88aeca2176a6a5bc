//! Configuration loading, validation, and management for SalesPulse.
//!
//! Loads configuration from `~/.salespulse/config.toml` (or an explicit path)
//! with environment variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.salespulse/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key (can be overridden per-provider)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Default LLM provider
    #[serde(default = "default_provider")]
    pub default_provider: String,

    /// Default model
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Default temperature
    #[serde(default = "default_temperature")]
    pub default_temperature: f32,

    /// Default max tokens per LLM response
    #[serde(default = "default_max_tokens")]
    pub default_max_tokens: u32,

    /// HTTP server configuration
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Where the sales dataset lives and which columns carry keys
    #[serde(default)]
    pub dataset: DatasetConfig,

    /// Summarization pipeline tuning
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Retry / timeout policy around every LLM call
    #[serde(default)]
    pub retry: RetryConfig,

    /// Provider-specific configurations
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
}

fn default_provider() -> String {
    "openai".into()
}
fn default_model() -> String {
    "gpt-4o-mini".into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_max_tokens() -> u32 {
    4096
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("default_provider", &self.default_provider)
            .field("default_model", &self.default_model)
            .field("default_temperature", &self.default_temperature)
            .field("default_max_tokens", &self.default_max_tokens)
            .field("gateway", &self.gateway)
            .field("dataset", &self.dataset)
            .field("pipeline", &self.pipeline)
            .field("retry", &self.retry)
            .field("providers", &self.providers)
            .finish()
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("default_model", &self.default_model)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,
}

fn default_port() -> u16 {
    8000
}
fn default_host() -> String {
    "127.0.0.1".into()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetConfig {
    /// CSV file loaded once at startup
    #[serde(default = "default_dataset_path")]
    pub path: PathBuf,

    #[serde(default = "default_identifier_column")]
    pub identifier_column: String,

    #[serde(default = "default_date_column")]
    pub date_column: String,
}

fn default_dataset_path() -> PathBuf {
    PathBuf::from("sales_performance_data.csv")
}
fn default_identifier_column() -> String {
    "employee_id".into()
}
fn default_date_column() -> String {
    "dated".into()
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            path: default_dataset_path(),
            identifier_column: default_identifier_column(),
            date_column: default_date_column(),
        }
    }
}

/// Order in which calendar-month partitions are produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MonthOrder {
    /// Order in which each (year, month) first appears in the file.
    #[default]
    FirstAppearance,
    /// Ascending (year, month).
    Chronological,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Number of even chunks the team rollup splits the dataset into
    #[serde(default = "default_team_chunks")]
    pub team_chunks: usize,

    /// Map-stage LLM calls allowed in flight at once (1 = strictly sequential)
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    #[serde(default)]
    pub month_order: MonthOrder,

    /// Monthly summaries per quarterly bucket
    #[serde(default = "default_quarter_size")]
    pub quarter_size: usize,

    /// Number of quarterly buckets; the last one absorbs any surplus months
    #[serde(default = "default_quarter_count")]
    pub quarter_count: usize,
}

fn default_team_chunks() -> usize {
    10
}
fn default_max_concurrency() -> usize {
    4
}
fn default_quarter_size() -> usize {
    3
}
fn default_quarter_count() -> usize {
    4
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            team_chunks: default_team_chunks(),
            max_concurrency: default_max_concurrency(),
            month_order: MonthOrder::default(),
            quarter_size: default_quarter_size(),
            quarter_count: default_quarter_count(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts per LLM call, including the first (1 = no retry)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Per-attempt timeout
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_max_attempts() -> u32 {
    1
}
fn default_base_delay_ms() -> u64 {
    500
}
fn default_max_delay_ms() -> u64 {
    8_000
}
fn default_timeout_secs() -> u64 {
    120
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,
}

impl AppConfig {
    /// Load configuration from the default path (~/.salespulse/config.toml).
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with_env(&Self::config_dir().join("config.toml"))
    }

    /// Load configuration from `path`, then apply environment overrides:
    /// - `SALESPULSE_API_KEY` (highest priority), then `OPENAI_API_KEY`
    /// - `SALESPULSE_PROVIDER`, `SALESPULSE_MODEL`, `SALESPULSE_DATASET`
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        Self::load_from(path)?.with_overrides(|name| std::env::var(name).ok())
    }

    /// Apply overrides looked up by variable name, then validate the result.
    pub fn with_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if self.api_key.is_none() {
            self.api_key = lookup("SALESPULSE_API_KEY").or_else(|| lookup("OPENAI_API_KEY"));
        }

        if let Some(provider) = lookup("SALESPULSE_PROVIDER") {
            self.default_provider = provider;
        }

        if let Some(model) = lookup("SALESPULSE_MODEL") {
            self.default_model = model;
        }

        if let Some(dataset) = lookup("SALESPULSE_DATASET") {
            self.dataset.path = PathBuf::from(dataset);
        }

        self.validate()?;
        Ok(self)
    }

    /// Load configuration from a specific file path. Values are not
    /// validated until overrides are applied.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        Ok(config)
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".salespulse")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_provider.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "default_provider must not be empty".into(),
            ));
        }

        if self.default_model.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "default_model must not be empty".into(),
            ));
        }

        if self.dataset.path.as_os_str().is_empty() {
            return Err(ConfigError::ValidationError("dataset.path must not be empty".into()));
        }

        if self.default_temperature < 0.0 || self.default_temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "default_temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.pipeline.team_chunks == 0 {
            return Err(ConfigError::ValidationError(
                "pipeline.team_chunks must be at least 1".into(),
            ));
        }

        if self.pipeline.max_concurrency == 0 {
            return Err(ConfigError::ValidationError(
                "pipeline.max_concurrency must be at least 1".into(),
            ));
        }

        if self.pipeline.quarter_size == 0 || self.pipeline.quarter_count == 0 {
            return Err(ConfigError::ValidationError(
                "pipeline.quarter_size and pipeline.quarter_count must be at least 1".into(),
            ));
        }

        if self.retry.max_attempts == 0 {
            return Err(ConfigError::ValidationError(
                "retry.max_attempts must be at least 1".into(),
            ));
        }

        if self.retry.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "retry.timeout_secs must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
            || self
                .providers
                .get(&self.default_provider)
                .is_some_and(|p| p.api_key.is_some())
    }

    /// Generate a default config TOML string (for `onboard` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            default_provider: default_provider(),
            default_model: default_model(),
            default_temperature: default_temperature(),
            default_max_tokens: default_max_tokens(),
            gateway: GatewayConfig::default(),
            dataset: DatasetConfig::default(),
            pipeline: PipelineConfig::default(),
            retry: RetryConfig::default(),
            providers: HashMap::new(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert_eq!(config.default_provider, "openai");
        assert_eq!(config.default_model, "gpt-4o-mini");
        assert_eq!(config.gateway.port, 8000);
        assert_eq!(config.pipeline.team_chunks, 10);
        assert_eq!(config.pipeline.month_order, MonthOrder::FirstAppearance);
        assert_eq!(config.retry.max_attempts, 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.default_provider, config.default_provider);
        assert_eq!(parsed.gateway.port, config.gateway.port);
        assert_eq!(parsed.dataset.path, config.dataset.path);
    }

    #[test]
    fn invalid_temperature_rejected() {
        let config = AppConfig {
            default_temperature: 5.0,
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_chunks_rejected() {
        let mut config = AppConfig::default();
        config.pipeline.team_chunks = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_concurrency_rejected() {
        let mut config = AppConfig::default();
        config.pipeline.max_concurrency = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let result = AppConfig::load_from(Path::new("/nonexistent/config.toml"));
        let config = result.unwrap();
        assert_eq!(config.default_provider, "openai");
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
default_model = "gpt-4o"

[dataset]
path = "/data/sales.csv"

[pipeline]
month_order = "chronological"
max_concurrency = 1
"#
        )
        .unwrap();

        let config = AppConfig::load_from(file.path()).unwrap();
        assert_eq!(config.default_model, "gpt-4o");
        assert_eq!(config.dataset.path, PathBuf::from("/data/sales.csv"));
        assert_eq!(config.dataset.identifier_column, "employee_id");
        assert_eq!(config.pipeline.month_order, MonthOrder::Chronological);
        assert_eq!(config.pipeline.max_concurrency, 1);
        assert_eq!(config.pipeline.team_chunks, 10);
    }

    #[test]
    fn invalid_file_reports_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "default_model = [").unwrap();
        let err = AppConfig::load_from(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn debug_redacts_api_key() {
        let config = AppConfig {
            api_key: Some("sk-very-secret".into()),
            ..AppConfig::default()
        };
        let text = format!("{config:?}");
        assert!(!text.contains("sk-very-secret"));
        assert!(text.contains("[REDACTED]"));
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = AppConfig::default_toml();
        assert!(toml_str.contains("gpt-4o-mini"));
        assert!(toml_str.contains("first_appearance"));
    }

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let pairs: Vec<(String, String)> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| {
            pairs
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.clone())
        }
    }

    #[test]
    fn overrides_are_applied() {
        let config = AppConfig::default()
            .with_overrides(vars(&[
                ("OPENAI_API_KEY", "sk-env"),
                ("SALESPULSE_MODEL", "gpt-4o"),
                ("SALESPULSE_DATASET", "/srv/sales.csv"),
            ]))
            .unwrap();
        assert_eq!(config.api_key.as_deref(), Some("sk-env"));
        assert_eq!(config.default_model, "gpt-4o");
        assert_eq!(config.dataset.path, PathBuf::from("/srv/sales.csv"));
    }

    #[test]
    fn overridden_values_are_validated() {
        let err = AppConfig::default()
            .with_overrides(vars(&[("SALESPULSE_MODEL", "")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(m) if m.contains("default_model")));

        let err = AppConfig::default()
            .with_overrides(vars(&[("SALESPULSE_DATASET", "")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(m) if m.contains("dataset.path")));
    }

    #[test]
    fn invalid_file_values_fail_after_overrides() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[pipeline]\nteam_chunks = 0").unwrap();
        let config = AppConfig::load_from(file.path()).unwrap();
        assert!(config.with_overrides(vars(&[])).is_err());
    }
}
