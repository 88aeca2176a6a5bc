//! Request-level queries with typed outcomes.

use crate::dataset::{Dataset, DatasetOptions};
use crate::llm::LlmGateway;
use crate::pipeline::SummaryPipeline;
use salespulse_config::AppConfig;
use salespulse_core::{Error, Provider};
use salespulse_providers::router::{build_from_config, model_for};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::info;

/// Body returned for an unknown employee id.
pub const EMPLOYEE_NOT_FOUND: &str = "Employee id does not exist.";

/// Body returned for an unsupported time-period token.
pub const INVALID_TIME_PERIOD: &str =
    "In-correct time period provided, use monthly or quaterly only";

/// Why a query produced no narrative.
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("Employee id does not exist.")]
    NotFound(i64),

    #[error("In-correct time period provided, use monthly or quaterly only")]
    InvalidTimePeriod(String),

    #[error(transparent)]
    Pipeline(#[from] Error),
}

/// Trend granularity. The accepted tokens are exactly `monthly` and `quaterly`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimePeriod {
    Monthly,
    Quarterly,
}

impl FromStr for TimePeriod {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "monthly" => Ok(Self::Monthly),
            "quaterly" => Ok(Self::Quarterly),
            other => Err(QueryError::InvalidTimePeriod(other.to_string())),
        }
    }
}

impl fmt::Display for TimePeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Monthly => write!(f, "monthly"),
            Self::Quarterly => write!(f, "quaterly"),
        }
    }
}

/// The three read-only queries over a shared dataset.
pub struct AnalyticsService {
    dataset: Arc<Dataset>,
    pipeline: SummaryPipeline,
}

impl AnalyticsService {
    pub fn new(dataset: Arc<Dataset>, pipeline: SummaryPipeline) -> Self {
        Self { dataset, pipeline }
    }

    /// Load the dataset and wire the configured default provider.
    pub fn from_config(config: &AppConfig) -> Result<Self, Error> {
        let router = build_from_config(config);
        let provider = router.default().ok_or_else(|| Error::Config {
            message: format!("provider '{}' is not available", config.default_provider),
        })?;
        let dataset = Dataset::load(&config.dataset.path, &DatasetOptions::from(&config.dataset))?;
        Ok(Self::with_provider(config, provider, Arc::new(dataset)))
    }

    /// Build from an already loaded dataset and an explicit provider.
    pub fn with_provider(
        config: &AppConfig,
        provider: Arc<dyn Provider>,
        dataset: Arc<Dataset>,
    ) -> Self {
        let model = model_for(config, &config.default_provider);
        let gateway = LlmGateway::new(provider, model)
            .with_temperature(config.default_temperature)
            .with_max_tokens(config.default_max_tokens);
        Self::new(dataset, SummaryPipeline::new(gateway, config.pipeline.clone()))
    }

    pub fn dataset(&self) -> &Arc<Dataset> {
        &self.dataset
    }

    pub fn pipeline(&self) -> &SummaryPipeline {
        &self.pipeline
    }

    /// Narrative for one employee. Unknown ids are rejected before any LLM call.
    pub async fn rep_performance(&self, employee_id: i64) -> Result<String, QueryError> {
        info!(employee_id, "Rep performance requested");
        if !self.dataset.contains_employee(employee_id) {
            return Err(QueryError::NotFound(employee_id));
        }
        let records = self
            .dataset
            .filter_by_employee(employee_id)
            .map_err(Error::from)?;
        Ok(self.pipeline.rep_summary(employee_id, &records).await?)
    }

    pub async fn team_performance(&self) -> Result<String, QueryError> {
        info!("Team performance requested");
        Ok(self.pipeline.team_summary(&self.dataset.all()).await?)
    }

    /// Monthly or quarterly trend narrative. The token is validated before
    /// the dataset is touched.
    pub async fn performance_trends(&self, time_period: &str) -> Result<String, QueryError> {
        let period: TimePeriod = time_period.parse()?;
        info!(%period, "Performance trends requested");
        let all = self.dataset.all();
        let narrative = match period {
            TimePeriod::Monthly => self.pipeline.monthly_trends(&all).await?,
            TimePeriod::Quarterly => self.pipeline.quarterly_trends(&all).await?,
        };
        Ok(narrative)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::tests::sample;
    use crate::test_helpers::RecordingProvider;
    use salespulse_config::PipelineConfig;

    fn service(provider: Arc<RecordingProvider>) -> AnalyticsService {
        let config = AppConfig {
            pipeline: PipelineConfig {
                max_concurrency: 1,
                ..Default::default()
            },
            ..Default::default()
        };
        AnalyticsService::with_provider(&config, provider, Arc::new(sample()))
    }

    #[test]
    fn period_tokens() {
        assert_eq!("monthly".parse::<TimePeriod>().unwrap(), TimePeriod::Monthly);
        assert_eq!("quaterly".parse::<TimePeriod>().unwrap(), TimePeriod::Quarterly);
        for bad in ["quarterly", "Monthly", "weekly", ""] {
            assert!(matches!(
                bad.parse::<TimePeriod>(),
                Err(QueryError::InvalidTimePeriod(t)) if t == bad
            ));
        }
        assert_eq!(TimePeriod::Quarterly.to_string(), "quaterly");
    }

    #[test]
    fn sentinel_texts() {
        assert_eq!(QueryError::NotFound(9).to_string(), EMPLOYEE_NOT_FOUND);
        assert_eq!(
            QueryError::InvalidTimePeriod("weekly".into()).to_string(),
            INVALID_TIME_PERIOD
        );
    }

    #[tokio::test]
    async fn unknown_employee_makes_no_llm_call() {
        let provider = Arc::new(RecordingProvider::new());
        let err = service(provider.clone())
            .rep_performance(999)
            .await
            .unwrap_err();
        assert!(matches!(err, QueryError::NotFound(999)));
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn known_employee_makes_one_call() {
        let provider = Arc::new(RecordingProvider::new());
        let text = service(provider.clone()).rep_performance(1).await.unwrap();
        assert_eq!(text, "reply 1");
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn invalid_period_makes_no_llm_call() {
        let provider = Arc::new(RecordingProvider::new());
        let err = service(provider.clone())
            .performance_trends("yearly")
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), INVALID_TIME_PERIOD);
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn provider_failure_surfaces_as_pipeline_error() {
        let provider = Arc::new(RecordingProvider::failing_on(1));
        let err = service(provider).team_performance().await.unwrap_err();
        assert!(matches!(err, QueryError::Pipeline(Error::Provider(_))));
    }

    #[tokio::test]
    async fn missing_dataset_file_fails_construction() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = AppConfig::default();
        config.api_key = Some("sk-test".into());
        config.dataset.path = dir.path().join("absent.csv");
        let result = AnalyticsService::from_config(&config);
        assert!(matches!(result, Err(Error::Dataset(_))));
    }

    #[tokio::test]
    async fn from_config_loads_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sales.csv");
        std::fs::write(&path, crate::dataset::tests::SAMPLE_CSV).unwrap();
        let mut config = AppConfig::default();
        config.dataset.path = path;
        let service = AnalyticsService::from_config(&config).unwrap();
        assert_eq!(service.dataset().len(), 5);
        assert_eq!(service.pipeline().gateway().model(), "gpt-4o-mini");
    }
}
