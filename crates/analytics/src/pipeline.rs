//! Hierarchical map-reduce summarization.
//!
//! ```text
//!   dataset ──split──► chunks / months ──map (LLM, bounded fan-out)──► summaries
//!                                                                        │
//!          exact statistics of the enclosing period ──────────────► reduce (LLM)
//! ```
//!
//! Map calls run up to `max_concurrency` at a time and their results are
//! collected in input order, which the fixed quarterly bucketing relies on.
//! The first failed call aborts the whole run; no partial result is returned.

use crate::chunker::{split_by_month, split_even};
use crate::dataset::{Partition, PartitionKey};
use crate::llm::LlmGateway;
use crate::prompts;
use crate::template::Bindings;
use futures::{StreamExt, TryStreamExt, stream};
use salespulse_config::PipelineConfig;
use salespulse_core::Result;
use std::ops::Range;
use tracing::{debug, info};

/// Prefix of every trend response.
pub const TRENDS_PREFIX: &str = "Trends for the time period: ";

pub struct SummaryPipeline {
    gateway: LlmGateway,
    config: PipelineConfig,
}

impl SummaryPipeline {
    pub fn new(gateway: LlmGateway, config: PipelineConfig) -> Self {
        Self { gateway, config }
    }

    pub fn gateway(&self) -> &LlmGateway {
        &self.gateway
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Single-call analysis of one employee's records.
    pub async fn rep_summary(&self, employee_id: i64, records: &Partition<'_>) -> Result<String> {
        let prompt = prompts::REP_ANALYSIS.render(
            &Bindings::new()
                .bind("id", employee_id.to_string())
                .bind("data", records.to_prompt_json()?),
        )?;
        self.call("rep_analysis", records.key(), prompt).await
    }

    /// Team rollup: `team_chunks` map calls, then one reduce call carrying the
    /// statistics of the whole partition.
    pub async fn team_summary(&self, all: &Partition<'_>) -> Result<String> {
        let chunks = split_even(all, self.config.team_chunks);
        info!(
            records = all.len(),
            chunks = chunks.len(),
            "Summarizing team performance"
        );

        let chunk_prompts = chunks
            .iter()
            .map(|chunk| -> Result<(PartitionKey, String)> {
                let prompt = prompts::TEAM_CHUNK
                    .render(&Bindings::new().bind("data", chunk.to_prompt_json()?))?;
                Ok((chunk.key(), prompt))
            })
            .collect::<Result<Vec<_>>>()?;
        let summaries = self.map_stage("team_chunk", chunk_prompts).await?;

        let prompt = prompts::TEAM_REDUCE.render(
            &Bindings::new()
                .bind("employee_summaries", join_chunk_summaries(&summaries))
                .bind("chunk_count", chunks.len().to_string())
                .bind("stats", all.describe_with_sum()?.to_prompt_json()),
        )?;
        self.call("team_reduce", all.key(), prompt).await
    }

    /// One summary per calendar month, in month order.
    pub async fn monthly_summaries(&self, all: &Partition<'_>) -> Result<Vec<String>> {
        let months = self.months(all)?;
        self.summarize_months(&months).await
    }

    /// `"Trends for the time period: "` followed by the monthly summaries
    /// separated by blank lines.
    pub async fn monthly_trends(&self, all: &Partition<'_>) -> Result<String> {
        let summaries = self.monthly_summaries(all).await?;
        Ok(format!("{TRENDS_PREFIX}{}", summaries.join("\n\n")))
    }

    /// Monthly summaries bucketed into fixed-size quarters, one reduce call per
    /// bucket. Buckets follow month order, not calendar quarters.
    pub async fn quarterly_summaries(&self, all: &Partition<'_>) -> Result<Vec<String>> {
        let months = self.months(all)?;
        let summaries = self.summarize_months(&months).await?;
        let base = self.without_identifier(all);

        let buckets = quarter_buckets(
            months.len(),
            self.config.quarter_size,
            self.config.quarter_count,
        );
        info!(
            months = months.len(),
            quarters = buckets.len(),
            "Summarizing quarters"
        );

        let quarter_prompts = buckets
            .into_iter()
            .enumerate()
            .map(|(q, range)| -> Result<(PartitionKey, String)> {
                let quarter = base.concat(PartitionKey::Quarter(q), &months[range.clone()])?;
                let prompt = prompts::QUARTERLY_REDUCE.render(
                    &Bindings::new()
                        .bind("monthly_data", summaries[range].join("\n"))
                        .bind("stats", quarter.describe_with_sum()?.to_prompt_json()),
                )?;
                Ok((quarter.key(), prompt))
            })
            .collect::<Result<Vec<_>>>()?;

        self.map_stage("quarterly_reduce", quarter_prompts).await
    }

    /// `"Trends for the time period: "` followed by `"\n\n<summary>"` per quarter.
    pub async fn quarterly_trends(&self, all: &Partition<'_>) -> Result<String> {
        let quarters = self.quarterly_summaries(all).await?;
        let body: String = quarters.iter().map(|q| format!("\n\n{q}")).collect();
        Ok(format!("{TRENDS_PREFIX}{body}"))
    }

    fn without_identifier<'a>(&self, all: &Partition<'a>) -> Partition<'a> {
        all.clone().drop_column(all.identifier_column())
    }

    fn months<'a>(&self, all: &Partition<'a>) -> Result<Vec<Partition<'a>>> {
        Ok(split_by_month(
            &self.without_identifier(all),
            self.config.month_order,
        )?)
    }

    async fn summarize_months(&self, months: &[Partition<'_>]) -> Result<Vec<String>> {
        info!(months = months.len(), "Summarizing months");
        let month_prompts = months
            .iter()
            .map(|month| -> Result<(PartitionKey, String)> {
                let prompt = prompts::MONTHLY_TREND.render(
                    &Bindings::new()
                        .bind("period", month.key().to_string())
                        .bind("data", month.to_prompt_json()?)
                        .bind("stats", month.describe_with_sum()?.to_prompt_json()),
                )?;
                Ok((month.key(), prompt))
            })
            .collect::<Result<Vec<_>>>()?;
        self.map_stage("monthly_trend", month_prompts).await
    }

    /// Run independent calls with bounded fan-out; output order matches input.
    async fn map_stage(
        &self,
        stage: &'static str,
        calls: Vec<(PartitionKey, String)>,
    ) -> Result<Vec<String>> {
        let width = self.config.max_concurrency.max(1);
        stream::iter(calls)
            .map(|(key, prompt)| self.call(stage, key, prompt))
            .buffered(width)
            .try_collect()
            .await
    }

    async fn call(&self, stage: &'static str, key: PartitionKey, prompt: String) -> Result<String> {
        debug!(stage, partition = %key, prompt_len = prompt.len(), "LLM call");
        Ok(self.gateway.invoke(&prompt).await?)
    }
}

/// `"Summary:\n<text>\n\n"` per chunk summary, concatenated.
pub fn join_chunk_summaries(summaries: &[String]) -> String {
    summaries
        .iter()
        .map(|s| format!("Summary:\n{s}\n\n"))
        .collect()
}

/// Index ranges of `count` consecutive buckets of `size` items over `len`
/// items. The last bucket extends to the end; buckets past the data are empty.
pub fn quarter_buckets(len: usize, size: usize, count: usize) -> Vec<Range<usize>> {
    (0..count)
        .map(|q| {
            let start = (q * size).min(len);
            let end = if q + 1 == count {
                len
            } else {
                ((q + 1) * size).min(len)
            };
            start..end
        })
        .collect()
}
