//! Sales-performance analytics over a CSV dataset, narrated by an LLM.
//!
//! The crate is organised leaves first:
//!
//! - [`dataset`] — the immutable polars-backed [`Dataset`] and its
//!   [`Partition`]s (filter by employee, group by calendar month)
//! - [`chunker`] — even and per-month splitting of partitions
//! - [`stats`] — deterministic descriptive statistics with an explicit `sum`
//! - [`template`] — `{placeholder}` prompt rendering
//! - [`prompts`] — the prompt catalogue
//! - [`llm`] — the single `prompt -> text` call into a [`Provider`]
//! - [`pipeline`] — the chunk → period → aggregate map-reduce
//! - [`service`] — request-level queries with typed outcomes
//!
//! Numbers quoted back by the model always come from [`stats`], never from
//! the model itself: every reduce prompt carries the exact statistics of the
//! period it summarises.
//!
//! [`Provider`]: salespulse_core::Provider

pub mod chunker;
pub mod dataset;
pub mod llm;
pub mod pipeline;
pub mod prompts;
pub mod service;
pub mod stats;
pub mod template;

#[cfg(test)]
mod test_helpers;

pub use dataset::{Column, ColumnKind, Dataset, DatasetOptions, Partition, PartitionKey};
pub use llm::LlmGateway;
pub use pipeline::SummaryPipeline;
pub use service::{AnalyticsService, QueryError, TimePeriod};
pub use stats::{FieldStats, StatisticsSummary};
pub use template::{Bindings, PromptTemplate};
