//! Descriptive statistics with an explicit `sum` row.
//!
//! These figures are the ground truth every reduce prompt carries. Each
//! column is sorted before aggregation, so the result is bit-identical for
//! any ordering of the same records.

use crate::dataset::{ColumnKind, Partition, json_number};
use polars::prelude::*;
use salespulse_core::DatasetError;
use serde_json::{Map, Value};

/// Statistics for one numeric field. `None` where the statistic is undefined
/// (no values, or a standard deviation over fewer than two values).
#[derive(Debug, Clone, PartialEq)]
pub struct FieldStats {
    pub count: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub q25: Option<f64>,
    pub q50: Option<f64>,
    pub q75: Option<f64>,
    pub max: Option<f64>,
    pub sum: f64,
}

impl FieldStats {
    /// Statistics over `values`, missing cells already removed.
    pub fn from_values(values: Vec<f64>) -> Self {
        Self::from_column(&Float64Chunked::from_vec("values", values))
    }

    /// Statistics over the non-null values of `column`. Quartiles use linear
    /// interpolation and `std` is the sample deviation.
    pub fn from_column(column: &Float64Chunked) -> Self {
        let sorted = column.sort_with(SortOptions::default());
        let count = sorted.len() - sorted.null_count();
        let quantile = |q: f64| {
            sorted
                .quantile(q, QuantileInterpolOptions::Linear)
                .ok()
                .flatten()
        };

        Self {
            count,
            mean: sorted.mean(),
            std: if count > 1 { sorted.std(1) } else { None },
            min: sorted.min(),
            q25: quantile(0.25),
            q50: quantile(0.50),
            q75: quantile(0.75),
            max: sorted.max(),
            sum: if count > 0 { sorted.sum().unwrap_or(0.0) } else { 0.0 },
        }
    }

    fn to_json(&self) -> Value {
        let stat = |v: Option<f64>| v.map_or(Value::Null, |x| json_number(round6(x)));
        let mut row = Map::new();
        row.insert("count".into(), Value::from(self.count));
        row.insert("mean".into(), stat(self.mean));
        row.insert("std".into(), stat(self.std));
        row.insert("min".into(), stat(self.min));
        row.insert("25%".into(), stat(self.q25));
        row.insert("50%".into(), stat(self.q50));
        row.insert("75%".into(), stat(self.q75));
        row.insert("max".into(), stat(self.max));
        row.insert("sum".into(), stat(Some(self.sum)));
        Value::Object(row)
    }
}

/// Round to six decimals. Beyond 1e15 an f64 has no fractional digits left,
/// and scaling could overflow.
fn round6(x: f64) -> f64 {
    if x.abs() > 1e15 {
        return x;
    }
    (x * 1e6).round() / 1e6
}

/// Per-field statistics for every visible numeric column of a partition.
#[derive(Debug, Clone, PartialEq)]
pub struct StatisticsSummary {
    fields: Vec<(String, FieldStats)>,
}

impl StatisticsSummary {
    pub fn get(&self, field: &str) -> Option<&FieldStats> {
        self.fields
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, stats)| stats)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldStats)> {
        self.fields.iter().map(|(name, stats)| (name.as_str(), stats))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// `{"<field>": {"count", "mean", "std", "min", "25%", "50%", "75%", "max", "sum"}}`
    /// with fields in column order, values rounded to six decimals and
    /// undefined statistics as `null`.
    pub fn to_prompt_json(&self) -> String {
        let table: Map<String, Value> = self
            .fields
            .iter()
            .map(|(name, stats)| (name.clone(), stats.to_json()))
            .collect();
        Value::Object(table).to_string()
    }
}

/// Describe every visible numeric column of `partition`, sum included.
pub fn build(partition: &Partition<'_>) -> Result<StatisticsSummary, DatasetError> {
    let fields = partition
        .visible_columns()
        .filter(|column| column.kind == ColumnKind::Numeric)
        .map(|column| {
            let values = partition.numeric(&column.name)?;
            Ok((column.name.clone(), FieldStats::from_column(values)))
        })
        .collect::<Result<Vec<_>, DatasetError>>()?;
    Ok(StatisticsSummary { fields })
}

impl Partition<'_> {
    /// Shorthand for [`build`].
    pub fn describe_with_sum(&self) -> Result<StatisticsSummary, DatasetError> {
        build(self)
    }
}
