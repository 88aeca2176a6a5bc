//! The sales dataset and partitions over it.
//!
//! A [`Dataset`] is a polars [`DataFrame`] loaded once from CSV and never
//! mutated. Every query works on [`Partition`]s: row subsets of that frame
//! plus the set of columns visible to serialization and statistics. Frames
//! share their column buffers, so cutting a partition does not copy data.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use polars::prelude::*;
use salespulse_config::DatasetConfig;
use salespulse_core::DatasetError;
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::fmt;
use std::io::{Cursor, Read};
use std::path::Path;

/// Cell texts read as missing values.
const MISSING: [&str; 8] = ["", "NaN", "nan", "NA", "N/A", "null", "NULL", "None"];

/// Position of each row in the source file.
const ROW_COLUMN: &str = "__row";
/// `year * 100 + month` of each row's date.
const MONTH_COLUMN: &str = "__month";

/// Which column carries the employee identifier and which the record date.
#[derive(Debug, Clone)]
pub struct DatasetOptions {
    pub identifier_column: String,
    pub date_column: String,
}

impl Default for DatasetOptions {
    fn default() -> Self {
        Self {
            identifier_column: "employee_id".into(),
            date_column: "dated".into(),
        }
    }
}

impl From<&DatasetConfig> for DatasetOptions {
    fn from(config: &DatasetConfig) -> Self {
        Self {
            identifier_column: config.identifier_column.clone(),
            date_column: config.date_column.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// Inferred numeric by the CSV reader; stored as `Float64` and included
    /// in statistics.
    Numeric,
    Text,
}

#[derive(Debug, Clone)]
pub struct Column {
    pub name: String,
    pub kind: ColumnKind,
}

/// The loaded, immutable sales dataset.
#[derive(Debug)]
pub struct Dataset {
    frame: DataFrame,
    columns: Vec<Column>,
    identifier: String,
    employee_ids: BTreeSet<i64>,
}

impl Dataset {
    /// Load a dataset from a CSV file.
    pub fn load(path: &Path, options: &DatasetOptions) -> Result<Self, DatasetError> {
        let file = std::fs::File::open(path).map_err(|e| DatasetError::Read {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let dataset = Self::from_reader(file, options)?;
        tracing::info!(
            path = %path.display(),
            records = dataset.len(),
            employees = dataset.employee_ids.len(),
            "Dataset loaded"
        );
        Ok(dataset)
    }

    /// Parse a dataset from CSV with a header row.
    ///
    /// Column types come from the polars CSV reader's inference over every
    /// row: numeric columns are widened to `Float64`, everything else is
    /// kept as text. The identifier column must hold integers and the date
    /// column dates.
    pub fn from_reader<R: Read>(mut reader: R, options: &DatasetOptions) -> Result<Self, DatasetError> {
        let mut bytes = Vec::new();
        reader
            .read_to_end(&mut bytes)
            .map_err(|e| DatasetError::Parse {
                line: 1,
                reason: e.to_string(),
            })?;

        let headers = read_headers(&bytes)?;
        for required in [&options.identifier_column, &options.date_column] {
            if !headers.contains(required) {
                return Err(DatasetError::MissingColumn(required.clone()));
            }
        }

        let null_values = NullValues::AllColumns(MISSING.iter().map(|m| m.to_string()).collect());
        let raw = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(None)
            .map_parse_options(|parse| parse.with_null_values(Some(null_values.clone())))
            .into_reader_with_file_handle(Cursor::new(bytes))
            .finish()
            .map_err(frame_error)?;

        let height = raw.height();
        let employee_ids = read_identifiers(&raw, &options.identifier_column)?;
        let months = read_months(&raw, &options.date_column)?;

        let mut columns = Vec::with_capacity(headers.len());
        let mut series = Vec::with_capacity(headers.len() + 2);
        for column in raw.get_columns() {
            let name = column.name();
            let kind = if name != options.date_column
                && (name == options.identifier_column || column.dtype().is_numeric())
            {
                ColumnKind::Numeric
            } else {
                ColumnKind::Text
            };
            let dtype = match kind {
                ColumnKind::Numeric => DataType::Float64,
                ColumnKind::Text => DataType::String,
            };
            series.push(column.cast(&dtype).map_err(frame_error)?);
            columns.push(Column {
                name: name.to_string(),
                kind,
            });
        }
        series.push(Series::new(ROW_COLUMN, (0..height as u64).collect::<Vec<u64>>()));
        series.push(Series::new(MONTH_COLUMN, months));

        Ok(Self {
            frame: DataFrame::new(series).map_err(frame_error)?,
            columns,
            identifier: options.identifier_column.clone(),
            employee_ids: employee_ids.into_iter().collect(),
        })
    }

    /// Columns in file order.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.frame.height()
    }

    pub fn is_empty(&self) -> bool {
        self.frame.height() == 0
    }

    /// Whether any record carries `employee_id`.
    pub fn contains_employee(&self, employee_id: i64) -> bool {
        self.employee_ids.contains(&employee_id)
    }

    /// Distinct identifiers, ascending.
    pub fn employee_ids(&self) -> impl Iterator<Item = i64> + '_ {
        self.employee_ids.iter().copied()
    }

    /// Number of distinct calendar months.
    pub fn month_count(&self) -> usize {
        self.frame
            .column(MONTH_COLUMN)
            .and_then(|months| months.n_unique())
            .unwrap_or(0)
    }

    /// Every record, in file order.
    pub fn all(&self) -> Partition<'_> {
        Partition {
            key: PartitionKey::All,
            dataset: self,
            frame: self.frame.clone(),
            hidden: vec![false; self.columns.len()],
        }
    }

    /// All records of one employee. Empty (not an error) when the id is unknown.
    pub fn filter_by_employee(&self, employee_id: i64) -> Result<Partition<'_>, DatasetError> {
        let all = self.all();
        let mask = all.numeric(&self.identifier)?.equal(employee_id as f64);
        all.filter(PartitionKey::Employee(employee_id), &mask)
    }

    /// Calendar-month buckets in order of first appearance in the file.
    pub fn group_by_month(&self) -> Result<Vec<Partition<'_>>, DatasetError> {
        self.all().group_by_month()
    }
}

/// Identifies what a partition was cut from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartitionKey {
    All,
    Employee(i64),
    Chunk(usize),
    Month { year: i32, month: u32 },
    Quarter(usize),
}

impl PartitionKey {
    fn from_month_code(code: i32) -> Self {
        PartitionKey::Month {
            year: code.div_euclid(100),
            month: code.rem_euclid(100) as u32,
        }
    }
}

impl fmt::Display for PartitionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PartitionKey::All => write!(f, "all"),
            PartitionKey::Employee(id) => write!(f, "employee {id}"),
            PartitionKey::Chunk(i) => write!(f, "chunk {i}"),
            PartitionKey::Month { year, month } => write!(f, "{year}-{month:02}"),
            PartitionKey::Quarter(i) => write!(f, "quarter {}", i + 1),
        }
    }
}

/// An ordered selection of rows from a [`Dataset`].
#[derive(Debug, Clone)]
pub struct Partition<'a> {
    key: PartitionKey,
    dataset: &'a Dataset,
    frame: DataFrame,
    hidden: Vec<bool>,
}

impl<'a> Partition<'a> {
    pub fn key(&self) -> PartitionKey {
        self.key
    }

    pub fn len(&self) -> usize {
        self.frame.height()
    }

    pub fn is_empty(&self) -> bool {
        self.frame.height() == 0
    }

    /// Name of the employee identifier column.
    pub fn identifier_column(&self) -> &'a str {
        &self.dataset.identifier
    }

    /// Columns that serialization and statistics see, in file order.
    pub fn visible_columns(&self) -> impl Iterator<Item = &'a Column> + '_ {
        self.dataset
            .columns
            .iter()
            .zip(&self.hidden)
            .filter(|(_, hidden)| !**hidden)
            .map(|(column, _)| column)
    }

    /// Hide a column from serialization and statistics. Unknown names are ignored.
    pub fn drop_column(mut self, name: &str) -> Self {
        if let Some(i) = self.dataset.columns.iter().position(|c| c.name == name) {
            self.hidden[i] = true;
        }
        self
    }

    /// `len` contiguous rows starting at `offset`, clamped to the partition.
    pub fn slice(&self, key: PartitionKey, offset: usize, len: usize) -> Partition<'a> {
        self.with_frame(key, self.frame.slice(offset as i64, len))
    }

    /// Rows where `mask` is true, order preserved.
    pub fn filter(&self, key: PartitionKey, mask: &BooleanChunked) -> Result<Partition<'a>, DatasetError> {
        let frame = self.frame.filter(mask).map_err(frame_error)?;
        Ok(self.with_frame(key, frame))
    }

    /// The rows of `parts` stacked in order, with this partition's visible columns.
    pub fn concat(&self, key: PartitionKey, parts: &[Partition<'a>]) -> Result<Partition<'a>, DatasetError> {
        let mut frame = self.frame.slice(0, 0);
        for part in parts {
            frame.vstack_mut(&part.frame).map_err(frame_error)?;
        }
        Ok(self.with_frame(key, frame))
    }

    /// Bucket rows by calendar (year, month).
    ///
    /// Buckets come out in order of each month's first appearance in this
    /// partition, not chronologically; rows keep their relative order.
    pub fn group_by_month(&self) -> Result<Vec<Partition<'a>>, DatasetError> {
        let months = self.frame.column(MONTH_COLUMN).map_err(frame_error)?;
        let codes = months.unique_stable().map_err(frame_error)?;
        let codes = codes.i32().map_err(frame_error)?;
        let months = months.i32().map_err(frame_error)?;

        codes
            .into_iter()
            .flatten()
            .map(|code| self.filter(PartitionKey::from_month_code(code), &months.equal(code)))
            .collect()
    }

    /// Zero-based source-file positions of the rows, in partition order.
    pub fn row_indices(&self) -> Result<Vec<usize>, DatasetError> {
        let rows = self.frame.column(ROW_COLUMN).map_err(frame_error)?;
        Ok(rows
            .u64()
            .map_err(frame_error)?
            .into_iter()
            .flatten()
            .map(|row| row as usize)
            .collect())
    }

    /// Values of a numeric column.
    pub(crate) fn numeric(&self, name: &str) -> Result<&Float64Chunked, DatasetError> {
        self.frame
            .column(name)
            .and_then(|column| column.f64())
            .map_err(frame_error)
    }

    /// Column-oriented JSON: `{"<column>": {"<row index>": value, ...}, ...}`.
    ///
    /// Columns follow file order, rows follow partition order. Integral
    /// numbers render without a fractional part; missing cells are `null`.
    pub fn to_prompt_json(&self) -> Result<String, DatasetError> {
        let rows: Vec<String> = self
            .row_indices()?
            .iter()
            .map(ToString::to_string)
            .collect();

        let mut table = Map::new();
        for column in self.visible_columns() {
            let series = self.frame.column(&column.name).map_err(frame_error)?;
            let values: Vec<Value> = match column.kind {
                ColumnKind::Numeric => series
                    .f64()
                    .map_err(frame_error)?
                    .into_iter()
                    .map(|v| v.map_or(Value::Null, json_number))
                    .collect(),
                ColumnKind::Text => series
                    .str()
                    .map_err(frame_error)?
                    .into_iter()
                    .map(|v| v.map_or(Value::Null, |s| Value::String(s.to_string())))
                    .collect(),
            };
            let cells: Map<String, Value> = rows.iter().cloned().zip(values).collect();
            table.insert(column.name.clone(), Value::Object(cells));
        }
        Ok(Value::Object(table).to_string())
    }

    fn with_frame(&self, key: PartitionKey, frame: DataFrame) -> Partition<'a> {
        Partition {
            key,
            dataset: self.dataset,
            frame,
            hidden: self.hidden.clone(),
        }
    }
}

pub(crate) fn frame_error(e: PolarsError) -> DatasetError {
    DatasetError::Frame(e.to_string())
}

/// Header names, rejecting duplicates and the internal column names.
fn read_headers(bytes: &[u8]) -> Result<Vec<String>, DatasetError> {
    let mut reader = ::csv::ReaderBuilder::new().has_headers(true).from_reader(bytes);
    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| DatasetError::Parse {
            line: 1,
            reason: e.to_string(),
        })?
        .iter()
        .map(String::from)
        .collect();

    let mut seen = BTreeSet::from([ROW_COLUMN.to_string(), MONTH_COLUMN.to_string()]);
    if let Some(duplicate) = headers.iter().find(|name| !seen.insert(name.to_string())) {
        return Err(DatasetError::DuplicateColumn(duplicate.clone()));
    }
    Ok(headers)
}

/// Integer identifiers per row; the first non-integral or missing value fails.
fn read_identifiers(raw: &DataFrame, name: &str) -> Result<Vec<i64>, DatasetError> {
    let column = raw.column(name).map_err(frame_error)?;
    let numbers = column.cast(&DataType::Float64).map_err(frame_error)?;
    let texts = column.cast(&DataType::String).map_err(frame_error)?;

    numbers
        .f64()
        .map_err(frame_error)?
        .into_iter()
        .zip(texts.str().map_err(frame_error)?)
        .enumerate()
        .map(|(row, (number, text))| {
            number
                .filter(|n| n.fract() == 0.0 && n.abs() < 9.0e15)
                .map(|n| n as i64)
                .ok_or_else(|| DatasetError::InvalidIdentifier {
                    row,
                    column: name.to_string(),
                    value: text.unwrap_or_default().to_string(),
                })
        })
        .collect()
}

/// `year * 100 + month` per row; the first unparseable date fails.
fn read_months(raw: &DataFrame, name: &str) -> Result<Vec<i32>, DatasetError> {
    let texts = raw
        .column(name)
        .and_then(|column| column.cast(&DataType::String))
        .map_err(frame_error)?;

    texts
        .str()
        .map_err(frame_error)?
        .into_iter()
        .enumerate()
        .map(|(row, text)| {
            text.and_then(parse_date)
                .map(|date| date.year() * 100 + date.month() as i32)
                .ok_or_else(|| DatasetError::InvalidDate {
                    row,
                    column: name.to_string(),
                    value: text.unwrap_or_default().to_string(),
                })
        })
        .collect()
}

/// Render a float as a JSON number, integral values without `.0`.
/// Non-finite values become `null`.
pub(crate) fn json_number(x: f64) -> Value {
    if !x.is_finite() {
        return Value::Null;
    }
    if x.fract() == 0.0 && x.abs() < 9.0e15 {
        return Value::from(x as i64);
    }
    serde_json::Number::from_f64(x).map_or(Value::Null, Value::Number)
}

/// Accepts ISO dates, ISO date-times, RFC 3339 and US `m/d/Y` dates.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d"];
    const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

    let raw = raw.trim();
    DATE_FORMATS
        .iter()
        .find_map(|f| NaiveDate::parse_from_str(raw, f).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|f| NaiveDateTime::parse_from_str(raw, f).ok())
                .map(|dt| dt.date())
        })
        .or_else(|| {
            DateTime::parse_from_rfc3339(raw)
                .ok()
                .map(|dt| dt.date_naive())
        })
}
