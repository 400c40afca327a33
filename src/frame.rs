//! Typed accessors over `DataFrame` columns.

use crate::error::{PipelineError, Result};
use polars::prelude::*;

pub const MILLIS_PER_DAY: i64 = 86_400_000;

pub fn require<'a>(df: &'a DataFrame, table: &str, column: &str) -> Result<&'a Column> {
    df.column(column).map_err(|_| PipelineError::MissingColumn {
        table: table.to_string(),
        column: column.to_string(),
    })
}

pub fn string_values(df: &DataFrame, table: &str, column: &str) -> Result<Vec<Option<String>>> {
    let strings = require(df, table, column)?.cast(&DataType::String)?;
    Ok(strings
        .str()?
        .into_iter()
        .map(|value| value.map(str::to_string))
        .collect())
}

pub fn float_values(df: &DataFrame, table: &str, column: &str) -> Result<Vec<Option<f64>>> {
    let floats = require(df, table, column)?.cast(&DataType::Float64)?;
    Ok(floats.f64()?.into_iter().collect())
}

/// Millisecond timestamps of a `Datetime` column.
pub fn datetime_millis(df: &DataFrame, table: &str, column: &str) -> Result<Vec<Option<i64>>> {
    let source = require(df, table, column)?;
    if !matches!(source.dtype(), DataType::Datetime(_, _)) {
        return Err(PipelineError::UnsupportedType {
            column: column.to_string(),
            dtype: source.dtype().to_string(),
        });
    }

    let physical = source
        .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?
        .cast(&DataType::Int64)?;
    Ok(physical.i64()?.into_iter().collect())
}

pub fn datetime_series(name: &str, millis: Vec<Option<i64>>) -> Result<Series> {
    Ok(Series::new(name.into(), millis).cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?)
}

/// Whole days between two millisecond timestamps, floored like a calendar delta.
pub fn whole_days_between(start_millis: i64, end_millis: i64) -> i64 {
    (end_millis - start_millis).div_euclid(MILLIS_PER_DAY)
}
