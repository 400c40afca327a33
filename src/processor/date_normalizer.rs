use crate::error::Result;
use crate::frame::{datetime_series, require};
use crate::models::columns;
use chrono::{NaiveDate, NaiveDateTime};
use polars::prelude::*;
use tracing::{debug, warn};

const DATETIME_FORMATS: [&str; 5] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Converts text timestamp columns to millisecond datetimes.
pub struct DateNormalizer {
    table: &'static str,
    columns: Vec<&'static str>,
}

impl DateNormalizer {
    pub fn new(table: &'static str, columns: Vec<&'static str>) -> Self {
        Self { table, columns }
    }

    /// The five timestamp columns of the orders table.
    pub fn for_orders() -> Self {
        Self::new("orders", columns::ORDER_DATE_COLUMNS.to_vec())
    }

    /// Returns a new frame with every configured column as `Datetime(ms)`.
    /// Values that do not parse become null. Columns that are already
    /// datetimes are left as they are.
    pub fn normalize(&self, df: &DataFrame) -> Result<DataFrame> {
        let mut out = df.clone();

        for name in &self.columns {
            let normalized = self.normalize_column(require(df, self.table, name)?)?;
            if let Some(series) = normalized {
                out.with_column(series)?;
            }
        }

        Ok(out)
    }

    fn normalize_column(&self, column: &Column) -> Result<Option<Series>> {
        let name = column.name().to_string();

        match column.dtype() {
            DataType::Datetime(TimeUnit::Milliseconds, _) => return Ok(None),
            DataType::Datetime(_, _) | DataType::Date => {
                let cast = column
                    .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?
                    .as_materialized_series()
                    .clone();
                return Ok(Some(cast));
            }
            _ => {}
        }

        let text = column.cast(&DataType::String)?;
        let mut parsed = Vec::with_capacity(text.len());
        let mut unparsable = 0usize;

        for value in text.str()?.into_iter() {
            match value.map(str::trim).filter(|v| !v.is_empty()) {
                Some(raw) => {
                    let millis = parse_timestamp_millis(raw);
                    if millis.is_none() {
                        unparsable += 1;
                    }
                    parsed.push(millis);
                }
                None => parsed.push(None),
            }
        }

        if unparsable > 0 {
            warn!(
                "{} values in {}.{} could not be parsed as timestamps and were set to null",
                unparsable, self.table, name
            );
        }
        debug!("Normalized {}.{} to datetime", self.table, name);

        Ok(Some(datetime_series(&name, parsed)?))
    }
}

/// Parses a timestamp in any of the accepted layouts, or a bare date at midnight.
pub fn parse_timestamp_millis(raw: &str) -> Option<i64> {
    DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
        .map(|dt| dt.and_utc().timestamp_millis())
}
