use crate::error::Result;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Policy for gaps in numeric product columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NumericFill {
    #[default]
    None,
    Median,
}

pub struct MedianFiller {
    columns: Vec<&'static str>,
}

impl MedianFiller {
    pub fn new(columns: Vec<&'static str>) -> Self {
        Self { columns }
    }

    /// Fills nulls in each configured column with that column's median over
    /// its non-null values in `df`. Absent columns and columns without nulls
    /// are left untouched; filled columns become `Float64`.
    pub fn fill(&self, df: &DataFrame) -> Result<DataFrame> {
        let mut fills = Vec::new();
        for name in &self.columns {
            let Ok(column) = df.column(name) else {
                continue;
            };
            let missing = column.null_count();
            if missing == 0 {
                continue;
            }

            info!("Filling {} missing values in {} with the column median", missing, name);
            let values = col(*name).cast(DataType::Float64);
            fills.push(values.clone().fill_null(values.median()).alias(*name));
        }

        if fills.is_empty() {
            return Ok(df.clone());
        }
        Ok(df.clone().lazy().with_columns(fills).collect()?)
    }
}
