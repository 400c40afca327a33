use crate::error::{PipelineError, Result};
use crate::frame::require;
use crate::models::SourceTable;
use polars::prelude::*;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// The eight source tables, keyed by table, as read from disk or handed in by a caller.
#[derive(Debug, Clone, Default)]
pub struct RawTables {
    frames: HashMap<SourceTable, DataFrame>,
}

impl RawTables {
    /// Wraps already-loaded frames. Key columns are normalized and required
    /// columns checked exactly as for files read from disk.
    pub fn from_frames(frames: HashMap<SourceTable, DataFrame>) -> Result<Self> {
        let mut normalized = HashMap::with_capacity(frames.len());
        for table in SourceTable::ALL {
            let df = frames
                .get(&table)
                .ok_or(PipelineError::MissingTable(table.name()))?;
            normalized.insert(table, normalize_table(table, df.clone())?);
        }
        Ok(Self { frames: normalized })
    }

    pub fn get(&self, table: SourceTable) -> Result<&DataFrame> {
        self.frames
            .get(&table)
            .ok_or(PipelineError::MissingTable(table.name()))
    }

    pub fn shapes(&self) -> Vec<(SourceTable, (usize, usize))> {
        let mut shapes: Vec<_> = self
            .frames
            .iter()
            .map(|(table, df)| (*table, df.shape()))
            .collect();
        shapes.sort_by_key(|(table, _)| *table);
        shapes
    }
}

/// Reads the fixed set of CSV files from one dataset directory.
pub struct DatasetLoader {
    dataset_dir: PathBuf,
    infer_schema_length: usize,
}

impl DatasetLoader {
    pub fn new(dataset_dir: impl Into<PathBuf>) -> Self {
        Self {
            dataset_dir: dataset_dir.into(),
            infer_schema_length: 10_000,
        }
    }

    pub fn with_infer_schema_length(mut self, rows: usize) -> Self {
        self.infer_schema_length = rows;
        self
    }

    pub fn dataset_dir(&self) -> &Path {
        &self.dataset_dir
    }

    pub fn path_for(&self, table: SourceTable) -> PathBuf {
        self.dataset_dir.join(table.file_name())
    }

    /// Fails on the first absent file before any file is read.
    pub fn check_inputs(&self) -> Result<()> {
        for table in SourceTable::ALL {
            let path = self.path_for(table);
            if !path.is_file() {
                return Err(PipelineError::MissingInputFile {
                    table: table.name(),
                    path,
                });
            }
        }
        Ok(())
    }

    pub fn load_all(&self) -> Result<RawTables> {
        info!("Loading datasets from: {}", self.dataset_dir.display());
        self.check_inputs()?;

        let mut frames = HashMap::with_capacity(SourceTable::ALL.len());
        for table in SourceTable::ALL {
            let df = self.load_table(table)?;
            frames.insert(table, df);
        }

        info!("Loaded {} source tables", frames.len());
        Ok(RawTables { frames })
    }

    pub fn load_table(&self, table: SourceTable) -> Result<DataFrame> {
        let path = self.path_for(table);
        if !path.is_file() {
            return Err(PipelineError::MissingInputFile {
                table: table.name(),
                path,
            });
        }

        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(self.infer_schema_length))
            .try_into_reader_with_file_path(Some(path.clone()))
            .and_then(|reader| reader.finish())
            .map_err(|e| PipelineError::Read {
                path: path.clone(),
                detail: e.to_string(),
            })?;

        let df = normalize_table(table, df)?;
        info!("Loaded {} with {} rows", table, df.height());
        debug!("{} columns: {:?}", table, df.get_column_names());
        Ok(df)
    }
}

/// Checks required columns and casts key columns to strings so joins compare
/// identifiers the same way regardless of how the reader inferred them.
fn normalize_table(table: SourceTable, mut df: DataFrame) -> Result<DataFrame> {
    for column in table.required_columns() {
        require(&df, table.name(), column)?;
    }

    for key in table.key_columns() {
        let recast = {
            let column = require(&df, table.name(), key)?;
            if column.dtype() == &DataType::String {
                None
            } else {
                Some(column.cast(&DataType::String)?)
            }
        };
        if let Some(column) = recast {
            df.with_column(column)?;
        }
    }

    Ok(df)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_frames() -> HashMap<SourceTable, DataFrame> {
        let mut frames = HashMap::new();
        frames.insert(
            SourceTable::Customers,
            df!("customer_id" => [1i64, 2]).unwrap(),
        );
        frames.insert(
            SourceTable::OrderItems,
            df!("order_id" => ["o1"], "product_id" => ["p1"], "seller_id" => ["s1"]).unwrap(),
        );
        frames.insert(
            SourceTable::OrderPayments,
            df!("order_id" => ["o1"], "payment_value" => [10.0]).unwrap(),
        );
        frames.insert(
            SourceTable::OrderReviews,
            df!("order_id" => ["o1"], "review_id" => ["r1"]).unwrap(),
        );
        frames.insert(
            SourceTable::Orders,
            df!(
                "order_id" => ["o1"],
                "customer_id" => ["1"],
                "order_status" => ["delivered"],
                "order_purchase_timestamp" => ["2017-01-01 00:00:00"],
                "order_approved_at" => [None::<&str>],
                "order_delivered_carrier_date" => [None::<&str>],
                "order_delivered_customer_date" => [None::<&str>],
                "order_estimated_delivery_date" => [None::<&str>]
            )
            .unwrap(),
        );
        frames.insert(
            SourceTable::Products,
            df!("product_id" => ["p1"], "product_category_name" => [None::<&str>]).unwrap(),
        );
        frames.insert(SourceTable::Sellers, df!("seller_id" => ["s1"]).unwrap());
        frames.insert(
            SourceTable::CategoryTranslation,
            df!(
                "product_category_name" => ["beleza_saude"],
                "product_category_name_english" => ["health_beauty"]
            )
            .unwrap(),
        );
        frames
    }

    #[test]
    fn test_from_frames_casts_keys_to_strings() {
        let tables = RawTables::from_frames(minimal_frames()).unwrap();
        let customers = tables.get(SourceTable::Customers).unwrap();
        assert_eq!(
            customers.column("customer_id").unwrap().dtype(),
            &DataType::String
        );
    }

    #[test]
    fn test_from_frames_reports_missing_table() {
        let mut frames = minimal_frames();
        frames.remove(&SourceTable::Sellers);
        let err = RawTables::from_frames(frames).unwrap_err();
        assert!(matches!(err, PipelineError::MissingTable("sellers")));
    }

    #[test]
    fn test_from_frames_reports_missing_column() {
        let mut frames = minimal_frames();
        frames.insert(
            SourceTable::OrderPayments,
            df!("order_id" => ["o1"]).unwrap(),
        );
        let err = RawTables::from_frames(frames).unwrap_err();
        match err {
            PipelineError::MissingColumn { table, column } => {
                assert_eq!(table, "order_payments");
                assert_eq!(column, "payment_value");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_directory_fails_fast() {
        let loader = DatasetLoader::new("/nonexistent/dataset/dir");
        assert_eq!(loader.dataset_dir(), Path::new("/nonexistent/dataset/dir"));
        let err = loader.load_all().unwrap_err();
        match err {
            PipelineError::MissingInputFile { table, path } => {
                assert_eq!(table, "customers");
                assert!(path.ends_with("customers_dataset.csv"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
