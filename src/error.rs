use polars::prelude::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading, preparing, joining or writing the datasets.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("required input file for table '{table}' not found: {}", path.display())]
    MissingInputFile { table: &'static str, path: PathBuf },

    #[error("table '{0}' was not supplied")]
    MissingTable(&'static str),

    #[error("table '{table}' is missing required column '{column}'")]
    MissingColumn { table: String, column: String },

    #[error("failed to read '{}': {detail}", path.display())]
    Read { path: PathBuf, detail: String },

    #[error("table '{0}' cannot be the right side of a join step")]
    InvalidJoinStep(&'static str),

    #[error("column '{column}' has unsupported type {dtype}")]
    UnsupportedType { column: String, dtype: String },

    #[error(transparent)]
    Polars(#[from] PolarsError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
