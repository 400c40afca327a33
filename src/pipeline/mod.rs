pub mod join_pipeline;

pub use join_pipeline::*;

use crate::error::Result;
use crate::loader::{DatasetLoader, RawTables};
use crate::models::StatusFilter;
use crate::processor::{PreprocessOptions, Preprocessor};
use std::path::PathBuf;

/// Where the source tables come from.
pub enum TableSource {
    Directory(PathBuf),
    Loaded(RawTables),
}

/// Loads (if needed), preprocesses and joins the source tables into the
/// unified order record.
pub fn build_unified_table(
    source: TableSource,
    status_filter: StatusFilter,
    options: PreprocessOptions,
) -> Result<UnifiedTable> {
    let raw = match source {
        TableSource::Directory(dir) => DatasetLoader::new(dir).load_all()?,
        TableSource::Loaded(raw) => raw,
    };
    let prepared = Preprocessor::new(options).prepare(&raw)?;
    JoinPipeline::unified(status_filter).run(&prepared)
}
