pub mod config;
pub mod error;
pub mod frame;
pub mod loader;
pub mod models;
pub mod pipeline;
pub mod processor;
pub mod storage;
pub mod views;

pub use config::PipelineConfig;
pub use error::{PipelineError, Result};
pub use loader::{DatasetLoader, RawTables};
pub use models::{OrderStatus, SourceTable, StatusFilter};
pub use pipeline::{JoinPipeline, JoinPlan, JoinReport, TableSource, UnifiedTable, build_unified_table};
pub use processor::{PreparedTables, PreprocessOptions, Preprocessor};
pub use storage::{OutputFormat, TableWriter};
pub use views::{AnalyticsReport, ViewsConfig, build_report};
