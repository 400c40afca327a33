use crate::models::OrderStatus;
use crate::processor::NumericFill;
use crate::storage::OutputFormat;
use crate::views::ViewsConfig;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use tracing::info;

pub const DATASET_DIR_VAR: &str = "ECOM_DATASET_DIR";
pub const OUTPUT_PATH_VAR: &str = "ECOM_OUTPUT_PATH";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub datasets: DatasetSection,
    #[serde(default)]
    pub output: OutputSection,
    #[serde(default)]
    pub preprocess: PreprocessSection,
    #[serde(default)]
    pub pipeline: PipelineSection,
    #[serde(default)]
    pub views: ViewsConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetSection {
    pub dir: PathBuf,
    #[serde(default = "default_infer_schema_length")]
    pub infer_schema_length: usize,
}

fn default_infer_schema_length() -> usize {
    10_000
}

impl Default for DatasetSection {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("datasets"),
            infer_schema_length: default_infer_schema_length(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputSection {
    pub path: PathBuf,
    #[serde(default)]
    pub format: OutputFormat,
}

impl Default for OutputSection {
    fn default() -> Self {
        Self {
            path: PathBuf::from("output/merged_data.csv"),
            format: OutputFormat::Csv,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PreprocessSection {
    #[serde(default)]
    pub numeric_fill: NumericFill,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineSection {
    /// Order statuses kept by the batch export. Empty keeps every order.
    pub statuses: Vec<OrderStatus>,
}

impl Default for PipelineSection {
    fn default() -> Self {
        Self {
            statuses: vec![OrderStatus::Delivered],
        }
    }
}

impl PipelineConfig {
    pub fn from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read pipeline config file: {}", path))?;

        let config: PipelineConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse pipeline config file: {}", path))?;

        Ok(config)
    }

    /// Reads `path` if it exists (defaults otherwise), then applies
    /// environment overrides.
    pub fn load(path: &str) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            info!("No config file at {}, using defaults", path);
            Self::default()
        };
        config.apply_env_overrides();
        Ok(config)
    }

    pub fn apply_env_overrides(&mut self) {
        if let Ok(dir) = env::var(DATASET_DIR_VAR) {
            self.datasets.dir = PathBuf::from(dir);
        }
        if let Ok(path) = env::var(OUTPUT_PATH_VAR) {
            self.output.path = PathBuf::from(path);
        }
    }
}
