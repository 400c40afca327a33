use crate::error::Result;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::info;

pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Csv,
    Parquet,
}

/// Writes a finished table to a single local file.
pub struct TableWriter {
    format: OutputFormat,
}

impl TableWriter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Writes `df` to `path`. The data goes to a temporary sibling first and
    /// is renamed into place only once complete.
    pub fn write(&self, df: &DataFrame, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let tmp = temp_sibling(path);
        if let Err(e) = self.write_file(df, &tmp) {
            let _ = fs::remove_file(&tmp);
            return Err(e);
        }
        fs::rename(&tmp, path)?;

        info!(
            "Wrote {} rows x {} columns to {} ({:?})",
            df.height(),
            df.width(),
            path.display(),
            self.format
        );
        Ok(())
    }

    fn write_file(&self, df: &DataFrame, path: &Path) -> Result<()> {
        let mut df = df.clone();
        let file = File::create(path)?;
        match self.format {
            OutputFormat::Csv => {
                CsvWriter::new(file)
                    .include_header(true)
                    .with_datetime_format(Some(DATETIME_FORMAT.to_string()))
                    .finish(&mut df)?;
            }
            OutputFormat::Parquet => {
                ParquetWriter::new(file).finish(&mut df)?;
            }
        }
        Ok(())
    }
}

fn temp_sibling(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    path.with_file_name(format!(".{}.tmp", name))
}
