//! CSV export of generated tables

use csv::WriterBuilder;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

use crate::models::SyntheticDataset;

pub const MOBILITY_FILE: &str = "mobility.csv";
pub const SPENDING_FILE: &str = "spending.csv";
pub const DEMOGRAPHICS_FILE: &str = "demographics.csv";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Paths written by [`write_dataset_csv`]
#[derive(Debug, Clone, PartialEq)]
pub struct ExportedFiles {
    pub mobility: PathBuf,
    pub spending: PathBuf,
    pub demographics: PathBuf,
}

fn write_table<T: Serialize>(path: &Path, rows: &[T]) -> Result<(), ExportError> {
    let mut writer = WriterBuilder::new().has_headers(true).from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    info!("Wrote {} rows to {:?}", rows.len(), path);
    Ok(())
}

/// Write the three tables into `dir`, creating it if needed
pub fn write_dataset_csv(
    dataset: &SyntheticDataset,
    dir: &Path,
) -> Result<ExportedFiles, ExportError> {
    fs::create_dir_all(dir)?;

    let files = ExportedFiles {
        mobility: dir.join(MOBILITY_FILE),
        spending: dir.join(SPENDING_FILE),
        demographics: dir.join(DEMOGRAPHICS_FILE),
    };

    write_table(&files.mobility, &dataset.mobility)?;
    write_table(&files.spending, &dataset.spending)?;
    write_table(&files.demographics, &dataset.demographics)?;

    Ok(files)
}
