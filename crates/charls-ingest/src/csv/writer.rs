//! CSV output.

use std::fs::{self, File};
use std::path::Path;

use polars::prelude::{CsvWriter, DataFrame, SerWriter};

use crate::error::{IngestError, Result};

/// Create `dir` and its parents when absent.
pub fn ensure_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).map_err(|source| IngestError::FileWrite {
        path: dir.to_path_buf(),
        source,
    })
}

/// Write a DataFrame as CSV with a header row.
///
/// Column order is preserved; nulls are written as empty fields. The parent
/// directory must already exist.
pub fn write_csv_frame(df: &DataFrame, path: &Path) -> Result<()> {
    let mut file = File::create(path).map_err(|source| IngestError::FileWrite {
        path: path.to_path_buf(),
        source,
    })?;
    let mut data = df.clone();
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(&mut data)
        .map_err(|e| IngestError::CsvWrite {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
    tracing::debug!(
        path = %path.display(),
        rows = df.height(),
        columns = df.width(),
        "wrote csv"
    );
    Ok(())
}
