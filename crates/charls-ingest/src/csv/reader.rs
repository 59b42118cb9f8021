//! CSV file reading into survey frames.

use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use polars::prelude::{CsvReadOptions, DataFrame, NullValues, SerReader};

use charls_model::SurveyFrame;

use crate::error::{IngestError, Result};

/// Cell text treated as missing in addition to empty fields (R's `write.csv` marker).
pub const NA_MARKER: &str = "NA";

/// Rows scanned for dtype inference.
const INFER_SCHEMA_ROWS: usize = 1000;

/// Reject files starting with a UTF-16 byte-order mark.
///
/// A UTF-8 BOM is accepted; Polars strips it from the first header.
pub fn validate_encoding(path: &Path) -> Result<()> {
    let mut file = File::open(path).map_err(|e| IngestError::open(path, e))?;

    let mut buffer = [0u8; 2];
    let bytes_read = file.read(&mut buffer).map_err(|e| IngestError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    if bytes_read == 2 {
        if buffer == [0xFF, 0xFE] {
            return Err(IngestError::UnsupportedEncoding {
                path: path.to_path_buf(),
                encoding: "UTF-16 LE",
            });
        }
        if buffer == [0xFE, 0xFF] {
            return Err(IngestError::UnsupportedEncoding {
                path: path.to_path_buf(),
                encoding: "UTF-16 BE",
            });
        }
    }
    Ok(())
}

/// Column names from the first line of `path`, before Polars dedupes them.
///
/// Returns an empty list for an empty file.
pub fn read_header_line(path: &Path) -> Result<Vec<String>> {
    let file = File::open(path).map_err(|e| IngestError::open(path, e))?;
    let mut line = String::new();
    BufReader::new(file)
        .read_line(&mut line)
        .map_err(|e| IngestError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
    let line = line.strip_prefix('\u{feff}').unwrap_or(&line);
    let line = line.trim_end_matches(['\r', '\n']);
    if line.is_empty() {
        return Ok(Vec::new());
    }
    Ok(parse_header_line(line))
}

/// Split one header line on commas, honouring double quotes and `""` escapes.
fn parse_header_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if !in_quotes => in_quotes = true,
            '"' => {
                if chars.peek() == Some(&'"') {
                    current.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            }
            ',' if !in_quotes => fields.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    fields.push(current);
    fields
}

fn check_unique_headers(path: &Path, headers: &[String]) -> Result<()> {
    let mut seen = BTreeSet::new();
    for name in headers {
        if !seen.insert(name.as_str()) {
            return Err(IngestError::DuplicateColumn {
                column: name.clone(),
                path: path.to_path_buf(),
            });
        }
    }
    Ok(())
}

/// Reads a CSV file with a single header row into a Polars DataFrame.
///
/// Empty fields and `NA` cells become nulls. A repeated header name is
/// [`IngestError::DuplicateColumn`].
pub fn read_csv_frame(path: &Path) -> Result<DataFrame> {
    if !path.exists() {
        return Err(IngestError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    validate_encoding(path)?;
    check_unique_headers(path, &read_header_line(path)?)?;

    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(INFER_SCHEMA_ROWS))
        .map_parse_options(|options| {
            options.with_null_values(Some(NullValues::AllColumnsSingle(NA_MARKER.into())))
        })
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .map_err(|e| IngestError::CsvParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?
        .finish()
        .map_err(|e| IngestError::CsvParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    tracing::debug!(
        path = %path.display(),
        rows = df.height(),
        columns = df.width(),
        "read csv"
    );
    Ok(df)
}

/// Reads a CSV file into a [`SurveyFrame`] with kinds inferred from dtypes.
pub fn read_survey_csv(path: &Path) -> Result<SurveyFrame> {
    let df = read_csv_frame(path)?;
    Ok(SurveyFrame::new(df).with_source(path))
}
