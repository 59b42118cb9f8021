//! Survey data ingestion.
//!
//! Reads CHARLS survey CSV files into [`SurveyFrame`](charls_model::SurveyFrame)s,
//! applies the load-time structural normalizations, and writes frames back
//! out as CSV.
//!
//! # Example
//!
//! ```ignore
//! use std::path::Path;
//! use charls_ingest::{normalize_loaded, read_survey_csv};
//! use charls_model::Settings;
//!
//! let settings = Settings::default();
//! let mut frame = read_survey_csv(Path::new("data/raw/charls.csv"))?;
//! normalize_loaded(&mut frame, &settings.columns)?;
//! ```

mod csv;
mod error;
mod normalize;
mod polars_utils;

// === Error Types ===
pub use error::{IngestError, Result};

// === CSV ===
pub use csv::{
    NA_MARKER, ensure_dir, read_csv_frame, read_survey_csv, validate_encoding, write_csv_frame,
};

// === Normalization ===
pub use normalize::{LoadNormalization, normalize_loaded};

// === Polars Helpers ===
pub use polars_utils::{
    any_to_f64, any_to_string, format_numeric, parse_f64, string_values, to_f64_series,
    to_string_series,
};
