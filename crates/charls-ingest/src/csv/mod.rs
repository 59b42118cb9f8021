//! CSV reading and writing.

mod reader;
mod writer;

pub use reader::{NA_MARKER, read_csv_frame, read_survey_csv, validate_encoding};
pub use writer::{ensure_dir, write_csv_frame};
