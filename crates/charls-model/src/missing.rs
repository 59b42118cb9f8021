//! Missing-data summary types.

use serde::{Deserialize, Serialize};

/// Missingness of one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnMissing {
    pub name: String,
    pub n_missing: usize,
    /// Percentage of rows missing, in `0.0..=100.0`.
    pub pct_missing: f64,
}

/// Missingness of a whole frame at the time it was analyzed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MissingDataSummary {
    /// Columns with at least one missing cell, most-missing first.
    pub columns: Vec<ColumnMissing>,
    /// Missing cells across every column.
    pub total_missing: usize,
    /// Rows without any missing cell.
    pub complete_cases: usize,
    pub row_count: usize,
    pub column_count: usize,
}

impl MissingDataSummary {
    pub fn incomplete_cases(&self) -> usize {
        self.row_count.saturating_sub(self.complete_cases)
    }

    pub fn column(&self, name: &str) -> Option<&ColumnMissing> {
        self.columns.iter().find(|column| column.name == name)
    }

    /// Names of columns with missing values, most-missing first.
    pub fn missing_columns(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|column| column.name.as_str())
    }

    pub fn has_missing(&self) -> bool {
        self.total_missing > 0
    }
}
