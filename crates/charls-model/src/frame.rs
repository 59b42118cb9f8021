//! Survey frame types.
//!
//! A [`SurveyFrame`] wraps a Polars `DataFrame` with the measurement kind of
//! every column. Polars keeps the cell values (nulls are the missing marker);
//! the kind annotation records what the imputation model should treat each
//! column as, including the level order of ordered categorical columns.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use polars::prelude::{DataFrame, DataType, PolarsResult, Series};
use serde::{Deserialize, Serialize};

/// Measurement kind of a single column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ColumnKind {
    /// Integer or floating-point values.
    Numeric,
    /// Free text with no declared level set.
    Text,
    /// Unordered categorical values.
    Categorical,
    /// Ordered categorical values; `levels` runs from lowest to highest.
    Ordered { levels: Vec<String> },
}

impl ColumnKind {
    /// Infer the initial kind of a freshly loaded column from its dtype.
    pub fn from_dtype(dtype: &DataType) -> Self {
        match dtype {
            DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64 => Self::Numeric,
            DataType::Boolean => Self::Categorical,
            _ => Self::Text,
        }
    }

    pub fn is_categorical(&self) -> bool {
        matches!(self, Self::Categorical | Self::Ordered { .. })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Numeric => "numeric",
            Self::Text => "text",
            Self::Categorical => "categorical",
            Self::Ordered { .. } => "ordered",
        }
    }

    /// Level order for ordered columns.
    pub fn levels(&self) -> Option<&[String]> {
        match self {
            Self::Ordered { levels } => Some(levels),
            _ => None,
        }
    }
}

/// A loaded survey table with per-column measurement kinds.
#[derive(Debug, Clone)]
pub struct SurveyFrame {
    /// The cell values.
    pub data: DataFrame,
    /// The file this frame was read from, when it came from disk.
    pub source: Option<PathBuf>,
    kinds: BTreeMap<String, ColumnKind>,
    dropped: Vec<String>,
}

impl SurveyFrame {
    /// Wrap a DataFrame, inferring column kinds from the dtypes.
    pub fn new(data: DataFrame) -> Self {
        let kinds = data
            .get_columns()
            .iter()
            .map(|column| {
                (
                    column.name().to_string(),
                    ColumnKind::from_dtype(column.dtype()),
                )
            })
            .collect();
        Self {
            data,
            source: None,
            kinds,
            dropped: Vec::new(),
        }
    }

    /// Attach the source path.
    pub fn with_source(mut self, path: &Path) -> Self {
        self.source = Some(path.to_path_buf());
        self
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.data.height()
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.data.width()
    }

    /// Column names in table order.
    pub fn column_names(&self) -> Vec<String> {
        self.data
            .get_column_names()
            .into_iter()
            .map(|name| name.to_string())
            .collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.kinds.contains_key(name)
    }

    pub fn kind(&self, name: &str) -> Option<&ColumnKind> {
        self.kinds.get(name)
    }

    /// Kinds of all columns, keyed by name.
    pub fn kinds(&self) -> &BTreeMap<String, ColumnKind> {
        &self.kinds
    }

    /// Overwrite the kind annotation of an existing column.
    ///
    /// Returns `false` when the column does not exist.
    pub fn set_kind(&mut self, name: &str, kind: ColumnKind) -> bool {
        match self.kinds.get_mut(name) {
            Some(slot) => {
                *slot = kind;
                true
            }
            None => false,
        }
    }

    /// Remove a column. Returns `true` when the column existed.
    pub fn drop_column(&mut self, name: &str) -> bool {
        if self.kinds.remove(name).is_none() {
            return false;
        }
        if !self.dropped.iter().any(|dropped| dropped == name) {
            self.dropped.push(name.to_string());
        }
        self.data.drop_in_place(name).is_ok()
    }

    /// Whether `name` was present once and has since been dropped.
    pub fn was_dropped(&self, name: &str) -> bool {
        !self.has_column(name) && self.dropped.iter().any(|dropped| dropped == name)
    }

    /// Names of dropped columns, in drop order.
    pub fn dropped_columns(&self) -> &[String] {
        &self.dropped
    }

    /// Replace (or append) a column and record its kind.
    pub fn replace_column(&mut self, series: Series, kind: ColumnKind) -> PolarsResult<()> {
        let name = series.name().to_string();
        self.data.with_column(series)?;
        self.kinds.insert(name, kind);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::{Column, IntoColumn, NamedFrom};

    fn frame() -> SurveyFrame {
        let columns: Vec<Column> = vec![
            Series::new("ID".into(), vec!["a", "b"]).into_column(),
            Series::new("age".into(), vec![61.0, 58.0]).into_column(),
        ];
        SurveyFrame::new(DataFrame::new(columns).expect("frame"))
    }

    #[test]
    fn infers_kinds_from_dtypes() {
        let frame = frame();
        assert_eq!(frame.kind("ID"), Some(&ColumnKind::Text));
        assert_eq!(frame.kind("age"), Some(&ColumnKind::Numeric));
        assert_eq!(frame.column_names(), vec!["ID", "age"]);
    }

    #[test]
    fn drop_column_removes_data_and_kind() {
        let mut frame = frame();
        assert!(frame.drop_column("age"));
        assert!(!frame.drop_column("age"));
        assert_eq!(frame.width(), 1);
        assert!(frame.kind("age").is_none());
        assert!(frame.was_dropped("age"));
        assert_eq!(frame.dropped_columns(), ["age".to_string()]);
        assert!(!frame.was_dropped("ID"));
    }

    #[test]
    fn replace_column_records_kind() {
        let mut frame = frame();
        let series = Series::new("ID".into(), vec!["x", "y"]);
        frame
            .replace_column(series, ColumnKind::Categorical)
            .expect("replace");
        assert_eq!(frame.kind("ID"), Some(&ColumnKind::Categorical));
        assert_eq!(frame.width(), 2);
    }
}
