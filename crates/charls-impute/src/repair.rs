//! Repair of list-valued columns before fitting.
//!
//! Some upstream exports nest a cell's value in a one-element list. The
//! external library only accepts scalar columns, so each list cell is
//! replaced by its first element; an empty or null list becomes missing.

use polars::prelude::{AnyValue, DataType, NamedFrom, PolarsResult, Series};
use tracing::debug;

use charls_ingest::{any_to_f64, any_to_string};
use charls_model::{ColumnKind, SurveyFrame};

/// Flatten every list-typed column of `frame` in place.
///
/// Returns the names of the repaired columns, in table order.
pub fn flatten_list_columns(frame: &mut SurveyFrame) -> PolarsResult<Vec<String>> {
    let listed: Vec<(String, DataType)> = frame
        .data
        .get_columns()
        .iter()
        .filter_map(|column| match column.dtype() {
            DataType::List(inner) => Some((column.name().to_string(), (**inner).clone())),
            _ => None,
        })
        .collect();

    for (name, inner) in &listed {
        let column = frame.data.column(name)?;
        let series = if ColumnKind::from_dtype(inner) == ColumnKind::Numeric {
            let mut values: Vec<Option<f64>> = Vec::with_capacity(column.len());
            for idx in 0..column.len() {
                values.push(match column.get(idx)? {
                    AnyValue::List(cell) if !cell.is_empty() => any_to_f64(cell.get(0)?),
                    _ => None,
                });
            }
            Series::new(name.as_str().into(), values)
        } else {
            let mut values: Vec<Option<String>> = Vec::with_capacity(column.len());
            for idx in 0..column.len() {
                values.push(match column.get(idx)? {
                    AnyValue::List(cell) if !cell.is_empty() => match cell.get(0)? {
                        AnyValue::Null => None,
                        first => Some(any_to_string(first)),
                    },
                    _ => None,
                });
            }
            Series::new(name.as_str().into(), values)
        };
        let kind = ColumnKind::from_dtype(series.dtype());
        frame.replace_column(series, kind)?;
        debug!(column = %name, "flattened list column");
    }

    Ok(listed.into_iter().map(|(name, _)| name).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::{Column, DataFrame, IntoColumn};

    #[test]
    fn takes_first_element_and_maps_empty_to_missing() {
        let bmi = Series::new(
            "bmi".into(),
            [
                Series::new("".into(), vec![22.5, 30.0]),
                Series::new("".into(), Vec::<f64>::new()),
                Series::new("".into(), vec![19.0]),
            ],
        );
        let columns: Vec<Column> = vec![
            Series::new("ID".into(), vec!["1", "2", "3"]).into_column(),
            bmi.into_column(),
        ];
        let mut frame = SurveyFrame::new(DataFrame::new(columns).unwrap());

        let repaired = flatten_list_columns(&mut frame).unwrap();

        assert_eq!(repaired, vec!["bmi"]);
        let column = frame.data.column("bmi").unwrap();
        assert_eq!(column.dtype(), &DataType::Float64);
        assert_eq!(column.null_count(), 1);
        assert_eq!(any_to_f64(column.get(0).unwrap()), Some(22.5));
        assert_eq!(any_to_f64(column.get(2).unwrap()), Some(19.0));
        assert_eq!(frame.kind("bmi"), Some(&ColumnKind::Numeric));
    }

    #[test]
    fn scalar_frames_are_untouched() {
        let columns: Vec<Column> = vec![Series::new("age".into(), vec![60.0, 61.0]).into_column()];
        let mut frame = SurveyFrame::new(DataFrame::new(columns).unwrap());
        assert!(flatten_list_columns(&mut frame).unwrap().is_empty());
        assert_eq!(frame.width(), 1);
    }
}
