//! Missing-data analysis.

use tracing::info;

use charls_model::{ColumnMissing, MissingDataSummary, SurveyFrame};

/// Compute the missing-data summary of `frame` as it is now.
///
/// Columns without missing cells are left out of `columns` but still count
/// towards `total_missing` (as zero). Ties in the descending sort keep the
/// original column order.
pub fn analyze(frame: &SurveyFrame) -> MissingDataSummary {
    let row_count = frame.height();
    let mut row_has_missing = vec![false; row_count];
    let mut columns = Vec::new();
    let mut total_missing = 0usize;

    for column in frame.data.get_columns() {
        let n_missing = column.null_count();
        total_missing += n_missing;
        if n_missing == 0 {
            continue;
        }
        let mask = column.as_materialized_series().is_null();
        for (idx, is_null) in mask.into_iter().enumerate() {
            if is_null.unwrap_or(false)
                && let Some(flag) = row_has_missing.get_mut(idx)
            {
                *flag = true;
            }
        }
        columns.push(ColumnMissing {
            name: column.name().to_string(),
            n_missing,
            pct_missing: percentage(n_missing, row_count),
        });
    }

    columns.sort_by(|a, b| b.n_missing.cmp(&a.n_missing));
    let complete_cases = row_has_missing.iter().filter(|missing| !**missing).count();

    info!(
        rows = row_count,
        columns_with_missing = columns.len(),
        total_missing,
        complete_cases,
        "analyzed missing data"
    );

    MissingDataSummary {
        columns,
        total_missing,
        complete_cases,
        row_count,
        column_count: frame.width(),
    }
}

fn percentage(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64 * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::{Column, DataFrame, IntoColumn, NamedFrom, Series};

    #[test]
    fn test_analyze_scenario_two_missing_srh() {
        let ids: Vec<String> = (1..=10).map(|i| format!("{}", (i + 1) / 2)).collect();
        let waves: Vec<f64> = (0..10).map(|i| f64::from(i % 2 + 1)).collect();
        let ages: Vec<f64> = (0..10).map(|i| 50.0 + f64::from(i)).collect();
        let srh: Vec<Option<i64>> = (1..=10)
            .map(|row| if row == 3 || row == 7 { None } else { Some(3) })
            .collect();
        let columns: Vec<Column> = vec![
            Series::new("ID".into(), ids).into_column(),
            Series::new("wave".into(), waves).into_column(),
            Series::new("age".into(), ages).into_column(),
            Series::new("srh".into(), srh).into_column(),
        ];
        let frame = SurveyFrame::new(DataFrame::new(columns).unwrap());

        let summary = analyze(&frame);

        assert_eq!(summary.columns.len(), 1);
        let srh = summary.column("srh").unwrap();
        assert_eq!(srh.n_missing, 2);
        assert!((srh.pct_missing - 20.0).abs() < 1e-9);
        assert_eq!(summary.total_missing, 2);
        assert_eq!(summary.complete_cases, 8);
        assert_eq!(summary.incomplete_cases(), 2);
        assert_eq!(summary.column_count, 4);
    }

    #[test]
    fn test_analyze_sorts_descending_with_stable_ties() {
        let columns: Vec<Column> = vec![
            Series::new("a".into(), vec![None, Some(1i64), Some(1)]).into_column(),
            Series::new("b".into(), vec![None, None, Some(1i64)]).into_column(),
            Series::new("c".into(), vec![Some(1i64), None, Some(1)]).into_column(),
        ];
        let frame = SurveyFrame::new(DataFrame::new(columns).unwrap());

        let summary = analyze(&frame);
        let order: Vec<&str> = summary.missing_columns().collect();

        assert_eq!(order, vec!["b", "a", "c"]);
        assert_eq!(summary.total_missing, 4);
        assert_eq!(summary.complete_cases, 1);
    }

    #[test]
    fn test_analyze_empty_frame() {
        let columns: Vec<Column> =
            vec![Series::new("srh".into(), Vec::<Option<i64>>::new()).into_column()];
        let frame = SurveyFrame::new(DataFrame::new(columns).unwrap());
        let summary = analyze(&frame);
        assert_eq!(summary.row_count, 0);
        assert_eq!(summary.complete_cases, 0);
        assert!(!summary.has_missing());
    }
}
