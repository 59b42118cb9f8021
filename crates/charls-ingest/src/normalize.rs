//! Structural normalization applied right after loading.
//!
//! - the subject identifier becomes categorical (string-valued)
//! - the wave index becomes numeric (Float64)
//! - row-index columns left by earlier exports are dropped

use charls_model::{ColumnKind, ColumnSettings, SurveyFrame};

use crate::error::Result;
use crate::polars_utils::{to_f64_series, to_string_series};

/// What [`normalize_loaded`] changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadNormalization {
    pub subject_coerced: bool,
    pub wave_coerced: bool,
    pub dropped_columns: Vec<String>,
}

/// Apply the load-time normalizations to a freshly read frame.
pub fn normalize_loaded(
    frame: &mut SurveyFrame,
    columns: &ColumnSettings,
) -> Result<LoadNormalization> {
    let mut report = LoadNormalization::default();

    for legacy in &columns.legacy_index {
        if legacy == &columns.subject || legacy == &columns.wave {
            continue;
        }
        if frame.drop_column(legacy) {
            tracing::debug!(column = %legacy, "dropped legacy row-index column");
            report.dropped_columns.push(legacy.clone());
        }
    }

    if frame.has_column(&columns.subject) {
        let series = to_string_series(frame.data.column(&columns.subject)?)?;
        frame.replace_column(series, ColumnKind::Categorical)?;
        report.subject_coerced = true;
    }

    if frame.has_column(&columns.wave) {
        let series = to_f64_series(frame.data.column(&columns.wave)?)?;
        frame.replace_column(series, ColumnKind::Numeric)?;
        report.wave_coerced = true;
    }

    Ok(report)
}
