//! Variable classification.
//!
//! Matches the static vocabulary against the columns of a frame and coerces
//! the matched binary and ordinal columns to categorical kinds.
//!
//! Order of operations:
//! 1. Excluded columns are dropped, so an excluded name never reaches another category.
//!    A column dropped by an earlier pass is still reported as excluded.
//! 2. Each remaining category keeps the vocabulary names present in the frame,
//!    in vocabulary order (exact, case-sensitive match).
//! 3. Binary columns become unordered categorical; ordinal columns become
//!    ordered categorical with levels from the config or from the data.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use polars::prelude::PolarsResult;
use tracing::{debug, info, warn};

use charls_ingest::{parse_f64, string_values, to_string_series};
use charls_model::{
    Classification, ColumnKind, ModelFamily, SurveyFrame, VariableCategory, Vocabulary,
};

/// Categories matched after exclusion, in coercion order.
const MATCHED: [VariableCategory; 4] = [
    VariableCategory::Binary,
    VariableCategory::Ordinal,
    VariableCategory::Continuous,
    VariableCategory::Required,
];

/// Classify the columns of `frame` against `vocabulary`, coercing in place.
///
/// Classifying an already classified frame yields the same result.
pub fn classify(frame: &mut SurveyFrame, vocabulary: &Vocabulary) -> PolarsResult<Classification> {
    let mut classification = Classification::default();

    for name in &vocabulary.excluded {
        if classification.excluded.contains(name) {
            continue;
        }
        if frame.drop_column(name) {
            debug!(column = %name, "dropped excluded column");
            classification.excluded.push(name.clone());
        } else if frame.was_dropped(name) {
            classification.excluded.push(name.clone());
        }
    }

    for category in MATCHED {
        let mut members: Vec<String> = Vec::new();
        for name in vocabulary.list(category) {
            if vocabulary.excluded.contains(name) || members.contains(name) {
                continue;
            }
            if frame.has_column(name) {
                members.push(name.clone());
            }
        }
        *classification.members_mut(category) = members;
    }

    for name in &classification.binary {
        coerce_categorical(frame, name)?;
        classification
            .families
            .insert(name.clone(), ModelFamily::BinomialMixed);
    }
    for name in &classification.ordinal {
        let pinned = vocabulary.ordinal_levels.get(name).map(Vec::as_slice);
        coerce_ordered(frame, name, pinned)?;
        classification
            .families
            .insert(name.clone(), ModelFamily::OrdinalMixed);
    }

    info!(
        binary = classification.binary.len(),
        ordinal = classification.ordinal.len(),
        continuous = classification.continuous.len(),
        required = classification.required.len(),
        excluded = classification.excluded.len(),
        "classified variables"
    );
    Ok(classification)
}

fn coerce_categorical(frame: &mut SurveyFrame, name: &str) -> PolarsResult<()> {
    if frame.kind(name) == Some(&ColumnKind::Categorical) {
        return Ok(());
    }
    let series = to_string_series(frame.data.column(name)?)?;
    frame.replace_column(series, ColumnKind::Categorical)
}

fn coerce_ordered(frame: &mut SurveyFrame, name: &str, pinned: Option<&[String]>) -> PolarsResult<()> {
    let column = frame.data.column(name)?;
    let values = string_values(column)?;
    let discovered = natural_levels(values.iter().flatten().map(String::as_str));
    let levels = match pinned {
        Some(pinned) => merge_pinned_levels(name, pinned, discovered),
        None => discovered,
    };
    let series = to_string_series(column)?;
    debug!(column = %name, levels = ?levels, "coerced ordinal column");
    frame.replace_column(series, ColumnKind::Ordered { levels })
}

/// Distinct values in natural order.
///
/// When every value parses as a number the levels sort numerically
/// (`"2"` before `"10"`); otherwise they sort lexicographically.
pub fn natural_levels<'a>(values: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let distinct: BTreeSet<&str> = values.into_iter().collect();
    let mut levels: Vec<String> = distinct.into_iter().map(str::to_string).collect();
    let numeric: Option<Vec<f64>> = levels.iter().map(|level| parse_f64(level)).collect();
    if let Some(numbers) = numeric {
        let mut paired: Vec<(f64, String)> = numbers.into_iter().zip(levels).collect();
        paired.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));
        levels = paired.into_iter().map(|(_, level)| level).collect();
    }
    levels
}

/// Configured order first; values the config does not list follow in natural order.
fn merge_pinned_levels(name: &str, pinned: &[String], discovered: Vec<String>) -> Vec<String> {
    let mut levels = pinned.to_vec();
    let extra: Vec<String> = discovered
        .into_iter()
        .filter(|value| !pinned.contains(value))
        .collect();
    if !extra.is_empty() {
        warn!(
            column = %name,
            values = ?extra,
            "ordinal values outside the configured levels appended to the end"
        );
        levels.extend(extra);
    }
    levels
}
