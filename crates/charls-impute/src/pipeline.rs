//! Staged imputation pipeline.
//!
//! A [`PipelineState`] is threaded by value through the stage methods:
//!
//! ```ignore
//! let state = PipelineState::new()
//!     .load(&input, &settings)?
//!     .classify(&settings)?
//!     .analyze()?;
//! let (state, fit) = state.fit(&backend, &settings, None, &settings.mcmc)?;
//! let (state, generated) = state.generate(&backend, 5)?;
//! let (state, report) = state.persist(&settings.paths.output)?;
//! ```
//!
//! Each stage checks its own preconditions and fails fast with a
//! [`StageError`], which carries the [`PipelineError`] together with the
//! state the stage was given, untouched. The external library failing inside `fit` or `generate`
//! is reported through [`FitOutcome`] / [`GenerateOutcome`] instead, with the
//! partial results reset and the reason kept in
//! [`PipelineState::last_failure`].

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::{DateTime, Utc};
use polars::prelude::DataFrame;
use serde::Serialize;
use tracing::{debug, info, warn};

use charls_core::{analyze, classify};
use charls_ingest::{any_to_f64, format_numeric, normalize_loaded, read_survey_csv, string_values};
use charls_model::{
    Classification, FittedModel, McmcControls, MissingDataSummary, ModelFamily, ModelFormula,
    Settings, SurveyFrame, VariableCategory,
};

use crate::adapter::{build_formula, dispatch_fit};
use crate::backend::{FitRequest, ImputationBackend};
use crate::error::{BackendError, PipelineError, Result, StageError, StageResult};
use crate::repair::flatten_list_columns;
use crate::writer::{IMPUTED_DIR, MODELS_DIR, write_fitted_models, write_imputed_datasets};

/// Last stage that completed successfully.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    #[default]
    Created,
    Loaded,
    Classified,
    Analyzed,
    Fitted,
    Generated,
    Persisted,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Created => "created",
            Stage::Loaded => "loaded",
            Stage::Classified => "classified",
            Stage::Analyzed => "analyzed",
            Stage::Fitted => "fitted",
            Stage::Generated => "generated",
            Stage::Persisted => "persisted",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Completed datasets drawn from a fitted model.
#[derive(Debug, Clone)]
pub struct GenerationResult {
    pub datasets: Vec<DataFrame>,
    pub count: usize,
    pub generated_at: DateTime<Utc>,
}

/// Result of the fit stage once its preconditions hold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FitOutcome {
    Fitted { target: String, family: ModelFamily },
    Failed { target: String, reason: String },
}

impl FitOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, FitOutcome::Fitted { .. })
    }
}

/// Result of the generate stage once its preconditions hold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerateOutcome {
    Generated { count: usize },
    Failed { reason: String },
}

impl GenerateOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, GenerateOutcome::Generated { .. })
    }
}

/// Files written by the persist stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PersistReport {
    pub datasets: Vec<PathBuf>,
    pub models: PathBuf,
}

/// Everything the pipeline knows so far.
#[derive(Debug, Clone, Default)]
pub struct PipelineState {
    pub frame: Option<SurveyFrame>,
    pub classification: Option<Classification>,
    pub missing: Option<MissingDataSummary>,
    /// Fitted models keyed by target column.
    pub models: BTreeMap<String, FittedModel>,
    pub generation: Option<GenerationResult>,
    pub stage: Stage,
    /// Reason of the most recent external-library failure.
    pub last_failure: Option<String>,
}

impl PipelineState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a survey CSV and apply the load-time normalizations.
    ///
    /// Replaces every earlier result.
    pub fn load(self, path: &Path, settings: &Settings) -> StageResult<Self> {
        let start = Instant::now();
        let frame = match read_normalized(path, settings) {
            Ok(frame) => frame,
            Err(error) => return Err(StageError::new(self, error)),
        };
        info!(
            path = %path.display(),
            rows = frame.height(),
            columns = frame.width(),
            dropped = frame.dropped_columns().len(),
            duration_ms = start.elapsed().as_millis(),
            "load complete"
        );
        Ok(Self::from_frame(frame))
    }

    /// Start from an in-memory frame instead of a file.
    pub fn from_frame(frame: SurveyFrame) -> Self {
        Self {
            frame: Some(frame),
            stage: Stage::Loaded,
            ..Self::default()
        }
    }

    /// Tag the columns by vocabulary category and coerce them in place.
    pub fn classify(mut self, settings: &Settings) -> StageResult<Self> {
        let start = Instant::now();
        let classified = self.table().and_then(|frame| {
            let mut frame = frame.clone();
            let classification = classify(&mut frame, &settings.vocabulary)?;
            Ok((frame, classification))
        });
        let (frame, classification) = match classified {
            Ok(classified) => classified,
            Err(error) => return Err(StageError::new(self, error)),
        };
        if self.frame.as_ref().map(SurveyFrame::kinds) != Some(frame.kinds()) {
            // Dropped or re-typed columns invalidate the missing summary.
            self.missing = None;
        }
        info!(
            excluded = classification.excluded.len(),
            duration_ms = start.elapsed().as_millis(),
            "classify complete"
        );
        self.frame = Some(frame);
        self.classification = Some(classification);
        self.stage = Stage::Classified;
        Ok(self)
    }

    /// Compute the missing-data summary of the current frame.
    pub fn analyze(mut self) -> StageResult<Self> {
        let start = Instant::now();
        let summary = match self.table().map(analyze) {
            Ok(summary) => summary,
            Err(error) => return Err(StageError::new(self, error)),
        };
        info!(
            total_missing = summary.total_missing,
            complete_cases = summary.complete_cases,
            duration_ms = start.elapsed().as_millis(),
            "analyze complete"
        );
        self.missing = Some(summary);
        self.stage = Stage::Analyzed;
        Ok(self)
    }

    /// Fit an imputation model for one target column.
    ///
    /// With no explicit `target`, the first configured preference that has
    /// missing values is used, else the first column with missing values.
    pub fn fit(
        mut self,
        backend: &dyn ImputationBackend,
        settings: &Settings,
        target: Option<&str>,
        controls: &McmcControls,
    ) -> StageResult<(Self, FitOutcome)> {
        let start = Instant::now();
        let plan = match self.plan_fit(settings, target) {
            Ok(plan) => plan,
            Err(error) => return Err(StageError::new(self, error)),
        };
        let FitPlan {
            frame,
            missing,
            target,
            family,
            formula,
            fit_frame,
        } = plan;

        let request = FitRequest {
            formula: &formula,
            frame: &fit_frame,
            controls,
        };
        let result = dispatch_fit(backend, family, &request);

        self.frame = Some(frame);
        self.missing = Some(missing);
        self.generation = None;
        self.models.clear();
        match result {
            Ok(model) => {
                info!(
                    column = %target,
                    family = %family,
                    formula = %formula,
                    backend = backend.name(),
                    duration_ms = start.elapsed().as_millis(),
                    "fit complete"
                );
                self.models.insert(target.clone(), model);
                self.last_failure = None;
                self.stage = Stage::Fitted;
                Ok((self, FitOutcome::Fitted { target, family }))
            }
            Err(err) => {
                let reason = err.to_string();
                warn!(column = %target, family = %family, error = %reason, "fit failed");
                self.last_failure = Some(reason.clone());
                Ok((self, FitOutcome::Failed { target, reason }))
            }
        }
    }

    /// Draw `m` completed datasets from the first fitted model.
    pub fn generate(
        mut self,
        backend: &dyn ImputationBackend,
        m: usize,
    ) -> StageResult<(Self, GenerateOutcome)> {
        let start = Instant::now();
        let model = match self.model_for_generation(m) {
            Ok(model) => model,
            Err(error) => return Err(StageError::new(self, error)),
        };

        let result = backend.complete(&model, m).and_then(|datasets| {
            if datasets.len() == m {
                Ok(datasets)
            } else {
                Err(BackendError::Rejected(format!(
                    "backend returned {} datasets, {m} requested",
                    datasets.len()
                )))
            }
        });

        match result {
            Ok(datasets) => {
                info!(
                    column = %model.target,
                    count = m,
                    duration_ms = start.elapsed().as_millis(),
                    "generate complete"
                );
                self.generation = Some(GenerationResult {
                    datasets,
                    count: m,
                    generated_at: Utc::now(),
                });
                self.last_failure = None;
                self.stage = Stage::Generated;
                Ok((self, GenerateOutcome::Generated { count: m }))
            }
            Err(err) => {
                let reason = err.to_string();
                warn!(column = %model.target, error = %reason, "generate failed");
                self.generation = None;
                self.last_failure = Some(reason.clone());
                Ok((self, GenerateOutcome::Failed { reason }))
            }
        }
    }

    /// Write the imputed datasets and the fitted models under `output_dir`.
    ///
    /// A write failure hands the state back through [`StageError`] so the
    /// datasets can be persisted elsewhere.
    pub fn persist(mut self, output_dir: &Path) -> StageResult<(Self, PersistReport)> {
        let start = Instant::now();
        let report = match self.write_outputs(output_dir) {
            Ok(report) => report,
            Err(error) => return Err(StageError::new(self, error)),
        };
        info!(
            output_dir = %output_dir.display(),
            datasets = report.datasets.len(),
            duration_ms = start.elapsed().as_millis(),
            "persist complete"
        );
        self.stage = Stage::Persisted;
        Ok((self, report))
    }

    /// Read-only snapshot of what has been computed so far.
    pub fn summarize(&self, settings: &Settings) -> PipelineSummary {
        let table = self
            .frame
            .as_ref()
            .map(|frame| TableSummary::of(frame, settings));
        let classification = self.classification.as_ref().map(Classification::sizes);
        let missing = self.missing.as_ref().map(|summary| MissingSection {
            total_missing: summary.total_missing,
            complete_cases: summary.complete_cases,
            incomplete_cases: summary.incomplete_cases(),
            columns_with_missing: summary.columns.len(),
        });
        let generation = self.generation.as_ref().map(|generation| GenerationSection {
            datasets: generation.count,
            generated_at: generation.generated_at.to_rfc3339(),
        });
        PipelineSummary {
            stage: self.stage,
            table,
            classification,
            missing,
            fitted_models: self.models.len(),
            fitted_targets: self.models.keys().cloned().collect(),
            generation,
            last_failure: self.last_failure.clone(),
        }
    }

    fn table(&self) -> Result<&SurveyFrame> {
        self.frame.as_ref().ok_or(PipelineError::NoTable)
    }

    /// Everything `fit` needs, computed without touching the state.
    fn plan_fit(&self, settings: &Settings, target: Option<&str>) -> Result<FitPlan> {
        let mut frame = self.table()?.clone();
        let repaired = flatten_list_columns(&mut frame)?;
        if !repaired.is_empty() {
            info!(columns = ?repaired, "flattened list columns");
        }
        let missing = analyze(&frame);

        let excluded = |name: &str| {
            settings.vocabulary.excluded.iter().any(|item| item == name)
                || self
                    .classification
                    .as_ref()
                    .is_some_and(|classification| classification.is_excluded(name))
        };
        let target = match target {
            Some(name) => {
                if excluded(name) {
                    return Err(PipelineError::ExcludedTarget(name.to_string()));
                }
                if !frame.has_column(name) {
                    return Err(PipelineError::UnknownTarget(name.to_string()));
                }
                name.to_string()
            }
            None => select_target(&frame, &missing, &settings.targets.preference, excluded)
                .ok_or(PipelineError::NoMissingColumn)?,
        };

        let family = self
            .classification
            .as_ref()
            .map(|classification| classification.family_for(&target))
            .unwrap_or_default();
        let formula = build_formula(&target, &settings.columns);

        let mut fit_frame = frame.clone();
        for name in &settings.vocabulary.excluded {
            fit_frame.drop_column(name);
        }
        Ok(FitPlan {
            frame,
            missing,
            target,
            family,
            formula,
            fit_frame,
        })
    }

    fn model_for_generation(&self, m: usize) -> Result<FittedModel> {
        if m == 0 {
            return Err(PipelineError::InvalidImputationCount);
        }
        self.models
            .values()
            .next()
            .cloned()
            .ok_or(PipelineError::NotFitted)
    }

    fn write_outputs(&self, output_dir: &Path) -> Result<PersistReport> {
        let generation = self.generation.as_ref().ok_or(PipelineError::NotGenerated)?;
        let datasets = write_imputed_datasets(&output_dir.join(IMPUTED_DIR), &generation.datasets)?;
        let models = write_fitted_models(&output_dir.join(MODELS_DIR), &self.models)?;
        Ok(PersistReport { datasets, models })
    }
}

fn read_normalized(path: &Path, settings: &Settings) -> Result<SurveyFrame> {
    let mut frame = read_survey_csv(path)?;
    normalize_loaded(&mut frame, &settings.columns)?;
    Ok(frame)
}

/// Inputs of one backend fit.
struct FitPlan {
    /// Table after list-column repair.
    frame: SurveyFrame,
    missing: MissingDataSummary,
    target: String,
    family: ModelFamily,
    formula: ModelFormula,
    /// `frame` without the excluded columns.
    fit_frame: SurveyFrame,
}

/// First preferred target with missing values, else the first such column in
/// table order. Excluded columns are never picked.
fn select_target(
    frame: &SurveyFrame,
    missing: &MissingDataSummary,
    preference: &[String],
    excluded: impl Fn(&str) -> bool,
) -> Option<String> {
    let has_missing = |name: &str| missing.column(name).is_some() && !excluded(name);
    if let Some(preferred) = preference.iter().find(|name| has_missing(name)) {
        debug!(column = %preferred, "selected preferred target");
        return Some(preferred.clone());
    }
    frame
        .column_names()
        .into_iter()
        .find(|name| has_missing(name))
}

/// Report of the current pipeline state. Sections that have not been
/// computed yet are omitted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineSummary {
    pub stage: Stage,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table: Option<TableSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classification: Option<BTreeMap<VariableCategory, usize>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub missing: Option<MissingSection>,
    pub fitted_models: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fitted_targets: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation: Option<GenerationSection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_failure: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableSummary {
    pub rows: usize,
    pub columns: usize,
    /// Distinct non-missing subject identifiers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subjects: Option<usize>,
    /// Distinct wave values, ascending.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub waves: Option<Vec<String>>,
}

impl TableSummary {
    fn of(frame: &SurveyFrame, settings: &Settings) -> Self {
        let subjects = frame
            .data
            .column(&settings.columns.subject)
            .ok()
            .and_then(|column| string_values(column).ok())
            .map(|values| values.into_iter().flatten().collect::<BTreeSet<_>>().len());
        let waves = frame
            .data
            .column(&settings.columns.wave)
            .ok()
            .map(|column| {
                let mut values: Vec<f64> = (0..column.len())
                    .filter_map(|idx| column.get(idx).ok().and_then(any_to_f64))
                    .collect();
                values.sort_by(f64::total_cmp);
                values.dedup();
                values.into_iter().map(format_numeric).collect()
            });
        Self {
            rows: frame.height(),
            columns: frame.width(),
            subjects,
            waves,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissingSection {
    pub total_missing: usize,
    pub complete_cases: usize,
    pub incomplete_cases: usize,
    pub columns_with_missing: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationSection {
    pub datasets: usize,
    /// RFC 3339 UTC timestamp.
    pub generated_at: String,
}
