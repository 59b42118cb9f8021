//! Integration tests for the staged pipeline, run against a mock backend.

use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};

use polars::prelude::{Column, DataFrame, DataType};

use charls_impute::{
    BackendError, FitOutcome, FitRequest, GenerateOutcome, ImputationBackend, PipelineError,
    PipelineState, Stage, StageError,
};
use charls_ingest::{IngestError, read_csv_frame};
use charls_model::{FittedModel, ModelFamily, Settings};

const CHARLS: &str = "\
ID,wave,age,srh,nation,num
1,1,60,3,1,1
1,2,62,2,1,2
2,1,55,NA,0,3
2,2,57,4,0,4
3,1,70,1,1,5
3,2,72,2,1,6
4,1,48,NA,0,7
4,2,50,3,0,8
5,1,66,5,1,9
5,2,68,4,1,10
";

const COMPLETE: &str = "\
ID,wave,age,srh
1,1,60,3
1,2,62,2
2,1,55,4
";

/// Backend that records fit requests and hands the fitted frame back as
/// every completion.
#[derive(Default)]
struct MockBackend {
    fail_fit: bool,
    fail_complete: bool,
    fits: RefCell<Vec<(ModelFamily, String, Vec<String>)>>,
    fitted: RefCell<Option<DataFrame>>,
}

impl MockBackend {
    fn failing_fit() -> Self {
        Self {
            fail_fit: true,
            ..Self::default()
        }
    }

    fn failing_complete() -> Self {
        Self {
            fail_complete: true,
            ..Self::default()
        }
    }

    fn fit(&self, family: ModelFamily, request: &FitRequest<'_>) -> Result<FittedModel, BackendError> {
        if self.fail_fit {
            return Err(BackendError::Rejected("sampler did not converge".to_string()));
        }
        self.fits.borrow_mut().push((
            family,
            request.formula.to_string(),
            request.frame.column_names(),
        ));
        *self.fitted.borrow_mut() = Some(request.frame.data.clone());
        Ok(FittedModel {
            target: request.formula.target.clone(),
            family,
            formula: request.formula.to_string(),
            backend: self.name().to_string(),
            controls: request.controls.clone(),
            payload: b"model".to_vec(),
        })
    }
}

impl ImputationBackend for MockBackend {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn fit_linear_mixed(&self, request: &FitRequest<'_>) -> Result<FittedModel, BackendError> {
        self.fit(ModelFamily::LinearMixed, request)
    }

    fn fit_binomial_mixed(&self, request: &FitRequest<'_>) -> Result<FittedModel, BackendError> {
        self.fit(ModelFamily::BinomialMixed, request)
    }

    fn fit_ordinal_mixed(&self, request: &FitRequest<'_>) -> Result<FittedModel, BackendError> {
        self.fit(ModelFamily::OrdinalMixed, request)
    }

    fn complete(&self, _model: &FittedModel, m: usize) -> Result<Vec<DataFrame>, BackendError> {
        if self.fail_complete {
            return Err(BackendError::Rejected("posterior draws unavailable".to_string()));
        }
        let fitted = self.fitted.borrow().clone().unwrap_or_else(DataFrame::empty);
        Ok(vec![fitted; m])
    }
}

fn write_fixture(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

fn analyzed(path: &Path, settings: &Settings) -> PipelineState {
    PipelineState::new()
        .load(path, settings)
        .unwrap()
        .classify(settings)
        .unwrap()
        .analyze()
        .unwrap()
}

#[test]
fn full_run_writes_numbered_datasets_and_models() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_fixture(dir.path(), "charls.csv", CHARLS);
    let settings = Settings::default();
    let backend = MockBackend::default();

    let state = analyzed(&input, &settings);
    let missing = state.missing.as_ref().unwrap();
    let srh = missing.column("srh").unwrap();
    assert_eq!(srh.n_missing, 2);
    assert!((srh.pct_missing - 20.0).abs() < 1e-9);
    assert_eq!(missing.total_missing, 2);
    assert_eq!(missing.complete_cases, 8);

    let (state, fit) = state.fit(&backend, &settings, None, &settings.mcmc).unwrap();
    assert_eq!(
        fit,
        FitOutcome::Fitted {
            target: "srh".to_string(),
            family: ModelFamily::OrdinalMixed,
        }
    );
    {
        let fits = backend.fits.borrow();
        let (family, formula, columns) = &fits[0];
        assert_eq!(*family, ModelFamily::OrdinalMixed);
        assert_eq!(formula, "srh ~ age + wave + (1 | ID)");
        assert!(!columns.iter().any(|name| name == "num"));
    }

    let (state, generated) = state.generate(&backend, 3).unwrap();
    assert_eq!(generated, GenerateOutcome::Generated { count: 3 });

    let output = dir.path().join("output");
    let (state, report) = state.persist(&output).unwrap();
    assert_eq!(state.stage, Stage::Persisted);
    assert_eq!(report.datasets.len(), 3);
    for (idx, path) in report.datasets.iter().enumerate() {
        assert_eq!(
            path,
            &output.join("imputed").join(format!("imputed_dataset_{}.csv", idx + 1))
        );
        assert!(path.is_file());
    }
    assert_eq!(report.models, output.join("models").join("fitted_models.json"));

    let reread = read_csv_frame(&report.datasets[0]).unwrap();
    assert_eq!(reread.shape(), (10, 5));
    let generated = &state.generation.as_ref().unwrap().datasets[0];
    assert!(as_text(generated).equals_missing(&as_text(&reread)));
    let names: Vec<&str> = reread
        .get_column_names()
        .into_iter()
        .map(|name| name.as_str())
        .collect();
    assert_eq!(names, vec!["ID", "wave", "age", "srh", "nation"]);

    let models: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&report.models).unwrap()).unwrap();
    assert_eq!(models["srh"]["backend"], "mock");
    assert_eq!(models["srh"]["payload"], hex_of(b"model"));
}

/// Every column cast to text, so values compare across inferred dtypes.
fn as_text(frame: &DataFrame) -> DataFrame {
    let columns: Vec<Column> = frame
        .get_columns()
        .iter()
        .map(|column| column.cast(&DataType::String).unwrap())
        .collect();
    DataFrame::new(columns).unwrap()
}

fn hex_of(bytes: &[u8]) -> String {
    bytes.iter().map(|byte| format!("{byte:02x}")).collect()
}

#[test]
fn fit_without_missing_values_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_fixture(dir.path(), "complete.csv", COMPLETE);
    let settings = Settings::default();

    let state = analyzed(&input, &settings);
    let result = state
        .fit(&MockBackend::default(), &settings, None, &settings.mcmc)
        .map_err(StageError::into_error);

    assert!(matches!(result, Err(PipelineError::NoMissingColumn)));
}

#[test]
fn generate_before_fit_is_a_precondition_error() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_fixture(dir.path(), "charls.csv", CHARLS);
    let settings = Settings::default();

    let state = analyzed(&input, &settings);
    let err = state.generate(&MockBackend::default(), 5).unwrap_err();

    assert!(matches!(err.error(), PipelineError::NotFitted));
    let state = err.into_state();
    assert_eq!(state.stage, Stage::Analyzed);
    assert!(state.frame.is_some());
    assert!(state.missing.is_some());
}

#[test]
fn zero_imputations_are_rejected() {
    let result = PipelineState::new()
        .generate(&MockBackend::default(), 0)
        .map_err(StageError::into_error);
    assert!(matches!(result, Err(PipelineError::InvalidImputationCount)));
}

#[test]
fn explicit_targets_are_checked() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_fixture(dir.path(), "charls.csv", CHARLS);
    let settings = Settings::default();
    let backend = MockBackend::default();

    let state = analyzed(&input, &settings);
    let (state, unknown) = state
        .fit(&backend, &settings, Some("cesd10"), &settings.mcmc)
        .unwrap_err()
        .into_parts();
    assert!(matches!(unknown, PipelineError::UnknownTarget(name) if name == "cesd10"));
    assert_eq!(state.stage, Stage::Analyzed);

    let excluded = state
        .fit(&backend, &settings, Some("num"), &settings.mcmc)
        .map_err(StageError::into_error);
    assert!(matches!(excluded, Err(PipelineError::ExcludedTarget(name)) if name == "num"));
    assert!(backend.fits.borrow().is_empty());
}

#[test]
fn binary_target_uses_binomial_family() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_fixture(dir.path(), "charls.csv", CHARLS);
    let settings = Settings::default();
    let backend = MockBackend::default();

    let state = analyzed(&input, &settings);
    let (_, fit) = state
        .fit(&backend, &settings, Some("nation"), &settings.mcmc)
        .unwrap();

    assert_eq!(
        fit,
        FitOutcome::Fitted {
            target: "nation".to_string(),
            family: ModelFamily::BinomialMixed,
        }
    );
}

#[test]
fn failed_fit_clears_models_and_records_reason() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_fixture(dir.path(), "charls.csv", CHARLS);
    let settings = Settings::default();

    let state = analyzed(&input, &settings);
    let (state, first) = state
        .fit(&MockBackend::default(), &settings, None, &settings.mcmc)
        .unwrap();
    assert!(first.is_success());
    assert_eq!(state.models.len(), 1);

    let (state, second) = state
        .fit(&MockBackend::failing_fit(), &settings, None, &settings.mcmc)
        .unwrap();
    assert!(matches!(second, FitOutcome::Failed { ref target, .. } if target == "srh"));
    assert!(state.models.is_empty());
    assert_eq!(state.last_failure.as_deref(), Some("sampler did not converge"));

    let result = state
        .generate(&MockBackend::default(), 5)
        .map_err(StageError::into_error);
    assert!(matches!(result, Err(PipelineError::NotFitted)));
}

#[test]
fn failed_generation_leaves_nothing_to_persist() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_fixture(dir.path(), "charls.csv", CHARLS);
    let settings = Settings::default();
    let backend = MockBackend::failing_complete();

    let state = analyzed(&input, &settings);
    let (state, _) = state.fit(&backend, &settings, None, &settings.mcmc).unwrap();
    let (state, outcome) = state.generate(&backend, 2).unwrap();

    assert!(matches!(outcome, GenerateOutcome::Failed { .. }));
    assert!(state.generation.is_none());
    assert_eq!(state.stage, Stage::Fitted);
    let result = state
        .persist(&dir.path().join("output"))
        .map_err(StageError::into_error);
    assert!(matches!(result, Err(PipelineError::NotGenerated)));
}

#[test]
fn failed_persist_keeps_datasets_for_a_retry() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_fixture(dir.path(), "charls.csv", CHARLS);
    let blocked = write_fixture(dir.path(), "blocked", "not a directory");
    let settings = Settings::default();
    let backend = MockBackend::default();

    let state = analyzed(&input, &settings);
    let (state, _) = state.fit(&backend, &settings, None, &settings.mcmc).unwrap();
    let (state, _) = state.generate(&backend, 3).unwrap();

    let err = state.persist(&blocked).unwrap_err();
    assert!(matches!(err.error(), PipelineError::Ingest(_) | PipelineError::Io { .. }));
    let state = err.into_state();
    assert_eq!(state.stage, Stage::Generated);
    assert_eq!(state.generation.as_ref().map(|generation| generation.count), Some(3));
    assert_eq!(state.models.len(), 1);

    let (state, report) = state.persist(&dir.path().join("output")).unwrap();
    assert_eq!(state.stage, Stage::Persisted);
    assert_eq!(report.datasets.len(), 3);
}

#[test]
fn reclassifying_keeps_dropped_exclusions() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_fixture(dir.path(), "charls.csv", CHARLS);
    let settings = Settings::default();

    let state = PipelineState::new()
        .load(&input, &settings)
        .unwrap()
        .classify(&settings)
        .unwrap();
    let first = state.classification.clone().unwrap();
    let state = state.classify(&settings).unwrap();

    assert_eq!(state.classification.as_ref(), Some(&first));
    assert_eq!(first.excluded, vec!["num"]);
}

#[test]
fn duplicate_headers_are_rejected_on_load() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_fixture(dir.path(), "dup.csv", "ID,wave,srh,srh\n1,1,2,3\n");

    let result = PipelineState::new()
        .load(&input, &Settings::default())
        .map_err(StageError::into_error);

    assert!(matches!(
        result,
        Err(PipelineError::Ingest(IngestError::DuplicateColumn { ref column, .. })) if column == "srh"
    ));
}

#[test]
fn loading_a_missing_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    let result = PipelineState::new()
        .load(&dir.path().join("absent.csv"), &Settings::default())
        .map_err(StageError::into_error);
    assert!(matches!(
        result,
        Err(PipelineError::Ingest(IngestError::FileNotFound { .. }))
    ));
}

#[test]
fn summary_reports_computed_sections() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_fixture(dir.path(), "charls.csv", CHARLS);
    let settings = Settings::default();

    let empty = PipelineState::new().summarize(&settings);
    assert_eq!(
        serde_json::to_string(&empty).unwrap(),
        r#"{"stage":"created","fitted_models":0}"#
    );

    let state = analyzed(&input, &settings);
    let summary = state.summarize(&settings);
    let json = serde_json::to_string_pretty(&summary).unwrap();

    insta::assert_snapshot!(json, @r#"
    {
      "stage": "analyzed",
      "table": {
        "rows": 10,
        "columns": 5,
        "subjects": 5,
        "waves": [
          "1",
          "2"
        ]
      },
      "classification": {
        "binary": 1,
        "ordinal": 1,
        "continuous": 1,
        "required": 3,
        "excluded": 1
      },
      "missing": {
        "total_missing": 2,
        "complete_cases": 8,
        "incomplete_cases": 2,
        "columns_with_missing": 1
      },
      "fitted_models": 0
    }
    "#);
}
