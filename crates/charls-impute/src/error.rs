//! Error types for the imputation pipeline and its external backend.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use charls_ingest::IngestError;
use charls_model::ConfigError;

use crate::pipeline::PipelineState;

/// Errors raised by a pipeline stage.
///
/// Precondition failures are returned before any work is done. Failures of
/// the external library are not errors: they come back as
/// [`FitOutcome::Failed`](crate::FitOutcome) or
/// [`GenerateOutcome::Failed`](crate::GenerateOutcome).
#[derive(Debug, Error)]
pub enum PipelineError {
    // === Preconditions ===
    #[error("no table loaded; run the load stage first")]
    NoTable,

    #[error("no fitted model; run the fit stage first")]
    NotFitted,

    #[error("no imputed datasets; run the generate stage first")]
    NotGenerated,

    #[error("no column has missing values; nothing to impute")]
    NoMissingColumn,

    #[error("target column '{0}' is not in the table")]
    UnknownTarget(String),

    #[error("target column '{0}' is excluded from modelling")]
    ExcludedTarget(String),

    #[error("number of imputations must be at least 1")]
    InvalidImputationCount,

    // === I/O ===
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize fitted models: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("DataFrame operation failed: {0}")]
    Polars(#[from] polars::prelude::PolarsError),
}

/// Errors raised by an [`ImputationBackend`](crate::ImputationBackend).
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("external process exited with {status}: {stderr}")]
    ProcessFailed { status: String, stderr: String },

    #[error("backend I/O failed at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error("expected backend output is missing: {0}")]
    MissingOutput(PathBuf),

    #[error("{0}")]
    Rejected(String),
}

pub type Result<T> = std::result::Result<T, PipelineError>;

/// A stage that failed, with the state it was given handed back unchanged.
pub struct StageError {
    state: Box<PipelineState>,
    error: PipelineError,
}

impl StageError {
    pub(crate) fn new(state: PipelineState, error: PipelineError) -> Self {
        Self {
            state: Box::new(state),
            error,
        }
    }

    pub fn error(&self) -> &PipelineError {
        &self.error
    }

    pub fn state(&self) -> &PipelineState {
        &self.state
    }

    pub fn into_error(self) -> PipelineError {
        self.error
    }

    pub fn into_state(self) -> PipelineState {
        *self.state
    }

    pub fn into_parts(self) -> (PipelineState, PipelineError) {
        (*self.state, self.error)
    }
}

impl fmt::Debug for StageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StageError")
            .field("stage", &self.state.stage)
            .field("error", &self.error)
            .finish()
    }
}

impl fmt::Display for StageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.error, f)
    }
}

impl std::error::Error for StageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.error.source()
    }
}

impl From<StageError> for PipelineError {
    fn from(err: StageError) -> Self {
        err.error
    }
}

/// Result of a stage method.
pub type StageResult<T> = std::result::Result<T, StageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn precondition_messages_name_the_missing_stage() {
        assert_eq!(
            PipelineError::NotFitted.to_string(),
            "no fitted model; run the fit stage first"
        );
        assert_eq!(
            PipelineError::UnknownTarget("srh".to_string()).to_string(),
            "target column 'srh' is not in the table"
        );
    }

    #[test]
    fn stage_error_displays_the_pipeline_error() {
        let err = StageError::new(PipelineState::new(), PipelineError::NoTable);
        assert_eq!(err.to_string(), PipelineError::NoTable.to_string());
        let (state, error) = err.into_parts();
        assert_eq!(state.stage, crate::Stage::Created);
        assert!(matches!(error, PipelineError::NoTable));
    }

    #[test]
    fn process_failure_keeps_stderr() {
        let err = BackendError::ProcessFailed {
            status: "exit status: 1".to_string(),
            stderr: "there is no package called 'JointAI'".to_string(),
        };
        assert!(err.to_string().contains("JointAI"));
    }
}
