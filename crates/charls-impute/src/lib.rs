//! Multiple-imputation pipeline for longitudinal CHARLS survey data.
//!
//! The crate owns the staged workflow around an external Bayesian
//! mixed-model library:
//!
//! - [`PipelineState`]: the state record threaded through
//!   `load → classify → analyze → fit → generate → persist`
//! - [`ImputationBackend`]: the capability interface to the external library,
//!   with [`RscriptBackend`] driving JointAI through `Rscript`
//! - [`build_formula`] / [`dispatch_fit`]: the fixed-form model formula and
//!   family dispatch
//! - [`write_imputed_datasets`] / [`write_fitted_models`]: result persistence

pub mod adapter;
pub mod backend;
pub mod error;
pub mod pipeline;
pub mod repair;
pub mod rscript;
pub mod writer;

pub use adapter::{build_formula, dispatch_fit};
pub use backend::{FitRequest, ImputationBackend};
pub use error::{BackendError, PipelineError, Result, StageError, StageResult};
pub use pipeline::{
    FitOutcome, GenerateOutcome, GenerationResult, GenerationSection, MissingSection,
    PersistReport, PipelineState, PipelineSummary, Stage, TableSummary,
};
pub use repair::flatten_list_columns;
pub use rscript::{DEFAULT_RSCRIPT, RscriptBackend};
pub use writer::{
    IMPUTED_DIR, MODELS_DIR, MODELS_FILE, imputed_dataset_filename, write_fitted_models,
    write_imputed_datasets,
};
