//! Data model for the CHARLS multiple-imputation workflow.
//!
//! This crate holds the types shared by every stage of the workflow:
//!
//! - [`SurveyFrame`]: a Polars `DataFrame` annotated with per-column measurement kinds
//! - [`Classification`]: the vocabulary categories matched against a frame
//! - [`MissingDataSummary`]: per-column and table-wide missingness statistics
//! - [`FittedModel`] and [`McmcControls`]: what the external model library hands back
//! - [`Settings`]: the immutable run configuration, including the domain vocabulary

pub mod classification;
pub mod error;
pub mod frame;
pub mod missing;
pub mod model;
pub mod settings;

pub use classification::{Classification, ModelFamily, VariableCategory};
pub use error::{ConfigError, Result};
pub use frame::{ColumnKind, SurveyFrame};
pub use missing::{ColumnMissing, MissingDataSummary};
pub use model::{FittedModel, McmcControls, ModelFormula};
pub use settings::{
    CONFIG_ENV_VAR, ColumnSettings, DEFAULT_CONFIG_FILENAME, PathSettings, Settings,
    TargetSettings, Vocabulary,
};
