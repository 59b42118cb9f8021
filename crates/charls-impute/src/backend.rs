//! Capability interface to the external Bayesian imputation library.
//!
//! The pipeline never fits or samples anything itself. It hands a formula, a
//! frame, and MCMC controls to an [`ImputationBackend`] and keeps whatever
//! opaque [`FittedModel`] comes back; later it asks the same backend to draw
//! completed datasets from that model.
//!
//! # Implementing a backend
//!
//! ```ignore
//! struct Fixed;
//!
//! impl ImputationBackend for Fixed {
//!     fn name(&self) -> &'static str {
//!         "fixed"
//!     }
//!
//!     fn fit_linear_mixed(&self, request: &FitRequest<'_>) -> Result<FittedModel, BackendError> {
//!         // ...
//!     }
//!     // fit_binomial_mixed, fit_ordinal_mixed, complete
//! }
//! ```

use polars::prelude::DataFrame;

use charls_model::{FittedModel, McmcControls, ModelFormula, SurveyFrame};

use crate::error::BackendError;

/// Inputs of one fitting call.
#[derive(Debug, Clone, Copy)]
pub struct FitRequest<'a> {
    pub formula: &'a ModelFormula,
    pub frame: &'a SurveyFrame,
    pub controls: &'a McmcControls,
}

/// Entry points of an external mixed-model imputation library.
///
/// One fitting routine per [`ModelFamily`](charls_model::ModelFamily);
/// [`dispatch_fit`](crate::dispatch_fit) picks the right one.
pub trait ImputationBackend {
    /// Short identifier recorded on every model this backend fits.
    fn name(&self) -> &'static str;

    /// Linear mixed-effects model for continuous targets.
    fn fit_linear_mixed(&self, request: &FitRequest<'_>) -> Result<FittedModel, BackendError>;

    /// Binomial generalized linear mixed model for binary targets.
    fn fit_binomial_mixed(&self, request: &FitRequest<'_>) -> Result<FittedModel, BackendError>;

    /// Cumulative-logit ordinal mixed model for ordinal targets.
    fn fit_ordinal_mixed(&self, request: &FitRequest<'_>) -> Result<FittedModel, BackendError>;

    /// Draw `m` completed copies of the fitted data from the posterior.
    ///
    /// The original rows are not included; every returned frame has the
    /// missing cells of the fitted data filled.
    fn complete(&self, model: &FittedModel, m: usize) -> Result<Vec<DataFrame>, BackendError>;
}
