//! Formula construction and family dispatch.

use tracing::debug;

use charls_model::{ColumnSettings, FittedModel, ModelFamily, ModelFormula};

use crate::backend::{FitRequest, ImputationBackend};
use crate::error::BackendError;

/// Fixed-form formula `target ~ age + wave + (1 | subject)`.
///
/// Column names come from the settings, so renamed structural columns carry
/// through.
pub fn build_formula(target: &str, columns: &ColumnSettings) -> ModelFormula {
    ModelFormula {
        target: target.to_string(),
        fixed_effects: vec![columns.age.clone(), columns.wave.clone()],
        group: columns.subject.clone(),
    }
}

/// Call the backend routine that matches `family`.
pub fn dispatch_fit(
    backend: &dyn ImputationBackend,
    family: ModelFamily,
    request: &FitRequest<'_>,
) -> Result<FittedModel, BackendError> {
    debug!(
        backend = backend.name(),
        family = %family,
        formula = %request.formula,
        "dispatching fit"
    );
    match family {
        ModelFamily::LinearMixed => backend.fit_linear_mixed(request),
        ModelFamily::BinomialMixed => backend.fit_binomial_mixed(request),
        ModelFamily::OrdinalMixed => backend.fit_ordinal_mixed(request),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    use charls_model::{McmcControls, SurveyFrame};
    use polars::prelude::DataFrame;

    #[derive(Default)]
    struct Recorder {
        calls: RefCell<Vec<&'static str>>,
    }

    impl Recorder {
        fn record(&self, family: ModelFamily, request: &FitRequest<'_>) -> FittedModel {
            self.calls.borrow_mut().push(family.as_str());
            FittedModel {
                target: request.formula.target.clone(),
                family,
                formula: request.formula.to_string(),
                backend: self.name().to_string(),
                controls: request.controls.clone(),
                payload: Vec::new(),
            }
        }
    }

    impl ImputationBackend for Recorder {
        fn name(&self) -> &'static str {
            "recorder"
        }

        fn fit_linear_mixed(&self, request: &FitRequest<'_>) -> Result<FittedModel, BackendError> {
            Ok(self.record(ModelFamily::LinearMixed, request))
        }

        fn fit_binomial_mixed(
            &self,
            request: &FitRequest<'_>,
        ) -> Result<FittedModel, BackendError> {
            Ok(self.record(ModelFamily::BinomialMixed, request))
        }

        fn fit_ordinal_mixed(
            &self,
            request: &FitRequest<'_>,
        ) -> Result<FittedModel, BackendError> {
            Ok(self.record(ModelFamily::OrdinalMixed, request))
        }

        fn complete(&self, _model: &FittedModel, _m: usize) -> Result<Vec<DataFrame>, BackendError> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn formula_uses_configured_column_names() {
        let columns = ColumnSettings {
            subject: "pid".to_string(),
            ..ColumnSettings::default()
        };
        let formula = build_formula("cesd10", &columns);
        assert_eq!(formula.to_string(), "cesd10 ~ age + wave + (1 | pid)");
    }

    #[test]
    fn dispatch_routes_each_family() {
        let backend = Recorder::default();
        let formula = build_formula("srh", &ColumnSettings::default());
        let frame = SurveyFrame::new(DataFrame::empty());
        let controls = McmcControls::default();
        let request = FitRequest {
            formula: &formula,
            frame: &frame,
            controls: &controls,
        };

        for family in [
            ModelFamily::OrdinalMixed,
            ModelFamily::BinomialMixed,
            ModelFamily::LinearMixed,
        ] {
            let model = dispatch_fit(&backend, family, &request).unwrap();
            assert_eq!(model.family, family);
            assert_eq!(model.formula, "srh ~ age + wave + (1 | ID)");
        }
        assert_eq!(
            *backend.calls.borrow(),
            vec!["ordinal_mixed", "binomial_mixed", "linear_mixed"]
        );
    }
}
