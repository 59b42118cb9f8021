//! JointAI backend driven through an `Rscript` subprocess.
//!
//! Each call runs in a fresh temporary directory: the frame is written there
//! as CSV, a generated R script is piped to `Rscript -`, and the results are
//! picked up from files the script leaves behind. The fitted JointAI object
//! travels as the bytes of its `.rds` file, which become the model payload.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use polars::prelude::DataFrame;
use tempfile::TempDir;
use tracing::{debug, info};

use charls_ingest::{read_csv_frame, write_csv_frame};
use charls_model::{ColumnKind, FittedModel, McmcControls, ModelFamily, SurveyFrame};

use crate::backend::{FitRequest, ImputationBackend};
use crate::error::BackendError;

/// Program looked up on `PATH` when none is configured.
pub const DEFAULT_RSCRIPT: &str = "Rscript";

const DATA_FILE: &str = "data.csv";
const FIT_FILE: &str = "fit.rds";
const BACKEND_NAME: &str = "jointai";

/// [`ImputationBackend`] backed by the R package JointAI.
#[derive(Debug, Clone)]
pub struct RscriptBackend {
    program: PathBuf,
}

impl Default for RscriptBackend {
    fn default() -> Self {
        Self {
            program: PathBuf::from(DEFAULT_RSCRIPT),
        }
    }
}

impl RscriptBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a specific `Rscript` executable.
    #[must_use]
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    fn fit(&self, family: ModelFamily, request: &FitRequest<'_>) -> Result<FittedModel, BackendError> {
        let workdir = workdir()?;
        let data_path = workdir.path().join(DATA_FILE);
        let fit_path = workdir.path().join(FIT_FILE);
        write_csv_frame(&request.frame.data, &data_path)?;

        let script = fit_script(family, request, &data_path, &fit_path);
        self.run(&script)?;

        let payload = read_output(&fit_path)?;
        info!(
            family = %family,
            column = %request.formula.target,
            payload_bytes = payload.len(),
            "external fit finished"
        );
        Ok(FittedModel {
            target: request.formula.target.clone(),
            family,
            formula: request.formula.to_string(),
            backend: BACKEND_NAME.to_string(),
            controls: request.controls.clone(),
            payload,
        })
    }

    /// Pipe `script` into `Rscript -` and wait for it to exit.
    fn run(&self, script: &str) -> Result<(), BackendError> {
        let program = self.program.display().to_string();
        debug!(program = %program, "spawning R");
        let mut child = Command::new(&self.program)
            .arg("-")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| BackendError::Spawn {
                program: program.clone(),
                source,
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(script.as_bytes())
                .map_err(|source| BackendError::Spawn {
                    program: program.clone(),
                    source,
                })?;
        }

        let output = child
            .wait_with_output()
            .map_err(|source| BackendError::Spawn { program, source })?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        if !stdout.trim().is_empty() {
            debug!(output = %stdout.trim(), "R stdout");
        }
        if output.status.success() {
            Ok(())
        } else {
            Err(BackendError::ProcessFailed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })
        }
    }
}

impl ImputationBackend for RscriptBackend {
    fn name(&self) -> &'static str {
        BACKEND_NAME
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

    fn complete(&self, model: &FittedModel, m: usize) -> Result<Vec<DataFrame>, BackendError> {
        let workdir = workdir()?;
        let fit_path = workdir.path().join(FIT_FILE);
        fs::write(&fit_path, &model.payload).map_err(|source| BackendError::Io {
            path: fit_path.clone(),
            source,
        })?;

        let script = complete_script(&fit_path, workdir.path(), m, model.controls.seed);
        self.run(&script)?;

        let mut datasets = Vec::with_capacity(m);
        for index in 1..=m {
            let path = workdir.path().join(imputation_filename(index));
            if !path.exists() {
                return Err(BackendError::MissingOutput(path));
            }
            datasets.push(read_csv_frame(&path)?);
        }
        info!(column = %model.target, count = datasets.len(), "external completion finished");
        Ok(datasets)
    }
}

fn workdir() -> Result<TempDir, BackendError> {
    tempfile::Builder::new()
        .prefix("charls-jointai-")
        .tempdir()
        .map_err(|source| BackendError::Io {
            path: std::env::temp_dir(),
            source,
        })
}

fn read_output(path: &Path) -> Result<Vec<u8>, BackendError> {
    if !path.exists() {
        return Err(BackendError::MissingOutput(path.to_path_buf()));
    }
    fs::read(path).map_err(|source| BackendError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn imputation_filename(index: usize) -> String {
    format!("imputation_{index}.csv")
}

/// JointAI entry point for a model family.
pub fn jointai_call(family: ModelFamily) -> &'static str {
    match family {
        ModelFamily::LinearMixed => "lme_imp",
        ModelFamily::BinomialMixed => "glme_imp",
        ModelFamily::OrdinalMixed => "clmm_imp",
    }
}

/// R script fitting `request` with JointAI and saving the fit to `fit_path`.
pub fn fit_script(
    family: ModelFamily,
    request: &FitRequest<'_>,
    data_path: &Path,
    fit_path: &Path,
) -> String {
    let mut script = String::from("suppressPackageStartupMessages(library(JointAI))\n");
    script.push_str(&format!(
        "data <- read.csv({}, stringsAsFactors = FALSE, check.names = FALSE, na.strings = c(\"\", \"NA\"))\n",
        r_string(&data_path.to_string_lossy())
    ));
    script.push_str(&factor_lines(request.frame));
    script.push_str(&plan_line(request.controls));

    let mut arguments = vec![
        request.formula.to_string(),
        "data = data".to_string(),
    ];
    if family == ModelFamily::BinomialMixed {
        arguments.push("family = binomial()".to_string());
    }
    arguments.push(format!("n.chains = {}", request.controls.chains));
    arguments.push(format!("n.adapt = {}", request.controls.adapt_steps));
    arguments.push(format!("n.iter = {}", request.controls.draws));
    if let Some(seed) = request.controls.seed {
        arguments.push(format!("seed = {seed}"));
    }
    arguments.push("monitor_params = c(imps = TRUE)".to_string());
    script.push_str(&format!(
        "fit <- {}({})\n",
        jointai_call(family),
        arguments.join(", ")
    ));
    script.push_str(&format!(
        "saveRDS(fit, {})\n",
        r_string(&fit_path.to_string_lossy())
    ));
    script
}

/// R script drawing `m` completed datasets and writing one CSV per imputation.
pub fn complete_script(fit_path: &Path, out_dir: &Path, m: usize, seed: Option<u64>) -> String {
    let mut script = String::from("suppressPackageStartupMessages(library(JointAI))\n");
    script.push_str(&format!(
        "fit <- readRDS({})\n",
        r_string(&fit_path.to_string_lossy())
    ));
    let seed_arg = seed.map(|seed| format!(", seed = {seed}")).unwrap_or_default();
    script.push_str(&format!(
        "imps <- get_MIdat(fit, m = {m}, include = FALSE{seed_arg})\n"
    ));
    script.push_str(&format!(
        "for (i in seq_len({m})) {{\n  \
         d <- imps[imps$Imputation_ == i, , drop = FALSE]\n  \
         d$Imputation_ <- NULL\n  \
         write.csv(d, file.path({}, paste0(\"imputation_\", i, \".csv\")), row.names = FALSE, na = \"\")\n\
         }}\n",
        r_string(&out_dir.to_string_lossy())
    ));
    script
}

/// `factor()` conversions restoring the categorical kinds on the R side.
fn factor_lines(frame: &SurveyFrame) -> String {
    let mut lines = String::new();
    for (name, kind) in frame.kinds() {
        let column = format!("data[[{}]]", r_string(name));
        match kind {
            ColumnKind::Categorical => {
                lines.push_str(&format!("{column} <- factor({column})\n"));
            }
            ColumnKind::Ordered { levels } => {
                let levels: Vec<String> = levels.iter().map(|level| r_string(level)).collect();
                lines.push_str(&format!(
                    "{column} <- factor({column}, levels = c({}), ordered = TRUE)\n",
                    levels.join(", ")
                ));
            }
            ColumnKind::Numeric | ColumnKind::Text => {}
        }
    }
    lines
}

fn plan_line(controls: &McmcControls) -> String {
    match controls.workers {
        Some(workers) => format!("future::plan(future::multisession, workers = {workers})\n"),
        None => String::new(),
    }
}

/// Double-quoted R string literal.
fn r_string(value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{escaped}\"")
}
