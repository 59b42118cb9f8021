use std::time::Instant;

use anyhow::{Context, Result, anyhow};
use tracing::{info, info_span};

use charls_impute::{ImputationBackend, PipelineState};
use charls_model::{McmcControls, Settings};

use crate::cli::{AnalyzeArgs, InitArgs, RunArgs};
use crate::summary::print_vocabulary;
use crate::types::{AnalyzeResult, RunResult};
use charls_cli::scaffold::{InitReport, init_project};

pub fn run_init(args: &InitArgs) -> Result<InitReport> {
    init_project(&args.dir, args.force)
        .with_context(|| format!("initialize {}", args.dir.display()))
}

pub fn run_vocabulary(settings: &Settings) -> Result<()> {
    print_vocabulary(&settings.vocabulary);
    Ok(())
}

/// Load, classify, and analyze `input`.
fn prepare(input: &std::path::Path, settings: &Settings) -> Result<PipelineState> {
    let state = info_span!("load", input = %input.display())
        .in_scope(|| PipelineState::new().load(input, settings))
        .with_context(|| format!("load {}", input.display()))?;
    let state = info_span!("classify")
        .in_scope(|| state.classify(settings))
        .context("classify variables")?;
    info_span!("analyze")
        .in_scope(|| state.analyze())
        .context("analyze missing data")
}

pub fn run_analyze(args: &AnalyzeArgs, settings: &Settings) -> Result<AnalyzeResult> {
    let span = info_span!("analyze_command", input = %args.input.display());
    let _guard = span.enter();
    let state = prepare(&args.input, settings)?;
    let summary = state.summarize(settings);
    let classification = state
        .classification
        .ok_or_else(|| anyhow!("classification missing after classify stage"))?;
    let missing = state
        .missing
        .ok_or_else(|| anyhow!("missing-data summary missing after analyze stage"))?;
    Ok(AnalyzeResult {
        input: args.input.clone(),
        classification,
        missing,
        summary,
    })
}

pub fn run_pipeline(
    args: &RunArgs,
    settings: &Settings,
    backend: &dyn ImputationBackend,
) -> Result<RunResult> {
    let span = info_span!("run", input = %args.input.display());
    let _guard = span.enter();
    let start = Instant::now();
    let controls = mcmc_controls(args, &settings.mcmc);
    controls.validate().context("validate MCMC controls")?;
    let output_dir = args
        .output_dir
        .clone()
        .unwrap_or_else(|| settings.paths.output.clone());

    let state = prepare(&args.input, settings)?;

    let (state, fit) = info_span!("fit")
        .in_scope(|| state.fit(backend, settings, args.target.as_deref(), &controls))
        .context("fit imputation model")?;

    let mut generate = None;
    let mut persisted = None;
    let mut state = state;
    if fit.is_success() {
        let (next, outcome) = info_span!("generate", m = args.imputations)
            .in_scope(|| state.generate(backend, args.imputations))
            .context("generate imputed datasets")?;
        state = next;
        if outcome.is_success() {
            let (next, report) = info_span!("persist", output_dir = %output_dir.display())
                .in_scope(|| state.persist(&output_dir))
                .with_context(|| format!("write results to {}", output_dir.display()))?;
            state = next;
            persisted = Some(report);
        }
        generate = Some(outcome);
    }

    let has_errors = persisted.is_none();
    info!(
        stage = %state.stage,
        has_errors,
        duration_ms = start.elapsed().as_millis(),
        "run complete"
    );
    Ok(RunResult {
        input: args.input.clone(),
        output_dir,
        summary: state.summarize(settings),
        classification: state.classification,
        missing: state.missing,
        fit,
        generate,
        persisted,
        has_errors,
    })
}

/// Config controls with the command-line overrides applied.
fn mcmc_controls(args: &RunArgs, base: &McmcControls) -> McmcControls {
    McmcControls {
        chains: args.chains.unwrap_or(base.chains),
        adapt_steps: args.adapt.unwrap_or(base.adapt_steps),
        draws: args.draws.unwrap_or(base.draws),
        seed: args.seed.or(base.seed),
        workers: args.workers.or(base.workers),
    }
}
