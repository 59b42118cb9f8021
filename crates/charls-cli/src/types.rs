use std::path::PathBuf;

use charls_impute::{FitOutcome, GenerateOutcome, PersistReport, PipelineSummary};
use charls_model::{Classification, MissingDataSummary};

#[derive(Debug)]
pub struct RunResult {
    pub input: PathBuf,
    pub output_dir: PathBuf,
    pub classification: Option<Classification>,
    pub missing: Option<MissingDataSummary>,
    pub fit: FitOutcome,
    pub generate: Option<GenerateOutcome>,
    pub persisted: Option<PersistReport>,
    pub summary: PipelineSummary,
    pub has_errors: bool,
}

#[derive(Debug)]
pub struct AnalyzeResult {
    pub input: PathBuf,
    pub classification: Classification,
    pub missing: MissingDataSummary,
    pub summary: PipelineSummary,
}
