//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

use charls_impute::DEFAULT_RSCRIPT;

#[derive(Parser)]
#[command(
    name = "charls-cli",
    version,
    about = "CHARLS multiple imputation - classify, analyze, and impute longitudinal survey data",
    long_about = "Drive the CHARLS multiple-imputation workflow.\n\n\
                  Loads a survey CSV, tags variables from the domain vocabulary, summarizes\n\
                  missing data, fits a Bayesian mixed model through JointAI (via Rscript),\n\
                  and writes the imputed datasets and fitted models."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Configuration file (default: $CHARLS_CONFIG, else built-in defaults).
    #[arg(long = "config", value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the full pipeline: load, classify, analyze, fit, generate, persist.
    Run(RunArgs),

    /// Load and classify a table, then report its missing data.
    Analyze(AnalyzeArgs),

    /// Create the project layout and a default charls.toml.
    Init(InitArgs),

    /// Print the variable vocabulary in effect.
    Vocabulary,
}

#[derive(Parser)]
pub struct RunArgs {
    /// Survey CSV file.
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Output root for imputed/ and models/ (default: paths.output from the config).
    #[arg(long = "output-dir", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Column to impute (default: first preferred target with missing values).
    #[arg(long = "target", value_name = "COLUMN")]
    pub target: Option<String>,

    /// Number of imputed datasets to draw.
    #[arg(short = 'm', long = "imputations", default_value_t = 5)]
    pub imputations: usize,

    /// MCMC chains (overrides the config).
    #[arg(long = "chains")]
    pub chains: Option<usize>,

    /// Adaptation iterations per chain (overrides the config).
    #[arg(long = "adapt")]
    pub adapt: Option<usize>,

    /// Sampling iterations per chain (overrides the config).
    #[arg(long = "draws")]
    pub draws: Option<usize>,

    /// Sampler seed (overrides the config).
    #[arg(long = "seed")]
    pub seed: Option<u64>,

    /// Worker hint passed to the external routine (overrides the config).
    #[arg(long = "workers")]
    pub workers: Option<usize>,

    /// Rscript executable used to run JointAI.
    #[arg(long = "rscript", value_name = "PATH", default_value = DEFAULT_RSCRIPT)]
    pub rscript: PathBuf,
}

#[derive(Parser)]
pub struct AnalyzeArgs {
    /// Survey CSV file.
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Print the report as JSON instead of tables.
    #[arg(long = "json")]
    pub json: bool,
}

#[derive(Parser)]
pub struct InitArgs {
    /// Project root.
    #[arg(value_name = "DIR", default_value = ".")]
    pub dir: PathBuf,

    /// Overwrite an existing charls.toml.
    #[arg(long = "force")]
    pub force: bool,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
