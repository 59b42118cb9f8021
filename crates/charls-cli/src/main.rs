//! CHARLS imputation CLI.

use std::io::{self, IsTerminal};

use anyhow::Context;
use clap::{ColorChoice, Parser};
use charls_cli::logging::{LogConfig, LogFormat, init_logging};
use tracing::level_filters::LevelFilter;

use charls_impute::RscriptBackend;
use charls_model::Settings;

mod cli;
mod commands;
mod summary;
mod types;

use crate::cli::{Cli, Command, LogFormatArg, LogLevelArg};
use crate::commands::{run_analyze, run_init, run_pipeline, run_vocabulary};
use crate::summary::{print_analysis, print_init, print_run_summary};

fn main() {
    let cli = Cli::parse();
    cli.color.write_global();
    let log_config = log_config_from_cli(&cli);
    if let Err(error) = init_logging(&log_config) {
        eprintln!("error: failed to initialize logging: {error}");
        std::process::exit(1);
    }
    let exit_code = match dispatch(&cli) {
        Ok(code) => code,
        Err(error) => {
            eprintln!("error: {error:#}");
            1
        }
    };
    std::process::exit(exit_code);
}

fn dispatch(cli: &Cli) -> anyhow::Result<i32> {
    if let Command::Init(args) = &cli.command {
        print_init(&run_init(args)?);
        return Ok(0);
    }

    let settings = Settings::resolve(cli.config.as_deref()).context("load configuration")?;
    match &cli.command {
        Command::Run(args) => {
            let backend = RscriptBackend::new().with_program(&args.rscript);
            let result = run_pipeline(args, &settings, &backend)?;
            print_run_summary(&result);
            Ok(if result.has_errors { 1 } else { 0 })
        }
        Command::Analyze(args) => {
            let result = run_analyze(args, &settings)?;
            if args.json {
                let report = serde_json::json!({
                    "summary": result.summary,
                    "classification": result.classification,
                    "missing": result.missing,
                });
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_analysis(&result);
            }
            Ok(0)
        }
        Command::Vocabulary => {
            run_vocabulary(&settings)?;
            Ok(0)
        }
        Command::Init(_) => Ok(0),
    }
}

/// Build logging configuration from CLI flags with consistent precedence.
fn log_config_from_cli(cli: &Cli) -> LogConfig {
    let mut config = LogConfig {
        level_filter: cli.verbosity.tracing_level_filter(),
        ..LogConfig::default()
    };
    config.use_env_filter = !(cli.verbosity.is_present() || cli.log_level.is_some());
    if let Some(level) = cli.log_level {
        config.level_filter = match level {
            LogLevelArg::Error => LevelFilter::ERROR,
            LogLevelArg::Warn => LevelFilter::WARN,
            LogLevelArg::Info => LevelFilter::INFO,
            LogLevelArg::Debug => LevelFilter::DEBUG,
            LogLevelArg::Trace => LevelFilter::TRACE,
        };
    }
    config.format = match cli.log_format {
        LogFormatArg::Pretty => LogFormat::Pretty,
        LogFormatArg::Compact => LogFormat::Compact,
        LogFormatArg::Json => LogFormat::Json,
    };
    config.log_file = cli.log_file.clone();
    config.with_ansi = match cli.color.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => cli.log_file.is_none() && io::stderr().is_terminal(),
    };
    config
}
