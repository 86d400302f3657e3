//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - initializes logging
//! - parses CLI arguments
//! - picks a market data provider (live or synthetic)
//! - runs the analysis pipeline
//! - prints reports and writes optional exports

use clap::Parser;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use crate::cli::{AnalyzeArgs, Command};
use crate::data::{LiveProvider, MarketDataProvider, SampleProvider};
use crate::domain::{AnalysisConfig, CreditClass, CreditInstrument, DataSource};
use crate::error::AppError;

pub mod pipeline;

/// Entry point for the `spread` binary.
pub fn run() -> Result<(), AppError> {
    init_tracing();

    // `spread` and `spread --source sample` behave like `spread analyze ...`.
    // Clap requires a subcommand name, so argv is rewritten before parsing.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    match cli.command {
        Command::Analyze(args) => handle_analyze(args, OutputMode::Full),
        Command::Regimes(args) => handle_analyze(args, OutputMode::RegimesOnly),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputMode {
    Full,
    RegimesOnly,
}

fn init_tracing() {
    // Logs go to stderr so stdout stays clean for the report.
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "spread_stress=info".into()))
        .try_init();
}

fn handle_analyze(args: AnalyzeArgs, mode: OutputMode) -> Result<(), AppError> {
    let config = config_from_args(&args);
    let provider = provider_for(&config);

    let pipeline = pipeline::Pipeline::new(config.clone()).map_err(|e| AppError::new(2, e.to_string()))?;
    let output = pipeline.run(provider.as_ref())?;

    match mode {
        OutputMode::Full => {
            println!("{}", crate::report::format_summary(&output));
            println!("{}", crate::report::format_regimes(&output));
        }
        OutputMode::RegimesOnly => {
            println!("{}", crate::report::format_regimes(&output));
        }
    }

    // Optional exports.
    if let Some(path) = &config.export_csv {
        crate::io::write_dataset_csv(path, &output.frame)?;
        tracing::info!(path = %path.display(), "wrote dataset CSV");
    }
    if let Some(path) = &config.export_json {
        crate::io::write_summary_json(path, &output)?;
        tracing::info!(path = %path.display(), "wrote summary JSON");
    }

    Ok(())
}

fn provider_for(config: &AnalysisConfig) -> Box<dyn MarketDataProvider> {
    match config.source {
        DataSource::Live => Box::new(LiveProvider::from_env()),
        DataSource::Sample => Box::new(SampleProvider::new(config.sample_seed)),
    }
}

pub fn config_from_args(args: &AnalyzeArgs) -> AnalysisConfig {
    let instruments = vec![
        CreditInstrument {
            base_yield: args.ig_base_yield,
            sensitivity: args.ig_sensitivity,
            ..CreditInstrument::with_defaults(CreditClass::InvestmentGrade)
        },
        CreditInstrument {
            base_yield: args.hy_base_yield,
            sensitivity: args.hy_sensitivity,
            ..CreditInstrument::with_defaults(CreditClass::HighYield)
        },
    ];

    AnalysisConfig {
        start_date: args.start,
        end_date: args.end,
        method: args.method,
        source: args.source,
        sample_seed: args.seed,
        min_common_dates: args.min_common_dates,
        smoothing_window: args.smoothing_window,
        correlation_window: args.correlation_window,
        stress_threshold: args.stress_threshold,
        instruments,
        export_csv: args.export_csv.clone(),
        export_json: args.export_json.clone(),
        ..AnalysisConfig::default()
    }
}

/// Rewrite argv so `spread` defaults to `spread analyze`.
///
/// Rules:
/// - `spread`                      -> `spread analyze`
/// - `spread --source sample ...`  -> `spread analyze --source sample ...`
/// - `spread --help/--version/-h`  -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("analyze".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(arg1.as_str(), "-h" | "--help" | "-V" | "--version" | "help");
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "analyze" | "regimes");
    if is_subcommand {
        return argv;
    }

    // If the first token is a flag, treat it as "analyze flags".
    if arg1.starts_with('-') {
        argv.insert(1, "analyze".to_string());
        return argv;
    }

    // Otherwise, leave as-is.
    argv
}
