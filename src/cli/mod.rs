//! Command-line parsing for the credit-spread stress analyzer.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the analysis code.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use crate::domain::{DataSource, EstimationMethod};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "spread",
    version,
    about = "Credit-spread proxies from bond ETFs vs. market stress (VIX)"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Estimate spreads, correlate with the stress index, print the full summary.
    Analyze(AnalyzeArgs),
    /// Print only the regime tables (tight/normal/wide and stress split).
    Regimes(AnalyzeArgs),
}

/// Options shared by every analysis command.
#[derive(Debug, Parser, Clone)]
pub struct AnalyzeArgs {
    /// First date to fetch (YYYY-MM-DD).
    #[arg(long, default_value = "2020-01-01")]
    pub start: NaiveDate,

    /// Last date to fetch (YYYY-MM-DD). Defaults to today.
    #[arg(long)]
    pub end: Option<NaiveDate>,

    /// Spread estimation method.
    #[arg(short = 'm', long, value_enum, default_value_t = EstimationMethod::Yield)]
    pub method: EstimationMethod,

    /// Where market data comes from.
    #[arg(short = 's', long, value_enum, default_value_t = DataSource::Live)]
    pub source: DataSource,

    /// Random seed for the synthetic market (`--source sample`).
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Minimum number of common dates required after alignment.
    #[arg(long, default_value_t = 100)]
    pub min_common_dates: usize,

    /// Rolling window (trading days) used to smooth ETF returns.
    #[arg(long, default_value_t = 20)]
    pub smoothing_window: usize,

    /// Rolling window (trading days) for the spread/VIX correlation.
    #[arg(long, default_value_t = 60)]
    pub correlation_window: usize,

    /// VIX level above which a day counts as high stress.
    #[arg(long, default_value_t = 30.0)]
    pub stress_threshold: f64,

    /// Assumed base yield of the investment-grade ETF (decimal).
    #[arg(long, default_value_t = 0.04)]
    pub ig_base_yield: f64,

    /// Return-to-yield multiplier for the investment-grade ETF.
    #[arg(long, default_value_t = 15.0)]
    pub ig_sensitivity: f64,

    /// Assumed base yield of the high-yield ETF (decimal).
    #[arg(long, default_value_t = 0.06)]
    pub hy_base_yield: f64,

    /// Return-to-yield multiplier for the high-yield ETF.
    #[arg(long, default_value_t = 20.0)]
    pub hy_sensitivity: f64,

    /// Export the aligned dataset plus spread columns to CSV.
    #[arg(long, value_name = "CSV")]
    pub export_csv: Option<PathBuf>,

    /// Export the analysis summary to JSON.
    #[arg(long, value_name = "JSON")]
    pub export_json: Option<PathBuf>,
}
