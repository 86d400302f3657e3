//! Shared domain types: configuration and analysis outputs.
//!
//! Output types derive `Serialize` so they can be exported as JSON without a
//! separate DTO layer.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, AnalysisResult};

/// Column key of the stress index in the aligned dataset.
pub const STRESS_INDEX_KEY: &str = "VIX";
/// Column key of the Treasury yield (decimal) in the aligned dataset.
pub const TREASURY_YIELD_KEY: &str = "Treasury";
/// Column key of the long-duration Treasury ETF in the aligned dataset.
pub const LONG_TREASURY_KEY: &str = "TLT";

/// Credit-quality tier of a corporate bond ETF.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CreditClass {
    InvestmentGrade,
    HighYield,
}

impl CreditClass {
    pub const ALL: [CreditClass; 2] = [CreditClass::InvestmentGrade, CreditClass::HighYield];

    pub fn display_name(self) -> &'static str {
        match self {
            CreditClass::InvestmentGrade => "Investment Grade",
            CreditClass::HighYield => "High Yield",
        }
    }

    pub fn short_name(self) -> &'static str {
        match self {
            CreditClass::InvestmentGrade => "IG",
            CreditClass::HighYield => "HY",
        }
    }

    /// Name of the derived spread column.
    pub fn spread_column(self) -> &'static str {
        match self {
            CreditClass::InvestmentGrade => "IG_Spread",
            CreditClass::HighYield => "HY_Spread",
        }
    }

    pub fn default_ticker(self) -> &'static str {
        match self {
            CreditClass::InvestmentGrade => "LQD",
            CreditClass::HighYield => "HYG",
        }
    }

    /// Heuristic base yield (decimal). Not derived from any curve.
    pub fn default_base_yield(self) -> f64 {
        match self {
            CreditClass::InvestmentGrade => 0.04,
            CreditClass::HighYield => 0.06,
        }
    }

    /// Heuristic return-to-yield multiplier. Not derived from duration.
    pub fn default_sensitivity(self) -> f64 {
        match self {
            CreditClass::InvestmentGrade => 15.0,
            CreditClass::HighYield => 20.0,
        }
    }
}

/// A corporate bond ETF used as a credit proxy, with its calibration knobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreditInstrument {
    pub class: CreditClass,
    /// Column key in the dataset and the symbol requested from the provider.
    pub ticker: String,
    pub base_yield: f64,
    pub sensitivity: f64,
}

impl CreditInstrument {
    pub fn with_defaults(class: CreditClass) -> Self {
        Self {
            class,
            ticker: class.default_ticker().to_string(),
            base_yield: class.default_base_yield(),
            sensitivity: class.default_sensitivity(),
        }
    }
}

/// Where a raw series comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SeriesSource {
    /// Yahoo Finance chart symbol (daily closes).
    Yahoo(String),
    /// FRED series id (values in percent, converted to decimal).
    Fred(String),
}

/// A named series to fetch: `key` is the column name it lands under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesRequest {
    pub key: String,
    pub source: SeriesSource,
}

impl SeriesRequest {
    pub fn yahoo(key: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            source: SeriesSource::Yahoo(symbol.into()),
        }
    }

    pub fn fred(key: impl Into<String>, series_id: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            source: SeriesSource::Fred(series_id.into()),
        }
    }
}

/// Which spread-proxy strategy to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum EstimationMethod {
    /// Base yield minus smoothed ETF return momentum, less the Treasury yield.
    Yield,
    /// Smoothed return gap between a long Treasury ETF and the corporate ETF.
    Returns,
}

impl EstimationMethod {
    pub fn display_name(self) -> &'static str {
        match self {
            EstimationMethod::Yield => "yield-based",
            EstimationMethod::Returns => "returns-differential",
        }
    }
}

/// Market data backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    /// FRED (Treasury yields) + Yahoo Finance (ETF and VIX closes).
    Live,
    /// Seeded synthetic market, no network.
    Sample,
}

/// A full run's configuration as understood by the pipeline.
///
/// Derived from CLI flags (plus defaults).
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub method: EstimationMethod,
    pub source: DataSource,
    pub sample_seed: u64,

    /// Minimum number of common dates after alignment.
    pub min_common_dates: usize,
    /// Rolling window (rows) used to smooth returns.
    pub smoothing_window: usize,
    /// Rolling window (rows) for the spread/stress correlation.
    pub correlation_window: usize,
    /// Stress index level above which a day counts as high stress.
    pub stress_threshold: f64,

    pub instruments: Vec<CreditInstrument>,
    pub stress_index: SeriesRequest,
    pub treasury_yield: SeriesRequest,
    pub long_treasury: SeriesRequest,

    pub export_csv: Option<PathBuf>,
    pub export_json: Option<PathBuf>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            start_date: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap_or_default(),
            end_date: None,
            method: EstimationMethod::Yield,
            source: DataSource::Live,
            sample_seed: 42,
            min_common_dates: 100,
            smoothing_window: 20,
            correlation_window: 60,
            stress_threshold: 30.0,
            instruments: CreditClass::ALL
                .into_iter()
                .map(CreditInstrument::with_defaults)
                .collect(),
            stress_index: SeriesRequest::yahoo(STRESS_INDEX_KEY, "^VIX"),
            treasury_yield: SeriesRequest::fred(TREASURY_YIELD_KEY, "DGS10"),
            long_treasury: SeriesRequest::yahoo(LONG_TREASURY_KEY, "TLT"),
            export_csv: None,
            export_json: None,
        }
    }
}

impl AnalysisConfig {
    /// Reject settings no stage could run with.
    pub fn validate(&self) -> AnalysisResult<()> {
        if let Some(end) = self.end_date {
            if end <= self.start_date {
                return Err(AnalysisError::invalid(
                    "config",
                    format!("end date {end} must be after start date {}", self.start_date),
                ));
            }
        }
        if self.min_common_dates == 0 {
            return Err(AnalysisError::invalid("config", "min common dates must be > 0"));
        }
        if self.smoothing_window < 2 {
            return Err(AnalysisError::invalid("config", "smoothing window must be >= 2"));
        }
        if self.correlation_window < 3 {
            return Err(AnalysisError::invalid("config", "correlation window must be >= 3"));
        }
        if !self.stress_threshold.is_finite() {
            return Err(AnalysisError::invalid("config", "stress threshold must be finite"));
        }
        if self.instruments.is_empty() {
            return Err(AnalysisError::invalid("config", "no credit instruments configured"));
        }
        for inst in &self.instruments {
            if !(inst.base_yield.is_finite() && inst.sensitivity.is_finite()) {
                return Err(AnalysisError::invalid(
                    "config",
                    format!("non-finite calibration for {}", inst.ticker),
                ));
            }
        }
        Ok(())
    }

    /// Every series the configured method could use, stress index first.
    pub fn series_requests(&self) -> Vec<SeriesRequest> {
        let mut out = vec![self.stress_index.clone()];
        match self.method {
            EstimationMethod::Yield => out.push(self.treasury_yield.clone()),
            EstimationMethod::Returns => out.push(self.long_treasury.clone()),
        }
        for inst in &self.instruments {
            out.push(SeriesRequest::yahoo(inst.ticker.clone(), inst.ticker.clone()));
        }
        out
    }
}

/// Pearson correlation of one spread series against the stress index.
///
/// Both fields are NaN when the correlation is undefined for this input.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationResult {
    pub spread_name: String,
    pub coefficient: f64,
    pub p_value: f64,
    pub n: usize,
}

impl CorrelationResult {
    pub fn undefined(spread_name: impl Into<String>, n: usize) -> Self {
        Self {
            spread_name: spread_name.into(),
            coefficient: f64::NAN,
            p_value: f64::NAN,
            n,
        }
    }

    pub fn is_defined(&self) -> bool {
        self.coefficient.is_finite() && self.p_value.is_finite()
    }
}

/// Trailing-window correlation, one entry per date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RollingCorrelation {
    pub spread_name: String,
    pub window: usize,
    pub dates: Vec<NaiveDate>,
    pub values: Vec<Option<f64>>,
}

impl RollingCorrelation {
    pub fn defined_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_some()).count()
    }

    pub fn latest(&self) -> Option<(NaiveDate, f64)> {
        self.dates
            .iter()
            .zip(&self.values)
            .rev()
            .find_map(|(d, v)| v.map(|x| (*d, x)))
    }
}

/// Least-squares line `y = intercept + slope * x`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrendLine {
    pub slope: f64,
    pub intercept: f64,
}

impl TrendLine {
    pub fn predict(&self, x: f64) -> f64 {
        self.intercept + self.slope * x
    }
}

/// Spread level relative to its own history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Regime {
    Tight,
    Normal,
    Wide,
}

impl Regime {
    pub fn label(self) -> &'static str {
        match self {
            Regime::Tight => "tight",
            Regime::Normal => "normal",
            Regime::Wide => "wide",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct RegimeCounts {
    pub tight: usize,
    pub normal: usize,
    pub wide: usize,
}

impl RegimeCounts {
    pub fn total(&self) -> usize {
        self.tight + self.normal + self.wide
    }

    pub fn count(&self, regime: Regime) -> usize {
        match regime {
            Regime::Tight => self.tight,
            Regime::Normal => self.normal,
            Regime::Wide => self.wide,
        }
    }

    /// Share of observations in `regime` (0 for an empty summary).
    pub fn proportion(&self, regime: Regime) -> f64 {
        let total = self.total();
        if total == 0 {
            0.0
        } else {
            self.count(regime) as f64 / total as f64
        }
    }
}

/// Spread behaviour split by the stress index threshold.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StressSplit {
    pub threshold: f64,
    /// Observations with stress index strictly above the threshold.
    pub stress_count: usize,
    /// Observations at or below the threshold.
    pub normal_count: usize,
    pub stress_share: f64,
    pub stress_mean: Option<f64>,
    pub normal_mean: Option<f64>,
}

/// Regime classification of one spread series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegimeSummary {
    pub spread_name: String,
    pub p25: f64,
    pub p75: f64,
    #[serde(skip)]
    pub labels: Vec<Regime>,
    pub counts: RegimeCounts,
    pub stress: Option<StressSplit>,
}

/// Descriptive statistics of one spread series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpreadStats {
    pub spread_name: String,
    pub n: usize,
    pub mean: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    pub latest: f64,
}
