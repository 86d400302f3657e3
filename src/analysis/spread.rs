//! Credit-spread proxies derived from bond ETF prices.
//!
//! Two strategies share one trait so the pipeline can pick either at
//! configuration time:
//!
//! - [`YieldBasedEstimator`]: `base_yield - smoothed_return * sensitivity`
//!   is taken as the corporate yield; the Treasury yield is subtracted.
//! - [`ReturnsDifferentialEstimator`]: the smoothed daily return gap between a
//!   long Treasury ETF and the corporate ETF.
//!
//! Rolling convention: a window of `W` rows covers the `W - 1` daily returns
//! whose endpoints both fall inside it. Row `t` is defined from `t = W - 1`
//! on, so a series of `n` aligned rows yields `n - (W - 1)` spread points.
//! This averages one return fewer than a trailing mean over `W` returns
//! (which starts at row `W` and yields `n - W` points), so the two agree only
//! when returns are constant across the window.

use chrono::NaiveDate;

use crate::domain::{
    AlignedDataset, AnalysisConfig, CreditClass, CreditInstrument, EstimationMethod, SpreadSeries,
    LONG_TREASURY_KEY, TREASURY_YIELD_KEY,
};
use crate::error::{AnalysisError, AnalysisResult};
use crate::math::{pct_change, rolling_mean};

/// Decimal rate to basis points.
pub const BP_PER_UNIT: f64 = 10_000.0;

/// Turns aligned price/yield columns into a spread proxy (bp).
pub trait SpreadEstimator {
    /// Name of the produced spread column.
    fn name(&self) -> &str;

    fn class(&self) -> CreditClass;

    /// Dataset columns this estimator reads.
    fn required_columns(&self) -> Vec<&str>;

    /// Produce the spread series; rows without full window history are absent.
    fn estimate(&self, dataset: &AlignedDataset, window: usize) -> AnalysisResult<SpreadSeries>;
}

/// Corporate yield estimated from ETF return momentum, less Treasury yield.
#[derive(Debug, Clone)]
pub struct YieldBasedEstimator {
    pub class: CreditClass,
    pub price_column: String,
    pub treasury_column: String,
    pub base_yield: f64,
    pub sensitivity: f64,
}

impl YieldBasedEstimator {
    pub fn for_instrument(inst: &CreditInstrument) -> Self {
        Self {
            class: inst.class,
            price_column: inst.ticker.clone(),
            treasury_column: TREASURY_YIELD_KEY.to_string(),
            base_yield: inst.base_yield,
            sensitivity: inst.sensitivity,
        }
    }
}

impl SpreadEstimator for YieldBasedEstimator {
    fn name(&self) -> &str {
        self.class.spread_column()
    }

    fn class(&self) -> CreditClass {
        self.class
    }

    fn required_columns(&self) -> Vec<&str> {
        vec![self.price_column.as_str(), self.treasury_column.as_str()]
    }

    fn estimate(&self, dataset: &AlignedDataset, window: usize) -> AnalysisResult<SpreadSeries> {
        check_window(window)?;
        let prices = dataset.require(&self.price_column)?;
        let treasury = dataset.require(&self.treasury_column)?;

        let momentum = smoothed_returns(dataset.dates(), prices, window, &self.price_column)?;
        let values = momentum
            .iter()
            .zip(treasury)
            .map(|(m, ty)| {
                m.map(|m| {
                    let corp_yield = self.base_yield - m * self.sensitivity;
                    (corp_yield - ty) * BP_PER_UNIT
                })
            })
            .collect::<Vec<_>>();

        Ok(collect_defined(self.name(), self.class, dataset.dates(), &values))
    }
}

/// Smoothed Treasury-minus-corporate daily return gap.
#[derive(Debug, Clone)]
pub struct ReturnsDifferentialEstimator {
    pub class: CreditClass,
    pub corporate_column: String,
    pub treasury_column: String,
}

impl ReturnsDifferentialEstimator {
    pub fn for_instrument(inst: &CreditInstrument) -> Self {
        Self {
            class: inst.class,
            corporate_column: inst.ticker.clone(),
            treasury_column: LONG_TREASURY_KEY.to_string(),
        }
    }
}

impl SpreadEstimator for ReturnsDifferentialEstimator {
    fn name(&self) -> &str {
        self.class.spread_column()
    }

    fn class(&self) -> CreditClass {
        self.class
    }

    fn required_columns(&self) -> Vec<&str> {
        vec![self.treasury_column.as_str(), self.corporate_column.as_str()]
    }

    fn estimate(&self, dataset: &AlignedDataset, window: usize) -> AnalysisResult<SpreadSeries> {
        check_window(window)?;
        let dates = dataset.dates();
        let treasury = daily_returns(dates, dataset.require(&self.treasury_column)?, &self.treasury_column)?;
        let corporate = daily_returns(dates, dataset.require(&self.corporate_column)?, &self.corporate_column)?;

        let raw: Vec<Option<f64>> = treasury
            .iter()
            .zip(&corporate)
            .map(|(t, c)| Some((t.as_ref()? - c.as_ref()?) * BP_PER_UNIT))
            .collect();
        let smoothed = rolling_mean(&raw, window - 1);

        Ok(collect_defined(self.name(), self.class, dates, &smoothed))
    }
}

/// One estimator per configured instrument, for the chosen method.
pub fn build_estimators(config: &AnalysisConfig) -> Vec<Box<dyn SpreadEstimator>> {
    config
        .instruments
        .iter()
        .map(|inst| -> Box<dyn SpreadEstimator> {
            match config.method {
                EstimationMethod::Yield => Box::new(YieldBasedEstimator::for_instrument(inst)),
                EstimationMethod::Returns => Box::new(ReturnsDifferentialEstimator::for_instrument(inst)),
            }
        })
        .collect()
}

fn check_window(window: usize) -> AnalysisResult<()> {
    if window < 2 {
        return Err(AnalysisError::invalid(
            "spread estimation",
            format!("smoothing window must be >= 2, got {window}"),
        ));
    }
    Ok(())
}

/// Daily returns; only the first row may be undefined.
fn daily_returns(dates: &[NaiveDate], prices: &[f64], column: &str) -> AnalysisResult<Vec<Option<f64>>> {
    let returns = pct_change(prices);
    if let Some(idx) = returns.iter().skip(1).position(Option::is_none) {
        let date = dates[idx + 1];
        return Err(AnalysisError::invalid(
            format!("returns of {column}"),
            format!("undefined return on {date} (previous price {})", prices[idx]),
        ));
    }
    Ok(returns)
}

fn smoothed_returns(
    dates: &[NaiveDate],
    prices: &[f64],
    window: usize,
    column: &str,
) -> AnalysisResult<Vec<Option<f64>>> {
    let returns = daily_returns(dates, prices, column)?;
    Ok(rolling_mean(&returns, window - 1))
}

fn collect_defined(name: &str, class: CreditClass, dates: &[NaiveDate], values: &[Option<f64>]) -> SpreadSeries {
    let (dates, values_bp) = dates
        .iter()
        .zip(values)
        .filter_map(|(d, v)| v.map(|v| (*d, v)))
        .unzip();
    SpreadSeries {
        name: name.to_string(),
        class,
        dates,
        values_bp,
    }
}
