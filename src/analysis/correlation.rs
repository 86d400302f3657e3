//! Spread vs. stress-index correlation statistics.

use chrono::NaiveDate;

use crate::domain::{CorrelationResult, RollingCorrelation, TrendLine};
use crate::error::{AnalysisError, AnalysisResult};
use crate::math::{fit_line, students_t_two_tailed};

/// Minimum observations for a defined Pearson coefficient and p-value.
pub const MIN_OBSERVATIONS: usize = 3;

/// Relative variance floor below which a series counts as constant.
const VARIANCE_EPS: f64 = 1e-12;

/// Pearson correlation, its significance, and a rolling variant.
#[derive(Debug, Clone, Copy)]
pub struct CorrelationAnalyzer {
    rolling_window: usize,
}

impl Default for CorrelationAnalyzer {
    fn default() -> Self {
        Self::new(60)
    }
}

impl CorrelationAnalyzer {
    pub fn new(rolling_window: usize) -> Self {
        Self { rolling_window }
    }

    /// Correlate `spread` with `stress` over the full sample.
    pub fn correlate(&self, spread_name: &str, spread: &[f64], stress: &[f64]) -> AnalysisResult<CorrelationResult> {
        let context = format!("correlation of {spread_name}");
        let (r, p) = pearson_with_p_value(spread, stress).map_err(|reason| AnalysisError::invalid(context, reason))?;
        Ok(CorrelationResult {
            spread_name: spread_name.to_string(),
            coefficient: r,
            p_value: p,
            n: spread.len(),
        })
    }

    /// Trailing-window correlation; the first `window - 1` dates are `None`.
    ///
    /// A window where either side is constant is also `None`.
    pub fn rolling(
        &self,
        spread_name: &str,
        dates: &[NaiveDate],
        spread: &[f64],
        stress: &[f64],
    ) -> AnalysisResult<RollingCorrelation> {
        if dates.len() != spread.len() || spread.len() != stress.len() {
            return Err(AnalysisError::invalid(
                format!("rolling correlation of {spread_name}"),
                format!(
                    "length mismatch (dates={}, spread={}, stress={})",
                    dates.len(),
                    spread.len(),
                    stress.len()
                ),
            ));
        }
        let w = self.rolling_window;
        let mut values = vec![None; spread.len()];
        if w >= MIN_OBSERVATIONS && spread.len() >= w {
            for t in (w - 1)..spread.len() {
                let lo = t + 1 - w;
                values[t] = pearson(&spread[lo..=t], &stress[lo..=t]).ok();
            }
        }
        Ok(RollingCorrelation {
            spread_name: spread_name.to_string(),
            window: w,
            dates: dates.to_vec(),
            values,
        })
    }

    /// Least-squares trend of spread (y) on the stress index (x).
    pub fn trend_line(&self, spread_name: &str, spread: &[f64], stress: &[f64]) -> AnalysisResult<TrendLine> {
        let (intercept, slope) = fit_line(stress, spread).ok_or_else(|| {
            AnalysisError::invalid(format!("trend line of {spread_name}"), "least squares fit failed")
        })?;
        Ok(TrendLine { slope, intercept })
    }
}

/// Pearson coefficient; `Err` carries the reason it is undefined.
pub fn pearson(x: &[f64], y: &[f64]) -> Result<f64, String> {
    if x.len() != y.len() {
        return Err(format!("length mismatch ({} vs {})", x.len(), y.len()));
    }
    if x.len() < MIN_OBSERVATIONS {
        return Err(format!("need at least {MIN_OBSERVATIONS} observations, got {}", x.len()));
    }
    if x.iter().chain(y).any(|v| !v.is_finite()) {
        return Err("non-finite observation".to_string());
    }

    let n = x.len() as f64;
    let mean_x = x.iter().sum::<f64>() / n;
    let mean_y = y.iter().sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (xi, yi) in x.iter().zip(y) {
        let dx = xi - mean_x;
        let dy = yi - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if is_constant(var_x, mean_x, n) || is_constant(var_y, mean_y, n) {
        return Err("zero variance".to_string());
    }

    Ok((cov / (var_x * var_y).sqrt()).clamp(-1.0, 1.0))
}

/// Pearson coefficient and two-tailed p-value (t-test, n - 2 dof).
pub fn pearson_with_p_value(x: &[f64], y: &[f64]) -> Result<(f64, f64), String> {
    let r = pearson(x, y)?;
    let df = (x.len() - 2) as f64;
    let denom = 1.0 - r * r;
    let p = if denom <= 0.0 {
        0.0
    } else {
        let t = r * (df / denom).sqrt();
        students_t_two_tailed(t, df).ok_or_else(|| "p-value undefined".to_string())?
    };
    Ok((r, p))
}

fn is_constant(sum_sq_dev: f64, mean: f64, n: f64) -> bool {
    let scale = mean.abs().max(1.0);
    sum_sq_dev / n <= VARIANCE_EPS * scale * scale
}
