//! Tight / normal / wide regime classification.
//!
//! Thresholds are the 25th and 75th percentiles of the whole series, computed
//! once. Boundaries are inclusive: `v <= p25` is tight and `v >= p75` is wide.
//! When both hold (a flat series) the observation is tight.

use crate::domain::{Regime, RegimeCounts, RegimeSummary, StressSplit};
use crate::error::{AnalysisError, AnalysisResult};
use crate::math::{mean, quantile};

#[derive(Debug, Clone, Copy, Default)]
pub struct RegimeClassifier {
    stress_threshold: Option<f64>,
}

impl RegimeClassifier {
    pub fn new(stress_threshold: Option<f64>) -> Self {
        Self { stress_threshold }
    }

    /// Classify `spread`; `stress` (same rows) feeds the conditional split.
    pub fn classify(&self, spread_name: &str, spread: &[f64], stress: Option<&[f64]>) -> AnalysisResult<RegimeSummary> {
        let context = format!("regimes of {spread_name}");
        let (Some(p25), Some(p75)) = (quantile(spread, 0.25), quantile(spread, 0.75)) else {
            return Err(AnalysisError::invalid(context, "empty series"));
        };

        let labels: Vec<Regime> = spread.iter().map(|&v| label(v, p25, p75)).collect();
        let mut counts = RegimeCounts::default();
        for l in &labels {
            match l {
                Regime::Tight => counts.tight += 1,
                Regime::Normal => counts.normal += 1,
                Regime::Wide => counts.wide += 1,
            }
        }

        let stress = match (self.stress_threshold, stress) {
            (Some(threshold), Some(levels)) => Some(stress_split(&context, spread, levels, threshold)?),
            _ => None,
        };

        Ok(RegimeSummary {
            spread_name: spread_name.to_string(),
            p25,
            p75,
            labels,
            counts,
            stress,
        })
    }
}

fn label(value: f64, p25: f64, p75: f64) -> Regime {
    if value <= p25 {
        Regime::Tight
    } else if value >= p75 {
        Regime::Wide
    } else {
        Regime::Normal
    }
}

/// Mean spread with the stress index above vs. at/below `threshold`.
pub fn stress_split(context: &str, spread: &[f64], stress: &[f64], threshold: f64) -> AnalysisResult<StressSplit> {
    if spread.len() != stress.len() {
        return Err(AnalysisError::invalid(
            context,
            format!("stress index has {} rows, spread has {}", stress.len(), spread.len()),
        ));
    }

    let (high, low): (Vec<(f64, f64)>, Vec<(f64, f64)>) = spread
        .iter()
        .copied()
        .zip(stress.iter().copied())
        .partition(|(_, s)| *s > threshold);
    let high: Vec<f64> = high.into_iter().map(|(v, _)| v).collect();
    let low: Vec<f64> = low.into_iter().map(|(v, _)| v).collect();

    let total = spread.len();
    Ok(StressSplit {
        threshold,
        stress_count: high.len(),
        normal_count: low.len(),
        stress_share: if total == 0 { 0.0 } else { high.len() as f64 / total as f64 },
        stress_mean: mean(&high),
        normal_mean: mean(&low),
    })
}
