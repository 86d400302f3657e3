//! Descriptive statistics and rolling-window helpers.
//!
//! Missing observations are modelled as `Option<f64>` and propagate: any
//! window touching a `None` yields `None`.

use statrs::distribution::{ContinuousCDF, StudentsT};

/// Arithmetic mean (None for empty input).
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation with an `n - 1` denominator.
pub fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let n = values.len() as f64;
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (n - 1.0);
    Some(var.sqrt())
}

/// Simple daily percentage change: `x[t] / x[t-1] - 1`.
///
/// The first entry is always `None`. A zero or non-finite previous value also
/// gives `None`.
pub fn pct_change(values: &[f64]) -> Vec<Option<f64>> {
    let mut out = Vec::with_capacity(values.len());
    if values.is_empty() {
        return out;
    }
    out.push(None);
    for w in values.windows(2) {
        let (prev, curr) = (w[0], w[1]);
        if prev != 0.0 && prev.is_finite() && curr.is_finite() {
            out.push(Some(curr / prev - 1.0));
        } else {
            out.push(None);
        }
    }
    out
}

/// Trailing mean over `window` entries.
///
/// Entry `t` is defined only when entries `t+1-window ..= t` are all defined.
pub fn rolling_mean(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    if window == 0 || values.len() < window {
        return out;
    }
    for t in (window - 1)..values.len() {
        let slice = &values[t + 1 - window..=t];
        let mut sum = 0.0;
        let mut complete = true;
        for v in slice {
            match v {
                Some(x) => sum += x,
                None => {
                    complete = false;
                    break;
                }
            }
        }
        if complete {
            out[t] = Some(sum / window as f64);
        }
    }
    out
}

/// Empirical quantile with linear interpolation between order statistics.
///
/// Uses position `q * (n - 1)` on the sorted sample.
pub fn quantile(values: &[f64], q: f64) -> Option<f64> {
    if values.is_empty() || !(0.0..=1.0).contains(&q) {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

/// Two-tailed p-value of a Student-t statistic with `df` degrees of freedom.
pub fn students_t_two_tailed(t: f64, df: f64) -> Option<f64> {
    if t.is_infinite() {
        return Some(0.0);
    }
    if !t.is_finite() || !(df > 0.0) {
        return None;
    }
    let dist = StudentsT::new(0.0, 1.0, df).ok()?;
    Some((2.0 * dist.sf(t.abs())).clamp(0.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn std_matches_hand_computation() {
        // mean 5, squared deviations sum to 32, n-1 = 7
        let xs = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_relative_eq!(sample_std(&xs).unwrap(), (32.0f64 / 7.0).sqrt(), epsilon = 1e-12);
        assert!(sample_std(&[1.0]).is_none());
    }

    #[test]
    fn pct_change_leaves_first_and_zero_base_missing() {
        let r = pct_change(&[100.0, 110.0, 0.0, 5.0]);
        assert_eq!(r[0], None);
        assert_relative_eq!(r[1].unwrap(), 0.1, epsilon = 1e-12);
        assert_relative_eq!(r[2].unwrap(), -1.0, epsilon = 1e-12);
        assert_eq!(r[3], None);
    }

    #[test]
    fn rolling_mean_needs_full_window() {
        let xs = [None, Some(1.0), Some(2.0), Some(3.0), None, Some(5.0)];
        let out = rolling_mean(&xs, 2);
        assert_eq!(out, vec![None, None, Some(1.5), Some(2.5), None, None]);
    }

    #[test]
    fn quantile_interpolates_linearly() {
        let xs: Vec<f64> = (1..=100).map(f64::from).collect();
        assert_relative_eq!(quantile(&xs, 0.25).unwrap(), 25.75, epsilon = 1e-12);
        assert_relative_eq!(quantile(&xs, 0.75).unwrap(), 75.25, epsilon = 1e-12);
        assert_relative_eq!(quantile(&[3.0, 1.0, 2.0], 0.5).unwrap(), 2.0);
        assert!(quantile(&[], 0.5).is_none());
    }

    #[test]
    fn t_test_p_value_is_symmetric_and_bounded() {
        let p = students_t_two_tailed(2.0, 10.0).unwrap();
        assert_relative_eq!(p, students_t_two_tailed(-2.0, 10.0).unwrap());
        // Reference value: 2 * (1 - T_10(2.0)) ~= 0.0734
        assert!((p - 0.0734).abs() < 1e-3, "p = {p}");
        assert_eq!(students_t_two_tailed(f64::INFINITY, 5.0), Some(0.0));
        assert_relative_eq!(students_t_two_tailed(0.0, 5.0).unwrap(), 1.0, epsilon = 1e-12);
    }
}
