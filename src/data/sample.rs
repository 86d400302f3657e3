//! Seeded synthetic market: VIX, a 10y Treasury yield, and bond ETF prices.
//!
//! The generator links every series to a common stress driver so the
//! analysis has something real to find:
//!
//! - VIX follows a mean-reverting log process with rare upward jumps.
//! - The Treasury yield random-walks around 3% (decimal), with occasional
//!   missing prints, like FRED's holiday placeholders.
//! - ETF returns load on yield changes (duration) and, for the corporate
//!   ETFs, negatively on VIX log-changes (credit beta; larger for HY).

use std::collections::BTreeMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::data::MarketDataProvider;
use crate::domain::{LONG_TREASURY_KEY, STRESS_INDEX_KEY, SeriesRequest, TREASURY_YIELD_KEY, TimeSeries};
use crate::error::{AnalysisError, AnalysisResult};

const VIX_LONG_RUN: f64 = 18.0;
const VIX_REVERSION: f64 = 0.05;
const VIX_VOL: f64 = 0.07;
const VIX_JUMP_PROB: f64 = 0.01;
const VIX_JUMP_SIZE: f64 = 0.45;

const YIELD_LONG_RUN: f64 = 0.03;
const YIELD_REVERSION: f64 = 0.01;
const YIELD_VOL: f64 = 0.0006;
const YIELD_MISSING_PROB: f64 = 0.02;

/// Default span when no end date is given.
const DEFAULT_SPAN_DAYS: i64 = 3 * 365;

/// Per-ETF return model: `r = -duration * dy + credit_beta * dlnvix + idio * z`.
struct EtfModel {
    key: &'static str,
    start_price: f64,
    duration: f64,
    credit_beta: f64,
    idio_vol: f64,
}

const ETFS: [EtfModel; 3] = [
    EtfModel {
        key: LONG_TREASURY_KEY,
        start_price: 140.0,
        duration: 17.0,
        credit_beta: 0.0,
        idio_vol: 0.0015,
    },
    EtfModel {
        key: "LQD",
        start_price: 130.0,
        duration: 8.5,
        credit_beta: -0.006,
        idio_vol: 0.0015,
    },
    EtfModel {
        key: "HYG",
        start_price: 85.0,
        duration: 3.5,
        credit_beta: -0.02,
        idio_vol: 0.0025,
    },
];

/// Offline provider backed by the synthetic market.
#[derive(Debug, Clone)]
pub struct SampleProvider {
    seed: u64,
    unavailable: Vec<String>,
}

impl SampleProvider {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            unavailable: Vec::new(),
        }
    }

    /// Make `key` fail to fetch (simulates a provider outage for one series).
    pub fn without(mut self, key: impl Into<String>) -> Self {
        self.unavailable.push(key.into());
        self
    }
}

impl MarketDataProvider for SampleProvider {
    fn name(&self) -> &str {
        "sample"
    }

    fn fetch(&self, request: &SeriesRequest, start: NaiveDate, end: Option<NaiveDate>) -> AnalysisResult<TimeSeries> {
        if self.unavailable.iter().any(|k| *k == request.key) {
            return Err(AnalysisError::fetch(&request.key, "series unavailable from sample provider"));
        }
        let end = end.unwrap_or(start + Duration::days(DEFAULT_SPAN_DAYS));
        let mut market = generate_market(start, end, self.seed)?;
        market
            .remove(&request.key)
            .ok_or_else(|| AnalysisError::fetch(&request.key, "unknown synthetic series"))
    }
}

/// Generate every synthetic series over weekdays in `[start, end]`.
pub fn generate_market(start: NaiveDate, end: NaiveDate, seed: u64) -> AnalysisResult<BTreeMap<String, TimeSeries>> {
    if end < start {
        return Err(AnalysisError::invalid(
            "synthetic market",
            format!("end {end} precedes start {start}"),
        ));
    }

    let mut rng = StdRng::seed_from_u64(market_seed(start, seed));
    let normal = Normal::new(0.0, 1.0).map_err(|e| AnalysisError::invalid("synthetic market", e.to_string()))?;

    let dates = weekdays(start, end);
    let n = dates.len();

    let mut vix = Vec::with_capacity(n);
    let mut treasury = Vec::with_capacity(n);
    let mut prices: Vec<Vec<Option<f64>>> = ETFS.iter().map(|_| Vec::with_capacity(n)).collect();

    let mut ln_vix = VIX_LONG_RUN.ln();
    let mut yld = YIELD_LONG_RUN;
    let mut px: Vec<f64> = ETFS.iter().map(|e| e.start_price).collect();

    for i in 0..n {
        if i > 0 {
            let jump = if rng.gen_bool(VIX_JUMP_PROB) { VIX_JUMP_SIZE } else { 0.0 };
            let d_ln_vix = VIX_REVERSION * (VIX_LONG_RUN.ln() - ln_vix) + VIX_VOL * normal.sample(&mut rng) + jump;
            ln_vix += d_ln_vix;

            let dy = YIELD_REVERSION * (YIELD_LONG_RUN - yld) + YIELD_VOL * normal.sample(&mut rng);
            yld = (yld + dy).max(0.001);

            for (p, model) in px.iter_mut().zip(ETFS.iter()) {
                let r = -model.duration * dy + model.credit_beta * d_ln_vix + model.idio_vol * normal.sample(&mut rng);
                *p *= 1.0 + r;
            }
        }

        vix.push(Some(ln_vix.exp()));
        let missing = rng.gen_bool(YIELD_MISSING_PROB);
        treasury.push(if missing { None } else { Some(yld) });
        for (col, p) in prices.iter_mut().zip(&px) {
            col.push(Some(*p));
        }
    }

    let zip = |values: Vec<Option<f64>>| TimeSeries::new(dates.iter().copied().zip(values).collect());

    let mut out = BTreeMap::new();
    out.insert(STRESS_INDEX_KEY.to_string(), zip(vix)?);
    out.insert(TREASURY_YIELD_KEY.to_string(), zip(treasury)?);
    for (model, values) in ETFS.iter().zip(prices) {
        out.insert(model.key.to_string(), zip(values)?);
    }
    Ok(out)
}

fn weekdays(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    start
        .iter_days()
        .take_while(|d| *d <= end)
        .filter(|d| !matches!(d.weekday(), Weekday::Sat | Weekday::Sun))
        .collect()
}

fn market_seed(start: NaiveDate, seed: u64) -> u64 {
    let mut hasher = DefaultHasher::new();
    start.hash(&mut hasher);
    seed.hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn market_is_deterministic_per_seed() {
        let a = generate_market(ymd(2021, 1, 1), ymd(2021, 12, 31), 7).unwrap();
        let b = generate_market(ymd(2021, 1, 1), ymd(2021, 12, 31), 7).unwrap();
        let c = generate_market(ymd(2021, 1, 1), ymd(2021, 12, 31), 8).unwrap();
        assert_eq!(a, b);
        assert_ne!(a["VIX"], c["VIX"]);
    }

    #[test]
    fn market_skips_weekends_and_has_all_series() {
        let m = generate_market(ymd(2024, 1, 1), ymd(2024, 1, 14), 1).unwrap();
        assert_eq!(
            m.keys().map(String::as_str).collect::<Vec<_>>(),
            vec!["HYG", "LQD", "TLT", "Treasury", "VIX"]
        );
        // Two full weeks, Monday start.
        assert_eq!(m["VIX"].len(), 10);
        assert!(m["VIX"].dates().all(|d| d.weekday().number_from_monday() <= 5));
    }

    #[test]
    fn prices_stay_positive_and_yields_are_decimal() {
        let m = generate_market(ymd(2020, 1, 1), ymd(2023, 1, 1), 42).unwrap();
        for key in ["LQD", "HYG", "TLT", "VIX"] {
            assert!(m[key].points().iter().all(|(_, v)| v.is_some_and(|x| x > 0.0)), "{key}");
        }
        let treasury = &m["Treasury"];
        assert!(treasury.defined_len() < treasury.len(), "expected some missing prints");
        assert!(treasury.points().iter().filter_map(|(_, v)| *v).all(|y| y > 0.0 && y < 0.2));
    }

    #[test]
    fn provider_honours_unavailable_series() {
        let provider = SampleProvider::new(3).without("HYG");
        let req = SeriesRequest::yahoo("HYG", "HYG");
        let err = provider.fetch(&req, ymd(2022, 1, 1), Some(ymd(2022, 6, 1))).unwrap_err();
        assert!(matches!(err, AnalysisError::Fetch { .. }));

        let lqd = provider
            .fetch(&SeriesRequest::yahoo("LQD", "LQD"), ymd(2022, 1, 1), Some(ymd(2022, 6, 1)))
            .unwrap();
        assert!(!lqd.is_empty());
    }
}
