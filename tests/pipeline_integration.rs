use std::collections::BTreeMap;

use approx::assert_abs_diff_eq;
use chrono::{Datelike, Duration, NaiveDate, Weekday};
use spread_stress::app::pipeline::{Pipeline, Stage};
use spread_stress::data::{MarketDataProvider, SampleProvider};
use spread_stress::domain::{
    AnalysisConfig, CreditClass, DataSource, EstimationMethod, SeriesRequest, TimeSeries,
};
use spread_stress::error::{AnalysisError, AnalysisResult, AppError};

/// Serves fixed in-memory series; anything else fails to fetch.
struct ScriptedProvider {
    series: BTreeMap<String, TimeSeries>,
}

impl MarketDataProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    fn fetch(&self, request: &SeriesRequest, _start: NaiveDate, _end: Option<NaiveDate>) -> AnalysisResult<TimeSeries> {
        self.series
            .get(&request.key)
            .cloned()
            .ok_or_else(|| AnalysisError::fetch(&request.key, "not scripted"))
    }
}

fn weekdays(n: usize) -> Vec<NaiveDate> {
    let mut d = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
    let mut out = Vec::with_capacity(n);
    while out.len() < n {
        if !matches!(d.weekday(), Weekday::Sat | Weekday::Sun) {
            out.push(d);
        }
        d += Duration::days(1);
    }
    out
}

fn series(dates: &[NaiveDate], f: impl Fn(usize) -> f64) -> TimeSeries {
    TimeSeries::from_values(dates.iter().enumerate().map(|(i, d)| (*d, f(i))).collect()).unwrap()
}

/// 150 rows: VIX calm then 10 days above 30, flat 3% Treasury yield,
/// LQD compounding 0.1%/day, HYG oscillating.
fn scripted_market(n: usize) -> ScriptedProvider {
    let dates = weekdays(n);
    let mut map = BTreeMap::new();
    map.insert(
        "VIX".to_string(),
        series(&dates, |i| if i >= n - 10 { 35.0 } else { 15.0 + (i % 7) as f64 }),
    );
    map.insert("Treasury".to_string(), series(&dates, |_| 0.03));
    map.insert("LQD".to_string(), series(&dates, |i| 100.0 * 1.001_f64.powi(i as i32)));
    map.insert(
        "HYG".to_string(),
        series(&dates, |i| 80.0 + 2.0 * ((i as f64) / 9.0).sin() - 0.01 * i as f64),
    );
    map.insert("TLT".to_string(), series(&dates, |i| 95.0 + ((i as f64) / 5.0).cos()));
    ScriptedProvider { series: map }
}

fn config() -> AnalysisConfig {
    AnalysisConfig {
        start_date: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
        end_date: Some(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()),
        source: DataSource::Sample,
        ..AnalysisConfig::default()
    }
}

#[test]
fn constant_momentum_gives_minus_fifty_bp_and_undefined_correlation() {
    let out = Pipeline::new(config()).unwrap().run(&scripted_market(150)).unwrap();

    assert_eq!(out.stages.last(), Some(&Stage::Done));
    assert_eq!(out.aligned_rows, 150);
    assert_eq!(out.frame.len(), 150 - 19);

    let ig = out.spread(CreditClass::InvestmentGrade).unwrap();
    for v in out.frame.column("IG_Spread").unwrap() {
        assert_abs_diff_eq!(*v, -50.0, epsilon = 1e-6);
    }
    // A flat spread has no defined correlation; the run still completes.
    assert!(!ig.correlation.is_defined());
    assert!(ig.correlation.coefficient.is_nan());
    assert_eq!(ig.latest_rolling, None);

    let hy = out.spread(CreditClass::HighYield).unwrap();
    assert!(hy.correlation.is_defined());
    assert!(hy.correlation.p_value >= 0.0 && hy.correlation.p_value <= 1.0);
}

#[test]
fn stress_split_counts_days_above_threshold() {
    let out = Pipeline::new(config()).unwrap().run(&scripted_market(150)).unwrap();
    let hy = out.spread(CreditClass::HighYield).unwrap();
    let split = hy.regimes.stress.as_ref().unwrap();
    assert_eq!(split.stress_count, 10);
    assert_eq!(split.normal_count, out.frame.len() - 10);
    assert_eq!(hy.regimes.counts.total(), out.frame.len());
}

#[test]
fn rolling_correlation_is_defined_after_window_fills() {
    let out = Pipeline::new(config()).unwrap().run(&scripted_market(150)).unwrap();
    let hy = out.spread(CreditClass::HighYield).unwrap();
    assert_eq!(hy.rolling.values.len(), out.frame.len());
    assert!(hy.rolling.values[..59].iter().all(Option::is_none));
    assert!(hy.rolling.defined_count() <= out.frame.len() - 59);
}

#[test]
fn too_few_common_dates_aborts_with_exit_code_3() {
    let err = Pipeline::new(config()).unwrap().run(&scripted_market(80)).unwrap_err();
    assert_eq!(err.stage, Stage::Aligning);
    assert_eq!(
        err.source,
        AnalysisError::InsufficientData {
            context: "alignment of [VIX, LQD, Treasury, HYG]".to_string(),
            found: 80,
            required: 100,
        }
    );
    let app: AppError = err.into();
    assert_eq!(app.exit_code(), 3);
}

#[test]
fn no_credit_instrument_aborts_with_missing_series() {
    let mut provider = scripted_market(150);
    provider.series.remove("LQD");
    provider.series.remove("HYG");
    let err = Pipeline::new(config()).unwrap().run(&provider).unwrap_err();
    assert_eq!(err.stage, Stage::Aligning);
    assert!(matches!(err.source, AnalysisError::MissingSeries { .. }));
}

#[test]
fn yield_method_without_treasury_cannot_estimate() {
    let mut provider = scripted_market(150);
    provider.series.remove("Treasury");
    let err = Pipeline::new(config()).unwrap().run(&provider).unwrap_err();
    assert_eq!(err.stage, Stage::Aligning);
    assert_eq!(err.source, AnalysisError::missing("Treasury"));
}

fn with_price(provider: &mut ScriptedProvider, key: &str, row: usize, price: f64) {
    let points = provider.series[key]
        .points()
        .iter()
        .enumerate()
        .map(|(i, (d, v))| (*d, if i == row { Some(price) } else { *v }))
        .collect();
    provider.series.insert(key.to_string(), TimeSeries::new(points).unwrap());
}

#[test]
fn zero_high_yield_close_skips_only_that_spread() {
    let mut provider = scripted_market(150);
    with_price(&mut provider, "HYG", 70, 0.0);

    let out = Pipeline::new(config()).unwrap().run(&provider).unwrap();
    assert_eq!(out.stages.last(), Some(&Stage::Done));
    assert_eq!(out.spreads.len(), 1);
    assert_eq!(out.spreads[0].class, CreditClass::InvestmentGrade);
    assert_eq!(out.frame.len(), 150 - 19);
    assert!(!out.frame.has_column("HY_Spread"));

    assert_eq!(out.skipped.len(), 1);
    assert_eq!(out.skipped[0].0, CreditClass::HighYield);
    assert!(out.skipped[0].1.contains("returns of HYG"), "{}", out.skipped[0].1);
}

#[test]
fn every_estimator_rejecting_its_input_aborts_while_estimating() {
    let mut provider = scripted_market(150);
    with_price(&mut provider, "HYG", 70, 0.0);
    with_price(&mut provider, "LQD", 40, 0.0);

    let err = Pipeline::new(config()).unwrap().run(&provider).unwrap_err();
    assert_eq!(err.stage, Stage::Estimating);
    assert!(matches!(err.source, AnalysisError::InvalidInput { .. }));
    let app: AppError = err.into();
    assert_eq!(app.exit_code(), 4);
}

#[test]
fn returns_method_runs_on_the_synthetic_market() {
    let config = AnalysisConfig {
        method: EstimationMethod::Returns,
        start_date: NaiveDate::from_ymd_opt(2021, 1, 1).unwrap(),
        end_date: Some(NaiveDate::from_ymd_opt(2023, 12, 31).unwrap()),
        ..config()
    };
    let out = Pipeline::new(config).unwrap().run(&SampleProvider::new(11)).unwrap();
    assert_eq!(out.spreads.len(), 2);
    for s in &out.spreads {
        assert!(s.correlation.is_defined(), "{}", s.stats.spread_name);
        assert_eq!(s.regimes.counts.total(), out.frame.len());
        assert!(s.trend.is_some());
    }
}

#[test]
fn synthetic_runs_are_reproducible_per_seed() {
    let run = |seed| {
        Pipeline::new(config())
            .unwrap()
            .run(&SampleProvider::new(seed))
            .unwrap()
    };
    let a = run(7);
    let b = run(7);
    assert_eq!(a.frame, b.frame);
    assert_eq!(a.spreads[0].stats, b.spreads[0].stats);
}

#[test]
fn exports_write_csv_and_json() {
    let out = Pipeline::new(config()).unwrap().run(&scripted_market(150)).unwrap();
    let dir = std::env::temp_dir().join(format!("spread-stress-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();

    let csv = dir.join("frame.csv");
    spread_stress::io::write_dataset_csv(&csv, &out.frame).unwrap();
    let text = std::fs::read_to_string(&csv).unwrap();
    assert_eq!(
        text.lines().next().unwrap(),
        "date,HYG,HY_Spread,IG_Spread,LQD,Treasury,VIX"
    );
    assert_eq!(text.lines().count(), out.frame.len() + 1);

    let json = dir.join("summary.json");
    spread_stress::io::write_summary_json(&json, &out).unwrap();
    let value: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&json).unwrap()).unwrap();
    assert_eq!(value["observations"], out.frame.len());
    // NaN coefficients serialize as null.
    assert!(value["spreads"][0]["correlation"]["coefficient"].is_null());

    std::fs::remove_dir_all(&dir).ok();
}
