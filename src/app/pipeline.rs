//! Shared analysis pipeline used by every CLI front-end.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! fetch -> align -> estimate spreads -> correlate/classify -> summarize
//!
//! The pipeline is a strictly sequential state machine:
//!
//! ```text
//! Fetching -> Aligning -> Estimating -> Analyzing -> Reporting -> Done
//!                 \            \
//!                  `------------`--> Aborted
//! ```
//!
//! Each stage consumes the previous stage's values and returns new ones; the
//! aligned dataset is never mutated in place.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::analysis::correlation::MIN_OBSERVATIONS;
use crate::analysis::{CorrelationAnalyzer, RegimeClassifier, SpreadEstimator, TimeSeriesAligner, build_estimators};
use crate::data::MarketDataProvider;
use crate::domain::{
    AlignedDataset, AnalysisConfig, CorrelationResult, CreditClass, EstimationMethod, RegimeSummary,
    RollingCorrelation, SpreadSeries, SpreadStats, TimeSeries, TrendLine,
};
use crate::error::{AnalysisError, AnalysisResult};
use crate::math::{mean, sample_std};

/// Pipeline states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Stage {
    Fetching,
    Aligning,
    Estimating,
    Analyzing,
    Reporting,
    Done,
    Aborted,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Fetching => "fetching",
            Stage::Aligning => "aligning",
            Stage::Estimating => "estimating",
            Stage::Analyzing => "analyzing",
            Stage::Reporting => "reporting",
            Stage::Done => "done",
            Stage::Aborted => "aborted",
        };
        f.write_str(s)
    }
}

/// An aborted run: which stage stopped it, and why.
#[derive(Error, Debug, Clone)]
#[error("analysis aborted while {stage}: {source}")]
pub struct PipelineError {
    pub stage: Stage,
    #[source]
    pub source: AnalysisError,
    /// Stages entered before the abort (ends with `Aborted`).
    pub history: Vec<Stage>,
}

/// Everything derived for one spread series.
#[derive(Debug, Clone, Serialize)]
pub struct SpreadAnalysis {
    pub class: CreditClass,
    #[serde(skip)]
    pub spread: SpreadSeries,
    pub stats: SpreadStats,
    pub correlation: CorrelationResult,
    #[serde(skip)]
    pub rolling: RollingCorrelation,
    pub latest_rolling: Option<f64>,
    pub trend: Option<TrendLine>,
    pub regimes: RegimeSummary,
}

/// All computed outputs of a single run.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisOutput {
    pub method: EstimationMethod,
    pub stress_key: String,
    /// Rows after alignment, before smoothing.
    pub aligned_rows: usize,
    /// Aligned inputs plus spread columns, restricted to rows with every spread defined.
    #[serde(skip)]
    pub frame: AlignedDataset,
    pub spreads: Vec<SpreadAnalysis>,
    /// Estimators that could not run, with the reason.
    pub skipped: Vec<(CreditClass, String)>,
    /// Series the provider could not deliver.
    pub fetch_failures: Vec<String>,
    pub stages: Vec<Stage>,
}

impl AnalysisOutput {
    pub fn spread(&self, class: CreditClass) -> Option<&SpreadAnalysis> {
        self.spreads.iter().find(|s| s.class == class)
    }

    pub fn correlations(&self) -> impl Iterator<Item = &CorrelationResult> {
        self.spreads.iter().map(|s| &s.correlation)
    }

    pub fn regimes(&self) -> impl Iterator<Item = &RegimeSummary> {
        self.spreads.iter().map(|s| &s.regimes)
    }
}

/// One analysis run over one logical dataset.
pub struct Pipeline {
    config: AnalysisConfig,
    stage: Stage,
    history: Vec<Stage>,
}

impl Pipeline {
    pub fn new(config: AnalysisConfig) -> AnalysisResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            stage: Stage::Fetching,
            history: Vec::new(),
        })
    }

    /// Run every stage; consumes the pipeline so nothing leaks across runs.
    pub fn run(mut self, provider: &dyn MarketDataProvider) -> Result<AnalysisOutput, PipelineError> {
        self.enter(Stage::Fetching);
        let (raw, fetch_failures) = self.fetch(provider);

        self.enter(Stage::Aligning);
        let (dataset, estimators, mut skipped) = self.align(&raw).map_err(|e| self.abort(e))?;

        self.enter(Stage::Estimating);
        let (frame, spreads) = self
            .estimate(&dataset, &estimators, &mut skipped)
            .map_err(|e| self.abort(e))?;

        self.enter(Stage::Analyzing);
        let analyses = self.analyze(&frame, spreads).map_err(|e| self.abort(e))?;

        self.enter(Stage::Reporting);
        info!(
            rows = frame.len(),
            spreads = analyses.len(),
            first = ?frame.first_date(),
            last = ?frame.last_date(),
            "analysis complete"
        );

        self.enter(Stage::Done);
        Ok(AnalysisOutput {
            method: self.config.method,
            stress_key: self.config.stress_index.key.clone(),
            aligned_rows: dataset.len(),
            frame,
            spreads: analyses,
            skipped,
            fetch_failures,
            stages: self.history,
        })
    }

    fn enter(&mut self, stage: Stage) {
        debug!(%stage, "entering stage");
        self.stage = stage;
        self.history.push(stage);
    }

    fn abort(&mut self, source: AnalysisError) -> PipelineError {
        let stage = self.stage;
        warn!(%stage, error = %source, "analysis aborted");
        self.enter(Stage::Aborted);
        PipelineError {
            stage,
            source,
            history: self.history.clone(),
        }
    }

    /// Fetch every series; failures are logged and the series left out.
    fn fetch(&self, provider: &dyn MarketDataProvider) -> (BTreeMap<String, TimeSeries>, Vec<String>) {
        let mut raw = BTreeMap::new();
        let mut failures = Vec::new();
        for request in self.config.series_requests() {
            match provider.fetch(&request, self.config.start_date, self.config.end_date) {
                Ok(series) if series.defined_len() == 0 => {
                    warn!(series = %request.key, provider = provider.name(), "no observations returned");
                    failures.push(format!("{}: no observations", request.key));
                }
                Ok(series) => {
                    info!(series = %request.key, n = series.defined_len(), "fetched");
                    raw.insert(request.key.clone(), series);
                }
                Err(err) => {
                    warn!(series = %request.key, error = %err, "fetch failed");
                    failures.push(err.to_string());
                }
            }
        }
        (raw, failures)
    }

    /// Pick runnable estimators and align exactly the series they need.
    #[allow(clippy::type_complexity)]
    fn align(
        &self,
        raw: &BTreeMap<String, TimeSeries>,
    ) -> AnalysisResult<(AlignedDataset, Vec<Box<dyn SpreadEstimator>>, Vec<(CreditClass, String)>)> {
        let stress_key = &self.config.stress_index.key;
        if !raw.contains_key(stress_key) {
            return Err(AnalysisError::missing(stress_key.clone()));
        }

        let mut runnable = Vec::new();
        let mut skipped = Vec::new();
        let mut first_missing: Option<String> = None;
        for est in build_estimators(&self.config) {
            let missing: Vec<&str> = est
                .required_columns()
                .into_iter()
                .filter(|c| !raw.contains_key(*c))
                .collect();
            if missing.is_empty() {
                runnable.push(est);
            } else {
                let reason = format!("missing series: {}", missing.join(", "));
                warn!(spread = est.name(), %reason, "skipping spread estimator");
                first_missing.get_or_insert_with(|| missing[0].to_string());
                skipped.push((est.class(), reason));
            }
        }
        if runnable.is_empty() {
            return Err(AnalysisError::missing(first_missing.unwrap_or_default()));
        }

        let mut keys: Vec<&str> = vec![stress_key.as_str()];
        for est in &runnable {
            for col in est.required_columns() {
                if !keys.contains(&col) {
                    keys.push(col);
                }
            }
        }
        let selected = keys.iter().filter_map(|k| raw.get(*k).map(|s| (*k, s)));

        let aligner = TimeSeriesAligner::new(self.config.min_common_dates);
        let dataset = aligner.align(selected)?;
        info!(
            rows = dataset.len(),
            columns = ?dataset.column_names().collect::<Vec<_>>(),
            "aligned series"
        );
        Ok((dataset, runnable, skipped))
    }

    /// Run each estimator; one that rejects its input is skipped, not fatal.
    fn estimate(
        &self,
        dataset: &AlignedDataset,
        estimators: &[Box<dyn SpreadEstimator>],
        skipped: &mut Vec<(CreditClass, String)>,
    ) -> AnalysisResult<(AlignedDataset, Vec<SpreadSeries>)> {
        let window = self.config.smoothing_window;
        let mut spreads = Vec::with_capacity(estimators.len());
        let mut first_error: Option<AnalysisError> = None;
        for est in estimators {
            match est.estimate(dataset, window) {
                Ok(s) => {
                    debug!(spread = %s.name, n = s.len(), "estimated spread");
                    spreads.push(s);
                }
                Err(err @ AnalysisError::InvalidInput { .. }) => {
                    warn!(spread = est.name(), error = %err, "skipping spread estimator");
                    skipped.push((est.class(), err.to_string()));
                    first_error.get_or_insert(err);
                }
                Err(err) => return Err(err),
            }
        }
        if spreads.is_empty() {
            return Err(first_error.unwrap_or_else(|| AnalysisError::insufficient("spread estimation", 0, 1)));
        }

        let frame = dataset.with_spreads(&spreads)?;
        if frame.len() < MIN_OBSERVATIONS {
            return Err(AnalysisError::insufficient(
                format!("spreads after {window}-day smoothing"),
                frame.len(),
                MIN_OBSERVATIONS,
            ));
        }
        Ok((frame, spreads))
    }

    fn analyze(&self, frame: &AlignedDataset, spreads: Vec<SpreadSeries>) -> AnalysisResult<Vec<SpreadAnalysis>> {
        let analyzer = CorrelationAnalyzer::new(self.config.correlation_window);
        let classifier = RegimeClassifier::new(Some(self.config.stress_threshold));
        let stress = frame.require(&self.config.stress_index.key)?;

        let mut out = Vec::with_capacity(spreads.len());
        for spread in spreads {
            let name = spread.name.clone();
            let values = frame.require(&name)?;

            let correlation = match analyzer.correlate(&name, values, stress) {
                Ok(c) => c,
                Err(err @ AnalysisError::InvalidInput { .. }) => {
                    warn!(spread = %name, error = %err, "correlation undefined");
                    CorrelationResult::undefined(&name, values.len())
                }
                Err(err) => return Err(err),
            };
            let rolling = analyzer.rolling(&name, frame.dates(), values, stress)?;
            let trend = match analyzer.trend_line(&name, values, stress) {
                Ok(t) => Some(t),
                Err(err) => {
                    warn!(spread = %name, error = %err, "trend line unavailable");
                    None
                }
            };
            let regimes = classifier.classify(&name, values, Some(stress))?;
            let stats = spread_stats(&name, values)?;

            out.push(SpreadAnalysis {
                class: spread.class,
                latest_rolling: rolling.latest().map(|(_, v)| v),
                spread,
                stats,
                correlation,
                rolling,
                trend,
                regimes,
            });
        }
        Ok(out)
    }
}

fn spread_stats(name: &str, values: &[f64]) -> AnalysisResult<SpreadStats> {
    let insufficient = || AnalysisError::insufficient(format!("statistics of {name}"), values.len(), 2);
    let latest = *values.last().ok_or_else(insufficient)?;
    Ok(SpreadStats {
        spread_name: name.to_string(),
        n: values.len(),
        mean: mean(values).ok_or_else(insufficient)?,
        std_dev: sample_std(values).ok_or_else(insufficient)?,
        min: values.iter().copied().fold(f64::INFINITY, f64::min),
        max: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        latest,
    })
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::data::SampleProvider;
    use crate::domain::DataSource;

    fn sample_config() -> AnalysisConfig {
        AnalysisConfig {
            start_date: NaiveDate::from_ymd_opt(2021, 1, 1).unwrap(),
            end_date: Some(NaiveDate::from_ymd_opt(2022, 12, 31).unwrap()),
            source: DataSource::Sample,
            ..AnalysisConfig::default()
        }
    }

    #[test]
    fn full_run_visits_every_stage_in_order() {
        let provider = SampleProvider::new(42);
        let out = Pipeline::new(sample_config()).unwrap().run(&provider).unwrap();
        assert_eq!(
            out.stages,
            vec![
                Stage::Fetching,
                Stage::Aligning,
                Stage::Estimating,
                Stage::Analyzing,
                Stage::Reporting,
                Stage::Done
            ]
        );
        assert_eq!(out.spreads.len(), 2);
        assert_eq!(out.frame.len(), out.aligned_rows - 19);
        assert!(out.frame.has_column("IG_Spread") && out.frame.has_column("HY_Spread"));
    }

    #[test]
    fn short_history_aborts_while_aligning() {
        let config = AnalysisConfig {
            end_date: Some(NaiveDate::from_ymd_opt(2021, 2, 15).unwrap()),
            ..sample_config()
        };
        let err = Pipeline::new(config).unwrap().run(&SampleProvider::new(1)).unwrap_err();
        assert_eq!(err.stage, Stage::Aligning);
        assert!(matches!(err.source, AnalysisError::InsufficientData { .. }));
        assert_eq!(err.history.last(), Some(&Stage::Aborted));
        assert!(!err.history.contains(&Stage::Estimating));
    }

    #[test]
    fn smoothing_window_longer_than_data_aborts_while_estimating() {
        let config = AnalysisConfig {
            min_common_dates: 30,
            smoothing_window: 200,
            end_date: Some(NaiveDate::from_ymd_opt(2021, 6, 30).unwrap()),
            ..sample_config()
        };
        let err = Pipeline::new(config).unwrap().run(&SampleProvider::new(1)).unwrap_err();
        assert_eq!(err.stage, Stage::Estimating);
        assert!(matches!(
            err.source,
            AnalysisError::InsufficientData { required: 3, .. }
        ));
    }

    #[test]
    fn missing_stress_index_aborts() {
        let provider = SampleProvider::new(5).without("VIX");
        let err = Pipeline::new(sample_config()).unwrap().run(&provider).unwrap_err();
        assert_eq!(err.stage, Stage::Aligning);
        assert_eq!(err.source, AnalysisError::missing("VIX"));
    }

    #[test]
    fn missing_high_yield_degrades_to_investment_grade() {
        let provider = SampleProvider::new(5).without("HYG");
        let out = Pipeline::new(sample_config()).unwrap().run(&provider).unwrap();
        assert_eq!(out.spreads.len(), 1);
        assert_eq!(out.spreads[0].class, CreditClass::InvestmentGrade);
        assert_eq!(out.skipped.len(), 1);
        assert_eq!(out.skipped[0].0, CreditClass::HighYield);
        assert_eq!(out.fetch_failures.len(), 1);
        assert!(!out.frame.has_column("HYG"));
    }

    #[test]
    fn returns_method_does_not_need_treasury_yield() {
        let provider = SampleProvider::new(9).without("Treasury");
        let config = AnalysisConfig {
            method: EstimationMethod::Returns,
            ..sample_config()
        };
        let out = Pipeline::new(config).unwrap().run(&provider).unwrap();
        assert_eq!(out.spreads.len(), 2);
        assert!(out.frame.has_column("TLT"));
        assert!(!out.frame.has_column("Treasury"));
    }

    #[test]
    fn invalid_config_is_rejected_up_front() {
        let config = AnalysisConfig {
            smoothing_window: 0,
            ..sample_config()
        };
        assert!(Pipeline::new(config).is_err());
    }
}
