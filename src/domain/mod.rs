//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - time-indexed containers (`TimeSeries`, `AlignedDataset`, `SpreadSeries`)
//! - run configuration (`AnalysisConfig`, `CreditInstrument`, `EstimationMethod`)
//! - analysis outputs (`CorrelationResult`, `RollingCorrelation`, `RegimeSummary`, ...)

pub mod series;
pub mod types;

pub use series::*;
pub use types::*;
