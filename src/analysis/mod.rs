//! The analytical core: alignment, spread estimation, correlation, regimes.
//!
//! Everything here is a pure computation over in-memory series. Sequencing and
//! gating live in `app::pipeline`.

pub mod align;
pub mod correlation;
pub mod regime;
pub mod spread;

pub use align::TimeSeriesAligner;
pub use correlation::CorrelationAnalyzer;
pub use regime::RegimeClassifier;
pub use spread::{ReturnsDifferentialEstimator, SpreadEstimator, YieldBasedEstimator, build_estimators};
