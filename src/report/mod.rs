//! Reporting utilities: significance markers and formatted terminal output.

pub mod format;

pub use format::{format_regimes, format_summary};

/// Conventional star markers for a two-tailed p-value.
///
/// `***` p < 0.001, `**` p < 0.01, `*` p < 0.05; NaN or larger p gets none.
pub fn significance_marker(p_value: f64) -> &'static str {
    if p_value < 0.001 {
        "***"
    } else if p_value < 0.01 {
        "**"
    } else if p_value < 0.05 {
        "*"
    } else {
        ""
    }
}
