//! Date alignment of named series onto a shared index.
//!
//! Alignment is a pure lookup: a date survives only if every input series has
//! a defined value on it. Nothing is interpolated or forward-filled.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;

use crate::domain::{AlignedDataset, TimeSeries};
use crate::error::{AnalysisError, AnalysisResult};

/// Intersects series onto their common dates.
#[derive(Debug, Clone, Copy)]
pub struct TimeSeriesAligner {
    min_common_dates: usize,
}

impl Default for TimeSeriesAligner {
    fn default() -> Self {
        Self::new(100)
    }
}

impl TimeSeriesAligner {
    pub fn new(min_common_dates: usize) -> Self {
        Self { min_common_dates }
    }

    /// Align `series` (name → series) into one dataset.
    ///
    /// Fails with `InsufficientData` when fewer than `min_common_dates` rows
    /// have a value in every series.
    pub fn align<'a, I>(&self, series: I) -> AnalysisResult<AlignedDataset>
    where
        I: IntoIterator<Item = (&'a str, &'a TimeSeries)>,
    {
        let inputs: Vec<(&str, &TimeSeries)> = series.into_iter().collect();
        if inputs.is_empty() {
            return Err(AnalysisError::invalid("alignment", "no series to align"));
        }

        let dates = common_dates(inputs.iter().map(|(_, s)| *s));

        let mut columns = BTreeMap::new();
        for (name, s) in &inputs {
            let values: Vec<f64> = dates.iter().filter_map(|d| s.get(*d)).collect();
            debug_assert_eq!(values.len(), dates.len());
            if columns.insert(name.to_string(), values).is_some() {
                return Err(AnalysisError::invalid(
                    "alignment",
                    format!("series '{name}' given more than once"),
                ));
            }
        }

        if dates.len() < self.min_common_dates {
            let names: Vec<&str> = inputs.iter().map(|(n, _)| *n).collect();
            return Err(AnalysisError::insufficient(
                format!("alignment of [{}]", names.join(", ")),
                dates.len(),
                self.min_common_dates,
            ));
        }

        Ok(AlignedDataset::from_parts(dates, columns))
    }

    /// Convenience wrapper for an owned name → series map.
    pub fn align_map(&self, series: &BTreeMap<String, TimeSeries>) -> AnalysisResult<AlignedDataset> {
        self.align(series.iter().map(|(k, v)| (k.as_str(), v)))
    }
}

/// Ascending dates on which every series has a defined value.
fn common_dates<'a>(mut series: impl Iterator<Item = &'a TimeSeries>) -> Vec<NaiveDate> {
    let Some(first) = series.next() else {
        return Vec::new();
    };
    let mut common: BTreeSet<NaiveDate> = defined_dates(first);
    for s in series {
        let dates = defined_dates(s);
        common.retain(|d| dates.contains(d));
    }
    common.into_iter().collect()
}

fn defined_dates(series: &TimeSeries) -> BTreeSet<NaiveDate> {
    series
        .points()
        .iter()
        .filter(|(_, v)| v.is_some())
        .map(|(d, _)| *d)
        .collect()
}
