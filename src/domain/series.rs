//! Time-indexed containers: raw series, the aligned frame, derived spreads.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use serde::Serialize;

use crate::domain::CreditClass;
use crate::error::{AnalysisError, AnalysisResult};

/// An ordered `(date, value)` sequence.
///
/// Dates are strictly increasing. A missing observation is `None`; it is never
/// replaced by zero. Non-finite inputs are stored as `None`.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct TimeSeries {
    points: Vec<(NaiveDate, Option<f64>)>,
}

impl TimeSeries {
    /// Build from points that must already be in strictly increasing date order.
    pub fn new(points: Vec<(NaiveDate, Option<f64>)>) -> AnalysisResult<Self> {
        for w in points.windows(2) {
            if w[1].0 <= w[0].0 {
                return Err(AnalysisError::invalid(
                    "time series",
                    format!("dates must be strictly increasing ({} then {})", w[0].0, w[1].0),
                ));
            }
        }
        let points = points
            .into_iter()
            .map(|(d, v)| (d, v.filter(|x| x.is_finite())))
            .collect();
        Ok(Self { points })
    }

    /// Build from observations in any order (providers often return newest first).
    ///
    /// Duplicate dates are still rejected.
    pub fn from_observations(mut points: Vec<(NaiveDate, Option<f64>)>) -> AnalysisResult<Self> {
        points.sort_by_key(|(d, _)| *d);
        Self::new(points)
    }

    /// Build from fully defined values.
    pub fn from_values(points: Vec<(NaiveDate, f64)>) -> AnalysisResult<Self> {
        Self::new(points.into_iter().map(|(d, v)| (d, Some(v))).collect())
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[(NaiveDate, Option<f64>)] {
        &self.points
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.points.iter().map(|(d, _)| *d)
    }

    /// Value on `date`, or `None` if the date is absent or the value missing.
    pub fn get(&self, date: NaiveDate) -> Option<f64> {
        self.points
            .binary_search_by_key(&date, |(d, _)| *d)
            .ok()
            .and_then(|idx| self.points[idx].1)
    }

    /// Number of non-missing observations.
    pub fn defined_len(&self) -> usize {
        self.points.iter().filter(|(_, v)| v.is_some()).count()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.points.first().map(|(d, _)| *d)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.points.last().map(|(d, _)| *d)
    }
}

/// A table of named columns over one shared, ascending date index.
///
/// Every column holds a finite value at every row. Deriving new columns
/// produces a new dataset; existing values are never modified in place.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct AlignedDataset {
    dates: Vec<NaiveDate>,
    columns: BTreeMap<String, Vec<f64>>,
}

impl AlignedDataset {
    /// Caller guarantees the invariant (used by the aligner).
    pub(crate) fn from_parts(dates: Vec<NaiveDate>, columns: BTreeMap<String, Vec<f64>>) -> Self {
        debug_assert!(columns.values().all(|c| c.len() == dates.len()));
        debug_assert!(dates.windows(2).all(|w| w[0] < w[1]));
        Self { dates, columns }
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.dates.first().copied()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns.get(name).map(Vec::as_slice)
    }

    /// Like [`column`](Self::column) but reports a missing column as an error.
    pub fn require(&self, name: &str) -> AnalysisResult<&[f64]> {
        self.column(name).ok_or_else(|| AnalysisError::missing(name))
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    /// Every column re-expressed as a standalone series.
    pub fn to_series(&self) -> BTreeMap<String, TimeSeries> {
        self.columns
            .iter()
            .map(|(name, values)| {
                let points = self
                    .dates
                    .iter()
                    .zip(values)
                    .map(|(d, v)| (*d, Some(*v)))
                    .collect();
                (name.clone(), TimeSeries { points })
            })
            .collect()
    }

    /// Append spread columns, keeping only rows where every spread is defined.
    pub fn with_spreads(&self, spreads: &[SpreadSeries]) -> AnalysisResult<AlignedDataset> {
        let mut lookups: Vec<(&str, HashMap<NaiveDate, f64>)> = Vec::with_capacity(spreads.len());
        for s in spreads {
            if self.columns.contains_key(&s.name) || lookups.iter().any(|(n, _)| *n == s.name) {
                return Err(AnalysisError::invalid(
                    "spread columns",
                    format!("column '{}' already exists", s.name),
                ));
            }
            let map = s.dates.iter().copied().zip(s.values_bp.iter().copied()).collect();
            lookups.push((s.name.as_str(), map));
        }

        let keep: Vec<usize> = (0..self.dates.len())
            .filter(|&i| lookups.iter().all(|(_, m)| m.contains_key(&self.dates[i])))
            .collect();

        let dates: Vec<NaiveDate> = keep.iter().map(|&i| self.dates[i]).collect();
        let mut columns: BTreeMap<String, Vec<f64>> = self
            .columns
            .iter()
            .map(|(name, values)| (name.clone(), keep.iter().map(|&i| values[i]).collect()))
            .collect();
        for (name, map) in lookups {
            let values = dates.iter().map(|d| map[d]).collect();
            columns.insert(name.to_string(), values);
        }

        Ok(AlignedDataset { dates, columns })
    }
}

/// A derived credit-spread proxy in basis points.
///
/// Holds defined rows only: dates without full smoothing history are absent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpreadSeries {
    pub name: String,
    pub class: CreditClass,
    pub dates: Vec<NaiveDate>,
    pub values_bp: Vec<f64>,
}

impl SpreadSeries {
    pub fn len(&self) -> usize {
        self.values_bp.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values_bp.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
    }

    #[test]
    fn rejects_unordered_dates() {
        let err = TimeSeries::new(vec![(d(2), Some(1.0)), (d(1), Some(2.0))]).unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidInput { .. }));
    }

    #[test]
    fn from_observations_sorts_but_rejects_duplicates() {
        let ts = TimeSeries::from_observations(vec![(d(3), Some(3.0)), (d(1), Some(1.0))]).unwrap();
        assert_eq!(ts.first_date(), Some(d(1)));
        assert_eq!(ts.get(d(3)), Some(3.0));

        let dup = TimeSeries::from_observations(vec![(d(1), Some(1.0)), (d(1), Some(2.0))]);
        assert!(dup.is_err());
    }

    #[test]
    fn non_finite_values_become_missing() {
        let ts = TimeSeries::new(vec![(d(1), Some(f64::NAN)), (d(2), Some(2.0))]).unwrap();
        assert_eq!(ts.get(d(1)), None);
        assert_eq!(ts.defined_len(), 1);
    }

    #[test]
    fn with_spreads_drops_rows_without_spread_history() {
        let mut columns = BTreeMap::new();
        columns.insert("VIX".to_string(), vec![10.0, 11.0, 12.0, 13.0]);
        let ds = AlignedDataset::from_parts(vec![d(1), d(2), d(3), d(4)], columns);

        let spread = SpreadSeries {
            name: "IG_Spread".to_string(),
            class: CreditClass::InvestmentGrade,
            dates: vec![d(3), d(4)],
            values_bp: vec![50.0, 60.0],
        };
        let out = ds.with_spreads(&[spread]).unwrap();

        assert_eq!(out.dates(), &[d(3), d(4)]);
        assert_eq!(out.column("VIX"), Some(&[12.0, 13.0][..]));
        assert_eq!(out.column("IG_Spread"), Some(&[50.0, 60.0][..]));
        // The source dataset is untouched.
        assert_eq!(ds.len(), 4);
        assert!(!ds.has_column("IG_Spread"));
    }

    #[test]
    fn with_spreads_rejects_duplicate_column() {
        let mut columns = BTreeMap::new();
        columns.insert("IG_Spread".to_string(), vec![1.0]);
        let ds = AlignedDataset::from_parts(vec![d(1)], columns);
        let spread = SpreadSeries {
            name: "IG_Spread".to_string(),
            class: CreditClass::InvestmentGrade,
            dates: vec![d(1)],
            values_bp: vec![5.0],
        };
        assert!(ds.with_spreads(&[spread]).is_err());
    }
}
