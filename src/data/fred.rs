//! FRED API integration for Treasury yield series (e.g. `DGS10`).

use chrono::NaiveDate;
use reqwest::blocking::Client;
use serde::Deserialize;
use tracing::debug;

use crate::domain::TimeSeries;
use crate::error::{AnalysisError, AppError};

const BASE_URL: &str = "https://api.stlouisfed.org/fred/series/observations";
const OBS_LIMIT: usize = 100000;

pub struct FredClient {
    client: Client,
    api_key: String,
}

impl FredClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
        }
    }

    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        let api_key = std::env::var("FRED_API_KEY")
            .map_err(|_| AppError::new(2, "Missing FRED_API_KEY in environment (.env)."))?;
        Ok(Self::new(api_key))
    }

    /// Fetch a percent-quoted rate series and convert it to decimals.
    ///
    /// FRED's "." placeholders (holidays) stay as missing values.
    pub fn fetch_rate_series(
        &self,
        series_id: &str,
        start: NaiveDate,
        end: Option<NaiveDate>,
    ) -> Result<TimeSeries, AnalysisError> {
        let fail = |msg: String| AnalysisError::fetch(series_id, msg);

        let start_str = start.to_string();
        let limit = OBS_LIMIT.to_string();
        let mut req = self.client.get(BASE_URL).query(&[
            ("series_id", series_id),
            ("api_key", self.api_key.as_str()),
            ("file_type", "json"),
            ("sort_order", "asc"),
            ("observation_start", start_str.as_str()),
            ("limit", limit.as_str()),
        ]);

        if let Some(date) = end {
            req = req.query(&[("observation_end", &date.to_string())]);
        }

        let resp = req.send().map_err(|e| fail(format!("FRED request failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(fail(format!("FRED request failed with status {}.", resp.status())));
        }

        let body: ObservationsResponse = resp
            .json()
            .map_err(|e| fail(format!("Failed to parse FRED response: {e}")))?;

        let series = observations_to_series(series_id, body)?;
        debug!(series_id, n = series.len(), "fetched FRED observations");
        Ok(series)
    }
}

#[derive(Debug, Deserialize)]
struct ObservationsResponse {
    observations: Vec<Observation>,
}

#[derive(Debug, Deserialize)]
struct Observation {
    date: String,
    value: String,
}

/// Convert percent-quoted observations into a decimal-yield series.
fn observations_to_series(series_id: &str, body: ObservationsResponse) -> Result<TimeSeries, AnalysisError> {
    let mut out = Vec::with_capacity(body.observations.len());
    for obs in body.observations {
        let date = NaiveDate::parse_from_str(&obs.date, "%Y-%m-%d")
            .map_err(|e| AnalysisError::fetch(series_id, format!("Invalid FRED date '{}': {e}", obs.date)))?;
        // Percent to decimal.
        out.push((date, parse_value(&obs.value).map(|v| v / 100.0)));
    }
    TimeSeries::from_observations(out)
}

fn parse_value(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed == "." || trimmed.is_empty() {
        return None;
    }
    let v = trimmed.parse::<f64>().ok()?;
    if v.is_finite() { Some(v) } else { None }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn parse_value_treats_placeholders_as_missing() {
        assert_eq!(parse_value("."), None);
        assert_eq!(parse_value("  "), None);
        assert_eq!(parse_value("abc"), None);
        assert_eq!(parse_value("NaN"), None);
        assert_eq!(parse_value(" 4.25 "), Some(4.25));
    }

    #[test]
    fn observations_response_deserializes() {
        let json = r#"{"observations":[
            {"realtime_start":"2024-01-05","date":"2024-01-02","value":"3.95"},
            {"realtime_start":"2024-01-05","date":"2024-01-03","value":"."}
        ]}"#;
        let body: ObservationsResponse = serde_json::from_str(json).unwrap();
        assert_eq!(body.observations.len(), 2);
        assert_eq!(parse_value(&body.observations[0].value), Some(3.95));
        assert_eq!(parse_value(&body.observations[1].value), None);
    }

    #[test]
    fn observations_become_decimal_yields_in_date_order() {
        let json = r#"{"observations":[
            {"date":"2024-01-03","value":"."},
            {"date":"2024-01-02","value":"3.95"},
            {"date":"2024-01-04","value":"4.10"}
        ]}"#;
        let body: ObservationsResponse = serde_json::from_str(json).unwrap();
        let series = observations_to_series("DGS10", body).unwrap();

        let d = |day| NaiveDate::from_ymd_opt(2024, 1, day).unwrap();
        assert_eq!(series.dates().collect::<Vec<_>>(), vec![d(2), d(3), d(4)]);
        assert_relative_eq!(series.get(d(2)).unwrap(), 0.0395, epsilon = 1e-12);
        assert_eq!(series.get(d(3)), None);
        assert_relative_eq!(series.get(d(4)).unwrap(), 0.041, epsilon = 1e-12);
        assert_eq!(series.defined_len(), 2);
    }

    #[test]
    fn malformed_observation_date_is_a_fetch_error() {
        let json = r#"{"observations":[{"date":"01/02/2024","value":"3.95"}]}"#;
        let body: ObservationsResponse = serde_json::from_str(json).unwrap();
        let err = observations_to_series("DGS10", body).unwrap_err();
        assert!(matches!(err, AnalysisError::Fetch { ref series, .. } if series == "DGS10"));
    }
}
