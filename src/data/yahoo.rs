//! Yahoo Finance chart API: daily closes for ETFs and the VIX.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, NaiveDate, NaiveTime};
use reqwest::blocking::Client;
use serde::Deserialize;
use tracing::debug;

use crate::domain::TimeSeries;
use crate::error::AnalysisError;

const BASE_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";
// The endpoint rejects requests without a browser-like agent.
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) spread-stress";

pub struct YahooClient {
    client: Client,
    base_url: String,
}

impl Default for YahooClient {
    fn default() -> Self {
        Self::new()
    }
}

impl YahooClient {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            base_url: BASE_URL.to_string(),
        }
    }

    /// Daily closing prices for `symbol` from `start` to `end` (default: now).
    pub fn fetch_daily_closes(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: Option<NaiveDate>,
    ) -> Result<TimeSeries, AnalysisError> {
        let fail = |msg: String| AnalysisError::fetch(symbol, msg);

        let period1 = start.and_time(NaiveTime::MIN).and_utc().timestamp();
        let period2 = match end {
            // Inclusive end date.
            Some(d) => (d + Duration::days(1)).and_time(NaiveTime::MIN).and_utc().timestamp(),
            None => chrono::Utc::now().timestamp(),
        };

        let url = format!("{}/{}", self.base_url, symbol);
        let resp = self
            .client
            .get(&url)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .query(&[
                ("period1", period1.to_string()),
                ("period2", period2.to_string()),
                ("interval", "1d".to_string()),
                ("events", "history".to_string()),
            ])
            .send()
            .map_err(|e| fail(format!("Yahoo request failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(fail(format!("Yahoo request failed with status {}.", resp.status())));
        }

        let body: ChartResponse = resp
            .json()
            .map_err(|e| fail(format!("Failed to parse Yahoo response: {e}")))?;

        let points = closes_from_chart(body).map_err(fail)?;
        debug!(symbol, n = points.len(), "fetched Yahoo closes");
        TimeSeries::new(points)
    }
}

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    meta: ChartMeta,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct ChartMeta {
    /// Exchange offset from UTC in seconds.
    #[serde(default)]
    gmtoffset: i64,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteData>,
}

#[derive(Debug, Deserialize)]
struct QuoteData {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

/// Turn a chart payload into ascending `(exchange-local date, close)` points.
///
/// Null closes stay missing; a later bar on the same date replaces an earlier one.
fn closes_from_chart(body: ChartResponse) -> Result<Vec<(NaiveDate, Option<f64>)>, String> {
    if let Some(err) = body.chart.error {
        return Err(format!("Yahoo API error [{}]: {}", err.code, err.description));
    }
    let data = body
        .chart
        .result
        .and_then(|mut r| if r.is_empty() { None } else { Some(r.remove(0)) })
        .ok_or_else(|| "No chart data returned.".to_string())?;

    let closes = data
        .indicators
        .quote
        .into_iter()
        .next()
        .map(|q| q.close)
        .unwrap_or_default();
    if closes.len() != data.timestamp.len() {
        return Err(format!(
            "Timestamp/close length mismatch ({} vs {}).",
            data.timestamp.len(),
            closes.len()
        ));
    }

    let mut by_date = BTreeMap::new();
    for (ts, close) in data.timestamp.into_iter().zip(closes) {
        let local = DateTime::from_timestamp(ts + data.meta.gmtoffset, 0)
            .ok_or_else(|| format!("Invalid timestamp {ts}."))?;
        by_date.insert(local.date_naive(), close);
    }
    Ok(by_date.into_iter().collect())
}
