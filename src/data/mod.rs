//! Market data retrieval.
//!
//! The analysis core only sees [`MarketDataProvider`]: a blocking call that
//! returns one named [`TimeSeries`] or fails. Two implementations ship:
//!
//! - [`LiveProvider`]: FRED for Treasury yields, Yahoo Finance for closes
//! - [`SampleProvider`]: a seeded synthetic market (offline, reproducible)

use chrono::NaiveDate;

use crate::domain::{SeriesRequest, SeriesSource, TimeSeries};
use crate::error::{AnalysisError, AnalysisResult};

pub mod fred;
pub mod sample;
pub mod yahoo;

pub use fred::FredClient;
pub use sample::{SampleProvider, generate_market};
pub use yahoo::YahooClient;

/// Source of raw daily series.
pub trait MarketDataProvider {
    /// Short label for logs.
    fn name(&self) -> &str;

    /// Fetch `request` from `start` through `end` (None: up to now).
    fn fetch(&self, request: &SeriesRequest, start: NaiveDate, end: Option<NaiveDate>) -> AnalysisResult<TimeSeries>;
}

/// Network-backed provider.
///
/// FRED access is optional: without an API key only Yahoo-sourced series are
/// available, which is enough for the returns-differential method.
pub struct LiveProvider {
    fred: Option<FredClient>,
    yahoo: YahooClient,
}

impl LiveProvider {
    pub fn new(fred: Option<FredClient>, yahoo: YahooClient) -> Self {
        Self { fred, yahoo }
    }

    /// Build from the environment; a missing `FRED_API_KEY` disables FRED.
    pub fn from_env() -> Self {
        let fred = match FredClient::from_env() {
            Ok(client) => Some(client),
            Err(err) => {
                tracing::warn!("{err} FRED series will be unavailable.");
                None
            }
        };
        Self::new(fred, YahooClient::new())
    }
}

impl MarketDataProvider for LiveProvider {
    fn name(&self) -> &str {
        "live"
    }

    fn fetch(&self, request: &SeriesRequest, start: NaiveDate, end: Option<NaiveDate>) -> AnalysisResult<TimeSeries> {
        match &request.source {
            SeriesSource::Yahoo(symbol) => self.yahoo.fetch_daily_closes(symbol, start, end),
            SeriesSource::Fred(series_id) => match &self.fred {
                Some(client) => client.fetch_rate_series(series_id, start, end),
                None => Err(AnalysisError::fetch(&request.key, "FRED_API_KEY not configured")),
            },
        }
    }
}
