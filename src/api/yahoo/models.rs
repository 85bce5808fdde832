use chrono::DateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::DailyBar;

/// Top-level body of the v8 chart endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartResponse {
    pub chart: ChartEnvelope,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartEnvelope {
    pub result: Option<Vec<ChartResult>>,
    pub error: Option<ChartErrorBody>,
}

/// Error object reported inside an otherwise well-formed response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartErrorBody {
    pub code: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartResult {
    pub meta: Option<ChartMeta>,
    #[serde(default)]
    pub timestamp: Vec<i64>,
    pub indicators: Indicators,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartMeta {
    pub symbol: Option<String>,
    pub currency: Option<String>,
    pub exchange_timezone_name: Option<String>,
    /// Exchange offset from UTC in seconds
    pub gmtoffset: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Indicators {
    #[serde(default)]
    pub quote: Vec<QuoteBlock>,
}

/// Column-oriented OHLCV values, aligned with `ChartResult::timestamp`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QuoteBlock {
    #[serde(default)]
    pub open: Vec<Option<f64>>,
    #[serde(default)]
    pub high: Vec<Option<f64>>,
    #[serde(default)]
    pub low: Vec<Option<f64>>,
    #[serde(default)]
    pub close: Vec<Option<f64>>,
    #[serde(default)]
    pub volume: Vec<Option<u64>>,
}

impl ChartResult {
    /// Convert the columnar payload into one row per trading day.
    ///
    /// Timestamps are shifted by the exchange offset so each bar lands on its
    /// local trading date.
    pub fn bars(&self) -> Vec<DailyBar> {
        let offset = self.meta.as_ref().and_then(|m| m.gmtoffset).unwrap_or(0);
        let empty = QuoteBlock::default();
        let quote = self.indicators.quote.first().unwrap_or(&empty);
        let column = |values: &[Option<f64>], i: usize| values.get(i).copied().flatten();

        self.timestamp
            .iter()
            .enumerate()
            .filter_map(|(i, ts)| {
                let date = DateTime::from_timestamp(ts + offset, 0)?.date_naive();
                Some(DailyBar {
                    date,
                    open: column(&quote.open, i),
                    high: column(&quote.high, i),
                    low: column(&quote.low, i),
                    close: column(&quote.close, i),
                    volume: quote.volume.get(i).copied().flatten(),
                })
            })
            .collect()
    }
}

/// Error type for market-data requests
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// Unknown symbol or no data for the range
    #[error("Not Found: {0}")]
    NotFound(String),
    /// 429 Too Many Requests
    #[error("Rate Limited: {0}")]
    RateLimited(String),
    /// 5xx Server Error
    #[error("Server Error ({0}): {1}")]
    ServerError(u16, String),
    /// Other HTTP errors
    #[error("HTTP Error ({0}): {1}")]
    HttpError(u16, String),
    /// Error object inside a 200 response
    #[error("Provider Error ({0}): {1}")]
    ProviderError(String, String),
    /// Network/request error
    #[error("Request Error: {0}")]
    RequestError(String),
    /// Deserialization error
    #[error("Deserialization Error: {0}")]
    DeserializationError(String),
}
