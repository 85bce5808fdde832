use chrono::{NaiveDate, NaiveTime};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::Client as HttpClient;
use std::time::Duration;
use tracing::{debug, warn};

use super::models::{ApiError, ChartResponse};
use crate::models::DailyBar;

/// Client for the Yahoo Finance chart endpoint
pub struct YahooClient {
    http_client: HttpClient,
    base_url: String,
}

impl YahooClient {
    const USER_AGENT_VALUE: &'static str = "Mozilla/5.0 (X11; Linux x86_64) ticker-anim/1.1";

    /// Create a client for `base_url` (the public endpoint, a mirror or a test server)
    pub fn with_base_url(base_url: String, timeout: Duration) -> Result<Self, ApiError> {
        let http_client = HttpClient::builder()
            .default_headers(Self::create_headers())
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::RequestError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn create_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(USER_AGENT, HeaderValue::from_static(Self::USER_AGENT_VALUE));
        headers
    }

    /// Pull the provider's own error description out of a failed body, if any
    fn provider_description(body_text: &str) -> Option<String> {
        serde_json::from_str::<ChartResponse>(body_text)
            .ok()
            .and_then(|r| r.chart.error)
            .map(|e| e.description)
    }

    /// Parse error response based on HTTP status code
    async fn handle_error_response(
        status: reqwest::StatusCode,
        response: reqwest::Response,
    ) -> ApiError {
        let status_code = status.as_u16();
        let body_text = response.text().await.unwrap_or_default();
        let message = Self::provider_description(&body_text).unwrap_or(body_text);

        match status_code {
            404 => ApiError::NotFound(message),
            429 => {
                warn!("Market data provider is rate limiting requests");
                ApiError::RateLimited(message)
            }
            500..=599 => {
                warn!("Server error {}: {}", status_code, message);
                ApiError::ServerError(status_code, message)
            }
            _ => ApiError::HttpError(status_code, message),
        }
    }

    /// GET /v8/finance/chart/{symbol}
    ///
    /// Requests daily bars for `symbol` from `start` (inclusive) to `end`
    /// (exclusive), both taken at midnight UTC.
    pub async fn get_daily_bars(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyBar>, ApiError> {
        let url = format!("{}/v8/finance/chart/{}", self.base_url, symbol);
        let period1 = start.and_time(NaiveTime::MIN).and_utc().timestamp();
        let period2 = end.and_time(NaiveTime::MIN).and_utc().timestamp();
        debug!("GET {} period1={} period2={}", url, period1, period2);

        let response = self
            .http_client
            .get(&url)
            .query(&[
                ("period1", period1.to_string()),
                ("period2", period2.to_string()),
                ("interval", "1d".to_string()),
                ("events", "history".to_string()),
            ])
            .send()
            .await
            .map_err(|e| ApiError::RequestError(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(Self::handle_error_response(status, response).await);
        }

        let body = response
            .json::<ChartResponse>()
            .await
            .map_err(|e| ApiError::DeserializationError(format!("Failed to parse response: {}", e)))?;

        if let Some(err) = body.chart.error {
            return Err(ApiError::ProviderError(err.code, err.description));
        }

        Ok(body
            .chart
            .result
            .unwrap_or_default()
            .first()
            .map(|r| r.bars())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client_for(server: &mockito::ServerGuard) -> YahooClient {
        YahooClient::with_base_url(server.url(), Duration::from_secs(5)).unwrap()
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn test_get_daily_bars_sends_period_query() {
        let mut server = mockito::Server::new_async().await;
        let body = r#"{"chart": {"result": [{
            "meta": {"gmtoffset": 0},
            "timestamp": [1672704000, 1672790400],
            "indicators": {"quote": [{"close": [10.5, 11.0]}]}
        }], "error": null}}"#;

        let mock = server
            .mock("GET", "/v8/finance/chart/AAPL")
            .match_query(mockito::Matcher::AllOf(vec![
                mockito::Matcher::UrlEncoded("period1".into(), "1672531200".into()),
                mockito::Matcher::UrlEncoded("period2".into(), "1673308800".into()),
                mockito::Matcher::UrlEncoded("interval".into(), "1d".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body)
            .create_async()
            .await;

        let bars = client_for(&server)
            .get_daily_bars("AAPL", day(2023, 1, 1), day(2023, 1, 10))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].date, day(2023, 1, 3));
        assert_eq!(bars[1].close, Some(11.0));
    }

    #[tokio::test]
    async fn test_unknown_symbol_maps_to_not_found() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/v8/finance/chart/NOPE")
            .match_query(mockito::Matcher::Any)
            .with_status(404)
            .with_header("content-type", "application/json")
            .with_body(r#"{"chart": {"result": null, "error": {"code": "Not Found", "description": "No data found, symbol may be delisted"}}}"#)
            .create_async()
            .await;

        let err = client_for(&server)
            .get_daily_bars("NOPE", day(2023, 1, 1), day(2023, 2, 1))
            .await
            .unwrap_err();

        match err {
            ApiError::NotFound(msg) => assert!(msg.contains("delisted")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_server_error_is_reported() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/v8/finance/chart/AAPL")
            .match_query(mockito::Matcher::Any)
            .with_status(503)
            .with_body("unavailable")
            .create_async()
            .await;

        let err = client_for(&server)
            .get_daily_bars("AAPL", day(2023, 1, 1), day(2023, 2, 1))
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::ServerError(503, _)));
    }

    #[tokio::test]
    async fn test_empty_result_yields_no_bars() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/v8/finance/chart/AAPL")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"chart": {"result": [], "error": null}}"#)
            .create_async()
            .await;

        let bars = client_for(&server)
            .get_daily_bars("AAPL", day(2023, 1, 1), day(2023, 2, 1))
            .await
            .unwrap();

        assert!(bars.is_empty());
    }
}
