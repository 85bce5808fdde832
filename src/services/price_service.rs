use tracing::{info, warn};

use crate::api::yahoo::{ApiError, YahooClient};
use crate::models::{AssetClass, ChartRequest, PriceSeries};
use crate::utils::errors::GeneratorError;

/// Quote currency appended to crypto tickers
pub const CRYPTO_QUOTE_SUFFIX: &str = "-USD";

/// Symbol as sent to the provider.
///
/// Crypto tickers get the quote suffix exactly once; `btc` and `BTC-USD`
/// both become `BTC-USD`.
pub fn normalize_symbol(symbol: &str, asset_class: AssetClass) -> String {
    let symbol = symbol.trim().to_uppercase();
    match asset_class {
        AssetClass::Stock => symbol,
        AssetClass::Crypto if symbol.ends_with(CRYPTO_QUOTE_SUFFIX) => symbol,
        AssetClass::Crypto => format!("{}{}", symbol, CRYPTO_QUOTE_SUFFIX),
    }
}

/// Symbol as shown to the user and used in filenames (no quote suffix)
pub fn display_symbol(symbol: &str) -> String {
    let symbol = symbol.trim().to_uppercase();
    symbol
        .strip_suffix(CRYPTO_QUOTE_SUFFIX)
        .map(str::to_string)
        .unwrap_or(symbol)
}

/// Fetch the daily close series for a request.
///
/// The end date is exclusive, so an empty range never reaches the network.
pub async fn fetch_series(
    client: &YahooClient,
    request: &ChartRequest,
) -> Result<PriceSeries, GeneratorError> {
    let symbol = normalize_symbol(&request.symbol, request.asset_class);

    if request.start_date >= request.end_date {
        return Err(GeneratorError::DataUnavailable(format!(
            "No trading days for {} between {} and {}",
            symbol, request.start_date, request.end_date
        )));
    }

    info!(
        "Fetching daily closes for {} from {} to {}",
        symbol, request.start_date, request.end_date
    );

    let bars = client
        .get_daily_bars(&symbol, request.start_date, request.end_date)
        .await
        .map_err(|e| unavailable(&symbol, e))?;

    let series = PriceSeries::from_bars(
        bars.into_iter()
            .filter(|b| b.date >= request.start_date && b.date < request.end_date)
            .collect(),
    );

    if series.is_empty() {
        warn!("Provider returned no closes for {}", symbol);
        return Err(GeneratorError::DataUnavailable(format!(
            "No price data found for {} between {} and {}",
            symbol, request.start_date, request.end_date
        )));
    }

    info!("✓ Found {} daily closes for {}", series.len(), symbol);
    Ok(series)
}

fn unavailable(symbol: &str, error: ApiError) -> GeneratorError {
    warn!("Price request for {} failed: {}", symbol, error);
    GeneratorError::DataUnavailable(format!("Could not fetch {}: {}", symbol, error))
}
