//! Coinbase Exchange public REST API client
//!
//! Fetches historical candles and ticker prices. Public endpoints only,
//! no authentication.

use crate::collector::MarketData;
use crate::domain::{MarketId, PriceSeries};
use crate::error::{GambitError, Result};
use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

/// Client for the Coinbase Exchange public API
#[derive(Debug, Clone)]
pub struct CoinbaseClient {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct TickerResponse {
    price: String,
}

impl CoinbaseClient {
    /// Create a new client with a per-request timeout
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    /// Parse one candle row. Coinbase returns
    /// `[time, low, high, open, close, volume]`, newest first.
    fn parse_candle_row(row: &[serde_json::Value]) -> Option<(i64, Decimal)> {
        let time = row.first()?.as_i64()?;
        let close = decimal_field(row.get(4)?)?;
        Some((time, close))
    }
}

/// Convert a JSON number or string field into a Decimal without a float
/// round-trip for string payloads.
fn decimal_field(value: &serde_json::Value) -> Option<Decimal> {
    match value {
        serde_json::Value::Number(n) => Decimal::from_str(&n.to_string()).ok(),
        serde_json::Value::String(s) => Decimal::from_str(s).ok(),
        _ => None,
    }
}

#[async_trait]
impl MarketData for CoinbaseClient {
    async fn fetch_series(
        &self,
        market: &MarketId,
        lookback_candles: usize,
        granularity_secs: u32,
    ) -> Result<PriceSeries> {
        let end = Utc::now();
        let span = ChronoDuration::seconds(lookback_candles as i64 * granularity_secs as i64);
        let start = end - span;

        let url = format!("{}/products/{}/candles", self.base_url, market);
        debug!("Fetching candles: {} ({} x {}s)", url, lookback_candles, granularity_secs);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("start", start.to_rfc3339()),
                ("end", end.to_rfc3339()),
                ("granularity", granularity_secs.to_string()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(GambitError::MarketDataUnavailable(format!(
                "candles API returned {} for {}",
                response.status(),
                market
            )));
        }

        let rows: Vec<Vec<serde_json::Value>> = response.json().await?;

        let mut candles: Vec<(i64, Decimal)> = rows
            .iter()
            .filter_map(|row| Self::parse_candle_row(row))
            .collect();
        if candles.is_empty() {
            return Err(GambitError::MarketDataUnavailable(format!(
                "no candles returned for {}",
                market
            )));
        }

        // API order is newest first; the series must be chronological.
        candles.sort_by_key(|(time, _)| *time);
        let closes = candles.into_iter().map(|(_, close)| close).collect();

        Ok(PriceSeries::new(closes))
    }

    async fn fetch_latest_price(&self, market: &MarketId) -> Result<Decimal> {
        let url = format!("{}/products/{}/ticker", self.base_url, market);
        debug!("Fetching ticker: {}", url);

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(GambitError::MarketDataUnavailable(format!(
                "ticker API returned {} for {}",
                response.status(),
                market
            )));
        }

        let ticker: TickerResponse = response.json().await?;
        Decimal::from_str(&ticker.price).map_err(|e| {
            GambitError::InvalidMarketData(format!(
                "unparseable ticker price {:?} for {}: {}",
                ticker.price, market, e
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_parse_candle_row() {
        // [time, low, high, open, close, volume]
        let row = vec![
            json!(1700000000),
            json!(99.5),
            json!(101.0),
            json!(100.0),
            json!(100.25),
            json!(12.5),
        ];
        assert_eq!(
            CoinbaseClient::parse_candle_row(&row),
            Some((1700000000, dec!(100.25)))
        );
    }

    #[test]
    fn test_parse_candle_row_string_close() {
        let row = vec![
            json!(1700000000),
            json!("99.5"),
            json!("101.0"),
            json!("100.0"),
            json!("100.25"),
            json!("12.5"),
        ];
        assert_eq!(
            CoinbaseClient::parse_candle_row(&row),
            Some((1700000000, dec!(100.25)))
        );
    }

    #[test]
    fn test_parse_candle_row_rejects_garbage() {
        assert_eq!(CoinbaseClient::parse_candle_row(&[]), None);

        let row = vec![json!("not-a-time"), json!(1), json!(1), json!(1), json!(1)];
        assert_eq!(CoinbaseClient::parse_candle_row(&row), None);
    }
}
