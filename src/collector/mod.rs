//! Market data collection.
//!
//! The engine only depends on the [`MarketData`] trait; the Coinbase
//! Exchange client is the one concrete provider. Fetch failures are
//! ordinary errors the caller absorbs, never fatal to the engine loop.

mod coinbase;

pub use coinbase::CoinbaseClient;

use crate::domain::{MarketId, PriceSeries};
use crate::error::Result;
use async_trait::async_trait;
use rust_decimal::Decimal;

/// Read-only source of candles and spot prices for a market.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MarketData: Send + Sync {
    /// Chronological close series over a lookback window, oldest first.
    async fn fetch_series(
        &self,
        market: &MarketId,
        lookback_candles: usize,
        granularity_secs: u32,
    ) -> Result<PriceSeries>;

    /// Single latest trade price.
    async fn fetch_latest_price(&self, market: &MarketId) -> Result<Decimal>;
}
