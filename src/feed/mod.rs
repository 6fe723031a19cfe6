//! Price history feed module
//!
//! Spot price, daily OHLC bars, and minute-resolution price series from
//! CoinGecko, behind an abstract [`PriceFeed`] capability.

mod coingecko;
mod retry;
mod types;

pub use coingecko::CoinGeckoClient;
pub use retry::RetryPolicy;
pub use types::{Bar, FeedError};

use async_trait::async_trait;
use rust_decimal::Decimal;

/// Trait for price feed implementations
#[async_trait]
pub trait PriceFeed: Send + Sync {
    /// Latest spot price for the configured pair
    async fn last_price(&self) -> Result<Decimal, FeedError>;

    /// Daily OHLC bars covering the last `days` days
    async fn daily_bars(&self, days: u32) -> Result<Vec<Bar>, FeedError>;

    /// Minute-resolution (timestamp_ms, price) samples for the last `days` days
    async fn minute_series(&self, days: u32) -> Result<Vec<(i64, Decimal)>, FeedError>;
}
