//! Exchange module
//!
//! Venue capability consumed by the engine: pair validation, order limits,
//! step rounding, and order placement. The built-in implementation is the
//! paper engine; live submission plugs in behind the same trait.

mod paper;
mod types;

pub use paper::PaperExchange;
pub use types::{ExchangeError, OrderFill, OrderId, OrderType, PairLimits};

use crate::signal::Side;
use async_trait::async_trait;
use rust_decimal::Decimal;

/// Trait for exchange implementations
#[async_trait]
pub trait Exchange: Send + Sync {
    /// Venue identifier (e.g. "coinbase")
    fn venue(&self) -> &str;

    /// Check that the configured pair is tradable on this venue
    async fn validate_pair(&self) -> Result<(), ExchangeError>;

    /// Minimum order sizes and quantization steps for the pair
    fn limits(&self) -> PairLimits;

    /// Quantize a base quantity down to the venue amount step
    fn round_amount(&self, amount: Decimal) -> Decimal;

    /// Quantize a price down to the venue price step
    fn round_price(&self, price: Decimal) -> Decimal;

    /// Place an order. `price` is required for limit orders; for market
    /// orders it carries the engine's fill-price assumption.
    async fn place_order(
        &self,
        side: Side,
        order_type: OrderType,
        amount: Decimal,
        price: Option<Decimal>,
    ) -> Result<OrderFill, ExchangeError>;
}
