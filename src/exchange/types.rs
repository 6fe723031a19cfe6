//! Exchange types

use crate::signal::Side;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Order identifier
pub type OrderId = Uuid;

/// Order type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderType {
    Market,
    Limit,
}

/// Venue order limits for a trading pair
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PairLimits {
    /// Minimum base quantity per order
    pub min_amount: Decimal,
    /// Minimum order notional in quote currency
    pub min_cost: Decimal,
    /// Base quantity step size; zero disables quantization
    pub amount_step: Decimal,
    /// Price step size; zero disables quantization
    pub price_step: Decimal,
}

/// An executed (or simulated) order fill
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderFill {
    pub order_id: OrderId,
    pub pair: String,
    pub side: Side,
    /// Fill price assumed for accounting
    pub price: Decimal,
    /// Amount as submitted: base quantity, or quote cost for
    /// cost-denominated market buys
    pub amount: Decimal,
    pub timestamp: DateTime<Utc>,
}

/// Exchange errors
#[derive(Debug, Error)]
pub enum ExchangeError {
    #[error("pair {pair} is not tradable: {reason}")]
    PairNotTradable { pair: String, reason: String },
    #[error("order amount {amount} is not positive")]
    NonPositiveAmount { amount: Decimal },
    #[error("limit order requires a price")]
    MissingLimitPrice,
    #[error("order rejected by venue: {0}")]
    Rejected(String),
}
