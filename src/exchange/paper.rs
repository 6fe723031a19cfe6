//! Paper trading exchange
//!
//! Simulated venue: immediate fills at the submitted price, limits and step
//! sizes taken from configuration. No live submission, no balance queries.

use super::{Exchange, ExchangeError, OrderFill, OrderId, OrderType, PairLimits};
use crate::config::{ExchangeConfig, MarketConfig};
use crate::signal::Side;
use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Quantize `value` down to a multiple of `step`; zero step passes through
fn quantize_down(value: Decimal, step: Decimal) -> Decimal {
    if step <= Decimal::ZERO {
        value
    } else {
        (value / step).floor() * step
    }
}

/// Paper exchange with simulated fills
pub struct PaperExchange {
    venue: String,
    pair: String,
    limits: PairLimits,
    fills: Arc<RwLock<Vec<OrderFill>>>,
}

impl PaperExchange {
    /// Create a paper exchange for one pair
    pub fn new(venue: impl Into<String>, pair: impl Into<String>, limits: PairLimits) -> Self {
        Self {
            venue: venue.into(),
            pair: pair.into(),
            limits,
            fills: Arc::new(RwLock::new(vec![])),
        }
    }

    /// Build from configuration sections
    pub fn from_config(exchange: &ExchangeConfig, market: &MarketConfig) -> Self {
        Self::new(
            exchange.id.clone(),
            market.pair.clone(),
            PairLimits {
                min_amount: market.min_amount,
                min_cost: market.min_cost,
                amount_step: market.amount_step,
                price_step: market.price_step,
            },
        )
    }

    /// All simulated fills so far
    pub async fn fills(&self) -> Vec<OrderFill> {
        self.fills.read().await.clone()
    }
}

#[async_trait]
impl Exchange for PaperExchange {
    fn venue(&self) -> &str {
        &self.venue
    }

    async fn validate_pair(&self) -> Result<(), ExchangeError> {
        let mut parts = self.pair.splitn(2, '/');
        let base = parts.next().unwrap_or_default();
        let quote = parts.next().unwrap_or_default();
        if base.is_empty() || quote.is_empty() {
            return Err(ExchangeError::PairNotTradable {
                pair: self.pair.clone(),
                reason: "expected BASE/QUOTE symbol".to_string(),
            });
        }
        Ok(())
    }

    fn limits(&self) -> PairLimits {
        self.limits
    }

    fn round_amount(&self, amount: Decimal) -> Decimal {
        quantize_down(amount, self.limits.amount_step)
    }

    fn round_price(&self, price: Decimal) -> Decimal {
        quantize_down(price, self.limits.price_step)
    }

    async fn place_order(
        &self,
        side: Side,
        order_type: OrderType,
        amount: Decimal,
        price: Option<Decimal>,
    ) -> Result<OrderFill, ExchangeError> {
        if amount <= Decimal::ZERO {
            return Err(ExchangeError::NonPositiveAmount { amount });
        }
        let fill_price = match (order_type, price) {
            (OrderType::Limit, None) => return Err(ExchangeError::MissingLimitPrice),
            (_, Some(p)) => p,
            (OrderType::Market, None) => {
                return Err(ExchangeError::Rejected(
                    "paper fill requires a reference price".to_string(),
                ))
            }
        };

        let fill = OrderFill {
            order_id: OrderId::new_v4(),
            pair: self.pair.clone(),
            side,
            price: fill_price,
            amount,
            timestamp: Utc::now(),
        };

        let mut fills = self.fills.write().await;
        fills.push(fill.clone());

        tracing::info!(
            order_id = %fill.order_id,
            %side,
            ?order_type,
            %amount,
            price = %fill_price,
            "paper order filled"
        );
        Ok(fill)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn exchange() -> PaperExchange {
        PaperExchange::new(
            "coinbase",
            "BTC/USDC",
            PairLimits {
                min_amount: dec!(0.0001),
                min_cost: dec!(1),
                amount_step: dec!(0.00001),
                price_step: dec!(0.01),
            },
        )
    }

    #[test]
    fn test_quantize_down() {
        assert_eq!(quantize_down(dec!(0.12349), dec!(0.0001)), dec!(0.1234));
        assert_eq!(quantize_down(dec!(0.12349), Decimal::ZERO), dec!(0.12349));
        assert_eq!(quantize_down(dec!(5), dec!(1)), dec!(5));
    }

    #[tokio::test]
    async fn test_validate_pair() {
        assert!(exchange().validate_pair().await.is_ok());

        let bad = PaperExchange::new("coinbase", "BTCUSDC", exchange().limits());
        assert!(matches!(
            bad.validate_pair().await,
            Err(ExchangeError::PairNotTradable { .. })
        ));
    }

    #[tokio::test]
    async fn test_paper_fill_echoes_order() {
        let ex = exchange();
        let fill = ex
            .place_order(Side::Buy, OrderType::Market, dec!(0.001), Some(dec!(50000)))
            .await
            .unwrap();
        assert_eq!(fill.side, Side::Buy);
        assert_eq!(fill.amount, dec!(0.001));
        assert_eq!(fill.price, dec!(50000));

        let fills = ex.fills().await;
        assert_eq!(fills.len(), 1);
        assert_eq!(fills[0].order_id, fill.order_id);
    }

    #[tokio::test]
    async fn test_limit_order_requires_price() {
        let ex = exchange();
        let result = ex
            .place_order(Side::Sell, OrderType::Limit, dec!(0.001), None)
            .await;
        assert!(matches!(result, Err(ExchangeError::MissingLimitPrice)));
    }

    #[tokio::test]
    async fn test_rejects_non_positive_amount() {
        let ex = exchange();
        let result = ex
            .place_order(Side::Buy, OrderType::Market, dec!(0), Some(dec!(50000)))
            .await;
        assert!(matches!(
            result,
            Err(ExchangeError::NonPositiveAmount { .. })
        ));
    }

    #[test]
    fn test_round_amount_and_price() {
        let ex = exchange();
        assert_eq!(ex.round_amount(dec!(0.000123456)), dec!(0.00012));
        assert_eq!(ex.round_price(dec!(50000.019)), dec!(50000.01));
    }
}
