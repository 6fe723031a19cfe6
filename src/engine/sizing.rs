//! Order sizing adapters
//!
//! Two modes: fixed notional per trade (converted to base quantity at the
//! current price) and fixed base quantity. Venue families whose market buys
//! are cost-denominated get a quote-cost amount instead; the adapter is
//! resolved once at startup from the capability table, not branched inline
//! per call.

use crate::config::{SizingConfig, SizingMode};
use crate::exchange::OrderType;
use crate::signal::Side;
use rust_decimal::Decimal;

/// Amount produced by a sizing adapter
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OrderAmount {
    /// Base asset quantity
    BaseQty(Decimal),
    /// Quote currency cost, for cost-denominated market buys.
    /// Never step-rounded and never checked against the base-quantity minimum.
    QuoteCost(Decimal),
}

impl OrderAmount {
    /// The raw amount as submitted to the venue
    pub fn value(&self) -> Decimal {
        match self {
            OrderAmount::BaseQty(q) | OrderAmount::QuoteCost(q) => *q,
        }
    }

    /// Whether this amount is a quote cost rather than a base quantity
    pub fn is_quote_cost(&self) -> bool {
        matches!(self, OrderAmount::QuoteCost(_))
    }

    /// Estimated order notional at the given price
    pub fn est_cost(&self, price: Decimal) -> Decimal {
        match self {
            OrderAmount::QuoteCost(c) => *c,
            OrderAmount::BaseQty(q) => *q * price,
        }
    }

    /// Base quantity implied at the given fill price
    pub fn base_qty(&self, fill_price: Decimal) -> Decimal {
        match self {
            OrderAmount::BaseQty(q) => *q,
            OrderAmount::QuoteCost(c) => {
                if fill_price > Decimal::ZERO {
                    *c / fill_price
                } else {
                    Decimal::ZERO
                }
            }
        }
    }
}

/// How a venue family interprets the amount of a market buy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarketBuyConvention {
    /// Amount is a base quantity
    BaseQuantity,
    /// Amount is a quote cost (e.g. Coinbase Advanced spot)
    QuoteCost,
}

/// Capability table: venue family to market-buy convention
pub fn market_buy_convention(venue: &str) -> MarketBuyConvention {
    match venue.to_lowercase().as_str() {
        "coinbase" => MarketBuyConvention::QuoteCost,
        _ => MarketBuyConvention::BaseQuantity,
    }
}

/// Trait for sizing adapter implementations
pub trait SizingAdapter: Send + Sync {
    /// Compute the order amount for a trade at the current price
    fn size(&self, side: Side, last_price: Decimal) -> OrderAmount;

    /// Get the sizing mode name
    fn mode_name(&self) -> &'static str;
}

/// Fixed quote amount per trade
#[derive(Debug, Clone)]
pub struct NotionalSizer {
    /// Quote amount per trade
    pub notional: Decimal,
    /// Emit buys as a raw quote cost (cost-denominated market buys)
    pub quote_cost_buys: bool,
}

impl SizingAdapter for NotionalSizer {
    fn size(&self, side: Side, last_price: Decimal) -> OrderAmount {
        if self.quote_cost_buys && side == Side::Buy {
            return OrderAmount::QuoteCost(self.notional);
        }
        if last_price > Decimal::ZERO {
            OrderAmount::BaseQty(self.notional / last_price)
        } else {
            OrderAmount::BaseQty(Decimal::ZERO)
        }
    }

    fn mode_name(&self) -> &'static str {
        "notional"
    }
}

/// Fixed base quantity per trade
#[derive(Debug, Clone)]
pub struct QuantitySizer {
    pub quantity: Decimal,
}

impl SizingAdapter for QuantitySizer {
    fn size(&self, _side: Side, _last_price: Decimal) -> OrderAmount {
        OrderAmount::BaseQty(self.quantity)
    }

    fn mode_name(&self) -> &'static str {
        "quantity"
    }
}

/// Resolve the sizing adapter once at startup for the venue/order-type pair
pub fn resolve_adapter(
    cfg: &SizingConfig,
    venue: &str,
    order_type: OrderType,
) -> Box<dyn SizingAdapter> {
    match cfg.mode {
        SizingMode::Notional => {
            let quote_cost_buys = order_type == OrderType::Market
                && market_buy_convention(venue) == MarketBuyConvention::QuoteCost;
            Box::new(NotionalSizer {
                notional: cfg.notional,
                quote_cost_buys,
            })
        }
        SizingMode::Quantity => Box::new(QuantitySizer {
            quantity: cfg.quantity,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sizing(mode: SizingMode) -> SizingConfig {
        SizingConfig {
            mode,
            notional: dec!(50),
            quantity: dec!(0.002),
            round_to_step: true,
        }
    }

    #[test]
    fn test_notional_sizer_base_qty() {
        let sizer = NotionalSizer {
            notional: dec!(50),
            quote_cost_buys: false,
        };
        let amount = sizer.size(Side::Buy, dec!(25000));
        assert_eq!(amount, OrderAmount::BaseQty(dec!(0.002)));
        assert_eq!(amount.est_cost(dec!(25000)), dec!(50));
    }

    #[test]
    fn test_notional_sizer_quote_cost_buy() {
        let sizer = NotionalSizer {
            notional: dec!(50),
            quote_cost_buys: true,
        };
        let buy = sizer.size(Side::Buy, dec!(25000));
        assert_eq!(buy, OrderAmount::QuoteCost(dec!(50)));
        assert!(buy.is_quote_cost());
        // Sells always carry a base quantity
        let sell = sizer.size(Side::Sell, dec!(25000));
        assert_eq!(sell, OrderAmount::BaseQty(dec!(0.002)));
    }

    #[test]
    fn test_quote_cost_base_qty_conversion() {
        let amount = OrderAmount::QuoteCost(dec!(50));
        assert_eq!(amount.base_qty(dec!(25000)), dec!(0.002));
        assert_eq!(amount.base_qty(Decimal::ZERO), Decimal::ZERO);
    }

    #[test]
    fn test_quantity_sizer_ignores_price() {
        let sizer = QuantitySizer {
            quantity: dec!(0.002),
        };
        assert_eq!(
            sizer.size(Side::Buy, dec!(1)),
            OrderAmount::BaseQty(dec!(0.002))
        );
        assert_eq!(
            sizer.size(Side::Sell, dec!(99999)),
            OrderAmount::BaseQty(dec!(0.002))
        );
    }

    #[test]
    fn test_market_buy_convention_table() {
        assert_eq!(
            market_buy_convention("coinbase"),
            MarketBuyConvention::QuoteCost
        );
        assert_eq!(
            market_buy_convention("Coinbase"),
            MarketBuyConvention::QuoteCost
        );
        assert_eq!(
            market_buy_convention("kraken"),
            MarketBuyConvention::BaseQuantity
        );
    }

    #[test]
    fn test_resolve_adapter_notional_market_coinbase() {
        let adapter = resolve_adapter(&sizing(SizingMode::Notional), "coinbase", OrderType::Market);
        assert_eq!(adapter.mode_name(), "notional");
        assert!(adapter.size(Side::Buy, dec!(25000)).is_quote_cost());
    }

    #[test]
    fn test_resolve_adapter_notional_limit_coinbase() {
        // Limit orders always carry a base quantity, even on coinbase
        let adapter = resolve_adapter(&sizing(SizingMode::Notional), "coinbase", OrderType::Limit);
        assert!(!adapter.size(Side::Buy, dec!(25000)).is_quote_cost());
    }

    #[test]
    fn test_resolve_adapter_quantity() {
        let adapter = resolve_adapter(&sizing(SizingMode::Quantity), "coinbase", OrderType::Market);
        assert_eq!(adapter.mode_name(), "quantity");
        assert_eq!(
            adapter.size(Side::Buy, dec!(25000)),
            OrderAmount::BaseQty(dec!(0.002))
        );
    }
}
