//! Position/PnL ledger transitions
//!
//! Pure state transitions applied by the orchestration loop on each fill.
//! Buys open or add to the single position; sells always close it entirely.

use super::sizing::OrderAmount;
use crate::risk::RiskManager;
use crate::signal::Side;
use crate::state::{BotState, Mode};
use rust_decimal::Decimal;

/// Outcome of one applied fill
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TradeRecord {
    pub side: Side,
    pub fill_price: Decimal,
    /// Base quantity bought or sold
    pub quantity: Decimal,
    /// Fee charged on this transition
    pub fee: Decimal,
    /// Realized PnL, present on sells only
    pub pnl: Option<Decimal>,
}

/// Apply a buy fill: enter (or extend) the long position.
/// Quote-cost amounts are converted to base quantity at the fill price.
/// The fee estimate covers the entry leg only.
pub fn apply_buy(
    state: &mut BotState,
    risk: &RiskManager,
    fill_price: Decimal,
    amount: &OrderAmount,
    now_ms: i64,
) -> TradeRecord {
    let quantity = amount.base_qty(fill_price);

    state.mode = Mode::Long;
    state.ref_price = Some(fill_price);
    state.position_qty += quantity;

    let fee = risk.apply_fees(quantity * fill_price);
    state.cum_fees += fee;
    state.last_trade_ts = Some(now_ms);
    state.trades_today += 1;

    TradeRecord {
        side: Side::Buy,
        fill_price,
        quantity,
        fee,
        pnl: None,
    }
}

/// Apply a sell fill closing the entire position.
/// Cost basis anchors to the entry reference price (fill price when unset);
/// the fee estimate covers both legs of the round trip.
pub fn apply_sell(
    state: &mut BotState,
    risk: &RiskManager,
    fill_price: Decimal,
    quantity: Decimal,
    now_ms: i64,
) -> TradeRecord {
    let proceeds = quantity * fill_price;
    let cost_basis = quantity * state.ref_price.unwrap_or(fill_price);
    let fee = risk.apply_fees(proceeds) + risk.apply_fees(cost_basis);
    let pnl = proceeds - cost_basis - fee;

    state.realized_pnl += pnl;
    state.realized_pnl_today += pnl;
    state.cum_fees += fee;
    state.mode = Mode::Flat;
    state.ref_price = Some(fill_price);
    state.position_qty = Decimal::ZERO;
    state.last_trade_ts = Some(now_ms);
    state.trades_today += 1;

    TradeRecord {
        side: Side::Sell,
        fill_price,
        quantity,
        fee,
        pnl: Some(pnl),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RiskConfig;
    use rust_decimal_macros::dec;

    fn risk(taker_fee_pct: Decimal) -> RiskManager {
        RiskManager::new(RiskConfig {
            max_trades_per_day: 10,
            cooldown_seconds: 60,
            max_daily_loss_pct: dec!(0),
            start_equity: dec!(1000),
            taker_fee_pct,
        })
    }

    #[test]
    fn test_buy_opens_long() {
        let mut state = BotState::default();
        let risk = risk(dec!(0.1));

        let record = apply_buy(
            &mut state,
            &risk,
            dec!(100),
            &OrderAmount::BaseQty(dec!(2)),
            1_000,
        );

        assert_eq!(state.mode, Mode::Long);
        assert_eq!(state.ref_price, Some(dec!(100)));
        assert_eq!(state.position_qty, dec!(2));
        assert_eq!(state.trades_today, 1);
        assert_eq!(state.last_trade_ts, Some(1_000));
        // 0.1% of 200 notional
        assert_eq!(record.fee, dec!(0.2));
        assert_eq!(state.cum_fees, dec!(0.2));
        assert!(record.pnl.is_none());
    }

    #[test]
    fn test_buy_quote_cost_converts_to_base() {
        let mut state = BotState::default();
        let risk = risk(dec!(0));

        let record = apply_buy(
            &mut state,
            &risk,
            dec!(25000),
            &OrderAmount::QuoteCost(dec!(50)),
            1_000,
        );

        assert_eq!(record.quantity, dec!(0.002));
        assert_eq!(state.position_qty, dec!(0.002));
    }

    #[test]
    fn test_round_trip_zero_fee_is_pnl_neutral() {
        let mut state = BotState::default();
        let risk = risk(dec!(0));

        apply_buy(
            &mut state,
            &risk,
            dec!(100),
            &OrderAmount::BaseQty(dec!(1.5)),
            1_000,
        );
        let record = apply_sell(&mut state, &risk, dec!(100), dec!(1.5), 2_000);

        assert_eq!(record.pnl, Some(dec!(0)));
        assert_eq!(state.realized_pnl, dec!(0));
        assert_eq!(state.position_qty, dec!(0));
        assert_eq!(state.mode, Mode::Flat);
        assert_eq!(state.trades_today, 2);
    }

    #[test]
    fn test_round_trip_fees_cost_twice_single_leg() {
        let mut state = BotState::default();
        let risk = risk(dec!(0.1));

        apply_buy(
            &mut state,
            &risk,
            dec!(100),
            &OrderAmount::BaseQty(dec!(1)),
            1_000,
        );
        let single_leg = risk.apply_fees(dec!(100));
        apply_sell(&mut state, &risk, dec!(100), dec!(1), 2_000);

        // Same price both ways: PnL drops by exactly the double-sided fee
        assert_eq!(state.realized_pnl, -(single_leg * dec!(2)));
        assert_eq!(state.realized_pnl_today, state.realized_pnl);
    }

    #[test]
    fn test_sell_profit_against_ref_price() {
        let mut state = BotState::default();
        let risk = risk(dec!(0));
        state.mode = Mode::Long;
        state.ref_price = Some(dec!(100));
        state.position_qty = dec!(2);

        let record = apply_sell(&mut state, &risk, dec!(110), dec!(2), 3_000);

        // proceeds 220, cost basis 200
        assert_eq!(record.pnl, Some(dec!(20)));
        assert_eq!(state.realized_pnl, dec!(20));
        assert_eq!(state.ref_price, Some(dec!(110)));
    }

    #[test]
    fn test_sell_without_ref_price_uses_fill() {
        let mut state = BotState::default();
        let risk = risk(dec!(0));
        state.mode = Mode::Long;
        state.position_qty = dec!(1);
        state.ref_price = None;

        let record = apply_sell(&mut state, &risk, dec!(105), dec!(1), 3_000);
        assert_eq!(record.pnl, Some(dec!(0)));
    }

    #[test]
    fn test_buy_extends_existing_position() {
        let mut state = BotState::default();
        let risk = risk(dec!(0));
        state.mode = Mode::Long;
        state.ref_price = Some(dec!(90));
        state.position_qty = dec!(1);

        apply_buy(
            &mut state,
            &risk,
            dec!(80),
            &OrderAmount::BaseQty(dec!(1)),
            4_000,
        );

        assert_eq!(state.position_qty, dec!(2));
        // Reference re-anchors to the latest fill
        assert_eq!(state.ref_price, Some(dec!(80)));
    }
}
