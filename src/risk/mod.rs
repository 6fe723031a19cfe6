//! Risk gate and fee model
//!
//! Stateless predicate over trade-frequency, cooldown, and daily-loss limits.
//! Holds no counters of its own; everything it needs arrives as arguments.

use crate::config::RiskConfig;
use rust_decimal::Decimal;
use thiserror::Error;

/// Why the risk gate vetoed a trade. Checks are ordered; the first failing
/// reason wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RiskBlock {
    #[error("max trades per day reached")]
    MaxTradesPerDay,
    #[error("in cooldown")]
    Cooldown,
    #[error("daily loss kill-switch triggered")]
    DailyLossKillSwitch,
}

/// Risk gate over the per-day trading counters
#[derive(Debug, Clone)]
pub struct RiskManager {
    cfg: RiskConfig,
}

impl RiskManager {
    /// Create a risk manager with the given limits
    pub fn new(cfg: RiskConfig) -> Self {
        Self { cfg }
    }

    /// Decide whether a new trade is allowed right now.
    ///
    /// The daily-loss check re-evaluates every tick rather than latching;
    /// since realized PnL only changes on closed trades it stays tripped for
    /// the rest of the day in practice.
    pub fn can_trade(
        &self,
        now_ms: i64,
        trades_today: u32,
        last_trade_ts: Option<i64>,
        realized_pnl_today: Decimal,
    ) -> Result<(), RiskBlock> {
        if trades_today >= self.cfg.max_trades_per_day {
            return Err(RiskBlock::MaxTradesPerDay);
        }
        if let Some(last) = last_trade_ts {
            if now_ms - last < self.cfg.cooldown_seconds as i64 * 1000 {
                return Err(RiskBlock::Cooldown);
            }
        }
        if self.cfg.max_daily_loss_pct > Decimal::ZERO {
            let threshold =
                -(self.cfg.max_daily_loss_pct / Decimal::ONE_HUNDRED * self.cfg.start_equity).abs();
            if realized_pnl_today <= threshold {
                return Err(RiskBlock::DailyLossKillSwitch);
            }
        }
        Ok(())
    }

    /// One-sided taker fee estimate for a trade leg of the given notional
    pub fn apply_fees(&self, notional: Decimal) -> Decimal {
        notional.abs() * self.cfg.taker_fee_pct / Decimal::ONE_HUNDRED
    }
}
