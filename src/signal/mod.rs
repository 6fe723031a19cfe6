//! Band breakout signal generation
//!
//! Two-state machine over the flat/long position model: enter on a drop of
//! k·ATR below the last reference price, exit on a rise of k·ATR above it
//! (or a stop-loss band below the entry). Pure function of its inputs; all
//! persistence lives in [`crate::state::BotState`].

use crate::config::StrategyConfig;
use crate::state::Mode;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Trading side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Buy => write!(f, "buy"),
            Side::Sell => write!(f, "sell"),
        }
    }
}

/// Why a signal fired
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignalReason {
    /// Price broke below the entry band
    BandBreakout,
    /// Price rose above the take-profit band
    TakeProfit,
    /// Price fell below the stop-loss band
    StopLoss,
}

/// A trading signal with an optional suggested stop price.
/// The stop price is informational only; nothing downstream enforces it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Signal {
    pub side: Side,
    pub stop_price: Option<Decimal>,
    pub reason: SignalReason,
}

/// ATR band strategy parameters
#[derive(Debug, Clone, Copy)]
pub struct BandParams {
    /// Entry/exit band multiplier
    pub k: Decimal,
    /// Enable the stop-loss exit path
    pub stop_enabled: bool,
    /// Stop-loss band multiplier
    pub stop_loss_atr: Decimal,
}

impl From<&StrategyConfig> for BandParams {
    fn from(cfg: &StrategyConfig) -> Self {
        Self {
            k: cfg.k,
            stop_enabled: cfg.stop_enabled,
            stop_loss_atr: cfg.stop_loss_atr,
        }
    }
}

/// ATR band breakout strategy
#[derive(Debug, Clone)]
pub struct AtrStrategy {
    params: BandParams,
}

impl AtrStrategy {
    /// Create a new strategy with the given band parameters
    pub fn new(params: BandParams) -> Self {
        Self { params }
    }

    /// Generate a signal for the current tick.
    ///
    /// Refuses to signal without a strictly positive ATR: at zero volatility
    /// any price move would trivially qualify as a breakout.
    pub fn signal(
        &self,
        price: Decimal,
        atr: Option<Decimal>,
        mode: Mode,
        ref_price: Option<Decimal>,
    ) -> Option<Signal> {
        let atr = match atr {
            Some(a) if a > Decimal::ZERO => a,
            _ => return None,
        };

        match mode {
            Mode::Flat => {
                let baseline = ref_price.unwrap_or(price);
                let trigger = baseline - self.params.k * atr;
                if price <= trigger {
                    let stop_price = self
                        .params
                        .stop_enabled
                        .then(|| price - self.params.stop_loss_atr * atr);
                    return Some(Signal {
                        side: Side::Buy,
                        stop_price,
                        reason: SignalReason::BandBreakout,
                    });
                }
                None
            }
            Mode::Long => {
                let baseline = ref_price.unwrap_or(price);
                let trigger = baseline + self.params.k * atr;
                if price >= trigger {
                    return Some(Signal {
                        side: Side::Sell,
                        stop_price: None,
                        reason: SignalReason::TakeProfit,
                    });
                }
                if self.params.stop_enabled {
                    if let Some(entry) = ref_price {
                        if price <= entry - self.params.stop_loss_atr * atr {
                            tracing::info!(%price, %entry, "stop-loss trigger reached");
                            return Some(Signal {
                                side: Side::Sell,
                                stop_price: None,
                                reason: SignalReason::StopLoss,
                            });
                        }
                    }
                }
                None
            }
        }
    }
}
