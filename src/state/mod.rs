//! Persisted bot state
//!
//! Single-instance position/PnL ledger state, written atomically after every
//! mutation and rolled over at the UTC day boundary on load.

use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;
use thiserror::Error;

/// Position mode: flat or long, nothing in between
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Mode {
    #[default]
    Flat,
    Long,
}

/// State persistence errors
#[derive(Debug, Error)]
pub enum StateError {
    #[error("state io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("state file is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

/// The persistent ledger state, one instance per bot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BotState {
    /// Current position mode
    #[serde(default)]
    pub mode: Mode,
    /// Price anchor from the last fill, trigger baseline for the next signal
    #[serde(default)]
    pub ref_price: Option<Decimal>,
    /// Base quantity currently held
    #[serde(default)]
    pub position_qty: Decimal,
    /// Cumulative realized profit in quote currency
    #[serde(default)]
    pub realized_pnl: Decimal,
    /// Cumulative fees paid
    #[serde(default)]
    pub cum_fees: Decimal,
    /// Trades executed since the last day rollover
    #[serde(default)]
    pub trades_today: u32,
    /// Epoch milliseconds of the last executed trade
    #[serde(default)]
    pub last_trade_ts: Option<i64>,
    /// Realized PnL snapshot taken at the day boundary
    #[serde(default)]
    pub equity_start_of_day: Decimal,
    /// Realized profit since the last day rollover
    #[serde(default)]
    pub realized_pnl_today: Decimal,
    /// UTC calendar day (YYYY-MM-DD) the daily counters belong to
    #[serde(default)]
    pub day_key: String,
}

impl Default for BotState {
    fn default() -> Self {
        Self {
            mode: Mode::Flat,
            ref_price: None,
            position_qty: Decimal::ZERO,
            realized_pnl: Decimal::ZERO,
            cum_fees: Decimal::ZERO,
            trades_today: 0,
            last_trade_ts: None,
            equity_start_of_day: Decimal::ZERO,
            realized_pnl_today: Decimal::ZERO,
            day_key: today_key(),
        }
    }
}

impl BotState {
    /// Reset daily counters when the persisted day differs from `today`
    pub fn rollover(&mut self, today: &str) {
        if self.day_key != today {
            self.trades_today = 0;
            self.realized_pnl_today = Decimal::ZERO;
            self.equity_start_of_day = self.realized_pnl;
            self.day_key = today.to_string();
        }
    }
}

/// Current UTC calendar day as YYYY-MM-DD
pub fn today_key() -> String {
    Utc::now().format("%Y-%m-%d").to_string()
}

/// Load state from `path`, constructing defaults when the file does not exist.
/// Rolls daily counters over when the persisted day differs from today.
pub fn load_state(path: impl AsRef<Path>) -> Result<BotState, StateError> {
    let path = path.as_ref();
    let mut state = match std::fs::read_to_string(path) {
        Ok(content) => serde_json::from_str::<BotState>(&content)?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => BotState::default(),
        Err(e) => return Err(e.into()),
    };
    state.rollover(&today_key());
    Ok(state)
}

/// Persist state atomically: write to a temp file in the same directory and
/// rename over the target, so a crash mid-write never leaves a torn file.
pub fn save_state(path: impl AsRef<Path>, state: &BotState) -> Result<(), StateError> {
    let path = path.as_ref();
    let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
    if let Some(dir) = dir {
        std::fs::create_dir_all(dir)?;
    }
    let mut tmp = tempfile::NamedTempFile::new_in(dir.unwrap_or_else(|| Path::new(".")))?;
    serde_json::to_writer_pretty(&mut tmp, state)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| StateError::Io(e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_default_state_is_flat_today() {
        let state = BotState::default();
        assert_eq!(state.mode, Mode::Flat);
        assert_eq!(state.position_qty, Decimal::ZERO);
        assert_eq!(state.day_key, today_key());
        assert!(state.ref_price.is_none());
        assert!(state.last_trade_ts.is_none());
    }

    #[test]
    fn test_load_missing_file_constructs_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let state = load_state(dir.path().join("missing.json")).unwrap();
        assert_eq!(state, BotState::default());
    }

    #[test]
    fn test_save_then_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");

        let mut state = BotState::default();
        state.mode = Mode::Long;
        state.ref_price = Some(dec!(42500.50));
        state.position_qty = dec!(0.0012);
        state.realized_pnl = dec!(12.34);
        state.trades_today = 3;
        state.last_trade_ts = Some(1_704_067_200_123);

        save_state(&path, &state).unwrap();
        let loaded = load_state(&path).unwrap();
        assert_eq!(loaded, state);
    }

    #[test]
    fn test_day_rollover_resets_counters() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");

        let mut state = BotState::default();
        state.day_key = "2020-01-01".to_string();
        state.trades_today = 7;
        state.realized_pnl = dec!(55);
        state.realized_pnl_today = dec!(-10);
        save_state(&path, &state).unwrap();

        let loaded = load_state(&path).unwrap();
        assert_eq!(loaded.day_key, today_key());
        assert_eq!(loaded.trades_today, 0);
        assert_eq!(loaded.realized_pnl_today, Decimal::ZERO);
        assert_eq!(loaded.equity_start_of_day, dec!(55));
        // Cumulative fields survive the rollover
        assert_eq!(loaded.realized_pnl, dec!(55));
    }

    #[test]
    fn test_rollover_same_day_is_noop() {
        let mut state = BotState::default();
        state.trades_today = 4;
        state.realized_pnl_today = dec!(2);
        let day = state.day_key.clone();
        state.rollover(&day);
        assert_eq!(state.trades_today, 4);
        assert_eq!(state.realized_pnl_today, dec!(2));
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(load_state(&path), Err(StateError::Parse(_))));
    }

    #[test]
    fn test_save_never_leaves_torn_file() {
        // A crash between temp-write and rename leaves the previous state
        // intact; after any completed save the file parses as the new state.
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");

        let old = BotState::default();
        save_state(&path, &old).unwrap();

        let mut new = old.clone();
        new.realized_pnl = dec!(99.9);
        save_state(&path, &new).unwrap();

        // No temp droppings, and the target parses as the latest state
        let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
        assert_eq!(load_state(&path).unwrap(), new);
    }

    #[test]
    fn test_mode_serializes_uppercase() {
        let json = serde_json::to_string(&Mode::Long).unwrap();
        assert_eq!(json, "\"LONG\"");
        let mode: Mode = serde_json::from_str("\"FLAT\"").unwrap();
        assert_eq!(mode, Mode::Flat);
    }
}
