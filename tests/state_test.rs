//! Integration tests for state persistence
//!
//! Exercises the load/save cycle the way the process uses it across
//! restarts: atomic rewrites, day rollover, and tolerance of leftover
//! temp files from a simulated crash.

use atr_bot::state::{load_state, save_state, today_key, BotState, Mode};
use rust_decimal_macros::dec;

#[test]
fn test_restart_cycle_preserves_ledger() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");

    // First run: no file, defaults
    let mut state = load_state(&path).unwrap();
    assert_eq!(state, BotState::default());

    // Trade happened; persist
    state.mode = Mode::Long;
    state.ref_price = Some(dec!(42000));
    state.position_qty = dec!(0.001);
    state.realized_pnl = dec!(-3.2);
    state.trades_today = 2;
    save_state(&path, &state).unwrap();

    // "Restart": reload and compare
    let reloaded = load_state(&path).unwrap();
    assert_eq!(reloaded, state);
}

#[test]
fn test_crash_mid_write_leaves_valid_state() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");

    let mut state = BotState::default();
    state.realized_pnl = dec!(7.5);
    save_state(&path, &state).unwrap();

    // Simulate a crash mid-write: a torn temp file next to the target.
    // The rename-over pattern means the target itself is never partial.
    std::fs::write(dir.path().join(".tmpXyZ123"), "{\"mode\": \"LO").unwrap();

    let reloaded = load_state(&path).unwrap();
    assert_eq!(reloaded.realized_pnl, dec!(7.5));
}

#[test]
fn test_rollover_on_restart_after_day_change() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");

    let state = BotState {
        day_key: "1999-12-31".to_string(),
        trades_today: 9,
        realized_pnl: dec!(120),
        realized_pnl_today: dec!(-40),
        equity_start_of_day: dec!(160),
        ..BotState::default()
    };
    save_state(&path, &state).unwrap();

    let rolled = load_state(&path).unwrap();
    assert_eq!(rolled.day_key, today_key());
    assert_eq!(rolled.trades_today, 0);
    assert_eq!(rolled.realized_pnl_today, dec!(0));
    assert_eq!(rolled.equity_start_of_day, dec!(120));
    assert_eq!(rolled.realized_pnl, dec!(120));
}

#[test]
fn test_missing_fields_default() {
    // Older state files may lack newer fields; they must still load
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");
    std::fs::write(
        &path,
        format!(
            "{{\"mode\": \"FLAT\", \"ref_price\": \"42000\", \"day_key\": \"{}\"}}",
            today_key()
        ),
    )
    .unwrap();

    let state = load_state(&path).unwrap();
    assert_eq!(state.mode, Mode::Flat);
    assert_eq!(state.ref_price, Some(dec!(42000)));
    assert_eq!(state.trades_today, 0);
    assert!(state.last_trade_ts.is_none());
}
