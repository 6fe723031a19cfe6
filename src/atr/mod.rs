//! ATR (Average True Range) engine
//!
//! Volatility estimate from daily bars, with a minute-resolution price-series
//! fallback when bar history is unavailable. Both paths reduce true ranges
//! with a simple moving average over the configured window; the SMA
//! approximation (rather than Wilder's exponential smoothing) is intentional.

use crate::feed::Bar;
use rust_decimal::Decimal;

/// True range of a bar given the previous close
fn true_range(high: Decimal, low: Decimal, prev_close: Decimal) -> Decimal {
    (high - low)
        .max((high - prev_close).abs())
        .max((low - prev_close).abs())
}

/// Mean of the most recent `min(window, n)` values
fn sma_of_last(values: &[Decimal], window: usize) -> Option<Decimal> {
    if values.is_empty() {
        return None;
    }
    let n = window.max(1).min(values.len());
    let sum: Decimal = values[values.len() - n..].iter().copied().sum();
    Some(sum / Decimal::from(n))
}

/// ATR from daily bars: per-bar true range averaged over the window.
/// Returns `None` when fewer than two bars are available.
pub fn atr_from_bars(bars: &[Bar], window: usize) -> Option<Decimal> {
    if bars.len() < 2 {
        return None;
    }
    let mut trs = Vec::with_capacity(bars.len() - 1);
    let mut prev_close = bars[0].close;
    for bar in &bars[1..] {
        trs.push(true_range(bar.high, bar.low, prev_close));
        prev_close = bar.close;
    }
    sma_of_last(&trs, window)
}

/// Fallback ATR from a minute-resolution price series: true range is
/// approximated as the absolute delta between consecutive samples.
/// Returns `None` when fewer than two samples are available.
pub fn atr_from_prices(samples: &[(i64, Decimal)], window: usize) -> Option<Decimal> {
    if samples.len() < 2 {
        return None;
    }
    let mut trs = Vec::with_capacity(samples.len() - 1);
    let mut prev = samples[0].1;
    for &(_, price) in &samples[1..] {
        trs.push((price - prev).abs());
        prev = price;
    }
    sma_of_last(&trs, window)
}
