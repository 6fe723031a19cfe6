//! Prometheus metrics

use metrics::{counter, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Counter metric types
#[derive(Debug, Clone, Copy)]
pub enum CounterMetric {
    /// Ticks executed
    Ticks,
    /// Ticks aborted by an unexpected error
    TickErrors,
    /// Trades executed
    Trades,
    /// Signals vetoed by the risk gate
    RiskBlocks,
    /// Orders skipped below venue minimums or rejected
    OrdersSkipped,
}

/// Gauge metric types
#[derive(Debug, Clone, Copy)]
pub enum GaugeMetric {
    /// Cumulative realized P&L
    RealizedPnl,
    /// Realized P&L since day rollover
    DailyPnl,
    /// Cumulative fees paid
    CumFees,
    /// Base quantity currently held
    PositionQty,
    /// Most recent ATR value
    LastAtr,
}

/// Install the Prometheus exporter on the given port.
/// Must run inside a tokio runtime.
pub(crate) fn install_exporter(port: u16) -> anyhow::Result<()> {
    PrometheusBuilder::new()
        .with_http_listener(([0, 0, 0, 0], port))
        .install()
        .map_err(|e| anyhow::anyhow!("failed to install metrics exporter: {}", e))?;
    Ok(())
}

/// Increment a counter
pub fn inc_counter(metric: CounterMetric) {
    let name = match metric {
        CounterMetric::Ticks => "atrbot_ticks_total",
        CounterMetric::TickErrors => "atrbot_tick_errors_total",
        CounterMetric::Trades => "atrbot_trades_total",
        CounterMetric::RiskBlocks => "atrbot_risk_blocks_total",
        CounterMetric::OrdersSkipped => "atrbot_orders_skipped_total",
    };
    counter!(name).increment(1);
}

/// Set a gauge value
pub fn set_gauge(metric: GaugeMetric, value: f64) {
    let name = match metric {
        GaugeMetric::RealizedPnl => "atrbot_realized_pnl",
        GaugeMetric::DailyPnl => "atrbot_daily_pnl",
        GaugeMetric::CumFees => "atrbot_cum_fees",
        GaugeMetric::PositionQty => "atrbot_position_qty",
        GaugeMetric::LastAtr => "atrbot_last_atr",
    };
    gauge!(name).set(value);
}
