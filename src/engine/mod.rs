//! Orchestration loop
//!
//! Sequences one tick at a time: fetch price, compute ATR, generate signal,
//! risk-check, size and place the order, apply the ledger transition, persist
//! state, sleep. Sole mutator of [`BotState`].

pub mod ledger;
pub mod sizing;

use crate::atr::{atr_from_bars, atr_from_prices};
use crate::config::Config;
use crate::exchange::{Exchange, OrderType};
use crate::feed::{FeedError, PriceFeed};
use crate::report::EquityWriter;
use crate::risk::RiskManager;
use crate::signal::{AtrStrategy, BandParams, Side, Signal, SignalReason};
use crate::state::{load_state, save_state, BotState};
use crate::telemetry::{inc_counter, set_gauge, CounterMetric, GaugeMetric};
use chrono::Utc;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use sizing::{resolve_adapter, OrderAmount, SizingAdapter};
use std::time::Duration;
use tokio::time::{sleep, Instant};

/// Bound on the pause after an unexpected tick failure
const ERROR_PAUSE: Duration = Duration::from_secs(30);

/// What a single tick did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// ATR unavailable from both paths; tick skipped
    NoData,
    /// No signal this tick
    Idle,
    /// Signal generated but vetoed by the risk gate
    Vetoed,
    /// Order skipped (below venue minimums or rejected)
    Skipped,
    /// A trade was executed
    Traded(Side),
}

/// The trading engine: owns the bot state and drives the collaborators
pub struct TradingEngine {
    config: Config,
    strategy: AtrStrategy,
    risk: RiskManager,
    sizer: Box<dyn SizingAdapter>,
    feed: Box<dyn PriceFeed>,
    exchange: Box<dyn Exchange>,
    equity: EquityWriter,
    state: BotState,
}

impl TradingEngine {
    /// Build the engine: validate the pair, load (and roll over) persisted
    /// state, and resolve the sizing adapter for the venue/order-type pair.
    pub async fn new(
        config: Config,
        feed: Box<dyn PriceFeed>,
        exchange: Box<dyn Exchange>,
    ) -> anyhow::Result<Self> {
        exchange.validate_pair().await?;

        let mut state = load_state(&config.strategy.state_file)?;
        if state.equity_start_of_day == Decimal::ZERO && state.realized_pnl != Decimal::ZERO {
            state.equity_start_of_day = state.realized_pnl;
        }
        save_state(&config.strategy.state_file, &state)?;

        let strategy = AtrStrategy::new(BandParams::from(&config.strategy));
        let risk = RiskManager::new(config.risk.clone());
        let sizer = resolve_adapter(&config.sizing, exchange.venue(), config.exchange.order_type);
        let equity = EquityWriter::new(config.runtime.equity_file.clone());

        Ok(Self {
            config,
            strategy,
            risk,
            sizer,
            feed,
            exchange,
            equity,
            state,
        })
    }

    /// Current ledger state
    pub fn state(&self) -> &BotState {
        &self.state
    }

    /// Compute ATR from daily bars, falling back to the minute series when
    /// bar retrieval fails. `Ok(None)` means neither path produced a value
    /// from the data it got; an `Err` aborts the tick before any mutation.
    async fn compute_atr(&self) -> Result<Option<Decimal>, FeedError> {
        let window = self.config.feed.atr_window;
        match self.feed.daily_bars(self.config.feed.ohlc_days).await {
            Ok(bars) => Ok(atr_from_bars(&bars, window)),
            Err(e) => {
                tracing::warn!(error = %e, "daily bars unavailable, falling back to minute series");
                let series = self.feed.minute_series(1).await?;
                Ok(atr_from_prices(&series, window))
            }
        }
    }

    /// Limit price offset from the last price by the configured slippage
    fn limit_price(&self, side: Side, last_price: Decimal) -> Decimal {
        let bps = Decimal::from(self.config.exchange.limit_slippage_bps) / Decimal::from(10_000);
        let raw = match side {
            Side::Buy => last_price * (Decimal::ONE - bps),
            Side::Sell => last_price * (Decimal::ONE + bps),
        };
        self.exchange.round_price(raw)
    }

    /// Check venue minimums for the sized order. Quote-cost amounts skip the
    /// base-quantity minimum since they are not base quantities.
    fn passes_minimums(&self, amount: &OrderAmount, est_cost: Decimal) -> bool {
        let limits = self.exchange.limits();
        let market = &self.config.market;
        let mut ok = true;
        if market.min_order_amount_warn && !amount.is_quote_cost() && amount.value() < limits.min_amount
        {
            tracing::warn!(
                amount = %amount.value(),
                min = %limits.min_amount,
                "amount below venue minimum, skipping order"
            );
            ok = false;
        }
        if market.min_order_notional_warn
            && limits.min_cost > Decimal::ZERO
            && est_cost < limits.min_cost
        {
            tracing::warn!(
                notional = %est_cost,
                min_cost = %limits.min_cost,
                "notional below venue minimum, skipping order"
            );
            ok = false;
        }
        ok
    }

    /// Execute one tick of the loop
    pub async fn tick(&mut self) -> anyhow::Result<TickOutcome> {
        let now_ms = Utc::now().timestamp_millis();
        inc_counter(CounterMetric::Ticks);

        let last_price = self.feed.last_price().await?;

        let atr = self.compute_atr().await?;
        let Some(atr) = atr else {
            tracing::warn!("ATR not available yet, skipping tick");
            return Ok(TickOutcome::NoData);
        };
        set_gauge(GaugeMetric::LastAtr, atr.to_f64().unwrap_or(0.0));

        let signal = self
            .strategy
            .signal(last_price, Some(atr), self.state.mode, self.state.ref_price);
        tracing::info!(
            price = %last_price,
            %atr,
            mode = ?self.state.mode,
            ref_price = ?self.state.ref_price,
            signal = ?signal.map(|s| s.side),
            "tick"
        );

        let Some(signal) = signal else {
            return Ok(TickOutcome::Idle);
        };

        if let Err(block) = self.risk.can_trade(
            now_ms,
            self.state.trades_today,
            self.state.last_trade_ts,
            self.state.realized_pnl_today,
        ) {
            tracing::warn!(reason = %block, "risk gate vetoed signal");
            inc_counter(CounterMetric::RiskBlocks);
            return Ok(TickOutcome::Vetoed);
        }

        let outcome = self.execute_signal(&signal, last_price, now_ms).await?;

        // The ledger mutates exactly once per executed trade; persist
        // immediately after the mutation and nowhere else.
        if matches!(outcome, TickOutcome::Traded(_)) {
            save_state(&self.config.strategy.state_file, &self.state)?;
            self.update_gauges();
        }
        Ok(outcome)
    }

    /// Size, validate, place, and book one order
    async fn execute_signal(
        &mut self,
        signal: &Signal,
        last_price: Decimal,
        now_ms: i64,
    ) -> anyhow::Result<TickOutcome> {
        let order_type = self.config.exchange.order_type;
        let round_to_step = self.config.sizing.round_to_step;

        let mut amount = self.sizer.size(signal.side, last_price);
        // Round base quantities only, never a raw quote cost
        if round_to_step {
            if let OrderAmount::BaseQty(qty) = amount {
                amount = OrderAmount::BaseQty(self.exchange.round_amount(qty));
            }
        }
        let est_cost = amount.est_cost(last_price);

        if !self.passes_minimums(&amount, est_cost) || amount.value() <= Decimal::ZERO {
            tracing::info!(
                amount = %amount.value(),
                notional = %est_cost,
                "order not placed due to validation or zero amount"
            );
            inc_counter(CounterMetric::OrdersSkipped);
            return Ok(TickOutcome::Skipped);
        }

        let limit_price =
            (order_type == OrderType::Limit).then(|| self.limit_price(signal.side, last_price));
        // Conservative fill assumption: limit price when set, last otherwise
        let fill_price = limit_price.unwrap_or(last_price);

        match signal.side {
            Side::Buy => {
                let submitted = amount.value();
                if let Err(e) = self
                    .exchange
                    .place_order(Side::Buy, order_type, submitted, Some(fill_price))
                    .await
                {
                    tracing::warn!(error = %e, "buy order not accepted, skipping");
                    inc_counter(CounterMetric::OrdersSkipped);
                    return Ok(TickOutcome::Skipped);
                }

                let record = ledger::apply_buy(&mut self.state, &self.risk, fill_price, &amount, now_ms);
                inc_counter(CounterMetric::Trades);
                tracing::info!(
                    price = %record.fill_price,
                    amount = %record.quantity,
                    fees = %record.fee,
                    stop_price = ?signal.stop_price,
                    paper = self.config.runtime.paper,
                    "filled buy"
                );
            }
            Side::Sell => {
                // Sell the entire held position; fall back to the sized
                // quantity when the ledger shows nothing held
                let mut qty = if self.state.position_qty > Decimal::ZERO {
                    self.state.position_qty
                } else {
                    amount.base_qty(last_price)
                };
                if round_to_step {
                    qty = self.exchange.round_amount(qty);
                }

                if let Err(e) = self
                    .exchange
                    .place_order(Side::Sell, order_type, qty, Some(fill_price))
                    .await
                {
                    tracing::warn!(error = %e, "sell order not accepted, skipping");
                    inc_counter(CounterMetric::OrdersSkipped);
                    return Ok(TickOutcome::Skipped);
                }

                let record = ledger::apply_sell(&mut self.state, &self.risk, fill_price, qty, now_ms);
                inc_counter(CounterMetric::Trades);

                let stop_loss = signal.reason == SignalReason::StopLoss;
                tracing::info!(
                    price = %record.fill_price,
                    pnl = %record.pnl.unwrap_or_default(),
                    realized_pnl = %self.state.realized_pnl,
                    fees = %record.fee,
                    stop_loss,
                    paper = self.config.runtime.paper,
                    "filled sell"
                );

                // Equity record is a side effect; a write failure must not
                // fail the tick after the ledger has moved
                if let Err(e) = self.equity.append(
                    now_ms,
                    self.state.realized_pnl,
                    self.state.cum_fees,
                    self.state.position_qty,
                ) {
                    tracing::warn!(error = %e, "failed to append equity record");
                }
            }
        }

        Ok(TickOutcome::Traded(signal.side))
    }

    fn update_gauges(&self) {
        set_gauge(
            GaugeMetric::RealizedPnl,
            self.state.realized_pnl.to_f64().unwrap_or(0.0),
        );
        set_gauge(
            GaugeMetric::DailyPnl,
            self.state.realized_pnl_today.to_f64().unwrap_or(0.0),
        );
        set_gauge(
            GaugeMetric::CumFees,
            self.state.cum_fees.to_f64().unwrap_or(0.0),
        );
        set_gauge(
            GaugeMetric::PositionQty,
            self.state.position_qty.to_f64().unwrap_or(0.0),
        );
    }

    /// Run the poll loop. An interrupt breaks out cleanly after the in-flight
    /// tick; a failed tick is logged and the loop continues after a bounded
    /// pause. With `once`, a single tick runs and the loop exits.
    pub async fn run(&mut self, once: bool) -> anyhow::Result<()> {
        let poll = Duration::from_secs(self.config.feed.poll_interval_seconds);
        let mut shutdown = Box::pin(tokio::signal::ctrl_c());

        tracing::info!(
            exchange = %self.config.exchange.id,
            pair = %self.config.market.pair,
            paper = self.config.runtime.paper,
            k = %self.config.strategy.k,
            atr_window = self.config.feed.atr_window,
            "bot started"
        );

        loop {
            let started = Instant::now();
            match self.tick().await {
                Ok(outcome) => {
                    tracing::debug!(?outcome, "tick complete");
                }
                Err(e) => {
                    tracing::error!(error = ?e, "tick failed");
                    inc_counter(CounterMetric::TickErrors);
                    if !once {
                        tokio::select! {
                            _ = &mut shutdown => {
                                tracing::info!("interrupt received, shutting down");
                                break;
                            }
                            _ = sleep(poll.min(ERROR_PAUSE)) => {}
                        }
                        continue;
                    }
                }
            }

            if once {
                break;
            }

            let remaining = poll.saturating_sub(started.elapsed());
            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!("interrupt received, shutting down");
                    break;
                }
                _ = sleep(remaining) => {}
            }
        }

        tracing::info!(
            realized_pnl_today = %self.state.realized_pnl_today,
            realized_pnl_total = %self.state.realized_pnl,
            trades_today = self.state.trades_today,
            fees = %self.state.cum_fees,
            "daily summary"
        );
        Ok(())
    }
}
