//! Configuration types for atr-bot

use anyhow::Context;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::path::PathBuf;

use crate::exchange::OrderType;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub exchange: ExchangeConfig,
    pub market: MarketConfig,
    pub feed: FeedConfig,
    pub strategy: StrategyConfig,
    #[serde(default)]
    pub sizing: SizingConfig,
    pub risk: RiskConfig,
    pub runtime: RuntimeConfig,
    pub telemetry: TelemetryConfig,
}

/// Venue identity and order placement style
#[derive(Debug, Clone, Deserialize)]
pub struct ExchangeConfig {
    /// Venue identifier (e.g. "coinbase", "kraken")
    pub id: String,
    /// Order type used for entries and exits
    pub order_type: OrderType,
    /// Limit price offset from last price, in basis points
    #[serde(default = "default_limit_slippage_bps")]
    pub limit_slippage_bps: u32,
}

fn default_limit_slippage_bps() -> u32 {
    10
}

/// Trading pair and venue order limits
#[derive(Debug, Clone, Deserialize)]
pub struct MarketConfig {
    /// Pair symbol (e.g. "BTC/USDC")
    pub pair: String,
    /// Minimum base quantity accepted by the venue
    #[serde(default)]
    pub min_amount: Decimal,
    /// Minimum order notional accepted by the venue
    #[serde(default)]
    pub min_cost: Decimal,
    /// Base quantity step size
    #[serde(default)]
    pub amount_step: Decimal,
    /// Price step size
    #[serde(default)]
    pub price_step: Decimal,
    /// Skip orders below the venue minimum quantity
    #[serde(default = "default_true")]
    pub min_order_amount_warn: bool,
    /// Skip orders below the venue minimum notional
    #[serde(default = "default_true")]
    pub min_order_notional_warn: bool,
}

fn default_true() -> bool {
    true
}

/// Price history feed configuration
#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    /// CoinGecko coin identifier (e.g. "bitcoin")
    pub coin_id: String,
    /// Quote currency for prices (stablecoins are normalized to "usd")
    pub vs_currency: String,
    /// Seconds between polling ticks
    pub poll_interval_seconds: u64,
    /// ATR lookback window, in true-range samples
    pub atr_window: usize,
    /// Days of daily bars to request
    #[serde(default = "default_ohlc_days")]
    pub ohlc_days: u32,
    /// HTTP request timeout in seconds
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    /// Maximum retry attempts per feed call
    #[serde(default = "default_retry_max_attempts")]
    pub retry_max_attempts: u32,
    /// Initial retry backoff in milliseconds
    #[serde(default = "default_retry_initial_delay_ms")]
    pub retry_initial_delay_ms: u64,
    /// Maximum retry backoff in milliseconds
    #[serde(default = "default_retry_max_delay_ms")]
    pub retry_max_delay_ms: u64,
}

fn default_ohlc_days() -> u32 {
    30
}
fn default_timeout_seconds() -> u64 {
    15
}
fn default_retry_max_attempts() -> u32 {
    4
}
fn default_retry_initial_delay_ms() -> u64 {
    1_000
}
fn default_retry_max_delay_ms() -> u64 {
    30_000
}

/// Band strategy constants
#[derive(Debug, Clone, Deserialize)]
pub struct StrategyConfig {
    /// Entry/exit band multiplier
    pub k: Decimal,
    /// Stop-loss band multiplier
    pub stop_loss_atr: Decimal,
    /// Enable the stop-loss exit path
    pub stop_enabled: bool,
    /// Path of the persisted bot state file
    pub state_file: PathBuf,
}

/// Position sizing configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SizingConfig {
    /// Sizing mode: "notional" or "quantity"
    #[serde(default)]
    pub mode: SizingMode,
    /// Quote amount per trade (for notional mode)
    #[serde(default = "default_notional")]
    pub notional: Decimal,
    /// Base quantity per trade (for quantity mode)
    #[serde(default)]
    pub quantity: Decimal,
    /// Round base quantities to the venue step
    #[serde(default = "default_true")]
    pub round_to_step: bool,
}

/// Sizing mode for order amounts
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SizingMode {
    #[default]
    Notional,
    Quantity,
}

fn default_notional() -> Decimal {
    rust_decimal_macros::dec!(50)
}

impl Default for SizingConfig {
    fn default() -> Self {
        Self {
            mode: SizingMode::Notional,
            notional: default_notional(),
            quantity: Decimal::ZERO,
            round_to_step: true,
        }
    }
}

/// Risk gate configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RiskConfig {
    pub max_trades_per_day: u32,
    pub cooldown_seconds: u64,
    /// Daily loss limit as a percentage of start equity; 0 disables the kill-switch
    pub max_daily_loss_pct: Decimal,
    pub start_equity: Decimal,
    /// Taker fee per leg, in percent
    pub taker_fee_pct: Decimal,
}

/// Run mode configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RuntimeConfig {
    /// Paper trading: simulated fills, no live submission
    pub paper: bool,
    /// Run a single tick then exit
    #[serde(default)]
    pub once: bool,
    /// Path of the equity curve report
    #[serde(default = "default_equity_file")]
    pub equity_file: PathBuf,
}

fn default_equity_file() -> PathBuf {
    PathBuf::from("reports/equity.csv")
}

/// Telemetry configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    pub metrics_port: u16,
    pub log_level: String,
    #[serde(default)]
    pub log_format: LogFormat,
}

/// Log output format
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable format
    #[default]
    Pretty,
    /// JSON format for log aggregation
    Json,
}

impl Config {
    /// Load configuration from a TOML file, failing fast on invalid values
    pub fn load(path: impl AsRef<std::path::Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("parsing config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values eagerly so misconfiguration fails at
    /// startup rather than at first use mid-loop.
    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.feed.poll_interval_seconds > 0,
            "feed.poll_interval_seconds must be positive"
        );
        anyhow::ensure!(self.feed.atr_window >= 1, "feed.atr_window must be >= 1");
        anyhow::ensure!(self.feed.ohlc_days >= 2, "feed.ohlc_days must be >= 2");
        anyhow::ensure!(
            self.feed.retry_max_attempts >= 1,
            "feed.retry_max_attempts must be >= 1"
        );
        anyhow::ensure!(self.strategy.k > Decimal::ZERO, "strategy.k must be positive");
        if self.strategy.stop_enabled {
            anyhow::ensure!(
                self.strategy.stop_loss_atr > Decimal::ZERO,
                "strategy.stop_loss_atr must be positive when stops are enabled"
            );
        }
        match self.sizing.mode {
            SizingMode::Notional => anyhow::ensure!(
                self.sizing.notional > Decimal::ZERO,
                "sizing.notional must be positive in notional mode"
            ),
            SizingMode::Quantity => anyhow::ensure!(
                self.sizing.quantity > Decimal::ZERO,
                "sizing.quantity must be positive in quantity mode"
            ),
        }
        anyhow::ensure!(
            self.risk.taker_fee_pct >= Decimal::ZERO,
            "risk.taker_fee_pct must not be negative"
        );
        if self.risk.max_daily_loss_pct > Decimal::ZERO {
            anyhow::ensure!(
                self.risk.start_equity > Decimal::ZERO,
                "risk.start_equity must be positive when the daily loss limit is enabled"
            );
        }
        Ok(())
    }
}
