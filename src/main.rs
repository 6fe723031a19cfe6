use atr_bot::cli::{Cli, Commands};
use atr_bot::config::Config;
use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::load(&cli.config)?;

    // The metrics port is only bound for the trading loop; one-shot commands
    // must not collide with a running bot instance.
    let _guard = match &cli.command {
        Commands::Run(_) => atr_bot::telemetry::init_telemetry(&config.telemetry)?,
        _ => atr_bot::telemetry::init_logging_only(&config.telemetry)?,
    };

    match cli.command {
        Commands::Run(args) => {
            tracing::info!(paper = config.runtime.paper, "starting trading loop");
            args.execute(config).await?;
        }
        Commands::SeedRef(args) => {
            args.execute(config).await?;
        }
        Commands::Status => {
            let state = atr_bot::state::load_state(&config.strategy.state_file)?;
            println!("atr-bot status");
            println!("  Mode: {:?}", state.mode);
            println!(
                "  Ref price: {}",
                state
                    .ref_price
                    .map(|p| p.to_string())
                    .unwrap_or_else(|| "-".to_string())
            );
            println!("  Position qty: {}", state.position_qty);
            println!(
                "  Realized PnL: {} (today: {})",
                state.realized_pnl, state.realized_pnl_today
            );
            println!("  Fees: {}", state.cum_fees);
            println!("  Trades today: {} ({})", state.trades_today, state.day_key);
        }
        Commands::Config => {
            println!("Current configuration:");
            println!(
                "  Exchange: {} ({:?} orders)",
                config.exchange.id, config.exchange.order_type
            );
            println!("  Pair: {}", config.market.pair);
            println!(
                "  Feed: {}/{} every {}s",
                config.feed.coin_id, config.feed.vs_currency, config.feed.poll_interval_seconds
            );
            println!(
                "  Strategy: k={} stop_enabled={} stop_loss_atr={}",
                config.strategy.k, config.strategy.stop_enabled, config.strategy.stop_loss_atr
            );
            println!(
                "  Risk: max_trades/day={} cooldown={}s daily_loss={}%",
                config.risk.max_trades_per_day,
                config.risk.cooldown_seconds,
                config.risk.max_daily_loss_pct
            );
            println!(
                "  Mode: {}",
                if config.runtime.paper { "paper" } else { "live" }
            );
        }
    }

    Ok(())
}
