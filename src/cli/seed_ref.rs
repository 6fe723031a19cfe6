//! Seed-ref command implementation
//!
//! Anchors the persisted state to a reference price so the first live tick
//! has a trigger baseline instead of waiting for a fill.

use crate::config::Config;
use crate::feed::{CoinGeckoClient, PriceFeed};
use crate::state::{load_state, save_state, Mode};
use clap::Args;
use rust_decimal::Decimal;

#[derive(Args, Debug)]
pub struct SeedRefArgs {
    /// Reference price to anchor; fetched from the feed when omitted
    #[arg(long)]
    pub price: Option<Decimal>,
}

impl SeedRefArgs {
    pub async fn execute(&self, config: Config) -> anyhow::Result<()> {
        let price = match self.price {
            Some(price) => price,
            None => {
                let feed = CoinGeckoClient::new(&config.feed)?;
                feed.last_price().await?
            }
        };

        let mut state = load_state(&config.strategy.state_file)?;
        state.mode = Mode::Flat;
        state.ref_price = Some(price);
        state.position_qty = Decimal::ZERO;
        save_state(&config.strategy.state_file, &state)?;

        tracing::info!(
            %price,
            path = %config.strategy.state_file.display(),
            "seeded reference price"
        );
        println!(
            "Seeded {} with ref_price={} ({}/{})",
            config.strategy.state_file.display(),
            price,
            config.feed.coin_id,
            config.feed.vs_currency
        );
        Ok(())
    }
}
