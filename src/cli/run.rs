//! Run command implementation

use crate::config::Config;
use crate::engine::TradingEngine;
use crate::exchange::PaperExchange;
use crate::feed::CoinGeckoClient;
use clap::Args;

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Run in paper mode regardless of config
    #[arg(long)]
    pub paper: bool,

    /// Force live trading mode (overrides config paper=true)
    #[arg(long, conflicts_with = "paper")]
    pub live: bool,

    /// Run one tick then exit
    #[arg(long)]
    pub once: bool,
}

impl RunArgs {
    pub async fn execute(&self, mut config: Config) -> anyhow::Result<()> {
        if self.paper {
            config.runtime.paper = true;
        } else if self.live {
            config.runtime.paper = false;
        }
        if self.once {
            config.runtime.once = true;
        }

        // Live submission plugs in behind the Exchange trait; only the paper
        // engine ships with this binary.
        anyhow::ensure!(
            config.runtime.paper,
            "live mode requires a venue adapter; only paper execution is built in"
        );

        let feed = CoinGeckoClient::new(&config.feed)?;
        let exchange = PaperExchange::from_config(&config.exchange, &config.market);
        let once = config.runtime.once;

        let mut engine = TradingEngine::new(config, Box::new(feed), Box::new(exchange)).await?;
        engine.run(once).await
    }
}
