//! CLI interface for atr-bot
//!
//! Provides subcommands for:
//! - `run`: start the trading loop (paper by default)
//! - `seed-ref`: anchor the persisted state to a reference price
//! - `status`: show the persisted bot state
//! - `config`: show the effective configuration

mod run;
mod seed_ref;

pub use run::RunArgs;
pub use seed_ref::SeedRefArgs;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "atr-bot")]
#[command(about = "ATR band trading bot for spot crypto pairs")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the trading loop
    Run(RunArgs),
    /// Anchor the persisted state to a reference price
    SeedRef(SeedRefArgs),
    /// Show the persisted bot state
    Status,
    /// Show the effective configuration
    Config,
}
