//! spfed entry point.
//!
//! Logging goes to stderr so header output on stdout can be piped.

use anyhow::Result;
use clap::Parser;
use spfed_core::AppConfig;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Args, Command};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr);
    if args.json_logs {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    let config = AppConfig::load_from(args.config.clone())?;
    tracing::debug!(?config, "configuration loaded");

    match args.command {
        Command::Auth { force, json } => commands::auth(&config, force, json).await,
        Command::Logout => commands::logout(&config).await,
        Command::Post { file, state, ajax } => commands::post(&config, &file, state, ajax).await,
    }
}
