mod app;
mod client;
mod commands;
mod config;
mod error;
mod server;

use anyhow::{Context, Result};
use log::info;

use crate::app::Lifecycle;
use crate::client::TelegramClient;
use crate::config::Config;
use crate::server::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    pretty_env_logger::init();
    info!("Starting start webhook bot...");

    let config = Config::from_env().context("Failed to load configuration")?;
    info!("Loaded configuration: {config:?}");

    // A failed init is kept and reported per request; the health check stays up.
    let lifecycle = Lifecycle::initialize(&config, TelegramClient::connect);

    server::serve(AppState::new(config, lifecycle))
        .await
        .context("HTTP server failed")?;

    Ok(())
}
