use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use payment_relay::server;
use payment_relay::utils::config_loader;
use payment_relay::utils::logging;
use payment_relay::utils::logging::LogLevel;
use reqwest::Client;
use tracing::info;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, env = "CONFIG", default_value = "payment-relay.yaml")]
    config: String,
    #[arg(long, env = "LOG_LEVEL", value_enum)]
    log_level: Option<LogLevel>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // -------------------------------
    // 1. Read args
    // -------------------------------

    let args = Args::parse();

    // -------------------------------
    // 2. Load YAML config, init logging
    // -------------------------------

    let service_config = config_loader::run(&args.config).await?;
    logging::run(&service_config, args.log_level.to_owned()).await?;

    // -------------------------------
    // 3. Create request client
    // -------------------------------

    let client = Client::builder().build()?;

    // -------------------------------
    // 4. Start relay server
    // -------------------------------

    info!("Service starting...");
    server::server::start(Arc::new(service_config), client).await
}
