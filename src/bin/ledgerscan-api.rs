#![forbid(unsafe_code)]
//! Explorer API server for ledgerscan

use clap::Parser;
use ledgerscan::api::run_api_server;
use ledgerscan::config::load_config;
use ledgerscan::explorer::Explorer;
use ledgerscan::store::SqliteStore;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the TOML config file
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,
    /// Database path, overriding `database.path`
    #[arg(long)]
    db: Option<String>,
    /// Listen port, overriding `server.api_port` and $PORT
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let mut config = load_config(&cli.config)?;
    if let Some(db) = cli.db {
        config.database.path = db;
    }
    config.validate()?;

    // Get port from the flag, then the environment, then the config file
    let port = cli
        .port
        .or_else(|| std::env::var("PORT").ok().and_then(|p| p.parse::<u16>().ok()))
        .unwrap_or(config.server.api_port);
    let host: IpAddr = config
        .server
        .host
        .parse()
        .map_err(|e| format!("invalid server.host {:?}: {}", config.server.host, e))?;

    info!(db = %config.database.path, "opening ledger database");
    let store = SqliteStore::open(&config.database.path)?;
    let explorer = Arc::new(Explorer::new(
        Arc::new(store),
        config.explorer.genesis_time,
    ));

    run_api_server(explorer, SocketAddr::new(host, port)).await
}
