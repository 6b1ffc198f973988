//! MCP server exposing the train vehicle-type lookup.
//!
//! Serves over stdio by default; `--http <address>` serves streamable HTTP instead.

use std::sync::Arc;

use tracing::warn;
use tracing_subscriber::EnvFilter;

use mcp_relay::config::{self, TrainConfig};
use mcp_relay::fetch::HttpFetcher;
use mcp_relay::servers::{self, TrainServer};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    config::load_dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let mode = match config::serve_mode(&args) {
        Ok(mode) => mode,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    let config = TrainConfig::from_env();
    if config.service_key.is_none() {
        warn!("OPEN_DATA_API_KEY is not set, upstream requests will likely be rejected");
    }
    let fetcher = HttpFetcher::new(config.transport_options())?;
    let server = TrainServer::new(Arc::new(fetcher), config.base_url, config.service_key);

    servers::serve(server, mode).await?;
    Ok(())
}
