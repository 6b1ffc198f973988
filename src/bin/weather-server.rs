//! MCP server exposing weather alerts and forecasts.
//!
//! Serves over stdio by default; `--http <address>` serves streamable HTTP instead.

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use mcp_relay::config::{self, WeatherConfig};
use mcp_relay::fetch::HttpFetcher;
use mcp_relay::servers::{self, WeatherServer};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    config::load_dotenv();
    // stdout carries the protocol in stdio mode.
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

    let config = WeatherConfig::from_env();
    let fetcher = HttpFetcher::new(config.transport_options())?;
    let server = WeatherServer::new(Arc::new(fetcher), config.base_url);

    servers::serve(server, mode).await?;
    Ok(())
}
