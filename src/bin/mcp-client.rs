//! Interactive client: connects to one or more MCP tool servers and answers queries
//! typed on stdin with the help of their tools.

use std::sync::Arc;

use anyhow::Context;
use tokio::io::BufReader;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use mcp_relay::config::{self, ClientConfig};
use mcp_relay::providers::{OpenAi, Provider};
use mcp_relay::{repl, Agent, Client, MultiServerRegistry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    config::load_dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let targets = match config::server_targets(&args) {
        Ok(targets) => targets,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    let config = ClientConfig::from_env()?;
    let client = OpenAi::create_with_options(
        config.api_key.clone(),
        Some(config.base_url.clone()),
        config.model_options(),
        config.transport_options(),
    )?;

    let registry = Arc::new(
        MultiServerRegistry::connect_all(targets)
            .await
            .context("connecting to tool servers")?,
    );
    let agent = Agent::new(client)
        .with_registry(registry.clone())
        .with_max_rounds(config.max_rounds);
    info!(
        "Using model {} with up to {} tool round(s) per query",
        agent.client().model_options().model,
        agent.max_rounds()
    );

    let tools = agent.list_tools().await.context("listing tools")?;
    println!("{}", repl::connected_banner(&tools));

    let stdin = BufReader::new(tokio::io::stdin());
    let mut stdout = tokio::io::stdout();
    let result = repl::chat_loop(&agent, stdin, &mut stdout).await;

    drop(agent);
    match Arc::try_unwrap(registry) {
        Ok(registry) => registry.shutdown().await,
        Err(_) => warn!("Tool registry still shared at exit, sessions close on drop"),
    }

    result.context("interactive loop")
}
