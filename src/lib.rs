//! # mcp-relay
//!
//! Relays a natural-language query between a chat completion API and the tools
//! exposed by MCP servers, plus two small tool servers to relay to.
//!
//! ## Architecture
//!
//! 1. **Clients** (`Client`) talk to a completion endpoint and return one assistant turn.
//! 2. **Tool services** (`ToolService`) list and invoke tools; `McpSession` backs one
//!    with a live MCP connection.
//! 3. **Agents** (`Agent`) own a client and a tool service and run the
//!    request → tool calls → request loop for one query at a time.
//! 4. **Servers** (`servers`) expose upstream HTTP lookups as MCP tools.
//!
//! ## Example
//! ```no_run
//! use mcp_relay::mcp::{McpSession, ServerTarget};
//! use mcp_relay::providers::{OpenAi, Provider};
//! use mcp_relay::Agent;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = OpenAi::create("your-api-key".to_string())?;
//!     let session = McpSession::connect(ServerTarget::parse("weather/weather.py")?).await?;
//!     let agent = Agent::new(client).with_registry(session);
//!
//!     let answer = agent.run("What are the weather alerts in California").await?;
//!     println!("{}", answer);
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod api;
pub mod client;
pub mod config;
pub mod fetch;
pub mod http;
pub mod mcp;
pub mod model;
pub mod options;
pub mod providers;
pub mod repl;
pub mod servers;
pub mod tools;

pub use agent::{Agent, AgentError, Conversation, NO_ANSWER};
pub use client::{Client, ClientError};
pub use mcp::{MCPError, McpSession, MultiServerRegistry, ServerTarget};
pub use model::{AssistantTurn, Response, ToolDescriptor, ToolInvocationRequest, Transcript, Turn};
pub use tools::{ToolError, ToolService};

// Re-export rmcp for convenience
pub use rmcp;
