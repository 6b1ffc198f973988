//! MCP-backed tool registries.
//!
//! A [`McpSession`] is one live connection to a tool server, either a child process
//! spoken to over stdio or a streamable HTTP endpoint. [`MultiServerRegistry`] merges
//! several sessions into one registry.

use async_trait::async_trait;
use rmcp::model::{CallToolRequestParam, CallToolResult, RawContent, ResourceContents};
use rmcp::service::{RoleClient, RunningService};
use rmcp::transport::{StreamableHttpClientTransport, TokioChildProcess};
use rmcp::ServiceExt;
use serde_json::{Map, Value};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::model::ToolDescriptor;
use crate::tools::{ToolError, ToolService};

#[derive(Debug, Error)]
pub enum MCPError {
    #[error("Failed to connect to {target}: {cause}")]
    Connect { target: String, cause: String },
    #[error("Unsupported server: {0} (expected a .py or .js script, an executable, or an http(s) URL)")]
    UnsupportedServer(String),
    #[error("MCP error: {0}")]
    Mcp(String),
    #[error("Tool not found: {0}")]
    ToolNotFound(String),
}

impl From<MCPError> for ToolError {
    fn from(err: MCPError) -> Self {
        match err {
            MCPError::ToolNotFound(name) => ToolError::UnknownTool(name),
            other => ToolError::Registry(other.to_string()),
        }
    }
}

/// How to reach a tool server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerTarget {
    /// A script run by an interpreter, spoken to over stdio.
    Script { interpreter: String, path: PathBuf },
    /// An executable spoken to over stdio.
    Executable(PathBuf),
    /// A streamable HTTP endpoint.
    Url(String),
}

impl ServerTarget {
    /// Interpret a command-line argument.
    ///
    /// URLs select the HTTP transport. Paths are dispatched by extension: `.py` runs
    /// under `python`, `.js` under `node`, and extensionless or `.exe` files are run
    /// directly.
    pub fn parse(arg: &str) -> Result<Self, MCPError> {
        let arg = arg.trim();
        if arg.starts_with("http://") || arg.starts_with("https://") {
            return Ok(ServerTarget::Url(arg.to_string()));
        }

        let path = Path::new(arg);
        match path.extension().and_then(|e| e.to_str()) {
            Some("py") => Ok(ServerTarget::Script {
                interpreter: "python".to_string(),
                path: path.to_path_buf(),
            }),
            Some("js") => Ok(ServerTarget::Script {
                interpreter: "node".to_string(),
                path: path.to_path_buf(),
            }),
            None | Some("exe") if !arg.is_empty() => Ok(ServerTarget::Executable(path.to_path_buf())),
            _ => Err(MCPError::UnsupportedServer(arg.to_string())),
        }
    }

    fn command(&self) -> Option<Command> {
        match self {
            ServerTarget::Script { interpreter, path } => {
                let mut cmd = Command::new(interpreter);
                cmd.arg(path);
                Some(cmd)
            }
            ServerTarget::Executable(path) => Some(Command::new(path)),
            ServerTarget::Url(_) => None,
        }
    }
}

impl fmt::Display for ServerTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerTarget::Script { interpreter, path } => {
                write!(f, "{} {}", interpreter, path.display())
            }
            ServerTarget::Executable(path) => write!(f, "{}", path.display()),
            ServerTarget::Url(url) => f.write_str(url),
        }
    }
}

/// A live client connection to one MCP server.
pub struct McpSession {
    label: String,
    service: RunningService<RoleClient, ()>,
}

impl McpSession {
    /// Connect and run the MCP initialization handshake.
    pub async fn connect(target: ServerTarget) -> Result<Self, MCPError> {
        let connect_err = |cause: String| MCPError::Connect {
            target: target.to_string(),
            cause,
        };

        info!("Connecting to MCP server {}", target);
        let service = match (&target, target.command()) {
            (ServerTarget::Url(url), _) => {
                let transport = StreamableHttpClientTransport::from_uri(url.as_str());
                ().serve(transport).await.map_err(|e| connect_err(e.to_string()))?
            }
            (_, Some(cmd)) => {
                let transport = TokioChildProcess::new(cmd).map_err(|e| connect_err(e.to_string()))?;
                ().serve(transport).await.map_err(|e| connect_err(e.to_string()))?
            }
            (_, None) => return Err(MCPError::UnsupportedServer(target.to_string())),
        };

        Ok(Self::from_service(target.to_string(), service))
    }

    /// Wrap an already initialized client service.
    pub fn from_service(label: impl Into<String>, service: RunningService<RoleClient, ()>) -> Self {
        Self {
            label: label.into(),
            service,
        }
    }

    /// Human-readable name of the server this session talks to.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Close the session, terminating a child-process server.
    pub async fn shutdown(self) -> Result<(), MCPError> {
        debug!("Closing MCP session to {}", self.label);
        self.service
            .cancel()
            .await
            .map(|_| ())
            .map_err(|e| MCPError::Mcp(e.to_string()))
    }
}

#[async_trait]
impl ToolService for McpSession {
    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, ToolError> {
        let result = self
            .service
            .list_tools(None)
            .await
            .map_err(|e| MCPError::Mcp(e.to_string()))?;
        Ok(result.tools.into_iter().map(ToolDescriptor::from).collect())
    }

    async fn call_tool(&self, name: &str, args: Map<String, Value>) -> Result<String, ToolError> {
        let params = CallToolRequestParam {
            name: name.to_string().into(),
            arguments: Some(args),
        };

        let result = self
            .service
            .call_tool(params)
            .await
            .map_err(|e| ToolError::Execution {
                tool_name: name.to_string(),
                cause: e.to_string(),
            })?;

        render_call_result(name, result)
    }
}

/// Flatten an MCP call result into the text handed to the model.
///
/// Text blocks are joined by newlines. Structured content is used only when the
/// server sent no text. A result flagged as an error becomes a [`ToolError`].
pub fn render_call_result(name: &str, result: CallToolResult) -> Result<String, ToolError> {
    let mut texts = Vec::new();
    for content in result.content {
        match content.raw {
            RawContent::Text(text_content) => texts.push(text_content.text),
            RawContent::Resource(resource) => {
                if let ResourceContents::TextResourceContents { text, .. } = resource.resource {
                    texts.push(text);
                }
            }
            _ => debug!("Skipping non-text content from tool {}", name),
        }
    }

    let rendered = if texts.is_empty() {
        result
            .structured_content
            .map(|v| v.to_string())
            .unwrap_or_default()
    } else {
        texts.join("\n")
    };

    if result.is_error.unwrap_or(false) {
        return Err(ToolError::Execution {
            tool_name: name.to_string(),
            cause: rendered,
        });
    }

    Ok(rendered)
}

/// Several MCP sessions exposed as a single registry.
///
/// Calls are routed to the first session whose tool list contains the name.
#[derive(Default)]
pub struct MultiServerRegistry {
    sessions: Vec<(String, McpSession)>,
}

impl MultiServerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_session(mut self, session: McpSession) -> Self {
        let id = Uuid::new_v4().to_string();
        debug!("Registering MCP session {} as {}", session.label(), id);
        self.sessions.push((id, session));
        self
    }

    /// Connect to every target, failing on the first unreachable one.
    pub async fn connect_all(targets: Vec<ServerTarget>) -> Result<Self, MCPError> {
        let mut registry = Self::new();
        for target in targets {
            registry = registry.add_session(McpSession::connect(target).await?);
        }
        Ok(registry)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Close every session.
    pub async fn shutdown(self) {
        for (id, session) in self.sessions {
            if let Err(e) = session.shutdown().await {
                warn!("Failed to close MCP session {}: {}", id, e);
            }
        }
    }
}

#[async_trait]
impl ToolService for MultiServerRegistry {
    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, ToolError> {
        let mut all_tools: Vec<ToolDescriptor> = Vec::new();
        for (id, session) in &self.sessions {
            for tool in session.list_tools().await? {
                if all_tools.iter().any(|t| t.name == tool.name) {
                    warn!("Tool {} from session {} is shadowed by an earlier server", tool.name, id);
                    continue;
                }
                all_tools.push(tool);
            }
        }
        Ok(all_tools)
    }

    async fn call_tool(&self, name: &str, args: Map<String, Value>) -> Result<String, ToolError> {
        for (id, session) in &self.sessions {
            let tools = session.list_tools().await?;
            if tools.iter().any(|t| t.name == name) {
                debug!("Routing {} to session {}", name, id);
                return session.call_tool(name, args).await;
            }
        }
        Err(MCPError::ToolNotFound(name.to_string()).into())
    }
}
