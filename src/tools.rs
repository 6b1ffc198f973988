//! Tool registry abstraction used by the agent loop.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Arc;

use crate::model::ToolDescriptor;

/// Error type for tool execution.
///
/// None of these abort a conversation: the agent turns them into an error-shaped
/// tool result so the model can react.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Invalid arguments for {tool_name}: {cause}")]
    ArgumentDecode { tool_name: String, cause: String },

    #[error("Tool {tool_name} failed: {cause}")]
    Execution { tool_name: String, cause: String },

    #[error("Registry error: {0}")]
    Registry(String),
}

impl ToolError {
    /// Content of the tool result sent back to the model in place of a real output.
    pub fn to_result_content(&self) -> String {
        serde_json::json!({ "error": self.to_string() }).to_string()
    }
}

/// A live catalog of tools that can be listed and invoked.
#[async_trait]
pub trait ToolService: Send + Sync {
    /// Snapshot of the tools currently available.
    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, ToolError>;

    /// Execute a tool and return its output as text.
    async fn call_tool(&self, name: &str, args: Map<String, Value>) -> Result<String, ToolError>;
}

#[async_trait]
impl<T: ToolService + ?Sized> ToolService for Box<T> {
    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, ToolError> {
        (**self).list_tools().await
    }

    async fn call_tool(&self, name: &str, args: Map<String, Value>) -> Result<String, ToolError> {
        (**self).call_tool(name, args).await
    }
}

#[async_trait]
impl<T: ToolService + ?Sized> ToolService for Arc<T> {
    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, ToolError> {
        (**self).list_tools().await
    }

    async fn call_tool(&self, name: &str, args: Map<String, Value>) -> Result<String, ToolError> {
        (**self).call_tool(name, args).await
    }
}
