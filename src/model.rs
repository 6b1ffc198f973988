//! Conversation data model shared by the agent loop, the completion clients and the tool registries.

use nonempty::NonEmpty;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::ops::AddAssign;

use crate::tools::ToolError;

/// A tool as listed by a registry snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    /// Unique within one registry snapshot.
    pub name: String,
    pub description: String,
    /// JSON schema of the accepted arguments.
    pub input_schema: Map<String, Value>,
}

impl ToolDescriptor {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        input_schema: Map<String, Value>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema,
        }
    }
}

impl From<rmcp::model::Tool> for ToolDescriptor {
    fn from(tool: rmcp::model::Tool) -> Self {
        Self {
            name: tool.name.to_string(),
            description: tool
                .description
                .map(|d| d.to_string())
                .unwrap_or_default(),
            input_schema: (*tool.input_schema).clone(),
        }
    }
}

/// A tool call requested by the model.
///
/// `arguments` is kept exactly as the model serialized it; decoding happens when the
/// call is executed so that malformed arguments can be reported back to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInvocationRequest {
    pub id: String,
    pub tool_name: String,
    pub arguments: String,
}

impl ToolInvocationRequest {
    pub fn new(id: impl Into<String>, tool_name: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            tool_name: tool_name.into(),
            arguments: arguments.into(),
        }
    }

    /// Decode the serialized arguments into a key/value mapping.
    ///
    /// An empty argument string is an empty mapping.
    pub fn decode_arguments(&self) -> Result<Map<String, Value>, ToolError> {
        if self.arguments.trim().is_empty() {
            return Ok(Map::new());
        }

        match serde_json::from_str::<Value>(&self.arguments) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(other) => Err(ToolError::ArgumentDecode {
                tool_name: self.tool_name.clone(),
                cause: format!("expected a JSON object, got {}", other),
            }),
            Err(e) => Err(ToolError::ArgumentDecode {
                tool_name: self.tool_name.clone(),
                cause: e.to_string(),
            }),
        }
    }
}

/// Output of one tool invocation, keyed by the request it answers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInvocationResult {
    pub id: String,
    pub content: String,
}

/// One entry of a conversation transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Turn {
    User { text: String },
    AssistantText { text: String },
    ToolRequest(ToolInvocationRequest),
    ToolResult(ToolInvocationResult),
}

/// Ordered, append-only history of a single query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn tool_requests(&self) -> impl Iterator<Item = &ToolInvocationRequest> {
        self.turns.iter().filter_map(|t| match t {
            Turn::ToolRequest(req) => Some(req),
            _ => None,
        })
    }

    pub fn tool_results(&self) -> impl Iterator<Item = &ToolInvocationResult> {
        self.turns.iter().filter_map(|t| match t {
            Turn::ToolResult(res) => Some(res),
            _ => None,
        })
    }

    /// Whether every tool result answers exactly one earlier request.
    pub fn results_are_paired(&self) -> bool {
        let mut open: Vec<&str> = Vec::new();
        let mut answered: Vec<&str> = Vec::new();
        for turn in &self.turns {
            match turn {
                Turn::ToolRequest(req) => open.push(&req.id),
                Turn::ToolResult(res) => {
                    if !open.contains(&res.id.as_str()) || answered.contains(&res.id.as_str()) {
                        return false;
                    }
                    answered.push(&res.id);
                }
                _ => {}
            }
        }
        true
    }
}

/// What the completion endpoint answered for one call.
#[derive(Debug, Clone, PartialEq)]
pub enum AssistantTurn {
    Text(String),
    ToolCalls {
        /// Text the model emitted alongside its tool calls, if any.
        text: Option<String>,
        calls: NonEmpty<ToolInvocationRequest>,
    },
    Empty,
}

impl AssistantTurn {
    /// Build a turn from the loose pieces a provider returns.
    pub fn from_parts(text: Option<String>, calls: Vec<ToolInvocationRequest>) -> Self {
        let text = text.filter(|t| !t.trim().is_empty());
        match (NonEmpty::from_vec(calls), text) {
            (Some(calls), text) => AssistantTurn::ToolCalls { text, calls },
            (None, Some(text)) => AssistantTurn::Text(text),
            (None, None) => AssistantTurn::Empty,
        }
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            AssistantTurn::Text(text) => Some(text),
            AssistantTurn::ToolCalls { text, .. } => text.as_deref(),
            AssistantTurn::Empty => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FinishReason {
    #[default]
    Stop,
    OutputTokens,
    ContentFilter,
    ToolCalls,
}

impl FinishReason {
    pub fn from_openai(reason: &str) -> Self {
        match reason {
            "length" => FinishReason::OutputTokens,
            "content_filter" => FinishReason::ContentFilter,
            "tool_calls" => FinishReason::ToolCalls,
            _ => FinishReason::Stop,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Usage {
    pub prompt_tokens: Option<u32>,
    pub completion_tokens: Option<u32>,
}

impl AddAssign for Usage {
    fn add_assign(&mut self, other: Self) {
        fn add(a: Option<u32>, b: Option<u32>) -> Option<u32> {
            match (a, b) {
                (Some(a), Some(b)) => Some(a + b),
                (a, b) => a.or(b),
            }
        }
        self.prompt_tokens = add(self.prompt_tokens, other.prompt_tokens);
        self.completion_tokens = add(self.completion_tokens, other.completion_tokens);
    }
}

/// A completion endpoint reply.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub turn: AssistantTurn,
    pub usage: Option<Usage>,
    pub finish: FinishReason,
}

impl Response {
    pub fn new(turn: AssistantTurn) -> Self {
        Self {
            turn,
            usage: None,
            finish: FinishReason::Stop,
        }
    }
}
