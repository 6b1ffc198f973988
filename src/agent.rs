//! Agent struct driving the tool-calling conversation loop.

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::client::{Client, ClientError};
use crate::model::{
    AssistantTurn, ToolDescriptor, ToolInvocationRequest, ToolInvocationResult, Transcript, Turn,
    Usage,
};
use crate::tools::{ToolError, ToolService};

/// Answer returned when the model produces neither text nor tool calls.
pub const NO_ANSWER: &str = "No answer was produced.";

/// Errors that end a single `run` call.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("Query must not be empty")]
    EmptyQuery,

    #[error(transparent)]
    Completion(#[from] ClientError),

    #[error("Failed to list tools: {0}")]
    Registry(#[from] ToolError),
}

/// Outcome of one query: the final answer plus the transcript that produced it.
#[derive(Debug, Clone)]
pub struct Conversation {
    pub answer: String,
    pub transcript: Transcript,
    pub usage: Usage,
    /// Number of tool-resolution rounds that were executed.
    pub rounds: usize,
}

/// Agent that resolves model tool calls against a tool registry.
///
/// Each query gets its own transcript:
/// 1. The query is sent with the registry's tool snapshot
/// 2. Requested tools are executed in the order the model emitted them
/// 3. Results are appended and the model is asked again
/// 4. This repeats for at most `max_rounds` rounds of tool resolution
///
/// Tool failures are reported to the model as error results; only a failing
/// completion call ends the query with an error.
///
/// # Example
/// ```ignore
/// let client = OpenAi::create(api_key)?;
/// let agent = Agent::new(client).with_registry(session);
///
/// let answer = agent.run("What are the weather alerts in California").await?;
/// ```
pub struct Agent<C: Client> {
    client: C,
    max_rounds: usize,
    registry: Option<Box<dyn ToolService>>,
}

impl<C: Client> Agent<C> {
    /// Create a new agent with no tools and a single round of tool resolution.
    pub fn new(client: C) -> Self {
        Self {
            client,
            max_rounds: 1,
            registry: None,
        }
    }

    /// Set the tool registry for the agent.
    pub fn with_registry<S: ToolService + 'static>(mut self, registry: S) -> Self {
        self.registry = Some(Box::new(registry));
        self
    }

    /// Set how many rounds of tool calls are executed per query (at least one).
    pub fn with_max_rounds(mut self, max: usize) -> Self {
        self.max_rounds = max.max(1);
        self
    }

    pub fn max_rounds(&self) -> usize {
        self.max_rounds
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Snapshot of the tools offered to the model.
    pub async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, ToolError> {
        match &self.registry {
            Some(registry) => registry.list_tools().await,
            None => Ok(Vec::new()),
        }
    }

    /// Answer a query, executing whatever tools the model asks for.
    pub async fn run(&self, query: &str) -> Result<String, AgentError> {
        self.run_with_transcript(query).await.map(|c| c.answer)
    }

    /// Like [`Agent::run`], but also hands back the transcript.
    pub async fn run_with_transcript(&self, query: &str) -> Result<Conversation, AgentError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(AgentError::EmptyQuery);
        }

        let mut transcript = Transcript::new();
        transcript.push(Turn::User {
            text: query.to_string(),
        });

        let tools = self.list_tools().await?;
        debug!("Starting agent loop with {} tool(s)", tools.len());

        let mut usage = Usage::default();
        let mut rounds = 0;

        loop {
            debug!("Requesting completion after {} round(s)", rounds);
            let response = self.client.request(&transcript, &tools).await?;
            if let Some(u) = response.usage {
                usage += u;
            }

            let answer = match response.turn {
                AssistantTurn::Text(text) if !text.trim().is_empty() => {
                    transcript.push(Turn::AssistantText { text: text.clone() });
                    text
                }
                AssistantTurn::Text(_) | AssistantTurn::Empty => {
                    debug!("Model returned neither text nor tool calls");
                    NO_ANSWER.to_string()
                }
                AssistantTurn::ToolCalls { text, calls } => {
                    if let Some(text) = &text {
                        transcript.push(Turn::AssistantText { text: text.clone() });
                    }

                    if rounds >= self.max_rounds {
                        warn!(
                            "Max rounds ({}) reached, leaving {} tool call(s) unexecuted",
                            self.max_rounds,
                            calls.len()
                        );
                        text.unwrap_or_else(|| NO_ANSWER.to_string())
                    } else {
                        for call in calls.iter() {
                            transcript.push(Turn::ToolRequest(call.clone()));
                        }
                        for call in calls.iter() {
                            let content = self.invoke(call).await;
                            transcript.push(Turn::ToolResult(ToolInvocationResult {
                                id: call.id.clone(),
                                content,
                            }));
                        }
                        rounds += 1;
                        continue;
                    }
                }
            };

            debug!("Agent loop complete after {} round(s)", rounds);
            return Ok(Conversation {
                answer,
                transcript,
                usage,
                rounds,
            });
        }
    }

    /// Execute one requested call, converting any failure into error content.
    async fn invoke(&self, call: &ToolInvocationRequest) -> String {
        info!("Tool call requested: {}", call.tool_name);
        debug!("Tool arguments: {}", call.arguments);

        let result = match call.decode_arguments() {
            Ok(args) => self.execute_tool(&call.tool_name, args).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(content) => {
                info!("Tool {} executed successfully", call.tool_name);
                debug!("Tool result: {}", content);
                content
            }
            Err(e) => {
                warn!("Tool {} execution failed: {}", call.tool_name, e);
                e.to_result_content()
            }
        }
    }

    async fn execute_tool(&self, name: &str, args: Map<String, Value>) -> Result<String, ToolError> {
        match &self.registry {
            Some(registry) => registry.call_tool(name, args).await,
            None => Err(ToolError::Registry("No tool registry configured".to_string())),
        }
    }
}
