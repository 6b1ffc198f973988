//! OpenAI Chat Completions API client implementation.
//!
//! Works against any endpoint speaking the Chat Completions wire format.
//! See: <https://platform.openai.com/docs/api-reference/chat>

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::client::{Client, ClientError};
use crate::http::{add_extra_headers, build_http_client, RequestBuilderExt, ResponseExt};
use crate::model::{
    AssistantTurn, FinishReason, Response, ToolDescriptor, ToolInvocationRequest, Transcript, Turn,
    Usage,
};
use crate::options::{ModelOptions, ToolChoice, TransportOptions};

/// Trait for models compatible with OpenAI's Chat Completions API.
pub trait OpenAiCompatibleModel:
    Send + Sync + Default + Serialize + for<'de> Deserialize<'de> + Clone
{
}

impl OpenAiCompatibleModel for () {}

/// Generic client for OpenAI-compatible Chat Completions APIs.
#[derive(Debug, Clone)]
pub struct OpenAiCompatibleClient<M> {
    api_key: String,
    base_url: String,
    model_options: ModelOptions<M>,
    transport_options: TransportOptions,
    http: reqwest::Client,
}

impl<M: OpenAiCompatibleModel> OpenAiCompatibleClient<M> {
    /// Create a new client.
    pub fn new(
        api_key: String,
        base_url: String,
        model_options: ModelOptions<M>,
        transport_options: TransportOptions,
    ) -> Result<Self, ClientError> {
        let http = build_http_client(&transport_options)?;
        Ok(Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model_options,
            transport_options,
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Handle error responses.
    fn handle_error_response(status: reqwest::StatusCode, body: &str) -> ClientError {
        if let Ok(error_resp) = serde_json::from_str::<ChatErrorResponse>(body) {
            ClientError::ProviderError(format!(
                "API error ({}): {}",
                error_resp.error.error_type.unwrap_or_else(|| status.to_string()),
                error_resp.error.message
            ))
        } else {
            ClientError::ProviderError(format!("HTTP {}: {}", status, body))
        }
    }
}

#[async_trait]
impl<M: OpenAiCompatibleModel> Client for OpenAiCompatibleClient<M> {
    type ModelProvider = M;

    async fn request(
        &self,
        transcript: &Transcript,
        tools: &[ToolDescriptor],
    ) -> Result<Response, ClientError> {
        if self.model_options.model.is_empty() {
            return Err(ClientError::Config("Model must be specified".to_string()));
        }

        let url = format!("{}/v1/chat/completions", self.base_url);
        let request_body = ChatRequest::new(transcript, &self.model_options, tools);

        let mut req = self
            .http
            .post(&url)
            .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
            .header(CONTENT_TYPE, "application/json");

        req = add_extra_headers(req, &self.transport_options);

        let response = req.json_logged(&request_body).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text_logged().await.unwrap_or_default();
            return Err(Self::handle_error_response(status, &body));
        }

        let chat_response: ChatResponse = response.json_logged().await?;
        chat_response.into_response()
    }

    fn model_options(&self) -> &ModelOptions<Self::ModelProvider> {
        &self.model_options
    }

    fn transport_options(&self) -> &TransportOptions {
        &self.transport_options
    }
}

impl<M: OpenAiCompatibleModel> ChatRequest<M> {
    fn new(transcript: &Transcript, model_options: &ModelOptions<M>, tool_defs: &[ToolDescriptor]) -> Self {
        let mut messages = Vec::with_capacity(transcript.len() + 1);
        if let Some(system) = &model_options.system {
            messages.push(ChatMessage::text("system", system.clone()));
        }
        messages.extend(chat_messages(transcript));

        let tools: Vec<ChatTool> = tool_defs
            .iter()
            .map(|def| ChatTool {
                tool_type: "function".to_string(),
                function: ChatFunction {
                    name: def.name.clone(),
                    description: Some(def.description.clone()).filter(|d| !d.is_empty()),
                    parameters: Value::Object(def.input_schema.clone()),
                },
            })
            .collect();

        // tool_choice is rejected by the API when no tools are sent.
        let (tools, tool_choice) = if tools.is_empty() {
            (None, None)
        } else {
            (Some(tools), Some(model_options.tool_choice))
        };

        ChatRequest {
            model: model_options.model.clone(),
            messages,
            temperature: model_options.temperature,
            max_tokens: model_options.max_tokens,
            tools,
            tool_choice,
            provider_options: model_options.provider.clone(),
        }
    }
}

/// Convert a transcript into Chat Completions messages.
///
/// Consecutive tool requests, together with assistant text emitted just before them,
/// are folded into a single assistant message carrying all of the tool calls.
fn chat_messages(transcript: &Transcript) -> Vec<ChatMessage> {
    let mut messages: Vec<ChatMessage> = Vec::new();
    let mut previous_was_assistant_text = false;

    for turn in transcript.turns() {
        match turn {
            Turn::User { text } => messages.push(ChatMessage::text("user", text.clone())),
            Turn::AssistantText { text } => {
                messages.push(ChatMessage::text("assistant", text.clone()))
            }
            Turn::ToolRequest(request) => {
                let call = ChatToolCall {
                    id: request.id.clone(),
                    tool_type: "function".to_string(),
                    function: ChatFunctionCall {
                        name: request.tool_name.clone(),
                        arguments: request.arguments.clone(),
                    },
                };
                match messages.last_mut() {
                    Some(last)
                        if last.role == "assistant"
                            && (last.tool_calls.is_some() || previous_was_assistant_text) =>
                    {
                        last.tool_calls.get_or_insert_with(Vec::new).push(call);
                    }
                    _ => messages.push(ChatMessage {
                        role: "assistant".to_string(),
                        content: None,
                        tool_calls: Some(vec![call]),
                        tool_call_id: None,
                    }),
                }
            }
            Turn::ToolResult(result) => messages.push(ChatMessage {
                role: "tool".to_string(),
                content: Some(result.content.clone()),
                tool_calls: None,
                tool_call_id: Some(result.id.clone()),
            }),
        }
        previous_was_assistant_text = matches!(turn, Turn::AssistantText { .. });
    }

    messages
}

impl ChatResponse {
    fn into_response(self) -> Result<Response, ClientError> {
        let usage = self.usage.map(|u| Usage {
            prompt_tokens: Some(u.prompt_tokens),
            completion_tokens: Some(u.completion_tokens),
        });

        let choice = self
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ClientError::ProviderError("Response contained no choices".to_string()))?;

        let finish = choice
            .finish_reason
            .as_deref()
            .map(FinishReason::from_openai)
            .unwrap_or_default();

        let calls: Vec<ToolInvocationRequest> = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|call| ToolInvocationRequest {
                id: call.id,
                tool_name: call.function.name,
                arguments: call.function.arguments,
            })
            .collect();

        debug!("Completion finished with {:?} and {} tool call(s)", finish, calls.len());

        Ok(Response {
            turn: AssistantTurn::from_parts(choice.message.content, calls),
            usage,
            finish,
        })
    }
}

// --- Chat Completions API Types ---

#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Serialize)]
struct ChatRequest<M> {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
    tools: Option<Vec<ChatTool>>,
    tool_choice: Option<ToolChoice>,
    #[serde(flatten)]
    provider_options: M,
}

#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: Option<String>,
    tool_calls: Option<Vec<ChatToolCall>>,
    tool_call_id: Option<String>,
}

impl ChatMessage {
    fn text(role: &str, content: String) -> Self {
        Self {
            role: role.to_string(),
            content: Some(content),
            tool_calls: None,
            tool_call_id: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ChatToolCall {
    id: String,
    #[serde(rename = "type")]
    tool_type: String,
    function: ChatFunctionCall,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ChatFunctionCall {
    name: String,
    #[serde(default)]
    arguments: String,
}

#[derive(Debug, Clone, Serialize)]
struct ChatTool {
    #[serde(rename = "type")]
    tool_type: String,
    function: ChatFunction,
}

#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Serialize)]
struct ChatFunction {
    name: String,
    description: Option<String>,
    parameters: Value,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    usage: Option<ChatUsage>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatErrorResponse {
    error: ChatError,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatError {
    #[serde(rename = "type")]
    error_type: Option<String>,
    message: String,
}
