#![allow(dead_code)]

use async_trait::async_trait;
use mcp_relay::client::{Client, ClientError};
use mcp_relay::model::{AssistantTurn, Response, ToolDescriptor, ToolInvocationRequest, Transcript};
use mcp_relay::options::{ModelOptions, TransportOptions};
use mcp_relay::tools::{ToolError, ToolService};
use serde_json::{json, Map, Value};
use std::sync::{Arc, Mutex};

/// Completion client answering from a script and recording every transcript it is sent.
#[derive(Clone)]
pub struct MockClient {
    responses: Arc<Mutex<Vec<Result<Response, ClientError>>>>,
    pub requests: Arc<Mutex<Vec<Transcript>>>,
    pub tool_snapshots: Arc<Mutex<Vec<Vec<ToolDescriptor>>>>,
    model_options: ModelOptions<()>,
    transport_options: TransportOptions,
}

impl MockClient {
    pub fn new(responses: Vec<Result<Response, ClientError>>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses)),
            requests: Arc::new(Mutex::new(Vec::new())),
            tool_snapshots: Arc::new(Mutex::new(Vec::new())),
            model_options: ModelOptions::new("mock-model"),
            transport_options: TransportOptions::default(),
        }
    }

    pub fn with_turns(turns: Vec<AssistantTurn>) -> Self {
        Self::new(turns.into_iter().map(|t| Ok(Response::new(t))).collect())
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl Client for MockClient {
    type ModelProvider = ();

    async fn request(
        &self,
        transcript: &Transcript,
        tools: &[ToolDescriptor],
    ) -> Result<Response, ClientError> {
        self.requests.lock().unwrap().push(transcript.clone());
        self.tool_snapshots.lock().unwrap().push(tools.to_vec());
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            Err(ClientError::ProviderError("No more mock responses".to_string()))
        } else {
            responses.remove(0)
        }
    }

    fn model_options(&self) -> &ModelOptions<Self::ModelProvider> {
        &self.model_options
    }

    fn transport_options(&self) -> &TransportOptions {
        &self.transport_options
    }
}

/// In-process registry with canned tool outputs and a call log.
#[derive(Clone, Default)]
pub struct MockRegistry {
    tools: Vec<ToolDescriptor>,
    outputs: Arc<Mutex<Vec<(String, Result<String, String>)>>>,
    pub calls: Arc<Mutex<Vec<(String, Map<String, Value>)>>>,
}

impl MockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool answering every call with `output`; `Err` simulates a failing upstream.
    pub fn tool(mut self, name: &str, output: Result<&str, &str>) -> Self {
        let schema = match json!({ "type": "object" }) {
            Value::Object(map) => map,
            _ => unreachable!(),
        };
        self.tools.push(ToolDescriptor::new(name, format!("{} tool", name), schema));
        self.outputs.lock().unwrap().push((
            name.to_string(),
            output.map(str::to_string).map_err(str::to_string),
        ));
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl ToolService for MockRegistry {
    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, ToolError> {
        Ok(self.tools.clone())
    }

    async fn call_tool(&self, name: &str, args: Map<String, Value>) -> Result<String, ToolError> {
        self.calls.lock().unwrap().push((name.to_string(), args));
        let outputs = self.outputs.lock().unwrap();
        match outputs.iter().find(|(n, _)| n == name) {
            Some((_, Ok(text))) => Ok(text.clone()),
            Some((_, Err(cause))) => Err(ToolError::Execution {
                tool_name: name.to_string(),
                cause: cause.clone(),
            }),
            None => Err(ToolError::UnknownTool(name.to_string())),
        }
    }
}

pub fn call(id: &str, name: &str, arguments: &str) -> ToolInvocationRequest {
    ToolInvocationRequest::new(id, name, arguments)
}

pub fn tool_calls(calls: Vec<ToolInvocationRequest>) -> AssistantTurn {
    AssistantTurn::from_parts(None, calls)
}

pub fn text(content: &str) -> AssistantTurn {
    AssistantTurn::Text(content.to_string())
}

/// Upstream stand-in answering fixed JSON per URL; unknown URLs fail like a 404.
#[derive(Clone, Default)]
pub struct MockFetch {
    routes: Arc<Mutex<Vec<(String, Value)>>>,
    pub requested: Arc<Mutex<Vec<String>>>,
}

impl MockFetch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(self, url: &str, body: Value) -> Self {
        self.routes.lock().unwrap().push((url.to_string(), body));
        self
    }
}

#[async_trait]
impl mcp_relay::fetch::Fetch for MockFetch {
    async fn get_json(
        &self,
        url: &str,
        _params: &[(&str, &str)],
    ) -> Result<Value, mcp_relay::fetch::FetchError> {
        self.requested.lock().unwrap().push(url.to_string());
        self.routes
            .lock()
            .unwrap()
            .iter()
            .find(|(u, _)| u == url)
            .map(|(_, body)| body.clone())
            .ok_or_else(|| mcp_relay::fetch::FetchError::Status {
                url: url.to_string(),
                status: 404,
            })
    }
}
