//! Model and transport options for completion clients.

use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use std::collections::HashMap;
use std::time::Duration;

/// How the model may use the tools it is offered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolChoice {
    /// The model decides whether to call tools.
    #[default]
    Auto,
    /// Tools are listed but must not be called.
    None,
    /// The model must call at least one tool.
    Required,
}

/// Model behavior parameters plus provider-specific configuration `T`.
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelOptions<T> {
    /// Model identifier (e.g., "gpt-4o-mini").
    pub model: String,

    /// System instructions sent ahead of the transcript.
    pub system: Option<String>,

    /// Temperature for sampling (0.0 - 2.0).
    pub temperature: Option<f32>,

    /// Maximum tokens to generate per completion.
    pub max_tokens: Option<u32>,

    pub tool_choice: ToolChoice,

    /// Provider-specific model options.
    pub provider: T,
}

impl<T: Default> ModelOptions<T> {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            system: None,
            temperature: None,
            max_tokens: None,
            tool_choice: ToolChoice::Auto,
            provider: T::default(),
        }
    }
}

impl<T> ModelOptions<T> {
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_tool_choice(mut self, tool_choice: ToolChoice) -> Self {
        self.tool_choice = tool_choice;
        self
    }
}

/// HTTP transport configuration.
#[derive(Debug, Clone, Default)]
pub struct TransportOptions {
    /// Request timeout. If None, the reqwest default is used.
    pub timeout: Option<Duration>,
    /// HTTP proxy URL.
    pub proxy: Option<String>,
    /// Additional HTTP headers sent with every request.
    pub headers: HashMap<String, String>,
}

impl TransportOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, duration: Duration) -> Self {
        self.timeout = Some(duration);
        self
    }

    pub fn with_proxy(mut self, proxy_url: impl Into<String>) -> Self {
        self.proxy = Some(proxy_url.into());
        self
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_options_builder() {
        let options = TransportOptions::new()
            .with_timeout(Duration::from_secs(30))
            .with_proxy("http://proxy.example.com")
            .with_header("X-Custom-Header", "Value");

        assert_eq!(options.timeout, Some(Duration::from_secs(30)));
        assert_eq!(options.proxy.as_deref(), Some("http://proxy.example.com"));
        assert_eq!(options.headers.get("X-Custom-Header").map(String::as_str), Some("Value"));
    }

    #[test]
    fn model_options_defaults_to_auto_tool_choice() {
        let options: ModelOptions<()> = ModelOptions::new("gpt-4o-mini").with_max_tokens(1000);

        assert_eq!(options.model, "gpt-4o-mini");
        assert_eq!(options.max_tokens, Some(1000));
        assert_eq!(options.temperature, None);
        assert_eq!(options.tool_choice, ToolChoice::Auto);
    }
}
