//! Core client trait and error types.

use async_trait::async_trait;
use thiserror::Error;

use crate::http::LoggedBodyError;
use crate::model::{Response, ToolDescriptor, Transcript};
use crate::options::{ModelOptions, TransportOptions};

/// Errors that can occur during client operations.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Provider error: {0}")]
    ProviderError(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<LoggedBodyError> for ClientError {
    fn from(err: LoggedBodyError) -> Self {
        match err {
            LoggedBodyError::Http(e) => ClientError::Http(e),
            LoggedBodyError::Parse(e) => ClientError::Parse(e),
        }
    }
}

/// A chat completion endpoint that may answer with text or tool calls.
#[async_trait]
pub trait Client: Send + Sync {
    /// Provider-specific model options type.
    type ModelProvider: Send + Sync;

    /// Send the transcript and the tool snapshot, returning one assistant turn.
    async fn request(
        &self,
        transcript: &Transcript,
        tools: &[ToolDescriptor],
    ) -> Result<Response, ClientError>;

    /// Get reference to the model options.
    fn model_options(&self) -> &ModelOptions<Self::ModelProvider>;

    /// Get reference to the transport options.
    fn transport_options(&self) -> &TransportOptions;
}
