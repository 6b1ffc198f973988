//! OpenAI API client implementation.

use crate::api::openai::{OpenAiCompatibleClient, OpenAiCompatibleModel};
use crate::client::ClientError;
use crate::options::{ModelOptions, TransportOptions};
use crate::providers::Provider;
use serde::{Deserialize, Serialize};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_MAX_TOKENS: u32 = 1000;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OpenAiModel;

impl OpenAiCompatibleModel for OpenAiModel {}

pub type OpenAiClient = OpenAiCompatibleClient<OpenAiModel>;

pub struct OpenAi;

impl Provider for OpenAi {
    type Client = OpenAiClient;

    fn create(api_key: String) -> Result<Self::Client, ClientError> {
        OpenAiClient::new(
            api_key,
            DEFAULT_BASE_URL.to_string(),
            ModelOptions::new(DEFAULT_MODEL).with_max_tokens(DEFAULT_MAX_TOKENS),
            TransportOptions::default(),
        )
    }

    fn create_with_options(
        api_key: String,
        base_url: Option<String>,
        model_options: ModelOptions<OpenAiModel>,
        transport_options: TransportOptions,
    ) -> Result<Self::Client, ClientError> {
        OpenAiClient::new(
            api_key,
            base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            model_options,
            transport_options,
        )
    }
}
