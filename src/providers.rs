//! Completion providers.

use crate::client::{Client, ClientError};
use crate::options::{ModelOptions, TransportOptions};

/// Trait for LLM providers that can create configured clients.
pub trait Provider {
    /// The client type produced by this provider.
    type Client: Client;

    /// Create a new client with the given API key and the provider's defaults.
    fn create(api_key: String) -> Result<Self::Client, ClientError>;

    /// Create a new client with custom options.
    fn create_with_options(
        api_key: String,
        base_url: Option<String>,
        model_options: ModelOptions<<Self::Client as Client>::ModelProvider>,
        transport_options: TransportOptions,
    ) -> Result<Self::Client, ClientError>;
}

pub mod openai;

pub use openai::{OpenAi, OpenAiClient, OpenAiModel};
