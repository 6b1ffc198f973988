//! Environment-driven configuration for the binaries.
//!
//! Values come from the process environment, after a `.env` file in the working
//! directory has been loaded (see [`load_dotenv`]). Every loader is also available
//! as `from_lookup` so it can be driven by something other than the real environment.

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use crate::mcp::ServerTarget;
use crate::options::{ModelOptions, TransportOptions};
use crate::providers::openai::{OpenAiModel, DEFAULT_BASE_URL, DEFAULT_MAX_TOKENS, DEFAULT_MODEL};
use crate::servers::ServeMode;

pub const CLIENT_USAGE: &str =
    "Usage: mcp-client <path_to_server_script | server_url> [more servers...]";
pub const SERVER_USAGE: &str = "Usage: <server> [--http <address>]";

pub const NWS_API_BASE: &str = "https://api.weather.gov";
pub const NWS_USER_AGENT: &str = "weather-app/1.0";
pub const OPEN_DATA_API_BASE: &str = "http://apis.data.go.kr/1613000/TrainInfoService";
pub const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("Invalid value {value:?} for {key}: {cause}")]
    Invalid {
        key: &'static str,
        value: String,
        cause: String,
    },

    #[error("{0}")]
    Usage(String),
}

/// Load `.env` from the working directory if one exists.
pub fn load_dotenv() {
    match dotenvy::dotenv() {
        Ok(path) => tracing::debug!("Loaded environment from {}", path.display()),
        Err(e) if e.not_found() => {}
        Err(e) => tracing::warn!("Ignoring unreadable .env file: {}", e),
    }
}

fn parse_var<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key).filter(|v| !v.trim().is_empty()) {
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|e: T::Err| ConfigError::Invalid {
                key,
                value,
                cause: e.to_string(),
            }),
        None => Ok(None),
    }
}

/// Completion endpoint and loop settings for `mcp-client`.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub max_rounds: usize,
    pub timeout: Option<Duration>,
}

impl ClientConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_key = lookup("OPENAI_API_KEY")
            .filter(|k| !k.trim().is_empty())
            .ok_or(ConfigError::Missing("OPENAI_API_KEY"))?;

        let max_rounds: usize = parse_var(&lookup, "MCP_RELAY_MAX_ROUNDS")?.unwrap_or(1);
        if max_rounds == 0 {
            return Err(ConfigError::Invalid {
                key: "MCP_RELAY_MAX_ROUNDS",
                value: "0".to_string(),
                cause: "at least one round of tool calls is required".to_string(),
            });
        }

        Ok(Self {
            api_key,
            base_url: lookup("OPENAI_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            model: lookup("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            max_tokens: parse_var(&lookup, "OPENAI_MAX_TOKENS")?.unwrap_or(DEFAULT_MAX_TOKENS),
            max_rounds,
            timeout: parse_var(&lookup, "OPENAI_TIMEOUT_SECS")?.map(Duration::from_secs),
        })
    }

    pub fn model_options(&self) -> ModelOptions<OpenAiModel> {
        ModelOptions::new(self.model.clone()).with_max_tokens(self.max_tokens)
    }

    pub fn transport_options(&self) -> TransportOptions {
        match self.timeout {
            Some(timeout) => TransportOptions::new().with_timeout(timeout),
            None => TransportOptions::new(),
        }
    }
}

/// Upstream settings for `weather-server`.
#[derive(Debug, Clone)]
pub struct WeatherConfig {
    pub base_url: String,
}

impl WeatherConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            base_url: lookup("NWS_API_BASE").unwrap_or_else(|| NWS_API_BASE.to_string()),
        }
    }

    pub fn transport_options(&self) -> TransportOptions {
        TransportOptions::new()
            .with_timeout(UPSTREAM_TIMEOUT)
            .with_header("User-Agent", NWS_USER_AGENT)
            .with_header("Accept", "application/geo+json")
    }
}

/// Upstream settings for `train-server`.
#[derive(Debug, Clone)]
pub struct TrainConfig {
    pub base_url: String,
    pub service_key: Option<String>,
}

impl TrainConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            base_url: lookup("TRAIN_API_BASE").unwrap_or_else(|| OPEN_DATA_API_BASE.to_string()),
            service_key: lookup("OPEN_DATA_API_KEY").filter(|k| !k.trim().is_empty()),
        }
    }

    pub fn transport_options(&self) -> TransportOptions {
        TransportOptions::new()
            .with_timeout(UPSTREAM_TIMEOUT)
            .with_header("User-Agent", NWS_USER_AGENT)
            .with_header("Accept", "application/json")
    }
}

/// Server targets from the client's positional arguments (program name excluded).
pub fn server_targets(args: &[String]) -> Result<Vec<ServerTarget>, ConfigError> {
    if args.is_empty() {
        return Err(ConfigError::Usage(CLIENT_USAGE.to_string()));
    }
    args.iter()
        .map(|arg| ServerTarget::parse(arg).map_err(|e| ConfigError::Usage(format!("{}\n{}", e, CLIENT_USAGE))))
        .collect()
}

/// Serve mode from a tool server's arguments (program name excluded).
pub fn serve_mode(args: &[String]) -> Result<ServeMode, ConfigError> {
    match args {
        [] => Ok(ServeMode::Stdio),
        [flag, addr] if flag == "--http" => addr
            .parse::<SocketAddr>()
            .map(ServeMode::Http)
            .map_err(|e| ConfigError::Invalid {
                key: "--http",
                value: addr.clone(),
                cause: e.to_string(),
            }),
        _ => Err(ConfigError::Usage(SERVER_USAGE.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn client_config_defaults() {
        let config = ClientConfig::from_lookup(lookup(&[("OPENAI_API_KEY", "sk-test")])).unwrap();
        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.max_tokens, 1000);
        assert_eq!(config.max_rounds, 1);
        assert_eq!(config.base_url, "https://api.openai.com");
        assert!(config.timeout.is_none());
    }

    #[test]
    fn client_config_requires_api_key() {
        assert!(matches!(
            ClientConfig::from_lookup(lookup(&[])),
            Err(ConfigError::Missing("OPENAI_API_KEY"))
        ));
    }

    #[test]
    fn invalid_numbers_are_reported() {
        let err = ClientConfig::from_lookup(lookup(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("MCP_RELAY_MAX_ROUNDS", "many"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "MCP_RELAY_MAX_ROUNDS", .. }));
    }

    #[test]
    fn zero_rounds_are_rejected() {
        let err = ClientConfig::from_lookup(lookup(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("MCP_RELAY_MAX_ROUNDS", "0"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "MCP_RELAY_MAX_ROUNDS", .. }));

        let config = ClientConfig::from_lookup(lookup(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("MCP_RELAY_MAX_ROUNDS", "3"),
        ]))
        .unwrap();
        assert_eq!(config.max_rounds, 3);
    }

    #[test]
    fn missing_server_argument_is_a_usage_error() {
        assert!(matches!(server_targets(&[]), Err(ConfigError::Usage(_))));
        let targets = server_targets(&["weather.py".to_string()]).unwrap();
        assert_eq!(targets.len(), 1);
    }

    #[test]
    fn serve_mode_parses_http_flag() {
        assert_eq!(serve_mode(&[]).unwrap(), ServeMode::Stdio);
        assert_eq!(
            serve_mode(&["--http".into(), "127.0.0.1:8000".into()]).unwrap(),
            ServeMode::Http("127.0.0.1:8000".parse().unwrap())
        );
        assert!(serve_mode(&["--stdio".into()]).is_err());
    }
}
