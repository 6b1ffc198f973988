//! Upstream JSON lookups used by the tool servers.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use crate::http::{add_extra_headers, build_http_client, LoggedBodyError, ResponseExt};
use crate::options::TransportOptions;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{url} answered with status {status}")]
    Status { url: String, status: u16 },

    #[error("Unexpected response shape: {0}")]
    Decode(#[from] serde_json::Error),
}

impl From<LoggedBodyError> for FetchError {
    fn from(err: LoggedBodyError) -> Self {
        match err {
            LoggedBodyError::Http(e) => FetchError::Http(e),
            LoggedBodyError::Parse(e) => FetchError::Decode(e),
        }
    }
}

/// A GET request returning JSON.
#[async_trait]
pub trait Fetch: Send + Sync {
    async fn get_json(&self, url: &str, params: &[(&str, &str)]) -> Result<Value, FetchError>;
}

/// Fetch and decode into a typed response in one step.
pub async fn fetch_as<T: DeserializeOwned>(
    fetcher: &dyn Fetch,
    url: &str,
    params: &[(&str, &str)],
) -> Result<T, FetchError> {
    let value = fetcher.get_json(url, params).await?;
    Ok(serde_json::from_value(value)?)
}

/// reqwest-backed [`Fetch`] sending a fixed set of headers with every request.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    http: reqwest::Client,
    transport_options: TransportOptions,
}

impl HttpFetcher {
    pub fn new(transport_options: TransportOptions) -> Result<Self, FetchError> {
        let http = build_http_client(&transport_options)?;
        Ok(Self {
            http,
            transport_options,
        })
    }
}

#[async_trait]
impl Fetch for HttpFetcher {
    async fn get_json(&self, url: &str, params: &[(&str, &str)]) -> Result<Value, FetchError> {
        tracing::debug!("GET {}", url);
        let mut req = self.http.get(url);
        if !params.is_empty() {
            req = req.query(params);
        }
        req = add_extra_headers(req, &self.transport_options);

        let response = req.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text_logged().await.unwrap_or_default();
            tracing::debug!("Upstream error body: {}", body);
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(response.json_logged().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::Method::GET;
    use httpmock::MockServer;
    use serde_json::json;

    fn fetcher() -> HttpFetcher {
        HttpFetcher::new(
            TransportOptions::new()
                .with_header("User-Agent", "weather-app/1.0")
                .with_header("Accept", "application/geo+json"),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn sends_headers_and_query() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/getVhcleKndList")
                .query_param("_type", "json")
                .header("user-agent", "weather-app/1.0")
                .header("accept", "application/geo+json");
            then.status(200).json_body(json!({ "ok": true }));
        });

        let value = fetcher()
            .get_json(&server.url("/getVhcleKndList"), &[("_type", "json")])
            .await
            .unwrap();

        mock.assert();
        assert_eq!(value["ok"], true);
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/alerts/active/area/ZZ");
            then.status(404).body("not found");
        });

        let err = fetcher()
            .get_json(&server.url("/alerts/active/area/ZZ"), &[])
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Status { status: 404, .. }));
    }

    #[tokio::test]
    async fn malformed_json_is_a_decode_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/points/1,2");
            then.status(200).body("<html>");
        });

        let err = fetcher().get_json(&server.url("/points/1,2"), &[]).await.unwrap_err();
        assert!(matches!(err, FetchError::Decode(_)));
    }
}
