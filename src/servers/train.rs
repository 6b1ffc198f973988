//! Train vehicle-type lookup backed by the public transit open data API.

use itertools::Itertools;
use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{Implementation, ServerCapabilities, ServerInfo};
use rmcp::{tool, tool_handler, tool_router, ServerHandler};
use serde::Deserialize;
use serde_with::{serde_as, OneOrMany};
use std::sync::Arc;
use tracing::{info, warn};

use crate::fetch::{fetch_as, Fetch};

pub const VEHICLE_KINDS_UNAVAILABLE: &str = "Unable to fetch train vehicle types.";

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct TrainCodeArgs {
    #[schemars(description = "Exact vehicle type name, e.g. KTX")]
    pub train_name: String,
}

// --- Open data response shapes ---

#[derive(Debug, Deserialize)]
struct VehicleKindEnvelope {
    response: VehicleKindResponse,
}

#[derive(Debug, Deserialize)]
struct VehicleKindResponse {
    body: VehicleKindBody,
}

#[derive(Debug, Deserialize)]
struct VehicleKindBody {
    items: VehicleKindItems,
}

/// The API sends an empty string instead of an object when there are no items.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum VehicleKindItems {
    Listed(VehicleKindList),
    Empty(serde::de::IgnoredAny),
}

#[serde_as]
#[derive(Debug, Deserialize)]
struct VehicleKindList {
    #[serde_as(as = "OneOrMany<_>")]
    item: Vec<VehicleKind>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct VehicleKind {
    #[serde(rename = "vehiclekndid")]
    pub code: String,
    #[serde(rename = "vehiclekndnm")]
    pub name: String,
}

impl VehicleKindItems {
    fn into_vec(self) -> Vec<VehicleKind> {
        match self {
            VehicleKindItems::Listed(list) => list.item,
            VehicleKindItems::Empty(_) => Vec::new(),
        }
    }
}

/// MCP server exposing `get_train_code`.
#[derive(Clone)]
pub struct TrainServer {
    fetcher: Arc<dyn Fetch>,
    base_url: String,
    service_key: Option<String>,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl TrainServer {
    pub fn new(
        fetcher: Arc<dyn Fetch>,
        base_url: impl Into<String>,
        service_key: Option<String>,
    ) -> Self {
        Self {
            fetcher,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            service_key,
            tool_router: Self::tool_router(),
        }
    }

    #[tool(description = "Look up the vehicle type code of a train by its exact vehicle type name.")]
    async fn get_train_code(
        &self,
        Parameters(TrainCodeArgs { train_name }): Parameters<TrainCodeArgs>,
    ) -> String {
        self.train_code(&train_name).await
    }
}

impl TrainServer {
    /// Every vehicle type the API lists.
    pub async fn vehicle_kinds(&self) -> Result<Vec<VehicleKind>, crate::fetch::FetchError> {
        let url = format!("{}/getVhcleKndList", self.base_url);
        let mut params = vec![("_type", "json")];
        if let Some(key) = &self.service_key {
            params.push(("serviceKey", key.as_str()));
        }

        let envelope: VehicleKindEnvelope = fetch_as(self.fetcher.as_ref(), &url, &params).await?;
        Ok(envelope.response.body.items.into_vec())
    }

    /// Vehicle types whose name matches `train_name` exactly, formatted for the model.
    pub async fn train_code(&self, train_name: &str) -> String {
        info!("Looking up vehicle type {}", train_name);
        let kinds = match self.vehicle_kinds().await {
            Ok(kinds) => kinds,
            Err(e) => {
                warn!("Vehicle type lookup failed: {}", e);
                return VEHICLE_KINDS_UNAVAILABLE.to_string();
            }
        };

        let matches: Vec<&VehicleKind> = kinds.iter().filter(|k| k.name == train_name).collect();
        if matches.is_empty() {
            return format!("No vehicle type named {}.", train_name);
        }

        matches
            .iter()
            .map(|k| format!("Code: {}\nName: {}", k.code, k.name))
            .join("\n---\n")
    }
}

#[tool_handler]
impl ServerHandler for TrainServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "train".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            instructions: Some("Train vehicle type codes from the public transit open data API.".into()),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn single_item_decodes_as_list() {
        let body: VehicleKindBody = serde_json::from_value(json!({
            "items": { "item": { "vehiclekndid": "00", "vehiclekndnm": "KTX" } }
        }))
        .unwrap();
        assert_eq!(
            body.items.into_vec(),
            vec![VehicleKind {
                code: "00".into(),
                name: "KTX".into()
            }]
        );
    }

    #[test]
    fn empty_items_string_decodes_as_no_items() {
        let body: VehicleKindBody = serde_json::from_value(json!({ "items": "" })).unwrap();
        assert!(body.items.into_vec().is_empty());
    }
}
