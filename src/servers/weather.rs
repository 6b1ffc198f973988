//! Weather tools backed by the National Weather Service API.

use itertools::Itertools;
use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{Implementation, ServerCapabilities, ServerInfo};
use rmcp::{tool, tool_handler, tool_router, ServerHandler};
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

use crate::fetch::{fetch_as, Fetch};

pub const ALERTS_UNAVAILABLE: &str = "Unable to fetch alerts or no alerts found.";
pub const NO_ACTIVE_ALERTS: &str = "No activate alerts for this state.";
pub const POINTS_UNAVAILABLE: &str = "Unable to fetch forecast data for this location.";
pub const FORECAST_UNAVAILABLE: &str = "Unable to fetch detailed forecast";
pub const NO_FORECAST_PERIODS: &str = "No forecast periods available for this location.";

/// Number of forecast periods included in a forecast.
const FORECAST_PERIODS: usize = 5;

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct AlertsArgs {
    #[schemars(description = "Two-letter US state code (e.g. CA, NY)")]
    pub state: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ForecastArgs {
    #[schemars(description = "Latitude of the location")]
    pub latitude: f64,
    #[schemars(description = "Longitude of the location")]
    pub longitude: f64,
}

// --- NWS response shapes ---

#[derive(Debug, Deserialize)]
struct AlertCollection {
    features: Vec<AlertFeature>,
}

#[derive(Debug, Deserialize)]
struct AlertFeature {
    properties: AlertProperties,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AlertProperties {
    event: Option<String>,
    area_desc: Option<String>,
    severity: Option<String>,
    description: Option<String>,
    instruction: Option<String>,
}

impl fmt::Display for AlertProperties {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Event: {}", self.event.as_deref().unwrap_or("Unknown"))?;
        writeln!(f, "Area: {}", self.area_desc.as_deref().unwrap_or("Unknown"))?;
        writeln!(f, "Severity: {}", self.severity.as_deref().unwrap_or("Unknown"))?;
        writeln!(
            f,
            "Description: {}",
            self.description.as_deref().unwrap_or("No description available")
        )?;
        write!(
            f,
            "Instructions: {}",
            self.instruction
                .as_deref()
                .unwrap_or("No specific instructions provided")
        )
    }
}

#[derive(Debug, Deserialize)]
struct PointsResponse {
    properties: PointsProperties,
}

#[derive(Debug, Deserialize)]
struct PointsProperties {
    forecast: String,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    properties: ForecastProperties,
}

#[derive(Debug, Deserialize)]
struct ForecastProperties {
    periods: Vec<ForecastPeriod>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ForecastPeriod {
    name: String,
    #[serde(default)]
    temperature: Option<Temperature>,
    #[serde(default)]
    temperature_unit: String,
    #[serde(default)]
    wind_speed: String,
    #[serde(default)]
    wind_direction: String,
    #[serde(default)]
    detailed_forecast: String,
}

/// NWS sends a bare number, or a quantitative value when unit conversion is requested.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Temperature {
    Plain(f64),
    Quantity { value: Option<f64> },
    Unrecognized(serde::de::IgnoredAny),
}

impl fmt::Display for Temperature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Temperature::Plain(v) | Temperature::Quantity { value: Some(v) } => write!(f, "{}", v),
            Temperature::Quantity { value: None } | Temperature::Unrecognized(_) => f.write_str("?"),
        }
    }
}

impl fmt::Display for ForecastPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}:", self.name)?;
        match &self.temperature {
            Some(temperature) => writeln!(f, "Temperature: {}°{}", temperature, self.temperature_unit)?,
            None => writeln!(f, "Temperature: ?°{}", self.temperature_unit)?,
        }
        writeln!(f, "Wind: {} {}", self.wind_speed, self.wind_direction)?;
        write!(f, "Forecast: {}", self.detailed_forecast)
    }
}

/// MCP server exposing `get_alerts` and `get_forecast`.
#[derive(Clone)]
pub struct WeatherServer {
    fetcher: Arc<dyn Fetch>,
    base_url: String,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl WeatherServer {
    pub fn new(fetcher: Arc<dyn Fetch>, base_url: impl Into<String>) -> Self {
        Self {
            fetcher,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            tool_router: Self::tool_router(),
        }
    }

    #[tool(description = "Get weather alerts for a US state.")]
    async fn get_alerts(&self, Parameters(AlertsArgs { state }): Parameters<AlertsArgs>) -> String {
        self.alerts(&state).await
    }

    #[tool(description = "Get weather forecast for a location.")]
    async fn get_forecast(
        &self,
        Parameters(ForecastArgs {
            latitude,
            longitude,
        }): Parameters<ForecastArgs>,
    ) -> String {
        self.forecast(latitude, longitude).await
    }
}

impl WeatherServer {
    /// Active alerts for a state, formatted for the model.
    pub async fn alerts(&self, state: &str) -> String {
        info!("Fetching alerts for {}", state);
        let url = format!(
            "{}/alerts/active/area/{}",
            self.base_url,
            state.trim().to_ascii_uppercase()
        );

        let collection: AlertCollection = match fetch_as(self.fetcher.as_ref(), &url, &[]).await {
            Ok(collection) => collection,
            Err(e) => {
                warn!("Alert lookup for {} failed: {}", state, e);
                return ALERTS_UNAVAILABLE.to_string();
            }
        };

        if collection.features.is_empty() {
            return NO_ACTIVE_ALERTS.to_string();
        }

        collection
            .features
            .iter()
            .map(|feature| &feature.properties)
            .join("\n---\n")
    }

    /// Forecast for a point, following the grid forecast URL the points lookup returns.
    pub async fn forecast(&self, latitude: f64, longitude: f64) -> String {
        info!("Fetching forecast for {},{}", latitude, longitude);
        let points_url = format!("{}/points/{},{}", self.base_url, latitude, longitude);

        let points: PointsResponse = match fetch_as(self.fetcher.as_ref(), &points_url, &[]).await {
            Ok(points) => points,
            Err(e) => {
                warn!("Points lookup failed: {}", e);
                return POINTS_UNAVAILABLE.to_string();
            }
        };

        let forecast: ForecastResponse =
            match fetch_as(self.fetcher.as_ref(), &points.properties.forecast, &[]).await {
                Ok(forecast) => forecast,
                Err(e) => {
                    warn!("Forecast lookup failed: {}", e);
                    return FORECAST_UNAVAILABLE.to_string();
                }
            };

        if forecast.properties.periods.is_empty() {
            return NO_FORECAST_PERIODS.to_string();
        }

        forecast
            .properties
            .periods
            .iter()
            .take(FORECAST_PERIODS)
            .join("\n---\n")
    }
}

#[tool_handler]
impl ServerHandler for WeatherServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "weather".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            instructions: Some("Weather alerts and forecasts for US locations.".into()),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn router_lists_both_tools() {
        let fetcher = crate::fetch::HttpFetcher::new(Default::default()).unwrap();
        let server = WeatherServer::new(Arc::new(fetcher), "https://api.weather.gov");
        let names: Vec<String> = server
            .tool_router
            .list_all()
            .into_iter()
            .map(|t| t.name.to_string())
            .sorted()
            .collect();
        assert_eq!(names, vec!["get_alerts", "get_forecast"]);
    }

    #[test]
    fn alert_defaults_fill_missing_fields() {
        let props = AlertProperties {
            event: Some("Flood Warning".into()),
            ..Default::default()
        };
        let text = props.to_string();
        assert!(text.starts_with("Event: Flood Warning\nArea: Unknown"));
        assert!(text.ends_with("Instructions: No specific instructions provided"));
    }

    #[test]
    fn quantity_temperatures_decode() {
        let period: ForecastPeriod = serde_json::from_value(serde_json::json!({
            "name": "Tonight",
            "temperature": { "unitCode": "wmoUnit:degC", "value": 12.5 },
            "temperatureUnit": "C",
            "windSpeed": "5 mph",
            "windDirection": "NW",
            "detailedForecast": "Clear."
        }))
        .unwrap();
        assert!(period.to_string().contains("Temperature: 12.5°C"));
    }
}
