//! National Weather Service collaborators.

use futures::future::BoxFuture;
use serde::Deserialize;
use tracing::{error, info, warn};

use agentwire_core::config::WeatherConfig;
use agentwire_core::error::{AgentwireError, Result};
use agentwire_core::traits::Tool;
use agentwire_core::types::ToolResult;

const NO_ALERTS_DATA: &str = "Unable to fetch alerts or no alerts found.";
const NO_ACTIVE_ALERTS: &str = "No active alerts for this state.";
const NO_FORECAST: &str = "Unable to fetch forecast.";

/// Thin client over the NWS JSON API.
#[derive(Clone)]
pub struct NwsClient {
    http: reqwest::Client,
    base_url: String,
    timeout_secs: u64,
}

impl NwsClient {
    pub fn new(config: &WeatherConfig, timeout_secs: u64) -> Result<Self> {
        Ok(Self {
            http: super::http_client("weather", &config.user_agent, timeout_secs)?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout_secs,
        })
    }

    /// GET a path; any transport, status, or decoding failure yields `None`.
    async fn get(&self, path: &str) -> Option<serde_json::Value> {
        let url = format!("{}{}", self.base_url, path);
        let resp = match self
            .http
            .get(&url)
            .header("Accept", "application/geo+json")
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(e) => {
                error!(url = %url, error = %e, "NWS API request failed");
                return None;
            }
        };

        if !resp.status().is_success() {
            error!(url = %url, status = resp.status().as_u16(), "NWS API request failed");
            return None;
        }

        match resp.json().await {
            Ok(body) => Some(body),
            Err(e) => {
                error!(url = %url, error = %e, "NWS API returned invalid JSON");
                None
            }
        }
    }
}

/// Render one alert feature as a text block.
pub fn format_alert(feature: &serde_json::Value) -> String {
    let props = &feature["properties"];
    let field = |key: &str, default: &str| -> String {
        props[key].as_str().unwrap_or(default).to_string()
    };
    format!(
        "\nEvent: {}\nArea: {}\nSeverity: {}\nDescription: {}\nInstructions: {}\n",
        field("event", "Unknown"),
        field("areaDesc", "Unknown"),
        field("severity", "Unknown"),
        field("description", "No description available"),
        field("instruction", "No specific instructions provided"),
    )
}

fn validate_state(state: &str) -> Result<String> {
    if state.len() == 2 && state.chars().all(|c| c.is_ascii_alphabetic()) {
        Ok(state.to_ascii_uppercase())
    } else {
        Err(AgentwireError::ToolValidation(format!(
            "state must be a two-letter US state code, got '{}'",
            state
        )))
    }
}

pub struct WeatherAlertsTool {
    client: NwsClient,
}

impl WeatherAlertsTool {
    pub fn new(client: NwsClient) -> Self {
        Self { client }
    }
}

#[derive(Deserialize)]
struct AlertsInput {
    state: String,
}

impl Tool for WeatherAlertsTool {
    fn name(&self) -> &str {
        "weather_alerts"
    }

    fn description(&self) -> &str {
        "Active weather alerts for a US state."
    }

    fn input_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "state": {
                    "type": "string",
                    "description": "Two-letter US state code (e.g. CA, NY)"
                }
            },
            "required": ["state"]
        })
    }

    fn timeout_secs(&self) -> u64 {
        self.client.timeout_secs
    }

    fn execute(&self, input: serde_json::Value) -> BoxFuture<'_, Result<ToolResult>> {
        Box::pin(async move {
            let params: AlertsInput = serde_json::from_value(input)
                .map_err(|e| AgentwireError::ToolValidation(e.to_string()))?;
            let state = validate_state(&params.state)?;

            info!(state = %state, "Fetching weather alerts");
            let data = self.client.get(&format!("/alerts/active/area/{}", state)).await;

            let Some(features) = data.as_ref().and_then(|d| d["features"].as_array()) else {
                warn!("Unable to fetch alerts or no alerts found");
                return Ok(ToolResult::error(NO_ALERTS_DATA));
            };
            if features.is_empty() {
                return Ok(ToolResult::success(NO_ACTIVE_ALERTS));
            }

            let blocks: Vec<String> = features.iter().map(format_alert).collect();
            Ok(ToolResult::success(blocks.join("\n---\n")))
        })
    }
}

pub struct WeatherForecastTool {
    client: NwsClient,
}

impl WeatherForecastTool {
    pub fn new(client: NwsClient) -> Self {
        Self { client }
    }
}

#[derive(Deserialize)]
struct ForecastInput {
    lat: f64,
    lon: f64,
}

impl Tool for WeatherForecastTool {
    fn name(&self) -> &str {
        "weather_forecast"
    }

    fn description(&self) -> &str {
        "Forecast periods for a latitude/longitude."
    }

    fn input_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "lat": { "type": "number" },
                "lon": { "type": "number" }
            },
            "required": ["lat", "lon"]
        })
    }

    fn timeout_secs(&self) -> u64 {
        self.client.timeout_secs
    }

    fn execute(&self, input: serde_json::Value) -> BoxFuture<'_, Result<ToolResult>> {
        Box::pin(async move {
            let params: ForecastInput = serde_json::from_value(input)
                .map_err(|e| AgentwireError::ToolValidation(e.to_string()))?;
            if !(-90.0..=90.0).contains(&params.lat) || !(-180.0..=180.0).contains(&params.lon) {
                return Err(AgentwireError::ToolValidation(format!(
                    "coordinates out of range: {},{}",
                    params.lat, params.lon
                )));
            }

            info!(lat = params.lat, lon = params.lon, "Fetching weather forecast");
            let data = self
                .client
                .get(&format!("/points/{},{}/forecast", params.lat, params.lon))
                .await;

            match data.as_ref().map(|d| &d["properties"]["periods"]) {
                Some(periods) if periods.is_array() => Ok(ToolResult::success(
                    serde_json::json!({ "periods": periods }),
                )),
                _ => {
                    warn!("Unable to fetch forecast");
                    Ok(ToolResult::error(NO_FORECAST))
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alert_block_uses_defaults_for_missing_fields() {
        let feature = serde_json::json!({
            "properties": { "event": "Flood Warning", "severity": "Severe" }
        });
        let block = format_alert(&feature);
        assert!(block.contains("Event: Flood Warning"));
        assert!(block.contains("Area: Unknown"));
        assert!(block.contains("Severity: Severe"));
        assert!(block.contains("Instructions: No specific instructions provided"));
    }

    #[test]
    fn state_codes_are_validated() {
        assert_eq!(validate_state("ca").unwrap(), "CA");
        assert!(validate_state("CAL").is_err());
        assert!(validate_state("1A").is_err());
    }

    fn unreachable_client() -> NwsClient {
        NwsClient::new(
            &WeatherConfig {
                base_url: "http://127.0.0.1:9".into(),
                user_agent: "test".into(),
            },
            1,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn bad_state_fails_before_any_request() {
        let err = WeatherAlertsTool::new(unreachable_client())
            .execute(serde_json::json!({ "state": "California" }))
            .await
            .unwrap_err();
        assert!(matches!(err, AgentwireError::ToolValidation(_)));
    }

    #[tokio::test]
    async fn unreachable_alerts_backend_is_an_error_result() {
        let result = WeatherAlertsTool::new(unreachable_client())
            .execute(serde_json::json!({ "state": "CA" }))
            .await
            .unwrap();
        assert!(result.is_error);
        assert_eq!(result.content, serde_json::json!(NO_ALERTS_DATA));
    }

    #[tokio::test]
    async fn unreachable_forecast_backend_is_an_error_result() {
        let result = WeatherForecastTool::new(unreachable_client())
            .execute(serde_json::json!({ "lat": 38.9, "lon": -77.0 }))
            .await
            .unwrap();
        assert!(result.is_error);
    }
}
