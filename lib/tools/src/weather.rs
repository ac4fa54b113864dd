//! Weather lookups through wttr.in.
//!
//! The client asks for the `j1` JSON document and keeps the handful of
//! current-condition fields the chat context needs. The tool adapter wraps
//! the client for the executor.

use crate::error::{ToolError, WeatherError};
use crate::intent::WEATHER_TOOL;
use crate::tool::ToolAdapter;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, Url};
use rootcause::prelude::Report;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Weather lookup settings.
#[derive(Debug, Clone, Deserialize)]
pub struct WeatherConfig {
    /// Base URL of the wttr.in service.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// User-Agent header; wttr.in rejects anonymous clients.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Per-lookup timeout, in seconds.
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

fn default_base_url() -> String {
    "https://wttr.in".to_string()
}

fn default_user_agent() -> String {
    concat!("skychat/", env!("CARGO_PKG_VERSION")).to_string()
}

fn default_timeout_seconds() -> u64 {
    10
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            user_agent: default_user_agent(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

impl WeatherConfig {
    /// Returns the per-lookup timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

/// Current conditions at a location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherInfo {
    /// "<area>, <country>" as resolved by the provider.
    pub location: String,
    /// Temperature in °C.
    pub temperature: f64,
    /// Human-readable conditions.
    pub description: String,
    /// Apparent temperature in °C.
    pub feels_like: f64,
    /// Relative humidity in percent.
    pub humidity: u8,
    /// Wind speed in m/s.
    pub wind_speed: f64,
    /// When the conditions were fetched.
    pub timestamp: DateTime<Utc>,
}

impl WeatherInfo {
    /// Renders the conditions as context lines.
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "Current weather information for {}:\n\
             - Temperature: {:.1}°C (feels like {:.1}°C)\n\
             - Conditions: {}\n\
             - Humidity: {}%\n\
             - Wind Speed: {:.1} m/s\n\
             - Last updated: {} UTC\n",
            self.location,
            self.temperature,
            self.feels_like,
            self.description,
            self.humidity,
            self.wind_speed,
            self.timestamp.format("%Y-%m-%d %H:%M:%S"),
        )
    }
}

// wttr.in `format=j1` document. Numbers arrive as strings.

#[derive(Debug, Deserialize)]
struct WttrDocument {
    current_condition: Vec<CurrentCondition>,
    nearest_area: Vec<NearestArea>,
}

#[derive(Debug, Deserialize)]
struct CurrentCondition {
    #[serde(rename = "temp_C")]
    temp_c: String,
    #[serde(rename = "FeelsLikeC")]
    feels_like_c: String,
    #[serde(rename = "weatherDesc")]
    weather_desc: Vec<TextValue>,
    humidity: String,
    #[serde(rename = "windspeedKmph")]
    windspeed_kmph: String,
}

#[derive(Debug, Deserialize)]
struct NearestArea {
    #[serde(rename = "areaName")]
    area_name: Vec<TextValue>,
    country: Vec<TextValue>,
}

#[derive(Debug, Deserialize)]
struct TextValue {
    value: String,
}

fn first_value<'a>(values: &'a [TextValue], field: &str) -> Result<&'a str, WeatherError> {
    values
        .first()
        .map(|v| v.value.as_str())
        .ok_or_else(|| WeatherError::MalformedResponse {
            reason: format!("{field} is empty"),
        })
}

fn parse_field<T: FromStr>(raw: &str, field: &str) -> Result<T, WeatherError> {
    raw.trim()
        .parse()
        .map_err(|_| WeatherError::MalformedResponse {
            reason: format!("{field} is not a number: {raw:?}"),
        })
}

impl TryFrom<WttrDocument> for WeatherInfo {
    type Error = WeatherError;

    fn try_from(document: WttrDocument) -> Result<Self, Self::Error> {
        let current = document
            .current_condition
            .first()
            .ok_or_else(|| WeatherError::MalformedResponse {
                reason: "current_condition is empty".to_string(),
            })?;
        let area = document
            .nearest_area
            .first()
            .ok_or_else(|| WeatherError::MalformedResponse {
                reason: "nearest_area is empty".to_string(),
            })?;

        let wind_kmph: f64 = parse_field(&current.windspeed_kmph, "windspeedKmph")?;

        Ok(Self {
            location: format!(
                "{}, {}",
                first_value(&area.area_name, "areaName")?,
                first_value(&area.country, "country")?
            ),
            temperature: parse_field(&current.temp_c, "temp_C")?,
            description: first_value(&current.weather_desc, "weatherDesc")?.to_string(),
            feels_like: parse_field(&current.feels_like_c, "FeelsLikeC")?,
            humidity: parse_field(&current.humidity, "humidity")?,
            wind_speed: wind_kmph / 3.6,
            timestamp: Utc::now(),
        })
    }
}

/// wttr.in client.
#[derive(Debug, Clone)]
pub struct WeatherClient {
    base_url: Url,
    client: Client,
}

impl WeatherClient {
    /// Creates a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid or the HTTP client
    /// cannot be built.
    pub fn new(config: &WeatherConfig) -> Result<Self, Report<WeatherError>> {
        let base_url = Url::parse(&config.base_url).map_err(|e| WeatherError::InvalidConfig {
            reason: format!("base URL {:?}: {e}", config.base_url),
        })?;
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.timeout())
            .build()
            .map_err(|e| WeatherError::InvalidConfig {
                reason: e.to_string(),
            })?;

        Ok(Self { base_url, client })
    }

    fn lookup_url(&self, location: &str) -> Result<Url, WeatherError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| WeatherError::InvalidConfig {
                reason: format!("base URL cannot carry a path: {}", self.base_url),
            })?
            .pop_if_empty()
            .push(location);
        url.query_pairs_mut().append_pair("format", "j1");
        Ok(url)
    }

    /// Fetches current conditions for a free-text location.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, a non-success status, or a
    /// document without the expected fields.
    #[instrument(skip(self))]
    pub async fn fetch(&self, location: &str) -> Result<WeatherInfo, WeatherError> {
        let url = self.lookup_url(location)?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| WeatherError::RequestFailed {
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(WeatherError::UnexpectedStatus {
                status: status.as_u16(),
            });
        }

        let document: WttrDocument =
            response
                .json()
                .await
                .map_err(|e| WeatherError::MalformedResponse {
                    reason: e.to_string(),
                })?;
        let weather = WeatherInfo::try_from(document)?;
        info!(resolved = %weather.location, "fetched weather");
        Ok(weather)
    }
}

/// Tool adapter exposing [`WeatherClient`] to the executor.
#[derive(Debug, Clone)]
pub struct WeatherTool {
    client: WeatherClient,
}

impl WeatherTool {
    /// Wraps a client.
    #[must_use]
    pub fn new(client: WeatherClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ToolAdapter for WeatherTool {
    fn name(&self) -> &str {
        WEATHER_TOOL
    }

    async fn invoke(&self, argument: &str) -> Result<JsonValue, ToolError> {
        let weather = self.client.fetch(argument).await.map_err(|e| {
            debug!(location = argument, error = %e, "weather lookup failed");
            ToolError::ExecutionFailed {
                name: WEATHER_TOOL.to_string(),
                reason: e.to_string(),
            }
        })?;

        serde_json::to_value(&weather).map_err(|e| ToolError::ExecutionFailed {
            name: WEATHER_TOOL.to_string(),
            reason: e.to_string(),
        })
    }

    fn summarize(&self, result: &JsonValue) -> Option<String> {
        WeatherInfo::deserialize(result)
            .ok()
            .map(|weather| weather.summary())
    }
}
