//! Current weather and warnings.
//!
//! Rain is inferred from either an active rainstorm warning or heavy
//! rainfall in any of the reference urban districts. Weather is fetched on
//! every request; nothing is cached.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use super::error::FeedError;
use super::http::{FeedConfig, build_http, get_json};

/// Default endpoint of the current-weather report.
pub const DEFAULT_WEATHER_URL: &str =
    "https://data.weather.gov.hk/weatherAPI/opendata/weather.php?dataType=rhrread&lang=en";

/// Warning texts that indicate heavy rain.
pub const RAINSTORM_KEYWORDS: [&str; 3] = ["Amber Rainstorm", "Red Rainstorm", "Black Rainstorm"];

/// Districts whose rainfall readings are checked.
pub const REFERENCE_DISTRICTS: [&str; 9] = [
    "Central & Western District",
    "Wan Chai",
    "Eastern District",
    "Southern District",
    "Yau Tsim Mong",
    "Sham Shui Po",
    "Kowloon City",
    "Wong Tai Sin",
    "Kwun Tong",
];

/// Maximum rainfall (mm) above which a district counts as wet.
pub const RAINFALL_THRESHOLD_MM: f64 = 10.0;

/// Current weather report.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherReport {
    #[serde(default)]
    pub warning_message: WarningMessages,

    #[serde(default)]
    pub rainfall: Option<Readings<DistrictRainfall>>,

    #[serde(default)]
    pub temperature: Option<Readings<TemperatureReading>>,
}

/// The feed sends a list of texts, or an empty string when there are none.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum WarningMessages {
    List(Vec<String>),
    Text(String),
}

impl Default for WarningMessages {
    fn default() -> Self {
        WarningMessages::List(Vec::new())
    }
}

impl WarningMessages {
    pub fn to_vec(&self) -> Vec<String> {
        match self {
            WarningMessages::List(list) => list.clone(),
            WarningMessages::Text(text) if text.trim().is_empty() => Vec::new(),
            WarningMessages::Text(text) => vec![text.clone()],
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Readings<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DistrictRainfall {
    #[serde(default)]
    pub place: String,
    /// Maximum rainfall in mm.
    #[serde(default)]
    pub max: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TemperatureReading {
    #[serde(default)]
    pub place: String,
    #[serde(default)]
    pub value: Option<f64>,
}

/// Weather facts relevant to crowding.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WeatherStatus {
    pub is_rainy: bool,
    pub warnings: Vec<String>,
    /// First temperature reading, in °C.
    pub temperature: Option<f64>,
}

impl WeatherReport {
    /// Derive the crowding-relevant status from the report.
    pub fn status(&self) -> WeatherStatus {
        let warnings = self.warning_message.to_vec();

        let rainstorm = warnings
            .iter()
            .any(|w| RAINSTORM_KEYWORDS.iter().any(|k| w.contains(k)));

        let wet_district = self.rainfall.as_ref().is_some_and(|rainfall| {
            rainfall.data.iter().any(|d| {
                REFERENCE_DISTRICTS.contains(&d.place.as_str())
                    && d.max.unwrap_or(0.0) > RAINFALL_THRESHOLD_MM
            })
        });

        WeatherStatus {
            is_rainy: rainstorm || wet_district,
            warnings,
            temperature: self
                .temperature
                .as_ref()
                .and_then(|t| t.data.first())
                .and_then(|r| r.value),
        }
    }
}

/// Source of weather reports.
#[async_trait]
pub trait WeatherFeed: Send + Sync {
    async fn fetch_weather(&self) -> Result<WeatherReport, FeedError>;
}

/// HTTP client for the weather report.
#[derive(Debug, Clone)]
pub struct WeatherClient {
    http: reqwest::Client,
    url: String,
}

impl WeatherClient {
    pub fn new(config: FeedConfig) -> Result<Self, FeedError> {
        Ok(Self {
            http: build_http(&config)?,
            url: config.url,
        })
    }
}

#[async_trait]
impl WeatherFeed for WeatherClient {
    async fn fetch_weather(&self) -> Result<WeatherReport, FeedError> {
        get_json(&self.http, &self.url, &[]).await
    }
}

/// Weather lookup that fails open.
#[derive(Clone)]
pub struct WeatherService {
    feed: Arc<dyn WeatherFeed>,
}

impl WeatherService {
    pub fn new(feed: Arc<dyn WeatherFeed>) -> Self {
        Self { feed }
    }

    /// Current weather; on any failure, no rain and no warnings.
    pub async fn status(&self) -> WeatherStatus {
        match self.feed.fetch_weather().await {
            Ok(report) => {
                let status = report.status();
                debug!(
                    is_rainy = status.is_rainy,
                    warnings = status.warnings.len(),
                    "fetched weather"
                );
                status
            }
            Err(e) => {
                error!(error = %e, "failed to fetch weather data");
                WeatherStatus::default()
            }
        }
    }
}
