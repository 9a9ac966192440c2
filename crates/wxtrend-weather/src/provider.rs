//! OpenWeatherMap "current weather" client.

use chrono::Utc;
use reqwest::{Client, StatusCode};
use std::sync::Arc;
use tracing::instrument;
use wxtrend_core::{ApiKey, ReqwestErrorExt, Units, WeatherConfig};

use crate::retry::{self, RetryPolicy};
use crate::types::{CurrentReading, OwmResponse, WeatherError};

const CURRENT_WEATHER_PATH: &str = "/data/2.5/weather";
const USER_AGENT: &str = concat!("wxtrend/", env!("CARGO_PKG_VERSION"));
/// Longest error body kept in `WeatherError::Status`
const MAX_ERROR_BODY: usize = 256;

#[derive(Debug, Clone)]
pub struct WeatherProvider {
    client: Arc<Client>,
    base_url: String,
    city: String,
    api_key: ApiKey,
    units: Units,
    retry: RetryPolicy,
}

impl WeatherProvider {
    pub fn new(config: &WeatherConfig) -> Result<Self, WeatherError> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| WeatherError::Client(e.to_string()))?;

        Ok(Self {
            client: Arc::new(client),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            city: config.city.clone(),
            api_key: config.api_key.clone(),
            units: config.units,
            retry: RetryPolicy::default(),
        })
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn city(&self) -> &str {
        &self.city
    }

    pub fn units(&self) -> Units {
        self.units
    }

    /// Fetch current conditions for the configured city.
    #[instrument(skip(self), fields(city = %self.city), level = "debug")]
    pub async fn fetch_current(&self) -> Result<CurrentReading, WeatherError> {
        let url = format!("{}{}", self.base_url, CURRENT_WEATHER_PATH);
        let query = [
            ("q", self.city.as_str()),
            ("appid", self.api_key.expose()),
            ("units", self.units.as_query()),
        ];

        let response = retry::send_with_retry(&self.retry, || {
            self.client.get(&url).query(&query).send()
        })
        .await
        .map_err(|e| e.without_url().into_network_error())?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::debug!("Weather API error body: {}", body);
            return Err(match status {
                StatusCode::UNAUTHORIZED => WeatherError::Unauthorized,
                StatusCode::NOT_FOUND => WeatherError::CityNotFound(self.city.clone()),
                _ => WeatherError::Status {
                    status: status.as_u16(),
                    body: body.chars().take(MAX_ERROR_BODY).collect(),
                },
            });
        }

        let fetched_at = Utc::now();
        let text = response
            .text()
            .await
            .map_err(|e| e.without_url().into_network_error())?;

        let body: OwmResponse =
            serde_json::from_str(&text).map_err(|e| WeatherError::Parse(e.to_string()))?;

        let reading = body.into_reading(fetched_at)?;
        tracing::debug!(
            temperature = reading.temperature,
            resolved_city = reading.city.as_deref().unwrap_or("?"),
            "Fetched current weather"
        );
        Ok(reading)
    }
}
