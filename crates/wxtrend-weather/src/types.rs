use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use wxtrend_core::NetworkError;
use wxtrend_telemetry::FetchError;

/// Geographic position reported by the weather service
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

/// Current conditions for the configured city
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentReading {
    pub temperature: f64,
    /// City name as resolved by the service
    pub city: Option<String>,
    pub coordinates: Option<Coordinates>,
    /// Measurement time reported by the service
    pub reported_at: Option<DateTime<Utc>>,
    /// Local time the reading was received
    pub fetched_at: DateTime<Utc>,
}

/// Subset of the OpenWeatherMap "current weather" payload.
///
/// Every field is optional so that a missing value surfaces as a
/// [`WeatherError::MissingField`] rather than a generic decode error.
#[derive(Debug, Deserialize)]
pub(crate) struct OwmResponse {
    pub main: Option<OwmMain>,
    pub coord: Option<Coordinates>,
    pub name: Option<String>,
    pub dt: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OwmMain {
    pub temp: Option<f64>,
}

impl OwmResponse {
    pub fn into_reading(self, fetched_at: DateTime<Utc>) -> Result<CurrentReading, WeatherError> {
        let temperature = self
            .main
            .and_then(|m| m.temp)
            .filter(|t| t.is_finite())
            .ok_or(WeatherError::MissingField("main.temp"))?;

        Ok(CurrentReading {
            temperature,
            city: self.name.filter(|n| !n.is_empty()),
            coordinates: self.coord,
            reported_at: self.dt.and_then(|ts| DateTime::from_timestamp(ts, 0)),
            fetched_at,
        })
    }
}

/// Weather client errors
#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),
    #[error("Weather API returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Weather API rejected the API key")]
    Unauthorized,
    #[error("City not found: {0}")]
    CityNotFound(String),
    #[error("Response missing field: {0}")]
    MissingField(&'static str),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Client setup failed: {0}")]
    Client(String),
}

impl From<WeatherError> for FetchError {
    fn from(e: WeatherError) -> Self {
        match e {
            WeatherError::MissingField(_) | WeatherError::Parse(_) => {
                FetchError::MalformedResponse(e.to_string())
            }
            WeatherError::Network(_)
            | WeatherError::Status { .. }
            | WeatherError::Unauthorized
            | WeatherError::CityNotFound(_)
            | WeatherError::Client(_) => FetchError::SourceUnavailable(e.to_string()),
        }
    }
}

impl From<WeatherError> for wxtrend_core::WeatherError {
    fn from(e: WeatherError) -> Self {
        match e {
            WeatherError::Unauthorized => Self::InvalidApiKey,
            WeatherError::CityNotFound(city) => Self::LocationNotFound(city),
            WeatherError::MissingField(_) | WeatherError::Parse(_) => {
                Self::MalformedResponse(e.to_string())
            }
            other => Self::SourceUnavailable(other.to_string()),
        }
    }
}

impl From<WeatherError> for wxtrend_core::AppError {
    fn from(e: WeatherError) -> Self {
        match e {
            WeatherError::Network(net) => Self::Network(net),
            other => Self::Weather(other.into()),
        }
    }
}
