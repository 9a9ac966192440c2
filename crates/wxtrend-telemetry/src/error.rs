use thiserror::Error;
use wxtrend_core::{AppError, WeatherError};

/// A failed fetch from an observation source.
///
/// Every transport, status and payload failure collapses into one of these
/// two variants; the scheduler treats both the same way.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("Source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

impl FetchError {
    pub fn user_message(&self) -> &'static str {
        WeatherError::from(self.clone()).user_message()
    }
}

impl From<FetchError> for WeatherError {
    fn from(e: FetchError) -> Self {
        match e {
            FetchError::SourceUnavailable(s) => WeatherError::SourceUnavailable(s),
            FetchError::MalformedResponse(s) => WeatherError::MalformedResponse(s),
        }
    }
}

impl From<FetchError> for AppError {
    fn from(e: FetchError) -> Self {
        AppError::Weather(e.into())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TrendError {
    #[error("Insufficient data for a trend: {points} point(s)")]
    InsufficientData { points: usize },
}

impl TrendError {
    pub fn user_message(&self) -> &'static str {
        WeatherError::from(*self).user_message()
    }
}

impl From<TrendError> for WeatherError {
    fn from(e: TrendError) -> Self {
        match e {
            TrendError::InsufficientData { points } => WeatherError::InsufficientData { points },
        }
    }
}

impl From<TrendError> for AppError {
    fn from(e: TrendError) -> Self {
        AppError::Weather(e.into())
    }
}
