//! OpenWeatherMap observation source for wxtrend.
//!
//! Fetches the current temperature for one city and exposes it to the
//! telemetry pipeline through [`wxtrend_telemetry::ObservationSource`].

pub mod provider;
pub mod retry;
pub mod source;
pub mod types;

pub use provider::WeatherProvider;
pub use retry::RetryPolicy;
pub use types::{Coordinates, CurrentReading, WeatherError};
