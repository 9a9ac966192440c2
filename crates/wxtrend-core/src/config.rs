use anyhow::{Context, Result};

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// Environment variable holding the OpenWeatherMap credential
pub const API_KEY_ENV: &str = "OPENWEATHER_API_KEY";

/// Environment variable overriding the configured city
pub const CITY_ENV: &str = "WXTREND_CITY";

const APP_DIR: &str = "wxtrend";

/// Configuration validation errors
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of config validation
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    /// Returns true if there are no errors (warnings are OK)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Get a user-friendly message summarizing all errors
    pub fn error_summary(&self) -> String {
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Credential for the weather service.
///
/// The value is readable from the config file or the environment but is never
/// written back to disk, and its `Debug` output is redacted so it cannot leak
/// through logging.
#[derive(Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            f.write_str("ApiKey(<unset>)")
        } else {
            f.write_str("ApiKey(<redacted>)")
        }
    }
}

/// Unit system requested from the weather service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    #[default]
    Metric,
    Imperial,
    Standard,
}

impl Units {
    /// Value of the `units` query parameter
    pub fn as_query(&self) -> &'static str {
        match self {
            Self::Metric => "metric",
            Self::Imperial => "imperial",
            Self::Standard => "standard",
        }
    }

    /// Suffix used when displaying a temperature
    pub fn temperature_suffix(&self) -> &'static str {
        match self {
            Self::Metric => "°C",
            Self::Imperial => "°F",
            Self::Standard => "K",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// City name passed to the weather service
    #[serde(default = "default_city")]
    pub city: String,

    #[serde(default)]
    pub units: Units,

    /// Weather service credential (never serialized)
    #[serde(default, skip_serializing)]
    pub api_key: ApiKey,

    /// Base URL of the weather service
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// HTTP request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

fn default_city() -> String {
    "Kansas City".to_string()
}

fn default_base_url() -> String {
    "http://api.openweathermap.org".to_string()
}

fn default_request_timeout() -> u64 {
    10
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            city: default_city(),
            units: Units::default(),
            api_key: ApiKey::default(),
            base_url: default_base_url(),
            request_timeout_seconds: default_request_timeout(),
        }
    }
}

impl WeatherConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Seconds between refreshes (default: 900)
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_seconds: u64,

    /// Number of observations kept in the sliding window (default: 5)
    #[serde(default = "default_window_capacity")]
    pub window_capacity: usize,
}

fn default_refresh_interval() -> u64 {
    900
}

fn default_window_capacity() -> usize {
    5
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            refresh_interval_seconds: default_refresh_interval(),
            window_capacity: default_window_capacity(),
        }
    }
}

impl TelemetryConfig {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_seconds)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub weather: WeatherConfig,

    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl Config {
    /// Load configuration from the user config directory, creating a default
    /// file if none exists, then apply environment overrides.
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        let mut config = Self::load_from(&config_path)?;
        config.apply_env_overrides(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// Load configuration from an explicit path, writing defaults if it is missing
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            let config = Self::default();
            config.save_to(path)?;
            tracing::info!("Wrote default configuration to {}", path.display());
            return Ok(config);
        }

        let contents = std::fs::read_to_string(path).context("Failed to read config file")?;

        let config: Config =
            toml::from_str(&contents).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        Ok(config)
    }

    /// Load configuration and validate it
    ///
    /// Returns an error if validation fails with critical errors; warnings are logged.
    pub fn load_validated() -> Result<(Self, ValidationResult)> {
        Ok(Self::load()?.into_validated()?)
    }

    /// Validate this configuration, keeping it only if there are no errors
    pub fn into_validated(self) -> std::result::Result<(Self, ValidationResult), ConfigError> {
        let validation = self.validate();

        if !validation.is_valid() {
            return Err(ConfigError::Invalid(validation.error_summary()));
        }

        for warning in &validation.warnings {
            tracing::warn!("Config warning: {}", warning);
        }

        Ok((self, validation))
    }

    /// Apply environment overrides using the supplied lookup
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup(API_KEY_ENV).filter(|k| !k.trim().is_empty()) {
            self.weather.api_key = ApiKey::new(key);
        }
        if let Some(city) = lookup(CITY_ENV).filter(|c| !c.trim().is_empty()) {
            self.weather.city = city;
        }
    }

    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        if self.weather.city.trim().is_empty() {
            result.add_error("weather.city", "City must not be empty");
        }

        if self.weather.api_key.is_empty() {
            result.add_error(
                "weather.api_key",
                format!("API key is not set (export {})", API_KEY_ENV),
            );
        }

        self.validate_url(&self.weather.base_url, "weather.base_url", &mut result);

        if self.weather.request_timeout_seconds == 0 {
            result.add_error(
                "weather.request_timeout_seconds",
                "Request timeout must be greater than 0",
            );
        }

        let refresh = self.telemetry.refresh_interval_seconds;
        if refresh == 0 {
            result.add_error(
                "telemetry.refresh_interval_seconds",
                "Refresh interval must be greater than 0",
            );
        } else if refresh > 86_400 {
            result.add_warning(
                "telemetry.refresh_interval_seconds",
                "Refresh interval is more than 24 hours",
            );
        }

        match self.telemetry.window_capacity {
            0 => result.add_warning(
                "telemetry.window_capacity",
                "Window capacity is 0; no readings will be retained",
            ),
            1 => result.add_warning(
                "telemetry.window_capacity",
                "Window capacity is 1; no trend can be computed",
            ),
            _ => {}
        }

        result
    }

    fn validate_url(&self, url_str: &str, field_name: &str, result: &mut ValidationResult) {
        match Url::parse(url_str) {
            Ok(url) => {
                if url.scheme() != "http" && url.scheme() != "https" {
                    result.add_error(
                        field_name,
                        format!("URL must use http or https scheme, got: {}", url.scheme()),
                    );
                }
                if url.host().is_none() {
                    result.add_error(field_name, "URL must have a host");
                }
            }
            Err(e) => {
                result.add_error(field_name, format!("Invalid URL: {}", e));
            }
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(path, contents).context("Failed to write config file")?;

        Ok(())
    }

    /// Get the path to the configuration file
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join(APP_DIR);

        Ok(config_dir.join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configured() -> Config {
        let mut config = Config::default();
        config.weather.api_key = ApiKey::new("abc123");
        config
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.weather.city, "Kansas City");
        assert_eq!(config.weather.units, Units::Metric);
        assert_eq!(config.telemetry.refresh_interval_seconds, 900);
        assert_eq!(config.telemetry.window_capacity, 5);
        assert_eq!(config.telemetry.refresh_interval(), Duration::from_secs(900));
    }

    #[test]
    fn test_configured_default_is_valid() {
        let result = configured().validate();
        assert!(result.is_valid(), "unexpected errors: {:?}", result.errors);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_missing_api_key_is_error() {
        let result = Config::default().validate();
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.field == "weather.api_key"));
    }

    #[test]
    fn test_zero_refresh_interval_is_error() {
        let mut config = configured();
        config.telemetry.refresh_interval_seconds = 0;
        let result = config.validate();
        assert!(result
            .errors
            .iter()
            .any(|e| e.field == "telemetry.refresh_interval_seconds"));
    }

    #[test]
    fn test_small_window_is_warning() {
        let mut config = configured();
        config.telemetry.window_capacity = 0;
        let result = config.validate();
        assert!(result.is_valid());
        assert!(result
            .warnings
            .iter()
            .any(|w| w.field == "telemetry.window_capacity"));
    }

    #[test]
    fn test_invalid_base_url_scheme() {
        let mut config = configured();
        config.weather.base_url = "ftp://api.openweathermap.org".to_string();
        let result = config.validate();
        assert!(result.errors.iter().any(|e| e.message.contains("http or https")));
    }

    #[test]
    fn test_api_key_debug_is_redacted() {
        let key = ApiKey::new("super-secret");
        let rendered = format!("{:?}", key);
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("redacted"));

        let config = configured();
        assert!(!format!("{:?}", config).contains("abc123"));
    }

    #[test]
    fn test_api_key_not_serialized() {
        let toml = toml::to_string_pretty(&configured()).unwrap();
        assert!(!toml.contains("abc123"));
        assert!(!toml.contains("api_key"));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config.apply_env_overrides(|name| match name {
            API_KEY_ENV => Some("from-env".to_string()),
            CITY_ENV => Some("Lawrence".to_string()),
            _ => None,
        });
        assert_eq!(config.weather.api_key.expose(), "from-env");
        assert_eq!(config.weather.city, "Lawrence");
    }

    #[test]
    fn test_blank_env_override_ignored() {
        let mut config = Config::default();
        config.apply_env_overrides(|_| Some("   ".to_string()));
        assert!(config.weather.api_key.is_empty());
        assert_eq!(config.weather.city, "Kansas City");
    }

    #[test]
    fn test_load_from_creates_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wxtrend").join("config.toml");

        let config = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config.telemetry.window_capacity, 5);
    }

    #[test]
    fn test_load_from_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[telemetry]\nwindow_capacity = 12\n\n[weather]\napi_key = \"k\"\n",
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.telemetry.window_capacity, 12);
        assert_eq!(config.telemetry.refresh_interval_seconds, 900);
        assert_eq!(config.weather.city, "Kansas City");
        assert_eq!(config.weather.api_key.expose(), "k");
    }

    #[test]
    fn test_load_from_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[telemetry\nwindow_capacity = ").unwrap();
        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_into_validated_rejects_missing_api_key() {
        let err = Config::default().into_validated().unwrap_err();
        match err {
            ConfigError::Invalid(summary) => assert!(summary.contains("weather.api_key")),
            other => panic!("expected Invalid, got {:?}", other),
        }

        let (config, validation) = configured().into_validated().unwrap();
        assert!(validation.is_valid());
        assert_eq!(config.weather.api_key.expose(), "abc123");
    }
}
