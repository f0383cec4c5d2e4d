use serde::{Deserialize, Serialize};
use std::{env, fs, path::Path};

use crate::error::{Error, Result};

/// Credentials for the OpenWeatherMap upstream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    pub api_key: String,
}

/// Endpoint and credentials for the Turno booking upstream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingConfig {
    pub base_url: String,
    pub api_key: String,
}

/// Top-level configuration, constructed once at process start and passed by
/// reference into every component that issues upstream calls. A missing
/// required field is a construction-time error, never a per-call surprise.
///
/// Example TOML:
/// ```toml
/// [weather]
/// api_key = "..."
///
/// [booking]
/// base_url = "https://example.supabase.co/functions/v1/turno"
/// api_key = "..."
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub weather: WeatherConfig,
    pub booking: BookingConfig,
}

const ENV_WEATHER_API_KEY: &str = "OPENWEATHERMAP_API_KEY";
const ENV_BOOKING_BASE_URL: &str = "TURNO_API_BASE_URL";
const ENV_BOOKING_API_KEY: &str = "TURNO_API_KEY";

impl Config {
    /// Build the configuration from environment variables only.
    pub fn from_env() -> Result<Self> {
        Ok(Config {
            weather: WeatherConfig {
                api_key: require_env(ENV_WEATHER_API_KEY)?,
            },
            booking: BookingConfig {
                base_url: require_env(ENV_BOOKING_BASE_URL)?,
                api_key: require_env(ENV_BOOKING_API_KEY)?,
            },
        })
    }

    /// Parse a TOML config file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read config file {}: {e}", path.display()))
        })?;

        toml::from_str(&contents).map_err(|e| {
            Error::Config(format!("Failed to parse config file {}: {e}", path.display()))
        })
    }

    /// Load configuration: the file named by `SKYBOOK_CONFIG` if set,
    /// otherwise the environment variables. Environment variables override
    /// individual file fields either way.
    pub fn load() -> Result<Self> {
        let mut cfg = match env::var("SKYBOOK_CONFIG") {
            Ok(path) => Self::from_file(Path::new(&path))?,
            Err(_) => return Self::from_env(),
        };

        if let Ok(key) = env::var(ENV_WEATHER_API_KEY) {
            cfg.weather.api_key = key;
        }
        if let Ok(url) = env::var(ENV_BOOKING_BASE_URL) {
            cfg.booking.base_url = url;
        }
        if let Ok(key) = env::var(ENV_BOOKING_API_KEY) {
            cfg.booking.api_key = key;
        }

        Ok(cfg)
    }
}

fn require_env(name: &str) -> Result<String> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(Error::Config(format!(
            "{name} is not configured in environment variables"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_key_is_a_descriptive_config_error() {
        let err = require_env("SKYBOOK_TEST_DOES_NOT_EXIST").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(
            err.to_string()
                .contains("SKYBOOK_TEST_DOES_NOT_EXIST is not configured")
        );
    }

    #[test]
    fn config_parses_from_toml() {
        let cfg: Config = toml::from_str(
            r#"
            [weather]
            api_key = "owm-key"

            [booking]
            base_url = "https://booking.example/api"
            api_key = "turno-key"
            "#,
        )
        .expect("config must parse");

        assert_eq!(cfg.weather.api_key, "owm-key");
        assert_eq!(cfg.booking.base_url, "https://booking.example/api");
        assert_eq!(cfg.booking.api_key, "turno-key");
    }

    #[test]
    fn incomplete_file_fails_at_construction() {
        let err = toml::from_str::<Config>(
            r#"
            [weather]
            api_key = "owm-key"
            "#,
        );
        assert!(err.is_err());
    }
}
