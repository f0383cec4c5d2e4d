use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Temperature unit requested by the caller. Maps onto the upstream's
/// `metric` / `imperial` query parameter, so responses arrive pre-converted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    #[default]
    Celsius,
    Fahrenheit,
}

impl Units {
    /// Value of the OpenWeatherMap `units` query parameter.
    pub fn api_param(self) -> &'static str {
        match self {
            Units::Celsius => "metric",
            Units::Fahrenheit => "imperial",
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Units::Celsius => "C",
            Units::Fahrenheit => "F",
        }
    }

    /// Wind speed label matching what the upstream returns for each unit
    /// system.
    pub fn speed_label(self) -> &'static str {
        match self {
            Units::Celsius => "m/s",
            Units::Fahrenheit => "mph",
        }
    }
}

/// Convert a Celsius temperature into the requested unit. Celsius is the
/// identity; used by callers that already hold metric data.
pub fn convert_temperature(temp: f64, to: Units) -> f64 {
    match to {
        Units::Celsius => temp,
        Units::Fahrenheit => temp * 9.0 / 5.0 + 32.0,
    }
}

/// Current conditions for one location, built fresh per request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherData {
    pub location: String,
    pub country: String,
    pub temperature: i64,
    pub feels_like: i64,
    pub description: String,
    pub humidity: u8,
    pub wind_speed: f64,
    pub pressure: u32,
    pub icon: String,
    pub timestamp: String,
}

/// One calendar day collapsed from a group of 3-hour forecast samples.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastDay {
    /// Calendar date, YYYY-MM-DD.
    pub date: String,
    pub temp_min: i64,
    pub temp_max: i64,
    pub description: String,
    pub humidity: u8,
    pub wind_speed: f64,
    pub icon: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastData {
    pub location: String,
    pub country: String,
    pub forecast: Vec<ForecastDay>,
}

/// A single hourly sample, shaped identically whether it came from the
/// One Call hourly feed or the 3-hour fallback.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HourlyWeather {
    /// Hour label, HH:MM in the location's local time.
    pub time: String,
    pub temperature: i64,
    pub feels_like: i64,
    pub description: String,
    pub humidity: u8,
    pub wind_speed: f64,
    /// Precipitation probability, 0-100 whole percent.
    pub pop: u8,
    pub icon: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HourlyData {
    pub location: String,
    pub country: String,
    pub hourly: Vec<HourlyWeather>,
}

/// Two snapshots plus derived absolute differences.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonData {
    pub location1: WeatherData,
    pub location2: WeatherData,
    pub temp_difference: i64,
    pub humidity_difference: i64,
}

/// Bookable offering held by the upstream booking service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Duration in minutes.
    pub duration: u32,
    pub price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
}

impl BookingStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Completed => "completed",
        }
    }
}

impl std::str::FromStr for BookingStatus {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(BookingStatus::Pending),
            "confirmed" => Ok(BookingStatus::Confirmed),
            "cancelled" => Ok(BookingStatus::Cancelled),
            "completed" => Ok(BookingStatus::Completed),
            other => Err(crate::error::Error::validation(format!(
                "Unknown booking status '{other}'. \
                 Expected one of: pending, confirmed, cancelled, completed."
            ))),
        }
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: String,
    pub service_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_name: Option<String>,
    pub customer_name: String,
    pub customer_email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_phone: Option<String>,
    /// Calendar date, YYYY-MM-DD.
    pub date: String,
    /// Time of day, HH:MM.
    pub time: String,
    pub status: BookingStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// Payload for creating a booking; the upstream assigns the id.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBooking {
    pub service_id: String,
    pub customer_name: String,
    pub customer_email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_phone: Option<String>,
    pub date: String,
    pub time: String,
    pub status: BookingStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Partial update applied to an existing booking; only the set fields are
/// sent upstream.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<BookingStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// A candidate (date, time) pair for scheduling an appointment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailableSlot {
    pub date: String,
    pub time: String,
    pub available: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingStats {
    pub total: usize,
    pub confirmed: usize,
    pub pending: usize,
    pub cancelled: usize,
    pub completed: usize,
}

/// Structured result shared by the HTTP endpoints and the MCP tools: every
/// response carries a `type` discriminant the host dispatches on.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum StructuredResult {
    CurrentWeather {
        #[serde(flatten)]
        weather: WeatherData,
        units: Units,
    },
    Forecast {
        #[serde(flatten)]
        forecast: ForecastData,
        units: Units,
    },
    HourlyForecast {
        #[serde(flatten)]
        hourly: HourlyData,
        units: Units,
    },
    Comparison {
        #[serde(flatten)]
        comparison: ComparisonData,
        units: Units,
    },
    Services {
        services: Vec<Service>,
    },
    Booking {
        booking: Booking,
    },
    Bookings {
        bookings: Vec<Booking>,
    },
    Availability {
        service_id: String,
        date: String,
        slots: Vec<AvailableSlot>,
    },
    BookingStats {
        #[serde(flatten)]
        stats: BookingStats,
    },
    Error {
        error: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fahrenheit_conversion_and_celsius_identity() {
        assert_eq!(convert_temperature(0.0, Units::Fahrenheit), 32.0);
        assert_eq!(convert_temperature(100.0, Units::Fahrenheit), 212.0);
        for t in [-40.0, 0.0, 17.5, 36.6] {
            assert_eq!(convert_temperature(t, Units::Celsius), t);
        }
    }

    #[test]
    fn units_map_to_upstream_params() {
        assert_eq!(Units::Celsius.api_param(), "metric");
        assert_eq!(Units::Fahrenheit.api_param(), "imperial");
        assert_eq!(Units::default(), Units::Celsius);
    }

    #[test]
    fn booking_status_parses_case_insensitively() {
        use std::str::FromStr;
        assert_eq!(
            BookingStatus::from_str("Confirmed").unwrap(),
            BookingStatus::Confirmed
        );
        assert!(BookingStatus::from_str("unknown").is_err());
    }

    #[test]
    fn structured_result_is_tagged_and_flattened() {
        let result = StructuredResult::CurrentWeather {
            weather: WeatherData {
                location: "London".into(),
                country: "GB".into(),
                temperature: 18,
                feels_like: 17,
                description: "light rain".into(),
                humidity: 81,
                wind_speed: 4.2,
                pressure: 1011,
                icon: "10d".into(),
                timestamp: "2026-08-25T09:00:00Z".into(),
            },
            units: Units::Celsius,
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["type"], "current_weather");
        assert_eq!(json["location"], "London");
        assert_eq!(json["feelsLike"], 17);
        assert_eq!(json["units"], "celsius");
    }

    #[test]
    fn error_result_matches_the_uniform_shape() {
        let json = serde_json::to_value(StructuredResult::Error {
            error: "boom".into(),
        })
        .unwrap();
        assert_eq!(json["type"], "error");
        assert_eq!(json["error"], "boom");
    }
}
