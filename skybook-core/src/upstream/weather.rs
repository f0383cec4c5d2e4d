//! OpenWeatherMap client: current conditions, daily forecast aggregation,
//! hourly forecast (One Call with a 3-hour fallback) and two-location
//! comparison.

use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::{
    config::WeatherConfig,
    error::{Error, Result},
    model::{
        ComparisonData, ForecastData, ForecastDay, HourlyData, HourlyWeather, Units, WeatherData,
    },
};

use super::truncate_body;

const SERVICE: &str = "OpenWeatherMap";
const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org";

/// Hard cap on hourly samples from the One Call feed.
pub const MAX_HOURLY_SAMPLES: u32 = 48;
/// Hard cap on 3-hour groups when falling back to the coarse forecast feed.
const MAX_FALLBACK_GROUPS: u32 = 16;

#[derive(Debug, Clone)]
pub struct WeatherClient {
    api_key: String,
    base_url: String,
    http: Client,
}

impl WeatherClient {
    pub fn new(config: &WeatherConfig) -> Self {
        Self {
            api_key: config.api_key.clone(),
            base_url: DEFAULT_BASE_URL.to_string(),
            http: Client::new(),
        }
    }

    /// Point the client at a different host. Used by integration setups.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Current conditions for one location.
    pub async fn current_weather(&self, location: &str, units: Units) -> Result<WeatherData> {
        let parsed: OwCurrentResponse = self
            .get_json(
                "/data/2.5/weather",
                &[
                    ("q", location.to_string()),
                    ("units", units.api_param().to_string()),
                ],
                Some(location),
            )
            .await?;

        let condition = parsed.weather.into_iter().next().unwrap_or_default();

        Ok(WeatherData {
            location: parsed.name,
            country: parsed.sys.country,
            temperature: parsed.main.temp.round() as i64,
            feels_like: parsed.main.feels_like.round() as i64,
            description: condition.description,
            humidity: parsed.main.humidity,
            wind_speed: round1(parsed.wind.speed),
            pressure: parsed.main.pressure,
            icon: condition.icon,
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        })
    }

    /// Daily forecast for `days` calendar days (1..=7), aggregated from the
    /// upstream's 3-hour samples.
    pub async fn forecast(&self, location: &str, days: u32, units: Units) -> Result<ForecastData> {
        if !(1..=7).contains(&days) {
            return Err(Error::validation("Days must be between 1 and 7"));
        }

        let parsed = self.fetch_forecast(location, units).await?;
        let samples: Vec<ForecastSample> = parsed.list.iter().map(ForecastSample::from).collect();

        Ok(ForecastData {
            location: parsed.city.name,
            country: parsed.city.country,
            forecast: aggregate_daily(&samples, days as usize),
        })
    }

    /// Hourly forecast for up to `hours` hours (capped at 48).
    ///
    /// The One Call hourly feed is the primary source; when it is
    /// unavailable (e.g. the key is not entitled to it) we fall back to the
    /// 3-hour forecast feed with an identical output shape.
    pub async fn hourly(&self, location: &str, hours: u32, units: Units) -> Result<HourlyData> {
        let hours = hours.clamp(1, MAX_HOURLY_SAMPLES);

        // Geocode first; an unknown location fails here for both sources.
        let place = self.geocode(location).await?;

        match self.fetch_one_call(&place, units).await {
            Ok(parsed) => Ok(HourlyData {
                location: place.name,
                country: place.country,
                hourly: shape_one_call_hours(&parsed, hours),
            }),
            Err(err) => {
                tracing::debug!(
                    location,
                    error = %err,
                    "One Call hourly source unavailable, falling back to 3-hour forecast"
                );
                let parsed = self.fetch_forecast(location, units).await?;
                let hourly = shape_forecast_hours(&parsed, hours);
                Ok(HourlyData {
                    location: parsed.city.name,
                    country: parsed.city.country,
                    hourly,
                })
            }
        }
    }

    /// Current conditions for two locations, fetched concurrently. Either
    /// failure fails the whole comparison.
    pub async fn compare(
        &self,
        location1: &str,
        location2: &str,
        units: Units,
    ) -> Result<ComparisonData> {
        let (weather1, weather2) = tokio::try_join!(
            self.current_weather(location1, units),
            self.current_weather(location2, units),
        )?;

        Ok(ComparisonData {
            temp_difference: (weather1.temperature - weather2.temperature).abs(),
            humidity_difference: (i64::from(weather1.humidity) - i64::from(weather2.humidity))
                .abs(),
            location1: weather1,
            location2: weather2,
        })
    }

    async fn fetch_forecast(&self, location: &str, units: Units) -> Result<OwForecastResponse> {
        self.get_json(
            "/data/2.5/forecast",
            &[
                ("q", location.to_string()),
                ("units", units.api_param().to_string()),
            ],
            Some(location),
        )
        .await
    }

    async fn geocode(&self, location: &str) -> Result<OwGeoEntry> {
        let mut entries: Vec<OwGeoEntry> = self
            .get_json(
                "/geo/1.0/direct",
                &[("q", location.to_string()), ("limit", "1".to_string())],
                Some(location),
            )
            .await?;

        if entries.is_empty() {
            return Err(Error::not_found(format!(
                "Location \"{location}\" not found. Please check the city name and try again."
            )));
        }
        Ok(entries.remove(0))
    }

    async fn fetch_one_call(&self, place: &OwGeoEntry, units: Units) -> Result<OwOneCallResponse> {
        self.get_json(
            "/data/3.0/onecall",
            &[
                ("lat", place.lat.to_string()),
                ("lon", place.lon.to_string()),
                ("units", units.api_param().to_string()),
                ("exclude", "minutely,daily,alerts".to_string()),
            ],
            None,
        )
        .await
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        location: Option<&str>,
    ) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);

        let res = self
            .http
            .get(&url)
            .query(query)
            .query(&[("appid", self.api_key.as_str())])
            .send()
            .await
            .map_err(|source| Error::Transport { service: SERVICE, source })?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|source| Error::Transport { service: SERVICE, source })?;

        if !status.is_success() {
            if status == StatusCode::NOT_FOUND {
                if let Some(location) = location {
                    return Err(Error::not_found(format!(
                        "Location \"{location}\" not found. \
                         Please check the city name and try again."
                    )));
                }
            }
            return Err(Error::Upstream {
                service: SERVICE,
                status: status.as_u16(),
                message: truncate_body(&body),
            });
        }

        serde_json::from_str(&body).map_err(|source| Error::Decode { service: SERVICE, source })
    }
}

/// One fine-grained forecast sample, decoupled from the wire shape so the
/// aggregation below stays a pure function.
#[derive(Debug, Clone)]
struct ForecastSample {
    /// Calendar date, YYYY-MM-DD, taken from the sample's timestamp text.
    date: String,
    temp: f64,
    humidity: f64,
    wind_speed: f64,
    description: String,
    icon: String,
}

impl From<&OwForecastEntry> for ForecastSample {
    fn from(entry: &OwForecastEntry) -> Self {
        let condition = entry.weather.first().cloned().unwrap_or_default();
        ForecastSample {
            date: entry.dt_txt.split(' ').next().unwrap_or_default().to_string(),
            temp: entry.main.temp,
            humidity: f64::from(entry.main.humidity),
            wind_speed: entry.wind.speed,
            description: condition.description,
            icon: condition.icon,
        }
    }
}

/// Group samples by calendar date (first-seen order) and collapse each of
/// the first `days` groups into a daily summary. Description and icon come
/// from the sample nearest the middle of the group as a proxy for midday
/// conditions.
fn aggregate_daily(samples: &[ForecastSample], days: usize) -> Vec<ForecastDay> {
    let mut order: Vec<&str> = Vec::new();
    for sample in samples {
        if !order.contains(&sample.date.as_str()) {
            order.push(sample.date.as_str());
        }
    }

    order
        .into_iter()
        .take(days)
        .map(|date| {
            let group: Vec<&ForecastSample> =
                samples.iter().filter(|s| s.date == date).collect();

            let temp_min = group.iter().map(|s| s.temp).fold(f64::INFINITY, f64::min);
            let temp_max = group.iter().map(|s| s.temp).fold(f64::NEG_INFINITY, f64::max);
            let humidity: f64 =
                group.iter().map(|s| s.humidity).sum::<f64>() / group.len() as f64;
            let wind_speed: f64 =
                group.iter().map(|s| s.wind_speed).sum::<f64>() / group.len() as f64;
            let midday = group[group.len() / 2];

            ForecastDay {
                date: date.to_string(),
                temp_min: temp_min.round() as i64,
                temp_max: temp_max.round() as i64,
                description: midday.description.clone(),
                humidity: humidity.round() as u8,
                wind_speed: round1(wind_speed),
                icon: midday.icon.clone(),
            }
        })
        .collect()
}

/// Primary producer: one output entry per One Call hourly sample.
fn shape_one_call_hours(parsed: &OwOneCallResponse, hours: u32) -> Vec<HourlyWeather> {
    parsed
        .hourly
        .iter()
        .take(hours as usize)
        .map(|hour| {
            let condition = hour.weather.first().cloned().unwrap_or_default();
            HourlyWeather {
                time: hour_label(hour.dt, parsed.timezone_offset),
                temperature: hour.temp.round() as i64,
                feels_like: hour.feels_like.round() as i64,
                description: condition.description,
                humidity: hour.humidity,
                wind_speed: round1(hour.wind_speed),
                pop: pop_percent(hour.pop),
                icon: condition.icon,
            }
        })
        .collect()
}

/// Fallback producer: one output entry per 3-hour forecast sample, slicing
/// ceil(hours / 3) entries capped at 16 so the covered span matches the
/// request. Output shape is identical to the primary producer's.
fn shape_forecast_hours(parsed: &OwForecastResponse, hours: u32) -> Vec<HourlyWeather> {
    let groups = hours.div_ceil(3).min(MAX_FALLBACK_GROUPS) as usize;

    parsed
        .list
        .iter()
        .take(groups)
        .map(|entry| {
            let condition = entry.weather.first().cloned().unwrap_or_default();
            HourlyWeather {
                time: hour_label(entry.dt, parsed.city.timezone),
                temperature: entry.main.temp.round() as i64,
                feels_like: entry.main.feels_like.round() as i64,
                description: condition.description,
                humidity: entry.main.humidity,
                wind_speed: round1(entry.wind.speed),
                pop: pop_percent(entry.pop),
                icon: condition.icon,
            }
        })
        .collect()
}

/// HH:MM in the location's local time.
fn hour_label(dt: i64, offset_secs: i32) -> String {
    match DateTime::<Utc>::from_timestamp(dt + i64::from(offset_secs), 0) {
        Some(t) => t.format("%H:%M").to_string(),
        None => "--:--".to_string(),
    }
}

/// Upstream reports precipitation probability as a 0-1 fraction.
fn pop_percent(pop: f64) -> u8 {
    (pop * 100.0).round().clamp(0.0, 100.0) as u8
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[derive(Debug, Clone, Default, Deserialize)]
struct OwCondition {
    description: String,
    icon: String,
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    feels_like: f64,
    humidity: u8,
    pressure: u32,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct OwSys {
    country: String,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    name: String,
    main: OwMain,
    weather: Vec<OwCondition>,
    wind: OwWind,
    sys: OwSys,
}

#[derive(Debug, Deserialize)]
struct OwForecastEntry {
    dt: i64,
    dt_txt: String,
    main: OwMain,
    weather: Vec<OwCondition>,
    wind: OwWind,
    #[serde(default)]
    pop: f64,
}

#[derive(Debug, Deserialize)]
struct OwCity {
    name: String,
    country: String,
    #[serde(default)]
    timezone: i32,
}

#[derive(Debug, Deserialize)]
struct OwForecastResponse {
    city: OwCity,
    list: Vec<OwForecastEntry>,
}

#[derive(Debug, Deserialize)]
struct OwGeoEntry {
    name: String,
    lat: f64,
    lon: f64,
    country: String,
}

#[derive(Debug, Deserialize)]
struct OwOneCallHour {
    dt: i64,
    temp: f64,
    feels_like: f64,
    humidity: u8,
    wind_speed: f64,
    #[serde(default)]
    pop: f64,
    weather: Vec<OwCondition>,
}

#[derive(Debug, Deserialize)]
struct OwOneCallResponse {
    timezone_offset: i32,
    hourly: Vec<OwOneCallHour>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(date: &str, temp: f64, humidity: f64, wind: f64, desc: &str) -> ForecastSample {
        ForecastSample {
            date: date.to_string(),
            temp,
            humidity,
            wind_speed: wind,
            description: desc.to_string(),
            icon: "01d".to_string(),
        }
    }

    #[test]
    fn samples_spanning_two_dates_yield_two_days() {
        let samples = vec![
            sample("2026-08-25", 18.2, 70.0, 3.0, "clouds"),
            sample("2026-08-25", 23.7, 60.0, 4.0, "sun"),
            sample("2026-08-25", 20.1, 65.0, 5.0, "clouds"),
            sample("2026-08-26", 15.4, 80.0, 2.0, "rain"),
            sample("2026-08-26", 17.8, 85.0, 3.0, "rain"),
        ];

        let days = aggregate_daily(&samples, 7);
        assert_eq!(days.len(), 2);
        for day in &days {
            assert!(day.temp_min <= day.temp_max);
        }
        assert_eq!(days[0].date, "2026-08-25");
        assert_eq!(days[0].temp_min, 18); // round(18.2)
        assert_eq!(days[0].temp_max, 24); // round(23.7)
        assert_eq!(days[1].temp_min, 15);
        assert_eq!(days[1].temp_max, 18);
    }

    #[test]
    fn day_limit_truncates_in_first_seen_order() {
        let samples = vec![
            sample("2026-08-25", 20.0, 50.0, 1.0, "a"),
            sample("2026-08-26", 21.0, 50.0, 1.0, "b"),
            sample("2026-08-27", 22.0, 50.0, 1.0, "c"),
        ];
        let days = aggregate_daily(&samples, 2);
        assert_eq!(days.len(), 2);
        assert_eq!(days[0].date, "2026-08-25");
        assert_eq!(days[1].date, "2026-08-26");
    }

    #[test]
    fn description_comes_from_the_middle_sample() {
        let samples = vec![
            sample("2026-08-25", 14.0, 50.0, 1.0, "night"),
            sample("2026-08-25", 19.0, 50.0, 1.0, "morning"),
            sample("2026-08-25", 24.0, 50.0, 1.0, "midday"),
            sample("2026-08-25", 22.0, 50.0, 1.0, "afternoon"),
            sample("2026-08-25", 16.0, 50.0, 1.0, "evening"),
        ];
        // index = floor(5 / 2) = 2
        assert_eq!(aggregate_daily(&samples, 1)[0].description, "midday");
    }

    #[test]
    fn humidity_and_wind_are_rounded_means() {
        let samples = vec![
            sample("2026-08-25", 20.0, 61.0, 3.14, "a"),
            sample("2026-08-25", 20.0, 62.0, 3.38, "a"),
        ];
        let day = &aggregate_daily(&samples, 1)[0];
        assert_eq!(day.humidity, 62); // round(61.5)
        assert_eq!(day.wind_speed, 3.3); // round1((3.14 + 3.38) / 2)
    }

    fn one_call_hour(dt: i64, temp: f64, pop: f64) -> OwOneCallHour {
        OwOneCallHour {
            dt,
            temp,
            feels_like: temp - 1.4,
            humidity: 55,
            wind_speed: 4.26,
            pop,
            weather: vec![OwCondition {
                description: "scattered clouds".into(),
                icon: "03d".into(),
            }],
        }
    }

    #[test]
    fn one_call_hours_are_rounded_and_labelled() {
        let parsed = OwOneCallResponse {
            timezone_offset: 3600,
            // 2026-08-25 12:00:00 UTC
            hourly: vec![one_call_hour(1_787_572_800, 21.6, 0.337)],
        };
        let hours = shape_one_call_hours(&parsed, 24);
        assert_eq!(hours.len(), 1);
        let hour = &hours[0];
        assert_eq!(hour.temperature, 22);
        assert_eq!(hour.feels_like, 20); // round(20.2)
        assert_eq!(hour.wind_speed, 4.3);
        assert_eq!(hour.pop, 34); // 0.337 -> 34%
        assert!(hour.time.ends_with(":00"));
    }

    #[test]
    fn one_call_hours_are_capped() {
        let parsed = OwOneCallResponse {
            timezone_offset: 0,
            hourly: (0..60i64).map(|i| one_call_hour(i * 3600, 20.0, 0.0)).collect(),
        };
        assert_eq!(shape_one_call_hours(&parsed, 48).len(), 48);
        assert_eq!(shape_one_call_hours(&parsed, 12).len(), 12);
    }

    fn forecast_entry(dt: i64) -> OwForecastEntry {
        OwForecastEntry {
            dt,
            dt_txt: "2026-08-25 12:00:00".into(),
            main: OwMain { temp: 19.5, feels_like: 18.9, humidity: 60, pressure: 1013 },
            weather: vec![],
            wind: OwWind { speed: 2.0 },
            pop: 0.8,
        }
    }

    #[test]
    fn fallback_slices_ceil_of_hours_over_three() {
        let parsed = OwForecastResponse {
            city: OwCity { name: "Lisbon".into(), country: "PT".into(), timezone: 0 },
            list: (0..40i64).map(|i| forecast_entry(i * 10800)).collect(),
        };

        // ceil(24 / 3) = 8, ceil(25 / 3) = 9, capped at 16 for 48 hours
        assert_eq!(shape_forecast_hours(&parsed, 24).len(), 8);
        assert_eq!(shape_forecast_hours(&parsed, 25).len(), 9);
        assert_eq!(shape_forecast_hours(&parsed, 48).len(), 16);
    }

    #[test]
    fn fallback_output_shape_matches_the_primary_path() {
        let parsed = OwForecastResponse {
            city: OwCity { name: "Lisbon".into(), country: "PT".into(), timezone: 0 },
            list: vec![forecast_entry(1_787_572_800)],
        };
        let hour = &shape_forecast_hours(&parsed, 3)[0];
        assert_eq!(hour.pop, 80);
        assert_eq!(hour.temperature, 20);
        // Missing condition falls back to the empty default.
        assert_eq!(hour.description, "");
    }
}
