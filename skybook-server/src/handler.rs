use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use skybook_core::{
    DEFAULT_FORECAST_DAYS, Error, QueryIntent, StructuredResult, Units, interpret,
};
use tracing::error;

use crate::app::AppState;

/// Boundary wrapper converting the core error taxonomy into the uniform
/// `{type:"error", error}` response: 400 for validation, 500 otherwise.
pub struct ApiError(Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = if self.0.is_validation() {
            StatusCode::BAD_REQUEST
        } else {
            error!("request failed: {}", self.0);
            StatusCode::INTERNAL_SERVER_ERROR
        };

        (status, Json(StructuredResult::Error { error: self.0.to_string() })).into_response()
    }
}

type ApiResult = Result<Json<StructuredResult>, ApiError>;

fn require(value: Option<String>, message: &str) -> Result<String, ApiError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
        _ => Err(Error::validation(message).into()),
    }
}

#[derive(Debug, Deserialize)]
pub struct CurrentParams {
    location: Option<String>,
    #[serde(default)]
    units: Units,
}

pub async fn current_weather(
    State(state): State<AppState>,
    Query(params): Query<CurrentParams>,
) -> ApiResult {
    let location = require(params.location, "Location parameter is required")?;
    let weather = state.weather.current_weather(&location, params.units).await?;
    Ok(Json(StructuredResult::CurrentWeather { weather, units: params.units }))
}

#[derive(Debug, Deserialize)]
pub struct ForecastParams {
    location: Option<String>,
    days: Option<u32>,
    #[serde(default)]
    units: Units,
}

pub async fn forecast(
    State(state): State<AppState>,
    Query(params): Query<ForecastParams>,
) -> ApiResult {
    let location = require(params.location, "Location parameter is required")?;
    let days = params.days.unwrap_or(DEFAULT_FORECAST_DAYS);
    if !(1..=7).contains(&days) {
        return Err(Error::validation("Days must be between 1 and 7").into());
    }

    let forecast = state.weather.forecast(&location, days, params.units).await?;
    Ok(Json(StructuredResult::Forecast { forecast, units: params.units }))
}

#[derive(Debug, Deserialize)]
pub struct HourlyParams {
    location: Option<String>,
    hours: Option<u32>,
    #[serde(default)]
    units: Units,
}

pub async fn hourly_forecast(
    State(state): State<AppState>,
    Query(params): Query<HourlyParams>,
) -> ApiResult {
    let location = require(params.location, "Location parameter is required")?;
    let hours = params.hours.unwrap_or(24);
    let hourly = state.weather.hourly(&location, hours, params.units).await?;
    Ok(Json(StructuredResult::HourlyForecast { hourly, units: params.units }))
}

#[derive(Debug, Deserialize)]
pub struct CompareParams {
    location1: Option<String>,
    location2: Option<String>,
    #[serde(default)]
    units: Units,
}

pub async fn compare_weather(
    State(state): State<AppState>,
    Query(params): Query<CompareParams>,
) -> ApiResult {
    let both = "Both location1 and location2 parameters are required";
    let location1 = require(params.location1, both)?;
    let location2 = require(params.location2, both)?;

    let comparison = state.weather.compare(&location1, &location2, params.units).await?;
    Ok(Json(StructuredResult::Comparison { comparison, units: params.units }))
}

#[derive(Debug, Deserialize)]
pub struct FreeTextParams {
    q: Option<String>,
    #[serde(default)]
    units: Units,
}

/// Interpret a free-text weather question and dispatch to the matching
/// fetch. Interpretation failures are validation errors; no network call is
/// made for an unusable query.
pub async fn free_text_query(
    State(state): State<AppState>,
    Query(params): Query<FreeTextParams>,
) -> ApiResult {
    let q = require(params.q, "Query parameter 'q' is required")?;
    let units = params.units;

    match interpret(&q)? {
        QueryIntent::Current { location } => {
            let weather = state.weather.current_weather(&location, units).await?;
            Ok(Json(StructuredResult::CurrentWeather { weather, units }))
        }
        QueryIntent::Forecast { location, days } => {
            let days = days.clamp(1, 7);
            let forecast = state.weather.forecast(&location, days, units).await?;
            Ok(Json(StructuredResult::Forecast { forecast, units }))
        }
        QueryIntent::Compare { location1, location2 } => {
            let comparison = state.weather.compare(&location1, &location2, units).await?;
            Ok(Json(StructuredResult::Comparison { comparison, units }))
        }
    }
}
