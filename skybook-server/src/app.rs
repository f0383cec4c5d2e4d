use axum::{Router, routing::get};
use skybook_core::{Config, WeatherClient};

use crate::handler::{
    compare_weather, current_weather, forecast, free_text_query, hourly_forecast,
};

#[derive(Clone)]
pub struct AppState {
    pub weather: WeatherClient,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        Self { weather: WeatherClient::new(&config.weather) }
    }
}

pub fn create_router(state: AppState) -> Router {
    let weather_routes = Router::new()
        .route("/current", get(current_weather))
        .route("/forecast", get(forecast))
        .route("/hourly", get(hourly_forecast))
        .route("/compare", get(compare_weather))
        .route("/query", get(free_text_query));

    Router::new().nest("/weather", weather_routes).with_state(state)
}
