//! Core library for the skybook weather & appointment-booking surface.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The error taxonomy shared by every boundary layer
//! - Shared domain models (weather snapshots, forecasts, services, bookings)
//! - The free-text weather query interpreter
//! - Clients for the two upstream services, including the pure data-shaping
//!   logic (forecast aggregation, slot availability, statistics)
//!
//! It is used by `skybook-server`, but can also be reused by other binaries
//! or services.

pub mod config;
pub mod error;
pub mod model;
pub mod query;
pub mod upstream;

pub use config::{BookingConfig, Config, WeatherConfig};
pub use error::{Error, Result};
pub use model::{
    AvailableSlot, Booking, BookingStats, BookingStatus, BookingUpdate, ComparisonData,
    ForecastData, ForecastDay, HourlyData, HourlyWeather, NewBooking, Service, StructuredResult,
    Units, WeatherData, convert_temperature,
};
pub use query::{DEFAULT_FORECAST_DAYS, QueryIntent, interpret};
pub use upstream::{BookingClient, BookingFilters, SlotPolicy, WeatherClient};
