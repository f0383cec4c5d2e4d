//! MCP tool surface: the same weather and booking operations exposed as
//! callable tools for a conversational host, plus the HTML widget templates
//! served as resources.
//!
//! Tool failures never become protocol errors; they are reported as results
//! with the `is_error` flag set and a `{type:"error"}` structured payload,
//! so the host can distinguish a failed tool call from a broken server.

use rmcp::{
    ErrorData as McpError, RoleServer, ServerHandler,
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{
        AnnotateAble, CallToolResult, Content, Implementation, ListResourcesResult,
        PaginatedRequestParam, ProtocolVersion, RawResource, ReadResourceRequestParam,
        ReadResourceResult, Resource, ResourceContents, ServerCapabilities, ServerInfo,
    },
    service::RequestContext,
    tool, tool_handler, tool_router,
};
use schemars::JsonSchema;
use serde::Deserialize;

use skybook_core::{
    BookingClient, BookingFilters, BookingStatus, Config, Error, NewBooking, Result,
    StructuredResult, Units, WeatherClient,
};

const WIDGET_MIME_TYPE: &str = "text/html+skybridge";

struct Widget {
    title: &'static str,
    uri: &'static str,
    description: &'static str,
    html: &'static str,
}

const WIDGETS: &[Widget] = &[
    Widget {
        title: "Current Weather",
        uri: "ui://widget/current-weather-template.html",
        description: "Displays current weather for a location",
        html: include_str!("../widgets/current-weather.html"),
    },
    Widget {
        title: "Weather Forecast",
        uri: "ui://widget/forecast-template.html",
        description: "Displays weather forecast for upcoming days",
        html: include_str!("../widgets/forecast.html"),
    },
    Widget {
        title: "Weather Comparison",
        uri: "ui://widget/comparison-template.html",
        description: "Compares weather between two locations",
        html: include_str!("../widgets/comparison.html"),
    },
];

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CurrentWeatherArgs {
    /// City name or location (e.g., 'London', 'New York', 'Tokyo')
    pub location: String,
    /// Temperature units to use
    pub units: Option<Units>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ForecastArgs {
    /// City name or location (e.g., 'London', 'New York', 'Tokyo')
    pub location: String,
    /// Number of forecast days (1-7)
    pub days: Option<u32>,
    /// Temperature units to use
    pub units: Option<Units>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct HourlyArgs {
    /// City name or location (e.g., 'London', 'New York', 'Tokyo')
    pub location: String,
    /// Number of forecast hours (1-48)
    pub hours: Option<u32>,
    /// Temperature units to use
    pub units: Option<Units>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompareArgs {
    /// First city or location to compare
    pub location1: String,
    /// Second city or location to compare
    pub location2: String,
    /// Temperature units to use
    pub units: Option<Units>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListServicesArgs {
    /// Only return services in this category
    pub category: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingArgs {
    /// ID of the service to book
    pub service_id: String,
    /// Customer's full name
    pub customer_name: String,
    /// Customer's email address
    pub customer_email: String,
    /// Customer's phone number
    pub customer_phone: Option<String>,
    /// Appointment date, YYYY-MM-DD
    pub date: String,
    /// Appointment time, HH:MM (24-hour)
    pub time: String,
    /// Optional notes for the booking
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListBookingsArgs {
    /// Only bookings on this date, YYYY-MM-DD
    pub date: Option<String>,
    /// Start of a date range, YYYY-MM-DD
    pub start_date: Option<String>,
    /// End of a date range, YYYY-MM-DD
    pub end_date: Option<String>,
    /// Filter by status: pending, confirmed, cancelled or completed
    pub status: Option<String>,
    /// Shortcut: bookings in the next 7 days
    pub upcoming: Option<bool>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityArgs {
    /// ID of the service to check
    pub service_id: String,
    /// Date to check, YYYY-MM-DD
    pub date: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookingDetailsArgs {
    /// ID of the booking
    pub booking_id: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CancelBookingArgs {
    /// ID of the booking to cancel
    pub booking_id: String,
    /// Optional cancellation reason, recorded in the booking notes
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookingStatsArgs {
    /// Start of a date range, YYYY-MM-DD
    pub start_date: Option<String>,
    /// End of a date range, YYYY-MM-DD
    pub end_date: Option<String>,
}

#[derive(Clone)]
pub struct SkybookService {
    weather: WeatherClient,
    booking: BookingClient,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl SkybookService {
    pub fn new(config: &Config) -> Self {
        Self {
            weather: WeatherClient::new(&config.weather),
            booking: BookingClient::new(&config.booking),
            tool_router: Self::tool_router(),
        }
    }

    #[tool(
        description = "Get current weather information for any city or location. Returns temperature, conditions, humidity, wind speed, and more."
    )]
    async fn get_current_weather(
        &self,
        Parameters(args): Parameters<CurrentWeatherArgs>,
    ) -> std::result::Result<CallToolResult, McpError> {
        let units = args.units.unwrap_or_default();
        let outcome = self.weather.current_weather(&args.location, units).await.map(|weather| {
            let text = format!(
                "Current weather in {}, {}:\n\
                 Temperature: {}°{} (feels like {}°{})\n\
                 Conditions: {}\n\
                 Humidity: {}%\n\
                 Wind Speed: {} {}\n\
                 Pressure: {} hPa",
                weather.location,
                weather.country,
                weather.temperature,
                units.symbol(),
                weather.feels_like,
                units.symbol(),
                weather.description,
                weather.humidity,
                weather.wind_speed,
                units.speed_label(),
                weather.pressure,
            );
            (text, StructuredResult::CurrentWeather { weather, units })
        });
        Ok(tool_outcome(outcome))
    }

    #[tool(
        description = "Get weather forecast for upcoming days for any city or location. Returns daily forecasts with temperature ranges and conditions."
    )]
    async fn get_weather_forecast(
        &self,
        Parameters(args): Parameters<ForecastArgs>,
    ) -> std::result::Result<CallToolResult, McpError> {
        let units = args.units.unwrap_or_default();
        let days = args.days.unwrap_or(skybook_core::DEFAULT_FORECAST_DAYS);
        let outcome = self.weather.forecast(&args.location, days, units).await.map(|forecast| {
            let lines: Vec<String> = forecast
                .forecast
                .iter()
                .map(|day| {
                    format!(
                        "{}: {}-{}°{}, {}",
                        day.date, day.temp_min, day.temp_max, units.symbol(), day.description
                    )
                })
                .collect();
            let text = format!(
                "{days}-day forecast for {}, {}:\n{}",
                forecast.location,
                forecast.country,
                lines.join("\n"),
            );
            (text, StructuredResult::Forecast { forecast, units })
        });
        Ok(tool_outcome(outcome))
    }

    #[tool(
        description = "Get an hour-by-hour forecast for any city or location, including temperature and precipitation probability."
    )]
    async fn get_hourly_forecast(
        &self,
        Parameters(args): Parameters<HourlyArgs>,
    ) -> std::result::Result<CallToolResult, McpError> {
        let units = args.units.unwrap_or_default();
        let hours = args.hours.unwrap_or(24);
        let outcome = self.weather.hourly(&args.location, hours, units).await.map(|hourly| {
            let lines: Vec<String> = hourly
                .hourly
                .iter()
                .map(|hour| {
                    format!(
                        "{}: {}°{}, {} ({}% rain)",
                        hour.time, hour.temperature, units.symbol(), hour.description, hour.pop
                    )
                })
                .collect();
            let text = format!(
                "Hourly forecast for {}, {}:\n{}",
                hourly.location,
                hourly.country,
                lines.join("\n"),
            );
            (text, StructuredResult::HourlyForecast { hourly, units })
        });
        Ok(tool_outcome(outcome))
    }

    #[tool(
        description = "Compare current weather conditions between two different cities or locations. Shows temperature and humidity differences."
    )]
    async fn compare_weather(
        &self,
        Parameters(args): Parameters<CompareArgs>,
    ) -> std::result::Result<CallToolResult, McpError> {
        let units = args.units.unwrap_or_default();
        let outcome = self
            .weather
            .compare(&args.location1, &args.location2, units)
            .await
            .map(|comparison| {
                let text = format!(
                    "Weather Comparison:\n\n\
                     {}: {}°{}, {}\n\
                     {}: {}°{}, {}\n\n\
                     Temperature difference: {}°{}\n\
                     Humidity difference: {}%",
                    comparison.location1.location,
                    comparison.location1.temperature,
                    units.symbol(),
                    comparison.location1.description,
                    comparison.location2.location,
                    comparison.location2.temperature,
                    units.symbol(),
                    comparison.location2.description,
                    comparison.temp_difference,
                    units.symbol(),
                    comparison.humidity_difference,
                );
                (text, StructuredResult::Comparison { comparison, units })
            });
        Ok(tool_outcome(outcome))
    }

    #[tool(
        description = "List the bookable services, optionally filtered by category. Returns name, duration and price for each service."
    )]
    async fn list_services(
        &self,
        Parameters(args): Parameters<ListServicesArgs>,
    ) -> std::result::Result<CallToolResult, McpError> {
        let outcome = self.booking.list_services().await.map(|mut services| {
            if let Some(category) = &args.category {
                let wanted = category.to_lowercase();
                services.retain(|s| {
                    s.category.as_deref().is_some_and(|c| c.to_lowercase() == wanted)
                });
            }
            let text = if services.is_empty() {
                "No services found.".to_string()
            } else {
                let lines: Vec<String> = services
                    .iter()
                    .map(|s| format!("- {} ({} min, ${:.2}) [id: {}]", s.name, s.duration, s.price, s.id))
                    .collect();
                format!("Available services:\n{}", lines.join("\n"))
            };
            (text, StructuredResult::Services { services })
        });
        Ok(tool_outcome(outcome))
    }

    #[tool(
        description = "Create a new appointment booking for a service. The booking starts in pending status."
    )]
    async fn create_booking(
        &self,
        Parameters(args): Parameters<CreateBookingArgs>,
    ) -> std::result::Result<CallToolResult, McpError> {
        let outcome = self.create_booking_inner(args).await;
        Ok(tool_outcome(outcome))
    }

    #[tool(
        description = "List bookings, filtered by date, date range, status, or the upcoming-week shortcut."
    )]
    async fn list_bookings(
        &self,
        Parameters(args): Parameters<ListBookingsArgs>,
    ) -> std::result::Result<CallToolResult, McpError> {
        let outcome = self.list_bookings_inner(args).await;
        Ok(tool_outcome(outcome))
    }

    #[tool(
        description = "Check which appointment slots are open for a service on a given date. Slots run 09:00-17:00 at 30-minute intervals."
    )]
    async fn check_availability(
        &self,
        Parameters(args): Parameters<AvailabilityArgs>,
    ) -> std::result::Result<CallToolResult, McpError> {
        let outcome = self.check_availability_inner(args).await;
        Ok(tool_outcome(outcome))
    }

    #[tool(description = "Get the full details of one booking by its ID.")]
    async fn get_booking_details(
        &self,
        Parameters(args): Parameters<BookingDetailsArgs>,
    ) -> std::result::Result<CallToolResult, McpError> {
        let outcome = self.booking.get_booking(&args.booking_id).await.map(|booking| {
            let text = format!(
                "Booking {}: {} for {} ({}) on {} at {} [{}]",
                booking.id,
                booking.service_name.as_deref().unwrap_or(&booking.service_id),
                booking.customer_name,
                booking.customer_email,
                booking.date,
                booking.time,
                booking.status,
            );
            (text, StructuredResult::Booking { booking })
        });
        Ok(tool_outcome(outcome))
    }

    #[tool(description = "Cancel a booking by its ID, with an optional reason.")]
    async fn cancel_booking(
        &self,
        Parameters(args): Parameters<CancelBookingArgs>,
    ) -> std::result::Result<CallToolResult, McpError> {
        let outcome = self
            .booking
            .cancel_booking(&args.booking_id, args.reason.as_deref())
            .await
            .map(|booking| {
                let text = format!(
                    "Booking {} on {} at {} has been cancelled.",
                    booking.id, booking.date, booking.time
                );
                (text, StructuredResult::Booking { booking })
            });
        Ok(tool_outcome(outcome))
    }

    #[tool(
        description = "Get booking statistics: totals per status, optionally scoped to a date range."
    )]
    async fn get_booking_stats(
        &self,
        Parameters(args): Parameters<BookingStatsArgs>,
    ) -> std::result::Result<CallToolResult, McpError> {
        let outcome = self
            .booking
            .booking_stats(args.start_date.as_deref(), args.end_date.as_deref())
            .await
            .map(|stats| {
                let text = format!(
                    "Bookings: {} total ({} confirmed, {} pending, {} cancelled, {} completed)",
                    stats.total, stats.confirmed, stats.pending, stats.cancelled, stats.completed,
                );
                (text, StructuredResult::BookingStats { stats })
            });
        Ok(tool_outcome(outcome))
    }
}

impl SkybookService {
    async fn create_booking_inner(
        &self,
        args: CreateBookingArgs,
    ) -> Result<(String, StructuredResult)> {
        validate_date(&args.date)?;
        validate_time(&args.time)?;

        // Resolve the service first so an unknown ID fails with a not-found
        // message instead of an opaque upstream error.
        let service = self.booking.get_service(&args.service_id).await?;

        let booking = self
            .booking
            .create_booking(&NewBooking {
                service_id: args.service_id,
                customer_name: args.customer_name,
                customer_email: args.customer_email,
                customer_phone: args.customer_phone,
                date: args.date,
                time: args.time,
                status: BookingStatus::Pending,
                notes: args.notes,
            })
            .await?;

        let text = format!(
            "Booking created: {} on {} at {} for {} (id: {}, status: {})",
            service.name, booking.date, booking.time, booking.customer_name, booking.id,
            booking.status,
        );
        Ok((text, StructuredResult::Booking { booking }))
    }

    async fn list_bookings_inner(
        &self,
        args: ListBookingsArgs,
    ) -> Result<(String, StructuredResult)> {
        let bookings = if args.upcoming.unwrap_or(false) {
            self.booking.upcoming_bookings(7).await?
        } else {
            let status = match args.status.as_deref() {
                Some(raw) => Some(raw.parse::<BookingStatus>()?),
                None => None,
            };
            self.booking
                .list_bookings(&BookingFilters {
                    date: args.date,
                    status,
                    start_date: args.start_date,
                    end_date: args.end_date,
                })
                .await?
        };

        let text = if bookings.is_empty() {
            "No bookings found.".to_string()
        } else {
            let lines: Vec<String> = bookings
                .iter()
                .map(|b| {
                    format!(
                        "- {} at {}: {} ({}) [{}, id: {}]",
                        b.date, b.time, b.customer_name,
                        b.service_name.as_deref().unwrap_or(&b.service_id),
                        b.status, b.id,
                    )
                })
                .collect();
            format!("{} booking(s):\n{}", bookings.len(), lines.join("\n"))
        };
        Ok((text, StructuredResult::Bookings { bookings }))
    }

    async fn check_availability_inner(
        &self,
        args: AvailabilityArgs,
    ) -> Result<(String, StructuredResult)> {
        validate_date(&args.date)?;

        let slots = self.booking.available_slots(&args.service_id, &args.date).await?;
        let open: Vec<&str> = slots
            .iter()
            .filter(|s| s.available)
            .map(|s| s.time.as_str())
            .collect();

        let text = if open.is_empty() {
            format!("No open slots on {}.", args.date)
        } else {
            format!(
                "{} of {} slots open on {}: {}",
                open.len(),
                slots.len(),
                args.date,
                open.join(", "),
            )
        };
        Ok((
            text,
            StructuredResult::Availability { service_id: args.service_id, date: args.date, slots },
        ))
    }
}

/// Convert an operation outcome into a tool result: a text summary plus the
/// `type`-tagged structured payload, or an error result with `is_error` set.
fn tool_outcome(outcome: Result<(String, StructuredResult)>) -> CallToolResult {
    match outcome {
        Ok((text, structured)) => {
            let mut result = CallToolResult::success(vec![Content::text(text)]);
            result.structured_content = serde_json::to_value(&structured).ok();
            result
        }
        Err(err) => {
            let message = err.to_string();
            let mut result = CallToolResult::error(vec![Content::text(format!("Error: {message}"))]);
            result.structured_content =
                serde_json::to_value(StructuredResult::Error { error: message }).ok();
            result
        }
    }
}

fn validate_date(date: &str) -> Result<()> {
    chrono::NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map(|_| ())
        .map_err(|_| Error::validation(format!("Invalid date '{date}'. Expected YYYY-MM-DD.")))
}

fn validate_time(time: &str) -> Result<()> {
    chrono::NaiveTime::parse_from_str(time, "%H:%M")
        .map(|_| ())
        .map_err(|_| Error::validation(format!("Invalid time '{time}'. Expected HH:MM.")))
}

fn widget_resource(widget: &Widget) -> Resource {
    let mut raw = RawResource::new(widget.uri, widget.title);
    raw.description = Some(widget.description.to_string());
    raw.mime_type = Some(WIDGET_MIME_TYPE.to_string());
    raw.no_annotation()
}

#[tool_handler]
impl ServerHandler for SkybookService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::default(),
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_resources()
                .build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(
                "Weather lookups (current, forecast, hourly, comparison) and \
                 appointment booking (services, bookings, availability, stats)."
                    .to_string(),
            ),
        }
    }

    async fn list_resources(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> std::result::Result<ListResourcesResult, McpError> {
        Ok(ListResourcesResult {
            resources: WIDGETS.iter().map(widget_resource).collect(),
            next_cursor: None,
        })
    }

    async fn read_resource(
        &self,
        request: ReadResourceRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> std::result::Result<ReadResourceResult, McpError> {
        match WIDGETS.iter().find(|w| w.uri == request.uri) {
            Some(widget) => Ok(ReadResourceResult {
                contents: vec![ResourceContents::text(widget.html, request.uri.clone())],
            }),
            None => Err(McpError::resource_not_found(
                format!("Unknown resource: {}", request.uri),
                None,
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dates_and_times_are_validated_before_any_upstream_call() {
        assert!(validate_date("2026-09-01").is_ok());
        assert!(validate_date("01/09/2026").is_err());
        assert!(validate_time("09:30").is_ok());
        assert!(validate_time("9am").is_err());
    }

    #[test]
    fn error_outcomes_set_the_failure_flag() {
        let result = tool_outcome(Err(Error::validation("bad input")));
        assert_eq!(result.is_error, Some(true));
        let structured = result.structured_content.expect("structured error payload");
        assert_eq!(structured["type"], "error");
        assert_eq!(structured["error"], "bad input");
    }

    #[test]
    fn success_outcomes_carry_text_and_structured_payload() {
        let result = tool_outcome(Ok((
            "6 bookings".to_string(),
            StructuredResult::BookingStats { stats: skybook_core::BookingStats::default() },
        )));
        assert_eq!(result.is_error, Some(false));
        let structured = result.structured_content.expect("structured payload");
        assert_eq!(structured["type"], "booking_stats");
    }

    #[test]
    fn every_widget_template_is_resolvable() {
        for widget in WIDGETS {
            assert!(widget.uri.starts_with("ui://widget/"));
            assert!(!widget.html.is_empty());
            let resource = widget_resource(widget);
            assert_eq!(resource.mime_type.as_deref(), Some(WIDGET_MIME_TYPE));
        }
    }
}
