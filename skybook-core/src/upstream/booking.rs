//! Turno booking client: services, bookings, slot availability and status
//! statistics. The upstream owns the source of truth; everything here is a
//! thin request layer plus two pure calculators.

use chrono::{Duration, Utc};
use reqwest::{Client, Method};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::{
    config::BookingConfig,
    error::{Error, Result},
    model::{AvailableSlot, Booking, BookingStats, BookingStatus, BookingUpdate, NewBooking, Service},
};

use super::truncate_body;

const SERVICE: &str = "Turno";

/// Working-window policy for slot generation. The defaults (09:00-17:00
/// exclusive, 30-minute interval) yield 16 slots per day; service duration
/// does not affect slot granularity.
#[derive(Debug, Clone)]
pub struct SlotPolicy {
    pub start_hour: u32,
    /// Exclusive upper bound.
    pub end_hour: u32,
    pub interval_minutes: u32,
}

impl Default for SlotPolicy {
    fn default() -> Self {
        Self { start_hour: 9, end_hour: 17, interval_minutes: 30 }
    }
}

impl SlotPolicy {
    /// Every slot time in the working window, HH:MM, in order. A zero
    /// interval yields no slots; the fields are public, so the loop below
    /// must not rely on callers keeping the interval positive.
    pub fn times(&self) -> Vec<String> {
        if self.interval_minutes == 0 {
            return Vec::new();
        }
        let mut times = Vec::new();
        for hour in self.start_hour..self.end_hour {
            let mut minute = 0;
            while minute < 60 {
                times.push(format!("{hour:02}:{minute:02}"));
                minute += self.interval_minutes;
            }
        }
        times
    }
}

/// Mark every slot in the window, unavailable iff an existing booking
/// occupies that exact service + date + time combination.
pub fn available_slots(
    service_id: &str,
    date: &str,
    bookings: &[Booking],
    policy: &SlotPolicy,
) -> Vec<AvailableSlot> {
    policy
        .times()
        .into_iter()
        .map(|time| {
            let taken = bookings
                .iter()
                .any(|b| b.service_id == service_id && b.date == date && b.time == time);
            AvailableSlot { date: date.to_string(), time, available: !taken }
        })
        .collect()
}

/// Single-pass, order-independent tally of bookings by status.
pub fn booking_stats(bookings: &[Booking]) -> BookingStats {
    let mut stats = BookingStats { total: bookings.len(), ..BookingStats::default() };
    for booking in bookings {
        match booking.status {
            BookingStatus::Pending => stats.pending += 1,
            BookingStatus::Confirmed => stats.confirmed += 1,
            BookingStatus::Cancelled => stats.cancelled += 1,
            BookingStatus::Completed => stats.completed += 1,
        }
    }
    stats
}

/// Optional filters forwarded to the upstream booking list endpoint.
#[derive(Debug, Clone, Default)]
pub struct BookingFilters {
    pub date: Option<String>,
    pub status: Option<BookingStatus>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

impl BookingFilters {
    fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        if let Some(date) = &self.date {
            query.push(("date", date.clone()));
        }
        if let Some(status) = self.status {
            query.push(("status", status.as_str().to_string()));
        }
        if let Some(start) = &self.start_date {
            query.push(("startDate", start.clone()));
        }
        if let Some(end) = &self.end_date {
            query.push(("endDate", end.clone()));
        }
        query
    }
}

#[derive(Debug, Clone)]
pub struct BookingClient {
    base_url: String,
    api_key: String,
    http: Client,
    slot_policy: SlotPolicy,
}

impl BookingClient {
    pub fn new(config: &BookingConfig) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            http: Client::new(),
            slot_policy: SlotPolicy::default(),
        }
    }

    pub fn with_slot_policy(mut self, policy: SlotPolicy) -> Self {
        self.slot_policy = policy;
        self
    }

    pub async fn list_services(&self) -> Result<Vec<Service>> {
        let envelope: ServicesEnvelope =
            self.request(Method::GET, "/api/services", &[], None).await?;
        Ok(envelope.services)
    }

    pub async fn get_service(&self, service_id: &str) -> Result<Service> {
        self.list_services()
            .await?
            .into_iter()
            .find(|s| s.id == service_id)
            .ok_or_else(|| {
                Error::not_found(format!("Service with ID \"{service_id}\" not found"))
            })
    }

    pub async fn create_booking(&self, booking: &NewBooking) -> Result<Booking> {
        let body = serde_json::to_value(booking)
            .map_err(|source| Error::Decode { service: SERVICE, source })?;
        let envelope: BookingEnvelope =
            self.request(Method::POST, "/api/bookings", &[], Some(body)).await?;
        Ok(envelope.booking)
    }

    pub async fn list_bookings(&self, filters: &BookingFilters) -> Result<Vec<Booking>> {
        let envelope: BookingsEnvelope = self
            .request(Method::GET, "/api/bookings", &filters.to_query(), None)
            .await?;
        Ok(envelope.bookings)
    }

    pub async fn get_booking(&self, booking_id: &str) -> Result<Booking> {
        self.list_bookings(&BookingFilters::default())
            .await?
            .into_iter()
            .find(|b| b.id == booking_id)
            .ok_or_else(|| {
                Error::not_found(format!("Booking with ID \"{booking_id}\" not found"))
            })
    }

    pub async fn update_booking(&self, booking_id: &str, update: &BookingUpdate) -> Result<Booking> {
        let body = serde_json::to_value(update)
            .map_err(|source| Error::Decode { service: SERVICE, source })?;
        let path = format!("/api/bookings/{booking_id}");
        let envelope: BookingEnvelope =
            self.request(Method::PUT, &path, &[], Some(body)).await?;
        Ok(envelope.booking)
    }

    /// Set the booking's status to cancelled; an optional reason is recorded
    /// in the notes.
    pub async fn cancel_booking(&self, booking_id: &str, reason: Option<&str>) -> Result<Booking> {
        let update = BookingUpdate {
            status: Some(BookingStatus::Cancelled),
            notes: reason.map(|r| format!("Cancelled: {r}")),
            ..BookingUpdate::default()
        };
        self.update_booking(booking_id, &update).await
    }

    pub async fn delete_booking(&self, booking_id: &str) -> Result<()> {
        let path = format!("/api/bookings/{booking_id}");
        let _: serde_json::Value = self.request(Method::DELETE, &path, &[], None).await?;
        Ok(())
    }

    /// Open slots for one service on one date. Validates the service exists
    /// before computing availability.
    pub async fn available_slots(&self, service_id: &str, date: &str) -> Result<Vec<AvailableSlot>> {
        let _service = self.get_service(service_id).await?;
        let bookings = self
            .list_bookings(&BookingFilters { date: Some(date.to_string()), ..Default::default() })
            .await?;
        Ok(available_slots(service_id, date, &bookings, &self.slot_policy))
    }

    /// Booking counts by status, optionally scoped to a date range.
    pub async fn booking_stats(
        &self,
        start_date: Option<&str>,
        end_date: Option<&str>,
    ) -> Result<BookingStats> {
        let bookings = self
            .list_bookings(&BookingFilters {
                start_date: start_date.map(str::to_string),
                end_date: end_date.map(str::to_string),
                ..Default::default()
            })
            .await?;
        Ok(booking_stats(&bookings))
    }

    /// Bookings in the next `days` days, today inclusive.
    pub async fn upcoming_bookings(&self, days: u32) -> Result<Vec<Booking>> {
        let today = Utc::now().date_naive();
        let end = today + Duration::days(i64::from(days));
        self.list_bookings(&BookingFilters {
            start_date: Some(today.format("%Y-%m-%d").to_string()),
            end_date: Some(end.format("%Y-%m-%d").to_string()),
            ..Default::default()
        })
        .await
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: &[(&'static str, String)],
        body: Option<serde_json::Value>,
    ) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);

        let mut builder = self
            .http
            .request(method, &url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json");
        if !query.is_empty() {
            builder = builder.query(query);
        }
        if let Some(body) = body {
            builder = builder.json(&body);
        }

        let res = builder
            .send()
            .await
            .map_err(|source| Error::Transport { service: SERVICE, source })?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|source| Error::Transport { service: SERVICE, source })?;

        if !status.is_success() {
            return Err(Error::Upstream {
                service: SERVICE,
                status: status.as_u16(),
                message: truncate_body(&body),
            });
        }

        serde_json::from_str(&body).map_err(|source| Error::Decode { service: SERVICE, source })
    }
}

#[derive(Debug, Deserialize)]
struct ServicesEnvelope {
    #[serde(default)]
    services: Vec<Service>,
}

#[derive(Debug, Deserialize)]
struct BookingEnvelope {
    booking: Booking,
}

#[derive(Debug, Deserialize)]
struct BookingsEnvelope {
    #[serde(default)]
    bookings: Vec<Booking>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn booking(id: &str, service_id: &str, date: &str, time: &str, status: BookingStatus) -> Booking {
        Booking {
            id: id.to_string(),
            service_id: service_id.to_string(),
            service_name: None,
            customer_name: "Ada".to_string(),
            customer_email: "ada@example.com".to_string(),
            customer_phone: None,
            date: date.to_string(),
            time: time.to_string(),
            status,
            notes: None,
            duration: None,
            price: None,
            created_at: None,
        }
    }

    #[test]
    fn default_policy_yields_sixteen_slots() {
        let times = SlotPolicy::default().times();
        assert_eq!(times.len(), 16);
        assert_eq!(times[0], "09:00");
        assert_eq!(times[15], "16:30");
        assert!(!times.contains(&"17:00".to_string()));
    }

    #[test]
    fn zero_interval_yields_no_slots_instead_of_spinning() {
        let policy = SlotPolicy { interval_minutes: 0, ..SlotPolicy::default() };
        assert!(policy.times().is_empty());
    }

    #[test]
    fn empty_calendar_means_every_slot_is_open() {
        let slots = available_slots("svc-1", "2026-09-01", &[], &SlotPolicy::default());
        assert_eq!(slots.len(), 16);
        assert!(slots.iter().all(|s| s.available));
    }

    #[test]
    fn one_booking_flips_exactly_one_slot() {
        let bookings = vec![booking(
            "b-1",
            "svc-1",
            "2026-09-01",
            "09:00",
            BookingStatus::Confirmed,
        )];
        let slots = available_slots("svc-1", "2026-09-01", &bookings, &SlotPolicy::default());

        let taken: Vec<&AvailableSlot> = slots.iter().filter(|s| !s.available).collect();
        assert_eq!(taken.len(), 1);
        assert_eq!(taken[0].time, "09:00");
        assert_eq!(slots.iter().filter(|s| s.available).count(), 15);
    }

    #[test]
    fn other_services_do_not_block_slots() {
        let bookings = vec![booking(
            "b-1",
            "svc-2",
            "2026-09-01",
            "09:00",
            BookingStatus::Confirmed,
        )];
        let slots = available_slots("svc-1", "2026-09-01", &bookings, &SlotPolicy::default());
        assert!(slots.iter().all(|s| s.available));
    }

    #[test]
    fn stats_partition_by_status() {
        let bookings = vec![
            booking("1", "s", "2026-09-01", "09:00", BookingStatus::Confirmed),
            booking("2", "s", "2026-09-01", "09:30", BookingStatus::Confirmed),
            booking("3", "s", "2026-09-01", "10:00", BookingStatus::Confirmed),
            booking("4", "s", "2026-09-01", "10:30", BookingStatus::Pending),
            booking("5", "s", "2026-09-01", "11:00", BookingStatus::Cancelled),
            booking("6", "s", "2026-09-02", "09:00", BookingStatus::Cancelled),
        ];

        let stats = booking_stats(&bookings);
        assert_eq!(
            stats,
            BookingStats { total: 6, confirmed: 3, pending: 1, cancelled: 2, completed: 0 }
        );
    }

    #[test]
    fn stats_of_empty_list_are_all_zero() {
        assert_eq!(booking_stats(&[]), BookingStats::default());
    }

    #[test]
    fn filters_map_to_upstream_query_parameters() {
        let filters = BookingFilters {
            date: Some("2026-09-01".into()),
            status: Some(BookingStatus::Pending),
            start_date: None,
            end_date: Some("2026-09-30".into()),
        };
        assert_eq!(
            filters.to_query(),
            vec![
                ("date", "2026-09-01".to_string()),
                ("status", "pending".to_string()),
                ("endDate", "2026-09-30".to_string()),
            ]
        );
    }
}
