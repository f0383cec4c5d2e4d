//! Clients for the two upstream services: OpenWeatherMap (weather) and
//! Turno (bookings). Every entity they produce is built fresh per request
//! from upstream JSON and discarded after the response is sent.

pub mod booking;
pub mod weather;

pub use booking::{BookingClient, BookingFilters, SlotPolicy};
pub use weather::WeatherClient;

/// Keep upstream error bodies readable when embedded in our own messages.
/// The cut is backed off to a char boundary; upstream bodies are arbitrary
/// text and byte 200 can fall inside a multibyte character.
pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() <= MAX {
        return body.to_string();
    }
    let mut cut = MAX;
    while !body.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}...", &body[..cut])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_bodies_are_truncated_with_ellipsis() {
        let long = "x".repeat(300);
        let out = truncate_body(&long);
        assert_eq!(out.len(), 203);
        assert!(out.ends_with("..."));

        assert_eq!(truncate_body("short"), "short");
    }

    #[test]
    fn truncation_backs_off_to_a_char_boundary() {
        // Byte 200 lands inside the 'é'; the cut must move back, not panic.
        let body = format!("{}é and more", "x".repeat(199));
        let out = truncate_body(&body);
        assert_eq!(out, format!("{}...", "x".repeat(199)));

        // A body of exactly 200 bytes passes through untouched.
        let exact = format!("{}é", "x".repeat(198));
        assert_eq!(truncate_body(&exact), exact);
    }
}
