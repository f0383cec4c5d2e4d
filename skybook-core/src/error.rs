use thiserror::Error;

/// Error type shared by every skybook operation.
///
/// The variants mirror how the boundary layers report failures: validation
/// errors become 400-style responses, everything else a 500-style response
/// with the message embedded. Nothing here is retried.
#[derive(Error, Debug)]
pub enum Error {
    /// Caller-supplied parameter missing or out of range. Raised before any
    /// network call is attempted.
    #[error("{0}")]
    Validation(String),

    /// The upstream signalled that the named location or entity does not
    /// exist.
    #[error("{0}")]
    NotFound(String),

    /// Required credentials or endpoints are absent from the environment.
    #[error("{0}")]
    Config(String),

    /// Upstream returned a non-success status.
    #[error("{service} API error ({status}): {message}")]
    Upstream {
        /// Upstream service short name, e.g. "OpenWeatherMap" or "Turno".
        service: &'static str,
        status: u16,
        message: String,
    },

    /// Request never completed (DNS, TLS, connect, body read, ...).
    #[error("failed to reach {service}: {source}")]
    Transport {
        service: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// Upstream body did not match the expected shape.
    #[error("failed to parse {service} response: {source}")]
    Decode {
        service: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

impl Error {
    pub fn validation(msg: impl Into<String>) -> Self {
        Error::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Error::NotFound(msg.into())
    }

    /// True for errors the caller could have avoided (bad input), i.e. the
    /// 400-equivalent class.
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation(_))
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_messages_pass_through_verbatim() {
        let err = Error::validation("Location parameter is required");
        assert_eq!(err.to_string(), "Location parameter is required");
        assert!(err.is_validation());
    }

    #[test]
    fn upstream_error_embeds_service_and_status() {
        let err = Error::Upstream {
            service: "OpenWeatherMap",
            status: 502,
            message: "bad gateway".into(),
        };
        assert_eq!(
            err.to_string(),
            "OpenWeatherMap API error (502): bad gateway"
        );
        assert!(!err.is_validation());
    }
}
