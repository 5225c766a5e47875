//! Error types for trivia-quiz.
//!
//! Epistemic taxonomy:
//! - B_i falsified: The server answered, but not the way we expected (status, shape)
//! - I^B materialized: Infrastructure failures (network, timeout)
//! - K_i violated: Operation called in the wrong session phase (caller bug)

use crate::models::ConfigError;
use chrono::{DateTime, Utc};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Top-level error type for trivia-quiz.
#[derive(Debug, Error)]
pub enum TriviaError {
    // ═══════════════════════════════════════════════════════════════════
    // B_i FALSIFIED - Server responded, belief about the response was wrong
    // ═══════════════════════════════════════════════════════════════════
    #[error(transparent)]
    HttpStatus(#[from] HttpStatusError),

    #[error("Unexpected response shape from {endpoint}: {reason}")]
    Shape { endpoint: String, reason: String },

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    // ═══════════════════════════════════════════════════════════════════
    // I^B MATERIALIZED - No response at all
    // ═══════════════════════════════════════════════════════════════════
    #[error("{method} {url} failed")]
    Network {
        method: &'static str,
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{method} {url} timed out after {after:?}")]
    Timeout {
        method: &'static str,
        url: String,
        after: Duration,
    },

    // ═══════════════════════════════════════════════════════════════════
    // K_i VIOLATED - Session driven out of order
    // ═══════════════════════════════════════════════════════════════════
    #[error("Cannot {operation} while session is {phase}")]
    InvalidState {
        operation: &'static str,
        phase: &'static str,
    },
}

/// A non-2xx response, captured with everything needed to explain it.
#[derive(Debug, Clone)]
pub struct HttpStatusError {
    pub method: &'static str,
    pub url: String,
    pub status: u16,
    /// Canonical reason phrase, e.g. "Too Many Requests"
    pub reason: Option<String>,
    pub retry_after: Option<RetryAfter>,
    /// `message`/`error` from a JSON body, the JSON itself, or plain text
    pub message: Option<String>,
}

impl HttpStatusError {
    /// `HTTP 429 - Too Many Requests`
    pub fn status_line(&self) -> String {
        match &self.reason {
            Some(reason) => format!("HTTP {} - {}", self.status, reason),
            None => format!("HTTP {}", self.status),
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        self.status == 429
    }
}

impl fmt::Display for HttpStatusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(message) => write!(f, "{}: {}", self.status_line(), message),
            None => write!(f, "{}", self.status_line()),
        }
    }
}

impl std::error::Error for HttpStatusError {}

/// Parsed `Retry-After` header.
///
/// The header is either delta-seconds or an HTTP-date. The raw text is kept
/// so diagnostics can echo exactly what the server sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryAfter {
    pub raw: String,
    pub delay: Option<Duration>,
}

impl RetryAfter {
    /// Parse a header value, resolving HTTP-dates against `now`.
    pub fn parse(raw: &str, now: DateTime<Utc>) -> Self {
        let trimmed = raw.trim();
        let delay = if let Ok(secs) = trimmed.parse::<u64>() {
            Some(Duration::from_secs(secs))
        } else {
            DateTime::parse_from_rfc2822(trimmed)
                .ok()
                .map(|at| (at.with_timezone(&Utc) - now).to_std().unwrap_or(Duration::ZERO))
        };

        Self {
            raw: trimmed.to_string(),
            delay,
        }
    }
}

impl fmt::Display for RetryAfter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Retry-After: {}", self.raw)
    }
}

impl TriviaError {
    pub fn shape(endpoint: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Shape {
            endpoint: endpoint.into(),
            reason: reason.into(),
        }
    }

    /// Check if the server told us to slow down. Used only for emphasis.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::HttpStatus(e) if e.is_rate_limited())
    }

    /// Get the server's retry hint, if it sent one.
    pub fn retry_after(&self) -> Option<&RetryAfter> {
        match self {
            Self::HttpStatus(e) => e.retry_after.as_ref(),
            _ => None,
        }
    }
}

/// Result type alias for trivia-quiz.
pub type Result<T> = std::result::Result<T, TriviaError>;

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn status_error(status: u16, message: Option<&str>) -> HttpStatusError {
        HttpStatusError {
            method: "GET",
            url: "http://localhost:8080/api/questions".to_string(),
            status,
            reason: Some("Too Many Requests".to_string()),
            retry_after: None,
            message: message.map(str::to_string),
        }
    }

    #[test]
    fn test_retry_after_seconds() {
        let hint = RetryAfter::parse(" 5 ", Utc::now());
        assert_eq!(hint.raw, "5");
        assert_eq!(hint.delay, Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_retry_after_http_date() {
        let now = Utc.with_ymd_and_hms(2015, 10, 21, 7, 27, 50).unwrap();
        let hint = RetryAfter::parse("Wed, 21 Oct 2015 07:28:00 GMT", now);
        assert_eq!(hint.delay, Some(Duration::from_secs(10)));
    }

    #[test]
    fn test_retry_after_in_the_past_is_zero() {
        let now = Utc.with_ymd_and_hms(2016, 1, 1, 0, 0, 0).unwrap();
        let hint = RetryAfter::parse("Wed, 21 Oct 2015 07:28:00 GMT", now);
        assert_eq!(hint.delay, Some(Duration::ZERO));
    }

    #[test]
    fn test_retry_after_garbage_keeps_raw() {
        let hint = RetryAfter::parse("soon", Utc::now());
        assert_eq!(hint.raw, "soon");
        assert_eq!(hint.delay, None);
        assert_eq!(hint.to_string(), "Retry-After: soon");
    }

    #[test]
    fn test_http_status_display() {
        let err = status_error(429, Some("Please wait 5 seconds before retrying"));
        assert_eq!(
            err.to_string(),
            "HTTP 429 - Too Many Requests: Please wait 5 seconds before retrying"
        );
        assert!(err.is_rate_limited());

        let err = status_error(500, None);
        assert_eq!(err.to_string(), "HTTP 500 - Too Many Requests");
        assert!(!TriviaError::from(err).is_rate_limited());
    }
}
