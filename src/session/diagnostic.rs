//! Failure reporting.
//!
//! Every failed operation produces a short status line for the user and a
//! longer, timestamped record for the debug log. Rate-limit responses are
//! flagged so frontends can emphasize them; they are not retried.

use crate::models::{CheckAnswersRequest, RetryAfter, TriviaError};
use chrono::{DateTime, Local};
use std::collections::VecDeque;
use std::error::Error as _;
use std::fmt;

/// Operation that produced a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    LoadQuestions,
    SubmitAnswers,
}

impl Operation {
    fn failure_prefix(&self) -> &'static str {
        match self {
            Operation::LoadQuestions => "Failed to load questions",
            Operation::SubmitAnswers => "Failed to check answers",
        }
    }
}

/// One reported failure.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub at: DateTime<Local>,
    pub operation: Operation,
    /// One line, suitable for a status bar
    pub status: String,
    /// Multi-line record: request, status, headers, body or cause
    pub detail: String,
    /// Server asked us to slow down
    pub rate_limited: bool,
    pub retry_after: Option<RetryAfter>,
}

impl Diagnostic {
    /// Describe a failed question load.
    pub fn load_failure(err: &TriviaError) -> Self {
        Self::build(Operation::LoadQuestions, err, None)
    }

    /// Describe a failed submission; transport failures echo the payload.
    pub fn submit_failure(err: &TriviaError, payload: &CheckAnswersRequest) -> Self {
        Self::build(Operation::SubmitAnswers, err, Some(payload))
    }

    fn build(operation: Operation, err: &TriviaError, payload: Option<&CheckAnswersRequest>) -> Self {
        let status = match err {
            // The status line already says what happened
            TriviaError::HttpStatus(e) => e.to_string(),
            other => format!("{}: {}", operation.failure_prefix(), error_chain(other)),
        };

        let detail = match err {
            TriviaError::HttpStatus(e) => {
                let headers = e
                    .retry_after
                    .as_ref()
                    .map(|r| r.to_string())
                    .unwrap_or_default();
                format!(
                    "{} {} returned {}\nHeaders: {}\nBody: {}",
                    e.method,
                    e.url,
                    e.status,
                    headers,
                    e.message.as_deref().unwrap_or("")
                )
            }
            TriviaError::Network { method, url, .. } | TriviaError::Timeout { method, url, .. } => {
                let mut detail = format!("Failed {method} {url}");
                if let Some(payload) = payload {
                    let body = serde_json::to_string_pretty(payload).unwrap_or_default();
                    detail.push_str(&format!("\nPayload: {body}"));
                }
                detail.push_str(&format!("\nError: {}", error_chain(err)));
                detail.push_str(
                    "\nCheck that the API server is running and reachable from this machine.",
                );
                detail
            }
            TriviaError::Shape { endpoint, reason } => {
                let mut detail =
                    format!("{endpoint} returned a body in no supported layout\nReason: {reason}");
                if let Some(payload) = payload {
                    let body = serde_json::to_string_pretty(payload).unwrap_or_default();
                    detail.push_str(&format!("\nPayload: {body}"));
                }
                detail
            }
            other => error_chain(other),
        };

        Self {
            at: Local::now(),
            operation,
            status,
            detail,
            rate_limited: err.is_rate_limited(),
            retry_after: err.retry_after().cloned(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} | {}", self.at.format("%H:%M:%S"), self.detail)
    }
}

/// `outer: cause: root cause`
fn error_chain(err: &TriviaError) -> String {
    let mut text = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        text.push_str(&format!(": {cause}"));
        source = cause.source();
    }
    text
}

/// Bounded diagnostic history, newest first.
#[derive(Debug, Clone)]
pub struct DiagnosticLog {
    entries: VecDeque<Diagnostic>,
    capacity: usize,
}

impl DiagnosticLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Add a record, dropping the oldest beyond capacity.
    pub fn push(&mut self, diagnostic: Diagnostic) {
        if self.capacity == 0 {
            return;
        }
        self.entries.push_front(diagnostic);
        self.entries.truncate(self.capacity);
    }

    pub fn latest(&self) -> Option<&Diagnostic> {
        self.entries.front()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Full log text, newest first, blank line between records.
    pub fn render(&self) -> String {
        self.entries
            .iter()
            .map(|d| d.to_string())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AnswerRequest, HttpStatusError};
    use std::time::Duration;

    fn rate_limited() -> TriviaError {
        HttpStatusError {
            method: "GET",
            url: "http://localhost:8080/api/questions".to_string(),
            status: 429,
            reason: Some("Too Many Requests".to_string()),
            retry_after: Some(RetryAfter {
                raw: "5".to_string(),
                delay: Some(Duration::from_secs(5)),
            }),
            message: Some("Please wait 5 seconds before retrying".to_string()),
        }
        .into()
    }

    #[test]
    fn test_http_status_diagnostic() {
        let diag = Diagnostic::load_failure(&rate_limited());
        assert_eq!(
            diag.status,
            "HTTP 429 - Too Many Requests: Please wait 5 seconds before retrying"
        );
        assert!(diag.rate_limited);
        assert_eq!(diag.retry_after.unwrap().delay, Some(Duration::from_secs(5)));
        assert_eq!(
            diag.detail,
            "GET http://localhost:8080/api/questions returned 429\nHeaders: Retry-After: 5\nBody: Please wait 5 seconds before retrying"
        );
    }

    #[test]
    fn test_shape_diagnostic() {
        let err = TriviaError::shape("/checkanswers", "item 0: missing `questionId`/`id`");
        let payload = CheckAnswersRequest {
            answer_requests: vec![AnswerRequest {
                question_id: 7.into(),
                answer: Some("Paris".to_string()),
            }],
        };
        let diag = Diagnostic::submit_failure(&err, &payload);
        assert!(diag.status.starts_with("Failed to check answers: "));
        assert!(diag.detail.contains("Reason: item 0"));
        assert!(diag.detail.contains("Payload: {"));
        assert!(diag.detail.contains("\"answer\": \"Paris\""));
        assert!(!diag.rate_limited);

        let diag = Diagnostic::load_failure(&TriviaError::shape("/questions", "body is not valid JSON"));
        assert!(!diag.detail.contains("Payload"));
    }

    #[test]
    fn test_timeout_diagnostic_includes_payload() {
        let err = TriviaError::Timeout {
            method: "POST",
            url: "http://localhost:8080/api/checkanswers".to_string(),
            after: Duration::from_secs(3),
        };
        let payload = CheckAnswersRequest {
            answer_requests: vec![AnswerRequest {
                question_id: 1.into(),
                answer: None,
            }],
        };
        let diag = Diagnostic::submit_failure(&err, &payload);
        assert!(diag.detail.starts_with("Failed POST http://localhost:8080/api/checkanswers"));
        assert!(diag.detail.contains("\"questionId\": 1"));
        assert!(diag.detail.contains("\"answer\": null"));
    }

    #[test]
    fn test_log_is_bounded_and_newest_first() {
        let mut log = DiagnosticLog::new(2);
        for status in [404, 500, 503] {
            let err: TriviaError = HttpStatusError {
                method: "GET",
                url: "u".to_string(),
                status,
                reason: None,
                retry_after: None,
                message: None,
            }
            .into();
            log.push(Diagnostic::load_failure(&err));
        }

        assert_eq!(log.len(), 2);
        assert_eq!(log.latest().unwrap().status, "HTTP 503");
        let statuses: Vec<&str> = log.iter().map(|d| d.status.as_str()).collect();
        assert_eq!(statuses, vec!["HTTP 503", "HTTP 500"]);
        assert!(log.render().contains("returned 500"));
    }

    #[test]
    fn test_zero_capacity_log_stays_empty() {
        let mut log = DiagnosticLog::new(0);
        log.push(Diagnostic::load_failure(&rate_limited()));
        assert!(log.is_empty());
    }
}
