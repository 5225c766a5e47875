//! HTTP client for the trivia API.
//!
//! Epistemic foundation:
//! - K_i: Two endpoints: `GET /questions`, `POST /checkanswers`
//! - B_i: Server will respond (might fail) → Network/Timeout
//! - B_i: Response will be 2xx (might not) → HttpStatus with body and Retry-After
//! - B_i: Body will be a known layout (might not) → Shape
//! - No retries: a human re-invokes the operation

use crate::client::normalize::{normalize_questions, normalize_results};
use crate::models::{
    ApiConfig, CheckAnswersRequest, HttpStatusError, Question, ResultEntry, Result,
    RetryAfter, TriviaError, normalize_base_url,
};
use chrono::Utc;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue, RETRY_AFTER, USER_AGENT};
use reqwest::{RequestBuilder, Response};
use serde_json::Value;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Client for a trivia API rooted at `base_url`.
pub struct TriviaClient {
    client: reqwest::Client,
    /// Base URL without trailing slash
    base_url: String,
    /// Request timeout (None: wait forever)
    timeout: Option<Duration>,
    user_agent: String,
}

impl TriviaClient {
    /// Create a new trivia client.
    ///
    /// `base_url` may carry a trailing slash; it is stripped.
    pub fn new(base_url: &str, timeout_secs: Option<u64>, user_agent: &str) -> Result<Self> {
        let timeout = timeout_secs.map(Duration::from_secs);

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|e| TriviaError::Network {
            method: "BUILD",
            url: base_url.to_string(),
            source: e,
        })?;

        Self::with_http_client(base_url, timeout, user_agent, client)
    }

    /// Wrap a prebuilt `reqwest::Client`.
    ///
    /// `timeout` should be the one configured on `client`; it only decides
    /// whether a timed-out request is reported as `Timeout`.
    pub fn with_http_client(
        base_url: &str,
        timeout: Option<Duration>,
        user_agent: &str,
        client: reqwest::Client,
    ) -> Result<Self> {
        Ok(Self {
            client,
            base_url: normalize_base_url(base_url)?,
            timeout,
            user_agent: user_agent.to_string(),
        })
    }

    /// Create a client from the `[api]` config section and an already
    /// resolved base URL.
    pub fn from_config(base_url: &str, api: &ApiConfig) -> Result<Self> {
        Self::new(base_url, api.timeout_secs, &api.user_agent)
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `{base}/questions`
    pub fn questions_url(&self) -> String {
        format!("{}/questions", self.base_url)
    }

    /// `{base}/checkanswers`
    pub fn check_answers_url(&self) -> String {
        format!("{}/checkanswers", self.base_url)
    }

    /// Build headers for a request.
    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Ok(value) = HeaderValue::from_str(&self.user_agent) {
            headers.insert(USER_AGENT, value);
        }
        headers
    }

    /// Fetch and normalize the question set.
    pub async fn fetch_questions(&self) -> Result<Vec<Question>> {
        let url = self.questions_url();
        let request = self.client.get(&url).headers(self.headers());
        let body = self.execute("GET", &url, request).await?;

        let questions = normalize_questions(&body)?;
        info!(url = %url, count = questions.len(), "Loaded questions");
        Ok(questions)
    }

    /// Submit answers and normalize the verdicts.
    pub async fn check_answers(&self, payload: &CheckAnswersRequest) -> Result<Vec<ResultEntry>> {
        let url = self.check_answers_url();
        let request = self.client.post(&url).headers(self.headers()).json(payload);
        let body = self.execute("POST", &url, request).await?;

        let results = normalize_results(&body)?;
        info!(url = %url, count = results.len(), "Received answer results");
        Ok(results)
    }

    /// Send once and return the body text of a 2xx response.
    async fn execute(&self, method: &'static str, url: &str, request: RequestBuilder) -> Result<String> {
        let start = Instant::now();
        debug!(method = method, url = %url, "Sending request");

        let response = request.send().await.map_err(|e| self.transport_error(method, url, e))?;

        let status = response.status();
        debug!(
            method = method,
            url = %url,
            status = status.as_u16(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Received response"
        );

        if !status.is_success() {
            let error = status_error(method, url, response).await;
            warn!(
                method = method,
                url = %url,
                status = error.status,
                retry_after = error.retry_after.as_ref().map(|r| r.raw.as_str()),
                "Request rejected"
            );
            return Err(error.into());
        }

        response
            .text()
            .await
            .map_err(|e| self.transport_error(method, url, e))
    }

    fn transport_error(&self, method: &'static str, url: &str, e: reqwest::Error) -> TriviaError {
        match self.timeout {
            Some(after) if e.is_timeout() => TriviaError::Timeout {
                method,
                url: url.to_string(),
                after,
            },
            _ => TriviaError::Network {
                method,
                url: url.to_string(),
                source: e,
            },
        }
    }
}

/// Capture status, reason, Retry-After and the most useful body message.
async fn status_error(method: &'static str, url: &str, response: Response) -> HttpStatusError {
    let status = response.status();
    let retry_after = response
        .headers()
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .map(|raw| RetryAfter::parse(raw, Utc::now()));
    let body = response.text().await.unwrap_or_default();

    HttpStatusError {
        method,
        url: url.to_string(),
        status: status.as_u16(),
        reason: status.canonical_reason().map(str::to_string),
        retry_after,
        message: error_message(&body),
    }
}

/// Pick the message from an error body.
///
/// A JSON object's `message` (then `error`) string wins; other JSON is echoed
/// compactly; non-JSON text is returned as is.
pub fn error_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }

    match serde_json::from_str::<Value>(trimmed) {
        Ok(json) => {
            let field = ["message", "error"].iter().find_map(|key| {
                json.get(*key)
                    .and_then(Value::as_str)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
            });
            Some(field.unwrap_or_else(|| json.to_string()))
        }
        Err(_) => Some(trimmed.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_prefers_message_field() {
        let body = r#"{"status": 429, "error": "Too Many Requests", "message": "Please wait 5 seconds before retrying"}"#;
        assert_eq!(
            error_message(body).as_deref(),
            Some("Please wait 5 seconds before retrying")
        );
    }

    #[test]
    fn test_error_message_falls_back_to_error_field() {
        assert_eq!(
            error_message(r#"{"error": "Bad Request", "message": ""}"#).as_deref(),
            Some("Bad Request")
        );
    }

    #[test]
    fn test_error_message_echoes_other_json() {
        assert_eq!(
            error_message(r#"{"code": 7}"#).as_deref(),
            Some(r#"{"code":7}"#)
        );
    }

    #[test]
    fn test_error_message_plain_text_and_empty() {
        assert_eq!(error_message("  upstream down \n").as_deref(), Some("upstream down"));
        assert_eq!(error_message("   "), None);
    }

    #[test]
    fn test_urls_strip_trailing_slash() {
        let client = TriviaClient::new("http://localhost:8080/api/", None, "test").unwrap();
        assert_eq!(client.base_url(), "http://localhost:8080/api");
        assert_eq!(client.questions_url(), "http://localhost:8080/api/questions");
        assert_eq!(
            client.check_answers_url(),
            "http://localhost:8080/api/checkanswers"
        );
    }

    #[test]
    fn test_invalid_base_url_is_config_error() {
        let err = TriviaClient::new("localhost:8080", None, "test").err().unwrap();
        assert!(matches!(err, TriviaError::Config(_)));
    }

    #[test]
    fn test_prebuilt_client_keeps_base_url_rules() {
        let http = reqwest::Client::builder().no_proxy().build().unwrap();
        let client = TriviaClient::with_http_client(
            "http://127.0.0.1:9/api/",
            Some(Duration::from_secs(2)),
            "test",
            http.clone(),
        )
        .unwrap();
        assert_eq!(client.questions_url(), "http://127.0.0.1:9/api/questions");

        let err = TriviaClient::with_http_client("ftp://host", None, "test", http)
            .err()
            .unwrap();
        assert!(matches!(err, TriviaError::Config(_)));
    }
}
