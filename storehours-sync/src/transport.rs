//! Blocking HTTP transport seam.
//!
//! [`Transport`] sends one [`HttpRequest`] and returns whatever the server
//! answered, including non-2xx statuses; classifying statuses is the
//! gateway's job. [`UreqTransport`] is the production implementation and
//! retries transient failures with exponential backoff.
//! [`memory::MemoryTransport`] replays scripted replies for tests.

pub mod memory;

use std::thread::sleep;
use std::time::Duration;

use serde_json::Value;

use crate::error::{transport_err, SyncError};

// ---------------------------------------------------------------------------
// Request / response
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Patch,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Patch => "PATCH",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl HttpRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn headers(mut self, headers: &[(String, String)]) -> Self {
        self.headers.extend_from_slice(headers);
        self
    }

    pub fn query(mut self, query: &[(String, String)]) -> Self {
        self.query.extend_from_slice(query);
        self
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Case-insensitive header lookup.
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    /// Raw `Link` header, if present.
    pub link: Option<String>,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            link: None,
            body: body.into(),
        }
    }

    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends a single request. Non-2xx answers are `Ok`; only connection-level
/// failures are `Err`.
pub trait Transport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, SyncError>;
}

// ---------------------------------------------------------------------------
// ureq implementation
// ---------------------------------------------------------------------------

/// Blocking transport over a shared [`ureq::Agent`].
pub struct UreqTransport {
    agent: ureq::Agent,
    max_attempts: usize,
    base_backoff: Duration,
}

impl UreqTransport {
    pub fn builder() -> UreqTransportBuilder {
        UreqTransportBuilder::default()
    }

    fn send_once(&self, request: &HttpRequest) -> Result<HttpResponse, Failure> {
        let mut call = self.agent.request(request.method.as_str(), &request.url);
        for (name, value) in &request.headers {
            call = call.set(name, value);
        }
        for (name, value) in &request.query {
            call = call.query(name, value);
        }

        let result = match &request.body {
            Some(body) => call.send_json(body),
            None => call.call(),
        };

        match result {
            Ok(response) | Err(ureq::Error::Status(_, response)) => {
                into_response(&request.url, response).map_err(Failure::fatal)
            }
            Err(ureq::Error::Transport(err)) => {
                let retryable = matches!(
                    err.kind(),
                    ureq::ErrorKind::ConnectionFailed | ureq::ErrorKind::Io | ureq::ErrorKind::Dns
                );
                Err(Failure {
                    error: transport_err(&request.url, err),
                    retryable,
                })
            }
        }
    }

    fn backoff_delay(&self, retry_number: usize) -> Duration {
        let shift = retry_number.saturating_sub(1).min(8) as u32;
        self.base_backoff.saturating_mul(1u32 << shift)
    }

    fn sleep_with_backoff(&self, retry_number: usize) {
        let delay = self.backoff_delay(retry_number);
        if !delay.is_zero() {
            sleep(delay);
        }
    }
}

impl Transport for UreqTransport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, SyncError> {
        let attempts = self.max_attempts.max(1);
        let method = request.method.as_str();

        for attempt in 0..attempts {
            tracing::debug!("{method} {} (attempt {})", request.url, attempt + 1);
            match self.send_once(request) {
                Ok(response) => {
                    if response.status >= 500 && attempt + 1 < attempts {
                        tracing::warn!(
                            "{method} {} returned {}, retrying",
                            request.url,
                            response.status
                        );
                        self.sleep_with_backoff(attempt + 1);
                        continue;
                    }
                    return Ok(response);
                }
                Err(failure) => {
                    if failure.retryable && attempt + 1 < attempts {
                        tracing::warn!("{method} {} failed: {}, retrying", request.url, failure.error);
                        self.sleep_with_backoff(attempt + 1);
                        continue;
                    }
                    return Err(failure.error);
                }
            }
        }

        Err(transport_err(&request.url, "exhausted retries without a response"))
    }
}

struct Failure {
    error: SyncError,
    retryable: bool,
}

impl Failure {
    fn fatal(error: SyncError) -> Self {
        Self {
            error,
            retryable: false,
        }
    }
}

fn into_response(url: &str, response: ureq::Response) -> Result<HttpResponse, SyncError> {
    let status = response.status();
    let link = response.header("link").map(str::to_string);
    let body = response
        .into_string()
        .map_err(|err| transport_err(url, err))?;
    Ok(HttpResponse { status, link, body })
}

/// Builder for [`UreqTransport`].
#[derive(Debug, Clone)]
pub struct UreqTransportBuilder {
    timeout: Duration,
    max_attempts: usize,
    base_backoff: Duration,
    user_agent: String,
}

impl Default for UreqTransportBuilder {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_attempts: 3,
            base_backoff: Duration::from_millis(200),
            user_agent: format!("storehours/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl UreqTransportBuilder {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Total number of attempts (initial try + retries).
    pub fn max_attempts(mut self, attempts: usize) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    pub fn base_backoff(mut self, backoff: Duration) -> Self {
        self.base_backoff = backoff;
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = agent.into();
        self
    }

    pub fn build(self) -> UreqTransport {
        let agent = ureq::AgentBuilder::new()
            .timeout(self.timeout)
            .user_agent(&self.user_agent)
            .build();
        UreqTransport {
            agent,
            max_attempts: self.max_attempts.max(1),
            base_backoff: self.base_backoff,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_per_retry() {
        let transport = UreqTransport::builder()
            .base_backoff(Duration::from_millis(100))
            .build();
        assert_eq!(transport.backoff_delay(1), Duration::from_millis(100));
        assert_eq!(transport.backoff_delay(2), Duration::from_millis(200));
        assert_eq!(transport.backoff_delay(3), Duration::from_millis(400));
    }

    #[test]
    fn max_attempts_is_at_least_one() {
        let transport = UreqTransport::builder().max_attempts(0).build();
        assert_eq!(transport.max_attempts, 1);
    }

    #[test]
    fn unreachable_host_is_transport_error() {
        let transport = UreqTransport::builder()
            .max_attempts(1)
            .timeout(Duration::from_secs(2))
            .build();
        let request = HttpRequest::new(Method::Get, "http://127.0.0.1:9/organizations");
        let err = transport.send(&request).unwrap_err();
        assert!(matches!(err, SyncError::Transport { .. }), "got: {err}");
    }

    #[test]
    fn request_builder_collects_parts() {
        let request = HttpRequest::new(Method::Patch, "https://api.example/organization/1")
            .header("Authorization", "Bearer t")
            .json(serde_json::json!({"a": 1}));
        assert_eq!(request.header_value("authorization"), Some("Bearer t"));
        assert!(request.body.is_some());
        assert!(HttpResponse::new(201, "{}").is_success());
        assert!(!HttpResponse::new(302, "").is_success());
    }
}
