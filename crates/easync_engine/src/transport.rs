//! HTTP transport abstraction.
//!
//! The engine never names a concrete HTTP library: everything goes
//! through [`HttpClient`], so tests script exchanges with
//! [`MockHttpClient`] and production code plugs in the reqwest-backed
//! `ReqwestClient` (or any other implementation).

use async_trait::async_trait;
use std::collections::VecDeque;
use std::time::Duration;

/// HTTP method the engine uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    /// Command execution.
    Post,
    /// Protocol discovery.
    Options,
}

/// An outgoing HTTP request.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// Request method.
    pub method: HttpMethod,
    /// Absolute URL.
    pub url: String,
    /// Request headers.
    pub headers: Vec<(String, String)>,
    /// Request body.
    pub body: Vec<u8>,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl HttpRequest {
    /// Look up a request header, case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// An HTTP response.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response headers.
    pub headers: Vec<(String, String)>,
    /// Response body.
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// A minimal success response with the given body.
    pub fn ok(body: Vec<u8>) -> Self {
        Self {
            status: 200,
            headers: Vec::new(),
            body,
        }
    }

    /// A response with the given status and no body.
    pub fn status(status: u16) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    /// Add a header, builder style.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Look up a response header, case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// True for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// HTTP client abstraction.
///
/// Implementations perform one request and return the response, or an
/// error string for connectivity-level failures (the engine maps those
/// to retryable transport errors).
#[async_trait]
pub trait HttpClient: Send + Sync + 'static {
    /// Executes a request.
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, String>;
}

/// A mock client for tests: scripted responses, recorded requests.
#[derive(Default)]
pub struct MockHttpClient {
    responses: parking_lot::Mutex<VecDeque<Result<HttpResponse, String>>>,
    requests: parking_lot::Mutex<Vec<HttpRequest>>,
}

impl MockHttpClient {
    /// Creates a mock with no scripted responses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a response.
    pub fn push_response(&self, response: HttpResponse) {
        self.responses.lock().push_back(Ok(response));
    }

    /// Queues a connectivity failure.
    pub fn push_error(&self, message: impl Into<String>) {
        self.responses.lock().push_back(Err(message.into()));
    }

    /// The requests executed so far.
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().clone()
    }

    /// Number of requests executed so far.
    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }
}

#[async_trait]
impl HttpClient for MockHttpClient {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, String> {
        self.requests.lock().push(request);
        self.responses
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err("no scripted response".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Post,
            url: "https://mail.example.com/Microsoft-Server-ActiveSync".to_string(),
            headers: vec![("Content-Type".to_string(), "application/vnd.ms-sync.wbxml".to_string())],
            body: Vec::new(),
            timeout: Duration::from_secs(30),
        }
    }

    #[tokio::test]
    async fn mock_replays_in_order() {
        let mock = MockHttpClient::new();
        mock.push_response(HttpResponse::status(449));
        mock.push_response(HttpResponse::ok(vec![1, 2, 3]));

        assert_eq!(mock.execute(request()).await.unwrap().status, 449);
        assert_eq!(mock.execute(request()).await.unwrap().body, vec![1, 2, 3]);
        assert_eq!(mock.request_count(), 2);
    }

    #[tokio::test]
    async fn mock_without_script_fails() {
        let mock = MockHttpClient::new();
        assert!(mock.execute(request()).await.is_err());
    }

    #[test]
    fn header_lookup_is_case_insensitive() {
        let response = HttpResponse::status(200)
            .with_header("MS-ASProtocolVersions", "12.1,14.0");
        assert_eq!(
            response.header("ms-asprotocolversions"),
            Some("12.1,14.0")
        );
        assert_eq!(response.header("missing"), None);

        assert_eq!(
            request().header("content-type"),
            Some("application/vnd.ms-sync.wbxml")
        );
    }

    #[test]
    fn success_statuses() {
        assert!(HttpResponse::status(200).is_success());
        assert!(HttpResponse::status(204).is_success());
        assert!(!HttpResponse::status(449).is_success());
    }
}
