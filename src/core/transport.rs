//! HTTP Transport
//!
//! Engine interface and implementations used by the dispatcher.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use url::Url;

use crate::error::{ConfigurationError, HttpClientError, NetworkError};

/// HTTP method.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
    /// Any other token, stored uppercased.
    Other(String),
}

impl HttpMethod {
    /// Parse a method token, uppercasing it first.
    ///
    /// Returns `None` for an empty string or one containing characters not
    /// allowed in an HTTP token.
    pub fn parse(method: &str) -> Option<Self> {
        let method = method.trim().to_ascii_uppercase();
        if method.is_empty() || !method.bytes().all(is_token_byte) {
            return None;
        }
        Some(match method.as_str() {
            "GET" => Self::Get,
            "POST" => Self::Post,
            "PUT" => Self::Put,
            "PATCH" => Self::Patch,
            "DELETE" => Self::Delete,
            "HEAD" => Self::Head,
            "OPTIONS" => Self::Options,
            _ => Self::Other(method),
        })
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
            Self::Head => "HEAD",
            Self::Options => "OPTIONS",
            Self::Other(method) => method.as_str(),
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn is_token_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b)
}

/// Fully formed request handed to a transport.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransportRequest {
    /// Absolute URL.
    pub url: String,
    /// HTTP method.
    pub method: HttpMethod,
    /// Header lines, each `"Name: value"`, in wire order.
    pub headers: Vec<String>,
    /// Encoded body.
    pub body: String,
    /// Request timeout; `None` waits indefinitely.
    pub timeout: Option<Duration>,
    /// Maximum number of redirects to follow.
    pub max_redirects: u32,
    /// User agent to identify as.
    pub user_agent: String,
}

impl TransportRequest {
    /// Header lines split into name and value.
    ///
    /// Lines without a colon are skipped.
    pub fn header_pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers.iter().filter_map(|line| {
            line.split_once(':')
                .map(|(name, value)| (name.trim(), value.trim()))
        })
    }

    /// Whether a header line with `name` is present (case-insensitive).
    pub fn has_header(&self, name: &str) -> bool {
        self.header_pairs().any(|(n, _)| n.eq_ignore_ascii_case(name))
    }
}

/// Result of a completed exchange.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TransportResponse {
    /// Status line, e.g. `HTTP/1.1 200 OK`, when one was received.
    pub status_line: Option<String>,
    /// Response body. `None` means the exchange produced no data and the
    /// engine has no further detail to give.
    pub body: Option<String>,
}

impl TransportResponse {
    /// Response carrying a body.
    pub fn with_body(status_line: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            status_line: Some(status_line.into()),
            body: Some(body.into()),
        }
    }

    /// Response with no data.
    pub fn empty(status_line: Option<String>) -> Self {
        Self {
            status_line,
            body: None,
        }
    }
}

/// HTTP transport interface (for dependency injection).
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Perform one exchange.
    async fn execute(&self, request: TransportRequest) -> Result<TransportResponse, NetworkError>;
}

/// Default reqwest-based HTTP transport.
///
/// HTTP/1.1 only. Redirects are followed here instead of by the engine: the
/// limit is read from each request, and every hop carries a `Host` line for
/// the URL it is actually sent to.
pub struct ReqwestHttpTransport {
    client: reqwest::Client,
}

/// Headers dropped when a redirect leaves the original host.
const CROSS_HOST_STRIPPED: &[&str] = &[
    "authorization",
    "cookie",
    "proxy-authorization",
    "www-authenticate",
];

/// Headers dropped when a redirect turns the request into a bodiless GET.
const BODY_HEADERS: &[&str] = &["content-length", "content-type", "transfer-encoding"];

impl ReqwestHttpTransport {
    /// Create new transport.
    pub fn new() -> Result<Self, HttpClientError> {
        let client = reqwest::Client::builder()
            .http1_only()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| ConfigurationError::EngineBuildFailed {
                message: e.to_string(),
            })?;

        Ok(Self { client })
    }

    async fn send_hop(
        &self,
        hop: &Hop,
        request: &TransportRequest,
    ) -> Result<reqwest::Response, NetworkError> {
        let mut builder = self.client.request(hop.method.clone(), hop.url.clone());

        if !request.user_agent.is_empty() && !hop.has_header("user-agent") {
            builder = builder.header(reqwest::header::USER_AGENT, &request.user_agent);
        }

        for (name, value) in &hop.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        if let Some(body) = &hop.body {
            builder = builder.body(body.clone());
        }

        builder
            .send()
            .await
            .map_err(|e| map_error(&e, request, &hop.url))
    }

    async fn exchange(&self, request: &TransportRequest) -> Result<TransportResponse, NetworkError> {
        let mut hop = Hop::first(request)?;
        let mut followed = 0;

        loop {
            let response = self.send_hop(&hop, request).await?;
            let status = response.status();

            let next = match redirect_location(&response, &hop.url)? {
                Some(next) => next,
                None => return read_response(response, request, &hop.url).await,
            };

            if followed >= request.max_redirects {
                return Err(NetworkError::TooManyRedirects {
                    max: request.max_redirects,
                });
            }
            followed += 1;

            tracing::debug!(
                status = status.as_u16(),
                host = next.host_str().unwrap_or_default(),
                path = next.path(),
                redirects = followed,
                "Following redirect"
            );

            hop = hop.redirect(status, next);
        }
    }
}

/// One request on the wire, as rewritten by any redirects followed so far.
struct Hop {
    url: Url,
    method: reqwest::Method,
    headers: Vec<(String, String)>,
    body: Option<String>,
}

impl Hop {
    fn first(request: &TransportRequest) -> Result<Self, NetworkError> {
        let url = Url::parse(&request.url).map_err(|e| NetworkError::InvalidResponse {
            message: format!("invalid URL {}: {}", request.url, e),
        })?;

        let method = reqwest::Method::from_bytes(request.method.as_str().as_bytes()).map_err(|e| {
            NetworkError::InvalidResponse {
                message: format!("invalid method {}: {}", request.method, e),
            }
        })?;

        let headers = request
            .header_pairs()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect();

        let body = if request.body.is_empty() {
            None
        } else {
            Some(request.body.clone())
        };

        Ok(Self {
            url,
            method,
            headers,
            body,
        })
    }

    fn has_header(&self, name: &str) -> bool {
        self.headers.iter().any(|(n, _)| n.eq_ignore_ascii_case(name))
    }

    fn remove_headers(&mut self, names: &[&str]) {
        self.headers
            .retain(|(n, _)| !names.iter().any(|name| n.eq_ignore_ascii_case(name)));
    }

    fn set_header(&mut self, name: &str, value: String) {
        match self.headers.iter_mut().find(|(n, _)| n.eq_ignore_ascii_case(name)) {
            Some(entry) => entry.1 = value,
            None => self.headers.push((name.to_string(), value)),
        }
    }

    /// Rewrite this hop for the redirect target `url`.
    ///
    /// 303 (and 301/302 after a POST) continue as a bodiless GET; 307 and 308
    /// repeat the method and body. Credentials are not carried to another
    /// host or port.
    fn redirect(mut self, status: reqwest::StatusCode, url: Url) -> Self {
        let to_get = match status.as_u16() {
            303 => self.method != reqwest::Method::HEAD,
            301 | 302 => self.method == reqwest::Method::POST,
            _ => false,
        };
        if to_get {
            self.method = reqwest::Method::GET;
            self.body = None;
            self.remove_headers(BODY_HEADERS);
        }

        if url.host_str() != self.url.host_str()
            || url.port_or_known_default() != self.url.port_or_known_default()
        {
            self.remove_headers(CROSS_HOST_STRIPPED);
        }

        if self.has_header("host") {
            self.set_header("Host", authority(&url));
        }
        self.url = url;
        self
    }
}

/// `host[:port]`, with the port only when the URL names a non-default one.
fn authority(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default();
    match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    }
}

/// Target of a redirect response, resolved against the URL it came from.
///
/// `None` when the response is not a followable redirect.
fn redirect_location(response: &reqwest::Response, base: &Url) -> Result<Option<Url>, NetworkError> {
    if !matches!(response.status().as_u16(), 301 | 302 | 303 | 307 | 308) {
        return Ok(None);
    }
    let location = match response.headers().get(reqwest::header::LOCATION) {
        Some(location) => location,
        None => return Ok(None),
    };

    let location = location.to_str().map_err(|e| NetworkError::InvalidResponse {
        message: format!("invalid redirect location: {}", e),
    })?;
    let next = base.join(location).map_err(|e| NetworkError::InvalidResponse {
        message: format!("invalid redirect location {}: {}", location, e),
    })?;

    match next.scheme() {
        "http" | "https" => Ok(Some(next)),
        scheme => Err(NetworkError::InvalidResponse {
            message: format!("redirect to unsupported scheme {}", scheme),
        }),
    }
}

/// Status line and body of the final response.
///
/// The body must be UTF-8; it is never decoded lossily.
async fn read_response(
    response: reqwest::Response,
    request: &TransportRequest,
    url: &Url,
) -> Result<TransportResponse, NetworkError> {
    let status = response.status();
    let status_line = format!(
        "{:?} {} {}",
        response.version(),
        status.as_u16(),
        status.canonical_reason().unwrap_or("")
    )
    .trim_end()
    .to_string();

    let bytes = response
        .bytes()
        .await
        .map_err(|e| map_error(&e, request, url))?;

    let body = String::from_utf8(bytes.to_vec()).map_err(|e| NetworkError::InvalidResponse {
        message: format!("response body is not valid UTF-8: {}", e),
    })?;

    Ok(TransportResponse {
        status_line: Some(status_line),
        body: Some(body),
    })
}

fn map_error(error: &reqwest::Error, request: &TransportRequest, url: &Url) -> NetworkError {
    if error.is_timeout() {
        NetworkError::Timeout {
            timeout: request.timeout.unwrap_or_default(),
        }
    } else if error.is_connect() {
        classify_connect_error(error, url.host_str().unwrap_or_default())
    } else if error.is_builder() {
        NetworkError::InvalidResponse {
            message: error_chain(error),
        }
    } else {
        NetworkError::ConnectionFailed {
            message: error_chain(error),
        }
    }
}

/// Sort a connect failure by the first recognisable error in its chain.
///
/// The connector reports lookup failures as `dns error`; TLS handshake and
/// certificate failures surface as `InvalidData` I/O errors.
fn classify_connect_error(error: &(dyn std::error::Error + 'static), host: &str) -> NetworkError {
    let mut current = Some(error);
    while let Some(cause) = current {
        if let Some(io) = cause.downcast_ref::<std::io::Error>() {
            if io.kind() == std::io::ErrorKind::InvalidData {
                return NetworkError::TlsError {
                    message: error_chain(error),
                };
            }
        }
        if cause.to_string().starts_with("dns error") {
            return NetworkError::DnsResolutionFailed {
                host: host.to_string(),
            };
        }
        current = cause.source();
    }

    NetworkError::ConnectionFailed {
        message: error_chain(error),
    }
}

/// Flatten an error and its sources into one message.
fn error_chain(error: &dyn std::error::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

#[async_trait]
impl HttpTransport for ReqwestHttpTransport {
    async fn execute(&self, request: TransportRequest) -> Result<TransportResponse, NetworkError> {
        match request.timeout {
            Some(timeout) => tokio::time::timeout(timeout, self.exchange(&request))
                .await
                .map_err(|_| NetworkError::Timeout { timeout })?,
            None => self.exchange(&request).await,
        }
    }
}

/// Mock HTTP transport for testing.
#[derive(Default)]
pub struct MockHttpTransport {
    outcomes: Mutex<VecDeque<Result<TransportResponse, NetworkError>>>,
    request_history: Mutex<Vec<TransportRequest>>,
    default_outcome: Mutex<Option<Result<TransportResponse, NetworkError>>>,
}

impl MockHttpTransport {
    /// Create new mock transport.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an outcome. Outcomes are returned in the order queued.
    pub fn queue_outcome(&self, outcome: Result<TransportResponse, NetworkError>) -> &Self {
        lock(&self.outcomes).push_back(outcome);
        self
    }

    /// Queue a `200 OK` response with `body`.
    pub fn queue_body(&self, body: impl Into<String>) -> &Self {
        self.queue_outcome(Ok(TransportResponse::with_body("HTTP/1.1 200 OK", body)))
    }

    /// Queue a network failure.
    pub fn queue_error(&self, error: NetworkError) -> &Self {
        self.queue_outcome(Err(error))
    }

    /// Set default outcome when the queue is empty.
    pub fn set_default_outcome(&self, outcome: Result<TransportResponse, NetworkError>) -> &Self {
        *lock(&self.default_outcome) = Some(outcome);
        self
    }

    /// Get request history.
    pub fn get_requests(&self) -> Vec<TransportRequest> {
        lock(&self.request_history).clone()
    }

    /// Get last request.
    pub fn get_last_request(&self) -> Option<TransportRequest> {
        lock(&self.request_history).last().cloned()
    }

    /// Number of exchanges attempted.
    pub fn request_count(&self) -> usize {
        lock(&self.request_history).len()
    }

    /// Clear request history.
    pub fn clear_history(&self) {
        lock(&self.request_history).clear();
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl HttpTransport for MockHttpTransport {
    async fn execute(&self, request: TransportRequest) -> Result<TransportResponse, NetworkError> {
        lock(&self.request_history).push(request);

        let outcome = lock(&self.outcomes)
            .pop_front()
            .or_else(|| lock(&self.default_outcome).clone());

        outcome.unwrap_or_else(|| {
            Err(NetworkError::ConnectionFailed {
                message: "No mock response available".to_string(),
            })
        })
    }
}

/// Create production HTTP transport.
pub fn create_transport() -> Result<ReqwestHttpTransport, HttpClientError> {
    ReqwestHttpTransport::new()
}

/// Create mock HTTP transport for testing.
pub fn create_mock_transport() -> MockHttpTransport {
    MockHttpTransport::new()
}
