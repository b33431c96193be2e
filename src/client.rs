//! OAuth HTTP Client
//!
//! Request dispatcher used by OAuth flows to talk to providers: normalizes
//! headers, encodes the body, frames the request and hands it to the
//! configured transport.

use std::collections::HashMap;
use std::sync::Arc;

use crate::core::{
    Endpoint, HeaderNormalizer, HeaderSet, HttpMethod, HttpTransport, ReqwestHttpTransport,
    RequestBody, TransportRequest, TransportResponse, FORM_CONTENT_TYPE,
};
use crate::error::{HttpClientError, NetworkError, TransportError};
use crate::types::ClientConfig;

/// Request as framed by the dispatcher, before it reaches the transport.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpRequest {
    /// HTTP method.
    pub method: HttpMethod,
    /// Absolute URL.
    pub url: String,
    /// Normalized headers, framing headers included.
    pub headers: HeaderSet,
    /// Encoded body.
    pub body: String,
}

/// OAuth HTTP client.
///
/// Holds only read-only configuration and a shared transport, so one client
/// can serve concurrent calls.
pub struct OAuthHttpClient<T: HttpTransport = ReqwestHttpTransport> {
    config: ClientConfig,
    transport: Arc<T>,
}

impl OAuthHttpClient<ReqwestHttpTransport> {
    /// Create a client backed by the reqwest transport.
    pub fn new(config: ClientConfig) -> Result<Self, HttpClientError> {
        let transport = ReqwestHttpTransport::new()?;
        Self::with_transport(config, transport)
    }
}

impl<T: HttpTransport> OAuthHttpClient<T> {
    /// Create a client with a custom transport.
    pub fn with_transport(config: ClientConfig, transport: T) -> Result<Self, HttpClientError> {
        Self::with_shared_transport(config, Arc::new(transport))
    }

    /// Create a client sharing an existing transport.
    pub fn with_shared_transport(
        config: ClientConfig,
        transport: Arc<T>,
    ) -> Result<Self, HttpClientError> {
        config.validate()?;
        Ok(Self { config, transport })
    }

    /// Get the client configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Get the transport.
    pub fn transport(&self) -> &Arc<T> {
        &self.transport
    }

    /// Frame a request without sending it.
    ///
    /// Fails with [`HttpClientError::InvalidRequest`] for an unusable method
    /// or a `GET` carrying a body.
    pub fn build_request<E>(
        &self,
        endpoint: &E,
        body: &RequestBody,
        extra_headers: &HashMap<String, String>,
        method: &str,
    ) -> Result<HttpRequest, HttpClientError>
    where
        E: Endpoint + ?Sized,
    {
        let method = HttpMethod::parse(method).ok_or_else(|| {
            HttpClientError::invalid_request(format!("Invalid HTTP method: {:?}", method))
        })?;

        let mut headers = HeaderNormalizer::normalize_map(extra_headers);

        if method == HttpMethod::Get && !body.is_empty() {
            return Err(HttpClientError::invalid_request(
                "No body expected for \"GET\" request.",
            ));
        }

        if method == HttpMethod::Post && body.is_form() && !headers.contains("Content-Type") {
            headers.insert_line(
                "Content-Type",
                format!("Content-Type: {}", FORM_CONTENT_TYPE),
            );
        }

        let mut host = format!("Host: {}", endpoint.host());
        if endpoint.has_explicit_port() {
            host.push_str(&format!(":{}", endpoint.port()));
        }
        headers.insert_line("Host", host);
        headers.insert_line("Connection", "Connection: close");

        let body = body.encode()?;
        headers.insert_line("Content-length", format!("Content-length: {}", body.len()));

        Ok(HttpRequest {
            method,
            url: endpoint.absolute_uri().to_string(),
            headers,
            body,
        })
    }

    /// Send a request and return the raw response body.
    ///
    /// The body is returned as received; status codes are not interpreted.
    pub async fn send<E, B>(
        &self,
        endpoint: &E,
        body: B,
        extra_headers: &HashMap<String, String>,
        method: &str,
    ) -> Result<String, HttpClientError>
    where
        E: Endpoint + ?Sized,
        B: Into<RequestBody>,
    {
        let request = self.build_request(endpoint, &body.into(), extra_headers, method)?;
        self.dispatch(request).await
    }

    /// Send a form-encoded `POST`, the shape of most token requests.
    pub async fn post_form<E, I, K, V>(
        &self,
        endpoint: &E,
        params: I,
        extra_headers: &HashMap<String, String>,
    ) -> Result<String, HttpClientError>
    where
        E: Endpoint + ?Sized,
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.send(endpoint, RequestBody::form(params), extra_headers, "POST")
            .await
    }

    /// Send a bodiless `GET`, the shape of most resource requests.
    pub async fn get<E>(
        &self,
        endpoint: &E,
        extra_headers: &HashMap<String, String>,
    ) -> Result<String, HttpClientError>
    where
        E: Endpoint + ?Sized,
    {
        self.send(endpoint, RequestBody::empty(), extra_headers, "GET")
            .await
    }

    /// Hand a framed request to the transport.
    pub async fn dispatch(&self, request: HttpRequest) -> Result<String, HttpClientError> {
        let url = request.url.split('?').next().unwrap_or_default().to_string();
        let method = request.method.clone();
        let header_names: Vec<&str> = request.headers.names().collect();

        tracing::debug!(
            method = %method,
            url = %url,
            headers = ?header_names,
            body_len = request.body.len(),
            "Dispatching request"
        );

        let transport_request = TransportRequest {
            url: request.url,
            method: request.method,
            headers: request.headers.to_lines(),
            body: request.body,
            timeout: self.config.timeout,
            max_redirects: self.config.max_redirects,
            user_agent: self.config.user_agent.clone(),
        };

        let outcome = self.transport.execute(transport_request).await;
        let result = into_body(outcome);

        match &result {
            Ok(body) => {
                tracing::debug!(method = %method, url = %url, body_len = body.len(), "Received response");
            }
            Err(error) => {
                tracing::warn!(method = %method, url = %url, error = %error, "Request failed");
            }
        }

        result
    }
}

impl<T: HttpTransport> Clone for OAuthHttpClient<T> {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            transport: Arc::clone(&self.transport),
        }
    }
}

/// Map a transport outcome onto the body or a [`TransportError`].
fn into_body(
    outcome: Result<TransportResponse, NetworkError>,
) -> Result<String, HttpClientError> {
    match outcome {
        Ok(TransportResponse {
            body: Some(body), ..
        }) => Ok(body),
        Ok(TransportResponse {
            body: None,
            status_line,
        }) => Err(TransportError::no_detail(status_line.as_deref()).into()),
        Err(error) => Err(TransportError::from_network(error).into()),
    }
}

/// Create an OAuth HTTP client with the default transport.
pub fn oauth_http_client(config: ClientConfig) -> Result<OAuthHttpClient, HttpClientError> {
    OAuthHttpClient::new(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{MockHttpTransport, UrlEndpoint};
    use std::time::Duration;

    fn client() -> OAuthHttpClient<MockHttpTransport> {
        OAuthHttpClient::with_transport(ClientConfig::default(), MockHttpTransport::new()).unwrap()
    }

    fn endpoint(url: &str) -> UrlEndpoint {
        UrlEndpoint::parse(url).unwrap()
    }

    fn headers(items: &[(&str, &str)]) -> HashMap<String, String> {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_build_post_form_request() {
        let request = client()
            .build_request(
                &endpoint("https://provider.example/oauth/token"),
                &RequestBody::form([("grant_type", "client_credentials"), ("scope", "read")]),
                &HashMap::new(),
                "post",
            )
            .unwrap();

        assert_eq!(request.method, HttpMethod::Post);
        assert_eq!(request.url, "https://provider.example/oauth/token");
        assert_eq!(request.body, "grant_type=client_credentials&scope=read");
        assert_eq!(
            request.headers.to_lines(),
            vec![
                "Content-Type: application/x-www-form-urlencoded",
                "Host: provider.example",
                "Connection: close",
                "Content-length: 40",
            ]
        );
    }

    #[test]
    fn test_get_with_body_is_rejected() {
        let err = client()
            .build_request(
                &endpoint("https://provider.example/me"),
                &RequestBody::from("x=1"),
                &HashMap::new(),
                "get",
            )
            .unwrap_err();

        assert!(matches!(err, HttpClientError::InvalidRequest { .. }));
    }

    #[test]
    fn test_get_with_empty_form_is_allowed() {
        let request = client()
            .build_request(
                &endpoint("https://provider.example/me"),
                &RequestBody::Form(Vec::new()),
                &HashMap::new(),
                "GET",
            )
            .unwrap();

        assert_eq!(request.body, "");
        assert_eq!(request.headers.get("content-length"), Some("Content-length: 0"));
        assert!(!request.headers.contains("Content-Type"));
    }

    #[test]
    fn test_invalid_method_is_rejected() {
        for method in ["", "GE T", "PO/ST"] {
            let err = client()
                .build_request(
                    &endpoint("https://provider.example/me"),
                    &RequestBody::empty(),
                    &HashMap::new(),
                    method,
                )
                .unwrap_err();
            assert!(matches!(err, HttpClientError::InvalidRequest { .. }));
        }
    }

    #[test]
    fn test_caller_content_type_is_kept() {
        let request = client()
            .build_request(
                &endpoint("https://provider.example/token"),
                &RequestBody::form([("a", "1")]),
                &headers(&[("content-type", "application/json")]),
                "POST",
            )
            .unwrap();

        assert_eq!(
            request.headers.get("Content-Type"),
            Some("Content-type: application/json")
        );
    }

    #[test]
    fn test_raw_post_gets_no_content_type() {
        let request = client()
            .build_request(
                &endpoint("https://provider.example/token"),
                &RequestBody::from("{\"a\":1}"),
                &HashMap::new(),
                "POST",
            )
            .unwrap();

        assert!(!request.headers.contains("Content-Type"));
        assert_eq!(request.body, "{\"a\":1}");
    }

    #[test]
    fn test_form_put_gets_no_content_type() {
        let request = client()
            .build_request(
                &endpoint("https://provider.example/resource"),
                &RequestBody::form([("a", "1")]),
                &HashMap::new(),
                "PUT",
            )
            .unwrap();

        assert_eq!(request.method, HttpMethod::Put);
        assert!(!request.headers.contains("Content-Type"));
        assert_eq!(request.body, "a=1");
    }

    #[test]
    fn test_host_header_with_explicit_port() {
        let request = client()
            .build_request(
                &endpoint("http://localhost:8080/token"),
                &RequestBody::empty(),
                &HashMap::new(),
                "GET",
            )
            .unwrap();

        assert_eq!(request.headers.get("host"), Some("Host: localhost:8080"));
    }

    #[test]
    fn test_framing_headers_override_caller() {
        let request = client()
            .build_request(
                &endpoint("https://provider.example/token"),
                &RequestBody::from("abc"),
                &headers(&[
                    ("Connection", "keep-alive"),
                    ("CONTENT-LENGTH", "999"),
                    ("host", "evil.example"),
                    ("Authorization", "Bearer t0k3n"),
                ]),
                "POST",
            )
            .unwrap();

        let lines = request.headers.to_lines();
        assert_eq!(request.headers.get("connection"), Some("Connection: close"));
        assert_eq!(request.headers.get("host"), Some("Host: provider.example"));
        assert_eq!(
            lines
                .iter()
                .filter(|l| l.to_ascii_lowercase().starts_with("content-length:"))
                .collect::<Vec<_>>(),
            vec!["Content-length: 3"]
        );
        assert!(lines.contains(&"Authorization: Bearer t0k3n".to_string()));
    }

    #[test]
    fn test_content_length_counts_bytes() {
        let request = client()
            .build_request(
                &endpoint("https://provider.example/token"),
                &RequestBody::from("naïve"),
                &HashMap::new(),
                "POST",
            )
            .unwrap();

        assert_eq!(request.headers.get("content-length"), Some("Content-length: 6"));
    }

    #[tokio::test]
    async fn test_send_returns_raw_body() {
        let client = client();
        client
            .transport()
            .queue_outcome(Ok(TransportResponse::with_body(
                "HTTP/1.1 400 Bad Request",
                r#"{"error":"invalid_grant"}"#,
            )));

        let body = client
            .send(
                &endpoint("https://provider.example/token"),
                vec![("grant_type", "refresh_token")],
                &HashMap::new(),
                "POST",
            )
            .await
            .unwrap();

        assert_eq!(body, r#"{"error":"invalid_grant"}"#);
    }

    #[tokio::test]
    async fn test_send_passes_config_to_transport() {
        let config = ClientConfig {
            user_agent: "acme-sso/1.0".to_string(),
            timeout: Some(Duration::from_secs(15)),
            max_redirects: 3,
        };
        let client = OAuthHttpClient::with_transport(config, MockHttpTransport::new()).unwrap();
        client.transport().queue_body("ok");

        client
            .get(&endpoint("https://provider.example/me"), &HashMap::new())
            .await
            .unwrap();

        let sent = client.transport().get_last_request().unwrap();
        assert_eq!(sent.method, HttpMethod::Get);
        assert_eq!(sent.user_agent, "acme-sso/1.0");
        assert_eq!(sent.timeout, Some(Duration::from_secs(15)));
        assert_eq!(sent.max_redirects, 3);
        assert_eq!(sent.body, "");
    }

    #[tokio::test]
    async fn test_send_get_with_body_skips_transport() {
        let client = client();
        let result = client
            .send(
                &endpoint("https://provider.example/me"),
                "payload",
                &HashMap::new(),
                "GET",
            )
            .await;

        assert!(matches!(result, Err(HttpClientError::InvalidRequest { .. })));
        assert_eq!(client.transport().request_count(), 0);
    }

    #[tokio::test]
    async fn test_send_maps_network_error() {
        let client = client();
        client.transport().queue_error(NetworkError::ConnectionFailed {
            message: "connection refused".to_string(),
        });

        let err = client
            .post_form(
                &endpoint("https://provider.example/token"),
                [("a", "1")],
                &HashMap::new(),
            )
            .await
            .unwrap_err();

        assert_eq!(err.as_transport().unwrap().message(), "connection refused");
    }

    #[tokio::test]
    async fn test_send_maps_missing_body() {
        let client = client();
        client
            .transport()
            .queue_outcome(Ok(TransportResponse::empty(Some(
                "HTTP/1.1 500 Internal Server Error".to_string(),
            ))))
            .queue_outcome(Ok(TransportResponse::empty(None)));

        let endpoint = endpoint("https://provider.example/token");
        let err = client
            .send(&endpoint, "", &HashMap::new(), "POST")
            .await
            .unwrap_err();
        assert_eq!(
            err.as_transport().unwrap().message(),
            "Failed to request resource. HTTP Code: HTTP/1.1 500 Internal Server Error"
        );

        let err = client
            .send(&endpoint, "", &HashMap::new(), "POST")
            .await
            .unwrap_err();
        assert_eq!(
            err.as_transport().unwrap().message(),
            "Failed to request resource. HTTP Code: No response"
        );
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = ClientConfig {
            user_agent: String::new(),
            ..Default::default()
        };
        let result = OAuthHttpClient::with_transport(config, MockHttpTransport::new());
        assert!(matches!(result, Err(HttpClientError::Configuration(_))));
    }
}
