//! OAuth2 HTTP Transport
//!
//! HTTP request/response transport used by OAuth2 flows to exchange tokens
//! and call protected resources.
//!
//! # Features
//!
//! - Header normalization into canonical `Name: value` lines
//! - Form-encoding of structured bodies
//! - `Host`, `Connection` and `Content-length` framing
//! - Pluggable transport (reqwest by default, mock for tests)
//! - Uniform error mapping for invalid requests and transport failures
//!
//! # Example
//!
//! ```rust,ignore
//! use std::collections::HashMap;
//! use oauth2_http_transport::{client_config, OAuthHttpClient, UrlEndpoint};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = client_config()
//!         .user_agent("my-app/1.0")
//!         .timeout_secs(30)
//!         .build()?;
//!
//!     let client = OAuthHttpClient::new(config)?;
//!     let endpoint = UrlEndpoint::parse("https://provider.com/oauth/token")?;
//!
//!     let body = client
//!         .post_form(
//!             &endpoint,
//!             [("grant_type", "client_credentials"), ("scope", "read")],
//!             &HashMap::new(),
//!         )
//!         .await?;
//!
//!     println!("Token response: {}", body);
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - `types`: client configuration
//! - `error`: error hierarchy
//! - `core`: headers, bodies, endpoints and the transport interface
//! - `builders`: fluent configuration builder
//! - `client`: the request dispatcher

pub mod builders;
pub mod client;
pub mod core;
pub mod error;
pub mod types;

// Re-export main client
pub use client::{oauth_http_client, HttpRequest, OAuthHttpClient};

// Re-export builders
pub use builders::{client_config, ClientConfigBuilder};

// Re-export errors
pub use error::{
    ConfigurationError, HttpClientError, HttpClientResult, NetworkError, TransportError,
};

// Re-export types
pub use types::{ClientConfig, DEFAULT_MAX_REDIRECTS, DEFAULT_USER_AGENT};

// Re-export core components
pub use crate::core::{
    // Headers
    canonical_name, HeaderNormalizer, HeaderSet,
    // Bodies
    RequestBody, FORM_CONTENT_TYPE,
    // Endpoints
    Endpoint, UrlEndpoint,
    // Transport
    create_mock_transport, create_transport, HttpMethod, HttpTransport, MockHttpTransport,
    ReqwestHttpTransport, TransportRequest, TransportResponse,
};
