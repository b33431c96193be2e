//! Endpoints
//!
//! Target URI interface consumed by the dispatcher.

use url::Url;

use crate::error::{ConfigurationError, HttpClientError};

/// Target of a request.
pub trait Endpoint: Send + Sync {
    /// Host name, without port.
    fn host(&self) -> &str;

    /// Whether the URI names a port explicitly.
    fn has_explicit_port(&self) -> bool;

    /// Effective port.
    fn port(&self) -> u16;

    /// Full URI as sent to the transport.
    fn absolute_uri(&self) -> &str;
}

/// [`Endpoint`] backed by a parsed URL.
///
/// A port equal to the scheme's default (`https://host:443/`) does not count
/// as explicit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UrlEndpoint {
    url: Url,
}

impl UrlEndpoint {
    /// Parse an endpoint URL. Only `http` and `https` are accepted.
    pub fn parse(input: &str) -> Result<Self, HttpClientError> {
        let url = Url::parse(input).map_err(|e| {
            HttpClientError::Configuration(ConfigurationError::InvalidConfig {
                message: format!("Invalid endpoint URL {}: {}", input, e),
            })
        })?;
        Self::from_url(url)
    }

    /// Wrap an already parsed URL.
    pub fn from_url(url: Url) -> Result<Self, HttpClientError> {
        if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
            return Err(HttpClientError::Configuration(
                ConfigurationError::InvalidConfig {
                    message: format!("Unsupported endpoint URL: {}", url),
                },
            ));
        }
        Ok(Self { url })
    }

    /// The underlying URL.
    pub fn url(&self) -> &Url {
        &self.url
    }
}

impl Endpoint for UrlEndpoint {
    fn host(&self) -> &str {
        self.url.host_str().unwrap_or_default()
    }

    fn has_explicit_port(&self) -> bool {
        self.url.port().is_some()
    }

    fn port(&self) -> u16 {
        self.url.port_or_known_default().unwrap_or(80)
    }

    fn absolute_uri(&self) -> &str {
        self.url.as_str()
    }
}

impl std::str::FromStr for UrlEndpoint {
    type Err = HttpClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
