//! Transport Error Types
//!
//! Error hierarchy for request dispatch: caller-contract violations, transport
//! failures and configuration problems.

use std::time::Duration;
use thiserror::Error;

/// Prefix used when a transport fails without giving any diagnostic detail.
pub const NO_DETAIL_PREFIX: &str = "Failed to request resource. HTTP Code: ";

/// Status text used when no status line was received at all.
pub const NO_RESPONSE: &str = "No response";

/// Root error type for request dispatch.
#[derive(Error, Debug)]
pub enum HttpClientError {
    /// The caller asked for a request this client refuses to send.
    /// Detected before any network I/O.
    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),
}

impl HttpClientError {
    /// Create an invalid request error.
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// Get error code for telemetry.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidRequest { .. } => "HTTP_INVALID_REQUEST",
            Self::Transport(_) => "HTTP_TRANSPORT",
            Self::Configuration(_) => "HTTP_CONFIG",
        }
    }

    /// Check if the caller may reasonably retry the same call.
    ///
    /// Nothing in this crate retries on its own.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_retryable(),
            Self::InvalidRequest { .. } | Self::Configuration(_) => false,
        }
    }

    /// The transport error, if this is one.
    pub fn as_transport(&self) -> Option<&TransportError> {
        match self {
            Self::Transport(e) => Some(e),
            _ => None,
        }
    }
}

/// Failure surfaced by the underlying transport.
///
/// `message` is what the caller sees; it is the engine's own message when one
/// was available.
#[derive(Error, Debug)]
#[error("{message}")]
pub struct TransportError {
    message: String,
    #[source]
    cause: Option<NetworkError>,
}

impl TransportError {
    /// Wrap a low-level network error, keeping its detail as the message.
    ///
    /// An error with a blank detail is reported like an exchange without any.
    pub fn from_network(cause: NetworkError) -> Self {
        let detail = cause.detail();
        let message = if detail.trim().is_empty() {
            Self::no_detail(None).message
        } else {
            detail
        };
        Self {
            message,
            cause: Some(cause),
        }
    }

    /// Build the error for an exchange that produced neither data nor detail.
    pub fn no_detail(status_line: Option<&str>) -> Self {
        let status = status_line
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(NO_RESPONSE);
        Self {
            message: format!("{}{}", NO_DETAIL_PREFIX, status),
            cause: None,
        }
    }

    /// Error message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Underlying network error, if the transport reported one.
    pub fn cause(&self) -> Option<&NetworkError> {
        self.cause.as_ref()
    }

    /// Check if error is retryable.
    pub fn is_retryable(&self) -> bool {
        self.cause.as_ref().map_or(true, NetworkError::is_retryable)
    }
}

/// Low-level error reported by a transport engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NetworkError {
    #[error("Connection failed: {message}")]
    ConnectionFailed { message: String },

    #[error("Request timeout after {timeout:?}")]
    Timeout { timeout: Duration },

    #[error("DNS resolution failed: {host}")]
    DnsResolutionFailed { host: String },

    #[error("TLS error: {message}")]
    TlsError { message: String },

    #[error("Too many redirects (maximum {max})")]
    TooManyRedirects { max: u32 },

    #[error("Invalid response: {message}")]
    InvalidResponse { message: String },
}

impl NetworkError {
    /// The raw diagnostic detail, without the category prefix.
    pub fn detail(&self) -> String {
        match self {
            Self::ConnectionFailed { message }
            | Self::TlsError { message }
            | Self::InvalidResponse { message } => message.clone(),
            Self::Timeout { timeout } => format!("operation timed out after {:?}", timeout),
            Self::DnsResolutionFailed { host } => {
                format!("could not resolve host: {}", host)
            }
            Self::TooManyRedirects { max } => {
                format!("maximum ({}) redirects followed", max)
            }
        }
    }

    /// Check if error is retryable.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            Self::TlsError { .. } | Self::TooManyRedirects { .. } | Self::InvalidResponse { .. }
        )
    }
}

/// Configuration error.
#[derive(Error, Debug)]
pub enum ConfigurationError {
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("Invalid value for {key}: {value}")]
    InvalidEnvValue { key: String, value: String },

    #[error("Failed to build HTTP engine: {message}")]
    EngineBuildFailed { message: String },
}

/// Result type for request dispatch.
pub type HttpClientResult<T> = Result<T, HttpClientError>;
