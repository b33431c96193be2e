//! Configuration Builder
//!
//! Fluent builder for client configuration.

use std::time::Duration;

use crate::error::HttpClientError;
use crate::types::{ClientConfig, DEFAULT_MAX_REDIRECTS, DEFAULT_USER_AGENT};

/// Client configuration builder.
#[derive(Debug)]
pub struct ClientConfigBuilder {
    user_agent: String,
    timeout: Option<Duration>,
    max_redirects: u32,
}

impl Default for ClientConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ClientConfigBuilder {
    /// Create new configuration builder.
    pub fn new() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: None,
            max_redirects: DEFAULT_MAX_REDIRECTS,
        }
    }

    /// Start from an existing configuration.
    pub fn from_config(config: ClientConfig) -> Self {
        Self {
            user_agent: config.user_agent,
            timeout: config.timeout,
            max_redirects: config.max_redirects,
        }
    }

    /// Set user agent.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set request timeout in seconds; `0` removes the timeout.
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout = crate::types::config::timeout_from_secs(secs);
        self
    }

    /// Wait indefinitely for responses.
    pub fn no_timeout(mut self) -> Self {
        self.timeout = None;
        self
    }

    /// Set maximum number of redirects followed.
    pub fn max_redirects(mut self, max_redirects: u32) -> Self {
        self.max_redirects = max_redirects;
        self
    }

    /// Build the configuration.
    pub fn build(self) -> Result<ClientConfig, HttpClientError> {
        let config = ClientConfig {
            user_agent: self.user_agent,
            timeout: self.timeout,
            max_redirects: self.max_redirects,
        };
        config.validate()?;
        Ok(config)
    }
}

/// Create a new client configuration builder.
pub fn client_config() -> ClientConfigBuilder {
    ClientConfigBuilder::new()
}
