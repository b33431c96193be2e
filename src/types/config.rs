//! Configuration Types
//!
//! Client configuration fixed at construction.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::ConfigurationError;

/// Default maximum number of redirects followed per request.
pub const DEFAULT_MAX_REDIRECTS: u32 = 10;

/// Default user agent.
pub const DEFAULT_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Environment variable overriding the user agent.
pub const ENV_USER_AGENT: &str = "OAUTH_HTTP_USER_AGENT";
/// Environment variable holding the timeout in seconds (`0` = unbounded).
pub const ENV_TIMEOUT_SECS: &str = "OAUTH_HTTP_TIMEOUT_SECS";
/// Environment variable overriding the redirect limit.
pub const ENV_MAX_REDIRECTS: &str = "OAUTH_HTTP_MAX_REDIRECTS";

/// Dispatcher configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// User agent sent with every request.
    pub user_agent: String,
    /// Request timeout. `None` waits indefinitely.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<Duration>,
    /// Maximum redirects followed per request.
    pub max_redirects: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: None,
            max_redirects: DEFAULT_MAX_REDIRECTS,
        }
    }
}

impl ClientConfig {
    /// Defaults overridden by any `OAUTH_HTTP_*` environment variables set.
    pub fn from_env() -> Result<Self, ConfigurationError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self, ConfigurationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(user_agent) = lookup(ENV_USER_AGENT) {
            config.user_agent = user_agent;
        }

        if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
            let secs: u64 = parse_env(ENV_TIMEOUT_SECS, &raw)?;
            config.timeout = timeout_from_secs(secs);
        }

        if let Some(raw) = lookup(ENV_MAX_REDIRECTS) {
            config.max_redirects = parse_env(ENV_MAX_REDIRECTS, &raw)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Check the configuration is usable.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.user_agent.trim().is_empty() {
            return Err(ConfigurationError::InvalidConfig {
                message: "user_agent must not be empty".to_string(),
            });
        }
        if self
            .user_agent
            .bytes()
            .any(|b| b == b'\r' || b == b'\n' || b == 0)
        {
            return Err(ConfigurationError::InvalidConfig {
                message: "user_agent must not contain line breaks".to_string(),
            });
        }
        if self.timeout == Some(Duration::ZERO) {
            return Err(ConfigurationError::InvalidConfig {
                message: "timeout must be positive; use None for no timeout".to_string(),
            });
        }
        Ok(())
    }
}

/// `0` means no timeout.
pub(crate) fn timeout_from_secs(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}

fn parse_env<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T, ConfigurationError> {
    raw.trim()
        .parse()
        .map_err(|_| ConfigurationError::InvalidEnvValue {
            key: key.to_string(),
            value: raw.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.max_redirects, 10);
        assert!(config.timeout.is_none());
        assert!(config.user_agent.starts_with("oauth2-http-transport/"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_lookup_overrides() {
        let config = ClientConfig::from_lookup(lookup(&[
            (ENV_USER_AGENT, "my-app/2.0"),
            (ENV_TIMEOUT_SECS, "15"),
            (ENV_MAX_REDIRECTS, "3"),
        ]))
        .unwrap();

        assert_eq!(config.user_agent, "my-app/2.0");
        assert_eq!(config.timeout, Some(Duration::from_secs(15)));
        assert_eq!(config.max_redirects, 3);
    }

    #[test]
    fn test_zero_timeout_means_unbounded() {
        let config = ClientConfig::from_lookup(lookup(&[(ENV_TIMEOUT_SECS, "0")])).unwrap();
        assert!(config.timeout.is_none());
    }

    #[test]
    fn test_invalid_env_value() {
        let err = ClientConfig::from_lookup(lookup(&[(ENV_MAX_REDIRECTS, "many")])).unwrap_err();
        assert!(matches!(
            err,
            ConfigurationError::InvalidEnvValue { ref key, .. } if key == ENV_MAX_REDIRECTS
        ));
    }

    #[test]
    fn test_validate_rejects_bad_user_agent() {
        let config = ClientConfig {
            user_agent: "agent\r\nX-Injected: 1".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = ClientConfig {
            user_agent: "  ".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_deserialize_partial_config() {
        let config: ClientConfig =
            serde_json::from_str(r#"{"user_agent":"provider-sync/1.0","max_redirects":2}"#)
                .unwrap();
        assert_eq!(config.user_agent, "provider-sync/1.0");
        assert_eq!(config.max_redirects, 2);
        assert!(config.timeout.is_none());
    }
}
