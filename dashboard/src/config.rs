//! Configuration management for the dashboard.
//!
//! Loads configuration from environment variables with sensible defaults.
//! The binary loads a `.env` file (if present) before calling
//! [`Config::from_env`].

use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Default backend base URL
pub const DEFAULT_API_URL: &str = "http://localhost:5000/api";

/// Errors raised while reading configuration
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A variable is set but cannot be parsed
    #[error("Invalid value for {name}: {value:?} ({reason})")]
    Invalid {
        /// Variable name
        name: &'static str,
        /// Raw value
        value: String,
        /// What was expected
        reason: &'static str,
    },
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Backend base URL (`SHOPDESK_API_URL`)
    pub api_url: String,
    /// Bearer token attached to every request (`SHOPDESK_API_TOKEN`)
    pub api_token: Option<String>,
    /// HTTP request timeout (`SHOPDESK_API_TIMEOUT_SECS`, default 30)
    pub api_timeout: Duration,
    /// Buffered notifications per subscriber (`SHOPDESK_NOTIFY_CAPACITY`, default 32)
    pub notify_capacity: usize,
    /// Graceful shutdown timeout (`SHOPDESK_SHUTDOWN_TIMEOUT_SECS`, default 10)
    pub shutdown_timeout: Duration,
    /// Prometheus exporter address (`METRICS_ADDR`); metrics are off when unset
    pub metrics_addr: Option<SocketAddr>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_token: None,
            api_timeout: Duration::from_secs(30),
            notify_capacity: 32,
            shutdown_timeout: Duration::from_secs(10),
            metrics_addr: None,
        }
    }
}

impl Config {
    /// Load configuration from the process environment.
    ///
    /// Unset variables fall back to [`Config::default`]; empty values count as unset.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if a variable is set to a value that
    /// cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// See [`Config::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        Ok(Self {
            api_url: get("SHOPDESK_API_URL").unwrap_or(defaults.api_url),
            api_token: get("SHOPDESK_API_TOKEN"),
            api_timeout: get("SHOPDESK_API_TIMEOUT_SECS")
                .map(|v| parse_secs("SHOPDESK_API_TIMEOUT_SECS", v))
                .transpose()?
                .unwrap_or(defaults.api_timeout),
            notify_capacity: get("SHOPDESK_NOTIFY_CAPACITY")
                .map(|v| parse_positive("SHOPDESK_NOTIFY_CAPACITY", v))
                .transpose()?
                .unwrap_or(defaults.notify_capacity),
            shutdown_timeout: get("SHOPDESK_SHUTDOWN_TIMEOUT_SECS")
                .map(|v| parse_secs("SHOPDESK_SHUTDOWN_TIMEOUT_SECS", v))
                .transpose()?
                .unwrap_or(defaults.shutdown_timeout),
            metrics_addr: get("METRICS_ADDR")
                .map(|v| {
                    v.parse().map_err(|_| ConfigError::Invalid {
                        name: "METRICS_ADDR",
                        value: v,
                        reason: "expected host:port",
                    })
                })
                .transpose()?,
        })
    }
}

fn parse_positive<T>(name: &'static str, value: String) -> Result<T, ConfigError>
where
    T: FromStr + Default + PartialEq,
{
    match value.trim().parse::<T>() {
        Ok(n) if n != T::default() => Ok(n),
        _ => Err(ConfigError::Invalid {
            name,
            value,
            reason: "expected a positive integer",
        }),
    }
}

fn parse_secs(name: &'static str, value: String) -> Result<Duration, ConfigError> {
    parse_positive(name, value).map(Duration::from_secs)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.api_url, DEFAULT_API_URL);
    }

    #[test]
    fn reads_every_variable() {
        let config = Config::from_lookup(lookup(&[
            ("SHOPDESK_API_URL", "https://shop.example.com/api"),
            ("SHOPDESK_API_TOKEN", "abc"),
            ("SHOPDESK_API_TIMEOUT_SECS", "5"),
            ("SHOPDESK_NOTIFY_CAPACITY", "8"),
            ("SHOPDESK_SHUTDOWN_TIMEOUT_SECS", "2"),
            ("METRICS_ADDR", "127.0.0.1:9100"),
        ]))
        .unwrap();

        assert_eq!(config.api_url, "https://shop.example.com/api");
        assert_eq!(config.api_token.as_deref(), Some("abc"));
        assert_eq!(config.api_timeout, Duration::from_secs(5));
        assert_eq!(config.notify_capacity, 8);
        assert_eq!(config.shutdown_timeout, Duration::from_secs(2));
        assert_eq!(config.metrics_addr, Some("127.0.0.1:9100".parse().unwrap()));
    }

    #[test]
    fn empty_values_count_as_unset() {
        let config = Config::from_lookup(lookup(&[("SHOPDESK_API_TOKEN", "  ")])).unwrap();
        assert!(config.api_token.is_none());
    }

    #[test]
    fn invalid_values_are_reported() {
        let err = Config::from_lookup(lookup(&[("SHOPDESK_API_TIMEOUT_SECS", "0")])).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid { name: "SHOPDESK_API_TIMEOUT_SECS", .. }
        ));

        let err = Config::from_lookup(lookup(&[("METRICS_ADDR", "nowhere")])).unwrap_err();
        assert!(err.to_string().contains("METRICS_ADDR"));
    }
}
