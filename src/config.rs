//! Configuration Module
//!
//! Loads proxy configuration from environment variables. Most values are
//! required: a missing or malformed one is a startup error.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::backend::RetryPolicy;
use crate::error::ConfigError;

/// Proxy configuration parameters.
#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum number of entries the cache can hold
    pub cache_size: usize,
    /// Freshness window for cached lookups
    pub ttl: Duration,
    /// Maximum number of concurrent HTTP lookups
    pub max_conn: usize,
    /// Backing Redis host
    pub redis_host: String,
    /// Backing Redis port
    pub redis_port: u16,
    /// Backing Redis database index
    pub redis_db: u32,
    /// Reconnect discipline for the backing store
    pub retry: RetryPolicy,
    /// HTTP listener host
    pub http_host: String,
    /// HTTP listener port
    pub http_port: u16,
    /// RESP listener host
    pub tcp_host: String,
    /// RESP listener port
    pub tcp_port: u16,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_SIZE` - Maximum cache entries (required, at least 1)
    /// - `TTL` - Freshness window in seconds (required)
    /// - `MAX_CONN` - Concurrent HTTP lookup ceiling (required, at least 1)
    /// - `REDIS_HOST`, `REDIS_PORT` - Backing store endpoint (required)
    /// - `REDIS_DB` - Database index (default: 0)
    /// - `REDIS_MAX_ATTEMPTS` - Connection attempts per lookup (default: 21)
    /// - `REDIS_RETRY_DELAY_MS` - Delay between attempts (default: 1000)
    /// - `HTTP_HOST`, `HTTP_PORT` - HTTP listener (required)
    /// - `TCP_HOST`, `TCP_PORT` - RESP listener (required)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Creates a new Config from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = RetryPolicy::default();

        let cache_size: usize = required(&lookup, "CACHE_SIZE")?;
        if cache_size == 0 {
            return Err(invalid("CACHE_SIZE", "0"));
        }
        let max_conn: usize = required(&lookup, "MAX_CONN")?;
        if max_conn == 0 {
            return Err(invalid("MAX_CONN", "0"));
        }
        let max_attempts: u32 =
            optional(&lookup, "REDIS_MAX_ATTEMPTS")?.unwrap_or(defaults.max_attempts);
        if max_attempts == 0 {
            return Err(invalid("REDIS_MAX_ATTEMPTS", "0"));
        }
        let delay = optional(&lookup, "REDIS_RETRY_DELAY_MS")?
            .map(Duration::from_millis)
            .unwrap_or(defaults.delay);

        Ok(Self {
            cache_size,
            ttl: Duration::from_secs(required(&lookup, "TTL")?),
            max_conn,
            redis_host: required(&lookup, "REDIS_HOST")?,
            redis_port: required(&lookup, "REDIS_PORT")?,
            redis_db: optional(&lookup, "REDIS_DB")?.unwrap_or(0),
            retry: RetryPolicy::new(max_attempts, delay),
            http_host: required(&lookup, "HTTP_HOST")?,
            http_port: required(&lookup, "HTTP_PORT")?,
            tcp_host: required(&lookup, "TCP_HOST")?,
            tcp_port: required(&lookup, "TCP_PORT")?,
        })
    }

    /// Returns the HTTP listener address as `host:port`.
    pub fn http_addr(&self) -> String {
        format!("{}:{}", self.http_host, self.http_port)
    }

    /// Returns the RESP listener address as `host:port`.
    pub fn tcp_addr(&self) -> String {
        format!("{}:{}", self.tcp_host, self.tcp_port)
    }
}

fn invalid(name: &'static str, value: &str) -> ConfigError {
    ConfigError::Invalid {
        name,
        value: value.to_string(),
    }
}

fn optional<T, F>(lookup: &F, name: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| invalid(name, &raw)),
    }
}

fn required<T, F>(lookup: &F, name: &'static str) -> Result<T, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    optional(lookup, name)?.ok_or(ConfigError::Missing(name))
}
