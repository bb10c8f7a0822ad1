//! Configuration structures for wire-relay.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;

use crate::error::{Error, Result};

/// Main configuration structure.
///
/// Immutable once constructed; the supervisor never mutates it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyConfig {
    /// Address the relay listens on.
    #[serde(default = "default_listen")]
    pub listen: EndpointConfig,

    /// Fixed upstream every accepted client is paired with.
    #[serde(default = "default_upstream")]
    pub upstream: EndpointConfig,

    /// Accept-loop and dial timing.
    #[serde(default)]
    pub timing: TimingConfig,

    /// Logging configuration, consumed by the server binary.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            upstream: default_upstream(),
            timing: TimingConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// A (host, port) endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// Host address.
    pub host: String,

    /// TCP port.
    pub port: u16,
}

impl EndpointConfig {
    /// Parse the endpoint into a socket address.
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|_| Error::Config(format!("invalid address {}:{}", self.host, self.port)))
    }
}

fn default_listen() -> EndpointConfig {
    EndpointConfig {
        host: "127.0.0.1".to_string(),
        port: 9000,
    }
}

fn default_upstream() -> EndpointConfig {
    EndpointConfig {
        host: "127.0.0.1".to_string(),
        port: 9001,
    }
}

/// Timing configuration for the accept loop and the upstream dial.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingConfig {
    /// Accept retry interval in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Upstream connect timeout in seconds.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

fn default_poll_interval_ms() -> u64 {
    50
}

fn default_connect_timeout_secs() -> u64 {
    10
}

impl TimingConfig {
    /// Accept retry interval as a [`Duration`].
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Upstream connect timeout as a [`Duration`].
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
