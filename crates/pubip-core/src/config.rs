//! Configuration types for the pubip service
//!
//! This module defines all configuration structures used throughout the crate.
//! Every knob carries a default so that an empty configuration yields the
//! stock service: probe `https://icanhazip.com` every 30 minutes, listen on
//! `0.0.0.0:6969`.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

/// Default upstream echo endpoint
pub const DEFAULT_ECHO_URL: &str = "https://icanhazip.com";

/// Default refresh interval (30 minutes)
pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 1800;

/// Default outbound probe timeout
pub const DEFAULT_PROBE_TIMEOUT_SECS: u64 = 10;

/// Default listen address for the HTTP front-end
pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:6969";

/// Main service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Upstream probe configuration
    #[serde(default)]
    pub probe: ProbeConfig,

    /// Refresh loop settings
    #[serde(default)]
    pub refresh: RefreshConfig,

    /// HTTP front-end settings
    #[serde(default)]
    pub server: ServerConfig,
}

impl ServiceConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self {
            probe: ProbeConfig::default(),
            refresh: RefreshConfig::default(),
            server: ServerConfig::default(),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        self.probe.validate()?;
        self.refresh.validate()?;

        // A probe that can outlive the refresh interval would silently eat
        // whole refresh cycles.
        if let ProbeConfig::Http { timeout_secs, .. } = &self.probe
            && *timeout_secs >= self.refresh.interval_secs
        {
            return Err(crate::Error::config(format!(
                "probe timeout ({}s) must be below the refresh interval ({}s)",
                timeout_secs, self.refresh.interval_secs
            )));
        }

        Ok(())
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Upstream probe configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProbeConfig {
    /// HTTP-based probe against an external echo endpoint
    Http {
        /// URL of the echo endpoint
        url: String,
        /// Outbound request timeout in seconds
        #[serde(default = "default_probe_timeout_secs")]
        timeout_secs: u64,
    },
}

impl ProbeConfig {
    /// Validate the probe configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            ProbeConfig::Http { url, timeout_secs } => {
                if url.is_empty() {
                    return Err(crate::Error::config("probe URL cannot be empty"));
                }
                if !url.starts_with("https://") && !url.starts_with("http://") {
                    return Err(crate::Error::config(format!(
                        "probe URL must use HTTP or HTTPS scheme, got: {}",
                        url
                    )));
                }
                if *timeout_secs == 0 {
                    return Err(crate::Error::config("probe timeout must be > 0"));
                }
                Ok(())
            }
        }
    }
}

impl Default for ProbeConfig {
    fn default() -> Self {
        ProbeConfig::Http {
            url: DEFAULT_ECHO_URL.to_string(),
            timeout_secs: default_probe_timeout_secs(),
        }
    }
}

/// Refresh loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshConfig {
    /// Wall-clock delay between successive probe attempts (in seconds)
    ///
    /// The same interval applies after success and after failure; there is
    /// no failure back-off and no fast retry.
    #[serde(default = "default_refresh_interval_secs")]
    pub interval_secs: u64,

    /// Capacity of the internal event channel
    ///
    /// When full, new refresh events are dropped (with a warning log).
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl RefreshConfig {
    /// Validate the refresh configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.interval_secs == 0 {
            return Err(crate::Error::config("refresh interval must be > 0"));
        }
        if self.event_channel_capacity == 0 {
            return Err(crate::Error::config("event channel capacity must be > 0"));
        }
        Ok(())
    }
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_refresh_interval_secs(),
            event_channel_capacity: default_event_channel_capacity(),
        }
    }
}

/// HTTP front-end configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address the listener binds to
    #[serde(default = "default_listen_addr")]
    pub listen_addr: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
        }
    }
}

fn default_probe_timeout_secs() -> u64 {
    DEFAULT_PROBE_TIMEOUT_SECS
}

fn default_refresh_interval_secs() -> u64 {
    DEFAULT_REFRESH_INTERVAL_SECS
}

fn default_event_channel_capacity() -> usize {
    64
}

fn default_listen_addr() -> SocketAddr {
    DEFAULT_LISTEN_ADDR
        .parse()
        .expect("default listen address parses")
}
