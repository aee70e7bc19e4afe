//! Configuration management for novella-core.
//!
//! All tuning values live here so hosts can override them from a TOML
//! file. The scroll retry delay constants are empirical mitigations for
//! asynchronous browser reflow, not load-bearing values; treat them as
//! starting points.
//!
//! ```toml
//! [navigation]
//! history_cap = 10
//! scroll_top_delays_ms = [0, 200, 500]
//!
//! [connection]
//! base_api_url = "https://novella.example/api"
//! reconnection_attempts = 5
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::logging::LogConfig;

/// Errors during configuration load.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Read(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

impl From<ConfigError> for crate::Error {
    fn from(e: ConfigError) -> Self {
        match e {
            ConfigError::Read(io) => crate::Error::Io(io),
            parse @ ConfigError::Parse(_) => crate::Error::Config(parse.to_string()),
        }
    }
}

// =============================================================================
// Navigation
// =============================================================================

/// Navigation tracker and scroll-retry configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigationConfig {
    /// Maximum retained entries in the visited-path stack.
    pub history_cap: usize,
    /// Maximum retained entries in the novel↔chapter transition log.
    pub transition_log_cap: usize,
    /// Scroll-to-top attempt offsets from plan start, in milliseconds.
    /// Repeated attempts defeat devices that reflow content after
    /// navigation and silently undo an immediate scroll.
    pub scroll_top_delays_ms: Vec<u64>,
    /// Offset-restore attempt offsets from plan start, in milliseconds.
    /// More attempts than the top schedule because restored pages may
    /// populate the DOM asynchronously.
    pub scroll_restore_delays_ms: Vec<u64>,
    /// Route prefix identifying a novel detail page.
    pub novel_prefix: String,
    /// Route prefix identifying a chapter reading page.
    pub chapter_prefix: String,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            history_cap: 10,
            transition_log_cap: 5,
            scroll_top_delays_ms: vec![0, 200, 500],
            scroll_restore_delays_ms: vec![0, 100, 300, 500, 1000],
            novel_prefix: "/novel/".to_string(),
            chapter_prefix: "/read/".to_string(),
        }
    }
}

impl NavigationConfig {
    /// Scroll-to-top schedule as durations.
    #[must_use]
    pub fn top_schedule(&self) -> Vec<Duration> {
        self.scroll_top_delays_ms
            .iter()
            .map(|ms| Duration::from_millis(*ms))
            .collect()
    }

    /// Offset-restore schedule as durations.
    #[must_use]
    pub fn restore_schedule(&self) -> Vec<Duration> {
        self.scroll_restore_delays_ms
            .iter()
            .map(|ms| Duration::from_millis(*ms))
            .collect()
    }
}

// =============================================================================
// Connection
// =============================================================================

/// Transport preference for the duplex connection, ordered from
/// low-compatibility/high-performance to the reverse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transport {
    /// Persistent websocket framing.
    Websocket,
    /// Long-polling fallback for restrictive proxies.
    Polling,
}

/// Duplex connection configuration.
///
/// Reconnection is executed by the connection library itself; these
/// values bound its behavior and are handed over verbatim.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// Base API address; the socket target is this address with the API
    /// path suffix stripped. `None` falls back to `fallback_url`.
    pub base_api_url: Option<String>,
    /// Path suffix removed from `base_api_url` to obtain the socket target.
    pub api_suffix: String,
    /// Development fallback when no base API address is configured.
    pub fallback_url: String,
    /// Maximum reconnection attempts before giving up until reload.
    pub reconnection_attempts: u32,
    /// Initial delay between reconnection attempts, in milliseconds.
    pub reconnection_delay_ms: u64,
    /// Cap on the (backed-off) reconnection delay, in milliseconds.
    pub reconnection_delay_max_ms: u64,
    /// Connection establishment timeout, in milliseconds.
    pub connection_timeout_ms: u64,
    /// Random jitter applied to reconnection delays, as a fraction of
    /// the base delay.
    pub reconnection_jitter_percent: f64,
    /// Ordered transport preference list.
    pub transports: Vec<Transport>,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            base_api_url: None,
            api_suffix: "/api".to_string(),
            fallback_url: "http://localhost:5000".to_string(),
            reconnection_attempts: 5,
            reconnection_delay_ms: 1000,
            reconnection_delay_max_ms: 5000,
            connection_timeout_ms: 10_000,
            reconnection_jitter_percent: 0.1,
            transports: vec![Transport::Websocket, Transport::Polling],
        }
    }
}

impl ConnectionConfig {
    /// Derive the socket target address.
    ///
    /// Strips `api_suffix` from the end of the base address path. An
    /// unset or unparseable base address yields the development fallback.
    #[must_use]
    pub fn socket_url(&self) -> String {
        let Some(base) = self.base_api_url.as_deref() else {
            return self.fallback_url.clone();
        };
        let Ok(mut parsed) = Url::parse(base) else {
            return self.fallback_url.clone();
        };
        let path = parsed.path().trim_end_matches('/').to_string();
        let stripped = path
            .strip_suffix(self.api_suffix.as_str())
            .unwrap_or(&path)
            .to_string();
        parsed.set_path(&stripped);
        parsed.to_string().trim_end_matches('/').to_string()
    }
}

// =============================================================================
// Top level
// =============================================================================

/// Top-level configuration for the client core.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// Navigation tracker and scroll schedules.
    pub navigation: NavigationConfig,
    /// Duplex connection bounds.
    pub connection: ConnectionConfig,
    /// Logging output.
    pub log: LogConfig,
}

impl CoreConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&raw)?)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }
}
