//! Configuration Module
//!
//! Handles loading the fragment cache server configuration from environment variables.

use std::env;

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Environment name, part of every fragment key
    pub environment: String,
    /// Wrap served fragments in HIT/MISS/DISABLED comments
    pub debug: bool,
    /// Global fragment cache switch
    pub enabled: bool,
    /// Maximum number of fragments the in-memory store can hold
    pub max_entries: usize,
    /// HTTP server port
    pub server_port: u16,
    /// Background cleanup task interval in seconds
    pub cleanup_interval: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `FRAGMENT_CACHE_ENVIRONMENT` - Key environment segment (default: dev)
    /// - `FRAGMENT_CACHE_DEBUG` - Debug annotations (default: false)
    /// - `FRAGMENT_CACHE_ENABLED` - Cache kill switch (default: true)
    /// - `MAX_ENTRIES` - Maximum store entries (default: 1000)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `CLEANUP_INTERVAL` - Cleanup frequency in seconds (default: 60)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            environment: env::var("FRAGMENT_CACHE_ENVIRONMENT")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.environment),
            debug: env::var("FRAGMENT_CACHE_DEBUG")
                .ok()
                .and_then(|v| parse_flag(&v))
                .unwrap_or(defaults.debug),
            enabled: env::var("FRAGMENT_CACHE_ENABLED")
                .ok()
                .and_then(|v| parse_flag(&v))
                .unwrap_or(defaults.enabled),
            max_entries: env::var("MAX_ENTRIES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_entries),
            server_port: env::var("SERVER_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.server_port),
            cleanup_interval: env::var("CLEANUP_INTERVAL")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.cleanup_interval),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            environment: "dev".to_string(),
            debug: false,
            enabled: true,
            max_entries: 1000,
            server_port: 3000,
            cleanup_interval: 60,
        }
    }
}

/// Parses a boolean environment flag, `None` when unrecognised.
fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
