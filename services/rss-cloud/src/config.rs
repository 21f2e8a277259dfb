// SPDX-FileCopyrightText: 2026 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Configuration for the RSS cloud service.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the RSS cloud service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server bind address (default: 0.0.0.0:8080)
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Feeds served by this instance
    #[serde(default)]
    pub feeds: FeedConfig,

    /// Subscription storage
    #[serde(default)]
    pub storage: StorageConfig,

    /// Outbound notification settings
    #[serde(default)]
    pub notify: NotifyConfig,

    /// Metrics configuration
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Feeds that subscribers may register interest in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Canonical feed URLs (default: http://localhost:8080/rss)
    #[serde(default = "default_feed_urls")]
    pub urls: Vec<String>,
}

/// Subscription storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// SurrealDB endpoint, `mem://` or `rocksdb://<path>` (default: mem://)
    #[serde(default = "default_database_url")]
    pub database_url: String,
}

/// Outbound callback configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    /// Per-callback timeout in seconds (default: 30)
    #[serde(default = "default_notify_timeout_secs")]
    pub timeout_secs: u64,

    /// User-Agent sent with callbacks
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

/// Metrics configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Enable Prometheus metrics endpoint (default: true)
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Metrics endpoint path (default: /metrics)
    #[serde(default = "default_metrics_path")]
    pub path: String,
}

fn default_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_feed_urls() -> Vec<String> {
    vec!["http://localhost:8080/rss".to_string()]
}

fn default_database_url() -> String {
    "mem://".to_string()
}

fn default_notify_timeout_secs() -> u64 {
    30
}

fn default_user_agent() -> String {
    concat!("rss-cloud/", env!("CARGO_PKG_VERSION")).to_string()
}

fn default_true() -> bool {
    true
}

fn default_metrics_path() -> String {
    "/metrics".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            feeds: FeedConfig::default(),
            storage: StorageConfig::default(),
            notify: NotifyConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            urls: default_feed_urls(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
        }
    }
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_notify_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            path: default_metrics_path(),
        }
    }
}

impl NotifyConfig {
    /// Get the callback timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl FeedConfig {
    /// Parse a comma separated list of feed URLs, ignoring empty entries.
    pub fn from_list(list: &str) -> Self {
        Self {
            urls: list
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }
}
