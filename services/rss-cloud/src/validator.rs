// SPDX-FileCopyrightText: 2026 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! RSS cloud subscribe request validator.
//!
//! Applies protocol and local-policy rules to a decoded request:
//! - the inbound method must be `cloud.notify`
//! - the callback protocol must be `xml-rpc`
//! - the feed must be one this instance serves
//!
//! On acceptance the subscriber's callback URL is derived from the peer
//! address and the declared port and path.

use crate::config::FeedConfig;
use crate::request::SubscribeRequest;
use std::net::IpAddr;
use thiserror::Error;
use tracing::debug;
use url::Url;

/// Inbound method name for subscribe requests.
pub const CLOUD_NOTIFY_METHOD: &str = "cloud.notify";

/// Validation error types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Unknown method {0}")]
    UnsupportedMethod(String),

    #[error("Only XML-RPC is supported")]
    UnsupportedTransport,

    #[error("RSS URL {0} is not a feed managed here")]
    UnknownFeed(String),
}

/// A subscription ready to be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackTarget {
    /// Served feed URL, as configured
    pub feed_url: String,
    pub callback_url: String,
    pub notify_method: String,
}

/// Result of validation.
#[derive(Debug, Clone)]
pub enum ValidationResult {
    /// Request is accepted
    Accepted(CallbackTarget),
    /// Request is rejected
    Rejected(ValidationError),
}

impl ValidationResult {
    pub fn is_accepted(&self) -> bool {
        matches!(self, ValidationResult::Accepted(_))
    }

    pub fn error(&self) -> Option<&ValidationError> {
        match self {
            ValidationResult::Accepted(_) => None,
            ValidationResult::Rejected(e) => Some(e),
        }
    }
}

/// Validates subscribe requests against the feeds this instance serves.
pub struct CloudValidator {
    /// (normalised, configured) pairs
    feeds: Vec<(String, String)>,
}

impl CloudValidator {
    /// Create a new validator with the given configuration.
    pub fn new(config: &FeedConfig) -> Self {
        Self {
            feeds: config
                .urls
                .iter()
                .map(|url| (normalize_feed_url(url), url.clone()))
                .collect(),
        }
    }

    /// Look up a served feed, returning its configured URL.
    pub fn served_feed(&self, url: &str) -> Option<&str> {
        let normalized = normalize_feed_url(url);
        self.feeds
            .iter()
            .find(|(n, _)| *n == normalized)
            .map(|(_, configured)| configured.as_str())
    }

    /// Validate a subscribe request from `remote`.
    pub fn validate(&self, request: &SubscribeRequest, remote: IpAddr) -> ValidationResult {
        if request.protocol_method != CLOUD_NOTIFY_METHOD {
            debug!(method = %request.protocol_method, "Unsupported method");
            return ValidationResult::Rejected(ValidationError::UnsupportedMethod(
                request.protocol_method.clone(),
            ));
        }

        if !request.transport_is_xml_rpc {
            debug!("Unsupported callback protocol");
            return ValidationResult::Rejected(ValidationError::UnsupportedTransport);
        }

        let feed_url = match self.served_feed(&request.feed_url) {
            Some(feed) => feed.to_string(),
            None => {
                debug!(feed_url = %request.feed_url, "Feed not served here");
                return ValidationResult::Rejected(ValidationError::UnknownFeed(
                    request.feed_url.clone(),
                ));
            }
        };

        let callback_url = callback_url(remote, request.callback_port, &request.callback_path);
        debug!(%callback_url, %feed_url, "Subscribe request valid");

        ValidationResult::Accepted(CallbackTarget {
            feed_url,
            callback_url,
            notify_method: request.callback_method.clone(),
        })
    }
}

/// Build the canonical callback URL for a subscriber.
///
/// Port 443 selects `https`, anything else `http`. The port is omitted from
/// the authority for 80 and 443. The path is kept verbatim apart from a
/// leading `/` when it has none.
pub fn callback_url(host: IpAddr, port: u16, path: &str) -> String {
    let scheme = if port == 443 { "https" } else { "http" };

    let host = match host.to_canonical() {
        IpAddr::V4(v4) => v4.to_string(),
        IpAddr::V6(v6) => format!("[{}]", v6),
    };
    let authority = if port == 80 || port == 443 {
        host
    } else {
        format!("{}:{}", host, port)
    };

    let separator = if path.is_empty() || path.starts_with('/') {
        ""
    } else {
        "/"
    };
    format!("{}://{}{}{}", scheme, authority, separator, path)
}

/// Normalise a feed URL for comparison.
fn normalize_feed_url(url: &str) -> String {
    match Url::parse(url) {
        Ok(parsed) => parsed.to_string(),
        Err(_) => url.to_string(),
    }
}
