// SPDX-FileCopyrightText: 2026 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Prometheus counters for subscribe traffic and callback delivery.

use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};

/// Outcome labels for subscribe requests.
pub const ACCEPTED: &str = "accepted";
pub const FAULT: &str = "fault";
pub const ERROR: &str = "error";

/// Outcome labels for callbacks.
pub const DELIVERED: &str = "delivered";
pub const FAILED: &str = "failed";

/// Service metrics on a private registry.
pub struct Metrics {
    registry: Registry,
    subscribe_requests: IntCounterVec,
    notifications: IntCounterVec,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let subscribe_requests = IntCounterVec::new(
            Opts::new(
                "rsscloud_subscribe_requests_total",
                "RSS cloud subscribe requests by outcome",
            ),
            &["outcome"],
        )?;
        let notifications = IntCounterVec::new(
            Opts::new(
                "rsscloud_notifications_total",
                "Feed update callbacks by outcome",
            ),
            &["outcome"],
        )?;

        registry.register(Box::new(subscribe_requests.clone()))?;
        registry.register(Box::new(notifications.clone()))?;

        Ok(Self {
            registry,
            subscribe_requests,
            notifications,
        })
    }

    pub fn record_subscribe(&self, outcome: &str) {
        self.subscribe_requests.with_label_values(&[outcome]).inc();
    }

    pub fn record_notification(&self, outcome: &str) {
        self.notifications.with_label_values(&[outcome]).inc();
    }

    pub fn subscribe_count(&self, outcome: &str) -> u64 {
        self.subscribe_requests.with_label_values(&[outcome]).get()
    }

    pub fn notification_count(&self, outcome: &str) -> u64 {
        self.notifications.with_label_values(&[outcome]).get()
    }

    /// Render all metrics in the Prometheus text format.
    pub fn render(&self) -> Result<String, prometheus::Error> {
        let mut buf = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buf)?;
        String::from_utf8(buf).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
