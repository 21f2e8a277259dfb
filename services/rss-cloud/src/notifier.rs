// SPDX-FileCopyrightText: 2026 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Feed update broadcast.
//!
//! When a feed changes, every active subscriber to it gets one XML-RPC call
//! carrying the feed URL. Each call runs in its own task with its own
//! timeout. A failing subscriber is logged and counted, never retried, and
//! never affects the other calls or the caller.

use crate::config::NotifyConfig;
use crate::metrics::{Metrics, DELIVERED, FAILED};
use crate::store::{StoreError, Subscription, SubscriptionStore};
use crate::xmlrpc::{encode_method_call, parse_method_response, Value, XmlRpcError};
use chrono::Utc;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode};
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// A single callback attempt failed.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("Callback timed out")]
    Timeout,

    #[error("HTTP request error: {0}")]
    Http(#[source] reqwest::Error),

    #[error("Non-success HTTP status: {0}")]
    Status(StatusCode),

    #[error("Malformed response: {0}")]
    Malformed(#[from] XmlRpcError),

    #[error("Subscriber returned fault {code}: {message}")]
    Fault { code: i64, message: String },

    #[error("Delivery task ended abnormally: {0}")]
    Aborted(String),
}

impl From<reqwest::Error> for DeliveryError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            DeliveryError::Timeout
        } else {
            DeliveryError::Http(err)
        }
    }
}

/// Callback tasks started by one broadcast.
///
/// Dropping a `Dispatch` detaches the tasks; they still run to completion
/// or timeout.
#[derive(Debug)]
pub struct Dispatch {
    handles: Vec<JoinHandle<Result<(), DeliveryError>>>,
}

impl Dispatch {
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Wait for every callback, returning outcomes in subscription order.
    pub async fn wait(self) -> Vec<Result<(), DeliveryError>> {
        let mut outcomes = Vec::with_capacity(self.handles.len());
        for handle in self.handles {
            outcomes.push(match handle.await {
                Ok(outcome) => outcome,
                Err(e) => Err(DeliveryError::Aborted(e.to_string())),
            });
        }
        outcomes
    }
}

/// Sends feed update callbacks to active subscribers.
pub struct Notifier {
    store: Arc<dyn SubscriptionStore>,
    client: Client,
    metrics: Arc<Metrics>,
}

impl Notifier {
    pub fn new(
        store: Arc<dyn SubscriptionStore>,
        config: &NotifyConfig,
        metrics: Arc<Metrics>,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self {
            store,
            client,
            metrics,
        })
    }

    /// Start one callback per active subscriber of `feed_url`.
    ///
    /// Returns once the tasks are spawned; only the store read is awaited.
    pub async fn broadcast(&self, feed_url: &str) -> Result<Dispatch, StoreError> {
        let subscriptions = self.store.active_subscriptions(Utc::now()).await?;

        let handles: Vec<_> = subscriptions
            .into_iter()
            .filter(|sub| sub.feed_url == feed_url)
            .map(|sub| {
                let client = self.client.clone();
                let metrics = Arc::clone(&self.metrics);
                let feed_url = feed_url.to_string();
                tokio::spawn(async move {
                    let outcome = deliver(&client, &sub, &feed_url).await;
                    match &outcome {
                        Ok(()) => {
                            info!(
                                url = %sub.url,
                                method = %sub.method,
                                "Sent RSS cloud notification"
                            );
                            metrics.record_notification(DELIVERED);
                        }
                        Err(e) => {
                            warn!(url = %sub.url, error = %e, "RSS cloud notification failed");
                            metrics.record_notification(FAILED);
                        }
                    }
                    outcome
                })
            })
            .collect();

        info!(feed_url, subscribers = handles.len(), "Sending RSS cloud notifications");
        Ok(Dispatch { handles })
    }

    /// Fire-and-forget trigger for a changed feed.
    ///
    /// Spawns the whole broadcast, including the store read, and returns
    /// immediately.
    pub fn feed_changed(self: &Arc<Self>, feed_url: impl Into<String>) {
        let notifier = Arc::clone(self);
        let feed_url = feed_url.into();
        tokio::spawn(async move {
            if let Err(e) = notifier.broadcast(&feed_url).await {
                error!(%feed_url, error = %e, "Error finding RSS cloud subscribers to notify");
            }
        });
    }
}

async fn deliver(client: &Client, sub: &Subscription, feed_url: &str) -> Result<(), DeliveryError> {
    debug!(url = %sub.url, "Building RSS cloud notification");
    let body = encode_method_call(&sub.method, &[Value::String(feed_url.to_string())]);

    let response = client
        .post(&sub.url)
        .header(CONTENT_TYPE, "text/xml")
        .body(body)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        return Err(DeliveryError::Status(status));
    }

    let bytes = response.bytes().await?;
    match parse_method_response(&bytes)? {
        Ok(_) => Ok(()),
        Err(fault) => Err(DeliveryError::Fault {
            code: fault.code,
            message: fault.message,
        }),
    }
}
