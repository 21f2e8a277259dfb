// SPDX-FileCopyrightText: 2026 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Subscription registry.
//!
//! One record per callback URL. Records are refreshed by every accepted
//! subscribe request and are never deleted: once `subscribed_until` passes
//! they are simply left out of active-set queries.

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::RwLock;

/// How long a subscription stays active without being renewed.
pub const SUBSCRIPTION_TTL: TimeDelta = TimeDelta::hours(25);

/// Storage error types.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] surrealdb::Error),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// A stored subscription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    /// Callback URL, unique
    pub url: String,
    /// Feed the subscriber asked to hear about
    pub feed_url: String,
    /// Method invoked on the callback URL
    pub method: String,
    pub subscribed_until: DateTime<Utc>,
    pub created: DateTime<Utc>,
}

impl Subscription {
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.subscribed_until > now
    }
}

/// Persistent subscription registry.
#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    /// Create or replace the record for `callback_url`, active for `ttl`
    /// from now. An existing record keeps its `created` time.
    async fn upsert(
        &self,
        callback_url: &str,
        feed_url: &str,
        method: &str,
        ttl: TimeDelta,
    ) -> Result<Subscription, StoreError>;

    /// Every record with `subscribed_until > now`.
    async fn active_subscriptions(&self, now: DateTime<Utc>)
        -> Result<Vec<Subscription>, StoreError>;
}

/// In-process store, used by tests and single-process deployments.
#[derive(Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<String, Subscription>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total records held, active or not.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    pub async fn get(&self, callback_url: &str) -> Option<Subscription> {
        self.records.read().await.get(callback_url).cloned()
    }
}

#[async_trait]
impl SubscriptionStore for MemoryStore {
    async fn upsert(
        &self,
        callback_url: &str,
        feed_url: &str,
        method: &str,
        ttl: TimeDelta,
    ) -> Result<Subscription, StoreError> {
        let now = Utc::now();
        let mut records = self.records.write().await;
        let created = records
            .get(callback_url)
            .map(|existing| existing.created)
            .unwrap_or(now);

        let subscription = Subscription {
            url: callback_url.to_string(),
            feed_url: feed_url.to_string(),
            method: method.to_string(),
            subscribed_until: now + ttl,
            created,
        };
        records.insert(callback_url.to_string(), subscription.clone());
        Ok(subscription)
    }

    async fn active_subscriptions(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<Subscription>, StoreError> {
        let records = self.records.read().await;
        Ok(records
            .values()
            .filter(|sub| sub.is_active_at(now))
            .cloned()
            .collect())
    }
}
