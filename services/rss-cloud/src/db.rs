// SPDX-License-Identifier: PMPL-1.0-or-later
//! SurrealDB-backed subscription store

use crate::store::{StoreError, Subscription, SubscriptionStore};
use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use surrealdb::{
    engine::any::{self, Any},
    Surreal,
};
use tracing::debug;

const TABLE: &str = "subscription";

/// Persisted layout. Timestamps are epoch milliseconds so the active-set
/// filter is a plain numeric comparison.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SubscriptionRow {
    url: String,
    feed_url: String,
    method: String,
    subscribed_until: i64,
    created: i64,
}

impl SubscriptionRow {
    fn into_subscription(self) -> Result<Subscription, StoreError> {
        let subscribed_until = millis_to_datetime(self.subscribed_until, &self.url)?;
        let created = millis_to_datetime(self.created, &self.url)?;
        Ok(Subscription {
            url: self.url,
            feed_url: self.feed_url,
            method: self.method,
            subscribed_until,
            created,
        })
    }
}

fn millis_to_datetime(millis: i64, url: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::from_timestamp_millis(millis).ok_or_else(|| {
        StoreError::Unavailable(format!("corrupt timestamp {} on subscription {}", millis, url))
    })
}

/// Database connection wrapper
#[derive(Clone)]
pub struct SurrealStore {
    db: Surreal<Any>,
}

impl SurrealStore {
    /// Connect to SurrealDB, e.g. `mem://` or `rocksdb://data/rsscloud`
    pub async fn connect(endpoint: &str) -> Result<Self, StoreError> {
        let db = any::connect(endpoint).await?;

        // Use namespace and database
        db.use_ns("indieweb2").use_db("rsscloud").await?;

        // Initialize schema
        Self::init_schema(&db).await?;

        Ok(Self { db })
    }

    /// Initialize database schema
    async fn init_schema(db: &Surreal<Any>) -> Result<(), StoreError> {
        db.query(
            r#"
            DEFINE TABLE IF NOT EXISTS subscription SCHEMAFULL;
            DEFINE FIELD IF NOT EXISTS url ON subscription TYPE string;
            DEFINE FIELD IF NOT EXISTS feed_url ON subscription TYPE string;
            DEFINE FIELD IF NOT EXISTS method ON subscription TYPE string;
            DEFINE FIELD IF NOT EXISTS subscribed_until ON subscription TYPE int;
            DEFINE FIELD IF NOT EXISTS created ON subscription TYPE int;

            DEFINE INDEX IF NOT EXISTS url_idx ON subscription COLUMNS url UNIQUE;
            DEFINE INDEX IF NOT EXISTS until_idx ON subscription COLUMNS subscribed_until;
        "#,
        )
        .await?
        .check()?;

        Ok(())
    }

    /// Get a subscription by callback URL, active or not
    pub async fn get(&self, callback_url: &str) -> Result<Option<Subscription>, StoreError> {
        let row: Option<SubscriptionRow> = self.db.select((TABLE, callback_url.to_string())).await?;
        row.map(SubscriptionRow::into_subscription).transpose()
    }

    /// Count all stored subscriptions, active or not
    pub async fn count(&self) -> Result<usize, StoreError> {
        let mut result = self.db.query("SELECT count() FROM subscription GROUP ALL").await?;
        let count: Option<usize> = result.take("count")?;
        Ok(count.unwrap_or(0))
    }
}

#[async_trait]
impl SubscriptionStore for SurrealStore {
    async fn upsert(
        &self,
        callback_url: &str,
        feed_url: &str,
        method: &str,
        ttl: TimeDelta,
    ) -> Result<Subscription, StoreError> {
        let now = Utc::now();
        let existing: Option<SubscriptionRow> =
            self.db.select((TABLE, callback_url.to_string())).await?;

        let row = SubscriptionRow {
            url: callback_url.to_string(),
            feed_url: feed_url.to_string(),
            method: method.to_string(),
            subscribed_until: (now + ttl).timestamp_millis(),
            created: existing
                .map(|row| row.created)
                .unwrap_or_else(|| now.timestamp_millis()),
        };

        let stored: Option<SubscriptionRow> = self
            .db
            .upsert((TABLE, callback_url.to_string()))
            .content(row)
            .await?;

        debug!(url = %callback_url, "Upserted subscription");
        stored
            .ok_or_else(|| StoreError::Unavailable(format!("failed to upsert {}", callback_url)))?
            .into_subscription()
    }

    async fn active_subscriptions(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<Subscription>, StoreError> {
        let mut result = self
            .db
            .query("SELECT * FROM subscription WHERE subscribed_until > $now")
            .bind(("now", now.timestamp_millis()))
            .await?;

        let rows: Vec<SubscriptionRow> = result.take(0)?;
        rows.into_iter()
            .map(SubscriptionRow::into_subscription)
            .collect()
    }
}
