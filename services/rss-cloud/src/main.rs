// SPDX-FileCopyrightText: 2026 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! RSS Cloud Service
//!
//! Accepts RSS cloud subscriptions over XML-RPC on `/rssCloud` and calls
//! subscribers back when a feed changes.
//!
//! ## Usage
//!
//! Feed readers register with a `cloud.notify` call. The publishing side
//! reports a changed feed with `POST /feedChanged` from loopback:
//!
//! ```text
//! curl -X POST localhost:8080/feedChanged \
//!      -H 'content-type: application/json' \
//!      -d '{"feed_url": "http://localhost:8080/rss"}'
//! ```
//!
//! ## Configuration
//!
//! Configuration is loaded from environment variables (and `.env`):
//!
//! - `BIND_ADDR`: Server bind address (default: 0.0.0.0:8080)
//! - `FEED_URLS`: Comma separated feed URLs served here (default: http://localhost:8080/rss)
//! - `DATABASE_URL`: SurrealDB endpoint (default: mem://)
//! - `NOTIFY_TIMEOUT_SECS`: Per-callback timeout (default: 30)
//! - `METRICS_ENABLED` / `METRICS_PATH`: Prometheus endpoint (default: true, /metrics)

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use rss_cloud::{
    config::{Config, FeedConfig, MetricsConfig, NotifyConfig, StorageConfig},
    db::SurrealStore,
    handlers::{router, AppState},
    metrics::Metrics,
    notifier::Notifier,
    responder::CloudResponder,
    store::SubscriptionStore,
    validator::CloudValidator,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().json())
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = load_config();
    info!(
        bind_addr = %config.bind_addr,
        feeds = ?config.feeds.urls,
        database_url = %config.storage.database_url,
        notify_timeout_secs = config.notify.timeout_secs,
        "Starting RSS cloud service"
    );

    // Initialize storage
    let store: Arc<dyn SubscriptionStore> =
        Arc::new(SurrealStore::connect(&config.storage.database_url).await?);
    info!("Connected to SurrealDB");

    // Create application state
    let metrics = Arc::new(Metrics::new()?);
    let notifier = Arc::new(Notifier::new(store.clone(), &config.notify, metrics.clone())?);
    let responder = CloudResponder::new(CloudValidator::new(&config.feeds), store, metrics.clone());

    let state = Arc::new(AppState {
        responder,
        notifier,
        metrics,
        config: config.clone(),
    });

    let app = router(state);

    // Start server
    let addr: SocketAddr = config.bind_addr.parse()?;
    let listener = TcpListener::bind(addr).await?;
    info!(addr = %addr, "Server listening");

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await?;

    Ok(())
}

/// Load configuration from environment variables.
fn load_config() -> Config {
    Config {
        bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string()),
        feeds: std::env::var("FEED_URLS")
            .map(|v| FeedConfig::from_list(&v))
            .unwrap_or_default(),
        storage: StorageConfig {
            database_url: std::env::var("DATABASE_URL").unwrap_or_else(|_| "mem://".to_string()),
        },
        notify: NotifyConfig {
            timeout_secs: std::env::var("NOTIFY_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(30),
            ..Default::default()
        },
        metrics: MetricsConfig {
            enabled: std::env::var("METRICS_ENABLED")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(true),
            path: std::env::var("METRICS_PATH").unwrap_or_else(|_| "/metrics".to_string()),
        },
    }
}
