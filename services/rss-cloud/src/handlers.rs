// SPDX-FileCopyrightText: 2026 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! HTTP handlers for the RSS cloud service.

use crate::config::Config;
use crate::metrics::Metrics;
use crate::notifier::Notifier;
use crate::responder::CloudResponder;
use axum::{
    body::Bytes,
    extract::{ConnectInfo, State},
    http::{header, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{any, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

/// Shared application state.
pub struct AppState {
    pub responder: CloudResponder,
    pub notifier: Arc<Notifier>,
    pub metrics: Arc<Metrics>,
    pub config: Config,
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: &'static str,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

/// Feed change notice from the publishing side.
#[derive(Debug, Deserialize)]
pub struct FeedChangedRequest {
    pub feed_url: String,
}

/// Feed change acknowledgement.
#[derive(Debug, Serialize)]
pub struct FeedChangedResponse {
    pub accepted: bool,
    pub feed_url: String,
}

/// Build the service router.
pub fn router(state: Arc<AppState>) -> Router {
    let mut router = Router::new()
        .route("/health", get(health))
        .route("/healthz", get(health))
        .route("/rssCloud", any(rss_cloud))
        .route("/feedChanged", post(feed_changed));

    if state.config.metrics.enabled {
        router = router.route(&state.config.metrics.path, get(metrics));
    }

    router.layer(TraceLayer::new_for_http()).with_state(state)
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "rss-cloud",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// RSS cloud subscribe endpoint.
pub async fn rss_cloud(
    State(state): State<Arc<AppState>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    method: Method,
    body: Bytes,
) -> Response {
    debug!(remote = %addr, %method, len = body.len(), "RSS cloud request");
    state
        .responder
        .respond(&method, addr.ip(), &body)
        .await
        .into_response()
}

/// Schedule a broadcast for a changed feed.
///
/// Only loopback peers may call this; the publisher runs alongside.
pub async fn feed_changed(
    State(state): State<Arc<AppState>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Json(req): Json<FeedChangedRequest>,
) -> Response {
    if !addr.ip().to_canonical().is_loopback() {
        warn!(remote = %addr, "Feed change notice from non-loopback peer");
        return (
            StatusCode::FORBIDDEN,
            Json(ErrorResponse {
                error: "Feed change notices are accepted from loopback only".to_string(),
                code: "FORBIDDEN",
            }),
        )
            .into_response();
    }

    let feed_url = match state.responder.validator().served_feed(&req.feed_url) {
        Some(feed) => feed.to_string(),
        None => {
            info!(feed_url = %req.feed_url, "Feed change notice for unknown feed");
            return (
                StatusCode::NOT_FOUND,
                Json(ErrorResponse {
                    error: format!("RSS URL {} is not a feed managed here", req.feed_url),
                    code: "UNKNOWN_FEED",
                }),
            )
                .into_response();
        }
    };

    state.notifier.feed_changed(feed_url.clone());

    (
        StatusCode::ACCEPTED,
        Json(FeedChangedResponse {
            accepted: true,
            feed_url,
        }),
    )
        .into_response()
}

/// Prometheus metrics endpoint.
pub async fn metrics(State(state): State<Arc<AppState>>) -> Response {
    match state.metrics.render() {
        Ok(text) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            text,
        )
            .into_response(),
        Err(e) => {
            warn!(error = %e, "Could not render metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
