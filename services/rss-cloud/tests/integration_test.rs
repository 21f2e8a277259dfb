// SPDX-FileCopyrightText: 2026 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Integration tests for the RSS cloud HTTP endpoints.

mod harness;

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    extract::connect_info::MockConnectInfo,
    http::{header, Request, StatusCode},
    Router,
};
use chrono::{DateTime, TimeDelta, Utc};
use harness::generators::{Subscribe, FEED_URL};
use harness::receiver::Receiver;
use rss_cloud::{
    config::{Config, FeedConfig},
    handlers::{router, AppState},
    metrics::Metrics,
    notifier::Notifier,
    responder::{CloudResponder, FAULT_CODE},
    store::{MemoryStore, StoreError, Subscription, SubscriptionStore, SUBSCRIPTION_TTL},
    validator::CloudValidator,
    xmlrpc::{parse_method_response, Fault, Value},
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceExt;

const SUBSCRIBER: ([u8; 4], u16) = ([198, 51, 100, 20], 40000);
const CALLBACK_URL: &str = "http://198.51.100.20:5337/RPC2";

fn app_with(store: Arc<dyn SubscriptionStore>, peer: SocketAddr) -> Router {
    let config = Config {
        feeds: FeedConfig {
            urls: vec![FEED_URL.to_string()],
        },
        ..Default::default()
    };
    let metrics = Arc::new(Metrics::new().unwrap());
    let notifier = Arc::new(Notifier::new(store.clone(), &config.notify, metrics.clone()).unwrap());
    let responder = CloudResponder::new(CloudValidator::new(&config.feeds), store, metrics.clone());

    let state = Arc::new(AppState {
        responder,
        notifier,
        metrics,
        config,
    });
    router(state).layer(MockConnectInfo(peer))
}

fn app(store: Arc<dyn SubscriptionStore>) -> Router {
    app_with(store, SocketAddr::from(SUBSCRIBER))
}

async fn post_xml(app: &Router, body: String) -> (StatusCode, Option<String>, String) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/rssCloud")
                .header(header::CONTENT_TYPE, "text/xml")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .map(|v| v.to_str().unwrap().to_string());
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, content_type, String::from_utf8(bytes.to_vec()).unwrap())
}

fn expect_fault(body: &str) -> Fault {
    match parse_method_response(body.as_bytes()).unwrap() {
        Err(fault) => fault,
        Ok(value) => panic!("Expected fault, got {:?}", value),
    }
}

struct BrokenStore;

#[async_trait]
impl SubscriptionStore for BrokenStore {
    async fn upsert(
        &self,
        _: &str,
        _: &str,
        _: &str,
        _: TimeDelta,
    ) -> Result<Subscription, StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }

    async fn active_subscriptions(
        &self,
        _: DateTime<Utc>,
    ) -> Result<Vec<Subscription>, StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }
}

#[tokio::test]
async fn test_subscribe_success() {
    let store = Arc::new(MemoryStore::new());
    let app = app(store.clone());

    let (status, content_type, body) = post_xml(&app, Subscribe::default().body()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("text/xml"));
    assert_eq!(parse_method_response(body.as_bytes()).unwrap(), Ok(Value::Boolean(true)));

    let stored = store.get(CALLBACK_URL).await.unwrap();
    assert_eq!(stored.feed_url, FEED_URL);
    assert_eq!(stored.method, "river.feedUpdated");
    assert!(stored.subscribed_until > Utc::now() + TimeDelta::hours(24));
}

#[tokio::test]
async fn test_resubscribe_replaces_record() {
    let store = Arc::new(MemoryStore::new());
    let app = app(store.clone());

    post_xml(&app, Subscribe::default().body()).await;
    post_xml(
        &app,
        Subscribe {
            notify_method: "myCloud.rssPleaseNotify".into(),
            ..Default::default()
        }
        .body(),
    )
    .await;

    assert_eq!(store.len().await, 1);
    assert_eq!(store.get(CALLBACK_URL).await.unwrap().method, "myCloud.rssPleaseNotify");
}

#[tokio::test]
async fn test_bad_transport_faults() {
    let store = Arc::new(MemoryStore::new());
    let app = app(store.clone());

    let (status, _, body) = post_xml(
        &app,
        Subscribe {
            transport: "rest".into(),
            ..Default::default()
        }
        .body(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let fault = expect_fault(&body);
    assert_eq!(fault.code, FAULT_CODE);
    assert!(fault.message.contains("XML-RPC"));
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn test_method_mismatch_faults() {
    let store = Arc::new(MemoryStore::new());
    let app = app(store.clone());

    let (status, _, body) = post_xml(
        &app,
        Subscribe {
            method: "cloud.ping".into(),
            ..Default::default()
        }
        .body(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let fault = expect_fault(&body);
    assert_eq!(fault.code, FAULT_CODE);
    assert!(fault.message.contains("cloud.ping"));
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn test_feed_mismatch_faults() {
    let store = Arc::new(MemoryStore::new());
    let app = app(store.clone());

    let (_, _, body) = post_xml(
        &app,
        Subscribe {
            feeds: vec!["http://someone-else.example.net/rss".into()],
            ..Default::default()
        }
        .body(),
    )
    .await;

    let fault = expect_fault(&body);
    assert_eq!(fault.code, FAULT_CODE);
    assert!(fault.message.contains("someone-else.example.net"));
    assert!(fault.message.contains("not a feed managed here"));
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn test_malformed_body_faults() {
    let store = Arc::new(MemoryStore::new());
    let app = app(store.clone());

    let body = "<methodCall><methodName>cloud.notify</methodName></methodCall>";
    let (status, content_type, body) = post_xml(&app, body.into()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("text/xml"));
    let fault = expect_fault(&body);
    assert_eq!(fault.code, FAULT_CODE);
    assert!(fault.message.contains("0 params"));
}

#[tokio::test]
async fn test_get_is_method_not_allowed() {
    let app = app(Arc::new(MemoryStore::new()));

    let response = app
        .oneshot(Request::builder().uri("/rssCloud").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(response.headers().get(header::ALLOW).unwrap(), "POST");
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&body[..], b"POST is required");
}

#[tokio::test]
async fn test_storage_failure_is_500() {
    let app = app(Arc::new(BrokenStore));

    let (status, content_type, body) = post_xml(&app, Subscribe::default().body()).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_ne!(content_type.as_deref(), Some("text/xml"));
    assert!(!body.contains("<fault>"));
}

#[tokio::test]
async fn test_feed_changed_notifies_subscribers() {
    let receiver = Receiver::start().await;
    let store = Arc::new(MemoryStore::new());
    store
        .upsert(&receiver.url("/RPC2"), FEED_URL, "river.feedUpdated", SUBSCRIPTION_TTL)
        .await
        .unwrap();

    let app = app_with(store, SocketAddr::from(([127, 0, 0, 1], 50000)));
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/feedChanged")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(format!(r#"{{"feed_url": "{}"}}"#, FEED_URL)))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let calls = receiver.wait_for_calls(1).await;
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].method_name, "river.feedUpdated");
    assert_eq!(calls[0].params, vec![Value::String(FEED_URL.to_string())]);
}

#[tokio::test]
async fn test_feed_changed_rules() {
    let store: Arc<dyn SubscriptionStore> = Arc::new(MemoryStore::new());
    let request = |feed: &str| {
        Request::builder()
            .method("POST")
            .uri("/feedChanged")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(format!(r#"{{"feed_url": "{}"}}"#, feed)))
            .unwrap()
    };

    // Remote peers may not trigger broadcasts
    let response = app(store.clone()).oneshot(request(FEED_URL)).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Unknown feeds are refused
    let local = app_with(store, SocketAddr::from(([127, 0, 0, 1], 50000)));
    let response = local.oneshot(request("http://elsewhere.example/rss")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_health_and_metrics() {
    let app = app(Arc::new(MemoryStore::new()));
    post_xml(&app, Subscribe::default().body()).await;

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.contains(r#"rsscloud_subscribe_requests_total{outcome="accepted"} 1"#));
}
