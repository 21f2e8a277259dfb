// SPDX-FileCopyrightText: 2026 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Local XML-RPC endpoint standing in for a feed reader.

use axum::{
    body::Bytes,
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use rss_cloud::xmlrpc::{encode_fault, encode_response, parse_method_call, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::Mutex;

/// How the receiver answers callbacks.
#[derive(Debug, Clone)]
pub enum Reply {
    Success,
    Fault,
    Status(StatusCode),
    Garbage,
    Hang(Duration),
}

/// A callback as received.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub path: String,
    pub method_name: String,
    pub params: Vec<Value>,
}

struct ReceiverState {
    reply: Reply,
    calls: Mutex<Vec<Call>>,
}

pub struct Receiver {
    pub addr: SocketAddr,
    state: Arc<ReceiverState>,
}

impl Receiver {
    pub async fn start() -> Self {
        Self::start_with(Reply::Success).await
    }

    pub async fn start_with(reply: Reply) -> Self {
        let state = Arc::new(ReceiverState {
            reply,
            calls: Mutex::new(Vec::new()),
        });

        let app = Router::new()
            .route("/*path", post(record))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, state }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn calls(&self) -> Vec<Call> {
        self.state.calls.lock().await.clone()
    }

    /// Wait until at least `count` calls arrived, or give up after 5s.
    pub async fn wait_for_calls(&self, count: usize) -> Vec<Call> {
        for _ in 0..100 {
            let calls = self.calls().await;
            if calls.len() >= count {
                return calls;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        self.calls().await
    }
}

async fn record(
    State(state): State<Arc<ReceiverState>>,
    uri: axum::http::Uri,
    body: Bytes,
) -> Response {
    let call = parse_method_call(&body).unwrap();
    let params = call
        .params
        .iter()
        .map(|p| Value::from_element(p).unwrap())
        .collect();
    state.calls.lock().await.push(Call {
        path: uri.path().to_string(),
        method_name: call.method_name,
        params,
    });

    match &state.reply {
        Reply::Success => xml(encode_response(&Value::Boolean(true))),
        Reply::Fault => xml(encode_fault(1, "no thanks")),
        Reply::Status(status) => (*status, "nope").into_response(),
        Reply::Garbage => xml("<html>not xml-rpc</html>".to_string()),
        Reply::Hang(delay) => {
            tokio::time::sleep(*delay).await;
            xml(encode_response(&Value::Boolean(true)))
        }
    }
}

fn xml(body: String) -> Response {
    (StatusCode::OK, [(header::CONTENT_TYPE, "text/xml")], body).into_response()
}

/// A localhost port with nothing listening on it.
pub async fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}
