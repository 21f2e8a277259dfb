// SPDX-FileCopyrightText: 2026 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Subscribe request builders.

use rss_cloud::xmlrpc::{encode_method_call, Value};

pub const FEED_URL: &str = "http://blog.example.org/rss";

/// Parameters of a subscribe call.
#[derive(Debug, Clone)]
pub struct Subscribe {
    pub method: String,
    pub notify_method: String,
    pub port: i64,
    pub path: String,
    pub transport: String,
    pub feeds: Vec<String>,
}

impl Default for Subscribe {
    fn default() -> Self {
        Self {
            method: "cloud.notify".to_string(),
            notify_method: "river.feedUpdated".to_string(),
            port: 5337,
            path: "/RPC2".to_string(),
            transport: "xml-rpc".to_string(),
            feeds: vec![FEED_URL.to_string()],
        }
    }
}

impl Subscribe {
    pub fn body(&self) -> String {
        encode_method_call(
            &self.method,
            &[
                Value::String(self.notify_method.clone()),
                Value::Int(self.port),
                Value::String(self.path.clone()),
                Value::String(self.transport.clone()),
                Value::Array(self.feeds.iter().cloned().map(Value::String).collect()),
            ],
        )
    }
}
