// SPDX-FileCopyrightText: 2026 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Request/response cycle for the RSS cloud endpoint.
//!
//! `POST` body → parse → validate → upsert → XML-RPC reply.
//!
//! Protocol mistakes come back as XML-RPC faults (code 4) over HTTP 200.
//! A non-POST request is answered 405 in plain text, and a storage failure
//! as a plain 500, since neither is a protocol-level error.

use crate::metrics::{Metrics, ACCEPTED, ERROR, FAULT};
use crate::request::SubscribeRequest;
use crate::store::{SubscriptionStore, SUBSCRIPTION_TTL};
use crate::validator::{CloudValidator, ValidationResult};
use crate::xmlrpc::{encode_fault, encode_response, Value};
use axum::http::{header, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use std::net::IpAddr;
use std::sync::Arc;
use tracing::{error, info};

/// Fault code used for every protocol-level rejection.
pub const FAULT_CODE: i64 = 4;

/// Terminal outcome of one subscribe request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloudResponse {
    /// The request was not a POST
    MethodNotAllowed,
    /// Subscription stored
    Success,
    /// XML-RPC fault
    Fault { code: i64, message: String },
    /// Storage failed
    InternalError(String),
}

impl IntoResponse for CloudResponse {
    fn into_response(self) -> Response {
        match self {
            CloudResponse::MethodNotAllowed => (
                StatusCode::METHOD_NOT_ALLOWED,
                [(header::ALLOW, "POST")],
                "POST is required",
            )
                .into_response(),
            CloudResponse::Success => xml(encode_response(&Value::Boolean(true))),
            CloudResponse::Fault { code, message } => xml(encode_fault(code, &message)),
            CloudResponse::InternalError(message) => {
                (StatusCode::INTERNAL_SERVER_ERROR, message).into_response()
            }
        }
    }
}

fn xml(body: String) -> Response {
    (StatusCode::OK, [(header::CONTENT_TYPE, "text/xml")], body).into_response()
}

/// Handles subscribe requests against a store.
pub struct CloudResponder {
    validator: CloudValidator,
    store: Arc<dyn SubscriptionStore>,
    metrics: Arc<Metrics>,
}

impl CloudResponder {
    pub fn new(
        validator: CloudValidator,
        store: Arc<dyn SubscriptionStore>,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            validator,
            store,
            metrics,
        }
    }

    pub fn validator(&self) -> &CloudValidator {
        &self.validator
    }

    /// Run one request from `remote` through to its response.
    pub async fn respond(&self, method: &Method, remote: IpAddr, body: &[u8]) -> CloudResponse {
        if *method != Method::POST {
            return CloudResponse::MethodNotAllowed;
        }

        let request = match SubscribeRequest::parse(body) {
            Ok(request) => request,
            Err(e) => return self.fault(remote, e.to_string()),
        };

        let target = match self.validator.validate(&request, remote) {
            ValidationResult::Accepted(target) => target,
            ValidationResult::Rejected(e) => return self.fault(remote, e.to_string()),
        };

        match self
            .store
            .upsert(
                &target.callback_url,
                &target.feed_url,
                &target.notify_method,
                SUBSCRIPTION_TTL,
            )
            .await
        {
            Ok(subscription) => {
                info!(
                    %remote,
                    url = %subscription.url,
                    method = %subscription.method,
                    feed_url = %subscription.feed_url,
                    until = %subscription.subscribed_until,
                    "Accepted RSS cloud subscription"
                );
                self.metrics.record_subscribe(ACCEPTED);
                CloudResponse::Success
            }
            Err(e) => {
                error!(
                    url = %target.callback_url,
                    error = %e,
                    "Error saving RSS cloud subscription"
                );
                self.metrics.record_subscribe(ERROR);
                CloudResponse::InternalError(format!(
                    "error saving rsscloud for URL {}",
                    target.callback_url
                ))
            }
        }
    }

    fn fault(&self, remote: IpAddr, message: String) -> CloudResponse {
        info!(%remote, error = %message, "Error serving RSS cloud request");
        self.metrics.record_subscribe(FAULT);
        CloudResponse::Fault {
            code: FAULT_CODE,
            message,
        }
    }
}
