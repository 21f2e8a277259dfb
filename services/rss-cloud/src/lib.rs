// SPDX-FileCopyrightText: 2026 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! RSS Cloud
//!
//! This crate implements the RSS cloud notification protocol for feeds
//! published by indieweb2-bastion:
//!
//! - XML-RPC `cloud.notify` subscribe requests
//! - Callback URL derivation from the subscriber's address, port and path
//! - A subscription registry with 25-hour soft expiry
//! - Fire-and-forget feed update callbacks, one isolated task per subscriber

pub mod config;
pub mod db;
pub mod handlers;
pub mod metrics;
pub mod notifier;
pub mod request;
pub mod responder;
pub mod store;
pub mod validator;
pub mod xmlrpc;

pub use config::Config;
pub use db::SurrealStore;
pub use notifier::{DeliveryError, Dispatch, Notifier};
pub use request::{MalformedRequest, SubscribeRequest};
pub use responder::{CloudResponder, CloudResponse};
pub use store::{MemoryStore, StoreError, Subscription, SubscriptionStore, SUBSCRIPTION_TTL};
pub use validator::{CloudValidator, ValidationError, ValidationResult};
