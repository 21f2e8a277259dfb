// SPDX-FileCopyrightText: 2026 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Test harness for the RSS cloud service.
//!
//! Request body builders and a local XML-RPC endpoint that records the
//! callbacks it receives.

#![allow(dead_code)]

pub mod generators;
pub mod receiver;
