// SPDX-FileCopyrightText: 2026 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Decoding of inbound RSS cloud subscribe requests.
//!
//! The wire shape is fixed by the RSS cloud interface: a `methodCall` with
//! five positional params.
//!
//! | # | type          | meaning                          |
//! |---|---------------|----------------------------------|
//! | 1 | string        | method to call back on notify    |
//! | 2 | int / i4      | callback port                    |
//! | 3 | string        | callback path                    |
//! | 4 | string        | protocol, must be `xml-rpc`      |
//! | 5 | array(string) | feed URLs, only the first is read |

use crate::xmlrpc::{self, Element, Value, XmlRpcError};
use thiserror::Error;
use tracing::debug;

const EXPECTED_PARAMS: usize = 5;
const ORDINALS: [&str; EXPECTED_PARAMS] = ["first", "second", "third", "fourth", "fifth"];

/// The request could not be decoded into a subscribe request.
#[derive(Debug, Error)]
pub enum MalformedRequest {
    #[error("Could not read cloud request: {0}")]
    Document(#[from] XmlRpcError),

    #[error("Could not unpack cloud request with {0} params")]
    ParamCount(usize),

    #[error("Could not unpack cloud request with {position} param {problem}")]
    Param {
        position: &'static str,
        problem: String,
    },
}

/// A decoded subscribe request. Consumed once by the validator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscribeRequest {
    /// `methodName` of the inbound call, expected to be `cloud.notify`
    pub protocol_method: String,
    /// Method the subscriber wants invoked on notify
    pub callback_method: String,
    pub callback_port: u16,
    pub callback_path: String,
    pub transport_is_xml_rpc: bool,
    pub feed_url: String,
}

impl SubscribeRequest {
    /// Decode raw `methodCall` bytes.
    pub fn parse(body: &[u8]) -> Result<Self, MalformedRequest> {
        let call = xmlrpc::parse_method_call(body)?;

        let params: &[Element; EXPECTED_PARAMS] = call
            .params
            .as_slice()
            .try_into()
            .map_err(|_| MalformedRequest::ParamCount(call.params.len()))?;

        let callback_method = text_param(params, 0)?;

        let callback_port = match decode(params, 1)? {
            Value::Int(port) => u16::try_from(port)
                .ok()
                .filter(|p| *p != 0)
                .ok_or_else(|| param_error(1, format!("port {} out of range", port)))?,
            other => {
                return Err(param_error(
                    1,
                    format!("a {} element, not int or i4", other.type_name()),
                ))
            }
        };

        let callback_path = text_param(params, 2)?;

        let transport_is_xml_rpc = text_param(params, 3)?.trim() == "xml-rpc";

        let feed_url = match decode(params, 4)? {
            Value::Array(items) => items
                .into_iter()
                .find_map(|item| match item {
                    Value::String(s) => Some(s),
                    _ => None,
                })
                .ok_or_else(|| param_error(4, "containing no data values".to_string()))?,
            other => {
                return Err(param_error(
                    4,
                    format!("a {} element, not array", other.type_name()),
                ))
            }
        };

        let request = Self {
            protocol_method: call.method_name,
            callback_method,
            callback_port,
            callback_path,
            transport_is_xml_rpc,
            feed_url,
        };
        debug!(?request, "Unpacked cloud request");
        Ok(request)
    }
}

fn param_error(index: usize, problem: String) -> MalformedRequest {
    MalformedRequest::Param {
        position: ORDINALS[index],
        problem,
    }
}

fn decode(params: &[Element; EXPECTED_PARAMS], index: usize) -> Result<Value, MalformedRequest> {
    Value::from_element(&params[index]).map_err(|e| param_error(index, e.to_string()))
}

fn text_param(
    params: &[Element; EXPECTED_PARAMS],
    index: usize,
) -> Result<String, MalformedRequest> {
    match decode(params, index)? {
        Value::String(s) => Ok(s),
        other => Err(param_error(index, format!("a {} element, not text", other.type_name()))),
    }
}
