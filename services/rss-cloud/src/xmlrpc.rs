// SPDX-FileCopyrightText: 2026 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Minimal XML-RPC codec.
//!
//! Covers the subset of XML-RPC that RSS cloud traffic uses:
//! - `methodCall` documents (inbound subscribe requests)
//! - `methodResponse` documents with a single param or a fault
//! - scalar strings, `int`/`i4`, `boolean`, arrays and structs
//!
//! Documents are read into a small element tree with `quick-xml` and then
//! walked, which keeps positional checks ("the second param must be an int")
//! straightforward.

use quick_xml::events::Event;
use quick_xml::escape::escape;
use quick_xml::Reader;
use thiserror::Error;

/// XML-RPC decoding errors.
#[derive(Debug, Error)]
pub enum XmlRpcError {
    #[error("XML syntax error: {0}")]
    Syntax(#[from] quick_xml::Error),

    #[error("element name is not valid UTF-8")]
    Encoding,

    #[error("document has no root element")]
    EmptyDocument,

    #[error("document has more than one root element")]
    MultipleRoots,

    #[error("text outside the root element")]
    StrayText,

    #[error("unclosed element <{0}>")]
    Unclosed(String),

    #[error("expected <{expected}> root element, found <{found}>")]
    UnexpectedRoot {
        expected: &'static str,
        found: String,
    },

    #[error("expected exactly one methodName, found {0}")]
    MethodName(usize),

    #[error("unsupported value type <{0}>")]
    UnsupportedType(String),

    #[error("value holds {0} typed elements, expected one")]
    AmbiguousValue(usize),

    #[error("invalid integer {0:?}")]
    InvalidInt(String),

    #[error("invalid boolean {0:?}")]
    InvalidBoolean(String),

    #[error("array value has no <data> element")]
    MissingArrayData,

    #[error("struct member is missing its <{0}>")]
    IncompleteMember(&'static str),

    #[error("response has neither params nor fault")]
    EmptyResponse,

    #[error("fault is missing faultCode or faultString")]
    IncompleteFault,
}

/// A node in the parsed document.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
}

/// An XML element with its children in document order.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub name: String,
    pub children: Vec<Node>,
}

impl Element {
    fn new(name: String) -> Self {
        Self {
            name,
            children: Vec::new(),
        }
    }

    /// Child elements, skipping text.
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(el) => Some(el),
            Node::Text(_) => None,
        })
    }

    /// Child elements with the given name.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> {
        self.elements().filter(move |el| el.name == name)
    }

    /// First child element with the given name.
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.elements().find(|el| el.name == name)
    }

    /// Concatenated text content of the direct children.
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|node| match node {
                Node::Text(t) => Some(t.as_str()),
                Node::Element(_) => None,
            })
            .collect()
    }
}

/// Parse raw bytes into an element tree.
pub fn parse_document(bytes: &[u8]) -> Result<Element, XmlRpcError> {
    let mut reader = Reader::from_reader(bytes);
    let mut buf = Vec::new();
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => {
                stack.push(Element::new(element_name(e.local_name().as_ref())?));
            }
            Event::Empty(e) => {
                let el = Element::new(element_name(e.local_name().as_ref())?);
                attach(&mut stack, &mut root, el)?;
            }
            Event::End(_) => {
                // quick-xml has already matched the end tag against its start
                if let Some(el) = stack.pop() {
                    attach(&mut stack, &mut root, el)?;
                }
            }
            Event::Text(e) => {
                let text = e.unescape()?;
                match stack.last_mut() {
                    Some(parent) => parent.children.push(Node::Text(text.into_owned())),
                    None if text.trim().is_empty() => {}
                    None => return Err(XmlRpcError::StrayText),
                }
            }
            Event::CData(e) => {
                let text = String::from_utf8(e.into_inner().into_owned())
                    .map_err(|_| XmlRpcError::Encoding)?;
                if let Some(parent) = stack.last_mut() {
                    parent.children.push(Node::Text(text));
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if let Some(open) = stack.pop() {
        return Err(XmlRpcError::Unclosed(open.name));
    }
    root.ok_or(XmlRpcError::EmptyDocument)
}

fn element_name(raw: &[u8]) -> Result<String, XmlRpcError> {
    std::str::from_utf8(raw)
        .map(str::to_string)
        .map_err(|_| XmlRpcError::Encoding)
}

fn attach(
    stack: &mut [Element],
    root: &mut Option<Element>,
    el: Element,
) -> Result<(), XmlRpcError> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(Node::Element(el)),
        None if root.is_none() => *root = Some(el),
        None => return Err(XmlRpcError::MultipleRoots),
    }
    Ok(())
}

/// A decoded XML-RPC value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Int(i64),
    Boolean(bool),
    Array(Vec<Value>),
    Struct(Vec<(String, Value)>),
}

impl Value {
    /// Decode a `<value>` element.
    ///
    /// A value without a type element is a string and keeps its text as-is.
    pub fn from_element(value: &Element) -> Result<Self, XmlRpcError> {
        let typed: Vec<&Element> = value.elements().collect();
        let inner = match typed.as_slice() {
            [] => return Ok(Value::String(value.text())),
            [inner] => *inner,
            many => return Err(XmlRpcError::AmbiguousValue(many.len())),
        };

        match inner.name.as_str() {
            "string" => Ok(Value::String(inner.text())),
            "int" | "i4" => {
                let text = inner.text();
                text.trim()
                    .parse()
                    .map(Value::Int)
                    .map_err(|_| XmlRpcError::InvalidInt(text))
            }
            "boolean" => match inner.text().trim() {
                "1" => Ok(Value::Boolean(true)),
                "0" => Ok(Value::Boolean(false)),
                other => Err(XmlRpcError::InvalidBoolean(other.to_string())),
            },
            "array" => {
                let data = inner.child("data").ok_or(XmlRpcError::MissingArrayData)?;
                data.children_named("value")
                    .map(Value::from_element)
                    .collect::<Result<Vec<_>, _>>()
                    .map(Value::Array)
            }
            "struct" => inner
                .children_named("member")
                .map(|member| {
                    let name = member
                        .child("name")
                        .ok_or(XmlRpcError::IncompleteMember("name"))?
                        .text();
                    let value = member
                        .child("value")
                        .ok_or(XmlRpcError::IncompleteMember("value"))?;
                    Ok((name, Value::from_element(value)?))
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Struct),
            other => Err(XmlRpcError::UnsupportedType(other.to_string())),
        }
    }

    /// XML-RPC type name, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::String(_) => "string",
            Value::Int(_) => "int",
            Value::Boolean(_) => "boolean",
            Value::Array(_) => "array",
            Value::Struct(_) => "struct",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    fn member(&self, name: &str) -> Option<&Value> {
        match self {
            Value::Struct(members) => members.iter().find(|(n, _)| n == name).map(|(_, v)| v),
            _ => None,
        }
    }

    fn write(&self, out: &mut String) {
        out.push_str("<value>");
        match self {
            Value::String(s) => {
                out.push_str("<string>");
                out.push_str(&escape(s.as_str()));
                out.push_str("</string>");
            }
            Value::Int(i) => out.push_str(&format!("<int>{}</int>", i)),
            Value::Boolean(b) => out.push_str(&format!("<boolean>{}</boolean>", u8::from(*b))),
            Value::Array(items) => {
                out.push_str("<array><data>");
                for item in items {
                    item.write(out);
                }
                out.push_str("</data></array>");
            }
            Value::Struct(members) => {
                out.push_str("<struct>");
                for (name, value) in members {
                    out.push_str("<member><name>");
                    out.push_str(&escape(name.as_str()));
                    out.push_str("</name>");
                    value.write(out);
                    out.push_str("</member>");
                }
                out.push_str("</struct>");
            }
        }
        out.push_str("</value>");
    }
}

/// A parsed `methodCall` document.
///
/// Params are left undecoded so callers can report errors by position.
#[derive(Debug, Clone)]
pub struct MethodCall {
    pub method_name: String,
    pub params: Vec<Element>,
}

/// Parse a `methodCall` document.
pub fn parse_method_call(bytes: &[u8]) -> Result<MethodCall, XmlRpcError> {
    let root = parse_document(bytes)?;
    if root.name != "methodCall" {
        return Err(XmlRpcError::UnexpectedRoot {
            expected: "methodCall",
            found: root.name,
        });
    }

    let names: Vec<&Element> = root.children_named("methodName").collect();
    let method_name = match names.as_slice() {
        [name] => name.text(),
        other => return Err(XmlRpcError::MethodName(other.len())),
    };

    let params = root
        .children_named("params")
        .flat_map(|params| params.children_named("param"))
        .flat_map(|param| param.children_named("value"))
        .cloned()
        .collect();

    Ok(MethodCall {
        method_name,
        params,
    })
}

/// A fault returned in a `methodResponse`.
#[derive(Debug, Clone, PartialEq)]
pub struct Fault {
    pub code: i64,
    pub message: String,
}

/// Parse a `methodResponse` document into its single param value or its fault.
pub fn parse_method_response(bytes: &[u8]) -> Result<Result<Value, Fault>, XmlRpcError> {
    let root = parse_document(bytes)?;
    if root.name != "methodResponse" {
        return Err(XmlRpcError::UnexpectedRoot {
            expected: "methodResponse",
            found: root.name,
        });
    }

    if let Some(fault) = root.child("fault") {
        let value = fault.child("value").ok_or(XmlRpcError::IncompleteFault)?;
        let value = Value::from_element(value)?;
        let code = match value.member("faultCode") {
            Some(Value::Int(code)) => *code,
            _ => return Err(XmlRpcError::IncompleteFault),
        };
        let message = value
            .member("faultString")
            .and_then(Value::as_str)
            .ok_or(XmlRpcError::IncompleteFault)?
            .to_string();
        return Ok(Err(Fault { code, message }));
    }

    let value = root
        .child("params")
        .and_then(|params| params.child("param"))
        .and_then(|param| param.child("value"))
        .ok_or(XmlRpcError::EmptyResponse)?;
    Ok(Ok(Value::from_element(value)?))
}

const XML_DECL: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

/// Encode a `methodCall` document.
pub fn encode_method_call(method_name: &str, params: &[Value]) -> String {
    let mut out = String::from(XML_DECL);
    out.push_str("<methodCall><methodName>");
    out.push_str(&escape(method_name));
    out.push_str("</methodName><params>");
    for param in params {
        out.push_str("<param>");
        param.write(&mut out);
        out.push_str("</param>");
    }
    out.push_str("</params></methodCall>");
    out
}

/// Encode a successful `methodResponse` with a single param.
pub fn encode_response(value: &Value) -> String {
    let mut out = String::from(XML_DECL);
    out.push_str("<methodResponse><params><param>");
    value.write(&mut out);
    out.push_str("</param></params></methodResponse>");
    out
}

/// Encode a fault `methodResponse`.
pub fn encode_fault(code: i64, message: &str) -> String {
    let fault = Value::Struct(vec![
        ("faultCode".to_string(), Value::Int(code)),
        ("faultString".to_string(), Value::String(message.to_string())),
    ]);
    let mut out = String::from(XML_DECL);
    out.push_str("<methodResponse><fault>");
    fault.write(&mut out);
    out.push_str("</fault></methodResponse>");
    out
}
