//! Interpolated values and the value classifier.
//!
//! [`classify`] is the single place that decides what a valid template
//! value is. Every renderer matches exhaustively over the resulting
//! [`Node`], so adding a kind is a compile error until it is handled
//! everywhere.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::component::Renderable;
use crate::error::{TemplateError, TemplateResult};
use crate::node::{ClientFunction, Kind, Node, Scalar};
use crate::pending::Pending;
use crate::template::Template;

/// A value interpolated into a template.
#[derive(Clone)]
pub enum Value {
    Null,
    Text(String),
    /// Trusted markup emitted without escaping
    Raw(String),
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Date(DateTime<Utc>),
    List(Vec<Value>),
    Template(Template),
    Pending(Pending),
    Renderable(Arc<dyn Renderable>),
    Function(ClientFunction),
    /// Structured data; objects are rejected at classification
    Json(serde_json::Value),
}

impl Value {
    /// Defer to an infallible future.
    pub fn pending<F, V>(future: F) -> Self
    where
        F: Future<Output = V> + Send + 'static,
        V: Into<Value>,
    {
        Self::Pending(Pending::new(future))
    }

    /// Defer to a fallible future; errors render as an error fragment.
    pub fn try_pending<F, V, E>(future: F) -> Self
    where
        F: Future<Output = Result<V, E>> + Send + 'static,
        V: Into<Value>,
        E: fmt::Display,
    {
        Self::Pending(Pending::fallible(future))
    }

    pub fn raw(markup: impl Into<String>) -> Self {
        Self::Raw(markup.into())
    }

    pub fn list<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        Self::List(items.into_iter().map(Into::into).collect())
    }

    pub fn renderable(renderable: impl Renderable + 'static) -> Self {
        Self::Renderable(Arc::new(renderable))
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("Null"),
            Self::Text(s) => f.debug_tuple("Text").field(s).finish(),
            Self::Raw(s) => f.debug_tuple("Raw").field(s).finish(),
            Self::Bool(v) => f.debug_tuple("Bool").field(v).finish(),
            Self::Int(v) => f.debug_tuple("Int").field(v).finish(),
            Self::UInt(v) => f.debug_tuple("UInt").field(v).finish(),
            Self::Float(v) => f.debug_tuple("Float").field(v).finish(),
            Self::Date(d) => f.debug_tuple("Date").field(d).finish(),
            Self::List(items) => f.debug_tuple("List").field(items).finish(),
            Self::Template(t) => f.debug_tuple("Template").field(t).finish(),
            Self::Pending(p) => f.debug_tuple("Pending").field(p).finish(),
            Self::Renderable(_) => f.write_str("Renderable(..)"),
            Self::Function(func) => f.debug_tuple("Function").field(func).finish(),
            Self::Json(v) => f.debug_tuple("Json").field(v).finish(),
        }
    }
}

/// Determine the kind a value classifies to without consuming it.
pub fn kind(value: &Value) -> TemplateResult<Kind> {
    let kind = match value {
        Value::Pending(_) => Kind::PendingAsync,
        Value::Date(_) => Kind::Date,
        Value::List(_) => Kind::ArrayOf,
        Value::Renderable(_) => Kind::Renderable,
        Value::Template(_) => Kind::NestedTemplate,
        Value::Function(_) => Kind::Function,
        Value::Null | Value::Raw(_) => Kind::RawString,
        Value::Text(s) if s.is_empty() => Kind::RawString,
        Value::Text(_) => Kind::EscapedString,
        Value::Bool(_) | Value::Int(_) | Value::UInt(_) => Kind::Scalar,
        Value::Float(v) => {
            check_finite(*v)?;
            Kind::Scalar
        }
        Value::Json(json) => json_kind(json)?,
    };
    Ok(kind)
}

fn json_kind(json: &serde_json::Value) -> TemplateResult<Kind> {
    use serde_json::Value as Json;

    match json {
        Json::Null => Ok(Kind::RawString),
        Json::String(s) if s.is_empty() => Ok(Kind::RawString),
        Json::String(_) => Ok(Kind::EscapedString),
        Json::Bool(_) | Json::Number(_) => Ok(Kind::Scalar),
        Json::Array(_) => Ok(Kind::ArrayOf),
        Json::Object(map) => Err(object_error(map.len())),
    }
}

fn object_error(keys: usize) -> TemplateError {
    TemplateError::unsupported(
        "object",
        format!(
            "plain object with {} key(s) cannot be rendered; interpolate its fields instead",
            keys
        ),
    )
}

fn check_finite(v: f64) -> TemplateResult<()> {
    if v.is_finite() {
        Ok(())
    } else {
        Err(TemplateError::unsupported(
            "float",
            format!("non-finite number {}", v),
        ))
    }
}

/// Classify a value into a single node.
pub fn classify(value: Value) -> TemplateResult<Node> {
    let node = match value {
        Value::Pending(pending) => Node::Pending(pending),
        Value::Date(date) => Node::Date(date),
        Value::List(items) => Node::Array(
            items
                .into_iter()
                .map(classify)
                .collect::<TemplateResult<Vec<_>>>()?,
        ),
        Value::Renderable(renderable) => Node::Renderable(renderable),
        Value::Template(template) => Node::Template(template),
        Value::Function(function) => Node::Function(function),
        Value::Null => Node::Raw(String::new()),
        Value::Raw(markup) => Node::Raw(markup),
        Value::Text(text) if text.is_empty() => Node::Raw(text),
        Value::Text(text) => Node::Escaped(text),
        Value::Bool(v) => Node::Scalar(Scalar::Bool(v)),
        Value::Int(v) => Node::Scalar(Scalar::Int(v)),
        Value::UInt(v) => Node::Scalar(Scalar::UInt(v)),
        Value::Float(v) => {
            check_finite(v)?;
            Node::Scalar(Scalar::Float(v))
        }
        Value::Json(json) => classify_json(json)?,
    };
    Ok(node)
}

fn classify_json(json: serde_json::Value) -> TemplateResult<Node> {
    use serde_json::Value as Json;

    match json {
        Json::Null => Ok(Node::Raw(String::new())),
        Json::Bool(v) => Ok(Node::Scalar(Scalar::Bool(v))),
        Json::Number(n) => {
            if let Some(v) = n.as_i64() {
                Ok(Node::Scalar(Scalar::Int(v)))
            } else if let Some(v) = n.as_u64() {
                Ok(Node::Scalar(Scalar::UInt(v)))
            } else {
                let v = n.as_f64().unwrap_or(f64::NAN);
                check_finite(v)?;
                Ok(Node::Scalar(Scalar::Float(v)))
            }
        }
        Json::String(s) => classify(Value::Text(s)),
        Json::Array(items) => Ok(Node::Array(
            items
                .into_iter()
                .map(classify_json)
                .collect::<TemplateResult<Vec<_>>>()?,
        )),
        Json::Object(map) => Err(object_error(map.len())),
    }
}

/// Classify an interpolation slot, flattening a top-level list one level.
pub(crate) fn classify_into(value: Value, nodes: &mut Vec<Node>) -> TemplateResult<()> {
    match value {
        Value::List(items) => {
            for item in items {
                nodes.push(classify(item)?);
            }
        }
        Value::Json(serde_json::Value::Array(items)) => {
            for item in items {
                nodes.push(classify_json(item)?);
            }
        }
        other => nodes.push(classify(other)?),
    }
    Ok(())
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Self::Null
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<&String> for Value {
    fn from(s: &String) -> Self {
        Self::Text(s.clone())
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(v.into())
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Self::UInt(v.into())
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Self::UInt(v)
    }
}

impl From<usize> for Value {
    fn from(v: usize) -> Self {
        Self::UInt(v as u64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(d: DateTime<Utc>) -> Self {
        Self::Date(d)
    }
}

impl From<Template> for Value {
    fn from(t: Template) -> Self {
        Self::Template(t)
    }
}

impl From<&Template> for Value {
    fn from(t: &Template) -> Self {
        Self::Template(t.clone())
    }
}

impl From<Pending> for Value {
    fn from(p: Pending) -> Self {
        Self::Pending(p)
    }
}

impl From<ClientFunction> for Value {
    fn from(f: ClientFunction) -> Self {
        Self::Function(f)
    }
}

impl From<Arc<dyn Renderable>> for Value {
    fn from(r: Arc<dyn Renderable>) -> Self {
        Self::Renderable(r)
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        Self::Json(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Self::Null)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Self::List(items.into_iter().map(Into::into).collect())
    }
}
