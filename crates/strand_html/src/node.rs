//! Classified template content.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};

use crate::component::Renderable;
use crate::pending::Pending;
use crate::template::Template;

/// The closed set of content kinds a template can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    RawString,
    EscapedString,
    ArrayOf,
    NestedTemplate,
    PendingAsync,
    Renderable,
    Function,
    Date,
    Scalar,
}

impl Kind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RawString => "raw_string",
            Self::EscapedString => "escaped_string",
            Self::ArrayOf => "array_of",
            Self::NestedTemplate => "nested_template",
            Self::PendingAsync => "pending_async",
            Self::Renderable => "renderable",
            Self::Function => "function",
            Self::Date => "date",
            Self::Scalar => "scalar",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A non-textual primitive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scalar {
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{}", v),
            Self::Int(v) => write!(f, "{}", v),
            Self::UInt(v) => write!(f, "{}", v),
            Self::Float(v) => write!(f, "{}", v),
        }
    }
}

/// Client-side function source.
///
/// Only carried through to the markup for client code to pick up; the
/// server never evaluates it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientFunction {
    source: String,
}

impl ClientFunction {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }
}

/// One unit of template content, tagged with its kind.
#[derive(Clone)]
pub enum Node {
    Raw(String),
    Escaped(String),
    Array(Vec<Node>),
    Template(Template),
    Pending(Pending),
    Renderable(Arc<dyn Renderable>),
    Function(ClientFunction),
    Date(DateTime<Utc>),
    Scalar(Scalar),
}

impl Node {
    pub fn kind(&self) -> Kind {
        match self {
            Self::Raw(_) => Kind::RawString,
            Self::Escaped(_) => Kind::EscapedString,
            Self::Array(_) => Kind::ArrayOf,
            Self::Template(_) => Kind::NestedTemplate,
            Self::Pending(_) => Kind::PendingAsync,
            Self::Renderable(_) => Kind::Renderable,
            Self::Function(_) => Kind::Function,
            Self::Date(_) => Kind::Date,
            Self::Scalar(_) => Kind::Scalar,
        }
    }

    /// Count pending nodes reachable without calling into renderables.
    pub fn pending_count(&self) -> usize {
        match self {
            Self::Pending(_) => 1,
            Self::Array(nodes) => nodes.iter().map(Node::pending_count).sum(),
            Self::Template(template) => template.pending_count(),
            _ => 0,
        }
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Raw(s) => f.debug_tuple("Raw").field(s).finish(),
            Self::Escaped(s) => f.debug_tuple("Escaped").field(s).finish(),
            Self::Array(nodes) => f.debug_tuple("Array").field(nodes).finish(),
            Self::Template(t) => f.debug_tuple("Template").field(t).finish(),
            Self::Pending(p) => f.debug_tuple("Pending").field(p).finish(),
            Self::Renderable(_) => f.write_str("Renderable(..)"),
            Self::Function(func) => f.debug_tuple("Function").field(func).finish(),
            Self::Date(d) => f.debug_tuple("Date").field(d).finish(),
            Self::Scalar(s) => f.debug_tuple("Scalar").field(s).finish(),
        }
    }
}

/// ISO-8601 UTC with millisecond precision, e.g. `2024-01-02T03:04:05.000Z`.
pub fn format_date(date: &DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Millis, true)
}
