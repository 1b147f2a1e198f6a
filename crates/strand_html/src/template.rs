//! Templates and the template builder.

use std::fmt;
use std::sync::Arc;

use crate::error::{TemplateError, TemplateResult};
use crate::node::Node;
use crate::value::{classify_into, Value};

/// An immutable, ordered sequence of classified nodes.
///
/// Cloning is cheap; a template can be interpolated into any number of
/// parents and is spliced into each one when rendered.
#[derive(Clone)]
pub struct Template {
    nodes: Arc<[Node]>,
}

impl Template {
    pub fn from_nodes(nodes: Vec<Node>) -> Self {
        Self {
            nodes: nodes.into(),
        }
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of pending nodes reachable through arrays and nested templates.
    ///
    /// Renderables are not invoked, so pending values they produce are not
    /// counted.
    pub fn pending_count(&self) -> usize {
        self.nodes.iter().map(Node::pending_count).sum()
    }
}

impl Default for Template {
    fn default() -> Self {
        Self::from_nodes(Vec::new())
    }
}

impl fmt::Debug for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.nodes.iter()).finish()
    }
}

/// Build a template from literal segments and the values between them.
///
/// `segments` must hold exactly one more entry than `values`. Segments are
/// emitted as trusted markup; values are classified and escaped according to
/// their kind.
pub fn build<S: AsRef<str>>(segments: &[S], values: Vec<Value>) -> TemplateResult<Template> {
    if segments.len() != values.len() + 1 {
        return Err(TemplateError::SegmentMismatch {
            segments: segments.len(),
            values: values.len(),
        });
    }

    let mut nodes = Vec::with_capacity(segments.len() + values.len());
    let mut values = values.into_iter();
    for (i, segment) in segments.iter().enumerate() {
        nodes.push(Node::Raw(segment.as_ref().to_string()));
        if i + 1 < segments.len() {
            if let Some(value) = values.next() {
                classify_into(value, &mut nodes)?;
            }
        }
    }

    Ok(Template::from_nodes(nodes))
}

/// Trusted markup that bypasses escaping.
///
/// Only pass content you control; it is emitted byte for byte.
pub fn raw(markup: impl Into<String>) -> Template {
    Template::from_nodes(vec![Node::Raw(markup.into())])
}

/// Incremental template builder.
///
/// Adjacent literals are joined and adjacent values get an empty literal
/// between them, so the segment/value alternation always holds. The
/// [`html!`](crate::html) macro expands to calls on this builder.
#[derive(Debug)]
pub struct TemplateBuilder {
    segments: Vec<String>,
    values: Vec<Value>,
}

impl Default for TemplateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateBuilder {
    pub fn new() -> Self {
        Self {
            segments: vec![String::new()],
            values: Vec::new(),
        }
    }

    /// Append trusted literal markup.
    pub fn literal(&mut self, markup: &str) -> &mut Self {
        if let Some(last) = self.segments.last_mut() {
            last.push_str(markup);
        }
        self
    }

    /// Append an interpolated value.
    pub fn interpolate(&mut self, value: impl Into<Value>) -> &mut Self {
        self.values.push(value.into());
        self.segments.push(String::new());
        self
    }

    pub fn finish(self) -> TemplateResult<Template> {
        build(&self.segments, self.values)
    }
}
