//! Renderable values and components with loading placeholders.

use std::fmt;
use std::sync::Arc;

use crate::template::Template;
use crate::value::Value;

/// A value that produces its content when rendered.
///
/// `render` is called once per render pass. Returning a pending value
/// makes the renderable async; its `loading` markup, if any, fills the
/// placeholder until the value resolves.
pub trait Renderable: Send + Sync {
    fn render(&self) -> Value;

    fn loading(&self) -> Option<Template> {
        None
    }
}

/// A partial defined by a closure, with optional loading markup.
///
/// ```rust
/// use strand_html::{html, raw, Component, Value};
///
/// let weather = Component::new(|| {
///     Value::try_pending(async { html!("<b>" {"Sunny"} "</b>") })
/// })
/// .with_loading(raw("<i>Checking the sky...</i>"));
///
/// let page = html!("<aside>" {weather} "</aside>").unwrap();
/// assert_eq!(page.len(), 3);
/// ```
#[derive(Clone)]
pub struct Component {
    render: Arc<dyn Fn() -> Value + Send + Sync>,
    loading: Option<Template>,
}

impl Component {
    pub fn new<F>(render: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        Self {
            render: Arc::new(render),
            loading: None,
        }
    }

    pub fn with_loading(mut self, loading: Template) -> Self {
        self.loading = Some(loading);
        self
    }
}

impl Renderable for Component {
    fn render(&self) -> Value {
        (self.render)()
    }

    fn loading(&self) -> Option<Template> {
        self.loading.clone()
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Component")
            .field("loading", &self.loading)
            .finish_non_exhaustive()
    }
}

impl From<Component> for Value {
    fn from(component: Component) -> Self {
        Value::renderable(component)
    }
}
