//! Static, fully-resolved and streaming renderers.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use futures::Stream;
use tracing::{debug, info, warn};

use crate::component::Renderable;
use crate::config::{FailurePolicy, RenderConfig};
use crate::error::{RenderError, RenderResult, SlotFailure};
use crate::escape::escape_html_into;
use crate::node::{format_date, Node};
use crate::pending::Pending;
use crate::scheduler::{Discovered, Settled, Worklist};
use crate::slot::{SlotIdFactory, SlotIdGenerator, SlotIds};
use crate::stream;
use crate::template::Template;
use crate::value::classify;
use crate::wire;

/// Rendered output split at placeholder boundaries.
#[derive(Debug)]
pub(crate) enum Piece {
    Text(String),
    Slot { id: String, loading: String },
}

/// Result of one static pass.
pub(crate) struct PassOutput {
    pub(crate) pieces: Vec<Piece>,
    pub(crate) discovered: Vec<Discovered>,
}

impl PassOutput {
    fn text(text: String) -> Self {
        Self {
            pieces: vec![Piece::Text(text)],
            discovered: Vec::new(),
        }
    }

    /// Join the pieces, writing each unresolved slot as a placeholder.
    pub(crate) fn to_markup(&self) -> String {
        join_pieces(&self.pieces)
    }
}

fn join_pieces(pieces: &[Piece]) -> String {
    let mut out = String::new();
    for piece in pieces {
        match piece {
            Piece::Text(text) => out.push_str(text),
            Piece::Slot { id, loading } => wire::write_placeholder(&mut out, id, loading),
        }
    }
    out
}

/// One synchronous walk over a node sequence.
///
/// Never suspends. When `collect` is set, every pending node reached is
/// recorded so the caller can schedule it under the slot id written into
/// the output.
struct StaticPass<'a> {
    config: &'a RenderConfig,
    ids: &'a mut SlotIds,
    collect: bool,
    text: String,
    pieces: Vec<Piece>,
    discovered: Vec<Discovered>,
}

impl<'a> StaticPass<'a> {
    fn new(config: &'a RenderConfig, ids: &'a mut SlotIds, collect: bool) -> Self {
        Self {
            config,
            ids,
            collect,
            text: String::new(),
            pieces: Vec::new(),
            discovered: Vec::new(),
        }
    }

    fn run(mut self, nodes: &[Node]) -> PassOutput {
        for node in nodes {
            self.walk(node);
        }
        if !self.text.is_empty() {
            self.pieces.push(Piece::Text(self.text));
        }
        PassOutput {
            pieces: self.pieces,
            discovered: self.discovered,
        }
    }

    fn walk(&mut self, node: &Node) {
        match node {
            Node::Raw(markup) => self.text.push_str(markup),
            Node::Escaped(text) => escape_html_into(&mut self.text, text),
            Node::Array(nodes) => {
                for node in nodes {
                    self.walk(node);
                }
            }
            Node::Template(template) => {
                for node in template.nodes() {
                    self.walk(node);
                }
            }
            Node::Pending(pending) => self.slot(pending, None),
            Node::Renderable(renderable) => self.renderable(renderable.as_ref()),
            Node::Function(function) => {
                self.text.push_str("javascript:");
                self.text.push_str(function.source());
            }
            Node::Date(date) => self.text.push_str(&format_date(date)),
            Node::Scalar(scalar) => self.text.push_str(&scalar.to_string()),
        }
    }

    fn slot(&mut self, pending: &Pending, fallback_loading: Option<&Template>) {
        let id = self.ids.next_id();

        let loading = match pending.loading().or(fallback_loading) {
            // Loading markup is display-only; pending values inside it are
            // never scheduled.
            Some(template) => StaticPass::new(self.config, &mut *self.ids, false)
                .run(template.nodes())
                .to_markup(),
            None => self.config.loading_markup.clone(),
        };

        if self.collect {
            self.discovered.push(Discovered {
                slot_id: id.clone(),
                pending: pending.clone(),
            });
        }

        if !self.text.is_empty() {
            self.pieces.push(Piece::Text(std::mem::take(&mut self.text)));
        }
        self.pieces.push(Piece::Slot { id, loading });
    }

    fn renderable(&mut self, renderable: &dyn Renderable) {
        match classify(renderable.render()) {
            Ok(Node::Pending(pending)) => {
                let loading = renderable.loading();
                self.slot(&pending, loading.as_ref());
            }
            Ok(node) => self.walk(&node),
            Err(err) => {
                warn!("Renderable produced an unsupported value: {}", err);
                let fragment = failure_fragment(self.config, &err);
                self.text.push_str(&fragment);
            }
        }
    }
}

fn failure_fragment(config: &RenderConfig, failure: &dyn fmt::Display) -> String {
    if config.expose_error_details {
        wire::error_fragment(&failure.to_string())
    } else {
        wire::error_fragment(wire::DEFAULT_ERROR_MESSAGE)
    }
}

/// Expand resolved slots into their content, in document order.
///
/// Uses an explicit stack so deeply nested resolutions do not recurse.
fn assemble(root: Vec<Piece>, mut resolved: HashMap<String, Vec<Piece>>) -> String {
    let mut out = String::new();
    let mut stack = vec![root.into_iter()];

    loop {
        let next = match stack.last_mut() {
            Some(pieces) => pieces.next(),
            None => break,
        };

        match next {
            None => {
                stack.pop();
            }
            Some(Piece::Text(text)) => out.push_str(&text),
            Some(Piece::Slot { id, loading }) => match resolved.remove(&id) {
                Some(pieces) => stack.push(pieces.into_iter()),
                None => wire::write_placeholder(&mut out, &id, &loading),
            },
        }
    }

    out
}

/// Renders templates with an explicit configuration.
///
/// Every call is an independent render invocation: slot ids are unique
/// within it and no state is shared between calls.
#[derive(Clone, Default)]
pub struct Renderer {
    config: RenderConfig,
    id_factory: Option<SlotIdFactory>,
}

impl Renderer {
    pub fn new(config: RenderConfig) -> Self {
        Self {
            config,
            id_factory: None,
        }
    }

    /// Use a custom slot id generator, created fresh for each invocation.
    pub fn with_slot_id_generator<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> Box<dyn SlotIdGenerator> + Send + Sync + 'static,
    {
        self.id_factory = Some(Arc::new(factory));
        self
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub(crate) fn slot_ids(&self) -> SlotIds {
        SlotIds::new(&self.config, self.id_factory.as_ref())
    }

    pub(crate) fn static_pass(&self, nodes: &[Node], ids: &mut SlotIds, collect: bool) -> PassOutput {
        StaticPass::new(&self.config, ids, collect).run(nodes)
    }

    /// Turn a settled slot into content, or the reason it has none.
    pub(crate) fn settle(&self, settled: Settled, ids: &mut SlotIds) -> Result<PassOutput, SlotFailure> {
        let value = settled.outcome?;
        let node = classify(value).map_err(|err| SlotFailure::Unsupported(err.to_string()))?;
        let output = self.static_pass(std::slice::from_ref(&node), ids, true);
        debug!(
            "Slot {} resolved ({} nested slot(s))",
            settled.slot_id,
            output.discovered.len()
        );
        Ok(output)
    }

    /// Error fragment standing in for a failed slot.
    pub(crate) fn failure_output(&self, slot_id: &str, failure: &SlotFailure) -> PassOutput {
        warn!("Async slot {} failed: {}", slot_id, failure);
        PassOutput::text(failure_fragment(&self.config, failure))
    }

    /// Render synchronously, leaving every pending value as a placeholder.
    ///
    /// Pending futures are not touched, so the same template can still be
    /// rendered asynchronously afterwards.
    pub fn render(&self, template: &Template) -> String {
        let mut ids = self.slot_ids();
        self.static_pass(template.nodes(), &mut ids, false).to_markup()
    }

    /// Render to a single string with every async value resolved.
    ///
    /// Values resolved into further pending values are awaited as well.
    /// Substitution is by slot id, so completion order never affects the
    /// output. Under [`FailurePolicy::Reject`] the first failed slot fails
    /// the whole render; otherwise it renders as an error fragment.
    ///
    /// Slot futures are spawned with `tokio::spawn`, so this must be polled
    /// from within a tokio runtime; polling it elsewhere panics.
    pub async fn render_async(&self, template: &Template) -> RenderResult<String> {
        let mut ids = self.slot_ids();
        let root = self.static_pass(template.nodes(), &mut ids, true);

        let mut worklist = Worklist::new(&self.config);
        worklist.extend(root.discovered);

        let mut resolved = HashMap::new();
        while let Some(settled) = worklist.next_settled().await {
            let slot_id = settled.slot_id.clone();
            let output = match self.settle(settled, &mut ids) {
                Ok(output) => output,
                Err(failure) => match self.config.failure_policy {
                    FailurePolicy::Isolate => self.failure_output(&slot_id, &failure),
                    FailurePolicy::Reject => {
                        warn!("Async slot {} failed, rejecting render: {}", slot_id, failure);
                        return Err(RenderError::AsyncResolution {
                            slot_id,
                            reason: failure,
                        });
                    }
                },
            };
            worklist.extend(output.discovered);
            resolved.insert(slot_id, output.pieces);
        }

        info!("Resolved render complete ({} slot(s))", ids.issued());
        Ok(assemble(root.pieces, resolved))
    }

    /// Render progressively.
    ///
    /// The first chunk is the static shell. Each further chunk is a
    /// resolved-content wrapper for whichever slot settled next, so chunks
    /// arrive in completion order, not document order. The stream ends once
    /// no slot is outstanding.
    ///
    /// Slot futures are spawned with `tokio::spawn`, so the stream must be polled
    /// from within a tokio runtime; polling it elsewhere panics.
    pub fn render_stream(&self, template: &Template) -> impl Stream<Item = String> + Send + 'static {
        stream::emit(self.clone(), template.clone())
    }
}

/// Render with the default configuration. See [`Renderer::render`].
pub fn render(template: &Template) -> String {
    Renderer::default().render(template)
}

/// Resolve every async value with the default configuration.
/// Requires a tokio runtime. See [`Renderer::render_async`].
pub async fn render_async(template: &Template) -> RenderResult<String> {
    Renderer::default().render_async(template).await
}

/// Stream with the default configuration. The stream must be polled from
/// within a tokio runtime. See [`Renderer::render_stream`].
pub fn render_stream(template: &Template) -> impl Stream<Item = String> + Send + 'static {
    Renderer::default().render_stream(template)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::Component;
    use crate::node::ClientFunction;
    use crate::template::raw;
    use crate::value::Value;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn sequential() -> Renderer {
        Renderer::new(RenderConfig::default().sequential_ids())
    }

    #[test]
    fn test_escaping_and_raw() {
        let template = html!("<li>" {"<br />"} "</li>" {raw("<hr>")}).unwrap();
        assert_eq!(render(&template), "<li>&lt;br /&gt;</li><hr>");
    }

    #[test]
    fn test_scalars_dates_and_functions() {
        let date = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let template = html!(
            "<time>" {date} "</time><b>" {true} "</b><i>" {2.5} "</i>"
            "<a href=\"" {ClientFunction::new("alert('x')")} "\">go</a>"
        )
        .unwrap();

        assert_eq!(
            render(&template),
            "<time>2025-06-01T12:00:00.000Z</time><b>true</b><i>2.5</i>\
             <a href=\"javascript:alert('x')\">go</a>"
        );
    }

    #[test]
    fn test_pending_renders_placeholder() {
        let template = html!("<div>" {Value::pending(async { "later" })} "</div>").unwrap();
        assert_eq!(
            sequential().render(&template),
            "<div><slot id=\"async_0\">Loading...</slot></div>"
        );
    }

    #[test]
    fn test_custom_loading_markup() {
        let pending = Pending::new(async { "x" }).with_loading(raw("<span class=\"spin\"></span>"));
        let template = html!({pending}).unwrap();
        let renderer = Renderer::new(
            RenderConfig::default()
                .sequential_ids()
                .loading_markup("ignored"),
        );

        assert_eq!(
            renderer.render(&template),
            "<slot id=\"async_0\"><span class=\"spin\"></span></slot>"
        );
    }

    #[tokio::test]
    async fn test_static_render_never_polls_future() {
        use std::sync::atomic::{AtomicBool, Ordering};

        let started = Arc::new(AtomicBool::new(false));
        let flag = started.clone();
        let pending = Pending::new(async move {
            flag.store(true, Ordering::SeqCst);
            1
        });
        let template = html!({pending.clone()}).unwrap();

        let _ = render(&template);
        tokio::task::yield_now().await;

        assert!(!started.load(Ordering::SeqCst));
        assert!(!pending.is_settled());
    }

    #[test]
    fn test_component_loading_used_for_placeholder() {
        let component = Component::new(|| Value::pending(async { "ready" }))
            .with_loading(raw("<em>wait</em>"));
        let template = html!("<p>" {component} "</p>").unwrap();

        assert_eq!(
            sequential().render(&template),
            "<p><slot id=\"async_0\"><em>wait</em></slot></p>"
        );
    }

    #[test]
    fn test_sync_component_renders_inline() {
        let component = Component::new(|| Value::from("<ok>"));
        let template = html!({component}).unwrap();
        assert_eq!(render(&template), "&lt;ok&gt;");
    }

    #[test]
    fn test_bad_renderable_renders_error_fragment() {
        let component = Component::new(|| Value::from(json!({ "a": 1 })));
        let template = html!("<p>" {component} "</p>").unwrap();
        assert_eq!(
            render(&template),
            "<p><div class=\"slot-error\" role=\"alert\">Failed to load content</div></p>"
        );
    }

    #[test]
    fn test_nested_template_reused() {
        let item = html!("<li>" {"a&b"} "</li>").unwrap();
        let list = html!("<ul>" {&item} {&item} "</ul>").unwrap();
        assert_eq!(render(&list), "<ul><li>a&amp;b</li><li>a&amp;b</li></ul>");
    }

    #[test]
    fn test_assemble_expands_by_id() {
        let root = vec![
            Piece::Text("<a>".to_string()),
            Piece::Slot {
                id: "s0".to_string(),
                loading: String::new(),
            },
            Piece::Text("</a>".to_string()),
        ];
        let mut resolved = HashMap::new();
        resolved.insert(
            "s0".to_string(),
            vec![
                Piece::Text("x".to_string()),
                Piece::Slot {
                    id: "s1".to_string(),
                    loading: String::new(),
                },
            ],
        );
        resolved.insert("s1".to_string(), vec![Piece::Text("y".to_string())]);

        assert_eq!(assemble(root, resolved), "<a>xy</a>");
    }

    #[tokio::test]
    async fn test_render_async_resolves_everything() {
        let inner = Value::try_pending(async { html!("<b>" {"one"} "</b>") });
        let template = html!("<div>" {inner} "</div>").unwrap();

        let output = sequential().render_async(&template).await.unwrap();
        assert_eq!(output, "<div><b>one</b></div>");
    }

    #[tokio::test]
    async fn test_render_async_reject_policy() {
        let template = html!(
            {Value::try_pending(async { Err::<String, _>("db offline") })}
        )
        .unwrap();
        let renderer = Renderer::new(RenderConfig::default().sequential_ids().reject_on_failure());

        let err = renderer.render_async(&template).await.unwrap_err();
        match err {
            RenderError::AsyncResolution { slot_id, reason } => {
                assert_eq!(slot_id, "async_0");
                assert_eq!(reason, SlotFailure::Rejected("db offline".to_string()));
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_error_details_exposed_when_enabled() {
        let template = html!(
            {Value::try_pending(async { Err::<String, _>("<boom>") })}
        )
        .unwrap();
        let renderer = Renderer::new(RenderConfig::default().expose_error_details(true));

        let output = renderer.render_async(&template).await.unwrap();
        assert_eq!(
            output,
            "<div class=\"slot-error\" role=\"alert\">async value rejected: &lt;boom&gt;</div>"
        );
    }

    #[tokio::test]
    async fn test_template_renders_again_after_resolution() {
        let pending = Pending::new(async { "first" });
        let template = html!({pending}).unwrap();

        assert_eq!(render_async(&template).await.unwrap(), "first");
        assert_eq!(render_async(&template).await.unwrap(), "first");
    }
}
