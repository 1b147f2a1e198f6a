//! Deferred template values.

use std::fmt;
use std::future::Future;

use futures::future::{BoxFuture, Shared};
use futures::FutureExt;

use crate::error::SlotFailure;
use crate::template::Template;
use crate::value::Value;

/// The boxed computation behind a pending slot.
pub type SlotFuture = BoxFuture<'static, Result<Value, SlotFailure>>;

/// An async value whose content is not known when the template is built.
///
/// The future is shared: every slot that reaches the same `Pending`, in one
/// render or across several, awaits the same computation and receives a
/// clone of its outcome. Async renders spawn it onto the tokio runtime when
/// they discover it; once it has settled, later renders get the cached
/// outcome straight away.
#[derive(Clone)]
pub struct Pending {
    future: Shared<SlotFuture>,
    loading: Option<Template>,
}

impl Pending {
    /// Wrap an infallible future.
    pub fn new<F, V>(future: F) -> Self
    where
        F: Future<Output = V> + Send + 'static,
        V: Into<Value>,
    {
        Self::from_slot_future(future.map(|value| Ok(value.into())).boxed())
    }

    /// Wrap a fallible future. An `Err` becomes a rejected slot.
    pub fn fallible<F, V, E>(future: F) -> Self
    where
        F: Future<Output = Result<V, E>> + Send + 'static,
        V: Into<Value>,
        E: fmt::Display,
    {
        Self::from_slot_future(
            future
                .map(|result| result.map(Into::into).map_err(SlotFailure::rejected))
                .boxed(),
        )
    }

    pub fn from_slot_future(future: SlotFuture) -> Self {
        Self {
            future: future.shared(),
            loading: None,
        }
    }

    /// Show `loading` inside the placeholder instead of the default markup.
    pub fn with_loading(mut self, loading: Template) -> Self {
        self.loading = Some(loading);
        self
    }

    pub fn loading(&self) -> Option<&Template> {
        self.loading.as_ref()
    }

    /// Whether the underlying future has already produced its outcome.
    pub fn is_settled(&self) -> bool {
        self.future.peek().is_some()
    }

    /// A handle on the shared computation for one slot.
    pub(crate) fn future(&self) -> Shared<SlotFuture> {
        self.future.clone()
    }
}

impl fmt::Debug for Pending {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pending")
            .field("settled", &self.is_settled())
            .field("loading", &self.loading)
            .finish()
    }
}
