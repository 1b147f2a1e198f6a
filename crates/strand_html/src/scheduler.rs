//! Async resolution scheduler.
//!
//! A worklist of in-flight slots raced through `FuturesUnordered`. Each
//! pending value is spawned onto the tokio runtime when it is first
//! discovered, so it makes progress whether or not anyone is polling the
//! render. New slots found inside resolved content are pushed onto the same
//! worklist instead of recursing into nested streams.

use std::time::Duration;

use futures::future::BoxFuture;
use futures::stream::{FuturesUnordered, StreamExt};
use futures::FutureExt;
use tokio::task::{AbortHandle, JoinError};
use tracing::{debug, warn};

use crate::config::{AbandonPolicy, RenderConfig};
use crate::error::SlotFailure;
use crate::pending::Pending;
use crate::value::Value;

/// A pending node reached by a static pass, with the id it was written under.
pub(crate) struct Discovered {
    pub(crate) slot_id: String,
    pub(crate) pending: Pending,
}

/// A slot whose future has finished, failed or timed out.
pub(crate) struct Settled {
    pub(crate) slot_id: String,
    pub(crate) outcome: Result<Value, SlotFailure>,
}

/// In-flight slots owned by one render invocation.
pub(crate) struct Worklist {
    in_flight: FuturesUnordered<BoxFuture<'static, Settled>>,
    abort_handles: Vec<AbortHandle>,
    timeout: Option<Duration>,
    abandon: AbandonPolicy,
}

impl Worklist {
    pub(crate) fn new(config: &RenderConfig) -> Self {
        Self {
            in_flight: FuturesUnordered::new(),
            abort_handles: Vec::new(),
            timeout: config.slot_timeout(),
            abandon: config.abandon_policy,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.in_flight.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.in_flight.is_empty()
    }

    pub(crate) fn extend(&mut self, discovered: impl IntoIterator<Item = Discovered>) {
        for entry in discovered {
            self.register(entry);
        }
    }

    /// Start resolving a slot.
    ///
    /// Each slot gets its own task over a clone of the shared future, so a
    /// `Pending` reached from several slots resolves all of them.
    ///
    /// Must be called from within a tokio runtime.
    pub(crate) fn register(&mut self, discovered: Discovered) {
        let Discovered { slot_id, pending } = discovered;

        let handle = tokio::spawn(pending.future());
        let abort = handle.abort_handle();
        self.abort_handles.push(abort.clone());
        debug!("Registered async slot {}", slot_id);

        let timeout = self.timeout;
        self.in_flight.push(
            async move {
                let joined = match timeout {
                    Some(limit) => match tokio::time::timeout(limit, handle).await {
                        Ok(joined) => joined,
                        Err(_) => {
                            warn!("Slot {} timed out after {:?}", slot_id, limit);
                            abort.abort();
                            return Settled {
                                slot_id,
                                outcome: Err(SlotFailure::TimedOut(limit)),
                            };
                        }
                    },
                    None => handle.await,
                };

                let outcome = joined.unwrap_or_else(|err| Err(join_failure(err)));
                Settled { slot_id, outcome }
            }
            .boxed(),
        );
    }

    /// Wait for whichever outstanding slot settles first.
    ///
    /// Returns `None` once the worklist is empty.
    pub(crate) async fn next_settled(&mut self) -> Option<Settled> {
        self.in_flight.next().await
    }
}

impl Drop for Worklist {
    fn drop(&mut self) {
        if self.abandon == AbandonPolicy::Abort && !self.in_flight.is_empty() {
            debug!("Aborting {} in-flight slot(s)", self.in_flight.len());
            for handle in &self.abort_handles {
                handle.abort();
            }
        }
    }
}

fn join_failure(err: JoinError) -> SlotFailure {
    if err.is_panic() {
        let payload = err.into_panic();
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        SlotFailure::Panicked(message)
    } else {
        SlotFailure::Rejected("task was cancelled".to_string())
    }
}
