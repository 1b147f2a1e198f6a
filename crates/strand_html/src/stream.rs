//! Progressive chunk emission.

use async_stream::stream;
use futures::Stream;
use tracing::{debug, info};

use crate::renderer::Renderer;
use crate::scheduler::Worklist;
use crate::template::Template;
use crate::wire;

/// Emit the static shell, then one wrapper chunk per settled slot.
///
/// Nothing runs until the first poll. Slot futures are spawned while the
/// shell is produced; after that, each pull waits for the next slot to
/// settle. A failed slot still yields a wrapper, holding the error fragment,
/// so the stream always terminates once every slot has settled.
pub(crate) fn emit(renderer: Renderer, template: Template) -> impl Stream<Item = String> + Send + 'static {
    stream! {
        let mut ids = renderer.slot_ids();
        let shell = renderer.static_pass(template.nodes(), &mut ids, true);
        drop(template);

        let markup = shell.to_markup();
        let mut worklist = Worklist::new(renderer.config());
        worklist.extend(shell.discovered);
        debug!("Streaming shell with {} pending slot(s)", worklist.len());
        yield markup;

        let mut chunks = 1usize;
        while let Some(settled) = worklist.next_settled().await {
            let slot_id = settled.slot_id.clone();
            let output = renderer
                .settle(settled, &mut ids)
                .unwrap_or_else(|failure| renderer.failure_output(&slot_id, &failure));
            let markup = output.to_markup();
            worklist.extend(output.discovered);

            chunks += 1;
            yield wire::wrapper(&slot_id, &markup);
        }

        debug_assert!(worklist.is_empty());
        info!("Stream complete ({} chunk(s), {} slot(s))", chunks, ids.issued());
    }
}
