//! Delivering streamed chunks to an output.

use async_trait::async_trait;
use futures::{pin_mut, Stream, StreamExt};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::error::{RenderError, RenderResult};

/// Destination for rendered chunks.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChunkSink: Send {
    /// Deliver one chunk. An error stops the render.
    async fn send(&mut self, chunk: String) -> RenderResult<()>;
}

/// Writes each chunk to an async writer and flushes it.
pub struct WriterSink<W> {
    writer: W,
}

impl<W> WriterSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

#[async_trait]
impl<W> ChunkSink for WriterSink<W>
where
    W: AsyncWrite + Unpin + Send,
{
    async fn send(&mut self, chunk: String) -> RenderResult<()> {
        self.writer.write_all(chunk.as_bytes()).await?;
        self.writer.flush().await?;
        Ok(())
    }
}

/// Forwards chunks over a channel, e.g. into an HTTP response body.
pub struct ChannelSink {
    sender: mpsc::Sender<String>,
}

impl ChannelSink {
    pub fn new(sender: mpsc::Sender<String>) -> Self {
        Self { sender }
    }
}

#[async_trait]
impl ChunkSink for ChannelSink {
    async fn send(&mut self, chunk: String) -> RenderResult<()> {
        self.sender
            .send(chunk)
            .await
            .map_err(|_| RenderError::SinkClosed)
    }
}

/// Pull every chunk from `stream` into `sink`.
///
/// Returns the number of chunks delivered. The first sink error stops
/// the stream and is returned as is; chunks already delivered stay
/// delivered.
pub async fn write_stream<S, K>(stream: S, sink: &mut K) -> RenderResult<usize>
where
    S: Stream<Item = String>,
    K: ChunkSink + ?Sized,
{
    pin_mut!(stream);
    let mut delivered = 0;

    while let Some(chunk) = stream.next().await {
        if let Err(err) = sink.send(chunk).await {
            warn!("Stopping stream after {} chunk(s): {}", delivered, err);
            return Err(err);
        }
        delivered += 1;
    }

    debug!("Delivered {} chunk(s)", delivered);
    Ok(delivered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;
    use std::io;

    #[tokio::test]
    async fn test_writer_sink() {
        let chunks = stream::iter(vec!["<p>".to_string(), "</p>".to_string()]);
        let mut sink = WriterSink::new(Vec::new());

        let delivered = write_stream(chunks, &mut sink).await.unwrap();
        assert_eq!(delivered, 2);
        assert_eq!(sink.into_inner(), b"<p></p>".to_vec());
    }

    #[tokio::test]
    async fn test_channel_sink_closed() {
        let (tx, rx) = mpsc::channel(4);
        drop(rx);
        let mut sink = ChannelSink::new(tx);

        let err = write_stream(stream::iter(vec!["x".to_string()]), &mut sink)
            .await
            .unwrap_err();
        assert!(matches!(err, RenderError::SinkClosed));
    }

    #[tokio::test]
    async fn test_consumer_error_stops_production() {
        let mut sink = MockChunkSink::new();
        let mut seq = mockall::Sequence::new();
        sink.expect_send()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        sink.expect_send()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| {
                Err(RenderError::StreamConsumer(io::Error::new(
                    io::ErrorKind::BrokenPipe,
                    "connection reset",
                )))
            });

        let chunks = stream::iter((0..5).map(|i| i.to_string()));
        let err = write_stream(chunks, &mut sink).await.unwrap_err();

        assert!(matches!(err, RenderError::StreamConsumer(ref e) if e.kind() == io::ErrorKind::BrokenPipe));
    }
}
