//! Cancellable, channel-backed stream of reply chunks.
//!
//! The producer runs as a tokio task writing into a bounded channel; the consumer
//! polls [`ChatStream`] as a [`futures::Stream`]. Terminal states are explicit: a
//! stream ends `Completed`, `Failed` or `Cancelled`, and yields nothing afterwards.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::{Stream, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::ChatError;

pub type ChunkResult = Result<String, ChatError>;
pub type ChunkSender = mpsc::Sender<ChunkResult>;

const CHANNEL_CAPACITY: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    Open,
    Completed,
    Failed,
    Cancelled,
}

impl StreamState {
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Open)
    }
}

pub struct ChatStream {
    receiver: mpsc::Receiver<ChunkResult>,
    producer: Option<JoinHandle<()>>,
    state: StreamState,
}

impl ChatStream {
    /// Spawn `produce` as the producer task. It stops early once the stream is
    /// cancelled or dropped, because sends start failing.
    pub fn spawn<F, Fut>(produce: F) -> Self
    where
        F: FnOnce(ChunkSender) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (sender, receiver) = mpsc::channel(CHANNEL_CAPACITY);
        let producer = tokio::spawn(produce(sender));
        Self {
            receiver,
            producer: Some(producer),
            state: StreamState::Open,
        }
    }

    /// A stream that replays fixed items. Needs no runtime.
    pub fn from_chunks(chunks: Vec<ChunkResult>) -> Self {
        let (sender, receiver) = mpsc::channel(chunks.len().max(1));
        for chunk in chunks {
            // Capacity covers every item, so this cannot fail.
            let _ = sender.try_send(chunk);
        }
        Self {
            receiver,
            producer: None,
            state: StreamState::Open,
        }
    }

    pub const fn state(&self) -> StreamState {
        self.state
    }

    /// Stop delivery. Chunks already yielded are unaffected; nothing further is yielded.
    pub fn cancel(&mut self) {
        if self.state.is_terminal() {
            return;
        }
        self.state = StreamState::Cancelled;
        self.receiver.close();
        if let Some(producer) = self.producer.take() {
            producer.abort();
        }
    }

    /// Drain the stream into one string, stopping at the first error.
    pub async fn collect_text(mut self) -> Result<String, ChatError> {
        let mut text = String::new();
        while let Some(chunk) = self.next().await {
            text.push_str(&chunk?);
        }
        Ok(text)
    }
}

impl Stream for ChatStream {
    type Item = ChunkResult;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.state.is_terminal() {
            return Poll::Ready(None);
        }

        match self.receiver.poll_recv(cx) {
            Poll::Ready(Some(Ok(chunk))) => Poll::Ready(Some(Ok(chunk))),
            Poll::Ready(Some(Err(error))) => {
                self.state = StreamState::Failed;
                Poll::Ready(Some(Err(error)))
            }
            Poll::Ready(None) => {
                self.state = StreamState::Completed;
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl Drop for ChatStream {
    fn drop(&mut self) {
        if let Some(producer) = self.producer.take() {
            producer.abort();
        }
    }
}

impl std::fmt::Debug for ChatStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatStream")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}
