use futures::Stream;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::event::ChangeEvent;
use super::filter::ChannelSpec;

/// Live subscription to a change feed.
///
/// Events arrive through a bounded channel fed by a pump task. Dropping the
/// subscription (or calling [`Subscription::unsubscribe`]) aborts the pump, so
/// nothing is delivered after teardown. When the underlying feed drops, the
/// stream simply ends.
pub struct Subscription {
    spec: ChannelSpec,
    receiver: mpsc::Receiver<ChangeEvent>,
    pump: Option<JoinHandle<()>>,
}

impl Subscription {
    /// Wire a subscription to an already spawned pump task
    pub fn new(spec: ChannelSpec, receiver: mpsc::Receiver<ChangeEvent>, pump: JoinHandle<()>) -> Self {
        Self {
            spec,
            receiver,
            pump: Some(pump),
        }
    }

    /// Channel for a pump to feed, sized from the realtime config
    pub fn channel(buffer: usize) -> (mpsc::Sender<ChangeEvent>, mpsc::Receiver<ChangeEvent>) {
        mpsc::channel(buffer.max(1))
    }

    /// Next matching event, or `None` once the feed is gone
    pub async fn next_event(&mut self) -> Option<ChangeEvent> {
        self.receiver.recv().await
    }

    pub fn is_active(&self) -> bool {
        self.pump.as_ref().map(|p| !p.is_finished()).unwrap_or(false)
    }

    pub fn unsubscribe(mut self) {
        self.teardown();
    }

    fn teardown(&mut self) {
        if let Some(pump) = self.pump.take() {
            pump.abort();
            tracing::debug!("Unsubscribed from channel '{}'", self.spec.name);
        }
        self.receiver.close();
        // Discard anything buffered before teardown
        while self.receiver.try_recv().is_ok() {}
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl Stream for Subscription {
    type Item = ChangeEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("spec", &self.spec)
            .field("active", &self.is_active())
            .finish()
    }
}
