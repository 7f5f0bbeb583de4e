use crate::connection::ConnectionId;
use events::Event;
use futures::Stream;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::mpsc::Receiver;

type Release = Box<dyn FnOnce() + Send + Sync>;

/// Receiving side of one subscriber.
///
/// The subscription is the only owner of its delivery queue. Dropping it runs the
/// release hook supplied by the broadcaster, so the registration is removed on every
/// exit path of the owning connection, including panics and cancelled futures.
pub struct Subscription {
    id: ConnectionId,
    receiver: Receiver<Event>,
    release: Option<Release>,
}

impl Subscription {
    pub(crate) fn new(
        id: ConnectionId,
        receiver: Receiver<Event>,
        release: impl FnOnce() + Send + Sync + 'static,
    ) -> Self {
        Self {
            id,
            receiver,
            release: Some(Box::new(release)),
        }
    }

    pub fn id(&self) -> &ConnectionId {
        &self.id
    }

    /// Wait for the next event. Returns `None` once the broadcaster side is gone.
    pub async fn recv(&mut self) -> Option<Event> {
        self.receiver.recv().await
    }

    /// Take an already queued event without waiting.
    pub fn try_recv(&mut self) -> Option<Event> {
        self.receiver.try_recv().ok()
    }
}

impl Stream for Subscription {
    type Item = Event;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Event>> {
        self.receiver.poll_recv(cx)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}
