use super::Session;
use futures::FutureExt;
use std::{
    fmt,
    pin::Pin,
    task::{Context, Poll},
};
use tokio::sync::broadcast;
use tokio_stream::{wrappers::BroadcastStream, Stream, StreamExt};
use tracing::warn;

type BoxedSessions = Pin<Box<dyn Stream<Item = Session> + Send>>;

/// Subscriber handle for session changes. The first item replays the value that
/// was current when the stream was created (if one has been published); later
/// items are published values in order. The stream ends once the service is
/// gone. Dropping it releases the subscription.
///
/// A subscriber that falls behind the channel capacity skips the oldest values.
/// Two equal values are never yielded back to back, even across such a skip.
pub struct SessionStream {
    inner: BoxedSessions,
}

impl SessionStream {
    pub(super) fn new(replay: Option<Session>, updates: broadcast::Receiver<Session>) -> Self {
        let published = BroadcastStream::new(updates).filter_map(|item| match item {
            Ok(session) => Some(session),
            Err(err) => {
                warn!("session stream skipped updates: {}", err);
                None
            }
        });

        let mut last: Option<Session> = None;
        let inner = tokio_stream::iter(replay)
            .chain(published)
            .filter_map(move |session| {
                if last.as_ref() == Some(&session) {
                    return None;
                }
                last = Some(session.clone());
                Some(session)
            });

        Self {
            inner: Box::pin(inner),
        }
    }

    /// Returns a value that is already available without waiting.
    pub fn try_next(&mut self) -> Option<Session> {
        self.next().now_or_never().flatten()
    }
}

impl Stream for SessionStream {
    type Item = Session;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Session>> {
        self.inner.as_mut().poll_next(cx)
    }
}

impl fmt::Debug for SessionStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionStream").finish_non_exhaustive()
    }
}
