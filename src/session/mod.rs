//! Session state synchronization. `SessionStateService` owns the single current
//! snapshot, fetches it from the session endpoint on demand or on a keep-alive
//! interval, and broadcasts it to subscribers with replay-of-1 semantics.
//!
//! Publish rule: the first resolution is always published; later resolutions
//! are published only when they differ semantically from the held value. Every
//! fetch failure resolves to `None` (absent).
//!
//! Overlapping forced fetches are not sequenced: whichever response arrives last
//! wins, even if its request was issued first.

pub mod snapshot;
pub mod source;
mod stream;

pub use self::{
    snapshot::{AccountToken, SessionSnapshot},
    source::{HttpSessionSource, LogoutStatus, SessionSource},
    stream::SessionStream,
};

use crate::error::Result;
use chrono::Utc;
use std::{
    ops::{Deref, DerefMut},
    pin::Pin,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex, MutexGuard, PoisonError, Weak,
    },
    task::{self, Context},
    time::Duration,
};
use tokio::{
    sync::broadcast,
    task::JoinHandle,
    time::{interval_at, Instant, MissedTickBehavior},
};
use tokio_stream::Stream;
use tracing::{debug, info, warn};

/// Current session value; `None` means not authenticated (absent).
pub type Session = Option<Arc<SessionSnapshot>>;

/// Redirect target used by `logout` when the caller has no preference.
pub const DEFAULT_REDIRECT: &str = "/";

/// Buffered updates per subscriber before it starts lagging.
const STREAM_CAPACITY: usize = 16;

/// Receives navigation requests after a successful logout.
pub trait Navigator: Send + Sync {
    fn navigate(&self, target: &str);
}

/// Navigator for headless consumers; it only records the target in the log.
pub struct LogNavigator;

impl Navigator for LogNavigator {
    fn navigate(&self, target: &str) {
        info!("navigate to {}", target);
    }
}

struct StreamState {
    latest: Session,
    has_fetched_once: bool,
}

struct Poll {
    generation: u64,
    handle: JoinHandle<()>,
}

struct Inner {
    source: Arc<dyn SessionSource>,
    navigator: Arc<dyn Navigator>,
    state: Mutex<StreamState>,
    updates: broadcast::Sender<Session>,
    keep_alive: Mutex<Option<Poll>>,
    generation: AtomicU64,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Aborts the active poll. With a generation, only that poll is cancelled.
fn cancel_poll(inner: &Inner, generation: Option<u64>) -> bool {
    let mut slot = lock(&inner.keep_alive);
    let matches = slot
        .as_ref()
        .is_some_and(|poll| generation.map_or(true, |g| poll.generation == g));

    if !matches {
        return false;
    }

    if let Some(poll) = slot.take() {
        poll.handle.abort();
        debug!("keep-alive poll {} cancelled", poll.generation);
    }
    true
}

/// Cheap to clone; all clones share the same state and stream.
#[derive(Clone)]
pub struct SessionStateService {
    inner: Arc<Inner>,
}

impl SessionStateService {
    #[must_use]
    pub fn new(source: Arc<dyn SessionSource>, navigator: Arc<dyn Navigator>) -> Self {
        let (updates, _) = broadcast::channel(STREAM_CAPACITY);

        Self {
            inner: Arc::new(Inner {
                source,
                navigator,
                state: Mutex::new(StreamState {
                    latest: None,
                    has_fetched_once: false,
                }),
                updates,
                keep_alive: Mutex::new(None),
                generation: AtomicU64::new(0),
            }),
        }
    }

    /// Returns a stream of session values. Triggers a detached fetch when
    /// `force_refetch` is set or nothing has been fetched yet; the fetch result
    /// is pushed into the stream when it resolves.
    ///
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn observe_session(&self, force_refetch: bool) -> SessionStream {
        let stream = self.subscribe();

        if force_refetch || !self.has_fetched_once() {
            self.spawn_fetch();
        }

        stream
    }

    /// Subscribes without fetching.
    #[must_use]
    pub fn subscribe(&self) -> SessionStream {
        let state = lock(&self.inner.state);
        let replay = state.has_fetched_once.then(|| state.latest.clone());
        SessionStream::new(replay, self.inner.updates.subscribe())
    }

    /// Last published value, or `None` if nothing has been published yet.
    #[must_use]
    pub fn current(&self) -> Option<Session> {
        let state = lock(&self.inner.state);
        state.has_fetched_once.then(|| state.latest.clone())
    }

    #[must_use]
    pub fn has_fetched_once(&self) -> bool {
        lock(&self.inner.state).has_fetched_once
    }

    /// Replaces any active poll with one that force-fetches every `interval`,
    /// first firing after one interval. The poll stops when the returned guard
    /// is dropped, when another poll replaces it, or on `stop_keep_alive`.
    ///
    /// A zero interval only cancels the previous poll.
    #[must_use]
    pub fn start_keep_alive(&self, interval: Duration) -> KeepAlive {
        let stream = self.subscribe();
        let generation = self.inner.generation.fetch_add(1, Ordering::Relaxed) + 1;

        let mut slot = lock(&self.inner.keep_alive);
        if let Some(previous) = slot.take() {
            previous.handle.abort();
            debug!(
                "keep-alive poll {} replaced by {}",
                previous.generation, generation
            );
        }

        if interval.is_zero() {
            warn!("keep-alive interval is zero, polling disabled");
        } else {
            let weak = Arc::downgrade(&self.inner);
            let handle = tokio::spawn(async move {
                let mut ticker = interval_at(Instant::now() + interval, interval);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

                loop {
                    ticker.tick().await;
                    let Some(inner) = weak.upgrade() else {
                        break;
                    };
                    debug!("keep-alive poll {} refreshing session", generation);
                    SessionStateService { inner }.spawn_fetch();
                }
            });
            *slot = Some(Poll { generation, handle });
        }

        KeepAlive {
            stream,
            inner: Arc::downgrade(&self.inner),
            generation,
        }
    }

    /// Cancels the active keep-alive poll. Returns whether one was running.
    pub fn stop_keep_alive(&self) -> bool {
        cancel_poll(&self.inner, None)
    }

    #[must_use]
    pub fn is_keep_alive_active(&self) -> bool {
        lock(&self.inner.keep_alive)
            .as_ref()
            .is_some_and(|poll| !poll.handle.is_finished())
    }

    /// Ends the session on the server. 2xx, 401 and 403 clear local state to
    /// absent and navigate to `redirect_to` when given; any other outcome leaves
    /// local state untouched. The request runs detached, so dropping the handle
    /// does not cancel it. The handle resolves to whether local state was cleared.
    pub fn logout(&self, redirect_to: Option<String>) -> JoinHandle<bool> {
        let service = self.clone();

        tokio::spawn(async move {
            let status = match service.inner.source.logout().await {
                Ok(status) => status,
                Err(err) => {
                    warn!("logout request failed: {}", err);
                    return false;
                }
            };

            if !status.clears_session() {
                warn!("logout rejected: {:?}", status);
                return false;
            }

            service.publish(None);

            if let Some(target) = redirect_to {
                service.inner.navigator.navigate(&target);
            }

            true
        })
    }

    /// Current snapshot if it is present and unexpired; otherwise fetches,
    /// publishes through the normal rule, and returns the fetched value.
    pub async fn fresh_session(&self) -> Session {
        if let Some(Some(snapshot)) = self.current() {
            if !snapshot.is_expired_at(Utc::now()) {
                return Some(snapshot);
            }
            debug!("session snapshot expired, refetching");
        }

        let resolved = self.resolve().await;
        self.publish(resolved.clone());
        resolved
    }

    /// Reads the server-side background refresh flag.
    ///
    /// # Errors
    /// Returns the source error; unlike session fetches it is not folded away.
    pub async fn background_refresh_status(&self) -> Result<bool> {
        self.inner.source.background_refresh_status().await
    }

    /// # Errors
    /// Returns the source error when the server does not answer `200`.
    pub async fn enable_background_refresh(&self) -> Result<()> {
        self.inner.source.set_background_refresh(true).await?;
        info!("background refresh enabled");
        Ok(())
    }

    /// # Errors
    /// Returns the source error when the server does not answer `200`.
    pub async fn disable_background_refresh(&self) -> Result<()> {
        self.inner.source.set_background_refresh(false).await?;
        info!("background refresh disabled");
        Ok(())
    }

    fn spawn_fetch(&self) {
        let service = self.clone();
        tokio::spawn(async move {
            let resolved = service.resolve().await;
            service.publish(resolved);
        });
    }

    async fn resolve(&self) -> Session {
        match self.inner.source.fetch().await {
            Ok(snapshot) => snapshot.map(Arc::new),
            Err(err) => {
                warn!("session fetch failed: {}", err);
                None
            }
        }
    }

    /// Applies the publish rule. Returns whether subscribers were notified.
    fn publish(&self, resolved: Session) -> bool {
        let mut state = lock(&self.inner.state);

        if state.has_fetched_once && state.latest == resolved {
            debug!("session unchanged, not publishing");
            return false;
        }

        state.has_fetched_once = true;
        state.latest = resolved.clone();
        // No subscribers is fine; the value stays cached for replay.
        let _ = self.inner.updates.send(resolved);

        true
    }
}

/// Subscription guard returned by `start_keep_alive`. Derefs to the session
/// stream; dropping it cancels the poll it started unless a newer one replaced it.
pub struct KeepAlive {
    stream: SessionStream,
    inner: Weak<Inner>,
    generation: u64,
}

impl KeepAlive {
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }
}

impl Deref for KeepAlive {
    type Target = SessionStream;

    fn deref(&self) -> &Self::Target {
        &self.stream
    }
}

impl DerefMut for KeepAlive {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.stream
    }
}

impl Stream for KeepAlive {
    type Item = Session;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> task::Poll<Option<Session>> {
        Pin::new(&mut self.stream).poll_next(cx)
    }
}

impl Drop for KeepAlive {
    fn drop(&mut self) {
        if let Some(inner) = self.inner.upgrade() {
            cancel_poll(&inner, Some(self.generation));
        }
    }
}
