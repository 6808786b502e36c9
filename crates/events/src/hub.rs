//! Listener registry + fan-out.
//!
//! The hub owns the set of active listeners. Each listener owns an unbounded
//! inbox; `publish` enqueues a clone of the message into every inbox and
//! returns immediately. Listeners unregister themselves on drop, which makes
//! cleanup exactly-once no matter how a consumer's read loop exits (normal
//! completion, cancellation, or error).

use std::collections::HashMap;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use uuid::Uuid;

type Registry<M> = Mutex<HashMap<ListenerId, UnboundedSender<M>>>;

#[derive(Debug, thiserror::Error)]
pub enum HubError {
    /// The registry lock was poisoned by a panicking thread.
    #[error("listener registry poisoned")]
    Poisoned,
}

/// Identifier of one registered listener.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct ListenerId(Uuid);

impl ListenerId {
    fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl core::fmt::Display for ListenerId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// In-process pub/sub hub.
///
/// - No IO; fan-out is enqueue-only and never waits on a consumer
/// - Per-inbox FIFO: each listener sees publishes in publish order
/// - No cross-listener ordering guarantee
/// - Registrations whose receiver is gone are pruned during publish
#[derive(Debug)]
pub struct BroadcastHub<M> {
    listeners: Arc<Registry<M>>,
}

impl<M> Default for BroadcastHub<M> {
    fn default() -> Self {
        Self {
            listeners: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

impl<M> BroadcastHub<M> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new listener with an empty inbox.
    pub fn subscribe(&self) -> Listener<M> {
        let id = ListenerId::new();
        let (tx, rx) = mpsc::unbounded_channel();

        // If the lock is poisoned the listener is still returned; it just
        // never receives anything until the process restarts.
        if let Ok(mut listeners) = self.listeners.lock() {
            listeners.insert(id, tx);
        }
        tracing::debug!(listener_id = %id, "listener registered");

        Listener {
            id,
            inbox: rx,
            registry: Arc::clone(&self.listeners),
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.lock().map(|l| l.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.listener_count() == 0
    }
}

impl<M> BroadcastHub<M>
where
    M: Clone + Send + 'static,
{
    /// Enqueue `message` into every registered inbox, preserving insertion
    /// order per inbox. Returns how many listeners were reached. A publish
    /// with no listeners is a no-op; a publish never blocks on a reader.
    pub fn publish(&self, message: M) -> Result<usize, HubError> {
        let mut listeners = self.listeners.lock().map_err(|_| HubError::Poisoned)?;

        // Drop any dead registrations while fanning out.
        listeners.retain(|_, tx| tx.send(message.clone()).is_ok());

        Ok(listeners.len())
    }
}

/// One subscriber's end: an id plus the receiving half of its inbox.
///
/// Dropping the listener removes it from the hub's active set. The removal
/// runs exactly once, and removing an id that is already gone is a no-op, so
/// the cleanup path is safe against both cancellation and double teardown.
#[derive(Debug)]
pub struct Listener<M> {
    id: ListenerId,
    inbox: UnboundedReceiver<M>,
    registry: Arc<Registry<M>>,
}

impl<M> Listener<M> {
    pub fn id(&self) -> ListenerId {
        self.id
    }

    /// Wait for the next message. Cancel-safe: a dropped `recv` future
    /// loses nothing, and dropping the listener itself unregisters it.
    ///
    /// Returns `None` once the hub side of the inbox is gone.
    pub async fn recv(&mut self) -> Option<M> {
        self.inbox.recv().await
    }

    /// Non-blocking drain step; `None` when the inbox is currently empty.
    pub fn try_recv(&mut self) -> Option<M> {
        self.inbox.try_recv().ok()
    }

    /// Remove this listener from the active set.
    ///
    /// Equivalent to dropping it; provided for call sites that want the
    /// teardown to read explicitly.
    pub fn unsubscribe(self) {}
}

impl<M> Drop for Listener<M> {
    fn drop(&mut self) {
        if let Ok(mut listeners) = self.registry.lock() {
            listeners.remove(&self.id);
        }
        tracing::debug!(listener_id = %self.id, "listener unregistered");
    }
}

/// Stream of inbox messages, so a listener can be served directly as an
/// SSE body. Dropping the stream drops the listener and unregisters it.
impl<M> tokio_stream::Stream for Listener<M> {
    type Item = M;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<M>> {
        self.get_mut().inbox.poll_recv(cx)
    }
}
