//! Subscriber registry for note update broadcasts.
//!
//! # Responsibility
//! - Own the set of active update subscribers for one channel.
//! - Fan out serialized update events and evict subscribers that fail.
//!
//! # Invariants
//! - All subscriber access goes through one mutex; the registry is
//!   `Send + Sync` and is shared via `Arc`.
//! - A subscriber whose `send` fails is removed before `broadcast` returns.
//! - Client ids are never reused within one registry.

use crate::model::note::NoteId;
use log::{debug, warn};
use serde::Serialize;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Registry-local subscriber handle.
pub type ClientId = u64;

/// Delivery failure reported by a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkError {
    /// Peer is gone; the subscriber will be evicted.
    Disconnected,
    /// Transport-specific failure message.
    Transport(String),
}

impl Display for SinkError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disconnected => write!(f, "subscriber disconnected"),
            Self::Transport(message) => write!(f, "transport error: {message}"),
        }
    }
}

impl Error for SinkError {}

/// Outbound side of one subscriber connection.
pub trait UpdateSink: Send {
    /// Delivers one JSON payload.
    fn send(&mut self, payload: &str) -> Result<(), SinkError>;
}

/// Change notification published after a successful write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum UpdateEvent {
    NoteCreated { id: NoteId },
    NoteUpdated { id: NoteId },
    NoteDeleted { id: NoteId },
}

impl UpdateEvent {
    /// Stable event name as written to the wire.
    pub fn name(&self) -> &'static str {
        match self {
            Self::NoteCreated { .. } => "note_created",
            Self::NoteUpdated { .. } => "note_updated",
            Self::NoteDeleted { .. } => "note_deleted",
        }
    }
}

/// Outcome of one broadcast.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    pub delivered: usize,
    /// Subscribers removed because delivery failed.
    pub evicted: Vec<ClientId>,
}

#[derive(Default)]
struct Inner {
    next_id: ClientId,
    clients: BTreeMap<ClientId, Box<dyn UpdateSink>>,
}

/// Concurrency-safe set of active subscribers.
#[derive(Default)]
pub struct ClientRegistry {
    inner: Mutex<Inner>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one subscriber and returns its handle.
    pub fn register(&self, sink: Box<dyn UpdateSink>) -> ClientId {
        let mut inner = self.lock();
        inner.next_id += 1;
        let id = inner.next_id;
        inner.clients.insert(id, sink);
        debug!(
            "event=client_register module=notify status=ok client_id={id} clients={}",
            inner.clients.len()
        );
        id
    }

    /// Removes one subscriber; returns `false` when it was already gone.
    pub fn unregister(&self, id: ClientId) -> bool {
        let mut inner = self.lock();
        let removed = inner.clients.remove(&id).is_some();
        debug!(
            "event=client_unregister module=notify status=ok client_id={id} removed={removed}"
        );
        removed
    }

    pub fn len(&self) -> usize {
        self.lock().clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().clients.is_empty()
    }

    /// Sends `event` to every subscriber, evicting the ones that fail.
    pub fn broadcast(&self, event: &UpdateEvent) -> BroadcastReport {
        let payload = match serde_json::to_string(event) {
            Ok(payload) => payload,
            Err(err) => {
                warn!(
                    "event=broadcast module=notify status=error kind={} error={err}",
                    event.name()
                );
                return BroadcastReport::default();
            }
        };

        let mut inner = self.lock();
        let mut report = BroadcastReport::default();
        for (id, sink) in inner.clients.iter_mut() {
            match sink.send(&payload) {
                Ok(()) => report.delivered += 1,
                Err(err) => {
                    debug!(
                        "event=broadcast_send module=notify status=error client_id={id} error={err}"
                    );
                    report.evicted.push(*id);
                }
            }
        }
        for id in &report.evicted {
            inner.clients.remove(id);
        }

        debug!(
            "event=broadcast module=notify status=ok kind={} delivered={} evicted={}",
            event.name(),
            report.delivered,
            report.evicted.len()
        );
        report
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // The map stays valid if a sink panicked mid-broadcast.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
