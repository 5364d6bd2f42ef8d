//! Interaction Event Target
//!
//! A listener registry the authentication view forwards key-down and
//! pointer-move events into.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    KeyDown,
    PointerMove,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InteractionEvent {
    pub kind: EventKind,
    pub at: Instant,
}

impl InteractionEvent {
    pub fn now(kind: EventKind) -> Self {
        Self {
            kind,
            at: Instant::now(),
        }
    }
}

pub type Listener = Arc<dyn Fn(&InteractionEvent) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

#[derive(Default)]
struct Registry {
    next_id: u64,
    listeners: Vec<(ListenerId, EventKind, Listener)>,
}

/// Cloneable handle; clones share one registry
#[derive(Clone, Default)]
pub struct EventTarget {
    registry: Arc<Mutex<Registry>>,
}

impl EventTarget {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_listener(&self, kind: EventKind, listener: Listener) -> ListenerId {
        let mut registry = self.registry();
        let id = ListenerId(registry.next_id);
        registry.next_id += 1;
        registry.listeners.push((id, kind, listener));
        id
    }

    /// Returns false when the listener was already removed
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        let mut registry = self.registry();
        let before = registry.listeners.len();
        registry.listeners.retain(|(listener_id, _, _)| *listener_id != id);
        registry.listeners.len() != before
    }

    pub fn dispatch(&self, event: InteractionEvent) {
        // Listeners run outside the lock so they may touch the registry
        let listeners: Vec<Listener> = self
            .registry()
            .listeners
            .iter()
            .filter(|(_, kind, _)| *kind == event.kind)
            .map(|(_, _, listener)| listener.clone())
            .collect();

        for listener in listeners {
            listener(&event);
        }
    }

    /// Dispatch an event stamped with the current instant
    pub fn emit(&self, kind: EventKind) {
        self.dispatch(InteractionEvent::now(kind));
    }

    pub fn listener_count(&self) -> usize {
        self.registry().listeners.len()
    }

    fn registry(&self) -> MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for EventTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventTarget")
            .field("listeners", &self.listener_count())
            .finish()
    }
}
