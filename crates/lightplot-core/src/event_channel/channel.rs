//! Event Channel implementation.
//!
//! Provides the [`EventChannel`] handle and the [`Event`] trait that ties an
//! event enum to its kind discriminant.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::hash::Hash;
use std::panic::{self, AssertUnwindSafe};
use std::rc::{Rc, Weak};

use super::subscription::Subscription;

/// An event that can be published on an [`EventChannel`].
///
/// `Kind` is the fieldless discriminant listeners register for.
pub trait Event: fmt::Debug {
    /// Discriminant listeners filter on.
    type Kind: Copy + Eq + Hash + fmt::Debug;

    /// The kind of this event.
    fn kind(&self) -> Self::Kind;
}

/// Handle identifying one registered listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{}", self.0)
    }
}

type Listener<E> = Rc<dyn Fn(&E)>;

struct Entry<E: Event> {
    id: ListenerId,
    /// `None` receives every kind.
    kind: Option<E::Kind>,
    once: bool,
    listener: Listener<E>,
}

struct ChannelInner<E: Event> {
    label: &'static str,
    entries: RefCell<Vec<Entry<E>>>,
    next_id: Cell<u64>,
    added: Cell<u64>,
    removed: Cell<u64>,
}

/// Synchronous publish/subscribe channel.
///
/// Cloning the channel clones the handle; all clones share one listener
/// table. Listeners may add or remove registrations (including their own)
/// while an emission is in progress: emission works from a snapshot taken
/// before the first listener runs.
pub struct EventChannel<E: Event> {
    inner: Rc<ChannelInner<E>>,
}

impl<E: Event> Clone for EventChannel<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<E: Event + 'static> EventChannel<E> {
    /// Create a new channel; `label` names it in log output
    pub fn new(label: &'static str) -> Self {
        Self {
            inner: Rc::new(ChannelInner {
                label,
                entries: RefCell::new(Vec::new()),
                next_id: Cell::new(1),
                added: Cell::new(0),
                removed: Cell::new(0),
            }),
        }
    }

    /// The label given at construction
    pub fn label(&self) -> &'static str {
        self.inner.label
    }

    fn register(&self, kind: Option<E::Kind>, once: bool, listener: Listener<E>) -> ListenerId {
        let id = ListenerId(self.inner.next_id.get());
        self.inner.next_id.set(id.0 + 1);
        self.inner.entries.borrow_mut().push(Entry {
            id,
            kind,
            once,
            listener,
        });
        self.inner.added.set(self.inner.added.get() + 1);
        tracing::trace!(channel = self.inner.label, %id, ?kind, "listener added");
        id
    }

    /// Register a listener for one event kind
    pub fn on<F>(&self, kind: E::Kind, listener: F) -> ListenerId
    where
        F: Fn(&E) + 'static,
    {
        self.register(Some(kind), false, Rc::new(listener))
    }

    /// Register a listener for every event kind
    pub fn on_any<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&E) + 'static,
    {
        self.register(None, false, Rc::new(listener))
    }

    /// Register a listener that is removed after its first delivery
    pub fn once<F>(&self, kind: E::Kind, listener: F) -> ListenerId
    where
        F: Fn(&E) + 'static,
    {
        self.register(Some(kind), true, Rc::new(listener))
    }

    /// Remove a listener
    ///
    /// Returns true if the listener was found and removed.
    pub fn off(&self, id: ListenerId) -> bool {
        let mut entries = self.inner.entries.borrow_mut();
        let before = entries.len();
        entries.retain(|entry| entry.id != id);
        let removed = entries.len() != before;
        if removed {
            self.inner.removed.set(self.inner.removed.get() + 1);
            tracing::trace!(channel = self.inner.label, %id, "listener removed");
        }
        removed
    }

    /// Register a listener for one kind, removed when the guard drops
    pub fn scoped<F>(&self, kind: E::Kind, listener: F) -> Subscription
    where
        F: Fn(&E) + 'static,
    {
        let id = self.on(kind, listener);
        self.guard(id)
    }

    /// Register a listener for every kind, removed when the guard drops
    pub fn scoped_any<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&E) + 'static,
    {
        let id = self.on_any(listener);
        self.guard(id)
    }

    fn guard(&self, id: ListenerId) -> Subscription {
        let weak: Weak<ChannelInner<E>> = Rc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                EventChannel { inner }.off(id);
            }
        })
    }

    /// Deliver an event to every matching listener
    ///
    /// Returns the number of listeners that completed without panicking.
    pub fn emit(&self, event: &E) -> usize {
        let kind = event.kind();
        let targets: Vec<(ListenerId, Listener<E>)> = {
            let mut entries = self.inner.entries.borrow_mut();
            let mut targets = Vec::new();
            let mut spent = 0u64;
            entries.retain(|entry| {
                let matches = entry.kind.is_none_or(|k| k == kind);
                if matches {
                    targets.push((entry.id, Rc::clone(&entry.listener)));
                    if entry.once {
                        spent += 1;
                        return false;
                    }
                }
                true
            });
            self.inner.removed.set(self.inner.removed.get() + spent);
            targets
        };

        let mut delivered = 0;
        for (id, listener) in targets {
            match panic::catch_unwind(AssertUnwindSafe(|| listener(event))) {
                Ok(()) => delivered += 1,
                Err(payload) => {
                    tracing::error!(
                        channel = self.inner.label,
                        %id,
                        ?kind,
                        "listener panicked: {}",
                        panic_message(payload.as_ref())
                    );
                }
            }
        }
        delivered
    }

    /// Number of registered listeners
    pub fn listener_count(&self) -> usize {
        self.inner.entries.borrow().len()
    }

    /// Number of listeners that would receive an event of `kind`
    pub fn listener_count_for(&self, kind: E::Kind) -> usize {
        self.inner
            .entries
            .borrow()
            .iter()
            .filter(|entry| entry.kind.is_none_or(|k| k == kind))
            .count()
    }

    /// Total registrations since the channel was created
    pub fn added_total(&self) -> u64 {
        self.inner.added.get()
    }

    /// Total removals (explicit, scoped, one-shot, or cleared)
    pub fn removed_total(&self) -> u64 {
        self.inner.removed.get()
    }

    /// Remove every listener
    pub fn clear(&self) {
        let count = {
            let mut entries = self.inner.entries.borrow_mut();
            let count = entries.len() as u64;
            entries.clear();
            count
        };
        self.inner.removed.set(self.inner.removed.get() + count);
    }
}

impl<E: Event> fmt::Debug for EventChannel<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventChannel")
            .field("label", &self.inner.label)
            .field("listeners", &self.inner.entries.borrow().len())
            .finish()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
