//! Subscription handles and listener bookkeeping.
//!
//! `Subscription` is the handle returned by every `subscribe` in this crate;
//! `ListenerSet` tracks the callbacks registered on a source.

use hashbrown::HashMap;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Unique identifier for a registered listener.
pub type ListenerId = u64;

/// Callback type for value notifications.
pub type Listener<V> = Rc<dyn Fn(&V)>;

/// A handle to a live registration.
///
/// Calling `unsubscribe` removes exactly the registration this handle was
/// created for. Further calls are no-ops. Dropping the handle does not
/// unsubscribe.
pub struct Subscription {
    teardown: RefCell<Option<Box<dyn FnOnce()>>>,
}

impl Subscription {
    /// Creates a handle that runs `teardown` on the first `unsubscribe`.
    pub fn new(teardown: impl FnOnce() + 'static) -> Self {
        Self {
            teardown: RefCell::new(Some(Box::new(teardown))),
        }
    }

    /// Creates a handle that is already closed.
    pub fn closed() -> Self {
        Self {
            teardown: RefCell::new(None),
        }
    }

    /// Returns whether `unsubscribe` has already run.
    #[inline]
    pub fn is_closed(&self) -> bool {
        self.teardown.borrow().is_none()
    }

    pub fn unsubscribe(&self) {
        // Release the borrow before running the teardown, it may re-enter.
        let teardown = self.teardown.borrow_mut().take();
        if let Some(teardown) = teardown {
            teardown();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// Manages the listeners registered on one source.
pub struct ListenerSet<V> {
    listeners: HashMap<ListenerId, Listener<V>>,
    /// Next listener ID to assign
    next_id: ListenerId,
}

impl<V> Default for ListenerSet<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> ListenerSet<V> {
    pub fn new() -> Self {
        Self {
            listeners: HashMap::new(),
            next_id: 1,
        }
    }

    /// Registers a listener and returns the ID to remove it with.
    ///
    /// Registering the same closure twice yields two independent registrations.
    pub fn insert(&mut self, listener: Listener<V>) -> ListenerId {
        let id = self.next_id;
        self.next_id += 1;
        self.listeners.insert(id, listener);
        id
    }

    /// Returns true if the listener was found and removed.
    pub fn remove(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(&id).is_some()
    }

    /// Returns the listeners registered right now.
    ///
    /// Deliver through the snapshot so listeners may add or remove
    /// registrations while being notified.
    pub fn snapshot(&self) -> Vec<Listener<V>> {
        self.listeners.values().cloned().collect()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    pub fn clear(&mut self) {
        self.listeners.clear();
    }
}
