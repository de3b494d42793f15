//! Deduplicating subscriptions to observable queries.
//!
//! `ObservableQuerySubscription` owns one `ObservableQuery` for its whole
//! lifetime and bridges its push-based emissions to three consumers:
//!
//! - `result()`: the latest known result
//! - `promise()`: settles with the first meaningful result
//! - `subscribe()`: listeners notified when the result changes
//!
//! A new emission is only stored and delivered when it is structurally
//! different from the current result.

use crate::observable::{ObservableQuery, Observer};
use crate::promise::{self, Promise};
use crate::subscription::{ListenerSet, Subscription};
use skein_core::{has_directives, QueryResult};
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

/// Directive names marking a query as incrementally delivered by default.
pub const DEFAULT_INCREMENTAL_DIRECTIVES: &[&str] = &["defer"];

/// Construction options for `ObservableQuerySubscription`.
pub struct SubscriptionOptions {
    /// Runs once when the subscription is disposed
    on_dispose: Option<Box<dyn FnOnce()>>,
    incremental_directives: Vec<String>,
}

impl Default for SubscriptionOptions {
    fn default() -> Self {
        Self {
            on_dispose: None,
            incremental_directives: DEFAULT_INCREMENTAL_DIRECTIVES
                .iter()
                .map(|d| d.to_string())
                .collect(),
        }
    }
}

impl SubscriptionOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the hook run once when the subscription is disposed.
    #[must_use]
    pub fn on_dispose(mut self, hook: impl FnOnce() + 'static) -> Self {
        self.on_dispose = Some(Box::new(hook));
        self
    }

    /// Replaces the directive names that mark a query as incremental.
    #[must_use]
    pub fn incremental_directives<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.incremental_directives = names.into_iter().map(Into::into).collect();
        self
    }
}

struct Inner<T> {
    observable: Box<dyn ObservableQuery<T>>,
    result: RefCell<QueryResult<T>>,
    listeners: RefCell<ListenerSet<QueryResult<T>>>,
    /// Subscription to the observable's result stream
    subscription: RefCell<Option<Subscription>>,
    on_dispose: RefCell<Option<Box<dyn FnOnce()>>>,
    retainers: Cell<usize>,
    disposed: Cell<bool>,
}

/// A shared handle to one deduplicated observable query subscription.
///
/// Clones refer to the same subscription.
pub struct ObservableQuerySubscription<T: 'static> {
    inner: Rc<Inner<T>>,
    promise: Promise<QueryResult<T>>,
}

impl<T: 'static> Clone for ObservableQuerySubscription<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            promise: self.promise.clone(),
        }
    }
}

impl<T> ObservableQuerySubscription<T>
where
    T: Clone + PartialEq + 'static,
{
    /// Wraps `observable`, subscribing to its result stream and re-running it
    /// to derive the promise.
    pub fn new(
        observable: impl ObservableQuery<T> + 'static,
        options: SubscriptionOptions,
    ) -> Self {
        let SubscriptionOptions {
            on_dispose,
            incremental_directives,
        } = options;

        let initial = observable.current_result();
        let inner = Rc::new(Inner {
            observable: Box::new(observable),
            result: RefCell::new(initial),
            listeners: RefCell::new(ListenerSet::new()),
            subscription: RefCell::new(None),
            on_dispose: RefCell::new(on_dispose),
            retainers: Cell::new(0),
            disposed: Cell::new(false),
        });

        // Errors are routed through the same path as values: the observable's
        // current result is error-shaped after a failure.
        let weak = Rc::downgrade(&inner);
        let on_next = weak.clone();
        let observer = Observer::new()
            .on_next(move |_: &QueryResult<T>| handle_next(&on_next))
            .on_error(move |_| handle_next(&weak));
        let subscription = inner.observable.subscribe(observer);
        *inner.subscription.borrow_mut() = Some(subscription);

        let names: Vec<&str> = incremental_directives.iter().map(String::as_str).collect();
        let incremental = has_directives(&names, inner.observable.query());
        let promise = promise::from_concast(&inner.observable.reobserve_as_concast(), incremental);

        tracing::trace!(
            operation = inner.observable.query().operation_name(),
            incremental,
            "observable query subscription created"
        );

        Self { inner, promise }
    }

    /// Replaces the stored result and notifies listeners, unless `result` is
    /// structurally equal to the current one.
    pub fn set_result(&self, result: QueryResult<T>) {
        set_result(&self.inner, result);
    }

    /// Registers `listener` for result changes.
    ///
    /// The returned handle removes exactly this registration.
    pub fn subscribe(&self, listener: impl Fn(&QueryResult<T>) + 'static) -> Subscription {
        if self.inner.disposed.get() {
            tracing::warn!("listener registered on a disposed observable query subscription");
            return Subscription::closed();
        }

        let id = self.inner.listeners.borrow_mut().insert(Rc::new(listener));
        let weak = Rc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.listeners.borrow_mut().remove(id);
            }
        })
    }

    /// Keeps the subscription alive until the returned guard is dropped.
    ///
    /// Dropping the last outstanding guard disposes the subscription.
    pub fn retain(&self) -> RetainGuard<T> {
        self.inner.retainers.set(self.inner.retainers.get() + 1);
        RetainGuard {
            subscription: self.clone(),
        }
    }
}

impl<T: 'static> ObservableQuerySubscription<T> {
    /// The latest known result.
    pub fn result(&self) -> QueryResult<T>
    where
        T: Clone,
    {
        self.inner.result.borrow().clone()
    }

    /// Settles with the first result of the re-run query; for incrementally
    /// delivered queries, with the first chunk.
    pub fn promise(&self) -> Promise<QueryResult<T>> {
        self.promise.clone()
    }

    /// The owned observable query.
    pub fn observable(&self) -> &dyn ObservableQuery<T> {
        self.inner.observable.as_ref()
    }

    /// Drops every listener, unsubscribes from the observable and runs the
    /// dispose hook. Calls after the first are no-ops.
    pub fn dispose(&self) {
        if self.inner.disposed.replace(true) {
            return;
        }

        self.inner.listeners.borrow_mut().clear();
        let subscription = self.inner.subscription.borrow_mut().take();
        if let Some(subscription) = subscription {
            subscription.unsubscribe();
        }

        tracing::debug!(
            operation = self.inner.observable.query().operation_name(),
            "observable query subscription disposed"
        );

        let hook = self.inner.on_dispose.borrow_mut().take();
        if let Some(hook) = hook {
            hook();
        }
    }

    #[inline]
    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.get()
    }

    #[inline]
    pub fn listener_count(&self) -> usize {
        self.inner.listeners.borrow().len()
    }

    /// Number of outstanding `RetainGuard`s.
    #[inline]
    pub fn retain_count(&self) -> usize {
        self.inner.retainers.get()
    }

    /// Returns true if both handles refer to the same subscription.
    #[inline]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

fn handle_next<T: Clone + PartialEq>(inner: &Weak<Inner<T>>) {
    if let Some(inner) = inner.upgrade() {
        // Re-read instead of trusting the payload so the stored result always
        // matches the observable's own state.
        let current = inner.observable.current_result();
        set_result(&inner, current);
    }
}

fn set_result<T: Clone + PartialEq>(inner: &Inner<T>, result: QueryResult<T>) {
    {
        let mut current = inner.result.borrow_mut();
        if *current == result {
            tracing::trace!("skipping structurally equal result");
            return;
        }
        *current = result.clone();
    }

    let listeners = inner.listeners.borrow().snapshot();
    tracing::trace!(listeners = listeners.len(), "delivering result");
    for listener in listeners {
        // A listener may dispose the subscription mid-delivery.
        if inner.disposed.get() {
            break;
        }
        listener(&result);
    }
}

impl<T> Drop for Inner<T> {
    fn drop(&mut self) {
        if let Some(subscription) = self.subscription.get_mut().take() {
            subscription.unsubscribe();
        }
    }
}

impl<T: fmt::Debug + 'static> fmt::Debug for ObservableQuerySubscription<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObservableQuerySubscription")
            .field("result", &self.inner.result.borrow())
            .field("listeners", &self.inner.listeners.borrow().len())
            .field("retainers", &self.inner.retainers.get())
            .field("disposed", &self.inner.disposed.get())
            .finish()
    }
}

/// Keeps an `ObservableQuerySubscription` alive; see `retain`.
pub struct RetainGuard<T: 'static> {
    subscription: ObservableQuerySubscription<T>,
}

impl<T: 'static> RetainGuard<T> {
    pub fn subscription(&self) -> &ObservableQuerySubscription<T> {
        &self.subscription
    }
}

impl<T: 'static> Drop for RetainGuard<T> {
    fn drop(&mut self) {
        let inner = &self.subscription.inner;
        let remaining = inner.retainers.get().saturating_sub(1);
        inner.retainers.set(remaining);
        if remaining == 0 {
            tracing::debug!("last retainer released");
            self.subscription.dispose();
        }
    }
}
