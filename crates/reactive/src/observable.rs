//! The observable query engine seam.
//!
//! The engine that executes, normalizes and re-runs queries lives outside
//! this crate. `ObservableQuery` is the contract this crate needs from it;
//! `Observer` is how callers listen to push-based sources.

use crate::concast::Concast;
use crate::subscription::Subscription;
use skein_core::{Document, QueryError, QueryResult};
use std::rc::Rc;

/// Callbacks for a push-based source. Every callback is optional.
pub struct Observer<T> {
    pub(crate) next: Option<Rc<dyn Fn(&T)>>,
    pub(crate) error: Option<Rc<dyn Fn(&QueryError)>>,
    pub(crate) complete: Option<Rc<dyn Fn()>>,
}

impl<T> Default for Observer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for Observer<T> {
    fn clone(&self) -> Self {
        Self {
            next: self.next.clone(),
            error: self.error.clone(),
            complete: self.complete.clone(),
        }
    }
}

impl<T> Observer<T> {
    /// Creates an observer that ignores everything.
    pub fn new() -> Self {
        Self {
            next: None,
            error: None,
            complete: None,
        }
    }

    #[must_use]
    pub fn on_next(mut self, f: impl Fn(&T) + 'static) -> Self {
        self.next = Some(Rc::new(f));
        self
    }

    #[must_use]
    pub fn on_error(mut self, f: impl Fn(&QueryError) + 'static) -> Self {
        self.error = Some(Rc::new(f));
        self
    }

    #[must_use]
    pub fn on_complete(mut self, f: impl Fn() + 'static) -> Self {
        self.complete = Some(Rc::new(f));
        self
    }

    pub fn next(&self, value: &T) {
        if let Some(next) = &self.next {
            next(value);
        }
    }

    pub fn error(&self, error: &QueryError) {
        if let Some(on_error) = &self.error {
            on_error(error);
        }
    }

    pub fn complete(&self) {
        if let Some(complete) = &self.complete {
            complete();
        }
    }
}

/// A live, re-runnable query handle provided by the query engine.
///
/// All methods are called from the thread that owns the handle; emissions
/// are delivered synchronously on that thread.
pub trait ObservableQuery<T> {
    /// The document this query executes.
    fn query(&self) -> &Document;

    /// Synchronous snapshot of the query's current state.
    ///
    /// After an error this is an error-shaped result.
    fn current_result(&self) -> QueryResult<T>;

    /// Listens for result changes until the returned handle is unsubscribed.
    fn subscribe(&self, observer: Observer<QueryResult<T>>) -> Subscription;

    /// Re-runs the query, returning a source for the fresh emissions.
    fn reobserve_as_concast(&self) -> Concast<QueryResult<T>>;
}
