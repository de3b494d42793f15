//! Multicast re-observation sources.
//!
//! A `Concast` is what re-running a query hands back: a source that emits
//! one or more values (several for incrementally delivered queries), then
//! completes or fails. Any number of observers may listen; each late
//! observer first receives the latest emission. `promise()` settles once
//! with the final outcome.

use crate::observable::Observer;
use crate::promise::{self, Promise};
use crate::subscription::Subscription;
use futures::channel::oneshot;
use hashbrown::HashMap;
use skein_core::QueryError;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

type ObserverId = u64;

/// The last thing a concast emitted.
#[derive(Clone, Debug)]
enum Latest<T> {
    Next(T),
    Error(QueryError),
}

struct ConcastState<T> {
    observers: HashMap<ObserverId, Observer<T>>,
    next_id: ObserverId,
    latest: Option<Latest<T>>,
    closed: bool,
    /// Settles `promise`; taken on completion or error
    settle: Option<oneshot::Sender<Result<T, QueryError>>>,
}

/// A cancelable multi-emission source with a settle-once promise.
pub struct Concast<T> {
    state: Rc<RefCell<ConcastState<T>>>,
    promise: Promise<T>,
}

impl<T> Clone for Concast<T> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
            promise: self.promise.clone(),
        }
    }
}

impl<T: Clone + 'static> Default for Concast<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + 'static> Concast<T> {
    pub fn new() -> Self {
        let (settle, settled) = oneshot::channel();
        Self {
            state: Rc::new(RefCell::new(ConcastState {
                observers: HashMap::new(),
                next_id: 1,
                latest: None,
                closed: false,
                settle: Some(settle),
            })),
            promise: promise::from_receiver(settled),
        }
    }

    /// Settles with the last emitted value on completion, with the error on
    /// failure, and with `QueryError::SourceClosed` if the source completes
    /// without emitting or is dropped before settling.
    pub fn promise(&self) -> Promise<T> {
        self.promise.clone()
    }

    /// Returns whether the source has completed or failed.
    pub fn is_closed(&self) -> bool {
        self.state.borrow().closed
    }

    /// Returns the number of observers still listening.
    pub fn observer_count(&self) -> usize {
        self.state.borrow().observers.len()
    }

    /// Emits a value to every observer.
    pub fn next(&self, value: T) {
        let observers = {
            let mut state = self.state.borrow_mut();
            if state.closed {
                return;
            }
            state.latest = Some(Latest::Next(value.clone()));
            state.observers.values().cloned().collect::<Vec<_>>()
        };
        for observer in observers {
            observer.next(&value);
        }
    }

    /// Fails the source, rejecting the promise and dropping every observer.
    pub fn error(&self, error: QueryError) {
        let observers = {
            let mut state = self.state.borrow_mut();
            if state.closed {
                return;
            }
            state.closed = true;
            state.latest = Some(Latest::Error(error.clone()));
            if let Some(settle) = state.settle.take() {
                let _ = settle.send(Err(error.clone()));
            }
            state.observers.drain().map(|(_, observer)| observer).collect::<Vec<_>>()
        };
        for observer in observers {
            observer.error(&error);
        }
    }

    /// Completes the source, resolving the promise with the last value.
    pub fn complete(&self) {
        let observers = {
            let mut state = self.state.borrow_mut();
            if state.closed {
                return;
            }
            state.closed = true;
            let outcome = match &state.latest {
                Some(Latest::Next(value)) => Ok(value.clone()),
                _ => Err(QueryError::SourceClosed),
            };
            if let Some(settle) = state.settle.take() {
                let _ = settle.send(outcome);
            }
            state.observers.drain().map(|(_, observer)| observer).collect::<Vec<_>>()
        };
        for observer in observers {
            observer.complete();
        }
    }

    /// Starts listening.
    ///
    /// The latest emission, if any, is replayed to `observer` before this
    /// returns. Subscribing to a closed source replays its outcome and returns
    /// a closed handle.
    pub fn subscribe(&self, observer: Observer<T>) -> Subscription {
        let (latest, closed) = {
            let state = self.state.borrow();
            (state.latest.clone(), state.closed)
        };

        match latest {
            Some(Latest::Next(value)) => observer.next(&value),
            Some(Latest::Error(error)) => {
                observer.error(&error);
                return Subscription::closed();
            }
            None => {}
        }
        if closed {
            observer.complete();
            return Subscription::closed();
        }

        let id = {
            let mut state = self.state.borrow_mut();
            let id = state.next_id;
            state.next_id += 1;
            state.observers.insert(id, observer);
            id
        };

        let state: Weak<RefCell<ConcastState<T>>> = Rc::downgrade(&self.state);
        Subscription::new(move || {
            if let Some(state) = state.upgrade() {
                state.borrow_mut().observers.remove(&id);
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;
    use futures::FutureExt;
    use std::cell::Cell;

    fn recording_observer(log: &Rc<RefCell<Vec<String>>>) -> Observer<u32> {
        let (l1, l2, l3) = (log.clone(), log.clone(), log.clone());
        Observer::new()
            .on_next(move |v: &u32| l1.borrow_mut().push(format!("next {v}")))
            .on_error(move |_| l2.borrow_mut().push("error".to_string()))
            .on_complete(move || l3.borrow_mut().push("complete".to_string()))
    }

    #[test]
    fn test_concast_multicast() {
        let concast = Concast::new();
        let log1 = Rc::new(RefCell::new(Vec::new()));
        let log2 = Rc::new(RefCell::new(Vec::new()));

        concast.subscribe(recording_observer(&log1));
        concast.subscribe(recording_observer(&log2));
        assert_eq!(concast.observer_count(), 2);

        concast.next(1);
        concast.next(2);
        concast.complete();

        assert_eq!(*log1.borrow(), vec!["next 1", "next 2", "complete"]);
        assert_eq!(*log2.borrow(), vec!["next 1", "next 2", "complete"]);
        assert_eq!(concast.observer_count(), 0);
    }

    #[test]
    fn test_concast_replays_latest() {
        let concast = Concast::new();
        concast.next(1);
        concast.next(2);

        let log = Rc::new(RefCell::new(Vec::new()));
        let sub = concast.subscribe(recording_observer(&log));
        assert!(!sub.is_closed());
        assert_eq!(*log.borrow(), vec!["next 2"]);
    }

    #[test]
    fn test_concast_subscribe_after_close() {
        let concast = Concast::new();
        concast.next(5);
        concast.complete();

        let log = Rc::new(RefCell::new(Vec::new()));
        let sub = concast.subscribe(recording_observer(&log));
        assert!(sub.is_closed());
        assert_eq!(*log.borrow(), vec!["next 5", "complete"]);

        let failed = Concast::<u32>::new();
        failed.error(QueryError::network("offline"));
        let log = Rc::new(RefCell::new(Vec::new()));
        assert!(failed.subscribe(recording_observer(&log)).is_closed());
        assert_eq!(*log.borrow(), vec!["error"]);
    }

    #[test]
    fn test_concast_unsubscribe() {
        let concast = Concast::new();
        let count = Rc::new(Cell::new(0));
        let count_clone = count.clone();

        let sub = concast.subscribe(
            Observer::new().on_next(move |_: &u32| count_clone.set(count_clone.get() + 1)),
        );
        concast.next(1);
        sub.unsubscribe();
        concast.next(2);

        assert_eq!(count.get(), 1);
        assert_eq!(concast.observer_count(), 0);
    }

    #[test]
    fn test_concast_promise_resolves_with_last_value() {
        let concast = Concast::new();
        let promise = concast.promise();

        concast.next(1);
        assert!(promise.clone().now_or_never().is_none());

        concast.next(2);
        concast.complete();
        assert_eq!(block_on(promise), Ok(2));
    }

    #[test]
    fn test_concast_promise_rejects_on_error() {
        let concast = Concast::<u32>::new();
        concast.next(1);
        concast.error(QueryError::network("offline"));

        assert_eq!(block_on(concast.promise()), Err(QueryError::network("offline")));
    }

    #[test]
    fn test_concast_promise_without_value() {
        let concast = Concast::<u32>::new();
        concast.complete();
        assert_eq!(block_on(concast.promise()), Err(QueryError::SourceClosed));

        let dropped = Concast::<u32>::new();
        let promise = dropped.promise();
        drop(dropped);
        assert_eq!(block_on(promise), Err(QueryError::SourceClosed));
    }

    #[test]
    fn test_concast_ignores_after_close() {
        let concast = Concast::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        concast.subscribe(recording_observer(&log));

        concast.complete();
        concast.next(9);
        concast.error(QueryError::SourceClosed);
        concast.complete();

        assert_eq!(*log.borrow(), vec!["complete"]);
        assert!(concast.is_closed());
    }
}
