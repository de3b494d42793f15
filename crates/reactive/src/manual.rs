//! An observable query driven by hand.
//!
//! `ManualObservableQuery` implements `ObservableQuery` without any network
//! or cache behind it: the embedding code decides what the current result
//! is and when observers hear about it. Clones share state, so one clone can
//! be handed to a subscription while another drives it.

use crate::concast::Concast;
use crate::observable::{ObservableQuery, Observer};
use crate::subscription::Subscription;
use hashbrown::HashMap;
use skein_core::{Document, QueryError, QueryResult};
use std::cell::RefCell;
use std::rc::Rc;

struct ManualState<T> {
    current: QueryResult<T>,
    observers: HashMap<u64, Observer<QueryResult<T>>>,
    next_id: u64,
    /// Every source handed out by `reobserve_as_concast`, oldest first
    concasts: Vec<Concast<QueryResult<T>>>,
}

pub struct ManualObservableQuery<T> {
    document: Document,
    state: Rc<RefCell<ManualState<T>>>,
}

impl<T> Clone for ManualObservableQuery<T> {
    fn clone(&self) -> Self {
        Self {
            document: self.document.clone(),
            state: self.state.clone(),
        }
    }
}

impl<T: Clone + 'static> ManualObservableQuery<T> {
    /// Creates a query for `document` whose current result is `initial`.
    pub fn new(document: Document, initial: QueryResult<T>) -> Self {
        Self {
            document,
            state: Rc::new(RefCell::new(ManualState {
                current: initial,
                observers: HashMap::new(),
                next_id: 1,
                concasts: Vec::new(),
            })),
        }
    }

    /// Creates a query that starts out loading.
    pub fn loading(document: Document) -> Self {
        Self::new(document, QueryResult::loading())
    }

    /// Replaces the current result without notifying anyone.
    pub fn set_current(&self, result: QueryResult<T>) {
        self.state.borrow_mut().current = result;
    }

    /// Replaces the current result and notifies every observer.
    pub fn emit(&self, result: QueryResult<T>) {
        let observers = {
            let mut state = self.state.borrow_mut();
            state.current = result.clone();
            state.observers.values().cloned().collect::<Vec<_>>()
        };
        for observer in observers {
            observer.next(&result);
        }
    }

    /// Makes the current result error-shaped and reports `error` to every
    /// observer.
    pub fn emit_error(&self, error: QueryError) {
        let observers = {
            let mut state = self.state.borrow_mut();
            state.current = QueryResult::from_error(error.clone());
            state.observers.values().cloned().collect::<Vec<_>>()
        };
        for observer in observers {
            observer.error(&error);
        }
    }

    /// Number of live observers on the result stream.
    pub fn observer_count(&self) -> usize {
        self.state.borrow().observers.len()
    }

    /// How many times the query has been re-run.
    pub fn reobserve_count(&self) -> usize {
        self.state.borrow().concasts.len()
    }

    /// The source returned by the most recent re-run.
    pub fn last_concast(&self) -> Option<Concast<QueryResult<T>>> {
        self.state.borrow().concasts.last().cloned()
    }
}

impl<T: Clone + 'static> ObservableQuery<T> for ManualObservableQuery<T> {
    fn query(&self) -> &Document {
        &self.document
    }

    fn current_result(&self) -> QueryResult<T> {
        self.state.borrow().current.clone()
    }

    fn subscribe(&self, observer: Observer<QueryResult<T>>) -> Subscription {
        let id = {
            let mut state = self.state.borrow_mut();
            let id = state.next_id;
            state.next_id += 1;
            state.observers.insert(id, observer);
            id
        };

        let state = Rc::downgrade(&self.state);
        Subscription::new(move || {
            if let Some(state) = state.upgrade() {
                state.borrow_mut().observers.remove(&id);
            }
        })
    }

    fn reobserve_as_concast(&self) -> Concast<QueryResult<T>> {
        let concast = Concast::new();
        self.state.borrow_mut().concasts.push(concast.clone());
        concast
    }
}
