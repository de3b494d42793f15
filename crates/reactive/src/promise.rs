//! Awaitable, settle-once results.

use crate::concast::Concast;
use crate::observable::Observer;
use crate::subscription::Subscription;
use futures::channel::oneshot;
use futures::future::{FutureExt, LocalBoxFuture, Shared};
use skein_core::QueryError;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// A value that settles once and may be awaited by any number of consumers.
pub type Promise<T> = Shared<LocalBoxFuture<'static, Result<T, QueryError>>>;

pub(crate) fn from_receiver<T: Clone + 'static>(
    receiver: oneshot::Receiver<Result<T, QueryError>>,
) -> Promise<T> {
    async move { receiver.await.unwrap_or(Err(QueryError::SourceClosed)) }
        .boxed_local()
        .shared()
}

/// Derives the promise consumers wait on from a re-observation source.
///
/// Incrementally delivered queries settle on the first chunk instead of
/// waiting for the source to complete.
pub fn from_concast<T: Clone + 'static>(concast: &Concast<T>, incremental: bool) -> Promise<T> {
    if incremental {
        first_emission(concast)
    } else {
        concast.promise()
    }
}

/// Settles with the first value `concast` emits, then stops listening.
///
/// Rejects with the source's error if it fails first, and with
/// `QueryError::SourceClosed` if it completes without a value.
pub fn first_emission<T: Clone + 'static>(concast: &Concast<T>) -> Promise<T> {
    let (settle, settled) = oneshot::channel();
    let settle = Rc::new(RefCell::new(Some(settle)));
    let handle: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));
    let done = Rc::new(Cell::new(false));

    let observer = Observer::new()
        .on_next({
            let settle = settle.clone();
            let handle = handle.clone();
            let done = done.clone();
            move |value: &T| {
                if let Some(settle) = settle.borrow_mut().take() {
                    let _ = settle.send(Ok(value.clone()));
                }
                done.set(true);
                let subscription = handle.borrow_mut().take();
                if let Some(subscription) = subscription {
                    subscription.unsubscribe();
                }
            }
        })
        .on_error({
            let settle = settle.clone();
            move |error| {
                if let Some(settle) = settle.borrow_mut().take() {
                    let _ = settle.send(Err(error.clone()));
                }
            }
        })
        .on_complete(move || {
            // Dropping the sender settles the promise with `SourceClosed`.
            settle.borrow_mut().take();
        });

    let subscription = concast.subscribe(observer);
    // A replayed first value arrives before the handle exists.
    if done.get() {
        subscription.unsubscribe();
    } else {
        *handle.borrow_mut() = Some(subscription);
    }

    from_receiver(settled)
}
