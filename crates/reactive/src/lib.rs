//! Skein Reactive - Deduplicated subscriptions to observable queries.
//!
//! This crate bridges a push-based observable query into the two shapes UI
//! consumers need: a promise that settles with the first meaningful result
//! (for consumers that block until data is ready) and a set of listeners
//! notified whenever the result changes (for consumers that re-render).
//!
//! # Core Concepts
//!
//! - `ObservableQuery`: the query engine seam, implemented outside this crate
//! - `Concast`: a multicast source produced by re-running a query
//! - `ObservableQuerySubscription`: owns one observable query, stores its
//!   latest result, and only notifies listeners when the result changes
//!   structurally
//! - `Subscription`: the handle every `subscribe` returns
//!
//! # Example
//!
//! ```ignore
//! use skein_core::{Document, QueryResult};
//! use skein_reactive::{ManualObservableQuery, ObservableQuerySubscription, SubscriptionOptions};
//!
//! let doc = Document::parse("query { greeting }")?;
//! let query = ManualObservableQuery::loading(doc);
//! let subscription = ObservableQuerySubscription::new(query.clone(), SubscriptionOptions::new());
//!
//! let handle = subscription.subscribe(|result| println!("{:?}", result.data));
//! query.emit(QueryResult::ready(serde_json::json!({ "greeting": "hi" })));
//! handle.unsubscribe();
//! ```

pub mod concast;
pub mod manual;
pub mod observable;
pub mod promise;
pub mod query_subscription;
pub mod subscription;

pub use concast::Concast;
pub use manual::ManualObservableQuery;
pub use observable::{ObservableQuery, Observer};
pub use promise::Promise;
pub use query_subscription::{
    ObservableQuerySubscription, RetainGuard, SubscriptionOptions, DEFAULT_INCREMENTAL_DIRECTIVES,
};
pub use subscription::{Listener, ListenerId, ListenerSet, Subscription};
