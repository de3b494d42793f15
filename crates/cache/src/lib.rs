//! Skein Cache - One shared subscription per (document, variables) pair.
//!
//! `SuspenseCache` sits in front of a query client. Every consumer asking for
//! the same document with structurally equal variables receives the same
//! `ObservableQuerySubscription`, so the underlying query runs once no matter
//! how many consumers wait on it.
//!
//! # Example
//!
//! ```rust
//! use skein_cache::SuspenseCache;
//! use skein_core::{Document, QueryResult};
//! use skein_reactive::ManualObservableQuery;
//! use std::convert::Infallible;
//!
//! let cache = SuspenseCache::new(());
//! let doc = Document::parse("query { greeting }").unwrap();
//!
//! let first = cache
//!     .get_subscription(&doc, None, |_| {
//!         Ok::<_, Infallible>(ManualObservableQuery::<String>::loading(doc.clone()))
//!     })
//!     .unwrap();
//! let second = cache
//!     .get_subscription(&doc, None, |_| {
//!         Ok::<_, Infallible>(ManualObservableQuery::<String>::loading(doc.clone()))
//!     })
//!     .unwrap();
//! assert!(first.ptr_eq(&second));
//!
//! first.dispose();
//! assert!(cache.is_empty());
//! ```

mod cache;
mod config;
mod error;
mod key;

pub use cache::SuspenseCache;
pub use config::CacheConfig;
pub use error::GetSubscriptionError;
pub use key::{CacheKey, KeyTrie};
