//! The keyed subscription cache.

use crate::config::CacheConfig;
use crate::error::GetSubscriptionError;
use crate::key::{CacheKey, KeyTrie};
use hashbrown::HashMap;
use skein_core::{canonical_variables, Document, DocumentId, Variables};
use skein_reactive::{ObservableQuery, ObservableQuerySubscription, SubscriptionOptions};
use std::any::{type_name, Any};
use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// Type-erased view of a cached subscription.
trait CacheEntry {
    fn dispose(&self);
    fn as_any(&self) -> &dyn Any;
}

impl<T: 'static> CacheEntry for ObservableQuerySubscription<T> {
    fn dispose(&self) {
        ObservableQuerySubscription::dispose(self);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

type EntryMap = HashMap<CacheKey, Box<dyn CacheEntry>>;

/// Hands out at most one `ObservableQuerySubscription` per (document,
/// variables) pair.
///
/// Variables are compared by content: two mappings with the same entries map
/// to the same subscription whatever their key order. Documents are compared
/// by identity. A subscription removes itself from the cache when disposed.
pub struct SuspenseCache<C> {
    client: C,
    config: CacheConfig,
    cache_keys: Rc<RefCell<KeyTrie>>,
    subscriptions: Rc<RefCell<EntryMap>>,
}

impl<C> SuspenseCache<C> {
    pub fn new(client: C) -> Self {
        Self::with_config(client, CacheConfig::default())
    }

    pub fn with_config(client: C, config: CacheConfig) -> Self {
        Self {
            client,
            config,
            cache_keys: Rc::new(RefCell::new(KeyTrie::new())),
            subscriptions: Rc::new(RefCell::new(HashMap::new())),
        }
    }

    #[inline]
    pub fn client(&self) -> &C {
        &self.client
    }

    #[inline]
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Returns the subscription for `(query, variables)`, creating it on a miss.
    ///
    /// `create_observable` only runs on a miss. If it fails, the error is
    /// returned and the cache is left unchanged. If it re-enters the cache and
    /// creates the same entry itself, that entry wins and the observable built
    /// here is dropped unused.
    pub fn get_subscription<T, O, E, F>(
        &self,
        query: &Document,
        variables: Option<&Variables>,
        create_observable: F,
    ) -> Result<ObservableQuerySubscription<T>, GetSubscriptionError<E>>
    where
        T: Clone + PartialEq + 'static,
        O: ObservableQuery<T> + 'static,
        F: FnOnce(&C) -> Result<O, E>,
    {
        let canonical = canonical_variables(variables);
        let cache_key = self.cache_keys.borrow_mut().lookup(query, &canonical);

        if let Some(subscription) = self.cached::<T, E>(cache_key)? {
            tracing::trace!(%cache_key, "suspense cache hit");
            return Ok(subscription);
        }

        let observable = match create_observable(&self.client) {
            Ok(observable) => observable,
            Err(err) => {
                if !self.subscriptions.borrow().contains_key(&cache_key) {
                    self.cache_keys
                        .borrow_mut()
                        .remove(query.id(), &canonical, cache_key);
                }
                return Err(GetSubscriptionError::Factory(err));
            }
        };

        // The factory may have re-entered the cache and released or created
        // this key.
        let cache_key = self.cache_keys.borrow_mut().lookup(query, &canonical);
        if let Some(subscription) = self.cached::<T, E>(cache_key)? {
            tracing::debug!(%cache_key, "suspense cache entry created by a re-entrant factory");
            return Ok(subscription);
        }

        let options = SubscriptionOptions::new()
            .incremental_directives(self.config.incremental_directives.iter().cloned())
            .on_dispose(eviction_hook(
                Rc::downgrade(&self.subscriptions),
                Rc::downgrade(&self.cache_keys),
                query.id(),
                canonical,
                cache_key,
            ));
        let subscription = ObservableQuerySubscription::new(observable, options);

        self.subscriptions
            .borrow_mut()
            .insert(cache_key, Box::new(subscription.clone()));
        tracing::debug!(
            %cache_key,
            operation = query.operation_name(),
            "suspense cache miss, subscription created"
        );

        Ok(subscription)
    }

    /// Returns true if a live subscription exists for `(query, variables)`.
    pub fn contains(&self, query: &Document, variables: Option<&Variables>) -> bool {
        let canonical = canonical_variables(variables);
        self.cache_keys
            .borrow()
            .peek(query, &canonical)
            .is_some_and(|key| self.subscriptions.borrow().contains_key(&key))
    }

    /// Number of live subscriptions.
    pub fn len(&self) -> usize {
        self.subscriptions.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscriptions.borrow().is_empty()
    }

    /// Disposes every live subscription.
    pub fn clear(&self) {
        let entries: Vec<_> = self
            .subscriptions
            .borrow_mut()
            .drain()
            .map(|(_, entry)| entry)
            .collect();
        tracing::debug!(entries = entries.len(), "clearing suspense cache");
        for entry in entries {
            entry.dispose();
        }
    }

    fn cached<T: 'static, E>(
        &self,
        cache_key: CacheKey,
    ) -> Result<Option<ObservableQuerySubscription<T>>, GetSubscriptionError<E>> {
        let subscriptions = self.subscriptions.borrow();
        let Some(entry) = subscriptions.get(&cache_key) else {
            return Ok(None);
        };

        match entry.as_any().downcast_ref::<ObservableQuerySubscription<T>>() {
            Some(subscription) => Ok(Some(subscription.clone())),
            None => {
                tracing::warn!(
                    %cache_key,
                    requested = type_name::<T>(),
                    "suspense cache data type mismatch"
                );
                Err(GetSubscriptionError::DataTypeMismatch {
                    key: cache_key,
                    requested: type_name::<T>(),
                })
            }
        }
    }
}

/// Removes a disposed entry and releases its interned key. The entry may
/// already be gone when `clear` drained the map.
fn eviction_hook(
    subscriptions: Weak<RefCell<EntryMap>>,
    cache_keys: Weak<RefCell<KeyTrie>>,
    document: DocumentId,
    canonical: String,
    cache_key: CacheKey,
) -> impl FnOnce() + 'static {
    move || {
        if let Some(subscriptions) = subscriptions.upgrade() {
            let evicted = subscriptions.borrow_mut().remove(&cache_key);
            if evicted.is_some() {
                tracing::debug!(%cache_key, "suspense cache entry evicted");
            }
        }
        if let Some(cache_keys) = cache_keys.upgrade() {
            cache_keys.borrow_mut().remove(document, &canonical, cache_key);
        }
    }
}
