use crate::key::CacheKey;

/// Errors returned by `SuspenseCache::get_subscription`.
#[derive(Debug, thiserror::Error)]
pub enum GetSubscriptionError<E> {
    /// The observable factory failed; nothing was cached.
    #[error("Failed to create observable query: {0}")]
    Factory(E),
    /// The cached subscription for this key was created for another data type.
    #[error("Cache entry {key} does not hold results of type {requested}")]
    DataTypeMismatch { key: CacheKey, requested: &'static str },
}
