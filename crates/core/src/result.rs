//! Query results as observed by consumers.

use crate::error::{GraphqlError, QueryError};
use serde::{Deserialize, Serialize};

/// Lifecycle state of the request behind a result.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NetworkStatus {
    /// The first request is in flight.
    #[default]
    Loading,
    /// Variables changed and a new request is in flight.
    SetVariables,
    /// A pagination request is in flight.
    FetchMore,
    /// An explicit refetch is in flight.
    Refetch,
    /// A polling request is in flight.
    Poll,
    /// No request is in flight and the last one succeeded.
    Ready,
    /// No request is in flight and the last one failed.
    Error,
}

impl NetworkStatus {
    /// Returns true while any request is in flight.
    #[inline]
    pub fn is_in_flight(self) -> bool {
        !matches!(self, NetworkStatus::Ready | NetworkStatus::Error)
    }
}

/// A snapshot of a query's state.
///
/// Two results compare equal when they are structurally equal; this is what
/// decides whether a new emission is worth delivering.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult<T> {
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<GraphqlError>,
    /// Error-shaped outcome of a failed request
    #[serde(skip)]
    pub error: Option<QueryError>,
    pub loading: bool,
    pub network_status: NetworkStatus,
    /// True when `data` is incomplete, e.g. only the initial chunk of a
    /// deferred response has arrived.
    #[serde(default)]
    pub partial: bool,
}

impl<T> QueryResult<T> {
    /// A result with no data and a request in flight.
    pub fn loading() -> Self {
        QueryResult {
            data: None,
            errors: Vec::new(),
            error: None,
            loading: true,
            network_status: NetworkStatus::Loading,
            partial: false,
        }
    }

    /// A complete, settled result.
    pub fn ready(data: T) -> Self {
        QueryResult {
            data: Some(data),
            errors: Vec::new(),
            error: None,
            loading: false,
            network_status: NetworkStatus::Ready,
            partial: false,
        }
    }

    /// A settled result carrying only part of the data.
    pub fn partial(data: T) -> Self {
        QueryResult {
            partial: true,
            ..QueryResult::ready(data)
        }
    }

    /// A settled, failed result.
    pub fn from_error(error: QueryError) -> Self {
        let errors = match &error {
            QueryError::Graphql(errors) => errors.clone(),
            _ => Vec::new(),
        };
        QueryResult {
            data: None,
            errors,
            error: Some(error),
            loading: false,
            network_status: NetworkStatus::Error,
            partial: false,
        }
    }

    #[inline]
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Maps the data while keeping every other field.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> QueryResult<U> {
        QueryResult {
            data: self.data.map(f),
            errors: self.errors,
            error: self.error,
            loading: self.loading,
            network_status: self.network_status,
            partial: self.partial,
        }
    }
}
