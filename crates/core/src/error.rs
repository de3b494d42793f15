//! Error types for Skein.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Result type alias for Skein core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while building core values.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The document source is not a valid GraphQL executable document.
    #[error("Invalid GraphQL document: {0}")]
    InvalidDocument(String),
}

impl Error {
    /// Creates an invalid document error.
    pub fn invalid_document(message: impl ToString) -> Self {
        Error::InvalidDocument(message.to_string())
    }
}

/// A GraphQL error as reported in the `errors` entry of a response.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GraphqlError {
    pub message: String,
    /// Response path the error is attached to, if any
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub path: Vec<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<serde_json::Map<String, serde_json::Value>>,
}

impl GraphqlError {
    pub fn new(message: impl Into<String>) -> Self {
        GraphqlError {
            message: message.into(),
            path: Vec::new(),
            extensions: None,
        }
    }

    #[must_use]
    pub fn with_path(mut self, path: impl IntoIterator<Item = serde_json::Value>) -> Self {
        self.path = path.into_iter().collect();
        self
    }

    #[must_use]
    pub fn with_extension(
        mut self,
        key: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.extensions
            .get_or_insert_with(serde_json::Map::new)
            .insert(key.into(), value.into());
        self
    }
}

impl fmt::Display for GraphqlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.message.fmt(f)
    }
}

/// A failed query, carried as a value inside results and settled promises.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum QueryError {
    /// The server answered with GraphQL errors.
    #[error("GraphQL errors: {}", join_messages(.0))]
    Graphql(Vec<GraphqlError>),
    /// The request never produced a GraphQL response.
    #[error("Network error: {0}")]
    Network(String),
    /// The source completed or went away before delivering a value.
    #[error("Source closed before delivering a result")]
    SourceClosed,
}

impl QueryError {
    pub fn network(error: impl ToString) -> Self {
        QueryError::Network(error.to_string())
    }

    pub fn graphql(errors: impl IntoIterator<Item = GraphqlError>) -> Self {
        QueryError::Graphql(errors.into_iter().collect())
    }
}

fn join_messages(errors: &[GraphqlError]) -> String {
    errors
        .iter()
        .map(|error| error.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}
