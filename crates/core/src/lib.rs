//! Skein Core - GraphQL documents, variables and query results.
//!
//! This crate provides the value types shared by the Skein subscription cache:
//!
//! - `Document`: a parsed GraphQL document compared by identity
//! - `has_directives`: directive inspection, used to detect deferred queries
//! - `Variables` / `canonical_stringify`: order-independent variable serialization
//! - `QueryResult`: a structurally comparable snapshot of a query's state
//! - `QueryError` / `Error`: error types
//!
//! # Example
//!
//! ```rust
//! use skein_core::{canonical_variables, has_directives, Document, Variables};
//!
//! let doc = Document::parse("query { feed { id ... @defer { body } } }").unwrap();
//! assert!(has_directives(&["defer"], &doc));
//!
//! let mut a = Variables::new();
//! a.insert("first".into(), 10.into());
//! a.insert("after".into(), "abc".into());
//!
//! let mut b = Variables::new();
//! b.insert("after".into(), "abc".into());
//! b.insert("first".into(), 10.into());
//!
//! assert_eq!(canonical_variables(Some(&a)), canonical_variables(Some(&b)));
//! ```

mod document;
mod error;
mod result;
mod variables;

pub use document::{has_directives, Document, DocumentId};
pub use error::{Error, GraphqlError, QueryError, Result};
pub use result::{NetworkStatus, QueryResult};
pub use variables::{canonical_stringify, canonical_variables, Variables};
