//! GraphQL document handles.
//!
//! A `Document` is parsed once and then shared by reference. Its identity,
//! not its text, is what distinguishes one document from another: two parses
//! of the same source are two different documents, while clones of one parse
//! are the same document.

use crate::error::{Error, Result};
use graphql_parser::query::{self as ast, Definition, OperationDefinition, Selection};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Process-unique identity of a parsed document.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentId(u64);

static NEXT_DOCUMENT_ID: AtomicU64 = AtomicU64::new(0);

fn next_document_id() -> DocumentId {
    DocumentId(NEXT_DOCUMENT_ID.fetch_add(1, Ordering::Relaxed))
}

/// A parsed GraphQL executable document.
#[derive(Clone)]
pub struct Document {
    inner: Arc<DocumentInner>,
}

struct DocumentInner {
    id: DocumentId,
    source: String,
    operation_name: Option<String>,
    /// Every directive name used anywhere in the document
    directives: BTreeSet<String>,
}

impl Document {
    /// Parses `source` into a new document with a fresh identity.
    pub fn parse(source: impl Into<String>) -> Result<Self> {
        let source = source.into();
        let parsed = ast::parse_query::<&str>(&source).map_err(Error::invalid_document)?;

        let mut directives = BTreeSet::new();
        let mut operation_name = None;
        for definition in &parsed.definitions {
            match definition {
                Definition::Operation(operation) => {
                    let (name, operation_directives, selection_set) = match operation {
                        OperationDefinition::SelectionSet(selection_set) => {
                            (None, &[][..], selection_set)
                        }
                        OperationDefinition::Query(query) => {
                            (query.name, &query.directives[..], &query.selection_set)
                        }
                        OperationDefinition::Mutation(mutation) => {
                            (mutation.name, &mutation.directives[..], &mutation.selection_set)
                        }
                        OperationDefinition::Subscription(subscription) => (
                            subscription.name,
                            &subscription.directives[..],
                            &subscription.selection_set,
                        ),
                    };
                    if operation_name.is_none() {
                        operation_name = name.map(str::to_owned);
                    }
                    collect_directives(operation_directives, &mut directives);
                    collect_selection_set(selection_set, &mut directives);
                }
                Definition::Fragment(fragment) => {
                    collect_directives(&fragment.directives, &mut directives);
                    collect_selection_set(&fragment.selection_set, &mut directives);
                }
            }
        }
        drop(parsed);

        Ok(Document {
            inner: Arc::new(DocumentInner {
                id: next_document_id(),
                source,
                operation_name,
                directives,
            }),
        })
    }

    #[inline]
    pub fn id(&self) -> DocumentId {
        self.inner.id
    }

    #[inline]
    pub fn source(&self) -> &str {
        &self.inner.source
    }

    /// Name of the first named operation in the document.
    pub fn operation_name(&self) -> Option<&str> {
        self.inner.operation_name.as_deref()
    }

    /// Returns true if `name` is used as a directive anywhere in the document.
    pub fn has_directive(&self, name: &str) -> bool {
        self.inner.directives.contains(name)
    }
}

/// Reports whether any of `names` is used as a directive in `document`.
pub fn has_directives(names: &[&str], document: &Document) -> bool {
    names.iter().any(|name| document.has_directive(name))
}

fn collect_directives<'a>(directives: &[ast::Directive<'a, &'a str>], out: &mut BTreeSet<String>) {
    for directive in directives {
        out.insert(directive.name.to_owned());
    }
}

fn collect_selection_set<'a>(
    selection_set: &ast::SelectionSet<'a, &'a str>,
    out: &mut BTreeSet<String>,
) {
    for selection in &selection_set.items {
        match selection {
            Selection::Field(field) => {
                collect_directives(&field.directives, out);
                collect_selection_set(&field.selection_set, out);
            }
            Selection::FragmentSpread(spread) => collect_directives(&spread.directives, out),
            Selection::InlineFragment(fragment) => {
                collect_directives(&fragment.directives, out);
                collect_selection_set(&fragment.selection_set, out);
            }
        }
    }
}

impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Document {}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("id", &self.inner.id)
            .field("operation_name", &self.inner.operation_name)
            .finish_non_exhaustive()
    }
}
